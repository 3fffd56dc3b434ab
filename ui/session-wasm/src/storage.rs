//! Network choice persisted in `localStorage`.

use gloo_storage::{LocalStorage, Storage};
use jt_session::NetworkPreference;
use jt_types::NetworkId;

pub const NETWORK_KEY: &str = "jt_network";

#[derive(Default)]
pub struct LocalStorageNetworkPreference;

impl NetworkPreference for LocalStorageNetworkPreference {
    fn load(&self) -> Option<NetworkId> {
        LocalStorage::get::<NetworkId>(NETWORK_KEY).ok()
    }

    fn save(&self, network: NetworkId) {
        if let Err(err) = LocalStorage::set(NETWORK_KEY, network) {
            gloo_console::warn!(format!("could not persist network choice: {err}"));
        }
    }
}
