use jt_types::NetworkId;
use std::cell::Cell;
use std::rc::Rc;

/// Where the user's last network choice survives between page loads.
pub trait NetworkPreference {
    fn load(&self) -> Option<NetworkId>;
    fn save(&self, network: NetworkId);
}

#[derive(Default)]
pub struct NoopNetworkPreference;

impl NetworkPreference for NoopNetworkPreference {
    fn load(&self) -> Option<NetworkId> {
        None
    }

    fn save(&self, _network: NetworkId) {}
}

#[derive(Default)]
pub struct InMemoryNetworkPreference {
    network: Cell<Option<NetworkId>>,
}

impl InMemoryNetworkPreference {
    pub fn with_network(network: NetworkId) -> Self {
        Self {
            network: Cell::new(Some(network)),
        }
    }
}

impl NetworkPreference for InMemoryNetworkPreference {
    fn load(&self) -> Option<NetworkId> {
        self.network.get()
    }

    fn save(&self, network: NetworkId) {
        self.network.set(Some(network));
    }
}

impl<T: NetworkPreference + ?Sized> NetworkPreference for Rc<T> {
    fn load(&self) -> Option<NetworkId> {
        (**self).load()
    }

    fn save(&self, network: NetworkId) {
        (**self).save(network)
    }
}
