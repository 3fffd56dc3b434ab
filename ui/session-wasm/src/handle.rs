//! JavaScript-facing session handle: the snapshot plus the three commands
//! the wallet button and network toggle need.

use crate::keplr::KeplrProvider;
use crate::storage::LocalStorageNetworkPreference;
use js_sys::{Function, Promise, Reflect};
use jt_network::{ConfigError, NetworkRegistry};
use jt_session::{SessionController, SessionError};
use jt_types::{NetworkId, SessionSnapshot};
use serde::Serialize;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, spawn_local};

type BrowserController = SessionController<KeplrProvider, NetworkRegistry>;

#[wasm_bindgen]
pub struct SessionHandle {
    controller: Rc<BrowserController>,
}

#[wasm_bindgen]
impl SessionHandle {
    /// Creates the session and starts listening for Keplr account changes.
    /// Create one per page.
    #[wasm_bindgen(constructor)]
    pub fn new() -> SessionHandle {
        let controller = Rc::new(SessionController::new(
            KeplrProvider::new(),
            NetworkRegistry::juno_defaults(),
            LocalStorageNetworkPreference,
        ));

        let listener = controller.clone();
        spawn_local(async move {
            listener.listen_for_account_changes().await;
        });

        SessionHandle { controller }
    }

    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        snapshot_to_js(&self.controller.snapshot())
    }

    #[wasm_bindgen(js_name = isBusy)]
    pub fn is_busy(&self) -> bool {
        self.controller.is_busy()
    }

    pub fn connect(&self) -> Promise {
        let controller = self.controller.clone();
        future_to_promise(async move {
            let snapshot = controller.connect().await.map_err(|err| report("connect", &err))?;
            snapshot_to_js(&snapshot)
        })
    }

    pub fn disconnect(&self) -> Result<JsValue, JsValue> {
        let snapshot = self
            .controller
            .disconnect()
            .map_err(|err| report("disconnect", &err))?;
        snapshot_to_js(&snapshot)
    }

    /// Wallet button: connects when disconnected, disconnects otherwise.
    #[wasm_bindgen(js_name = toggleConnection)]
    pub fn toggle_connection(&self) -> Promise {
        if self.controller.is_initialized() {
            let result = self.disconnect();
            return future_to_promise(async move { result });
        }
        self.connect()
    }

    #[wasm_bindgen(js_name = switchNetwork)]
    pub fn switch_network(&self, network: String) -> Promise {
        let controller = self.controller.clone();
        future_to_promise(async move {
            let target = network
                .parse::<NetworkId>()
                .map_err(|err| report("switch_network", &SessionError::Config(ConfigError::from(err))))?;
            let snapshot = controller
                .switch_network(target)
                .await
                .map_err(|err| report("switch_network", &err))?;
            snapshot_to_js(&snapshot)
        })
    }

    /// Calls `callback(snapshot)` after every state change.
    #[wasm_bindgen(js_name = onChange)]
    pub fn on_change(&self, callback: Function) {
        let mut snapshots = self.controller.subscribe();
        spawn_local(async move {
            while snapshots.changed().await.is_ok() {
                let snapshot = snapshots.borrow_and_update().clone();
                let value = match snapshot_to_js(&snapshot) {
                    Ok(value) => value,
                    Err(err) => {
                        gloo_console::error!("session snapshot conversion failed", err);
                        continue;
                    }
                };
                if let Err(err) = callback.call1(&JsValue::NULL, &value) {
                    gloo_console::error!("session change callback threw", err);
                }
            }
        });
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

fn snapshot_to_js(snapshot: &SessionSnapshot) -> Result<JsValue, JsValue> {
    snapshot
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(JsValue::from)
}

/// Turns a failed transition into a JS `Error` carrying a `kind` property.
fn report(operation: &str, err: &SessionError) -> JsValue {
    gloo_console::warn!(format!("wallet {operation} failed: {err}"));

    let error = js_sys::Error::new(&err.to_string());
    if let Ok(kind) = err
        .kind()
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
    {
        let _ = Reflect::set(&error, &JsValue::from_str("kind"), &kind);
    }
    error.into()
}
