//! Keplr extension adapter.
//!
//! Talks to `window.keplr` through `Reflect` so the page works (and reports
//! [`ProviderError::Unavailable`]) when the extension is missing.

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use js_sys::{Array, Function, Object, Promise, Reflect, Uint8Array};
use jt_types::{ChainId, NetworkConfig, NetworkId, WalletAddress};
use jt_wallet_provider::{
    AccessGrant, AccountChangeHub, AccountChanges, ProviderError, Signer, WalletProvider,
};
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

pub const KEYSTORE_CHANGE_EVENT: &str = "keplr_keystorechange";

const COSMOS_COIN_TYPE: u32 = 118;
const JUNO_DECIMALS: u8 = 6;

pub struct KeplrProvider {
    hub: Rc<AccountChangeHub>,
    bound_chain: RefCell<Option<ChainId>>,
    listener: Option<Closure<dyn FnMut(web_sys::Event)>>,
}

impl Default for KeplrProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl KeplrProvider {
    /// Registers the keystore-change listener on `window`. The extension may
    /// inject `window.keplr` later, so it is looked up per request.
    pub fn new() -> Self {
        let hub = Rc::new(AccountChangeHub::default());

        let notify = hub.clone();
        let listener = Closure::wrap(Box::new(move |_: web_sys::Event| {
            notify.notify();
        }) as Box<dyn FnMut(_)>);

        let registered = web_sys::window().is_some_and(|window| {
            window
                .add_event_listener_with_callback(KEYSTORE_CHANGE_EVENT, listener.as_ref().unchecked_ref())
                .is_ok()
        });
        if !registered {
            gloo_console::warn!("keplr account-change listener could not be registered");
        }

        Self {
            hub,
            bound_chain: RefCell::new(None),
            listener: registered.then_some(listener),
        }
    }

    pub fn bound_chain(&self) -> Option<ChainId> {
        self.bound_chain.borrow().clone()
    }
}

impl Drop for KeplrProvider {
    fn drop(&mut self) {
        if let (Some(window), Some(listener)) = (web_sys::window(), self.listener.as_ref()) {
            let _ = window
                .remove_event_listener_with_callback(KEYSTORE_CHANGE_EVENT, listener.as_ref().unchecked_ref());
        }
    }
}

#[async_trait(?Send)]
impl WalletProvider for KeplrProvider {
    fn is_available(&self) -> bool {
        keplr().is_ok()
    }

    async fn request_access(&self, config: &NetworkConfig) -> Result<AccessGrant, ProviderError> {
        let keplr = keplr()?;
        let chain_id = &config.chain_id;
        let classify = |err: JsValue| classify_message(&js_message(&err), chain_id);

        // Keplr ships with juno-1; anything else has to be suggested first.
        if config.network_id != NetworkId::Mainnet {
            let info = to_js(&chain_info(config)?)?;
            call(&keplr, "experimentalSuggestChain", &[info])
                .await
                .map_err(classify)?;
        }

        let chain_arg = JsValue::from_str(&chain_id.0);
        call(&keplr, "enable", &[chain_arg.clone()])
            .await
            .map_err(classify)?;
        let key = call(&keplr, "getKey", &[chain_arg]).await.map_err(classify)?;

        let address = string_field(&key, "bech32Address")
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ProviderError::Extension("keplr returned a key without an address".to_owned()))?;
        let display_name = string_field(&key, "name").filter(|value| !value.trim().is_empty());

        self.bound_chain.replace(Some(chain_id.clone()));

        let address = WalletAddress(address);
        Ok(AccessGrant {
            address: address.clone(),
            display_name,
            signer: Rc::new(KeplrSigner {
                keplr,
                chain_id: chain_id.clone(),
                address,
            }),
        })
    }

    fn subscribe_account_changes(&self) -> AccountChanges {
        self.hub.subscribe()
    }

    fn revoke(&self) {
        self.bound_chain.replace(None);
    }
}

/// Signs through the extension; key material never leaves Keplr.
pub struct KeplrSigner {
    keplr: Object,
    chain_id: ChainId,
    address: WalletAddress,
}

#[async_trait(?Send)]
impl Signer for KeplrSigner {
    fn chain_id(&self) -> &ChainId {
        &self.chain_id
    }

    fn address(&self) -> &WalletAddress {
        &self.address
    }

    async fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, ProviderError> {
        if payload.is_empty() {
            return Err(ProviderError::Signing("payload cannot be empty".to_owned()));
        }

        let args = [
            JsValue::from_str(&self.chain_id.0),
            JsValue::from_str(&self.address.0),
            Uint8Array::from(payload).into(),
        ];
        let signed = call(&self.keplr, "signArbitrary", &args)
            .await
            .map_err(|err| match classify_message(&js_message(&err), &self.chain_id) {
                ProviderError::Extension(message) => ProviderError::Signing(message),
                other => other,
            })?;

        let encoded = string_field(&signed, "signature")
            .ok_or_else(|| ProviderError::Signing("keplr returned no signature".to_owned()))?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(|err| ProviderError::Signing(format!("signature is not base64: {err}")))
    }
}

fn keplr() -> Result<Object, ProviderError> {
    let window = web_sys::window().ok_or(ProviderError::Unavailable)?;
    let value = Reflect::get(&window, &JsValue::from_str("keplr")).map_err(|_| ProviderError::Unavailable)?;
    if value.is_undefined() || value.is_null() {
        return Err(ProviderError::Unavailable);
    }
    value.dyn_into::<Object>().map_err(|_| ProviderError::Unavailable)
}

/// Calls `target[method](...args)`, awaiting the result when it is a promise.
async fn call(target: &Object, method: &str, args: &[JsValue]) -> Result<JsValue, JsValue> {
    let function = Reflect::get(target, &JsValue::from_str(method))?
        .dyn_into::<Function>()
        .map_err(|_| JsValue::from_str(&format!("keplr.{method} is not a function")))?;

    let args: Array = args.iter().collect();
    let value = Reflect::apply(&function, target, &args)?;
    if value.is_instance_of::<Promise>() {
        JsFuture::from(value.unchecked_into::<Promise>()).await
    } else {
        Ok(value)
    }
}

fn string_field(value: &JsValue, field: &str) -> Option<String> {
    Reflect::get(value, &JsValue::from_str(field)).ok()?.as_string()
}

fn js_message(err: &JsValue) -> String {
    if let Some(error) = err.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    err.as_string().unwrap_or_else(|| format!("{err:?}"))
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, ProviderError> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|err| ProviderError::Extension(err.to_string()))
}

pub(crate) fn classify_message(message: &str, chain_id: &ChainId) -> ProviderError {
    let lower = message.to_ascii_lowercase();
    if lower.contains("reject") || lower.contains("denied") {
        ProviderError::AccessDenied
    } else if lower.contains("no chain info")
        || lower.contains("not supported")
        || lower.contains("unknown chain")
    {
        ProviderError::NetworkUnsupported {
            chain_id: chain_id.clone(),
        }
    } else {
        ProviderError::Extension(message.to_owned())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Currency {
    coin_denom: String,
    coin_minimal_denom: String,
    coin_decimals: u8,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FeeCurrency {
    #[serde(flatten)]
    currency: Currency,
    gas_price_step: GasPriceStep,
}

#[derive(Debug, Serialize)]
struct GasPriceStep {
    low: f64,
    average: f64,
    high: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Bip44 {
    coin_type: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Bech32Config {
    bech32_prefix_acc_addr: String,
    bech32_prefix_acc_pub: String,
    bech32_prefix_val_addr: String,
    bech32_prefix_val_pub: String,
    bech32_prefix_cons_addr: String,
    bech32_prefix_cons_pub: String,
}

/// Chain description handed to `keplr.experimentalSuggestChain`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChainInfo {
    chain_id: String,
    chain_name: String,
    rpc: String,
    rest: String,
    bip44: Bip44,
    bech32_config: Bech32Config,
    currencies: Vec<Currency>,
    fee_currencies: Vec<FeeCurrency>,
    stake_currency: Currency,
    features: Vec<String>,
}

pub(crate) fn chain_info(config: &NetworkConfig) -> Result<ChainInfo, ProviderError> {
    let prefix = &config.address_prefix;
    let currency = || Currency {
        coin_denom: display_denom(&config.fee_denom),
        coin_minimal_denom: config.fee_denom.clone(),
        coin_decimals: JUNO_DECIMALS,
    };
    let gas_price = config
        .gas_price
        .parse::<f64>()
        .ok()
        .filter(|price| price.is_finite() && *price > 0.0)
        .ok_or_else(|| ProviderError::Extension(format!("invalid gas price {:?}", config.gas_price)))?;

    Ok(ChainInfo {
        chain_id: config.chain_id.0.clone(),
        chain_name: config.chain_name.clone(),
        rpc: config.rpc_endpoint.clone(),
        rest: config.rest_endpoint.clone(),
        bip44: Bip44 {
            coin_type: COSMOS_COIN_TYPE,
        },
        bech32_config: Bech32Config {
            bech32_prefix_acc_addr: prefix.clone(),
            bech32_prefix_acc_pub: format!("{prefix}pub"),
            bech32_prefix_val_addr: format!("{prefix}valoper"),
            bech32_prefix_val_pub: format!("{prefix}valoperpub"),
            bech32_prefix_cons_addr: format!("{prefix}valcons"),
            bech32_prefix_cons_pub: format!("{prefix}valconspub"),
        },
        currencies: vec![currency()],
        fee_currencies: vec![FeeCurrency {
            currency: currency(),
            gas_price_step: GasPriceStep {
                low: gas_price,
                average: gas_price * 2.0,
                high: gas_price * 3.0,
            },
        }],
        stake_currency: currency(),
        features: Vec::new(),
    })
}

/// `ujunox` → `JUNOX`.
fn display_denom(denom: &str) -> String {
    denom.strip_prefix('u').unwrap_or(denom).to_ascii_uppercase()
}
