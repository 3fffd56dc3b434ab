//! Network configuration resolution.
//!
//! Maps a [`NetworkId`] to the immutable [`NetworkConfig`] a signer gets
//! bound to. Built-in Juno parameters can be overridden per deployment with
//! `JT_<NETWORK>_CHAIN_ID`, `JT_<NETWORK>_RPC`, `JT_<NETWORK>_REST` and
//! `JT_<NETWORK>_GAS_PRICE`.

use jt_types::{ChainId, NetworkConfig, NetworkId, UnknownNetwork};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

pub const JUNO_MAINNET_CHAIN_ID: &str = "juno-1";
pub const JUNO_TESTNET_CHAIN_ID: &str = "uni-6";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown network identifier: {0}")]
    UnknownNetwork(String),
    #[error("no configuration registered for {0}")]
    Unconfigured(NetworkId),
    #[error("{field} for {network} cannot be empty")]
    EmptyField {
        network: NetworkId,
        field: &'static str,
    },
    #[error("gas price for {network} must be a positive decimal, got {value:?}")]
    InvalidGasPrice { network: NetworkId, value: String },
}

impl From<UnknownNetwork> for ConfigError {
    fn from(err: UnknownNetwork) -> Self {
        ConfigError::UnknownNetwork(err.0)
    }
}

pub trait NetworkResolver {
    fn resolve(&self, network: NetworkId) -> Result<NetworkConfig, ConfigError>;

    fn resolve_str(&self, network: &str) -> Result<NetworkConfig, ConfigError> {
        self.resolve(network.parse::<NetworkId>()?)
    }
}

impl<R: NetworkResolver + ?Sized> NetworkResolver for Arc<R> {
    fn resolve(&self, network: NetworkId) -> Result<NetworkConfig, ConfigError> {
        (**self).resolve(network)
    }
}

impl<R: NetworkResolver + ?Sized> NetworkResolver for std::rc::Rc<R> {
    fn resolve(&self, network: NetworkId) -> Result<NetworkConfig, ConfigError> {
        (**self).resolve(network)
    }
}

#[derive(Debug, Clone, Default)]
pub struct NetworkRegistry {
    configs: HashMap<NetworkId, NetworkConfig>,
}

impl NetworkRegistry {
    pub fn juno_defaults() -> Self {
        let mut registry = Self::default();
        registry.configs.insert(NetworkId::Mainnet, juno_mainnet());
        registry.configs.insert(NetworkId::Testnet, juno_testnet());
        registry
    }

    /// Built-in configs with overrides read from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut registry = Self::juno_defaults();

        for network in NetworkId::ALL {
            let Some(mut config) = registry.configs.get(&network).cloned() else {
                continue;
            };
            let prefix = format!("JT_{}", network.as_str().to_ascii_uppercase());

            if let Some(value) = lookup(&format!("{prefix}_CHAIN_ID")) {
                config.chain_id = ChainId(non_empty(network, "chain_id", &value)?);
            }
            if let Some(value) = lookup(&format!("{prefix}_RPC")) {
                config.rpc_endpoint = endpoint(network, "rpc_endpoint", &value)?;
            }
            if let Some(value) = lookup(&format!("{prefix}_REST")) {
                config.rest_endpoint = endpoint(network, "rest_endpoint", &value)?;
            }
            if let Some(value) = lookup(&format!("{prefix}_GAS_PRICE")) {
                config.gas_price = gas_price(network, &value)?;
            }

            debug!(
                network = %network,
                chain_id = %config.chain_id,
                rpc = %config.rpc_endpoint,
                "network config loaded"
            );
            registry.register(config);
        }

        Ok(registry)
    }

    pub fn register(&mut self, config: NetworkConfig) {
        self.configs.insert(config.network_id, config);
    }
}

impl NetworkResolver for NetworkRegistry {
    fn resolve(&self, network: NetworkId) -> Result<NetworkConfig, ConfigError> {
        self.configs
            .get(&network)
            .cloned()
            .ok_or(ConfigError::Unconfigured(network))
    }
}

fn non_empty(network: NetworkId, field: &'static str, value: &str) -> Result<String, ConfigError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::EmptyField { network, field });
    }
    Ok(value.to_owned())
}

fn endpoint(network: NetworkId, field: &'static str, value: &str) -> Result<String, ConfigError> {
    let value = non_empty(network, field, value)?;
    Ok(value.trim_end_matches('/').to_owned())
}

/// Gas prices reach the extension as numbers, so reject anything that
/// would not parse to a finite positive value.
fn gas_price(network: NetworkId, value: &str) -> Result<String, ConfigError> {
    let value = non_empty(network, "gas_price", value)?;
    match value.parse::<f64>() {
        Ok(price) if price.is_finite() && price > 0.0 => Ok(value),
        _ => Err(ConfigError::InvalidGasPrice { network, value }),
    }
}

fn juno_mainnet() -> NetworkConfig {
    NetworkConfig {
        network_id: NetworkId::Mainnet,
        chain_id: ChainId(JUNO_MAINNET_CHAIN_ID.to_owned()),
        chain_name: "Juno".to_owned(),
        rpc_endpoint: "https://rpc-juno.itastakers.com".to_owned(),
        rest_endpoint: "https://lcd-juno.itastakers.com".to_owned(),
        address_prefix: "juno".to_owned(),
        fee_denom: "ujuno".to_owned(),
        gas_price: "0.075".to_owned(),
    }
}

fn juno_testnet() -> NetworkConfig {
    NetworkConfig {
        network_id: NetworkId::Testnet,
        chain_id: ChainId(JUNO_TESTNET_CHAIN_ID.to_owned()),
        chain_name: "Juno Testnet".to_owned(),
        rpc_endpoint: "https://juno-testnet-rpc.polkachu.com".to_owned(),
        rest_endpoint: "https://juno-testnet-api.polkachu.com".to_owned(),
        address_prefix: "juno".to_owned(),
        fee_denom: "ujunox".to_owned(),
        gas_price: "0.025".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_both_networks() {
        let registry = NetworkRegistry::juno_defaults();

        let mainnet = registry.resolve(NetworkId::Mainnet).unwrap();
        assert_eq!(mainnet.chain_id.0, JUNO_MAINNET_CHAIN_ID);
        assert_eq!(mainnet.network_id, NetworkId::Mainnet);

        let testnet = registry.resolve(NetworkId::Testnet).unwrap();
        assert_eq!(testnet.chain_id.0, JUNO_TESTNET_CHAIN_ID);
        assert_eq!(testnet.fee_denom, "ujunox");
    }

    #[test]
    fn resolve_is_deterministic() {
        let registry = NetworkRegistry::juno_defaults();
        assert_eq!(
            registry.resolve(NetworkId::Testnet),
            registry.resolve(NetworkId::Testnet)
        );
    }

    #[test]
    fn resolve_str_rejects_unknown_identifier() {
        let registry = NetworkRegistry::juno_defaults();
        assert_eq!(
            registry.resolve_str("devnet"),
            Err(ConfigError::UnknownNetwork("devnet".to_owned()))
        );
        assert!(registry.resolve_str("testnet").is_ok());
    }

    #[test]
    fn empty_registry_reports_unconfigured() {
        let registry = NetworkRegistry::default();
        assert_eq!(
            registry.resolve(NetworkId::Mainnet),
            Err(ConfigError::Unconfigured(NetworkId::Mainnet))
        );
    }

    #[test]
    fn lookup_overrides_endpoints() {
        let registry = NetworkRegistry::from_lookup(|key| match key {
            "JT_TESTNET_CHAIN_ID" => Some("uni-7".to_owned()),
            "JT_TESTNET_RPC" => Some("http://localhost:26657/".to_owned()),
            "JT_TESTNET_GAS_PRICE" => Some(" 0.05 ".to_owned()),
            _ => None,
        })
        .unwrap();

        let testnet = registry.resolve(NetworkId::Testnet).unwrap();
        assert_eq!(testnet.chain_id.0, "uni-7");
        assert_eq!(testnet.rpc_endpoint, "http://localhost:26657");
        assert_eq!(testnet.gas_price, "0.05");

        let mainnet = registry.resolve(NetworkId::Mainnet).unwrap();
        assert_eq!(mainnet.chain_id.0, JUNO_MAINNET_CHAIN_ID);
    }

    #[test]
    fn lookup_rejects_blank_override() {
        let err = NetworkRegistry::from_lookup(|key| {
            (key == "JT_MAINNET_REST").then(|| "  ".to_owned())
        })
        .unwrap_err();

        assert_eq!(
            err,
            ConfigError::EmptyField {
                network: NetworkId::Mainnet,
                field: "rest_endpoint",
            }
        );
    }

    #[test]
    fn lookup_rejects_malformed_gas_price() {
        for bad in ["cheap", "-0.1", "0", "NaN", "inf"] {
            let err = NetworkRegistry::from_lookup(|key| {
                (key == "JT_TESTNET_GAS_PRICE").then(|| bad.to_owned())
            })
            .unwrap_err();

            assert_eq!(
                err,
                ConfigError::InvalidGasPrice {
                    network: NetworkId::Testnet,
                    value: bad.to_owned(),
                }
            );
        }
    }
}
