use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The two networks the session can bind a signer to.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NetworkId {
    #[default]
    Mainnet,
    Testnet,
}

impl NetworkId {
    pub const ALL: [NetworkId; 2] = [NetworkId::Mainnet, NetworkId::Testnet];

    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkId::Mainnet => "mainnet",
            NetworkId::Testnet => "testnet",
        }
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown network identifier: {0}")]
pub struct UnknownNetwork(pub String);

impl FromStr for NetworkId {
    type Err = UnknownNetwork;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mainnet" => Ok(NetworkId::Mainnet),
            "testnet" => Ok(NetworkId::Testnet),
            other => Err(UnknownNetwork(other.to_owned())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ChainId(pub String);

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct WalletAddress(pub String);

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Connection parameters for one network. Never mutated once resolved;
/// a network switch replaces the whole value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkConfig {
    pub network_id: NetworkId,
    pub chain_id: ChainId,
    pub chain_name: String,
    pub rpc_endpoint: String,
    pub rest_endpoint: String,
    pub address_prefix: String,
    pub fee_denom: String,
    pub gas_price: String,
}

/// Read-only view of the session handed to the UI layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub initialized: bool,
    pub address: Option<WalletAddress>,
    pub display_name: Option<String>,
    /// Wallet button label: name, truncated address, or a connect prompt.
    pub display_text: String,
    pub network_id: NetworkId,
    /// Chain the bound signer was created for, when one is bound.
    pub chain_id: Option<ChainId>,
    pub connecting: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_id_parses_case_insensitively() {
        assert_eq!("mainnet".parse::<NetworkId>(), Ok(NetworkId::Mainnet));
        assert_eq!(" Testnet ".parse::<NetworkId>(), Ok(NetworkId::Testnet));
        assert_eq!(
            "devnet".parse::<NetworkId>(),
            Err(UnknownNetwork("devnet".to_owned()))
        );
    }

    #[test]
    fn network_id_serializes_lowercase() {
        let json = serde_json::to_string(&NetworkId::Testnet).unwrap();
        assert_eq!(json, "\"testnet\"");
        assert_eq!(NetworkId::default(), NetworkId::Mainnet);
    }
}
