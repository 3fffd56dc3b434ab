use jt_types::ChainId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("wallet extension is not installed or is disabled")]
    Unavailable,
    #[error("wallet access was denied")]
    AccessDenied,
    #[error("wallet extension cannot provide a signer for chain {chain_id}")]
    NetworkUnsupported { chain_id: ChainId },
    #[error("signing failed: {0}")]
    Signing(String),
    #[error("wallet extension error: {0}")]
    Extension(String),
}

impl ProviderError {
    /// Whether the user can fix this without a new extension release.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ProviderError::NetworkUnsupported { .. })
    }
}
