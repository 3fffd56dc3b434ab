use jt_network::ConfigError;
use jt_wallet_provider::ProviderError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("another wallet operation is already in progress")]
    Busy,
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Stable classification for display and telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ProviderUnavailable,
    AccessDenied,
    NetworkUnsupported,
    ConfigError,
    Busy,
    Signing,
    Extension,
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::Busy => ErrorKind::Busy,
            SessionError::Config(_) => ErrorKind::ConfigError,
            SessionError::Provider(err) => match err {
                ProviderError::Unavailable => ErrorKind::ProviderUnavailable,
                ProviderError::AccessDenied => ErrorKind::AccessDenied,
                ProviderError::NetworkUnsupported { .. } => ErrorKind::NetworkUnsupported,
                ProviderError::Signing(_) => ErrorKind::Signing,
                ProviderError::Extension(_) => ErrorKind::Extension,
            },
        }
    }

    pub fn is_recoverable(&self) -> bool {
        match self {
            SessionError::Busy => true,
            SessionError::Config(_) => false,
            SessionError::Provider(err) => err.is_recoverable(),
        }
    }
}
