//! Contract between the session and a browser wallet extension.
//!
//! Everything upstream of this crate talks to the extension only through
//! [`WalletProvider`] and [`Signer`]. The futures are `?Send`: the provider
//! lives on the single UI thread next to the extension it wraps.

mod error;
#[cfg(feature = "memory")]
mod memory;
mod signer;

pub use error::ProviderError;
#[cfg(feature = "memory")]
pub use memory::{InMemoryWalletProvider, MemoryAccount};
#[cfg(feature = "memory")]
pub use signer::LocalSigner;
pub use signer::Signer;

use async_trait::async_trait;
use jt_types::{NetworkConfig, WalletAddress};
use std::cell::RefCell;
use std::rc::Rc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Result of a successful access request.
#[derive(Clone)]
pub struct AccessGrant {
    pub address: WalletAddress,
    pub display_name: Option<String>,
    pub signer: Rc<dyn Signer>,
}

impl std::fmt::Debug for AccessGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGrant")
            .field("address", &self.address)
            .field("display_name", &self.display_name)
            .field("chain_id", self.signer.chain_id())
            .finish()
    }
}

/// The user switched accounts inside the extension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountChanged;

pub type AccountChanges = UnboundedReceiver<AccountChanged>;

#[async_trait(?Send)]
pub trait WalletProvider {
    fn is_available(&self) -> bool;

    /// Prompts the extension for access to `config`'s chain. Suspends until
    /// the user answers; there is no timeout.
    async fn request_access(&self, config: &NetworkConfig) -> Result<AccessGrant, ProviderError>;

    fn subscribe_account_changes(&self) -> AccountChanges;

    /// Drops local references to the bound signer. The extension keeps its
    /// own permission record.
    fn revoke(&self);
}

#[async_trait(?Send)]
impl<P: WalletProvider + ?Sized> WalletProvider for Rc<P> {
    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    async fn request_access(&self, config: &NetworkConfig) -> Result<AccessGrant, ProviderError> {
        (**self).request_access(config).await
    }

    fn subscribe_account_changes(&self) -> AccountChanges {
        (**self).subscribe_account_changes()
    }

    fn revoke(&self) {
        (**self).revoke()
    }
}

/// Fan-out of account-change notifications to every subscriber.
#[derive(Default)]
pub struct AccountChangeHub {
    subscribers: RefCell<Vec<UnboundedSender<AccountChanged>>>,
}

impl AccountChangeHub {
    pub fn subscribe(&self) -> AccountChanges {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.borrow_mut().push(tx);
        rx
    }

    /// Returns how many live subscribers were notified.
    pub fn notify(&self) -> usize {
        let mut subscribers = self.subscribers.borrow_mut();
        subscribers.retain(|tx| tx.send(AccountChanged).is_ok());
        subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hub_drops_closed_subscribers() {
        let hub = AccountChangeHub::default();
        let mut kept = hub.subscribe();
        let dropped = hub.subscribe();
        drop(dropped);

        assert_eq!(hub.notify(), 1);
        assert_eq!(kept.recv().await, Some(AccountChanged));
    }
}
