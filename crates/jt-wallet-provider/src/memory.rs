use crate::{AccessGrant, AccountChangeHub, AccountChanges, LocalSigner, ProviderError, WalletProvider};
use async_trait::async_trait;
use jt_types::{ChainId, NetworkConfig, WalletAddress};
use sha2::{Digest, Sha256};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use tokio::sync::Notify;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryAccount {
    pub address: WalletAddress,
    pub name: Option<String>,
}

impl MemoryAccount {
    pub fn new(address: &str, name: Option<&str>) -> Self {
        Self {
            address: WalletAddress(address.to_owned()),
            name: name.map(ToOwned::to_owned),
        }
    }

    fn secret_key(&self) -> [u8; 32] {
        Sha256::digest(self.address.0.as_bytes()).into()
    }
}

#[derive(Default)]
struct MemoryState {
    available: bool,
    account: Option<MemoryAccount>,
    deny: bool,
    fail_next: Option<ProviderError>,
    unsupported: HashSet<ChainId>,
    hold_approvals: bool,
    access_requests: usize,
    revocations: usize,
    bound_chain: Option<ChainId>,
}

/// Scriptable stand-in for a browser wallet extension.
///
/// Each account's key is derived from its address, so repeated grants for
/// the same account and chain produce signers with the same key but
/// distinct handles.
pub struct InMemoryWalletProvider {
    state: RefCell<MemoryState>,
    approvals: Notify,
    hub: AccountChangeHub,
}

impl Default for InMemoryWalletProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryWalletProvider {
    pub fn new() -> Self {
        Self {
            state: RefCell::new(MemoryState {
                available: true,
                ..MemoryState::default()
            }),
            approvals: Notify::new(),
            hub: AccountChangeHub::default(),
        }
    }

    pub fn with_account(self, address: &str, name: Option<&str>) -> Self {
        self.set_account(MemoryAccount::new(address, name));
        self
    }

    pub fn set_available(&self, available: bool) {
        self.state.borrow_mut().available = available;
    }

    pub fn set_account(&self, account: MemoryAccount) {
        self.state.borrow_mut().account = Some(account);
    }

    /// Changes the active account and notifies subscribers, the way the
    /// extension does when the user picks another key.
    pub fn switch_account(&self, account: MemoryAccount) -> usize {
        self.set_account(account);
        self.hub.notify()
    }

    pub fn emit_account_change(&self) -> usize {
        self.hub.notify()
    }

    pub fn set_deny(&self, deny: bool) {
        self.state.borrow_mut().deny = deny;
    }

    /// Fails only the next access request with `err`.
    pub fn fail_next(&self, err: ProviderError) {
        self.state.borrow_mut().fail_next = Some(err);
    }

    pub fn mark_unsupported(&self, chain_id: ChainId) {
        self.state.borrow_mut().unsupported.insert(chain_id);
    }

    /// While held, access requests suspend until [`approve`](Self::approve).
    pub fn hold_approvals(&self, hold: bool) {
        self.state.borrow_mut().hold_approvals = hold;
    }

    pub fn approve(&self) {
        self.approvals.notify_one();
    }

    pub fn access_requests(&self) -> usize {
        self.state.borrow().access_requests
    }

    pub fn revocations(&self) -> usize {
        self.state.borrow().revocations
    }

    pub fn bound_chain(&self) -> Option<ChainId> {
        self.state.borrow().bound_chain.clone()
    }
}

#[async_trait(?Send)]
impl WalletProvider for InMemoryWalletProvider {
    fn is_available(&self) -> bool {
        self.state.borrow().available
    }

    async fn request_access(&self, config: &NetworkConfig) -> Result<AccessGrant, ProviderError> {
        let hold = {
            let mut state = self.state.borrow_mut();
            state.access_requests += 1;
            if !state.available {
                return Err(ProviderError::Unavailable);
            }
            state.hold_approvals
        };

        if hold {
            self.approvals.notified().await;
        }

        let mut state = self.state.borrow_mut();
        if let Some(err) = state.fail_next.take() {
            return Err(err);
        }
        if state.unsupported.contains(&config.chain_id) {
            return Err(ProviderError::NetworkUnsupported {
                chain_id: config.chain_id.clone(),
            });
        }
        if state.deny {
            return Err(ProviderError::AccessDenied);
        }
        let Some(account) = state.account.clone() else {
            return Err(ProviderError::AccessDenied);
        };

        debug!(chain_id = %config.chain_id, address = %account.address, "in-memory access granted");
        state.bound_chain = Some(config.chain_id.clone());

        let signer = LocalSigner::with_address(
            account.secret_key(),
            config.chain_id.clone(),
            account.address.clone(),
        );
        Ok(AccessGrant {
            address: account.address,
            display_name: account.name,
            signer: Rc::new(signer),
        })
    }

    fn subscribe_account_changes(&self) -> AccountChanges {
        self.hub.subscribe()
    }

    fn revoke(&self) {
        let mut state = self.state.borrow_mut();
        state.revocations += 1;
        state.bound_chain = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jt_types::NetworkId;

    fn config(chain_id: &str) -> NetworkConfig {
        NetworkConfig {
            network_id: NetworkId::Mainnet,
            chain_id: ChainId(chain_id.to_owned()),
            chain_name: "Juno".to_owned(),
            rpc_endpoint: "http://localhost:26657".to_owned(),
            rest_endpoint: "http://localhost:1317".to_owned(),
            address_prefix: "juno".to_owned(),
            fee_denom: "ujuno".to_owned(),
            gas_price: "0.025".to_owned(),
        }
    }

    #[tokio::test]
    async fn grants_signer_bound_to_requested_chain() -> anyhow::Result<()> {
        let provider = InMemoryWalletProvider::new().with_account("juno1abc", Some("alice"));

        let grant = provider.request_access(&config("juno-1")).await?;
        assert_eq!(grant.address.0, "juno1abc");
        assert_eq!(grant.display_name.as_deref(), Some("alice"));
        assert_eq!(grant.signer.chain_id().0, "juno-1");
        assert_eq!(grant.signer.address().0, "juno1abc");
        assert_eq!(provider.bound_chain(), Some(ChainId("juno-1".to_owned())));

        provider.revoke();
        assert_eq!(provider.bound_chain(), None);
        assert_eq!(provider.revocations(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn scripted_failures_map_to_error_kinds() {
        let provider = InMemoryWalletProvider::new().with_account("juno1abc", None);

        provider.set_available(false);
        assert_eq!(
            provider.request_access(&config("juno-1")).await.unwrap_err(),
            ProviderError::Unavailable
        );

        provider.set_available(true);
        provider.set_deny(true);
        assert_eq!(
            provider.request_access(&config("juno-1")).await.unwrap_err(),
            ProviderError::AccessDenied
        );

        provider.set_deny(false);
        provider.mark_unsupported(ChainId("uni-6".to_owned()));
        assert_eq!(
            provider.request_access(&config("uni-6")).await.unwrap_err(),
            ProviderError::NetworkUnsupported {
                chain_id: ChainId("uni-6".to_owned())
            }
        );

        provider.fail_next(ProviderError::Extension("boom".to_owned()));
        assert!(provider.request_access(&config("juno-1")).await.is_err());
        assert!(provider.request_access(&config("juno-1")).await.is_ok());
        assert_eq!(provider.access_requests(), 5);
    }

    #[tokio::test]
    async fn switch_account_notifies_subscribers() {
        let provider = InMemoryWalletProvider::new().with_account("juno1abc", None);
        let mut changes = provider.subscribe_account_changes();

        assert_eq!(provider.switch_account(MemoryAccount::new("juno1xyz", None)), 1);
        assert!(changes.recv().await.is_some());

        let grant = provider.request_access(&config("juno-1")).await.unwrap();
        assert_eq!(grant.address.0, "juno1xyz");
    }

    #[tokio::test]
    async fn held_request_waits_for_approval() {
        let provider = InMemoryWalletProvider::new().with_account("juno1abc", None);
        provider.hold_approvals(true);
        let mainnet = config("juno-1");

        let (grant, _) = tokio::join!(provider.request_access(&mainnet), async {
            tokio::task::yield_now().await;
            assert_eq!(provider.access_requests(), 1);
            provider.approve();
        });
        assert!(grant.is_ok());
    }
}
