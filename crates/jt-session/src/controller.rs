//! Orchestrates connect, disconnect, network switches and extension-driven
//! account changes. The controller is the only writer of [`SessionState`];
//! everyone else reads [`SessionSnapshot`]s.

use crate::error::SessionError;
use crate::preference::NetworkPreference;
use crate::state::SessionState;
use jt_network::NetworkResolver;
use jt_types::{NetworkId, SessionSnapshot};
use jt_wallet_provider::{AccessGrant, AccountChanges, ProviderError, Signer, WalletProvider};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountChangeOutcome {
    Refreshed,
    /// No session to refresh.
    Ignored,
    /// Deferred until the in-flight operation completes.
    Coalesced,
}

pub struct SessionController<P, R> {
    provider: P,
    resolver: R,
    preference: Box<dyn NetworkPreference>,
    state: RefCell<SessionState>,
    refresh_pending: Cell<bool>,
    account_changes: RefCell<Option<AccountChanges>>,
    snapshots: watch::Sender<SessionSnapshot>,
}

impl<P, R> SessionController<P, R>
where
    P: WalletProvider,
    R: NetworkResolver,
{
    /// Starts uninitialized on the persisted network (mainnet when none is
    /// stored) and subscribes to the provider's account-change channel.
    pub fn new(provider: P, resolver: R, preference: impl NetworkPreference + 'static) -> Self {
        let network = preference.load().unwrap_or_default();
        let state = SessionState::new(network);
        let (snapshots, _) = watch::channel(state.snapshot());
        let account_changes = provider.subscribe_account_changes();

        info!(network = %network, "wallet session created");

        Self {
            provider,
            resolver,
            preference: Box::new(preference),
            state: RefCell::new(state),
            refresh_pending: Cell::new(false),
            account_changes: RefCell::new(Some(account_changes)),
            snapshots,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn is_busy(&self) -> bool {
        self.state.borrow().is_connecting()
    }

    pub fn is_initialized(&self) -> bool {
        self.state.borrow().is_initialized()
    }

    pub fn network(&self) -> NetworkId {
        self.state.borrow().network_id()
    }

    /// Signer for the active network, if connected. Callers should fetch it
    /// per use rather than keep it across session changes.
    pub fn current_signer(&self) -> Option<Rc<dyn Signer>> {
        self.state.borrow().signer()
    }

    pub async fn connect(&self) -> Result<SessionSnapshot, SessionError> {
        self.ensure_idle("connect")?;
        if self.is_initialized() {
            return Ok(self.snapshot());
        }

        let network = self.network();
        self.begin();
        let result = self
            .authorize(network)
            .await
            .map(|grant| self.commit(network, grant));
        if let Err(err) = &result {
            warn!(network = %network, error = %err, "wallet connect failed");
        }
        let queued = self.finish().await;

        result.and(queued).map(|()| self.snapshot())
    }

    pub fn disconnect(&self) -> Result<SessionSnapshot, SessionError> {
        self.ensure_idle("disconnect")?;
        if !self.is_initialized() {
            return Ok(self.snapshot());
        }

        self.provider.revoke();
        self.state.borrow_mut().clear();
        info!(network = %self.network(), "wallet disconnected");
        self.publish();

        Ok(self.snapshot())
    }

    /// Selects `target` right away. A connected session is re-authorized
    /// against the new chain; if that fails the session ends disconnected,
    /// never holding the previous network's signer.
    pub async fn switch_network(&self, target: NetworkId) -> Result<SessionSnapshot, SessionError> {
        self.ensure_idle("switch_network")?;

        let (previous, initialized) = {
            let state = self.state.borrow();
            (state.network_id(), state.is_initialized())
        };
        if previous == target {
            return Ok(self.snapshot());
        }

        self.state.borrow_mut().set_network(target);
        self.preference.save(target);
        info!(from = %previous, to = %target, "network selected");

        if !initialized {
            self.publish();
            return Ok(self.snapshot());
        }

        // The old signer must be gone before the first suspension point.
        self.provider.revoke();
        self.state.borrow_mut().clear();
        self.begin();

        let result = self
            .authorize(target)
            .await
            .map(|grant| self.commit(target, grant));
        if let Err(err) = &result {
            warn!(
                network = %target,
                error = %err,
                "re-authorization after network switch failed; session disconnected"
            );
        }
        let queued = self.finish().await;

        result.and(queued).map(|()| self.snapshot())
    }

    /// Reaction to the extension reporting a different active account.
    pub async fn on_external_account_change(&self) -> Result<AccountChangeOutcome, SessionError> {
        if self.is_busy() {
            self.refresh_pending.set(true);
            debug!("account change during in-flight operation; refresh queued");
            return Ok(AccountChangeOutcome::Coalesced);
        }
        if !self.is_initialized() {
            debug!("account change ignored; no active session");
            return Ok(AccountChangeOutcome::Ignored);
        }

        self.begin();
        let result = self.refresh().await;
        let queued = self.finish().await;

        result.and(queued).map(|()| AccountChangeOutcome::Refreshed)
    }

    /// Consumes the account-change channel until the provider closes it.
    /// Runs at most once per controller.
    pub async fn listen_for_account_changes(&self) {
        let changes = self.account_changes.borrow_mut().take();
        let Some(mut changes) = changes else {
            warn!("account change listener already started");
            return;
        };

        while changes.recv().await.is_some() {
            if let Err(err) = self.on_external_account_change().await {
                warn!(error = %err, "account change handling failed");
            }
        }
        debug!("account change channel closed");
    }

    fn ensure_idle(&self, operation: &'static str) -> Result<(), SessionError> {
        if self.is_busy() {
            debug!(operation, "rejected; wallet operation in flight");
            return Err(SessionError::Busy);
        }
        Ok(())
    }

    fn begin(&self) {
        self.state.borrow_mut().set_connecting(true);
        self.publish();
    }

    /// Runs refreshes queued during the operation, then clears the in-flight
    /// flag. Returns the error of a queued refresh that ended the session.
    async fn finish(&self) -> Result<(), SessionError> {
        let mut queued = Ok(());
        while self.refresh_pending.replace(false) {
            if !self.is_initialized() {
                debug!("queued account refresh dropped; no active session");
                break;
            }
            queued = self.refresh().await;
        }

        self.state.borrow_mut().set_connecting(false);
        self.publish();
        queued
    }

    async fn refresh(&self) -> Result<(), SessionError> {
        let network = self.network();
        match self.authorize(network).await {
            Ok(grant) => {
                self.commit(network, grant);
                Ok(())
            }
            Err(err) => {
                warn!(network = %network, error = %err, "account refresh failed; session disconnected");
                self.provider.revoke();
                self.state.borrow_mut().clear();
                Err(err)
            }
        }
    }

    async fn authorize(&self, network: NetworkId) -> Result<AccessGrant, SessionError> {
        let config = self.resolver.resolve(network)?;
        let grant = self.provider.request_access(&config).await?;

        if grant.signer.chain_id() != &config.chain_id {
            return Err(ProviderError::NetworkUnsupported {
                chain_id: config.chain_id,
            }
            .into());
        }

        Ok(grant)
    }

    fn commit(&self, network: NetworkId, grant: AccessGrant) {
        info!(
            network = %network,
            chain_id = %grant.signer.chain_id(),
            address = %grant.address,
            "wallet session connected"
        );
        self.state.borrow_mut().commit(grant);
    }

    fn publish(&self) {
        let snapshot = self.snapshot();
        self.snapshots.send_replace(snapshot);
    }
}
