//! Authoritative session state and the snapshots derived from it.

use jt_types::{NetworkId, SessionSnapshot, WalletAddress};
use jt_wallet_provider::{AccessGrant, Signer};
use std::rc::Rc;

pub const CONNECT_PROMPT: &str = "Connect Wallet";

const SHORT_PREFIX_LEN: usize = 8;
const SHORT_SUFFIX_LEN: usize = 4;

/// `initialized` holds exactly when both `address` and `signer` are set;
/// only [`commit`](Self::commit) and [`clear`](Self::clear) touch them.
pub struct SessionState {
    initialized: bool,
    address: Option<WalletAddress>,
    display_name: Option<String>,
    network_id: NetworkId,
    signer: Option<Rc<dyn Signer>>,
    connecting_in_progress: bool,
}

impl SessionState {
    pub fn new(network_id: NetworkId) -> Self {
        Self {
            initialized: false,
            address: None,
            display_name: None,
            network_id,
            signer: None,
            connecting_in_progress: false,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn network_id(&self) -> NetworkId {
        self.network_id
    }

    pub fn is_connecting(&self) -> bool {
        self.connecting_in_progress
    }

    pub fn signer(&self) -> Option<Rc<dyn Signer>> {
        self.signer.clone()
    }

    pub(crate) fn set_network(&mut self, network_id: NetworkId) {
        self.network_id = network_id;
    }

    pub(crate) fn set_connecting(&mut self, connecting: bool) {
        self.connecting_in_progress = connecting;
    }

    pub(crate) fn commit(&mut self, grant: AccessGrant) {
        self.address = Some(grant.address);
        self.display_name = grant.display_name;
        self.signer = Some(grant.signer);
        self.initialized = true;
    }

    /// Drops identity and signer; keeps the network selection.
    pub(crate) fn clear(&mut self) {
        self.initialized = false;
        self.address = None;
        self.display_name = None;
        self.signer = None;
    }

    pub fn display_text(&self) -> String {
        if !self.initialized {
            return CONNECT_PROMPT.to_owned();
        }
        match (&self.display_name, &self.address) {
            (Some(name), _) if !name.trim().is_empty() => name.clone(),
            (_, Some(address)) => short_address(&address.0),
            _ => CONNECT_PROMPT.to_owned(),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            initialized: self.initialized,
            address: self.address.clone(),
            display_name: self.display_name.clone(),
            display_text: self.display_text(),
            network_id: self.network_id,
            chain_id: self.signer.as_ref().map(|signer| signer.chain_id().clone()),
            connecting: self.connecting_in_progress,
        }
    }
}

/// Keeps the first `prefix_len` and last `suffix_len` characters.
pub fn format_address(address: &str, prefix_len: usize, suffix_len: usize) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= prefix_len + suffix_len {
        return address.to_owned();
    }

    let prefix: String = chars[..prefix_len].iter().collect();
    let suffix: String = chars[chars.len() - suffix_len..].iter().collect();
    format!("{prefix}...{suffix}")
}

pub fn short_address(address: &str) -> String {
    format_address(address, SHORT_PREFIX_LEN, SHORT_SUFFIX_LEN)
}
