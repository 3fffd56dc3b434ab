//! Wallet session state machine.
//!
//! Tracks whether the user has authorized the wallet extension, which
//! network is selected, and the signer bound to that network. Exactly one
//! signer is bound at a time and it always belongs to the selected network.

mod controller;
mod error;
mod preference;
mod state;

pub use controller::{AccountChangeOutcome, SessionController};
pub use error::{ErrorKind, SessionError};
pub use preference::{InMemoryNetworkPreference, NetworkPreference, NoopNetworkPreference};
pub use state::{CONNECT_PROMPT, SessionState, format_address, short_address};
