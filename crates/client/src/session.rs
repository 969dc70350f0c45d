//! Wallet Session - connection state reported by the wallet collaborator

use campaign_domain::Address;
use ledger_gateway::NetworkId;
use serde::{Deserialize, Serialize};

/// Snapshot of the external wallet's state.
///
/// The client never drives the wallet; it only reacts to the sessions
/// the wallet reports. Account equality follows [`Address`] and is
/// case-insensitive, so a re-report of the same account in different
/// hex casing is not a session change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSession {
    /// Whether a wallet is connected at all.
    pub connected: bool,
    /// Active account, if the wallet exposes one.
    pub account: Option<Address>,
    /// Chain the wallet is pointed at.
    pub network: Option<NetworkId>,
}

impl WalletSession {
    /// Session with no wallet attached.
    pub fn disconnected() -> Self {
        Self {
            connected: false,
            account: None,
            network: None,
        }
    }

    /// Connected session with an active account on `network`.
    pub fn connected(account: Address, network: NetworkId) -> Self {
        Self {
            connected: true,
            account: Some(account),
            network: Some(network),
        }
    }
}

impl Default for WalletSession {
    fn default() -> Self {
        Self::disconnected()
    }
}
