//! Crowdfund Client - read models and workflows over the campaign ledger
//!
//! Sits between a presentation layer and the authoritative ledger:
//! - Campaign Registry: cached campaign summaries, swapped atomically
//! - Request Registry: always-live request and funder queries
//! - Workflow Engine: the five campaign operations plus cache reconciliation
//! - Wallet session tracking: connection/account/network changes

mod context;

pub mod registry;
pub mod requests;
pub mod session;
pub mod workflow;

pub use registry::CampaignRegistry;
pub use requests::RequestRegistry;
pub use session::WalletSession;
pub use workflow::{CampaignView, WorkflowEngine};

// Re-export types that consumers might need
pub use campaign_domain::{Address, Campaign, FundingRequest};
pub use ledger_gateway::{ContractDirectory, LedgerError, LedgerGateway, NetworkId, TxReceipt};

use serde::{Deserialize, Serialize};

/// Client configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Upper bound on a single gateway call, in milliseconds
    pub call_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            call_timeout_ms: 30_000,
        }
    }
}
