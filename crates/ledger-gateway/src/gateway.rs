//! Gateway trait - the abstract ledger RPC surface
//!
//! One method per ledger operation. Names are functional labels, not
//! wire-format commitments: a transport implementation maps them onto
//! whatever encoding its chain speaks.
//!
//! Two things the wire carries implicitly are explicit here because Rust
//! has no ambient transaction context: every call names the `contract`
//! it targets (the client resolves it per network before calling), and
//! mutating calls name the signing `caller`.

use async_trait::async_trait;
use campaign_domain::{Address, Campaign, FundingRequest};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Acknowledgement of a submitted transaction.
///
/// A receipt only proves submission and acceptance; the resulting state
/// is observed through the next summary read, never inferred locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxReceipt {
    /// Transaction identifier assigned by the ledger.
    pub tx_id: String,
    /// When the ledger accepted the transaction.
    pub submitted_at: DateTime<Utc>,
}

/// Capability for invoking named read/write operations against the
/// authoritative campaign ledger.
///
/// Read operations are safely parallel; the ledger serializes writes.
/// Implementations must classify every failure as a [`LedgerError`].
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Summary of every campaign the contract knows, in index order.
    async fn get_all_campaign_summary(
        &self,
        contract: &Address,
    ) -> Result<Vec<Campaign>, LedgerError>;

    /// Register a new campaign owned by `caller`.
    async fn create_campaign(
        &self,
        contract: &Address,
        caller: &Address,
        name: &str,
    ) -> Result<TxReceipt, LedgerError>;

    /// Every funding request of one campaign, in index order.
    async fn get_all_request_for_campaign(
        &self,
        contract: &Address,
        campaign_index: u64,
    ) -> Result<Vec<FundingRequest>, LedgerError>;

    /// Whether `account` has ever funded the campaign.
    async fn address_to_funder_for_campaign(
        &self,
        contract: &Address,
        campaign_index: u64,
        account: &Address,
    ) -> Result<bool, LedgerError>;

    /// Raise a spending request against a campaign's funds.
    async fn create_request_for_campaign(
        &self,
        contract: &Address,
        caller: &Address,
        campaign_index: u64,
        name: &str,
        description: &str,
        request_amount: u128,
    ) -> Result<TxReceipt, LedgerError>;

    /// Record `caller`'s approval of a funding request.
    async fn approve_request_for_campaign(
        &self,
        contract: &Address,
        caller: &Address,
        campaign_index: u64,
        request_index: u64,
    ) -> Result<TxReceipt, LedgerError>;

    /// Withdraw an approved request's amount; terminal for the request.
    async fn fulfill_request_for_campaign(
        &self,
        contract: &Address,
        caller: &Address,
        campaign_index: u64,
        request_index: u64,
    ) -> Result<TxReceipt, LedgerError>;

    /// Transfer `value` wei from `caller` into the campaign.
    async fn fund_campaign(
        &self,
        contract: &Address,
        caller: &Address,
        campaign_index: u64,
        value: u128,
    ) -> Result<TxReceipt, LedgerError>;
}
