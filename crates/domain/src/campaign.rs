//! Campaign and funding request read models
//!
//! Snapshots of ledger state as the summary reads return them. The ledger
//! owns the authoritative values; these records are advisory and are
//! replaced wholesale on every registry refresh, never patched in place.

use crate::address::Address;
use crate::approval::is_majority_approved;
use crate::units::wei_to_ether;
use serde::{Deserialize, Serialize};

/// One campaign as reported by the ledger summary read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    /// Stable position in the ledger's campaign registry; the addressing
    /// key for every operation on this campaign.
    pub index: u64,
    /// Human-readable campaign name.
    pub name: String,
    /// Ledger account holding the campaign's funds.
    pub address: Address,
    /// Account that created the campaign.
    pub owner: Address,
    /// Accumulated funds in wei. Advisory: stale until the next refresh.
    pub balance: u128,
    /// Count of distinct funder accounts. Only ever grows.
    pub funders_count: u64,
}

impl Campaign {
    /// Balance in ether for display.
    pub fn display_balance(&self) -> f64 {
        wei_to_ether(self.balance)
    }

    /// Whether `account` created this campaign (case-insensitive).
    pub fn is_owned_by(&self, account: &Address) -> bool {
        self.owner == *account
    }
}

/// One spending request raised by a campaign owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingRequest {
    /// Campaign this request draws from.
    pub campaign_index: u64,
    /// Stable position within the campaign's request list.
    pub request_index: u64,
    /// Short label for the spend.
    pub name: String,
    /// What the owner intends to spend the funds on.
    pub description: String,
    /// Amount to withdraw on fulfillment, in wei.
    pub request_amount: u128,
    /// Distinct funder approvals so far. Non-decreasing until fulfillment.
    pub approval_count: u64,
    /// One-way flag: once true the request is terminal.
    pub fulfilled: bool,
}

impl FundingRequest {
    /// Whether the request has strict-majority approval for a campaign
    /// with `funders_count` funders.
    pub fn has_majority(&self, funders_count: u64) -> bool {
        is_majority_approved(self.approval_count, funders_count)
    }
}
