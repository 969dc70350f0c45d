//! In-Memory Reference Ledger
//!
//! A full `LedgerGateway` implementation that enforces the authoritative
//! campaign rules itself. It backs the demo binary and every scenario test
//! that needs an authority on the other side of the gateway without a
//! deployed contract.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use campaign_domain::{is_majority_approved, Address, Campaign, FundingRequest};
use chrono::Utc;
use parking_lot::RwLock;
use thiserror::Error;

use crate::error::LedgerError;
use crate::gateway::{LedgerGateway, TxReceipt};

/// Reasons the ledger rejects a transaction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleViolation {
    #[error("Campaign name is empty")]
    EmptyCampaignName,

    #[error("Funding value must be positive")]
    ZeroValueFunding,

    #[error("Unknown campaign {0}")]
    UnknownCampaign(u64),

    #[error("Unknown request {1} for campaign {0}")]
    UnknownRequest(u64, u64),

    #[error("Caller is not the campaign owner")]
    NotOwner,

    #[error("Caller has not funded the campaign")]
    NotFunder,

    #[error("Caller already approved this request")]
    AlreadyApproved,

    #[error("Request already fulfilled")]
    AlreadyFulfilled,

    #[error("Majority approval not reached")]
    MajorityNotReached,

    #[error("Campaign balance below request amount")]
    InsufficientBalance,

    #[error("Campaign balance overflow")]
    BalanceOverflow,
}

impl From<RuleViolation> for LedgerError {
    fn from(v: RuleViolation) -> Self {
        LedgerError::TransactionRejected(v.to_string())
    }
}

/// Authoritative per-campaign state.
#[derive(Debug, Clone)]
struct CampaignRecord {
    name: String,
    address: Address,
    owner: Address,
    balance: u128,
    funders: HashSet<Address>,
    requests: Vec<RequestRecord>,
}

#[derive(Debug, Clone)]
struct RequestRecord {
    name: String,
    description: String,
    request_amount: u128,
    approvals: HashSet<Address>,
    fulfilled: bool,
}

/// In-memory ledger answering for a single factory contract.
pub struct InMemoryLedger {
    contract: Address,
    campaigns: RwLock<Vec<CampaignRecord>>,
    tx_counter: AtomicU64,
    offline: AtomicBool,
}

impl InMemoryLedger {
    pub fn new(contract: Address) -> Self {
        Self {
            contract,
            campaigns: RwLock::new(Vec::new()),
            tx_counter: AtomicU64::new(0),
            offline: AtomicBool::new(false),
        }
    }

    /// Contract address this ledger answers for.
    pub fn contract(&self) -> &Address {
        &self.contract
    }

    /// Simulate transport loss. While offline every call fails with
    /// `LedgerUnavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_reachable(&self, contract: &Address) -> Result<(), LedgerError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(LedgerError::LedgerUnavailable("ledger offline".to_string()));
        }
        if *contract != self.contract {
            return Err(LedgerError::LedgerUnavailable(format!(
                "no contract deployed at {contract}"
            )));
        }
        Ok(())
    }

    fn next_receipt(&self, op: &str) -> TxReceipt {
        let seq = self.tx_counter.fetch_add(1, Ordering::SeqCst);
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.contract.as_str().to_ascii_lowercase().as_bytes());
        hasher.update(op.as_bytes());
        hasher.update(&seq.to_le_bytes());
        TxReceipt {
            tx_id: format!("0x{}", hasher.finalize().to_hex()),
            submitted_at: Utc::now(),
        }
    }
}

/// Deterministic campaign address derived from the factory contract and
/// the campaign index.
fn derive_campaign_address(contract: &Address, index: u64) -> Address {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"campaign");
    hasher.update(contract.as_str().to_ascii_lowercase().as_bytes());
    hasher.update(&index.to_le_bytes());
    let digest = hasher.finalize();
    let hex: String = digest.as_bytes()[..20]
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect();
    Address::new(format!("0x{hex}"))
}

fn project(records: &[CampaignRecord]) -> Vec<Campaign> {
    records
        .iter()
        .enumerate()
        .map(|(index, r)| Campaign {
            index: index as u64,
            name: r.name.clone(),
            address: r.address.clone(),
            owner: r.owner.clone(),
            balance: r.balance,
            funders_count: r.funders.len() as u64,
        })
        .collect()
}

#[async_trait]
impl LedgerGateway for InMemoryLedger {
    async fn get_all_campaign_summary(
        &self,
        contract: &Address,
    ) -> Result<Vec<Campaign>, LedgerError> {
        self.check_reachable(contract)?;
        let campaigns = self.campaigns.read();
        Ok(project(&campaigns))
    }

    async fn create_campaign(
        &self,
        contract: &Address,
        caller: &Address,
        name: &str,
    ) -> Result<TxReceipt, LedgerError> {
        self.check_reachable(contract)?;
        if name.trim().is_empty() {
            return Err(RuleViolation::EmptyCampaignName.into());
        }

        let mut campaigns = self.campaigns.write();
        let index = campaigns.len() as u64;
        let address = derive_campaign_address(&self.contract, index);
        campaigns.push(CampaignRecord {
            name: name.to_string(),
            address,
            owner: caller.clone(),
            balance: 0,
            funders: HashSet::new(),
            requests: Vec::new(),
        });
        drop(campaigns);

        tracing::info!("Campaign {} created by {}", index, caller);
        Ok(self.next_receipt("create_campaign"))
    }

    async fn get_all_request_for_campaign(
        &self,
        contract: &Address,
        campaign_index: u64,
    ) -> Result<Vec<FundingRequest>, LedgerError> {
        self.check_reachable(contract)?;
        let campaigns = self.campaigns.read();
        let record = campaigns
            .get(campaign_index as usize)
            .ok_or_else(|| LedgerError::NotFound(format!("campaign {campaign_index}")))?;

        Ok(record
            .requests
            .iter()
            .enumerate()
            .map(|(request_index, r)| FundingRequest {
                campaign_index,
                request_index: request_index as u64,
                name: r.name.clone(),
                description: r.description.clone(),
                request_amount: r.request_amount,
                approval_count: r.approvals.len() as u64,
                fulfilled: r.fulfilled,
            })
            .collect())
    }

    async fn address_to_funder_for_campaign(
        &self,
        contract: &Address,
        campaign_index: u64,
        account: &Address,
    ) -> Result<bool, LedgerError> {
        self.check_reachable(contract)?;
        let campaigns = self.campaigns.read();
        let record = campaigns
            .get(campaign_index as usize)
            .ok_or_else(|| LedgerError::NotFound(format!("campaign {campaign_index}")))?;
        Ok(record.funders.contains(account))
    }

    async fn create_request_for_campaign(
        &self,
        contract: &Address,
        caller: &Address,
        campaign_index: u64,
        name: &str,
        description: &str,
        request_amount: u128,
    ) -> Result<TxReceipt, LedgerError> {
        self.check_reachable(contract)?;
        let mut campaigns = self.campaigns.write();
        let record = campaigns
            .get_mut(campaign_index as usize)
            .ok_or(RuleViolation::UnknownCampaign(campaign_index))?;

        // Only the campaign owner may raise spending requests.
        if record.owner != *caller {
            return Err(RuleViolation::NotOwner.into());
        }

        let request_index = record.requests.len() as u64;
        record.requests.push(RequestRecord {
            name: name.to_string(),
            description: description.to_string(),
            request_amount,
            approvals: HashSet::new(),
            fulfilled: false,
        });
        drop(campaigns);

        tracing::info!(
            "Request {} created for campaign {} by {}",
            request_index,
            campaign_index,
            caller
        );
        Ok(self.next_receipt("create_request"))
    }

    async fn approve_request_for_campaign(
        &self,
        contract: &Address,
        caller: &Address,
        campaign_index: u64,
        request_index: u64,
    ) -> Result<TxReceipt, LedgerError> {
        self.check_reachable(contract)?;
        let mut campaigns = self.campaigns.write();
        let record = campaigns
            .get_mut(campaign_index as usize)
            .ok_or(RuleViolation::UnknownCampaign(campaign_index))?;

        // Only funders approve.
        if !record.funders.contains(caller) {
            return Err(RuleViolation::NotFunder.into());
        }

        let request = record
            .requests
            .get_mut(request_index as usize)
            .ok_or(RuleViolation::UnknownRequest(campaign_index, request_index))?;

        if request.fulfilled {
            return Err(RuleViolation::AlreadyFulfilled.into());
        }
        // At most one approval per account.
        if !request.approvals.insert(caller.clone()) {
            return Err(RuleViolation::AlreadyApproved.into());
        }
        drop(campaigns);

        tracing::debug!(
            "Request {}/{} approved by {}",
            campaign_index,
            request_index,
            caller
        );
        Ok(self.next_receipt("approve_request"))
    }

    async fn fulfill_request_for_campaign(
        &self,
        contract: &Address,
        caller: &Address,
        campaign_index: u64,
        request_index: u64,
    ) -> Result<TxReceipt, LedgerError> {
        self.check_reachable(contract)?;
        let mut campaigns = self.campaigns.write();
        let record = campaigns
            .get_mut(campaign_index as usize)
            .ok_or(RuleViolation::UnknownCampaign(campaign_index))?;

        // Only the campaign owner may fulfill.
        if record.owner != *caller {
            return Err(RuleViolation::NotOwner.into());
        }

        let funders_count = record.funders.len() as u64;
        let balance = record.balance;
        let request = record
            .requests
            .get_mut(request_index as usize)
            .ok_or(RuleViolation::UnknownRequest(campaign_index, request_index))?;

        if request.fulfilled {
            return Err(RuleViolation::AlreadyFulfilled.into());
        }
        if !is_majority_approved(request.approvals.len() as u64, funders_count) {
            return Err(RuleViolation::MajorityNotReached.into());
        }
        if balance < request.request_amount {
            return Err(RuleViolation::InsufficientBalance.into());
        }

        let amount = request.request_amount;
        request.fulfilled = true;
        record.balance -= amount;
        drop(campaigns);

        tracing::info!(
            "Request {}/{} fulfilled for {} wei",
            campaign_index,
            request_index,
            amount
        );
        Ok(self.next_receipt("fulfill_request"))
    }

    async fn fund_campaign(
        &self,
        contract: &Address,
        caller: &Address,
        campaign_index: u64,
        value: u128,
    ) -> Result<TxReceipt, LedgerError> {
        self.check_reachable(contract)?;
        if value == 0 {
            return Err(RuleViolation::ZeroValueFunding.into());
        }

        let mut campaigns = self.campaigns.write();
        let record = campaigns
            .get_mut(campaign_index as usize)
            .ok_or(RuleViolation::UnknownCampaign(campaign_index))?;

        record.balance = record
            .balance
            .checked_add(value)
            .ok_or(RuleViolation::BalanceOverflow)?;
        // Funding makes the caller a funder permanently.
        record.funders.insert(caller.clone());
        drop(campaigns);

        tracing::debug!(
            "Campaign {} funded with {} wei by {}",
            campaign_index,
            value,
            caller
        );
        Ok(self.next_receipt("fund_campaign"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTRACT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
    const OWNER: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
    const FUNDER_A: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";
    const FUNDER_B: &str = "0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC";
    const FUNDER_C: &str = "0x90F79bf6EB2c4f870365E785982E1f101E93b906";

    fn ledger() -> InMemoryLedger {
        InMemoryLedger::new(Address::from(CONTRACT))
    }

    fn contract() -> Address {
        Address::from(CONTRACT)
    }

    async fn seed_campaign(ledger: &InMemoryLedger) {
        ledger
            .create_campaign(&contract(), &Address::from(OWNER), "School Roof")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_creates_and_lists_campaigns() {
        let ledger = ledger();
        seed_campaign(&ledger).await;

        let summary = ledger.get_all_campaign_summary(&contract()).await.unwrap();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].index, 0);
        assert_eq!(summary[0].name, "School Roof");
        assert_eq!(summary[0].owner, Address::from(OWNER));
        assert_eq!(summary[0].balance, 0);
        assert_eq!(summary[0].funders_count, 0);
        assert!(summary[0].address.as_str().starts_with("0x"));
        assert_eq!(summary[0].address.as_str().len(), 42);
    }

    #[test]
    fn test_campaign_addresses_deterministic() {
        let a = derive_campaign_address(&contract(), 0);
        let b = derive_campaign_address(&contract(), 0);
        let c = derive_campaign_address(&contract(), 1);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn test_rejects_empty_campaign_name() {
        let ledger = ledger();
        let err = ledger
            .create_campaign(&contract(), &Address::from(OWNER), "   ")
            .await
            .unwrap_err();
        assert!(err.is_rejected());
    }

    #[tokio::test]
    async fn test_funding_registers_funder_and_balance() {
        let ledger = ledger();
        seed_campaign(&ledger).await;
        let funder = Address::from(FUNDER_A);

        ledger
            .fund_campaign(&contract(), &funder, 0, 5_000)
            .await
            .unwrap();
        ledger
            .fund_campaign(&contract(), &funder, 0, 3_000)
            .await
            .unwrap();

        let summary = ledger.get_all_campaign_summary(&contract()).await.unwrap();
        assert_eq!(summary[0].balance, 8_000);
        // Repeat funding does not double-count the funder.
        assert_eq!(summary[0].funders_count, 1);
        assert!(ledger
            .address_to_funder_for_campaign(&contract(), 0, &funder)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_rejects_zero_value_funding() {
        let ledger = ledger();
        seed_campaign(&ledger).await;

        let err = ledger
            .fund_campaign(&contract(), &Address::from(FUNDER_A), 0, 0)
            .await
            .unwrap_err();
        assert!(err.is_rejected());
    }

    #[tokio::test]
    async fn test_funder_check_is_case_insensitive() {
        let ledger = ledger();
        seed_campaign(&ledger).await;
        ledger
            .fund_campaign(&contract(), &Address::from(FUNDER_A), 0, 100)
            .await
            .unwrap();

        let lowered = Address::new(FUNDER_A.to_ascii_lowercase());
        assert!(ledger
            .address_to_funder_for_campaign(&contract(), 0, &lowered)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_only_owner_creates_requests() {
        let ledger = ledger();
        seed_campaign(&ledger).await;

        let err = ledger
            .create_request_for_campaign(
                &contract(),
                &Address::from(FUNDER_A),
                0,
                "Materials",
                "Buy roofing sheets",
                1_000,
            )
            .await
            .unwrap_err();
        assert_eq!(err, RuleViolation::NotOwner.into());
    }

    #[tokio::test]
    async fn test_only_funders_approve_and_only_once() {
        let ledger = ledger();
        seed_campaign(&ledger).await;
        let owner = Address::from(OWNER);
        let funder = Address::from(FUNDER_A);

        ledger
            .fund_campaign(&contract(), &funder, 0, 2_000)
            .await
            .unwrap();
        ledger
            .create_request_for_campaign(&contract(), &owner, 0, "Materials", "Sheets", 1_000)
            .await
            .unwrap();

        let err = ledger
            .approve_request_for_campaign(&contract(), &Address::from(FUNDER_B), 0, 0)
            .await
            .unwrap_err();
        assert_eq!(err, RuleViolation::NotFunder.into());

        ledger
            .approve_request_for_campaign(&contract(), &funder, 0, 0)
            .await
            .unwrap();
        let err = ledger
            .approve_request_for_campaign(&contract(), &funder, 0, 0)
            .await
            .unwrap_err();
        assert_eq!(err, RuleViolation::AlreadyApproved.into());
    }

    #[tokio::test]
    async fn test_fulfill_requires_owner_majority_and_funds() {
        let ledger = ledger();
        seed_campaign(&ledger).await;
        let owner = Address::from(OWNER);
        let funders = [
            Address::from(FUNDER_A),
            Address::from(FUNDER_B),
            Address::from(FUNDER_C),
        ];

        for funder in &funders {
            ledger
                .fund_campaign(&contract(), funder, 0, 1_000)
                .await
                .unwrap();
        }
        ledger
            .create_request_for_campaign(&contract(), &owner, 0, "Materials", "Sheets", 2_500)
            .await
            .unwrap();

        // 1 of 3 approvals is not a strict majority.
        ledger
            .approve_request_for_campaign(&contract(), &funders[0], 0, 0)
            .await
            .unwrap();
        let err = ledger
            .fulfill_request_for_campaign(&contract(), &owner, 0, 0)
            .await
            .unwrap_err();
        assert_eq!(err, RuleViolation::MajorityNotReached.into());

        // 2 of 3 is.
        ledger
            .approve_request_for_campaign(&contract(), &funders[1], 0, 0)
            .await
            .unwrap();
        let err = ledger
            .fulfill_request_for_campaign(&contract(), &funders[0], 0, 0)
            .await
            .unwrap_err();
        assert_eq!(err, RuleViolation::NotOwner.into());

        ledger
            .fulfill_request_for_campaign(&contract(), &owner, 0, 0)
            .await
            .unwrap();

        let summary = ledger.get_all_campaign_summary(&contract()).await.unwrap();
        assert_eq!(summary[0].balance, 500);
        let requests = ledger
            .get_all_request_for_campaign(&contract(), 0)
            .await
            .unwrap();
        assert!(requests[0].fulfilled);

        // Fulfilled is terminal.
        let err = ledger
            .fulfill_request_for_campaign(&contract(), &owner, 0, 0)
            .await
            .unwrap_err();
        assert_eq!(err, RuleViolation::AlreadyFulfilled.into());
        let err = ledger
            .approve_request_for_campaign(&contract(), &funders[2], 0, 0)
            .await
            .unwrap_err();
        assert_eq!(err, RuleViolation::AlreadyFulfilled.into());
    }

    #[tokio::test]
    async fn test_fulfill_rejected_when_balance_short() {
        let ledger = ledger();
        seed_campaign(&ledger).await;
        let owner = Address::from(OWNER);

        ledger
            .fund_campaign(&contract(), &Address::from(FUNDER_A), 0, 100)
            .await
            .unwrap();
        ledger
            .create_request_for_campaign(&contract(), &owner, 0, "Materials", "Sheets", 1_000)
            .await
            .unwrap();
        ledger
            .approve_request_for_campaign(&contract(), &Address::from(FUNDER_A), 0, 0)
            .await
            .unwrap();

        let err = ledger
            .fulfill_request_for_campaign(&contract(), &owner, 0, 0)
            .await
            .unwrap_err();
        assert_eq!(err, RuleViolation::InsufficientBalance.into());
    }

    #[tokio::test]
    async fn test_unknown_indices_split_reads_from_writes() {
        let ledger = ledger();

        let err = ledger
            .get_all_request_for_campaign(&contract(), 7)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(_)));

        let err = ledger
            .address_to_funder_for_campaign(&contract(), 7, &Address::from(FUNDER_A))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(_)));

        let err = ledger
            .fund_campaign(&contract(), &Address::from(FUNDER_A), 7, 100)
            .await
            .unwrap_err();
        assert_eq!(err, RuleViolation::UnknownCampaign(7).into());

        seed_campaign(&ledger).await;
        ledger
            .fund_campaign(&contract(), &Address::from(FUNDER_A), 0, 100)
            .await
            .unwrap();
        let err = ledger
            .approve_request_for_campaign(&contract(), &Address::from(FUNDER_A), 0, 9)
            .await
            .unwrap_err();
        assert_eq!(err, RuleViolation::UnknownRequest(0, 9).into());
    }

    #[tokio::test]
    async fn test_offline_ledger_is_unavailable() {
        let ledger = ledger();
        seed_campaign(&ledger).await;

        ledger.set_offline(true);
        let err = ledger
            .get_all_campaign_summary(&contract())
            .await
            .unwrap_err();
        assert!(err.is_unavailable());

        ledger.set_offline(false);
        assert_eq!(
            ledger
                .get_all_campaign_summary(&contract())
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_wrong_contract_is_unavailable() {
        let ledger = ledger();
        let other = Address::from("0x0000000000000000000000000000000000000bad");

        let err = ledger.get_all_campaign_summary(&other).await.unwrap_err();
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn test_receipts_are_unique() {
        let ledger = ledger();
        let owner = Address::from(OWNER);

        let a = ledger
            .create_campaign(&contract(), &owner, "First")
            .await
            .unwrap();
        let b = ledger
            .create_campaign(&contract(), &owner, "Second")
            .await
            .unwrap();
        assert_ne!(a.tx_id, b.tx_id);
        assert!(a.tx_id.starts_with("0x"));
        assert_eq!(a.tx_id.len(), 66);
    }
}
