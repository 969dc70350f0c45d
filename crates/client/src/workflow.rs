//! Workflow Engine - campaign operations and cache reconciliation
//!
//! Every operation runs the same pipeline: local precondition checks,
//! contract resolution for the active network, a bounded gateway call,
//! then registry reconciliation. The ledger stays authoritative; local
//! checks only turn known-losing submissions into immediate rejections.

use std::sync::Arc;

use campaign_domain::{Address, Campaign, FundingRequest};
use dashmap::{mapref::entry::Entry, DashMap};
use ledger_gateway::{ContractDirectory, LedgerError, LedgerGateway, TxReceipt};
use serde::{Deserialize, Serialize};

use crate::context::ClientContext;
use crate::registry::CampaignRegistry;
use crate::requests::RequestRegistry;
use crate::session::WalletSession;
use crate::ClientConfig;

/// Everything one campaign detail view needs, assembled in one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignView {
    pub campaign: Campaign,
    pub requests: Vec<FundingRequest>,
    /// Whether the session account has funded this campaign.
    pub viewer_is_funder: bool,
    /// Whether the session account owns this campaign.
    pub viewer_is_owner: bool,
}

/// Drives the campaign workflows against the ledger and keeps the
/// registries reconciled.
pub struct WorkflowEngine {
    ctx: Arc<ClientContext>,
    campaigns: CampaignRegistry,
    requests: RequestRegistry,
    /// (campaign, request) pairs with a transaction in flight.
    pending: DashMap<(u64, u64), ()>,
}

/// Exclusive right to submit for one (campaign, request) pair. Released
/// on drop, once the pending call has resolved either way.
struct MutationPermit<'a> {
    pending: &'a DashMap<(u64, u64), ()>,
    key: (u64, u64),
}

impl Drop for MutationPermit<'_> {
    fn drop(&mut self) {
        self.pending.remove(&self.key);
    }
}

impl WorkflowEngine {
    /// Engine over a gateway and the known contract deployments, with the
    /// default configuration.
    pub fn new(gateway: Arc<dyn LedgerGateway>, directory: ContractDirectory) -> Self {
        Self::with_config(gateway, directory, ClientConfig::default())
    }

    pub fn with_config(
        gateway: Arc<dyn LedgerGateway>,
        directory: ContractDirectory,
        config: ClientConfig,
    ) -> Self {
        let ctx = Arc::new(ClientContext::new(gateway, directory, config));
        Self {
            campaigns: CampaignRegistry::new(),
            requests: RequestRegistry::new(ctx.clone()),
            pending: DashMap::new(),
            ctx,
        }
    }

    /// Campaign read model.
    pub fn campaigns(&self) -> &CampaignRegistry {
        &self.campaigns
    }

    /// Live request and funder queries.
    pub fn requests(&self) -> &RequestRegistry {
        &self.requests
    }

    /// Current wallet session.
    pub fn session(&self) -> WalletSession {
        self.ctx.session_snapshot()
    }

    /// Apply a session reported by the wallet collaborator.
    ///
    /// Any change of connection, account or network discards the campaign
    /// snapshot wholesale; a connected session is then rebuilt from the
    /// ledger. Re-reporting an identical session is a no-op.
    pub async fn update_session(&self, new: WalletSession) -> Result<(), LedgerError> {
        let connected = new.connected;
        {
            let mut session = self.ctx.session.write();
            if *session == new {
                return Ok(());
            }
            tracing::info!(
                "Wallet session changed: connected={} network={:?}",
                new.connected,
                new.network
            );
            *session = new;
        }

        self.campaigns.reset();
        if connected {
            self.refresh_campaigns().await?;
        }
        Ok(())
    }

    /// Fetch the campaign summary and swap it into the registry.
    ///
    /// On failure the previous snapshot is retained. A round superseded by
    /// a newer refresh or a session reset is discarded and still reports Ok.
    pub async fn refresh_campaigns(&self) -> Result<(), LedgerError> {
        let ticket = self.campaigns.begin_refresh();
        let contract = self.ctx.resolve_contract()?;
        let summary = self
            .ctx
            .bounded(
                "get_all_campaign_summary",
                self.ctx.gateway.get_all_campaign_summary(&contract),
            )
            .await?;

        let count = summary.len();
        if self.campaigns.install(ticket, summary) {
            tracing::debug!("Installed campaign snapshot with {} entries", count);
        }
        Ok(())
    }

    /// Register a new campaign owned by the session account.
    pub async fn create_campaign(&self, name: &str) -> Result<TxReceipt, LedgerError> {
        if name.trim().is_empty() {
            return Err(LedgerError::TransactionRejected(
                "campaign name must not be empty".to_string(),
            ));
        }

        let (contract, caller) = self.ctx.mutation_params()?;
        let receipt = self
            .ctx
            .bounded(
                "create_campaign",
                self.ctx.gateway.create_campaign(&contract, &caller, name),
            )
            .await?;

        tracing::info!("Campaign creation submitted: {}", receipt.tx_id);
        self.refresh_after_mutation().await;
        Ok(receipt)
    }

    /// Contribute `value` wei to a campaign. The session account becomes a
    /// funder of it permanently.
    pub async fn fund_campaign(
        &self,
        campaign_index: u64,
        value: u128,
    ) -> Result<TxReceipt, LedgerError> {
        if value == 0 {
            return Err(LedgerError::TransactionRejected(
                "funding value must be positive".to_string(),
            ));
        }

        let (contract, caller) = self.ctx.mutation_params()?;
        let receipt = self
            .ctx
            .bounded(
                "fund_campaign",
                self.ctx
                    .gateway
                    .fund_campaign(&contract, &caller, campaign_index, value),
            )
            .await?;

        tracing::debug!(
            "Funded campaign {} with {} wei: {}",
            campaign_index,
            value,
            receipt.tx_id
        );
        self.refresh_after_mutation().await;
        Ok(receipt)
    }

    /// Raise a spending request against a campaign. The ledger enforces
    /// that only the campaign owner may do this. Unlike funding, a zero
    /// amount is a valid request.
    pub async fn create_request(
        &self,
        campaign_index: u64,
        name: &str,
        description: &str,
        request_amount: u128,
    ) -> Result<TxReceipt, LedgerError> {
        let (contract, caller) = self.ctx.mutation_params()?;
        let receipt = self
            .ctx
            .bounded(
                "create_request_for_campaign",
                self.ctx.gateway.create_request_for_campaign(
                    &contract,
                    &caller,
                    campaign_index,
                    name,
                    description,
                    request_amount,
                ),
            )
            .await?;

        tracing::info!(
            "Request created for campaign {}: {}",
            campaign_index,
            receipt.tx_id
        );
        self.refresh_after_mutation().await;
        Ok(receipt)
    }

    /// Approve a funding request as the session account. Funder status and
    /// the one-approval-per-account rule are enforced by the ledger.
    pub async fn approve_request(
        &self,
        campaign_index: u64,
        request_index: u64,
    ) -> Result<TxReceipt, LedgerError> {
        let (contract, caller) = self.ctx.mutation_params()?;
        let permit = self.acquire_permit(campaign_index, request_index)?;

        let result = self
            .ctx
            .bounded(
                "approve_request_for_campaign",
                self.ctx.gateway.approve_request_for_campaign(
                    &contract,
                    &caller,
                    campaign_index,
                    request_index,
                ),
            )
            .await;
        drop(permit);
        let receipt = result?;

        tracing::debug!(
            "Approved request {}/{}: {}",
            campaign_index,
            request_index,
            receipt.tx_id
        );
        self.refresh_after_mutation().await;
        Ok(receipt)
    }

    /// Fulfill an approved request, withdrawing its amount. Checks the live
    /// request state first so a stale view cannot submit a known-losing
    /// transaction; the ledger re-checks everything on submission.
    pub async fn fulfill_request(
        &self,
        campaign_index: u64,
        request_index: u64,
    ) -> Result<TxReceipt, LedgerError> {
        let (contract, caller) = self.ctx.mutation_params()?;
        let permit = self.acquire_permit(campaign_index, request_index)?;

        let result = self
            .submit_fulfill(&contract, &caller, campaign_index, request_index)
            .await;
        drop(permit);
        let receipt = result?;

        tracing::info!(
            "Fulfilled request {}/{}: {}",
            campaign_index,
            request_index,
            receipt.tx_id
        );
        self.refresh_after_mutation().await;
        Ok(receipt)
    }

    /// Whether the session account has funded the campaign. No account
    /// means no: the question only makes sense for a signed-in viewer.
    pub async fn is_funder(&self, campaign_index: u64) -> Result<bool, LedgerError> {
        let Some(account) = self.ctx.current_account() else {
            return Ok(false);
        };
        self.requests.is_funder(campaign_index, &account).await
    }

    /// Whether the session account owns the campaign, per the current
    /// snapshot. Comparison is case-insensitive.
    pub fn is_owner(&self, campaign_index: u64) -> Result<bool, LedgerError> {
        let Some(account) = self.ctx.current_account() else {
            return Ok(false);
        };
        Ok(self.campaigns.get(campaign_index)?.is_owned_by(&account))
    }

    /// Assemble a campaign detail view: snapshot campaign, live requests,
    /// live funder status. The two live reads run in parallel.
    pub async fn view_campaign(&self, campaign_index: u64) -> Result<CampaignView, LedgerError> {
        let campaign = self.campaigns.get(campaign_index)?;
        let (requests, viewer_is_funder) = futures::try_join!(
            self.requests.list_for_campaign(campaign_index),
            self.is_funder(campaign_index),
        )?;
        let viewer_is_owner = self
            .ctx
            .current_account()
            .map(|account| campaign.is_owned_by(&account))
            .unwrap_or(false);

        Ok(CampaignView {
            campaign,
            requests,
            viewer_is_funder,
            viewer_is_owner,
        })
    }

    async fn submit_fulfill(
        &self,
        contract: &Address,
        caller: &Address,
        campaign_index: u64,
        request_index: u64,
    ) -> Result<TxReceipt, LedgerError> {
        let (campaigns, requests) = futures::try_join!(
            self.ctx.bounded(
                "get_all_campaign_summary",
                self.ctx.gateway.get_all_campaign_summary(contract),
            ),
            self.ctx.bounded(
                "get_all_request_for_campaign",
                self.ctx
                    .gateway
                    .get_all_request_for_campaign(contract, campaign_index),
            ),
        )?;

        let campaign = campaigns
            .get(campaign_index as usize)
            .ok_or_else(|| LedgerError::NotFound(format!("campaign {campaign_index}")))?;
        let request = requests.get(request_index as usize).ok_or_else(|| {
            LedgerError::NotFound(format!(
                "request {request_index} for campaign {campaign_index}"
            ))
        })?;

        if !campaign.is_owned_by(caller) {
            return Err(LedgerError::TransactionRejected(
                "only the campaign owner can fulfill a request".to_string(),
            ));
        }
        if request.fulfilled {
            return Err(LedgerError::TransactionRejected(
                "request already fulfilled".to_string(),
            ));
        }
        if !request.has_majority(campaign.funders_count) {
            return Err(LedgerError::TransactionRejected(
                "majority approval not reached".to_string(),
            ));
        }

        self.ctx
            .bounded(
                "fulfill_request_for_campaign",
                self.ctx.gateway.fulfill_request_for_campaign(
                    contract,
                    caller,
                    campaign_index,
                    request_index,
                ),
            )
            .await
    }

    fn acquire_permit(
        &self,
        campaign_index: u64,
        request_index: u64,
    ) -> Result<MutationPermit<'_>, LedgerError> {
        let key = (campaign_index, request_index);
        match self.pending.entry(key) {
            Entry::Occupied(_) => Err(LedgerError::TransactionRejected(format!(
                "a transaction for request {request_index} of campaign {campaign_index} is already pending"
            ))),
            Entry::Vacant(vacant) => {
                vacant.insert(());
                Ok(MutationPermit {
                    pending: &self.pending,
                    key,
                })
            }
        }
    }

    async fn refresh_after_mutation(&self) {
        if let Err(e) = self.refresh_campaigns().await {
            tracing::warn!("Registry refresh after mutation failed: {}", e);
        }
    }
}
