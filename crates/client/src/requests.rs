//! Request Registry - always-live request and funder queries
//!
//! Approvals and fulfillment move while other views are open, so request
//! state is never cached across views. Every query goes to the ledger.

use std::sync::Arc;

use campaign_domain::{Address, FundingRequest};
use ledger_gateway::LedgerError;

use crate::context::ClientContext;

/// Live view over one campaign's funding requests and funder set.
pub struct RequestRegistry {
    ctx: Arc<ClientContext>,
}

impl RequestRegistry {
    pub(crate) fn new(ctx: Arc<ClientContext>) -> Self {
        Self { ctx }
    }

    /// All requests of a campaign, in index order, fetched live.
    pub async fn list_for_campaign(
        &self,
        campaign_index: u64,
    ) -> Result<Vec<FundingRequest>, LedgerError> {
        let contract = self.ctx.resolve_contract()?;
        self.ctx
            .bounded(
                "get_all_request_for_campaign",
                self.ctx
                    .gateway
                    .get_all_request_for_campaign(&contract, campaign_index),
            )
            .await
    }

    /// Whether `account` has ever funded the campaign, fetched live. A
    /// definitive false comes from the ledger, never from a cache.
    pub async fn is_funder(
        &self,
        campaign_index: u64,
        account: &Address,
    ) -> Result<bool, LedgerError> {
        let contract = self.ctx.resolve_contract()?;
        self.ctx
            .bounded(
                "address_to_funder_for_campaign",
                self.ctx.gateway.address_to_funder_for_campaign(
                    &contract,
                    campaign_index,
                    account,
                ),
            )
            .await
    }
}
