//! Shared client context - gateway handle, directory, session, config

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use campaign_domain::Address;
use ledger_gateway::{ContractDirectory, LedgerError, LedgerGateway};
use parking_lot::RwLock;

use crate::session::WalletSession;
use crate::ClientConfig;

/// State shared by every registry and workflow.
pub(crate) struct ClientContext {
    pub(crate) gateway: Arc<dyn LedgerGateway>,
    pub(crate) directory: ContractDirectory,
    pub(crate) session: RwLock<WalletSession>,
    pub(crate) config: ClientConfig,
}

impl ClientContext {
    pub(crate) fn new(
        gateway: Arc<dyn LedgerGateway>,
        directory: ContractDirectory,
        config: ClientConfig,
    ) -> Self {
        Self {
            gateway,
            directory,
            session: RwLock::new(WalletSession::disconnected()),
            config,
        }
    }

    /// Contract deployed for the session's network, failing fast when the
    /// wallet is disconnected or the network has no deployment.
    pub(crate) fn resolve_contract(&self) -> Result<Address, LedgerError> {
        let session = self.session.read();
        self.contract_for_session(&session)
    }

    /// Contract and signing account for a mutating call, read from one
    /// consistent view of the session.
    pub(crate) fn mutation_params(&self) -> Result<(Address, Address), LedgerError> {
        let session = self.session.read();
        let contract = self.contract_for_session(&session)?;
        let caller = session.account.clone().ok_or_else(|| {
            LedgerError::LedgerUnavailable("no account in wallet session".to_string())
        })?;
        Ok((contract, caller))
    }

    pub(crate) fn current_account(&self) -> Option<Address> {
        self.session.read().account.clone()
    }

    pub(crate) fn session_snapshot(&self) -> WalletSession {
        self.session.read().clone()
    }

    fn contract_for_session(&self, session: &WalletSession) -> Result<Address, LedgerError> {
        if !session.connected {
            return Err(LedgerError::LedgerUnavailable(
                "wallet not connected".to_string(),
            ));
        }
        let network = session
            .network
            .ok_or_else(|| LedgerError::LedgerUnavailable("no active network".to_string()))?;
        self.directory
            .contract_for(network)
            .cloned()
            .ok_or_else(|| {
                LedgerError::LedgerUnavailable(format!("no contract deployed on network {network}"))
            })
    }

    /// Run a gateway call under the configured timeout bound. Expiry is a
    /// transport failure, not a rejection.
    pub(crate) async fn bounded<T>(
        &self,
        op: &str,
        call: impl Future<Output = Result<T, LedgerError>>,
    ) -> Result<T, LedgerError> {
        let bound = Duration::from_millis(self.config.call_timeout_ms);
        match tokio::time::timeout(bound, call).await {
            Ok(result) => result,
            Err(_) => Err(LedgerError::LedgerUnavailable(format!(
                "{op} timed out after {}ms",
                self.config.call_timeout_ms
            ))),
        }
    }
}
