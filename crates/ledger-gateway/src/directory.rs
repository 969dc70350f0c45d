//! Contract directory - network id to deployed contract address
//!
//! The client resolves the active contract through this table on every
//! operation, so switching networks mid-session never routes a call to
//! a stale deployment.

use std::collections::HashMap;

use campaign_domain::Address;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Chain/network identifier as reported by the wallet session.
pub type NetworkId = u64;

/// Maps each supported network to the factory contract deployed on it.
///
/// A network may list several historical deployments; the first entry
/// is the active one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractDirectory {
    entries: HashMap<NetworkId, Vec<Address>>,
}

impl ContractDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a directory from its JSON form:
    /// `{"31337": ["0x5FbDB...aa3"], "11155111": ["0xe7f17...512"]}`.
    pub fn from_json_str(raw: &str) -> Result<Self, LedgerError> {
        let parsed: HashMap<String, Vec<String>> = serde_json::from_str(raw)
            .map_err(|e| LedgerError::LedgerUnavailable(format!("bad contract directory: {e}")))?;

        let mut entries = HashMap::with_capacity(parsed.len());
        for (network, addresses) in parsed {
            let id: NetworkId = network.parse().map_err(|_| {
                LedgerError::LedgerUnavailable(format!("bad network id in directory: {network}"))
            })?;
            entries.insert(id, addresses.into_iter().map(Address::new).collect());
        }
        Ok(Self { entries })
    }

    /// Register (or prepend to) a network's deployment list.
    pub fn insert(&mut self, network: NetworkId, contract: Address) {
        self.entries.entry(network).or_default().insert(0, contract);
    }

    /// Active contract for a network, if one is deployed there.
    pub fn contract_for(&self, network: NetworkId) -> Option<&Address> {
        self.entries.get(&network).and_then(|list| list.first())
    }

    /// Whether any contract is known for the network.
    pub fn supports(&self, network: NetworkId) -> bool {
        self.contract_for(network).is_some()
    }

    /// Networks with at least one deployment, unordered.
    pub fn networks(&self) -> impl Iterator<Item = NetworkId> + '_ {
        self.entries
            .iter()
            .filter(|(_, list)| !list.is_empty())
            .map(|(id, _)| *id)
    }
}
