//! Campaign Registry - atomically swapped snapshot of campaign summaries
//!
//! Readers always observe a complete snapshot, either the previous one or
//! the next one. Overlapping refreshes are ordered by ticket: the refresh
//! that started later wins regardless of which response arrives first.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use campaign_domain::Campaign;
use ledger_gateway::LedgerError;
use parking_lot::RwLock;

/// Refresh round identifier, monotonically increasing.
pub type RefreshTicket = u64;

struct Inner {
    snapshot: Arc<Vec<Campaign>>,
    installed: RefreshTicket,
}

/// Read-model cache over the ledger's campaign summaries.
pub struct CampaignRegistry {
    inner: RwLock<Inner>,
    issued: AtomicU64,
}

impl CampaignRegistry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                snapshot: Arc::new(Vec::new()),
                installed: 0,
            }),
            issued: AtomicU64::new(0),
        }
    }

    /// Start a refresh round and get its ticket.
    pub fn begin_refresh(&self) -> RefreshTicket {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Install a completed refresh. Returns false when the ticket has been
    /// superseded by a newer install or a reset; the completion is then
    /// discarded without touching the snapshot.
    pub fn install(&self, ticket: RefreshTicket, campaigns: Vec<Campaign>) -> bool {
        let mut inner = self.inner.write();
        if ticket <= inner.installed {
            tracing::debug!(
                "Discarding superseded refresh (ticket {} <= {})",
                ticket,
                inner.installed
            );
            return false;
        }
        inner.snapshot = Arc::new(campaigns);
        inner.installed = ticket;
        true
    }

    /// Current snapshot. The `Arc` keeps a consistent view even while a
    /// newer snapshot gets installed.
    pub fn snapshot(&self) -> Arc<Vec<Campaign>> {
        self.inner.read().snapshot.clone()
    }

    /// Campaign at `index` in the current snapshot.
    pub fn get(&self, index: u64) -> Result<Campaign, LedgerError> {
        self.snapshot()
            .get(index as usize)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("campaign {index} not in snapshot")))
    }

    pub fn len(&self) -> usize {
        self.inner.read().snapshot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Discard the snapshot wholesale and invalidate every refresh begun
    /// before this point. Used on session changes.
    pub fn reset(&self) {
        let barrier = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let mut inner = self.inner.write();
        inner.snapshot = Arc::new(Vec::new());
        inner.installed = barrier;
        tracing::debug!("Registry reset at generation {}", barrier);
    }
}

impl Default for CampaignRegistry {
    fn default() -> Self {
        Self::new()
    }
}
