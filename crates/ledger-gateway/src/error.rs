//! Ledger failure taxonomy
//!
//! Three classes cover everything a caller can hit. Workflow operations
//! surface these as values; nothing is logged-and-swallowed.

use thiserror::Error;

/// Classified failure of a ledger-backed operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// No contract is reachable for the active session: unsupported
    /// network, disconnected wallet, transport failure, or a call that
    /// exceeded its bounded wait. The call may never have been attempted.
    #[error("ledger unavailable: {0}")]
    LedgerUnavailable(String),

    /// The ledger executed the call and refused it: precondition
    /// violated, insufficient funds, duplicate approval, or a local
    /// precondition check that the ledger would reject anyway.
    #[error("transaction rejected: {0}")]
    TransactionRejected(String),

    /// An index lookup landed outside the known range.
    #[error("not found: {0}")]
    NotFound(String),
}

impl LedgerError {
    /// True for failures where retrying against a reachable ledger could
    /// succeed (the ledger itself was never consulted).
    pub fn is_unavailable(&self) -> bool {
        matches!(self, LedgerError::LedgerUnavailable(_))
    }

    /// True when the ledger (or a local precondition standing in for it)
    /// actively refused the operation.
    pub fn is_rejected(&self) -> bool {
        matches!(self, LedgerError::TransactionRejected(_))
    }
}
