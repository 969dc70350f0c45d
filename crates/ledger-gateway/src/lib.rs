//! Ledger Gateway - Typed access to the authoritative campaign ledger
//!
//! The ledger (a campaign contract on some chain) owns all real state:
//! balances, funder sets, approvals. This crate defines the client-side
//! contract for talking to it:
//! - the [`LedgerGateway`] trait, one method per ledger operation
//! - the [`LedgerError`] failure taxonomy every caller sees
//! - [`ContractDirectory`], the network-to-contract-address map
//! - [`InMemoryLedger`], a rule-enforcing reference ledger for local
//!   development and tests

pub mod directory;
pub mod error;
pub mod gateway;
pub mod memory;

pub use directory::{ContractDirectory, NetworkId};
pub use error::LedgerError;
pub use gateway::{LedgerGateway, TxReceipt};
pub use memory::{InMemoryLedger, RuleViolation};
