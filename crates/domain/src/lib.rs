//! Campaign Domain - Core crowdfunding types and derivations
//!
//! Typed representations of campaigns, funding requests and ledger
//! accounts, plus the pure view derivations every consumer shares:
//! - wei/ether display conversion
//! - truncated address rendering
//! - the strict-majority approval check
//!
//! Everything here is pure data. Ledger I/O lives in `ledger-gateway`,
//! cache/workflow logic in `crowdfund-client`.

pub mod address;
pub mod approval;
pub mod campaign;
pub mod units;

pub use address::Address;
pub use approval::is_majority_approved;
pub use campaign::{Campaign, FundingRequest};
pub use units::{wei_to_ether, WEI_PER_ETHER};
