//! Majority approval rule
//!
//! A funding request is fulfillable only once strictly more than half of
//! the campaign's funders have approved it. The comparison doubles the
//! approval count instead of halving the funder count, keeping the
//! boundary exact: 2 approvals out of 4 funders is exactly half and does
//! not qualify.

/// True when `approval_count` is a strict majority of `funders_count`.
///
/// A campaign with zero funders can never reach majority, whatever the
/// approval count claims.
pub fn is_majority_approved(approval_count: u64, funders_count: u64) -> bool {
    // Widened so doubling cannot overflow.
    funders_count > 0 && 2 * approval_count as u128 > funders_count as u128
}
