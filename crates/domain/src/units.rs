//! Wei/ether display conversion
//!
//! The ledger denominates every amount in its smallest unit (wei); the
//! presentation layer shows the decimal display unit (ether). All amounts
//! stay `u128` in wei internally and only become floats at the display
//! boundary.

/// Smallest units per display unit.
pub const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;

/// Convert a wei amount to its ether display value.
///
/// Standard float conversion; precision above 2^53 wei is the display
/// layer's problem, the wei amount itself is never altered.
pub fn wei_to_ether(wei: u128) -> f64 {
    wei as f64 / WEI_PER_ETHER as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_one_ether() {
        assert_eq!(wei_to_ether(1_000_000_000_000_000_000), 1.0);
    }

    #[test]
    fn test_zero() {
        assert_eq!(wei_to_ether(0), 0.0);
    }

    #[test]
    fn test_fractional_ether() {
        assert_eq!(wei_to_ether(WEI_PER_ETHER / 2), 0.5);
        assert_eq!(wei_to_ether(WEI_PER_ETHER / 4), 0.25);
    }

    #[test]
    fn test_multiple_ether() {
        assert_eq!(wei_to_ether(3 * WEI_PER_ETHER), 3.0);
    }

    proptest! {
        #[test]
        fn prop_whole_ether_amounts_are_exact(ether in 0u128..2_000) {
            // Whole-ether wei amounts this small convert without rounding.
            prop_assert_eq!(wei_to_ether(ether * WEI_PER_ETHER), ether as f64);
        }

        #[test]
        fn prop_conversion_is_monotone(a in 0u128..u64::MAX as u128, b in 0u128..u64::MAX as u128) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(wei_to_ether(lo) <= wei_to_ether(hi));
        }
    }
}
