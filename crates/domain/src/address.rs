//! Ledger account identifiers
//!
//! Addresses are opaque hex-flavored text handed to us by the wallet and
//! the ledger. They are not validated beyond being text: the ledger is
//! the authority on what resolves. Identity is case-insensitive because
//! the same account arrives in different hex casings depending on the
//! source (checksummed from the wallet, lowercased from the ledger), and
//! ownership checks must not depend on casing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Shortest address that truncated display actually shortens.
/// At 12 chars or fewer, head + tail already cover the whole string.
const TRUNCATE_MIN_CHARS: usize = 12;

/// A ledger account identifier.
///
/// Equality and hashing ignore ASCII case; display preserves the casing
/// the address was created with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Wrap a raw account identifier.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The identifier as originally provided.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated display form: first 6 chars + "..." + last 6 chars.
    ///
    /// Addresses of 12 chars or fewer are returned unchanged; truncation
    /// cannot shorten them.
    pub fn truncated(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= TRUNCATE_MIN_CHARS {
            return self.0.clone();
        }
        let head: String = chars[..6].iter().collect();
        let tail: String = chars[chars.len() - 6..].iter().collect();
        format!("{head}...{tail}")
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for Address {}

impl Hash for Address {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Must agree with the case-insensitive Eq.
        self.0.to_ascii_lowercase().hash(state);
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Address {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_truncated_long_address() {
        let addr = Address::new("0x1234567890abcdef");
        assert_eq!(addr.truncated(), "0x1234...abcdef");
    }

    #[test]
    fn test_truncated_full_length_address() {
        let addr = Address::new("0x5FbDB2315678afecb367f032d93F642f64180aa3");
        let shown = addr.truncated();
        assert_eq!(shown, "0x5FbD...180aa3");
        assert!(shown.len() < addr.as_str().len());
    }

    #[test]
    fn test_truncated_short_address_unchanged() {
        // 12 chars or fewer: nothing to elide.
        assert_eq!(Address::new("0xabcdef").truncated(), "0xabcdef");
        assert_eq!(Address::new("0x1234567890").truncated(), "0x1234567890");
        assert_eq!(Address::new("").truncated(), "");
    }

    #[test]
    fn test_equality_ignores_case() {
        let checksummed = Address::new("0xAbC123DeF456");
        let lowercased = Address::new("0xabc123def456");
        assert_eq!(checksummed, lowercased);
        assert_ne!(checksummed, Address::new("0xabc123def457"));
    }

    #[test]
    fn test_hash_agrees_with_equality() {
        let mut funders = HashSet::new();
        funders.insert(Address::new("0xAAAA"));
        // Same account, different casing: must not count twice.
        assert!(!funders.insert(Address::new("0xaaaa")));
        assert_eq!(funders.len(), 1);
    }

    #[test]
    fn test_display_preserves_casing() {
        let addr = Address::new("0xAbCdEf");
        assert_eq!(addr.to_string(), "0xAbCdEf");
    }

    proptest! {
        #[test]
        fn prop_truncated_shape(s in "[0-9a-fA-Fx]{13,64}") {
            let shown = Address::new(s.clone()).truncated();
            prop_assert_eq!(shown.chars().count(), 15);
            prop_assert!(shown.starts_with(&s.chars().take(6).collect::<String>()));
            prop_assert!(shown.ends_with(
                &s.chars().rev().take(6).collect::<String>().chars().rev().collect::<String>()
            ));
        }

        #[test]
        fn prop_short_addresses_pass_through(s in "[0-9a-fA-Fx]{0,12}") {
            prop_assert_eq!(Address::new(s.clone()).truncated(), s);
        }
    }
}
