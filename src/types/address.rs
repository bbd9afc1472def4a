//! Wallet address identifier
//!
//! Addresses are opaque tokens to the ledger. The only properties the transfer
//! engine relies on are equality and a total order, and that order is plain
//! byte-wise string comparison.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique, immutable wallet identifier
///
/// `Ord` is derived from the inner `String`, which compares byte-wise. This is
/// the canonical lock order used by the transfer engine; no other meaning (hex
/// value, checksum casing) is inferred from the address text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Wrap a raw address string without validation
    ///
    /// Validation is the job of an [`AddressValidator`](crate::core::AddressValidator);
    /// stores and the engine accept any string once it has been checked.
    pub fn new(raw: impl Into<String>) -> Self {
        Address(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Order a pair of addresses for lock acquisition
    ///
    /// Returns `(first, second)` where `first <= second`, independent of the
    /// order the arguments were given in.
    pub fn lock_order<'a>(a: &'a Address, b: &'a Address) -> (&'a Address, &'a Address) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Address {
    fn from(raw: &str) -> Self {
        Address::new(raw)
    }
}

impl From<String> for Address {
    fn from(raw: String) -> Self {
        Address(raw)
    }
}
