//! Interned strings for currency codes.
//!
//! Currency codes repeat across nearly every amount in a ledger, so they
//! are stored as shared immutable strings. Cloning a [`Symbol`] is a
//! reference-count bump, and equality short-circuits on pointer identity.

use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A shared immutable string, used for currency codes.
///
/// Two symbols with the same content compare equal whether or not they
/// share an allocation; symbols cloned from one another always do.
#[derive(Debug, Clone, Eq)]
pub struct Symbol(Arc<str>);

impl Serialize for Symbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Symbol {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(s))
    }
}

impl PartialOrd for Symbol {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Symbol {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl Symbol {
    /// Create a new symbol from a string.
    pub fn new(s: impl Into<Arc<str>>) -> Self {
        Self(s.into())
    }

    /// Get the string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if two symbols share the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        // Fast path: pointer comparison
        if Arc::ptr_eq(&self.0, &other.0) {
            return true;
        }
        self.0 == other.0
    }
}

impl std::hash::Hash for Symbol {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::ops::Deref for Symbol {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&String> for Symbol {
    fn from(s: &String) -> Self {
        Self::new(s.as_str())
    }
}

impl From<&Self> for Symbol {
    fn from(s: &Self) -> Self {
        s.clone()
    }
}

impl PartialEq<str> for Symbol {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Symbol {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl PartialEq<String> for Symbol {
    fn eq(&self, other: &String) -> bool {
        self.as_str() == other
    }
}

impl Default for Symbol {
    fn default() -> Self {
        Self::new("")
    }
}

impl std::borrow::Borrow<str> for Symbol {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_equality() {
        let s1 = Symbol::new("USD");
        let s2 = Symbol::new("USD");
        let s3 = Symbol::new("EUR");

        assert_eq!(s1, s2);
        assert_ne!(s1, s3);
        assert_eq!(s1, "USD");
        assert_eq!(s1, "USD".to_string());
    }

    #[test]
    fn test_symbol_clone_shares_allocation() {
        let s1 = Symbol::new("CAD");
        let s2 = s1.clone();
        assert!(s1.ptr_eq(&s2));
    }

    #[test]
    fn test_symbol_ordering() {
        let mut codes = vec![Symbol::new("USD"), Symbol::new("CAD"), Symbol::new("EUR")];
        codes.sort();
        assert_eq!(codes[0], "CAD");
        assert_eq!(codes[1], "EUR");
        assert_eq!(codes[2], "USD");
    }

    #[test]
    fn test_symbol_hash() {
        use std::collections::HashMap;

        let s1 = Symbol::new("USD");
        let s2 = Symbol::new("USD");

        let mut map = HashMap::new();
        map.insert(s1, 1);

        // s2 should find the same entry as s1
        assert_eq!(map.get(&s2), Some(&1));
        // and lookup by &str works through Borrow
        assert_eq!(map.get("USD"), Some(&1));
    }
}
