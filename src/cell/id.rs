//! Opaque controller identifier.

use std::fmt;
use std::sync::Arc;

/// Identifier of one controller as reported by the cell.
///
/// The runtime never interprets the value; it is only used as the key for
/// tracking streams. Cheap to clone (shared string).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ControllerId(Arc<str>);

impl ControllerId {
    /// Creates an identifier from any string-like value.
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ControllerId({})", &self.0)
    }
}

impl From<&str> for ControllerId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ControllerId {
    fn from(s: String) -> Self {
        Self(Arc::from(s.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_equality_and_hash() {
        let a = ControllerId::new("ur-left");
        let b: ControllerId = "ur-left".into();
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_display_is_raw_value() {
        let id = ControllerId::new("ur");
        assert_eq!(id.to_string(), "ur");
        assert_eq!(id.as_str(), "ur");
    }
}
