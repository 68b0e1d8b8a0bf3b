//! Channel name registry
//!
//! Channels are keyed by the field names appearing in records. The registry
//! assigns each distinct name a dense index in first-appearance order; that
//! order is stable for the life of a session and defines the column order of
//! snapshots, CSV exports, and statistics.

use std::collections::HashMap;

/// Assigns dense, stable indices to channel names
#[derive(Debug, Clone, Default)]
pub struct ChannelRegistry {
    /// Names in index order
    names: Vec<String>,
    /// Reverse lookup
    indices: HashMap<String, usize>,
}

impl ChannelRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the index for a name, assigning the next free index if new
    ///
    /// Returns the index and whether the name was newly registered. The flag
    /// is true exactly once per distinct name until [`clear`](Self::clear).
    pub fn ensure(&mut self, name: &str) -> (usize, bool) {
        if let Some(&index) = self.indices.get(name) {
            return (index, false);
        }
        let index = self.names.len();
        self.names.push(name.to_string());
        self.indices.insert(name.to_string(), index);
        (index, true)
    }

    /// Look up the index of a known name
    pub fn get(&self, name: &str) -> Option<usize> {
        self.indices.get(name).copied()
    }

    /// Look up the name at an index
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// All names in index (first-appearance) order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of registered channels
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if no channels are registered
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Forget every name; subsequent indices start again at 0
    pub fn clear(&mut self) {
        self.names.clear();
        self.indices.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_appearance_order() {
        let mut registry = ChannelRegistry::new();
        assert_eq!(registry.ensure("z"), (0, true));
        assert_eq!(registry.ensure("a"), (1, true));
        assert_eq!(registry.ensure("m"), (2, true));
        assert_eq!(registry.names(), &["z", "a", "m"]);
    }

    #[test]
    fn test_ensure_is_idempotent() {
        let mut registry = ChannelRegistry::new();
        assert_eq!(registry.ensure("temp"), (0, true));
        assert_eq!(registry.ensure("temp"), (0, false));
        assert_eq!(registry.ensure("temp"), (0, false));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_lookups() {
        let mut registry = ChannelRegistry::new();
        registry.ensure("x");
        registry.ensure("y");

        assert_eq!(registry.get("y"), Some(1));
        assert_eq!(registry.get("missing"), None);
        assert_eq!(registry.name(0), Some("x"));
        assert_eq!(registry.name(7), None);
    }

    #[test]
    fn test_clear_restarts_indices() {
        let mut registry = ChannelRegistry::new();
        registry.ensure("a");
        registry.ensure("b");
        registry.clear();

        assert!(registry.is_empty());
        assert_eq!(registry.ensure("b"), (0, true));
    }
}
