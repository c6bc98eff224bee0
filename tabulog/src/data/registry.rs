//! Ordered registry of column names.

use std::collections::HashMap;

/// Column names in order of first appearance.
///
/// Names are unique and never removed once registered. Sorting is offered
/// as a separate view; the canonical order is never changed.
#[derive(Debug, Clone, Default)]
pub struct ColumnRegistry {
    names: Vec<String>,
    positions: HashMap<String, usize>,
}

impl ColumnRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `name` if it is new. Returns `true` when it was added.
    pub fn register(&mut self, name: &str) -> bool {
        if self.positions.contains_key(name) {
            return false;
        }
        self.positions.insert(name.to_string(), self.names.len());
        self.names.push(name.to_string());
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    /// Position of `name` in first-seen order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    /// Names in first-seen order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Names in lexicographic order, for display and output.
    pub fn sorted(&self) -> Vec<&str> {
        let mut sorted: Vec<&str> = self.names.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        sorted
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}
