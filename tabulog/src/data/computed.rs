//! Computed column definitions.

use std::collections::HashMap;

use crate::error::ParseResult;
use crate::expr::{parse, Expr};

/// A named expression, parsed once and evaluated per row.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedColumn {
    pub name: String,
    pub source: String,
    pub expr: Expr,
}

impl ComputedColumn {
    /// Parses `source`; fails without creating anything on malformed text.
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> ParseResult<Self> {
        let source = source.into();
        let expr = parse(&source)?;
        Ok(Self {
            name: name.into(),
            source,
            expr,
        })
    }
}

/// Definitions in registration order, looked up by name.
#[derive(Debug, Clone, Default)]
pub struct ComputedColumns {
    columns: Vec<ComputedColumn>,
    index: HashMap<String, usize>,
}

impl ComputedColumns {
    /// Adds a definition, replacing any earlier one with the same name in place.
    pub fn insert(&mut self, column: ComputedColumn) {
        match self.index.get(&column.name) {
            Some(&i) => self.columns[i] = column,
            None => {
                self.index.insert(column.name.clone(), self.columns.len());
                self.columns.push(column);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&ComputedColumn> {
        self.index.get(name).map(|&i| &self.columns[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComputedColumn> {
        self.columns.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
