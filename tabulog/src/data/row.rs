//! Rows and the handles used to write and read them.
//!
//! A [`Row`] only stores the fields that were assigned. Writing goes through
//! [`RowMut`], which keeps the data set's column registry up to date; reading
//! goes through [`RowRef`], which pairs the row with its data set so computed
//! columns can be resolved by name.

use std::borrow::Cow;
use std::collections::HashMap;

use super::dataset::DataSet;
use super::registry::ColumnRegistry;
use crate::error::EvalResult;
use crate::expr::{evaluate_computed, Context, Expr, Value};

/// Sparse mapping from column name to raw text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    fields: HashMap<String, String>,
}

impl Row {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub(crate) fn insert(&mut self, name: String, value: String) {
        self.fields.insert(name, value);
    }
}

/// Mutable handle returned by [`DataSet::add_row`].
pub struct RowMut<'a> {
    row: &'a mut Row,
    columns: &'a mut ColumnRegistry,
}

impl<'a> RowMut<'a> {
    pub(crate) fn new(row: &'a mut Row, columns: &'a mut ColumnRegistry) -> Self {
        Self { row, columns }
    }

    /// Sets a field, registering its column if this is the first use.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let name = name.into();
        self.columns.register(&name);
        self.row.insert(name, value.into());
        self
    }

    /// Stored text of a field on this row.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.row.get(name)
    }
}

/// Read-only view of a row within its data set.
#[derive(Clone, Copy)]
pub struct RowRef<'a> {
    data: &'a DataSet,
    row: &'a Row,
    index: usize,
}

impl<'a> RowRef<'a> {
    pub(crate) fn new(data: &'a DataSet, row: &'a Row, index: usize) -> Self {
        Self { data, row, index }
    }

    /// Zero-based position of the row in its data set.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Raw text of a stored field, ignoring computed columns.
    pub fn stored(&self, name: &str) -> Option<&'a str> {
        self.row.get(name)
    }

    /// Reads a field by name.
    ///
    /// Stored fields come back as their raw text; computed columns are
    /// evaluated against this row and returned in canonical text form.
    /// `Ok(None)` means the field is blank on this row.
    pub fn get(&self, name: &str) -> EvalResult<Option<Cow<'a, str>>> {
        if let Some(text) = self.row.get(name) {
            return Ok(Some(Cow::Borrowed(text)));
        }
        Ok(evaluate_computed(name, self)?.map(|value| Cow::Owned(value.to_string())))
    }

    /// Like [`RowRef::get`], but returns the typed value.
    pub fn value(&self, name: &str) -> EvalResult<Option<Value>> {
        if let Some(text) = self.row.get(name) {
            return Ok(Some(Value::from_field(text)));
        }
        evaluate_computed(name, self)
    }

    /// Stored fields in column registry order.
    pub fn fields(&self) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        let row = self.row;
        self.data
            .columns()
            .iter()
            .filter_map(move |name| row.get(name).map(|value| (name.as_str(), value)))
    }
}

impl Context for RowRef<'_> {
    fn field(&self, name: &str) -> Option<&str> {
        self.row.get(name)
    }

    fn computed(&self, name: &str) -> Option<&Expr> {
        self.data.computed_column(name).map(|c| &c.expr)
    }
}

impl std::fmt::Debug for RowRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowRef")
            .field("index", &self.index)
            .field("row", self.row)
            .finish()
    }
}
