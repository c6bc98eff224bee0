//! Tabular data model.
//!
//! - `registry`: Column names in first-seen order
//! - `row`: Sparse rows and their read/write handles
//! - `computed`: Named expressions evaluated per row
//! - `dataset`: The composition of all three

pub mod computed;
pub mod dataset;
pub mod registry;
pub mod row;

pub use computed::{ComputedColumn, ComputedColumns};
pub use dataset::DataSet;
pub use registry::ColumnRegistry;
pub use row::{Row, RowMut, RowRef};
