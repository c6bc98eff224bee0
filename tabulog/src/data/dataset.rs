//! The data set: rows, their column registry and computed columns.

use super::computed::{ComputedColumn, ComputedColumns};
use super::registry::ColumnRegistry;
use super::row::{Row, RowMut, RowRef};
use crate::error::ParseResult;

/// An ordered collection of sparse rows plus computed column definitions.
///
/// # Example
/// ```
/// use tabulog::DataSet;
///
/// let mut data = DataSet::new();
/// data.add_row().set("stim_time", "3188").set("run_start", "2400");
/// data.add_computed_column("stim_offset", "{stim_time} - {run_start}").unwrap();
/// data.add_computed_column("stim_offset_s", "{stim_offset}/1000").unwrap();
///
/// let row = data.row(0).unwrap();
/// assert_eq!(row.get("stim_offset_s").unwrap().as_deref(), Some("0.788"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct DataSet {
    rows: Vec<Row>,
    columns: ColumnRegistry,
    computed: ComputedColumns,
}

impl DataSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an empty row and returns a handle to populate it.
    pub fn add_row(&mut self) -> RowMut<'_> {
        self.rows.push(Row::default());
        let last = self.rows.len() - 1;
        RowMut::new(&mut self.rows[last], &mut self.columns)
    }

    pub fn row(&self, index: usize) -> Option<RowRef<'_>> {
        self.rows.get(index).map(|row| RowRef::new(self, row, index))
    }

    pub fn row_mut(&mut self, index: usize) -> Option<RowMut<'_>> {
        let row = self.rows.get_mut(index)?;
        Some(RowMut::new(row, &mut self.columns))
    }

    pub fn rows(&self) -> impl Iterator<Item = RowRef<'_>> {
        self.rows
            .iter()
            .enumerate()
            .map(move |(index, row)| RowRef::new(self, row, index))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    // -------------------------------------------------------------------------
    // Columns
    // -------------------------------------------------------------------------

    /// Stored column names in first-seen order.
    pub fn columns(&self) -> &[String] {
        self.columns.names()
    }

    /// Stored column names sorted lexicographically.
    pub fn sorted_columns(&self) -> Vec<&str> {
        self.columns.sorted()
    }

    pub fn registry(&self) -> &ColumnRegistry {
        &self.columns
    }

    /// Columns for output: stored columns (first-seen or sorted), then
    /// computed columns that are not also stored, in registration order.
    pub fn output_columns(&self, sorted: bool) -> Vec<&str> {
        let mut names: Vec<&str> = if sorted {
            self.columns.sorted()
        } else {
            self.columns.iter().collect()
        };
        names.extend(self.computed.names().filter(|name| !self.columns.contains(name)));
        names
    }

    /// Whether `name` is a stored column or a computed column.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains(name) || self.computed.contains(name)
    }

    // -------------------------------------------------------------------------
    // Computed columns
    // -------------------------------------------------------------------------

    /// Parses and registers a computed column.
    ///
    /// A malformed expression is rejected and nothing is registered. An
    /// existing definition with the same name is replaced.
    pub fn add_computed_column(&mut self, name: impl Into<String>, source: impl Into<String>) -> ParseResult<()> {
        let column = ComputedColumn::new(name, source)?;
        self.computed.insert(column);
        Ok(())
    }

    /// Registers an already-parsed computed column.
    pub fn insert_computed_column(&mut self, column: ComputedColumn) {
        self.computed.insert(column);
    }

    pub fn computed_column(&self, name: &str) -> Option<&ComputedColumn> {
        self.computed.get(name)
    }

    pub fn computed_columns(&self) -> impl Iterator<Item = &ComputedColumn> {
        self.computed.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvalError;
    use crate::expr::Value;

    /// Rows with a blank-filled last row.
    fn mock_data(col_count: usize, row_count: usize) -> DataSet {
        let mut data = DataSet::new();
        for rownum in 1..=row_count {
            let mut row = data.add_row();
            for colnum in 1..=col_count {
                // Leave some blanks in the last row
                if !(rownum == row_count && colnum > 1) {
                    row.set(format!("col_{}", colnum), format!("c_{}_r_{}", colnum, rownum));
                }
            }
        }
        data
    }

    /// Six rows of timing data; `sparse` is only set on rows 1 and 3.
    fn mock_edata() -> DataSet {
        let rows = [
            ("3188", "2400", "2803", None),
            ("4515", "2400", "3910", Some("20")),
            ("6515", "2400", "6096", None),
            ("8115", "2400", "7777", Some("50")),
            ("9815", "2400", "9414", None),
            ("12515", "2800", "12014", None),
        ];
        let mut data = DataSet::new();
        for (stim_time, run_start, fix_time, sparse) in rows {
            let mut row = data.add_row();
            row.set("stim_time", stim_time)
                .set("run_start", run_start)
                .set("fix_time", fix_time);
            if let Some(sparse) = sparse {
                row.set("sparse", sparse);
            }
        }
        data
    }

    fn with_offsets(mut data: DataSet) -> DataSet {
        data.add_computed_column("stim_offset", "{stim_time} - {run_start}").unwrap();
        data.add_computed_column("stim_offset_s", "{stim_offset}/1000").unwrap();
        data
    }

    #[test]
    fn test_add_row_does_not_register_columns() {
        let mut data = DataSet::new();
        data.add_row();
        assert_eq!(data.len(), 1);
        assert!(data.columns().is_empty());
        assert!(data.row(0).unwrap().fields().next().is_none());
    }

    #[test]
    fn test_set_overwrites() {
        let mut data = DataSet::new();
        data.add_row().set("a", "1").set("a", "2");
        assert_eq!(data.row(0).unwrap().stored("a"), Some("2"));
        assert_eq!(data.columns(), &["a"]);
    }

    #[test]
    fn test_columns_in_first_seen_order() {
        let mut data = DataSet::new();
        data.add_row().set("Trial", "1").set("Subject", "7");
        data.add_row().set("Block", "2").set("Trial", "2");
        data.add_row().set("Accuracy", "1");

        assert_eq!(data.columns(), &["Trial", "Subject", "Block", "Accuracy"]);
        assert_eq!(data.sorted_columns(), vec!["Accuracy", "Block", "Subject", "Trial"]);
        assert_eq!(data.columns(), &["Trial", "Subject", "Block", "Accuracy"]);
    }

    #[test]
    fn test_mock_data_blanks() {
        let data = mock_data(4, 3);
        assert_eq!(data.len(), 3);
        assert_eq!(data.columns(), &["col_1", "col_2", "col_3", "col_4"]);

        let last = data.row(2).unwrap();
        assert_eq!(last.get("col_1").unwrap().as_deref(), Some("c_1_r_3"));
        assert_eq!(last.get("col_2").unwrap(), None);
        assert_eq!(data.row(1).unwrap().get("col_4").unwrap().as_deref(), Some("c_4_r_2"));
    }

    #[test]
    fn test_blank_is_not_empty_string() {
        let mut data = DataSet::new();
        data.add_row().set("answer", "");
        data.add_row();

        assert_eq!(data.row(0).unwrap().get("answer").unwrap().as_deref(), Some(""));
        assert_eq!(data.row(1).unwrap().get("answer").unwrap(), None);
        assert_eq!(data.row(1).unwrap().stored("answer"), None);
    }

    #[test]
    fn test_unknown_column_is_absent() {
        let data = mock_edata();
        assert_eq!(data.row(0).unwrap().get("nothing_here").unwrap(), None);
        assert_eq!(data.row(0).unwrap().value("nothing_here").unwrap(), None);
    }

    #[test]
    fn test_computed_dependency_chain() {
        let data = with_offsets(mock_edata());
        let row = data.row(0).unwrap();

        assert_eq!(row.get("stim_offset").unwrap().as_deref(), Some("788"));
        assert_eq!(row.get("stim_offset_s").unwrap().as_deref(), Some("0.788"));
        assert_eq!(row.value("stim_offset_s").unwrap(), Some(Value::Float(0.788)));
        // Intermediate column never becomes stored
        assert_eq!(row.stored("stim_offset"), None);
        assert!(!data.registry().contains("stim_offset"));
    }

    #[test]
    fn test_computed_per_row() {
        let data = with_offsets(mock_edata());
        let offsets: Vec<String> = data
            .rows()
            .map(|row| row.get("stim_offset").unwrap().unwrap().into_owned())
            .collect();
        assert_eq!(offsets, vec!["788", "2115", "4115", "5715", "7415", "9715"]);
    }

    #[test]
    fn test_computed_registered_before_rows() {
        let mut data = DataSet::new();
        data.add_computed_column("doubled", "{x} * 2").unwrap();
        data.add_row().set("x", "21");
        assert_eq!(data.row(0).unwrap().get("doubled").unwrap().as_deref(), Some("42"));
    }

    #[test]
    fn test_evaluation_follows_current_values() {
        let mut data = with_offsets(mock_edata());
        data.row_mut(0).unwrap().set("run_start", "3000");
        assert_eq!(data.row(0).unwrap().get("stim_offset").unwrap().as_deref(), Some("188"));
    }

    #[test]
    fn test_sparse_reference_is_unresolved() {
        let mut data = mock_edata();
        data.add_computed_column("sparse_plus", "{sparse} + 1").unwrap();

        assert_eq!(data.row(1).unwrap().get("sparse_plus").unwrap().as_deref(), Some("21"));
        assert_eq!(
            data.row(0).unwrap().get("sparse_plus").unwrap_err(),
            EvalError::UnresolvedReference("sparse".into())
        );
    }

    #[test]
    fn test_circular_columns_fail() {
        let mut data = mock_edata();
        data.add_computed_column("a", "{b} + 1").unwrap();
        data.add_computed_column("b", "{a} + 1").unwrap();
        data.add_computed_column("me", "{me}").unwrap();

        let row = data.row(0).unwrap();
        assert!(matches!(row.get("a"), Err(EvalError::CircularReference { .. })));
        assert!(matches!(row.get("me"), Err(EvalError::CircularReference { .. })));
    }

    #[test]
    fn test_reading_computed_does_not_mutate() {
        let data = with_offsets(mock_edata());
        let before: Vec<_> = data.rows().map(|r| r.fields().count()).collect();
        for row in data.rows() {
            row.get("stim_offset_s").unwrap();
        }
        let after: Vec<_> = data.rows().map(|r| r.fields().count()).collect();
        assert_eq!(before, after);
        assert_eq!(data.columns(), &["stim_time", "run_start", "fix_time", "sparse"]);
    }

    #[test]
    fn test_malformed_computed_is_not_registered() {
        let mut data = DataSet::new();
        assert!(data.add_computed_column("bad", "(1 + ").is_err());
        assert!(data.computed_column("bad").is_none());
    }

    #[test]
    fn test_output_columns() {
        let mut data = mock_edata();
        data.add_computed_column("stim_offset", "{stim_time} - {run_start}").unwrap();
        data.add_computed_column("fix_time", "1").unwrap();

        assert_eq!(
            data.output_columns(false),
            vec!["stim_time", "run_start", "fix_time", "sparse", "stim_offset"]
        );
        assert_eq!(
            data.output_columns(true),
            vec!["fix_time", "run_start", "sparse", "stim_time", "stim_offset"]
        );
        assert!(data.has_column("stim_offset"));
        // Stored field wins over a computed column of the same name
        assert_eq!(data.row(0).unwrap().get("fix_time").unwrap().as_deref(), Some("2803"));
    }

    #[test]
    fn test_fields_in_registry_order() {
        let data = mock_edata();
        let fields: Vec<_> = data.row(1).unwrap().fields().collect();
        assert_eq!(
            fields,
            vec![("stim_time", "4515"), ("run_start", "2400"), ("fix_time", "3910"), ("sparse", "20")]
        );
    }

    #[test]
    fn test_data_set_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DataSet>();
        assert_send_sync::<RowRef<'static>>();
    }
}
