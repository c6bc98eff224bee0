//! Writers for converted data sets.
//!
//! Both writers read every cell through [`RowRef::get`], so computed
//! columns are evaluated on the way out. What happens when a computed
//! column fails on a row is decided by [`ErrorPolicy`].

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};
use std::borrow::Cow;
use std::cell::RefCell;
use std::io::Write;

use crate::data::{DataSet, RowRef};
use crate::error::{WriteError, WriteResult};
use crate::logs::log_warning;

/// What to do when a computed column cannot be evaluated on a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Stop at the first failure. Rows before it may already be written.
    #[default]
    Abort,
    /// Leave the cell blank and keep going.
    Blank,
    /// Drop the whole row and keep going.
    #[serde(rename = "skip")]
    SkipRow,
}

impl std::str::FromStr for ErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "abort" => Ok(ErrorPolicy::Abort),
            "blank" => Ok(ErrorPolicy::Blank),
            "skip" | "skip-row" => Ok(ErrorPolicy::SkipRow),
            other => Err(format!("Unknown error policy '{}' (expected abort, blank or skip)", other)),
        }
    }
}

/// Options shared by the writers.
#[derive(Debug, Clone, Default)]
pub struct OutputOptions {
    /// Explicit column list; all output columns when `None`.
    pub columns: Option<Vec<String>>,
    /// Sort stored columns by name instead of first-seen order.
    pub sort_columns: bool,
    pub on_error: ErrorPolicy,
}

impl OutputOptions {
    /// The columns that will be written, in order.
    pub fn resolve_columns(&self, data: &DataSet) -> Vec<String> {
        match &self.columns {
            Some(columns) => {
                for name in columns.iter().filter(|name| !data.has_column(name)) {
                    log_warning(format!("Column '{}' does not exist, it will be blank", name));
                }
                columns.clone()
            }
            None => data
                .output_columns(self.sort_columns)
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

/// Counts from a finished write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteReport {
    pub rows_written: usize,
    pub rows_skipped: usize,
    pub blank_cells: usize,
}

type Cells<'a> = Vec<Option<Cow<'a, str>>>;

/// Reads one row's cells, applying the error policy.
///
/// Returns `Ok(None)` when the row is skipped.
fn collect_cells<'a>(
    row: RowRef<'a>,
    columns: &[String],
    policy: ErrorPolicy,
    report: &mut WriteReport,
) -> WriteResult<Option<Cells<'a>>> {
    let mut cells = Vec::with_capacity(columns.len());
    for column in columns {
        match row.get(column) {
            Ok(cell) => cells.push(cell),
            Err(source) => {
                let row_number = row.index() + 1;
                match policy {
                    ErrorPolicy::Abort => {
                        return Err(WriteError::Eval { row: row_number, column: column.clone(), source });
                    }
                    ErrorPolicy::Blank => {
                        log_warning(format!("Row {}, column '{}' left blank: {}", row_number, column, source));
                        report.blank_cells += 1;
                        cells.push(None);
                    }
                    ErrorPolicy::SkipRow => {
                        log_warning(format!("Row {} skipped, column '{}': {}", row_number, column, source));
                        report.rows_skipped += 1;
                        return Ok(None);
                    }
                }
            }
        }
    }
    Ok(Some(cells))
}

/// Write a data set as a tab-separated table.
///
/// The header row lists the resolved columns; absent fields are written as
/// empty cells. Cell text is written as-is, without quoting.
pub fn write_tsv<W: Write>(data: &DataSet, writer: W, options: &OutputOptions) -> WriteResult<WriteReport> {
    let columns = options.resolve_columns(data);
    let mut out = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(csv::QuoteStyle::Never)
        .from_writer(writer);

    out.write_record(&columns)?;

    let mut report = WriteReport::default();
    for row in data.rows() {
        let Some(cells) = collect_cells(row, &columns, options.on_error, &mut report)? else {
            continue;
        };
        out.write_record(cells.iter().map(|cell| cell.as_deref().unwrap_or("")))?;
        report.rows_written += 1;
    }
    out.flush()?;
    Ok(report)
}

/// A row as a JSON object holding only its present fields, in column order.
struct JsonRow<'r, 'a> {
    columns: &'r [String],
    cells: Cells<'a>,
}

impl Serialize for JsonRow<'_, '_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let present = self.cells.iter().filter(|cell| cell.is_some()).count();
        let mut map = serializer.serialize_map(Some(present))?;
        for (column, cell) in self.columns.iter().zip(&self.cells) {
            if let Some(text) = cell {
                map.serialize_entry(column, text)?;
            }
        }
        map.end()
    }
}

/// Rows serialized lazily so evaluation errors surface with their context.
struct JsonRows<'d> {
    data: &'d DataSet,
    columns: &'d [String],
    policy: ErrorPolicy,
    report: RefCell<WriteReport>,
    failure: RefCell<Option<WriteError>>,
}

impl Serialize for JsonRows<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(None)?;
        for row in self.data.rows() {
            let collected = collect_cells(row, self.columns, self.policy, &mut self.report.borrow_mut());
            match collected {
                Ok(Some(cells)) => {
                    seq.serialize_element(&JsonRow { columns: self.columns, cells })?;
                    self.report.borrow_mut().rows_written += 1;
                }
                Ok(None) => {}
                Err(err) => {
                    let message = err.to_string();
                    *self.failure.borrow_mut() = Some(err);
                    return Err(serde::ser::Error::custom(message));
                }
            }
        }
        seq.end()
    }
}

/// Write a data set as a JSON array of objects.
///
/// Absent fields are left out of each object, so a blank field and an
/// empty string stay distinguishable.
pub fn write_json<W: Write>(data: &DataSet, mut writer: W, options: &OutputOptions) -> WriteResult<WriteReport> {
    let columns = options.resolve_columns(data);
    let rows = JsonRows {
        data,
        columns: &columns,
        policy: options.on_error,
        report: RefCell::new(WriteReport::default()),
        failure: RefCell::new(None),
    };

    if let Err(err) = serde_json::to_writer_pretty(&mut writer, &rows) {
        return Err(rows.failure.into_inner().unwrap_or(WriteError::Json(err)));
    }
    writeln!(writer)?;
    writer.flush()?;
    Ok(rows.report.into_inner())
}
