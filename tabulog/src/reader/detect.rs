//! File format detection on decoded text.

use crate::error::{ReadError, ReadResult};

/// Input formats understood by the readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Raw E-Prime log with header and log frames.
    EprimeLog,
    /// E-Prime "export to text" output: a file name line, then a table.
    EprimeTsv,
    /// Table saved from a spreadsheet, header includes `ExperimentName`.
    ExcelTsv,
    /// Any other tab-separated table with a header row.
    RawTsv,
}

impl FileFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileFormat::EprimeLog => "eprime-log",
            FileFormat::EprimeTsv => "eprime-tsv",
            FileFormat::ExcelTsv => "excel-tsv",
            FileFormat::RawTsv => "raw-tsv",
        }
    }

    /// Lines before the header row.
    pub fn skip_lines(&self) -> usize {
        match self {
            FileFormat::EprimeTsv => 1,
            _ => 0,
        }
    }
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub(crate) const HEADER_START: &str = "*** Header Start ***";

fn tab_columns(line: &str) -> usize {
    if line.contains('\t') {
        line.split('\t').count()
    } else {
        0
    }
}

/// Detect the format of decoded file content.
pub fn detect_format(content: &str) -> ReadResult<FileFormat> {
    let first_content = content.lines().find(|line| !line.trim().is_empty());
    if first_content.map(str::trim) == Some(HEADER_START) {
        return Ok(FileFormat::EprimeLog);
    }

    let mut lines = content.lines();
    let first = lines.next().unwrap_or("");
    let second = lines.next().unwrap_or("");

    let first_cols = tab_columns(first);
    if first_cols >= 2 {
        if first.split('\t').any(|cell| cell.trim() == "ExperimentName") {
            return Ok(FileFormat::ExcelTsv);
        }
        return Ok(FileFormat::RawTsv);
    }

    if first_cols == 0 && !first.trim().is_empty() && tab_columns(second) >= 2 {
        return Ok(FileFormat::EprimeTsv);
    }

    let preview: String = first.chars().take(40).collect();
    Err(ReadError::UnknownFormat(format!(
        "first line '{}' is neither an E-Prime log header nor a tab-separated header",
        preview
    )))
}
