//! Tab-separated table reader.

use csv::ReaderBuilder;

use crate::data::DataSet;
use crate::error::{ReadError, ReadResult};

/// Read a tab-separated table into a data set.
///
/// `skip_lines` leading lines are dropped before the header row. Every cell
/// present in a row is stored, including empty ones; a row shorter than the
/// header leaves its trailing fields absent.
pub fn read_tsv(content: &str, skip_lines: usize) -> ReadResult<DataSet> {
    let body = skip(content, skip_lines);

    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .quoting(false)
        .has_headers(true)
        .from_reader(body.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(ReadError::EmptyFile);
    }

    let mut data = DataSet::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line() as usize) + skip_lines;

        if record.len() == 1 && record.get(0).is_some_and(|cell| cell.trim().is_empty()) {
            continue;
        }
        if record.len() > headers.len() {
            return Err(ReadError::MalformedTable {
                line,
                message: format!("{} cells for {} columns", record.len(), headers.len()),
            });
        }

        let mut row = data.add_row();
        for (header, cell) in headers.iter().zip(record.iter()) {
            row.set(header.as_str(), cell);
        }
    }
    Ok(data)
}

fn skip(content: &str, lines: usize) -> &str {
    let mut rest = content;
    for _ in 0..lines {
        rest = match rest.find('\n') {
            Some(end) => &rest[end + 1..],
            None => "",
        };
    }
    rest
}
