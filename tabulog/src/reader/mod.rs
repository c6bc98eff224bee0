//! Readers turning E-Prime output files into a [`DataSet`].
//!
//! Reading happens in three steps: the byte encoding is detected and the
//! content decoded, the file format is detected (unless forced), then the
//! matching reader fills the data set.

pub mod detect;
pub mod encoding;
pub mod log;
pub mod tsv;

use std::path::Path;

pub use detect::{detect_format, FileFormat};
pub use encoding::{decode_auto, decode_content, detect_encoding, TextEncoding};
pub use log::read_log;
pub use tsv::read_tsv;

use crate::data::DataSet;
use crate::error::{ReadError, ReadResult};
use crate::logs::log_info_indent;

/// A data set with the encoding and format it was read with.
#[derive(Debug, Clone)]
pub struct ReadOutcome {
    pub data: DataSet,
    pub encoding: TextEncoding,
    pub format: FileFormat,
}

/// Read a file, detecting encoding and, when `format` is `None`, its format.
///
/// # Example
/// ```ignore
/// let outcome = read_file("stroop-1-1.txt", None)?;
/// println!("{} rows as {}", outcome.data.len(), outcome.format);
/// ```
pub fn read_file<P: AsRef<Path>>(path: P, format: Option<FileFormat>) -> ReadResult<ReadOutcome> {
    let bytes = std::fs::read(path.as_ref())?;
    read_bytes(&bytes, format)
}

/// Read raw bytes, detecting encoding and, when `format` is `None`, its format.
pub fn read_bytes(bytes: &[u8], format: Option<FileFormat>) -> ReadResult<ReadOutcome> {
    if bytes.is_empty() {
        return Err(ReadError::EmptyFile);
    }
    let (content, encoding) = decode_auto(bytes)?;
    log_info_indent(format!("Encoding: {}", encoding), 1);
    let (format, data) = read_text(&content, format)?;
    log_info_indent(format!("Format: {} ({} rows, {} columns)", format, data.len(), data.columns().len()), 1);
    Ok(ReadOutcome { data, encoding, format })
}

/// Read already-decoded text.
pub fn read_text(content: &str, format: Option<FileFormat>) -> ReadResult<(FileFormat, DataSet)> {
    if content.trim().is_empty() {
        return Err(ReadError::EmptyFile);
    }
    let format = match format {
        Some(format) => format,
        None => detect_format(content)?,
    };
    let data = match format {
        FileFormat::EprimeLog => read_log(content)?,
        FileFormat::EprimeTsv | FileFormat::ExcelTsv | FileFormat::RawTsv => {
            read_tsv(content, format.skip_lines())?
        }
    };
    Ok((format, data))
}
