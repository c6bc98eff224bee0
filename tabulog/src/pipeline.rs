//! High-level conversion API: read a file, attach computed columns, write it out.
//!
//! # Example
//!
//! ```rust,ignore
//! use tabulog::pipeline::{convert_file, ConvertOptions};
//!
//! let mut options = ConvertOptions::default();
//! options.config.push_definition("rt_s={Stim.RT}/1000")?;
//!
//! let summary = convert_file("stroop-1-1.txt", std::io::stdout(), &options)?;
//! eprintln!("{} rows", summary.report.rows_written);
//! ```

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::config::ColumnConfig;
use crate::error::{PipelineError, PipelineResult, WriteError};
use crate::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::reader::{read_bytes, read_file, FileFormat, ReadOutcome, TextEncoding};
use crate::writer::{write_json, write_tsv, ErrorPolicy, OutputOptions, WriteReport};

/// Serialization used for converted output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Tsv,
    Json,
}

/// Options for the conversion pipeline
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Force an input format instead of detecting it
    pub format: Option<FileFormat>,
    /// Computed columns and output column settings
    pub config: ColumnConfig,
    pub output_format: OutputFormat,
    pub on_error: ErrorPolicy,
}

impl ConvertOptions {
    pub fn output_options(&self) -> OutputOptions {
        OutputOptions {
            columns: self.config.columns.clone(),
            sort_columns: self.config.sort_columns,
            on_error: self.on_error,
        }
    }
}

/// What a conversion did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertSummary {
    pub encoding: TextEncoding,
    pub format: FileFormat,
    /// Rows read from the input
    pub rows: usize,
    /// Stored columns read from the input
    pub columns: usize,
    /// Computed columns attached
    pub computed: usize,
    pub report: WriteReport,
}

/// Read a file and attach the configured computed columns.
pub fn prepare_file<P: AsRef<Path>>(path: P, format: Option<FileFormat>, config: &ColumnConfig) -> PipelineResult<ReadOutcome> {
    log_info(format!("Reading {}", path.as_ref().display()));
    let outcome = read_file(path, format)?;
    finish_prepare(outcome, config)
}

/// Like [`prepare_file`] for content already in memory.
pub fn prepare_bytes(bytes: &[u8], format: Option<FileFormat>, config: &ColumnConfig) -> PipelineResult<ReadOutcome> {
    let outcome = read_bytes(bytes, format)?;
    finish_prepare(outcome, config)
}

fn finish_prepare(mut outcome: ReadOutcome, config: &ColumnConfig) -> PipelineResult<ReadOutcome> {
    if outcome.data.is_empty() {
        return Err(PipelineError::EmptyInput);
    }
    let computed = config.apply(&mut outcome.data)?;
    if computed > 0 {
        log_info_indent(format!("{} computed column(s)", computed), 1);
    }
    Ok(outcome)
}

/// Convert a file and write the result to `writer`.
pub fn convert_file<P: AsRef<Path>, W: Write>(input: P, writer: W, options: &ConvertOptions) -> PipelineResult<ConvertSummary> {
    let outcome = prepare_file(input, options.format, &options.config)?;
    write_outcome(outcome, writer, options)
}

/// Convert a file into `output`.
///
/// The output is built in memory and written only once the conversion has
/// succeeded, so a failed conversion leaves `output` untouched.
pub fn convert_file_to_path<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    options: &ConvertOptions,
) -> PipelineResult<ConvertSummary> {
    let mut buffer = Vec::new();
    let summary = convert_file(input, &mut buffer, options)?;
    fs::write(output.as_ref(), &buffer).map_err(WriteError::from)?;
    Ok(summary)
}

/// Convert in-memory content and write the result to `writer`.
pub fn convert_bytes<W: Write>(bytes: &[u8], writer: W, options: &ConvertOptions) -> PipelineResult<ConvertSummary> {
    let outcome = prepare_bytes(bytes, options.format, &options.config)?;
    write_outcome(outcome, writer, options)
}

fn write_outcome<W: Write>(outcome: ReadOutcome, writer: W, options: &ConvertOptions) -> PipelineResult<ConvertSummary> {
    let data = &outcome.data;
    let output = options.output_options();

    let report = match options.output_format {
        OutputFormat::Tsv => write_tsv(data, writer, &output)?,
        OutputFormat::Json => write_json(data, writer, &output)?,
    };

    if report.rows_skipped > 0 || report.blank_cells > 0 {
        log_warning(format!(
            "{} row(s) skipped, {} cell(s) left blank",
            report.rows_skipped, report.blank_cells
        ));
    }
    log_success(format!("Wrote {} rows", report.rows_written));

    Ok(ConvertSummary {
        encoding: outcome.encoding,
        format: outcome.format,
        rows: data.len(),
        columns: data.columns().len(),
        computed: data.computed_columns().count(),
        report,
    })
}
