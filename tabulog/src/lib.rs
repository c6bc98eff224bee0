//! # tabulog - E-Prime logs to uniform tables, with computed columns
//!
//! tabulog reads E-Prime experiment output (raw logs, exported text and
//! spreadsheet tables) into one sparse data set, lets you define computed
//! columns with a small expression language, and writes the result as TSV
//! or JSON.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Log / TSV  │────▶│   Reader    │────▶│   DataSet   │────▶│  TSV / JSON │
//! │ (UTF-16/8)  │     │ (auto-fmt)  │     │ (+computed) │     │   Writer    │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use tabulog::DataSet;
//!
//! let mut data = DataSet::new();
//! data.add_row().set("stim_time", "3188").set("run_start", "2400");
//! data.add_computed_column("stim_offset", "{stim_time} - {run_start}").unwrap();
//!
//! let row = data.row(0).unwrap();
//! assert_eq!(row.get("stim_offset").unwrap().as_deref(), Some("788"));
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`expr`] - Expression parsing and evaluation
//! - [`data`] - Rows, column registry and computed columns
//! - [`reader`] - Encoding and format detection, log and TSV readers
//! - [`writer`] - TSV and JSON output
//! - [`config`] - Computed column definitions and environment settings
//! - [`pipeline`] - Read, compute, write in one call
//! - [`logs`] - Progress logging to stderr

// Core modules
pub mod error;
pub mod expr;
pub mod data;

// Input and output
pub mod reader;
pub mod writer;

// Orchestration
pub mod config;
pub mod pipeline;
pub mod logs;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ParseError,
    EvalError,
    ReadError,
    WriteError,
    ConfigError,
    PipelineError,
    PipelineResult,
};

// =============================================================================
// Re-exports - Expressions
// =============================================================================

pub use expr::{
    parse,
    evaluate,
    evaluate_computed,
    Context,
    EmptyContext,
    Expr,
    Value,
};

// =============================================================================
// Re-exports - Data
// =============================================================================

pub use data::{
    DataSet,
    Row,
    RowMut,
    RowRef,
    ColumnRegistry,
    ComputedColumn,
};

// =============================================================================
// Re-exports - Readers and writers
// =============================================================================

pub use reader::{
    read_file,
    read_bytes,
    detect_encoding,
    detect_format,
    FileFormat,
    TextEncoding,
    ReadOutcome,
};

pub use writer::{
    write_tsv,
    write_json,
    ErrorPolicy,
    OutputOptions,
    WriteReport,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use config::{ColumnConfig, ComputedColumnDef, EnvSettings};

pub use pipeline::{
    convert_file,
    convert_file_to_path,
    convert_bytes,
    prepare_file,
    ConvertOptions,
    ConvertSummary,
    OutputFormat,
};
