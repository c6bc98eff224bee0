//! Computed column definitions and output settings.
//!
//! Definitions come from a JSON file and from `name=expression` strings
//! given on the command line. A definition file looks like:
//!
//! ```json
//! {
//!   "computed_columns": [
//!     {"name": "stim_offset", "expression": "{stim_time} - {run_start}"},
//!     {"name": "stim_offset_s", "expression": "{stim_offset} / 1000"}
//!   ],
//!   "columns": ["Subject", "Trial", "stim_offset_s"],
//!   "sort_columns": false
//! }
//! ```
//!
//! `computed_columns` may also be a plain `{"name": "expression"}` object.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::data::{ComputedColumn, DataSet};
use crate::error::{ConfigError, ConfigResult};
use crate::logs::{log_warning, LogFormat};

/// Environment variable naming a default definition file.
pub const ENV_CONFIG: &str = "TABULOG_CONFIG";
/// Environment variable for the log level (`info` or `quiet`).
pub const ENV_LOG: &str = "TABULOG_LOG";
/// Environment variable for the log format (`text` or `json`).
pub const ENV_LOG_FORMAT: &str = "TABULOG_LOG_FORMAT";

/// A computed column as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputedColumnDef {
    pub name: String,
    pub expression: String,
}

impl ComputedColumnDef {
    pub fn new(name: impl Into<String>, expression: impl Into<String>) -> Self {
        Self { name: name.into(), expression: expression.into() }
    }

    /// Parse the expression, failing with the column name attached.
    pub fn compile(&self) -> ConfigResult<ComputedColumn> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::InvalidDefinition(format!(
                "empty column name for '{}'",
                self.expression
            )));
        }
        ComputedColumn::new(self.name.trim(), self.expression.as_str()).map_err(|source| ConfigError::Parse {
            name: self.name.clone(),
            source,
        })
    }
}

/// Parse a `name=expression` definition.
///
/// Only the first `=` separates name from expression.
///
/// # Example
/// ```
/// use tabulog::config::parse_definition;
///
/// let def = parse_definition("stim_offset = {stim_time} - {run_start}").unwrap();
/// assert_eq!(def.name, "stim_offset");
/// assert_eq!(def.expression, "{stim_time} - {run_start}");
/// ```
pub fn parse_definition(text: &str) -> ConfigResult<ComputedColumnDef> {
    let (name, expression) = text
        .split_once('=')
        .ok_or_else(|| ConfigError::InvalidDefinition(format!("'{}' is not name=expression", text)))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(ConfigError::InvalidDefinition(format!("'{}' has an empty name", text)));
    }
    Ok(ComputedColumnDef::new(name, expression.trim()))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DefinitionList {
    List(Vec<ComputedColumnDef>),
    Map(BTreeMap<String, String>),
}

fn definitions<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<ComputedColumnDef>, D::Error> {
    Ok(match DefinitionList::deserialize(deserializer)? {
        DefinitionList::List(defs) => defs,
        DefinitionList::Map(map) => map
            .into_iter()
            .map(|(name, expression)| ComputedColumnDef { name, expression })
            .collect(),
    })
}

/// Computed columns plus output column settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    #[serde(deserialize_with = "definitions")]
    pub computed_columns: Vec<ComputedColumnDef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
    pub sort_columns: bool,
}

impl ColumnConfig {
    /// Load and check a definition file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Parse and check definition JSON.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: ColumnConfig = serde_json::from_str(json)?;
        config.compile()?;
        Ok(config)
    }

    /// Append a command-line definition after the file ones.
    pub fn push_definition(&mut self, text: &str) -> ConfigResult<()> {
        let def = parse_definition(text)?;
        def.compile()?;
        self.computed_columns.push(def);
        Ok(())
    }

    /// Parse every definition, stopping at the first bad one.
    pub fn compile(&self) -> ConfigResult<Vec<ComputedColumn>> {
        self.computed_columns.iter().map(ComputedColumnDef::compile).collect()
    }

    /// Register every computed column on `data`.
    ///
    /// Nothing is registered if any definition fails to parse.
    pub fn apply(&self, data: &mut DataSet) -> ConfigResult<usize> {
        let compiled = self.compile()?;
        let count = compiled.len();
        for column in compiled {
            data.insert_computed_column(column);
        }
        Ok(count)
    }
}

/// Settings read from the environment (and `.env`, once loaded).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSettings {
    pub config_path: Option<PathBuf>,
    pub quiet: bool,
    pub log_format: LogFormat,
}

impl EnvSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from any key lookup. Unknown values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let config_path = lookup(ENV_CONFIG)
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        let quiet = match lookup(ENV_LOG).as_deref().map(str::trim) {
            None | Some("") | Some("info") => false,
            Some("quiet") => true,
            Some(other) => {
                log_warning(format!("Ignoring {}={} (expected info or quiet)", ENV_LOG, other));
                false
            }
        };

        let log_format = match lookup(ENV_LOG_FORMAT) {
            None => LogFormat::default(),
            Some(value) => value.parse().unwrap_or_else(|message: String| {
                log_warning(format!("Ignoring {}: {}", ENV_LOG_FORMAT, message));
                LogFormat::default()
            }),
        };

        Self { config_path, quiet, log_format }
    }
}
