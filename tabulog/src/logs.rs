//! Progress logging for readers, writers and the conversion pipeline.
//!
//! Entries go to stderr so converted data written to stdout stays clean.
//! The logger is process-wide and can be switched to quiet mode or to
//! one JSON object per line.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::RwLock;

/// Log level, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A single log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Log level
    pub level: LogLevel,
    /// Log message
    pub message: String,
    /// Nesting depth for sub-steps
    #[serde(default)]
    pub indent: u8,
}

impl LogEntry {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Info, message: message.into(), indent: 0 }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Success, message: message.into(), indent: 0 }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Warning, message: message.into(), indent: 0 }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Error, message: message.into(), indent: 0 }
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }
}

/// How entries are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Prefixed, indented lines for humans.
    #[default]
    Text,
    /// One serialized [`LogEntry`] per line.
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("Unknown log format '{}' (expected text or json)", other)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct LoggerSettings {
    min_level: LogLevel,
    format: LogFormat,
}

/// Global logger
pub static LOGGER: Lazy<Logger> = Lazy::new(Logger::new);

/// Writes log entries to stderr according to the current settings.
pub struct Logger {
    settings: RwLock<LoggerSettings>,
}

impl Logger {
    pub fn new() -> Self {
        Self {
            settings: RwLock::new(LoggerSettings {
                min_level: LogLevel::Info,
                format: LogFormat::Text,
            }),
        }
    }

    /// Replaces the logger settings. `quiet` drops everything below warnings.
    pub fn configure(&self, quiet: bool, format: LogFormat) {
        let min_level = if quiet { LogLevel::Warning } else { LogLevel::Info };
        if let Ok(mut settings) = self.settings.write() {
            *settings = LoggerSettings { min_level, format };
        }
    }

    pub fn log(&self, entry: LogEntry) {
        let settings = match self.settings.read() {
            Ok(settings) => *settings,
            Err(poisoned) => *poisoned.into_inner(),
        };
        if let Some(line) = render(&entry, settings.min_level, settings.format) {
            // Nothing sensible to do if stderr is gone
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

/// Formats an entry, or returns `None` when it is below `min_level`.
fn render(entry: &LogEntry, min_level: LogLevel, format: LogFormat) -> Option<String> {
    if entry.level < min_level {
        return None;
    }
    match format {
        LogFormat::Json => serde_json::to_string(entry).ok(),
        LogFormat::Text => {
            let prefix = match entry.level {
                LogLevel::Info => "   ",
                LogLevel::Success => "   ✓",
                LogLevel::Warning => "   ⚠️",
                LogLevel::Error => "   ❌",
            };
            let indent = "   ".repeat(entry.indent as usize);
            Some(format!("{}{} {}", indent, prefix, entry.message))
        }
    }
}

/// Applies settings to the global logger.
pub fn configure(quiet: bool, format: LogFormat) {
    LOGGER.configure(quiet, format);
}

pub fn log_info(msg: impl Into<String>) {
    LOGGER.log(LogEntry::info(msg));
}

pub fn log_success(msg: impl Into<String>) {
    LOGGER.log(LogEntry::success(msg));
}

pub fn log_warning(msg: impl Into<String>) {
    LOGGER.log(LogEntry::warning(msg));
}

pub fn log_error(msg: impl Into<String>) {
    LOGGER.log(LogEntry::error(msg));
}

pub fn log_info_indent(msg: impl Into<String>, indent: u8) {
    LOGGER.log(LogEntry::info(msg).with_indent(indent));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_rendering() {
        let entry = LogEntry::info("Reading trials.txt").with_indent(1);
        assert_eq!(
            render(&entry, LogLevel::Info, LogFormat::Text).unwrap(),
            "       Reading trials.txt"
        );

        let entry = LogEntry::success("Wrote 12 rows");
        assert_eq!(render(&entry, LogLevel::Info, LogFormat::Text).unwrap(), "   ✓ Wrote 12 rows");
    }

    #[test]
    fn test_quiet_drops_info() {
        assert!(render(&LogEntry::info("x"), LogLevel::Warning, LogFormat::Text).is_none());
        assert!(render(&LogEntry::success("x"), LogLevel::Warning, LogFormat::Text).is_none());
        assert!(render(&LogEntry::warning("x"), LogLevel::Warning, LogFormat::Text).is_some());
        assert!(render(&LogEntry::error("x"), LogLevel::Warning, LogFormat::Json).is_some());
    }

    #[test]
    fn test_json_rendering() {
        let entry = LogEntry::warning("Row 3 skipped").with_indent(2);
        let line = render(&entry, LogLevel::Info, LogFormat::Json).unwrap();
        assert_eq!(line, r#"{"level":"warning","message":"Row 3 skipped","indent":2}"#);

        let parsed: LogEntry = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed, entry);
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!(" Text ".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("yaml".parse::<LogFormat>().is_err());
    }
}
