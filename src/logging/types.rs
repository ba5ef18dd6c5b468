//! # Log Record Types
//!
//! Severity levels, categories and the immutable record that every sink receives.

use chrono::{SecondsFormat, Utc};
use std::fmt;

/// ANSI reset sequence appended after a colored console prefix
pub const ANSI_RESET: &str = "\x1b[0m";

///////////////////////////////////////////////////////////////////////////////
//****                         Public Types                              ****//
///////////////////////////////////////////////////////////////////////////////

/// Severity of a log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
    Debug,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Success => "SUCCESS",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Debug => "DEBUG",
        }
    }

    /// ANSI color used for the console prefix
    pub fn ansi_color(&self) -> &'static str {
        match self {
            LogLevel::Info => "\x1b[36m",
            LogLevel::Success => "\x1b[32m",
            LogLevel::Warning => "\x1b[33m",
            LogLevel::Error => "\x1b[31m",
            LogLevel::Debug => "\x1b[35m",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical grouping of log lines, each routed to its own file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogCategory {
    Payment,
    Webhook,
    Api,
    Firebase,
    Performance,
    Error,
}

impl LogCategory {
    /// Every category, in the order the rotation sweep visits them
    pub const ALL: [LogCategory; 6] = [
        LogCategory::Payment,
        LogCategory::Webhook,
        LogCategory::Error,
        LogCategory::Performance,
        LogCategory::Api,
        LogCategory::Firebase,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogCategory::Payment => "payment",
            LogCategory::Webhook => "webhook",
            LogCategory::Api => "api",
            LogCategory::Firebase => "firebase",
            LogCategory::Performance => "performance",
            LogCategory::Error => "error",
        }
    }

    /// File name of the category's sink inside the log directory
    pub fn file_name(&self) -> &'static str {
        match self {
            LogCategory::Payment => "payments.log",
            LogCategory::Webhook => "webhooks.log",
            LogCategory::Api => "api.log",
            LogCategory::Firebase => "firebase.log",
            LogCategory::Performance => "performance.log",
            LogCategory::Error => "errors.log",
        }
    }
}

///////////////////////////////////////////////////////////////////////////////
//****                         Public Structs                            ****//
///////////////////////////////////////////////////////////////////////////////

/// A single formatted log entry
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub timestamp: String,
    pub level: LogLevel,
    pub category: LogCategory,
    pub message: String,
}

impl LogRecord {
    /// Build a record stamped with the current UTC time
    pub fn new(category: LogCategory, level: LogLevel, message: impl Into<String>) -> Self {
        LogRecord {
            timestamp: timestamp_now(),
            level,
            category,
            message: message.into(),
        }
    }

    /// `[timestamp] [LEVEL] message`, without trailing newline
    pub fn to_line(&self) -> String {
        format!("[{}] [{}] {}", self.timestamp, self.level, self.message)
    }

    /// Console rendering, optionally wrapping the prefix in the level's color
    pub fn to_console_line(&self, color: bool) -> String {
        if color {
            format!(
                "{}[{}] [{}]{} {}",
                self.level.ansi_color(),
                self.timestamp,
                self.level,
                ANSI_RESET,
                self.message
            )
        } else {
            self.to_line()
        }
    }
}

///////////////////////////////////////////////////////////////////////////////
//****                       Public Functions                            ****//
///////////////////////////////////////////////////////////////////////////////

/// ISO-8601 UTC timestamp with millisecond precision, e.g. `2025-01-31T09:15:02.114Z`
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

///////////////////////////////////////////////////////////////////////////////
//****                              Tests                                ****//
///////////////////////////////////////////////////////////////////////////////
