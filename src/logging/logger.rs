//! # Logger
//!
//! The long-lived logging service. Construct one at startup and hand clones to
//! every consumer; clones share the same sinks.
//!
//! Each category method builds a single pipe-delimited line from a fixed
//! template, appends it to the category file and echoes it to the console.
//! File failures are reported through `tracing` and never propagate.
//!
//! ```rust,ignore
//! let logger = Logger::from_config(&LoggerConfig::default())?;
//! logger.payment().init("PAY_001", &PaymentInit {
//!     email: "jane@example.com",
//!     amount: 1500.0,
//!     booking_id: "BK-42",
//! });
//! ```

use super::errors::{ErrorContext, single_line, source_chain};
use super::rotation::DEFAULT_MAX_LOG_BYTES;
use super::sink::{ConsoleSink, FileSink, LogSink};
use super::types::{LogCategory, LogLevel, LogRecord};
use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::fmt::Display;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::error;

/// Operations slower than this get a console warning
pub const DEFAULT_SLOW_OPERATION_MS: u64 = 1000;

const NOT_AVAILABLE: &str = "N/A";

///////////////////////////////////////////////////////////////////////////////
//****                         Public Structs                            ****//
///////////////////////////////////////////////////////////////////////////////

/// Settings used to build a file + console logger
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub log_dir: PathBuf,
    pub console_color: bool,
    pub max_log_bytes: u64,
    pub slow_operation_threshold: Duration,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
            console_color: true,
            max_log_bytes: DEFAULT_MAX_LOG_BYTES,
            slow_operation_threshold: Duration::from_millis(DEFAULT_SLOW_OPERATION_MS),
        }
    }
}

/// Fields of a newly initialized payment
#[derive(Debug, Clone)]
pub struct PaymentInit<'a> {
    pub email: &'a str,
    pub amount: f64,
    pub booking_id: &'a str,
}

/// Fields of a completed payment
#[derive(Debug, Clone)]
pub struct PaymentSuccess<'a> {
    pub amount: f64,
    pub payment_method: &'a str,
    pub completed_at: &'a str,
}

/// Optional fields of a failed payment, rendered as `N/A` when absent
#[derive(Debug, Clone, Default)]
pub struct PaymentFailure<'a> {
    pub amount: Option<f64>,
    pub gateway_response: Option<&'a str>,
}

/// Shared logging service
#[derive(Clone)]
pub struct Logger {
    files: Arc<dyn LogSink>,
    console: Arc<dyn LogSink>,
    max_log_bytes: u64,
    slow_operation_threshold: Duration,
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("max_log_bytes", &self.max_log_bytes)
            .field("slow_operation_threshold", &self.slow_operation_threshold)
            .finish_non_exhaustive()
    }
}

impl Logger {
    /// Build a logger over explicit sinks
    pub fn new(files: Arc<dyn LogSink>, console: Arc<dyn LogSink>) -> Self {
        Self {
            files,
            console,
            max_log_bytes: DEFAULT_MAX_LOG_BYTES,
            slow_operation_threshold: Duration::from_millis(DEFAULT_SLOW_OPERATION_MS),
        }
    }

    /// Build a file + console logger, creating the log directory if needed
    pub fn from_config(config: &LoggerConfig) -> io::Result<Self> {
        let files = FileSink::new(&config.log_dir)?;
        Ok(Self::new(
            Arc::new(files),
            Arc::new(ConsoleSink::new(config.console_color)),
        )
        .with_max_log_bytes(config.max_log_bytes)
        .with_slow_operation_threshold(config.slow_operation_threshold))
    }

    pub fn with_max_log_bytes(mut self, max_log_bytes: u64) -> Self {
        self.max_log_bytes = max_log_bytes;
        self
    }

    pub fn with_slow_operation_threshold(mut self, threshold: Duration) -> Self {
        self.slow_operation_threshold = threshold;
        self
    }

    pub fn max_log_bytes(&self) -> u64 {
        self.max_log_bytes
    }

    pub fn payment(&self) -> PaymentLog<'_> {
        PaymentLog { logger: self }
    }

    pub fn webhook(&self) -> WebhookLog<'_> {
        WebhookLog { logger: self }
    }

    pub fn api(&self) -> ApiLog<'_> {
        ApiLog { logger: self }
    }

    pub fn firebase(&self) -> FirebaseLog<'_> {
        FirebaseLog { logger: self }
    }

    pub fn performance(&self) -> PerformanceLog<'_> {
        PerformanceLog { logger: self }
    }

    /// Record an error and its source chain in `errors.log`
    pub fn error(&self, err: &(dyn Error + 'static), context: Option<&ErrorContext>) {
        let stack = source_chain(err).unwrap_or_else(|| NOT_AVAILABLE.to_string());
        let context = context
            .map(|c| c.to_json())
            .unwrap_or_else(|| "{}".to_string());
        let message = format!(
            "ERROR | Message: {} | Stack: {} | Context: {}",
            err, stack, context
        );
        self.emit(LogCategory::Error, LogLevel::Error, message);
    }

    pub fn info(&self, message: impl Display) {
        self.emit(LogCategory::Api, LogLevel::Info, message.to_string());
    }

    pub fn success(&self, message: impl Display) {
        self.emit(LogCategory::Api, LogLevel::Success, message.to_string());
    }

    pub fn warning(&self, message: impl Display) {
        self.emit(LogCategory::Api, LogLevel::Warning, message.to_string());
    }

    pub fn debug(&self, message: impl Display) {
        self.emit(LogCategory::Api, LogLevel::Debug, message.to_string());
    }

    /// Rotate every category file larger than the configured threshold.
    /// Filesystem errors are swallowed per file.
    pub fn rotate_logs(&self) -> Vec<PathBuf> {
        self.files.rotate(self.max_log_bytes)
    }

    ///////////////////////////////////////////////////////////////////////////
    //****                      Private Helpers                          ****//
    ///////////////////////////////////////////////////////////////////////////

    /// Write to the category file and echo to the console
    fn emit(&self, category: LogCategory, level: LogLevel, message: String) {
        let record = LogRecord::new(category, level, single_line(&message));
        self.write_file(&record);
        self.write_console(&record);
    }

    fn write_file(&self, record: &LogRecord) {
        if let Err(e) = self.files.write(record) {
            error!(
                category = record.category.as_str(),
                "Failed to write to log file: {}", e
            );
        }
    }

    fn write_console(&self, record: &LogRecord) {
        // Nowhere left to report a broken stdout
        let _ = self.console.write(record);
    }
}

/// Payment lifecycle entries, `payments.log`
pub struct PaymentLog<'a> {
    logger: &'a Logger,
}

impl PaymentLog<'_> {
    pub fn init(&self, reference: &str, data: &PaymentInit<'_>) {
        let message = format!(
            "PAYMENT_INIT | Ref: {} | Email: {} | Amount: KES {} | Booking: {}",
            reference, data.email, data.amount, data.booking_id
        );
        self.emit(LogLevel::Info, message);
    }

    pub fn success(&self, reference: &str, data: &PaymentSuccess<'_>) {
        let message = format!(
            "PAYMENT_SUCCESS | Ref: {} | Amount: KES {} | Method: {} | CompletedAt: {}",
            reference, data.amount, data.payment_method, data.completed_at
        );
        self.emit(LogLevel::Success, message);
    }

    pub fn failed(&self, reference: &str, error: impl Display, data: &PaymentFailure<'_>) {
        let amount = data
            .amount
            .map(|a| a.to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());
        let message = format!(
            "PAYMENT_FAILED | Ref: {} | Error: {} | Amount: KES {} | Reason: {}",
            reference,
            error,
            amount,
            data.gateway_response.unwrap_or(NOT_AVAILABLE)
        );
        self.emit(LogLevel::Error, message);
    }

    pub fn retry(&self, original_ref: &str, new_ref: &str, retry_count: u32) {
        let message = format!(
            "PAYMENT_RETRY | Original: {} | New: {} | RetryCount: {}",
            original_ref, new_ref, retry_count
        );
        self.emit(LogLevel::Warning, message);
    }

    pub fn cancel(&self, reference: &str, reason: &str) {
        let message = format!("PAYMENT_CANCELLED | Ref: {} | Reason: {}", reference, reason);
        self.emit(LogLevel::Warning, message);
    }

    pub fn status(&self, reference: &str, status: &str, details: Option<&Value>) {
        let message = format!(
            "PAYMENT_STATUS | Ref: {} | Status: {} | Details: {}",
            reference,
            status,
            details_json(details)
        );
        self.emit(LogLevel::Debug, message);
    }

    fn emit(&self, level: LogLevel, message: String) {
        self.logger.emit(LogCategory::Payment, level, message);
    }
}

/// Payment provider callbacks, `webhooks.log`
pub struct WebhookLog<'a> {
    logger: &'a Logger,
}

impl WebhookLog<'_> {
    pub fn incoming(&self, event: &str, reference: Option<&str>) {
        let message = format!(
            "WEBHOOK_INCOMING | Event: {} | Ref: {}",
            event,
            reference.unwrap_or(NOT_AVAILABLE)
        );
        self.emit(LogLevel::Info, message);
    }

    pub fn verified(&self, event: &str, reference: &str) {
        let message = format!("WEBHOOK_VERIFIED | Event: {} | Ref: {}", event, reference);
        self.emit(LogLevel::Success, message);
    }

    pub fn failed(&self, event: &str, error: impl Display) {
        let message = format!("WEBHOOK_FAILED | Event: {} | Error: {}", event, error);
        self.emit(LogLevel::Error, message);
    }

    pub fn processed(&self, event: &str, reference: &str, action: &str) {
        let message = format!(
            "WEBHOOK_PROCESSED | Event: {} | Ref: {} | Action: {}",
            event, reference, action
        );
        self.emit(LogLevel::Success, message);
    }

    pub fn signature_error(&self, reason: &str) {
        let message = format!("WEBHOOK_SIGNATURE_ERROR | Reason: {}", reason);
        self.emit(LogLevel::Error, message);
    }

    fn emit(&self, level: LogLevel, message: String) {
        self.logger.emit(LogCategory::Webhook, level, message);
    }
}

/// Inbound HTTP traffic, `api.log`
pub struct ApiLog<'a> {
    logger: &'a Logger,
}

impl ApiLog<'_> {
    pub fn request(&self, method: &str, endpoint: &str, ip: &str, user_agent: &str) {
        let message = format!(
            "API_REQUEST | Method: {} | Endpoint: {} | IP: {} | UA: {}",
            method, endpoint, ip, user_agent
        );
        self.emit(LogLevel::Info, message);
    }

    pub fn response(&self, method: &str, endpoint: &str, status_code: u16, response_time_ms: u64) {
        let message = format!(
            "API_RESPONSE | Method: {} | Endpoint: {} | Status: {} | Time: {}ms",
            method, endpoint, status_code, response_time_ms
        );
        self.emit(LogLevel::Info, message);
    }

    pub fn error(&self, method: &str, endpoint: &str, error: impl Display, status_code: u16) {
        let message = format!(
            "API_ERROR | Method: {} | Endpoint: {} | Error: {} | Status: {}",
            method, endpoint, error, status_code
        );
        self.emit(LogLevel::Error, message);
    }

    fn emit(&self, level: LogLevel, message: String) {
        self.logger.emit(LogCategory::Api, level, message);
    }
}

/// Document store access, `firebase.log`
pub struct FirebaseLog<'a> {
    logger: &'a Logger,
}

impl FirebaseLog<'_> {
    pub fn write(&self, collection: &str, document: &str, operation: &str) {
        let message = format!(
            "FIREBASE_WRITE | Collection: {} | Doc: {} | Operation: {}",
            collection, document, operation
        );
        self.emit(LogLevel::Debug, message);
    }

    pub fn read(&self, collection: &str, document: &str) {
        let message = format!("FIREBASE_READ | Collection: {} | Doc: {}", collection, document);
        self.emit(LogLevel::Debug, message);
    }

    pub fn error(&self, operation: &str, error: impl Display) {
        let message = format!("FIREBASE_ERROR | Operation: {} | Error: {}", operation, error);
        self.emit(LogLevel::Error, message);
    }

    fn emit(&self, level: LogLevel, message: String) {
        self.logger.emit(LogCategory::Firebase, level, message);
    }
}

/// Timings and memory samples, `performance.log`. These entries are not echoed;
/// only slow operations reach the console, as a warning.
pub struct PerformanceLog<'a> {
    logger: &'a Logger,
}

impl PerformanceLog<'_> {
    pub fn timing(&self, operation: &str, duration_ms: u64, details: Option<&Value>) {
        let message = format!(
            "PERFORMANCE | Operation: {} | Duration: {}ms | Details: {}",
            operation,
            duration_ms,
            details_json(details)
        );
        self.logger.write_file(&LogRecord::new(
            LogCategory::Performance,
            LogLevel::Info,
            single_line(&message),
        ));

        if u128::from(duration_ms) > self.logger.slow_operation_threshold.as_millis() {
            let warning = format!("SLOW_OPERATION: {} took {}ms", operation, duration_ms);
            self.logger.write_console(&LogRecord::new(
                LogCategory::Performance,
                LogLevel::Warning,
                single_line(&warning),
            ));
        }
    }

    pub fn memory(&self, operation: &str, usage: &impl Serialize) {
        let usage = serde_json::to_string(usage).unwrap_or_else(|_| "{}".to_string());
        let message = format!("MEMORY | Operation: {} | Usage: {}", operation, usage);
        self.logger.write_file(&LogRecord::new(
            LogCategory::Performance,
            LogLevel::Debug,
            single_line(&message),
        ));
    }
}

fn details_json(details: Option<&Value>) -> String {
    details
        .map(|d| d.to_string())
        .unwrap_or_else(|| "{}".to_string())
}

///////////////////////////////////////////////////////////////////////////////
//****                              Tests                                ****//
///////////////////////////////////////////////////////////////////////////////
