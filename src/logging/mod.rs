//! # Logging Module
//!
//! This module provides the categorized logging service for the payment backend.
//! Every entry is written as one line to a per-domain file and echoed to a
//! colorized console.
//!
//! ## Features
//!
//! - **Category Files**: `payments.log`, `webhooks.log`, `api.log`, `firebase.log`,
//!   `performance.log` and `errors.log` under one log directory
//! - **Console Echo**: ANSI colored by level (INFO cyan, SUCCESS green, WARNING yellow,
//!   ERROR red, DEBUG magenta)
//! - **Size-based Rotation**: Oversized files are renamed with a timestamp suffix
//! - **Substitutable Sinks**: Tests swap the file and console sinks for in-memory ones
//! - **Best Effort**: Write failures are reported through `tracing` and never propagate

pub mod errors;
pub mod logger;
pub mod memory;
pub mod rotation;
pub mod sink;
pub mod types;

pub use errors::ErrorContext;
pub use logger::{Logger, LoggerConfig, PaymentFailure, PaymentInit, PaymentSuccess};
pub use memory::MemoryUsage;
pub use rotation::RotationTask;
pub use sink::{ConsoleSink, FileSink, LogSink, MemorySink};
pub use types::{LogCategory, LogLevel, LogRecord};
