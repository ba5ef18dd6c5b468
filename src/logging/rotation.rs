//! # Log Rotation
//!
//! Size-based rotation of the category files and the background task that runs
//! the sweep on a fixed interval.
//!
//! A file larger than the threshold is renamed with a timestamp suffix
//! (`payments.log` -> `payments_2025-01-31T09-15-02-114Z.log`) and the next
//! write starts a fresh file at the original path. The size is read at sweep
//! time without locking, so an append racing the rename may land in either file.

use super::Logger;
use crate::server::shutdown::{ShutdownAwareTask, ShutdownCoordinator};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Default rotation threshold, 10 MiB
pub const DEFAULT_MAX_LOG_BYTES: u64 = 10 * 1024 * 1024;
/// Default sweep interval, one hour
pub const DEFAULT_ROTATION_INTERVAL_SECONDS: u64 = 60 * 60;

///////////////////////////////////////////////////////////////////////////////
//****                         Public Structs                            ****//
///////////////////////////////////////////////////////////////////////////////

/// Handle to the background rotation task
pub struct RotationTask {
    shutdown: ShutdownCoordinator,
    handle: JoinHandle<()>,
}

impl RotationTask {
    /// Spawn the sweep with its own shutdown coordinator
    pub fn spawn(logger: Logger, interval: Duration) -> Self {
        Self::spawn_with_shutdown(logger, interval, ShutdownCoordinator::new())
    }

    /// Spawn the sweep, stopping when `shutdown` is initiated
    pub fn spawn_with_shutdown(
        logger: Logger,
        interval: Duration,
        shutdown: ShutdownCoordinator,
    ) -> Self {
        let mut shutdown_task = ShutdownAwareTask::new(&shutdown);

        let handle = tokio::spawn(async move {
            info!(
                "Starting log rotation background service (every {}s)",
                interval.as_secs()
            );
            loop {
                if shutdown_task.wait_or_shutdown(interval).await {
                    info!("Log rotation service shutting down");
                    break;
                }

                let rotated = logger.rotate_logs();
                debug!("Rotation sweep complete, {} file(s) rotated", rotated.len());
            }
        });

        Self { shutdown, handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Signal the task to stop and wait for it to exit
    pub async fn stop(self) {
        self.shutdown.initiate_shutdown();
        let _ = self.handle.await;
    }
}

///////////////////////////////////////////////////////////////////////////////
//****                       Public Functions                            ****//
///////////////////////////////////////////////////////////////////////////////

/// Backup path for a rotated file: `<stem>_<timestamp>.<ext>` with `:` and `.`
/// in the timestamp replaced by `-`. A numeric suffix is added if that path is taken.
pub fn backup_path(path: &Path, timestamp: &str) -> PathBuf {
    let sanitized = timestamp.replace([':', '.'], "-");
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path.extension().map(|e| e.to_string_lossy().into_owned());

    let name_for = |suffix: String| match &ext {
        Some(ext) => format!("{}_{}{}.{}", stem, sanitized, suffix, ext),
        None => format!("{}_{}{}", stem, sanitized, suffix),
    };

    let mut candidate = path.with_file_name(name_for(String::new()));
    let mut attempt = 1;
    while candidate.exists() {
        candidate = path.with_file_name(name_for(format!("-{}", attempt)));
        attempt += 1;
    }
    candidate
}

///////////////////////////////////////////////////////////////////////////////
//****                              Tests                                ****//
///////////////////////////////////////////////////////////////////////////////
