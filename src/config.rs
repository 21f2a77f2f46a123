//! # Global runtime configuration.
//!
//! [`Config`] defines the plant's behavior: worker pool size, task queue
//! bound, shutdown grace period, and the runtime's own log level.
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use turbine::{Config, LogLevel};
//!
//! let mut cfg = Config::default();
//! cfg.workers = 4;
//! cfg.grace = Duration::from_secs(10);
//! cfg.log_level = LogLevel::Debug;
//!
//! assert_eq!(cfg.workers, 4);
//! ```

use std::time::Duration;

use crate::logging::LogLevel;

/// Global configuration for the plant and its scheduler.
///
/// Controls worker parallelism, queue bounding, shutdown grace, and
/// runtime diagnostics verbosity.
#[derive(Clone, Debug)]
pub struct Config {
    /// Worker thread count (0 = available hardware parallelism).
    pub workers: usize,
    /// Task queue capacity (0 = unbounded). When bounded, overflow
    /// rejects the newest submission with an ERROR log.
    pub queue_bound: usize,
    /// Maximum time to wait for running callbacks during shutdown.
    pub grace: Duration,
    /// Level filter for the runtime's own diagnostics.
    pub log_level: LogLevel,
}

impl Default for Config {
    /// Provides a default configuration:
    /// - `workers = 0` (hardware parallelism)
    /// - `queue_bound = 0` (unbounded)
    /// - `grace = 30s`
    /// - `log_level = Info`
    fn default() -> Self {
        Self {
            workers: 0,
            queue_bound: 0,
            grace: Duration::from_secs(30),
            log_level: LogLevel::Info,
        }
    }
}

impl Config {
    /// Resolved worker count: the configured value, or the machine's
    /// available parallelism when unset.
    pub(crate) fn worker_count(&self) -> usize {
        match self.workers {
            0 => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            n => n,
        }
    }
}
