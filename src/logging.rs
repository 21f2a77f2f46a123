//! # Log collaborator: levels, records, sinks.
//!
//! The dispatch core never returns errors to callers; everything
//! user-visible flows through this module as structured log records.
//! A [`LogSink`] receives [`LogRecord`]s; the default sink bridges to the
//! [`log`] crate so the host application's logger backend applies.
//!
//! ## Rules
//! - Six levels, TRACE through FATAL. FATAL has no `log` counterpart and
//!   is bridged as an error with a `fatal` marker.
//! - Records from one reactor arrive at the sink in FIFO order; across
//!   reactors there is no ordering.
//! - Each installed reactor gets its own [`Logger`] with a per-reactor
//!   level filter, set at install time.
//!
//! ## Example
//! ```
//! use turbine::{LogLevel, LogRecord, LogSink};
//!
//! struct Collect;
//! impl LogSink for Collect {
//!     fn write(&self, record: &LogRecord<'_>) {
//!         println!("[{}] {}", record.level.as_label(), record.message);
//!     }
//! }
//! ```

use std::sync::Arc;

/// Verbosity levels for reactor and runtime diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    /// Exact flow of execution; often a message per branch taken.
    Trace,
    /// Inputs and outputs of individual computation steps.
    Debug,
    /// High-level progress; key functionality executed successfully.
    Info,
    /// Something may be off and deserves attention, but the system keeps
    /// working.
    Warn,
    /// Unexpected behavior that needs action: failed callbacks, broken
    /// constraints, rejected work.
    Error,
    /// The kind of failure that should never happen. Always reported.
    Fatal,
}

impl LogLevel {
    /// Short stable label for formatting.
    pub fn as_label(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Fatal => "fatal",
        }
    }

    fn to_log(self) -> log::Level {
        match self {
            LogLevel::Trace => log::Level::Trace,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Info => log::Level::Info,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Error | LogLevel::Fatal => log::Level::Error,
        }
    }
}

/// One structured log message.
pub struct LogRecord<'a> {
    pub level: LogLevel,
    /// Name of the emitting reactor; `None` for runtime internals.
    pub reactor: Option<&'a str>,
    pub message: &'a str,
}

/// Receives structured log records from reactors and the runtime.
pub trait LogSink: Send + Sync + 'static {
    fn write(&self, record: &LogRecord<'_>);
}

/// Default sink: forwards to the [`log`] crate.
pub struct LogBridge;

impl LogSink for LogBridge {
    fn write(&self, record: &LogRecord<'_>) {
        let reactor = record.reactor.unwrap_or("runtime");
        match record.level {
            LogLevel::Fatal => {
                log::error!(target: "turbine", "[fatal] {}: {}", reactor, record.message)
            }
            level => {
                log::log!(target: "turbine", level.to_log(), "{}: {}", reactor, record.message)
            }
        }
    }
}

/// Level-filtered front end over a shared sink.
///
/// Cloned into reactors at install time and into the runtime's own
/// components; cheap to clone and to pass across threads.
#[derive(Clone)]
pub struct Logger {
    reactor: Option<Arc<str>>,
    level: LogLevel,
    sink: Arc<dyn LogSink>,
}

impl Logger {
    pub(crate) fn runtime(level: LogLevel, sink: Arc<dyn LogSink>) -> Self {
        Self {
            reactor: None,
            level,
            sink,
        }
    }

    pub(crate) fn for_reactor(&self, name: &str, level: LogLevel) -> Self {
        Self {
            reactor: Some(Arc::from(name)),
            level,
            sink: Arc::clone(&self.sink),
        }
    }

    pub(crate) fn reactor_name(&self) -> Option<&str> {
        self.reactor.as_deref()
    }

    /// Emits a record if `level` passes this logger's filter.
    pub fn log(&self, level: LogLevel, message: &str) {
        if level < self.level {
            return;
        }
        self.sink.write(&LogRecord {
            level,
            reactor: self.reactor.as_deref(),
            message,
        });
    }

    pub fn trace(&self, message: &str) {
        self.log(LogLevel::Trace, message);
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    pub fn fatal(&self, message: &str) {
        self.log(LogLevel::Fatal, message);
    }
}
