//! # Error types used by the turbine runtime.
//!
//! This module defines two error enums:
//!
//! - [`BindError`] rejected bindings; the only fallible public call.
//! - [`RuntimeError`] failures of the runtime machinery itself.
//!
//! Both types provide an `as_label` helper for logs and metrics. Nothing
//! else on the public surface returns errors: dispatch failures become
//! log records (see `logging.rs`).

use std::time::Duration;

use thiserror::Error;

/// # Errors produced while fusing and registering a binding.
///
/// Raised by [`OnBuilder::bind`](crate::OnBuilder::bind); when binding
/// fails, no reaction is created.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum BindError {
    /// The binding declared no trigger word at all.
    #[error("binding has no trigger; add an `on`, `or`, or `every` word")]
    NoTrigger,
    /// `every` was given a zero interval.
    #[error("`every` interval must be non-zero")]
    ZeroInterval,
    /// The same trigger type was declared twice in one binding.
    #[error("duplicate trigger `{name}` in one binding")]
    DuplicateTrigger {
        /// The repeated trigger's type name.
        name: &'static str,
    },
    /// The runtime has begun shutting down; no new bindings are accepted.
    #[error("binding rejected: runtime is shutting down")]
    ShuttingDown,
}

impl BindError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            BindError::NoTrigger => "bind_no_trigger",
            BindError::ZeroInterval => "bind_zero_interval",
            BindError::DuplicateTrigger { .. } => "bind_duplicate_trigger",
            BindError::ShuttingDown => "bind_shutting_down",
        }
    }
}

/// # Errors produced by the runtime machinery.
///
/// These surface only from [`Plant::shutdown`](crate::Plant::shutdown);
/// everything on the dispatch path turns into log records instead.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; some callbacks were still
    /// running and their workers were left to finish detached.
    #[error("shutdown grace {grace:?} exceeded; still running: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Identifiers of reactions still executing.
        stuck: Vec<String>,
    },
    /// Shutdown was requested more than once.
    #[error("runtime already stopped")]
    AlreadyStopped,
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
            RuntimeError::AlreadyStopped => "runtime_already_stopped",
        }
    }
}
