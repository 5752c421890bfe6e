// SPDX-License-Identifier: MIT
// Copyright (c) 2026 CI/CD Execution Core Contributors

//! Shared error categories common to every subsystem.

use thiserror::Error;

/// The eight semantic error categories shared across the engine,
/// scheduler, fleet, and executor. Crate-local error enums wrap this via
/// `#[from]` so callers can match on category without downcasting.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Component not started, or already stopped.
    #[error("not running")]
    NotRunning,

    /// A bounded queue is saturated; retry later or escalate.
    #[error("queue full")]
    QueueFull,

    /// The target runner has no active session.
    #[error("not connected")]
    NotConnected,

    /// A capacity ceiling (`MaxContainers` / `MaxConcurrentJobs`) was reached.
    #[error("capacity reached")]
    Capacity,

    /// The operation was aborted by cancellation. Never surfaced to the
    /// operator as a failure — cancelled jobs end in `Cancelled`, not `Failed`.
    #[error("cancelled")]
    Cancelled,

    /// The job DAG contains a cycle.
    #[error("dependency cycle detected")]
    Cycle,

    /// Input did not satisfy a documented invariant.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Repository, container daemon, or network failure.
    #[error("infrastructure error: {0}")]
    Infra(String),
}

impl CoreError {
    /// True for errors that should never be reported as job/run failures.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, CoreError::Cancelled)
    }
}
