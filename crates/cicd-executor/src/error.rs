// SPDX-License-Identifier: MIT
// Copyright (c) 2026 CI/CD Execution Core Contributors

//! `ExecutorError` — wraps `CoreError` the way every other subsystem does,
//! adding the executor's own local-only variant.

use cicd_core::{CoreError, JobId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("unknown job {0}")]
    UnknownJob(JobId),
}

impl ExecutorError {
    pub fn is_cancellation(&self) -> bool {
        matches!(self, ExecutorError::Core(e) if e.is_cancellation())
    }
}

impl From<ExecutorError> for CoreError {
    fn from(e: ExecutorError) -> Self {
        match e {
            ExecutorError::Core(c) => c,
            ExecutorError::UnknownJob(id) => CoreError::Validation(format!("unknown job {id}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_is_detected_through_the_wrapper() {
        let err = ExecutorError::Core(CoreError::Cancelled);
        assert!(err.is_cancellation());
        assert!(!ExecutorError::UnknownJob(JobId::new("j1")).is_cancellation());
    }
}
