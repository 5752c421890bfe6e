// SPDX-License-Identifier: MIT
// Copyright (c) 2026 CI/CD Execution Core Contributors

//! Engine-local error type, layered over the shared [`cicd_core::CoreError`]
//! the same way `cicd-scheduler` layers `SchedulerError` over it.

use cicd_core::{CoreError, RunId};
use cicd_scheduler::SchedulerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error("unknown pipeline run {0}")]
    UnknownRun(RunId),
}

impl EngineError {
    pub fn is_cancellation(&self) -> bool {
        match self {
            EngineError::Core(e) => e.is_cancellation(),
            EngineError::Scheduler(e) => e.is_cancellation(),
            EngineError::UnknownRun(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_cancellation_only_true_for_the_cancelled_core_variant() {
        assert!(EngineError::Core(CoreError::Cancelled).is_cancellation());
        assert!(!EngineError::Core(CoreError::NotRunning).is_cancellation());
        assert!(!EngineError::UnknownRun(RunId::new("r1")).is_cancellation());
    }
}
