// SPDX-License-Identifier: MIT
// Copyright (c) 2026 CI/CD Execution Core Contributors

//! Scheduler-local error type, layered over the shared [`cicd_core::CoreError`].

use crate::strategy::SchedulingStrategy;
use cicd_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("unsupported scheduling strategy: {0:?}")]
    UnsupportedStrategy(SchedulingStrategy),
}

impl SchedulerError {
    pub fn is_cancellation(&self) -> bool {
        matches!(self, SchedulerError::Core(e) if e.is_cancellation())
    }
}
