// SPDX-License-Identifier: MIT
// Copyright (c) 2026 CI/CD Execution Core Contributors

//! Fleet-local error type, layered over [`cicd_core::CoreError`] and the
//! wire protocol's own error type.

use crate::wire::ProtocolError;
use cicd_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FleetError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("runner {0} is not registered")]
    UnknownRunner(String),

    #[error("missing runner_id query parameter")]
    MissingRunnerId,
}

impl FleetError {
    pub fn is_cancellation(&self) -> bool {
        matches!(self, FleetError::Core(e) if e.is_cancellation())
    }
}
