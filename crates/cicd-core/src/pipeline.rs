// SPDX-License-Identifier: MIT
// Copyright (c) 2026 CI/CD Execution Core Contributors

//! `Pipeline` — a registered, named pipeline configuration that runs are
//! created against.

use crate::ids::PipelineId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A pipeline as registered with the system: identity, tenant, display
/// name, and the branch a run defaults to when none is specified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    pub id: PipelineId,
    pub tenant: String,
    pub name: String,
    pub default_branch: String,
    pub created_at: DateTime<Utc>,
}

impl Pipeline {
    pub fn new(
        id: PipelineId,
        tenant: impl Into<String>,
        name: impl Into<String>,
        default_branch: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            tenant: tenant.into(),
            name: name.into(),
            default_branch: default_branch.into(),
            created_at,
        }
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
