// SPDX-License-Identifier: MIT
// Copyright (c) 2026 CI/CD Execution Core Contributors

//! `JobResultSink` — the narrow interface the fleet and the local
//! executor both report into, so both the remote and local execution
//! paths converge on one idempotent ingestion point. Implemented by
//! `cicd-engine::Engine`, injected into `cicd-fleet` and `cicd-executor`
//! by the composition root.

use crate::error::CoreError;
use crate::ids::JobId;
use crate::job::JobStatus;
use crate::ids::RunnerId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// A terminal (or progress) outcome reported for one job, regardless of
/// whether it ran on a remote runner or a local container.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub status: JobStatus,
    pub exit_code: Option<i32>,
    pub output: String,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub artifacts: Vec<String>,
    /// The runner that reported this outcome, `None` for local executions.
    pub reported_by: Option<RunnerId>,
}

#[async_trait]
pub trait JobResultSink: Send + Sync {
    /// Idempotent on `(job_id, terminal status)` — a second call with the
    /// same terminal outcome is a no-op.
    async fn handle_job_result(&self, job_id: &JobId, outcome: JobOutcome) -> Result<(), CoreError>;
}
