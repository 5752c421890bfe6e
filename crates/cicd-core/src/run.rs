// SPDX-License-Identifier: MIT
// Copyright (c) 2026 CI/CD Execution Core Contributors

//! `PipelineRun` — one attempt to execute a pipeline.

use crate::ids::{PipelineId, RunId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How a run was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    Manual,
    Push,
    PullRequest,
    Tag,
    Scheduled,
    Webhook,
}

/// Run-level status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Running,
    Success,
    Failed,
    Cancelled,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunStatus::Success | RunStatus::Failed | RunStatus::Cancelled
        )
    }
}

/// One attempt to execute a pipeline definition against a specific commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    pub id: RunId,
    pub pipeline_id: PipelineId,
    pub trigger: TriggerKind,
    pub commit: String,
    pub branch: Option<String>,
    pub variables: HashMap<String, String>,
    pub status: RunStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl PipelineRun {
    /// Creates a new run in `Pending`, not yet started.
    pub fn new(
        id: RunId,
        pipeline_id: PipelineId,
        trigger: TriggerKind,
        commit: impl Into<String>,
        branch: Option<String>,
        variables: HashMap<String, String>,
    ) -> Self {
        Self {
            id,
            pipeline_id,
            trigger,
            commit: commit.into(),
            branch,
            variables,
            status: RunStatus::Pending,
            started_at: None,
            finished_at: None,
        }
    }

    /// Transitions out of `Pending`, stamping `started_at` exactly once.
    pub fn start(&mut self, now: DateTime<Utc>) {
        if self.status == RunStatus::Pending {
            self.status = RunStatus::Running;
            self.started_at = Some(now);
        }
    }

    /// Moves the run to a terminal status, stamping `finished_at` exactly once.
    pub fn finish(&mut self, status: RunStatus, now: DateTime<Utc>) {
        debug_assert!(status.is_terminal());
        if self.finished_at.is_none() {
            self.status = status;
            self.finished_at = Some(now);
        }
    }

    /// `finished - started`, when both timestamps are set.
    pub fn duration(&self) -> Option<chrono::Duration> {
        match (self.started_at, self.finished_at) {
            (Some(s), Some(f)) => Some(f - s),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
