// SPDX-License-Identifier: MIT
// Copyright (c) 2026 CI/CD Execution Core Contributors

//! `Job` — one unit of work inside a run.

use crate::ids::{JobId, RunId, RunnerId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What kind of work a job performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    Build,
    Test,
    Deploy,
    Script,
    Cleanup,
}

/// Job-level status. Transitions are one-way except the implicit
/// `Pending -> Running` re-entry on retry, which the engine models as a
/// fresh transition rather than resurrecting a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Success,
    Failed,
    Cancelled,
    Skipped,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Success | JobStatus::Failed | JobStatus::Cancelled | JobStatus::Skipped
        )
    }
}

/// Whether a step should run, given the outcome of prior steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WhenPolicy {
    OnSuccess,
    Always,
    OnFailure,
}

impl Default for WhenPolicy {
    fn default() -> Self {
        WhenPolicy::OnSuccess
    }
}

/// One shell-level command within a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStep {
    pub name: String,
    pub commands: Vec<String>,
    pub working_dir: Option<String>,
    pub env: HashMap<String, String>,
    pub timeout: std::time::Duration,
    pub allow_failure: bool,
    pub when: WhenPolicy,
}

/// Resource requests a job declares for its container.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ResourceRequest {
    pub cpu_cores: f64,
    pub memory_bytes: u64,
    pub disk_bytes: u64,
}

impl Default for ResourceRequest {
    fn default() -> Self {
        Self {
            cpu_cores: 1.0,
            memory_bytes: 512 * 1024 * 1024,
            disk_bytes: 1024 * 1024 * 1024,
        }
    }
}

/// One unit of work inside a [`crate::run::PipelineRun`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub run_id: RunId,
    pub name: String,
    pub kind: JobType,
    pub status: JobStatus,
    /// Dispatch priority, 1..10. Higher is more urgent. Default 5.
    pub priority: u8,
    pub required_labels: Vec<String>,
    /// Other job identities within the same run.
    pub dependencies: Vec<JobId>,
    pub retry_count: u32,
    pub max_retries: u32,
    pub resources: ResourceRequest,
    pub steps: Vec<JobStep>,
    pub assigned_runner: Option<RunnerId>,
    pub exit_code: Option<i32>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub log_path: Option<String>,
    pub artifact_paths: Vec<String>,
    /// Free-form container/image configuration, forwarded to the executor.
    pub config: JobConfig,
}

/// Per-job container configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobConfig {
    pub image: Option<String>,
    pub environment: HashMap<String, String>,
    pub volumes: Vec<(String, String)>,
    pub cpu_limit: Option<f64>,
    pub memory_limit: Option<u64>,
    pub read_only_rootfs: bool,
}

/// Default dispatch priority.
pub const DEFAULT_PRIORITY: u8 = 5;
/// Default per-job timeout: 30 minutes.
pub const DEFAULT_JOB_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30 * 60);

impl Job {
    /// Builds a new job in `Pending`, with default priority and no retries used.
    pub fn new(
        id: JobId,
        run_id: RunId,
        name: impl Into<String>,
        kind: JobType,
        dependencies: Vec<JobId>,
        steps: Vec<JobStep>,
    ) -> Self {
        Self {
            id,
            run_id,
            name: name.into(),
            kind,
            status: JobStatus::Pending,
            priority: DEFAULT_PRIORITY,
            required_labels: Vec::new(),
            dependencies,
            retry_count: 0,
            max_retries: 3,
            resources: ResourceRequest::default(),
            steps,
            assigned_runner: None,
            exit_code: None,
            started_at: None,
            finished_at: None,
            log_path: None,
            artifact_paths: Vec::new(),
            config: JobConfig::default(),
        }
    }

    /// Valid transition: a job may only enter `Running` from `Pending`.
    pub fn start(&mut self, runner: Option<RunnerId>, now: DateTime<Utc>) -> Result<(), String> {
        if self.status != JobStatus::Pending {
            return Err(format!(
                "cannot start job {} from status {:?}",
                self.id, self.status
            ));
        }
        self.status = JobStatus::Running;
        self.assigned_runner = runner;
        self.started_at = Some(now);
        Ok(())
    }

    /// Moves the job to a terminal status. Monotonic: a second call after
    /// already terminal is a no-op.
    pub fn finish(&mut self, status: JobStatus, exit_code: Option<i32>, now: DateTime<Utc>) {
        debug_assert!(status.is_terminal());
        if self.status.is_terminal() {
            return;
        }
        self.status = status;
        self.exit_code = exit_code;
        self.finished_at = Some(now);
    }

    /// Whether this job can still be retried.
    pub fn can_retry(&self) -> bool {
        self.retry_count < self.max_retries
    }

    /// Records a retry attempt and resets the job back to `Pending` for
    /// re-dispatch, enforcing `retry_count <= max_retries`.
    pub fn retry(&mut self) -> Result<(), String> {
        if !self.can_retry() {
            return Err(format!("job {} has exhausted its retries", self.id));
        }
        self.retry_count += 1;
        self.status = JobStatus::Pending;
        self.assigned_runner = None;
        self.exit_code = None;
        self.started_at = None;
        self.finished_at = None;
        Ok(())
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
