// SPDX-License-Identifier: MIT
// Copyright (c) 2026 CI/CD Execution Core Contributors

//! `ScheduleJob` — the scheduler's in-memory projection of a [`crate::job::Job`].

use crate::ids::{JobId, RunId};
use crate::job::{JobConfig, JobType, ResourceRequest};
use chrono::{DateTime, Utc};

/// The scheduler's view of a job: enough to queue, gate on dependencies,
/// and dispatch, without carrying the full step/log bookkeeping the
/// repository owns.
#[derive(Debug, Clone)]
pub struct ScheduleJob {
    pub job_id: JobId,
    pub run_id: RunId,
    pub name: String,
    pub kind: JobType,
    pub priority: u8,
    pub required_labels: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub config: JobConfig,
    pub dependencies: Vec<JobId>,
    pub retry_count: u32,
    pub max_retries: u32,
    pub estimated_duration: Option<std::time::Duration>,
    pub resources: ResourceRequest,
}

#[cfg(test)]
#[path = "schedule_job_tests.rs"]
mod tests;
