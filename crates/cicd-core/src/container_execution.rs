// SPDX-License-Identifier: MIT
// Copyright (c) 2026 CI/CD Execution Core Contributors

//! `ContainerExecution` — a local execution context.

use crate::ids::{ContainerExecutionId, JobId};
use chrono::{DateTime, Utc};

/// Status of a container-backed job execution, as tracked by the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerExecutionStatus {
    Pending,
    Running,
    Success,
    Failed,
    Cancelled,
}

/// A point-in-time snapshot of container resource usage.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceUsageSnapshot {
    pub cpu_percent: f64,
    pub memory_bytes: u64,
    pub disk_bytes: u64,
}

/// A local execution context: one job running inside one container.
#[derive(Debug, Clone)]
pub struct ContainerExecution {
    pub job_id: JobId,
    pub container_id: ContainerExecutionId,
    pub status: ContainerExecutionStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub last_usage: Option<ResourceUsageSnapshot>,
    pub exit_code: Option<i32>,
    pub error_message: Option<String>,
}

impl ContainerExecution {
    pub fn new(job_id: JobId, container_id: ContainerExecutionId) -> Self {
        Self {
            job_id,
            container_id,
            status: ContainerExecutionStatus::Pending,
            started_at: None,
            ended_at: None,
            last_usage: None,
            exit_code: None,
            error_message: None,
        }
    }
}
