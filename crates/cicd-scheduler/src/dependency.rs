// SPDX-License-Identifier: MIT
// Copyright (c) 2026 CI/CD Execution Core Contributors

//! Dependency gating: a job popped from a priority queue only moves to
//! the ready queue once every dependency has succeeded in the repository.

use cicd_core::{CancelToken, JobStatus, Repository, ScheduleJob};
use std::sync::Arc;

/// Five-second re-queue back-off for a job whose dependencies are not
/// all satisfied yet.
pub const DEPENDENCY_BACKOFF: std::time::Duration = std::time::Duration::from_secs(5);

/// Whether every dependency of `job` is `Success` in the repository.
///
/// A dependency that no longer exists (should not happen under normal
/// operation) is treated as unsatisfied rather than panicking — the job
/// simply keeps re-queuing until the discovery loop or an operator
/// intervenes.
pub async fn dependencies_satisfied(
    repo: &Arc<dyn Repository>,
    job: &ScheduleJob,
    cancel: &CancelToken,
) -> Result<bool, cicd_core::CoreError> {
    for dep_id in &job.dependencies {
        match repo.get_job(dep_id, cancel).await? {
            Some(dep) if dep.status == JobStatus::Success => continue,
            _ => return Ok(false),
        }
    }
    Ok(true)
}

/// Whether any dependency has failed terminally without hope of retry,
/// i.e. the job can never become ready and should be marked `Skipped`
/// by the engine rather than re-queued forever.
pub async fn dependencies_permanently_blocked(
    repo: &Arc<dyn Repository>,
    job: &ScheduleJob,
    cancel: &CancelToken,
) -> Result<bool, cicd_core::CoreError> {
    for dep_id in &job.dependencies {
        match repo.get_job(dep_id, cancel).await? {
            Some(dep) if matches!(dep.status, JobStatus::Cancelled | JobStatus::Skipped) => {
                return Ok(true);
            }
            // Failed with no retries left can never reach Success; failed
            // with retries remaining may still be re-queued by the engine.
            Some(dep) if dep.status == JobStatus::Failed && !dep.can_retry() => return Ok(true),
            None => return Ok(true),
            _ => continue,
        }
    }
    Ok(false)
}

#[cfg(test)]
#[path = "dependency_tests.rs"]
mod tests;
