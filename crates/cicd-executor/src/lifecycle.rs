// SPDX-License-Identifier: MIT
// Copyright (c) 2026 CI/CD Execution Core Contributors

//! Job lifecycle: acquire a concurrency permit, build and run a container
//! for the job, monitor it to completion, translate its exit status, and
//! report the terminal outcome through the repository and the shared
//! job-result sink.

use crate::config::ExecutorConfig;
use crate::error::ExecutorError;
use crate::plan::{build_container_config, cache_dir, workspace_dir};
use async_trait::async_trait;
use cicd_core::{
    CancelToken, Clock, ContainerExecution, ContainerExecutionId, ContainerExecutionStatus,
    ContainerManager, ContainerStats, ContainerStatus, CoreError, Job, JobId, JobOutcome,
    JobResultSink, JobStatus, Repository, ResourceUsageSnapshot, ScheduleJob,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Semaphore};
use tracing::{info, warn};

const MONITOR_TICK: Duration = Duration::from_secs(5);
const STOP_GRACE: Duration = Duration::from_secs(10);

/// One in-flight execution: the public `ContainerExecution` record plus
/// the runtime container identity the `ContainerManager` assigned it.
#[derive(Clone)]
struct Tracked {
    execution: ContainerExecution,
    runtime_container_id: String,
}

enum MonitorOutcome {
    Success(i32),
    Failed(i32),
    Cancelled,
    Error(CoreError),
}

pub struct Executor<C: Clock> {
    config: ExecutorConfig,
    repository: Arc<dyn Repository>,
    container_manager: Arc<dyn ContainerManager>,
    sink: Arc<dyn JobResultSink>,
    semaphore: Arc<Semaphore>,
    executions: Mutex<HashMap<JobId, Tracked>>,
    cancellations: Mutex<HashMap<JobId, watch::Sender<bool>>>,
    clock: C,
}

impl<C: Clock> Executor<C> {
    pub fn new(
        config: ExecutorConfig,
        repository: Arc<dyn Repository>,
        container_manager: Arc<dyn ContainerManager>,
        sink: Arc<dyn JobResultSink>,
        clock: C,
    ) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent_jobs));
        Self {
            config,
            repository,
            container_manager,
            sink,
            semaphore,
            executions: Mutex::new(HashMap::new()),
            cancellations: Mutex::new(HashMap::new()),
            clock,
        }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub(crate) fn container_manager(&self) -> &Arc<dyn ContainerManager> {
        &self.container_manager
    }

    pub(crate) fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.utc_now()
    }

    /// Snapshot of in-flight executions for the stats/cleanup daemons.
    pub(crate) fn execution_snapshot(&self) -> Vec<(JobId, String, ContainerExecution)> {
        self.executions
            .lock()
            .iter()
            .map(|(id, t)| (id.clone(), t.runtime_container_id.clone(), t.execution.clone()))
            .collect()
    }

    /// Drops a finished execution's bookkeeping entry once it is at least
    /// `max_age` old.
    pub(crate) fn drop_if_old(&self, job_id: &JobId, now: chrono::DateTime<chrono::Utc>, max_age: Duration) -> bool {
        let mut executions = self.executions.lock();
        let old_enough = executions
            .get(job_id)
            .and_then(|t| t.execution.ended_at)
            .map(|ended| (now - ended).to_std().unwrap_or_default() >= max_age)
            .unwrap_or(false);
        if old_enough {
            executions.remove(job_id);
        }
        old_enough
    }

    /// Requests cancellation of a currently-running local job (the engine's
    /// counterpart to `RunnerDispatch::cancel_job` for remote ones).
    pub fn cancel_job(&self, job_id: &JobId) -> Result<(), ExecutorError> {
        match self.cancellations.lock().get(job_id) {
            Some(tx) => {
                let _ = tx.send(true);
                Ok(())
            }
            None => Err(ExecutorError::UnknownJob(job_id.clone())),
        }
    }

    /// Runs one job to a terminal state: acquire, build, start, monitor,
    /// translate exit status, report.
    pub async fn run_job(&self, schedule_job: ScheduleJob) -> Result<(), ExecutorError> {
        let job_id = schedule_job.job_id.clone();

        let (cancel_tx, mut cancel_rx) = watch::channel(false);
        self.cancellations.lock().insert(job_id.clone(), cancel_tx);
        let _guard = CancelGuard { executor: self, job_id: job_id.clone() };
        let cancel = CancelToken::new(cancel_rx.clone());

        // Step 1: acquire a concurrency slot, cancellable while waiting.
        let _permit = tokio::select! {
            permit = self.semaphore.clone().acquire_owned() => {
                permit.map_err(|_| ExecutorError::Core(CoreError::NotRunning))?
            }
            _ = cancel_rx.changed() => return Err(ExecutorError::Core(CoreError::Cancelled)),
        };

        let mut job = self
            .repository
            .get_job(&job_id, &cancel)
            .await?
            .ok_or_else(|| ExecutorError::UnknownJob(job_id.clone()))?;

        // Step 2: publish Running.
        let now = self.clock.utc_now();
        job.start(None, now).map_err(CoreError::Validation)?;
        self.repository.update_job(job.clone(), &cancel).await?;

        let mut execution = ContainerExecution::new(job_id.clone(), ContainerExecutionId::generate());

        // Step 3: create, then start.
        let config = build_container_config(&job, &self.config);
        let created = match self.container_manager.create_container(config).await {
            Ok(c) => c,
            Err(err) => {
                self.finish_unstarted(&mut job, &cancel).await?;
                return Err(err.into());
            }
        };

        execution.status = ContainerExecutionStatus::Running;
        execution.started_at = Some(now);
        self.executions.lock().insert(
            job_id.clone(),
            Tracked { execution: execution.clone(), runtime_container_id: created.id.clone() },
        );

        if let Err(err) = self.container_manager.start(&created.id).await {
            let _ = self.container_manager.remove(&created.id, true).await;
            self.executions.lock().remove(&job_id);
            self.finish_unstarted(&mut job, &cancel).await?;
            return Err(err.into());
        }

        info!(job_id = %job_id, container_id = %created.id, "container started");

        // Step 4: monitor to a terminal container status.
        let outcome = self.monitor(&job_id, &created.id, &mut cancel_rx).await;

        let result = match outcome {
            MonitorOutcome::Success(code) => {
                self.finish(&mut job, &mut execution, JobStatus::Success, Some(code), &cancel).await
            }
            MonitorOutcome::Failed(code) => {
                self.finish(&mut job, &mut execution, JobStatus::Failed, Some(code), &cancel).await
            }
            MonitorOutcome::Cancelled => {
                let _ = self.container_manager.stop(&created.id, STOP_GRACE).await;
                self.finish(&mut job, &mut execution, JobStatus::Cancelled, None, &cancel).await
            }
            MonitorOutcome::Error(err) => {
                execution.error_message = Some(err.to_string());
                let _ = self.finish(&mut job, &mut execution, JobStatus::Failed, None, &cancel).await;
                Err(err)
            }
        };

        // Step 5: cleanup (container + workspace); the bookkeeping entry
        // itself is left for the auto-cleaner to garbage-collect.
        if self.config.enable_auto_cleanup {
            if let Err(err) = self.container_manager.remove(&created.id, false).await {
                warn!(job_id = %job_id, error = %err, "container removal after completion failed");
            }
            remove_workspace_dirs(&job).await;
        }

        result.map_err(ExecutorError::from)
    }

    async fn monitor(
        &self,
        job_id: &JobId,
        container_id: &str,
        cancel_rx: &mut watch::Receiver<bool>,
    ) -> MonitorOutcome {
        let mut ticker = tokio::time::interval(MONITOR_TICK);
        ticker.tick().await;
        loop {
            tokio::select! {
                changed = cancel_rx.changed() => {
                    if changed.is_ok() && *cancel_rx.borrow() {
                        return MonitorOutcome::Cancelled;
                    }
                }
                _ = ticker.tick() => {
                    match self.container_manager.stats(container_id).await {
                        Ok(stats) => self.record_stats(job_id, stats),
                        Err(err) => warn!(job_id = %job_id, error = %err, "stats sample failed, continuing"),
                    }
                    match self.container_manager.inspect(container_id).await {
                        Ok(container) if container.status == ContainerStatus::Exited => {
                            return match container.exit_code {
                                Some(0) => MonitorOutcome::Success(0),
                                Some(code) => MonitorOutcome::Failed(code),
                                None => MonitorOutcome::Failed(-1),
                            };
                        }
                        Ok(_) => {}
                        Err(err) => return MonitorOutcome::Error(err),
                    }
                }
            }
        }
    }

    fn record_stats(&self, job_id: &JobId, stats: ContainerStats) {
        if let Some(tracked) = self.executions.lock().get_mut(job_id) {
            tracked.execution.last_usage = Some(ResourceUsageSnapshot {
                cpu_percent: stats.cpu_percent,
                memory_bytes: stats.memory_bytes,
                disk_bytes: stats.disk_bytes,
            });
        }
    }

    async fn finish(
        &self,
        job: &mut Job,
        execution: &mut ContainerExecution,
        status: JobStatus,
        exit_code: Option<i32>,
        cancel: &CancelToken,
    ) -> Result<(), CoreError> {
        let now = self.clock.utc_now();
        job.finish(status, exit_code, now);
        execution.status = match status {
            JobStatus::Success => ContainerExecutionStatus::Success,
            JobStatus::Cancelled => ContainerExecutionStatus::Cancelled,
            _ => ContainerExecutionStatus::Failed,
        };
        execution.ended_at = Some(now);
        execution.exit_code = exit_code;
        if let Some(tracked) = self.executions.lock().get_mut(&job.id) {
            tracked.execution = execution.clone();
        }

        self.repository.update_job(job.clone(), cancel).await?;
        self.sink
            .handle_job_result(
                &job.id,
                JobOutcome {
                    status,
                    exit_code,
                    output: String::new(),
                    started_at: job.started_at,
                    finished_at: job.finished_at,
                    artifacts: job.artifact_paths.clone(),
                    reported_by: None,
                },
            )
            .await
    }

    /// The container never started; apply the same retry-then-fail policy
    /// dispatch failures use on the remote path.
    async fn finish_unstarted(&self, job: &mut Job, cancel: &CancelToken) -> Result<(), CoreError> {
        if job.can_retry() && job.retry().is_ok() {
            self.repository.update_job(job.clone(), cancel).await?;
            return Ok(());
        }
        let now = self.clock.utc_now();
        job.finish(JobStatus::Failed, None, now);
        self.repository.update_job(job.clone(), cancel).await?;
        self.sink
            .handle_job_result(
                &job.id,
                JobOutcome {
                    status: JobStatus::Failed,
                    exit_code: None,
                    output: String::new(),
                    started_at: job.started_at,
                    finished_at: job.finished_at,
                    artifacts: Vec::new(),
                    reported_by: None,
                },
            )
            .await
    }
}

struct CancelGuard<'a, C: Clock> {
    executor: &'a Executor<C>,
    job_id: JobId,
}

impl<'a, C: Clock> Drop for CancelGuard<'a, C> {
    fn drop(&mut self) {
        self.executor.cancellations.lock().remove(&self.job_id);
    }
}

/// Removes the host-side workspace and cache directories for `job`,
/// tolerating a directory that was never created.
async fn remove_workspace_dirs(job: &Job) {
    for dir in [workspace_dir(job), cache_dir(job)] {
        if let Err(err) = tokio::fs::remove_dir_all(&dir).await {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(dir = %dir, error = %err, "workspace cleanup failed");
            }
        }
    }
}

#[async_trait]
impl<C: Clock> cicd_scheduler::LocalExecutor for Executor<C> {
    async fn execute_job(&self, job: ScheduleJob) -> Result<(), CoreError> {
        self.run_job(job).await.map_err(CoreError::from)
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
