// SPDX-License-Identifier: MIT
// Copyright (c) 2026 CI/CD Execution Core Contributors

//! Worker pool: N workers, each with a single-slot inbound channel,
//! perform runner selection and dispatch for a popped `ScheduleJob`. A
//! struct holding shared collaborators behind `Arc`, built once by a
//! composition root and handed a channel to drain.

use crate::dispatch::RunnerDispatch;
use crate::runner_selection::select_runner;
use async_trait::async_trait;
use cicd_core::{
    CancelToken, Clock, CoreError, Job, JobMessage, JobStatus, Repository, RunnerId, ScheduleJob,
};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tracing::{info, warn};

/// The local-execution port a worker falls back to when no remote runner
/// is eligible. Implemented by `cicd-executor`, injected by the
/// composition root.
#[async_trait]
pub trait LocalExecutor: Send + Sync {
    async fn execute_job(&self, job: ScheduleJob) -> Result<(), CoreError>;
}

pub struct Worker<C: Clock> {
    pub id: usize,
    pub repository: Arc<dyn Repository>,
    pub dispatch: Arc<dyn RunnerDispatch>,
    pub local_executor: Arc<dyn LocalExecutor>,
    /// Shared with every other worker; bounds total concurrently
    /// in-flight jobs to `max_concurrent_jobs`.
    pub inflight: Arc<Semaphore>,
    pub clock: C,
}

impl<C: Clock> Worker<C> {
    /// Drains `inbox` until it closes or `cancel` fires.
    pub async fn run(self, mut inbox: mpsc::Receiver<ScheduleJob>, cancel: CancelToken) {
        loop {
            if cancel.is_cancelled() {
                return;
            }
            let schedule_job = match inbox.recv().await {
                Some(job) => job,
                None => return,
            };
            if let Err(err) = self.handle(schedule_job, &cancel).await {
                warn!(worker = self.id, error = %err, "worker failed to handle job");
            }
        }
    }

    async fn handle(&self, schedule_job: ScheduleJob, cancel: &CancelToken) -> Result<(), CoreError> {
        let _permit = self.inflight.clone().acquire_owned().await.map_err(|_| CoreError::Cancelled)?;

        let available = self
            .repository
            .available_runners_by_labels(&schedule_job.required_labels, cancel)
            .await?;

        match select_runner(&available) {
            Some(runner) => {
                let runner_id = runner.id.clone();
                self.dispatch_remote(schedule_job, runner_id, cancel).await
            }
            None => self.local_executor.execute_job(schedule_job).await,
        }
    }

    async fn dispatch_remote(
        &self,
        schedule_job: ScheduleJob,
        runner_id: RunnerId,
        cancel: &CancelToken,
    ) -> Result<(), CoreError> {
        let now = self.clock.utc_now();

        let mut job = self
            .repository
            .get_job(&schedule_job.job_id, cancel)
            .await?
            .ok_or_else(|| CoreError::Validation(format!("unknown job {}", schedule_job.job_id)))?;

        job.start(Some(runner_id.clone()), now)
            .map_err(CoreError::Validation)?;
        self.repository.update_job(job.clone(), cancel).await?;

        let msg = build_job_message(&job);
        match self.dispatch.send_job(&runner_id, msg).await {
            Ok(()) => Ok(()),
            Err(err) => {
                info!(
                    job_id = %job.id, runner = %runner_id, error = %err,
                    "dispatch failed, marking job failed"
                );
                job.finish(JobStatus::Failed, None, self.clock.utc_now());
                if job.can_retry() {
                    // `retry` only errs when retries are exhausted, which
                    // `can_retry` just ruled out.
                    let _ = job.retry();
                }
                self.repository.update_job(job, cancel).await?;
                Err(err)
            }
        }
    }
}

fn build_job_message(job: &Job) -> JobMessage {
    let mut env = job.config.environment.clone();
    env.insert("HOME".to_string(), "/workspace".to_string());
    env.insert("JOB_ID".to_string(), job.id.to_string());
    env.insert("JOB_NAME".to_string(), job.name.clone());
    env.insert("PIPELINE_RUN_ID".to_string(), job.run_id.to_string());

    let commands = job.steps.iter().flat_map(|step| step.commands.clone()).collect();
    let timeout_secs = job
        .steps
        .iter()
        .map(|s| s.timeout.as_secs())
        .max()
        .unwrap_or_else(|| cicd_core::DEFAULT_JOB_TIMEOUT.as_secs());

    JobMessage {
        job_id: job.id.clone(),
        commands,
        env,
        workspace: "/workspace".to_string(),
        timeout_secs,
        config: job.config.clone(),
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
