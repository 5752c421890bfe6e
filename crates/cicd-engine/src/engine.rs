// SPDX-License-Identifier: MIT
// Copyright (c) 2026 CI/CD Execution Core Contributors

//! `Engine` — the Pipeline Engine: expands a pipeline
//! definition into a job DAG, drives each run to a terminal status in
//! the background, and is the single idempotent ingestion point for
//! job results from both the fleet and the local executor.

use crate::dag::expand_pipeline;
use crate::driver::run_driver;
use crate::error::EngineError;
use async_trait::async_trait;
use cicd_core::{
    CancelToken, Clock, CoreError, JobId, JobOutcome, JobResultSink, LogKind, PipelineDefinition,
    PipelineRun, Repository, RunId, Storage,
};
use cicd_executor::Executor;
use cicd_scheduler::{RunnerDispatch, Scheduler};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Weak};
use tokio::sync::{watch, Notify};
use tracing::warn;

/// Per-run bookkeeping the driver and `HandleJobResult` both touch.
pub(crate) struct RunHandle {
    pub(crate) notify: Arc<Notify>,
    pub(crate) cancel_tx: watch::Sender<bool>,
    /// Jobs already handed to the scheduler, so the driver does not
    /// resubmit a job still sitting `Pending` in a queue.
    pub(crate) submitted: Mutex<HashSet<JobId>>,
}

pub struct Engine<C: Clock> {
    pub(crate) repository: Arc<dyn Repository>,
    pub(crate) storage: Arc<dyn Storage>,
    pub(crate) scheduler: Arc<Scheduler<C>>,
    pub(crate) dispatch: Arc<dyn RunnerDispatch>,
    pub(crate) executor: Arc<Executor<C>>,
    pub(crate) clock: C,
    pub(crate) shutdown_cancel: CancelToken,
    pub(crate) runs: Mutex<HashMap<RunId, Arc<RunHandle>>>,
}

impl<C: Clock> Engine<C> {
    pub fn new(
        repository: Arc<dyn Repository>,
        storage: Arc<dyn Storage>,
        scheduler: Arc<Scheduler<C>>,
        dispatch: Arc<dyn RunnerDispatch>,
        executor: Arc<Executor<C>>,
        clock: C,
        shutdown_cancel: CancelToken,
    ) -> Self {
        Self {
            repository,
            storage,
            scheduler,
            dispatch,
            executor,
            clock,
            shutdown_cancel,
            runs: Mutex::new(HashMap::new()),
        }
    }

    /// Starts a run: transitions it to `Running`, expands and persists
    /// its job DAG, and launches a background driver task. Returns once
    /// the driver has been launched, without waiting for the run to
    /// finish.
    pub async fn execute_pipeline(
        self: &Arc<Self>,
        mut run: PipelineRun,
        definition: PipelineDefinition,
    ) -> Result<RunId, EngineError> {
        let now = self.clock.utc_now();
        run.start(now);
        let run_id = run.id.clone();

        let jobs = expand_pipeline(&run_id, &definition)?;

        self.repository.create_pipeline_run(run, &self.shutdown_cancel).await?;
        for job in jobs {
            self.repository.create_job(job, &self.shutdown_cancel).await?;
        }

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let handle = Arc::new(RunHandle {
            notify: Arc::new(Notify::new()),
            cancel_tx,
            submitted: Mutex::new(HashSet::new()),
        });
        self.runs.lock().insert(run_id.clone(), handle.clone());

        let engine = self.clone();
        let driver_run_id = run_id.clone();
        tokio::spawn(async move {
            if let Err(err) = run_driver(engine.clone(), driver_run_id.clone(), handle, cancel_rx).await {
                warn!(run_id = %driver_run_id, error = %err, "pipeline driver exited with an error");
            }
            engine.runs.lock().remove(&driver_run_id);
        });

        Ok(run_id)
    }

    /// Signals the run's driver to cancel. All non-terminal jobs
    /// transition to `Cancelled`; in-flight containers and remote
    /// dispatches are stopped best-effort.
    pub async fn cancel_pipeline(&self, run_id: &RunId) -> Result<(), EngineError> {
        let handle = self.runs.lock().get(run_id).cloned();
        let Some(handle) = handle else {
            return Err(EngineError::UnknownRun(run_id.clone()));
        };
        let _ = handle.cancel_tx.send(true);
        handle.notify.notify_one();
        Ok(())
    }

    pub(crate) async fn cancel_job_wherever_it_runs(&self, job: &cicd_core::Job) {
        match job.assigned_runner.clone() {
            Some(runner_id) => {
                if let Err(err) = self.dispatch.cancel_job(&runner_id, &job.id).await {
                    warn!(job_id = %job.id, runner_id = %runner_id, error = %err, "failed to send remote job cancellation");
                }
            }
            None => {
                if let Err(err) = self.executor.cancel_job(&job.id) {
                    if !err.is_cancellation() {
                        warn!(job_id = %job.id, error = %err, "failed to cancel local job execution");
                    }
                }
            }
        }
    }
}

#[async_trait]
impl<C: Clock> JobResultSink for Engine<C> {
    async fn handle_job_result(&self, job_id: &JobId, outcome: JobOutcome) -> Result<(), CoreError> {
        let cancel = CancelToken::never();
        let mut job = match self.repository.get_job(job_id, &cancel).await? {
            Some(job) => job,
            None => return Ok(()),
        };

        // Idempotent ingestion: a result for a job already in a terminal
        // status is a no-op.
        if job.status.is_terminal() {
            return Ok(());
        }

        let now = self.clock.utc_now();
        let run_id = job.run_id.clone();
        job.finish(outcome.status, outcome.exit_code, now);
        job.artifact_paths = outcome.artifacts;
        self.repository.update_job(job, &cancel).await?;

        if !outcome.output.is_empty() {
            if let Err(err) = self.storage.write_log(job_id, LogKind::Combined, outcome.output.as_bytes()).await {
                warn!(job_id = %job_id, error = %err, "failed to persist job output");
            }
        }

        if let Some(handle) = self.runs.lock().get(&run_id) {
            handle.notify.notify_one();
        }
        Ok(())
    }
}

/// Forwards to an `Engine` held only weakly, so the fleet and the local
/// executor can report into the engine without it holding a strong
/// reference back to either of them. The composition root builds the
/// engine with `Arc::new_cyclic`, handing this adapter to the executor
/// and the fleet before the engine itself exists.
pub struct EngineSink<C: Clock>(pub Weak<Engine<C>>);

#[async_trait]
impl<C: Clock> JobResultSink for EngineSink<C> {
    async fn handle_job_result(&self, job_id: &JobId, outcome: JobOutcome) -> Result<(), CoreError> {
        match self.0.upgrade() {
            Some(engine) => engine.handle_job_result(job_id, outcome).await,
            None => Ok(()),
        }
    }
}
