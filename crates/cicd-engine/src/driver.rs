// SPDX-License-Identifier: MIT
// Copyright (c) 2026 CI/CD Execution Core Contributors

//! Per-run DAG driver: scans the run's jobs, advances the ready set, and
//! terminates the run once every job has reached a terminal status. Uses
//! the same "scan persisted state, classify, act" reconciliation shape
//! `cicd-scheduler::dependency` uses for its own gating.

use crate::engine::{Engine, RunHandle};
use crate::error::EngineError;
use cicd_core::{CancelToken, Clock, Job, JobStatus, RunId, RunStatus, RunnerStatus, ScheduleJob};
use cicd_scheduler::dependency::dependencies_permanently_blocked;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

fn to_schedule_job(job: &Job, now: chrono::DateTime<chrono::Utc>) -> ScheduleJob {
    ScheduleJob {
        job_id: job.id.clone(),
        run_id: job.run_id.clone(),
        name: job.name.clone(),
        kind: job.kind,
        priority: job.priority,
        required_labels: job.required_labels.clone(),
        created_at: now,
        config: job.config.clone(),
        dependencies: job.dependencies.clone(),
        retry_count: job.retry_count,
        max_retries: job.max_retries,
        estimated_duration: None,
        resources: job.resources,
    }
}

/// Drives one run to completion. Runs as a detached background task,
/// spawned by [`Engine::execute_pipeline`].
pub async fn run_driver<C: Clock>(
    engine: Arc<Engine<C>>,
    run_id: RunId,
    handle: Arc<RunHandle>,
    mut cancel_rx: watch::Receiver<bool>,
) -> Result<(), EngineError> {
    let cancel = CancelToken::never();

    loop {
        if *cancel_rx.borrow() {
            return cancel_run(&engine, &run_id, &cancel).await;
        }

        let jobs = engine.repository.jobs_by_run(&run_id, &cancel).await?;
        if jobs.iter().all(|j| j.status.is_terminal()) {
            return finalize_run(&engine, &run_id, &jobs, &cancel).await;
        }

        reap_jobs_on_lost_runners(&engine, &jobs, &handle, &cancel).await?;
        let jobs = engine.repository.jobs_by_run(&run_id, &cancel).await?;

        let any_running = jobs.iter().any(|j| j.status == JobStatus::Running);
        let mut submitted_this_tick = false;

        for job in jobs.iter().filter(|j| j.status == JobStatus::Pending) {
            let now = engine.clock.utc_now();
            let schedule_job = to_schedule_job(job, now);

            if dependencies_permanently_blocked(&engine.repository, &schedule_job, &cancel).await? {
                let mut blocked = job.clone();
                blocked.finish(JobStatus::Skipped, None, now);
                engine.repository.update_job(blocked, &cancel).await?;
                debug!(job_id = %job.id, run_id = %run_id, "job skipped, a dependency can never succeed");
                continue;
            }

            let all_deps_done = job.dependencies.iter().all(|dep_id| {
                jobs.iter().any(|j| &j.id == dep_id && j.status == JobStatus::Success)
            });
            if !all_deps_done {
                continue;
            }

            if !handle.submitted.lock().insert(job.id.clone()) {
                continue;
            }

            match engine.scheduler.submit_job(schedule_job) {
                Ok(()) => submitted_this_tick = true,
                Err(err) => {
                    handle.submitted.lock().remove(&job.id);
                    return Err(err.into());
                }
            }
        }

        // No job in flight and nothing newly submitted: whatever is
        // still `Pending` can never become ready (its dependency chain
        // bottoms out in a non-success terminal status). Skip it so the
        // run can finalize instead of stalling forever.
        if !any_running && !submitted_this_tick {
            let now = engine.clock.utc_now();
            for job in jobs.iter().filter(|j| j.status == JobStatus::Pending) {
                let mut stuck = job.clone();
                stuck.finish(JobStatus::Skipped, None, now);
                engine.repository.update_job(stuck, &cancel).await?;
            }
            continue;
        }

        tokio::select! {
            _ = handle.notify.notified() => {}
            _ = cancel_rx.changed() => {}
        }
    }
}

async fn finalize_run<C: Clock>(
    engine: &Arc<Engine<C>>,
    run_id: &RunId,
    jobs: &[Job],
    cancel: &CancelToken,
) -> Result<(), EngineError> {
    let Some(mut run) = engine.repository.get_pipeline_run(run_id, cancel).await? else {
        return Err(EngineError::UnknownRun(run_id.clone()));
    };
    let now = engine.clock.utc_now();
    let status = if jobs.iter().all(|j| j.status == JobStatus::Success) {
        RunStatus::Success
    } else {
        RunStatus::Failed
    };
    run.finish(status, now);
    engine.repository.update_pipeline_run(run, cancel).await?;
    Ok(())
}

async fn cancel_run<C: Clock>(
    engine: &Arc<Engine<C>>,
    run_id: &RunId,
    cancel: &CancelToken,
) -> Result<(), EngineError> {
    let jobs = engine.repository.jobs_by_run(run_id, cancel).await?;
    let now = engine.clock.utc_now();
    for job in jobs {
        if job.status.is_terminal() {
            continue;
        }
        if job.status == JobStatus::Running {
            engine.cancel_job_wherever_it_runs(&job).await;
        }
        let mut job = job;
        job.finish(JobStatus::Cancelled, None, now);
        engine.repository.update_job(job, cancel).await?;
    }

    let Some(mut run) = engine.repository.get_pipeline_run(run_id, cancel).await? else {
        return Err(EngineError::UnknownRun(run_id.clone()));
    };
    run.finish(RunStatus::Cancelled, now);
    engine.repository.update_pipeline_run(run, cancel).await?;
    Ok(())
}

/// Reconciles `Running` jobs whose assigned runner has gone offline: the
/// job is failed with its retry counted, and re-queued (reset to
/// `Pending`) if retries remain, rather than left running against a
/// session that no longer exists.
async fn reap_jobs_on_lost_runners<C: Clock>(
    engine: &Arc<Engine<C>>,
    jobs: &[Job],
    handle: &RunHandle,
    cancel: &CancelToken,
) -> Result<(), EngineError> {
    for job in jobs.iter().filter(|j| j.status == JobStatus::Running) {
        let Some(runner_id) = job.assigned_runner.clone() else { continue };
        let runner = engine.repository.get_runner(&runner_id, cancel).await?;
        let lost = match runner {
            Some(runner) => runner.status == RunnerStatus::Offline,
            None => true,
        };
        if !lost {
            continue;
        }

        let mut job = job.clone();
        let now = engine.clock.utc_now();
        if job.can_retry() {
            if let Err(err) = job.retry() {
                warn!(job_id = %job.id, error = %err, "failed to retry job after runner loss");
                continue;
            }
            handle.submitted.lock().remove(&job.id);
            debug!(job_id = %job.id, runner_id = %runner_id, "re-queued after its runner disappeared");
        } else {
            job.finish(JobStatus::Failed, None, now);
            warn!(job_id = %job.id, runner_id = %runner_id, "job failed, its runner disappeared and retries are exhausted");
        }
        engine.repository.update_job(job, cancel).await?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "driver_tests.rs"]
mod tests;
