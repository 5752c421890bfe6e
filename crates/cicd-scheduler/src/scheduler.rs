// SPDX-License-Identifier: MIT
// Copyright (c) 2026 CI/CD Execution Core Contributors

//! `Scheduler` — ties queues, dependency gating, runner selection, and
//! the worker pool together: a small struct plus the queue/history/
//! metrics state behind locks, run as a set of background tasks by the
//! composition root.

use crate::config::SchedulerConfig;
use crate::dependency::{dependencies_satisfied, DEPENDENCY_BACKOFF};
use crate::dispatch::RunnerDispatch;
use crate::error::SchedulerError;
use crate::metrics::{MetricsSnapshot, SchedulerMetrics};
use crate::queues::{QueueDepthHistory, QueueDepthSample, QueueSet};
use crate::strategy::SchedulingStrategy;
use crate::worker::{LocalExecutor, Worker};
use cicd_core::{CancelToken, Clock, CoreError, JobStatus, Repository, RunnerId, ScheduleJob};
use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info, warn};

/// Shared scheduler state, constructed once and run as a set of
/// background tasks by the composition root (`cicd-server`).
pub struct Scheduler<C: Clock> {
    config: SchedulerConfig,
    strategy: RwLock<SchedulingStrategy>,
    running: AtomicBool,
    paused: AtomicBool,
    queues: Mutex<QueueSet>,
    /// Jobs whose dependencies were not yet satisfied, each due for a
    /// re-check at the stored instant (fixed 5 s back-off).
    backoff: Mutex<VecDeque<(Instant, ScheduleJob)>>,
    history: Mutex<QueueDepthHistory>,
    metrics: Mutex<SchedulerMetrics>,
    repository: Arc<dyn Repository>,
    worker_senders: Vec<mpsc::Sender<ScheduleJob>>,
    next_worker: AtomicUsize,
    /// Bounds the number of jobs a worker may have dispatched or be
    /// locally executing at once, shared across the whole worker pool.
    inflight: Arc<Semaphore>,
    clock: C,
}

impl<C: Clock> Scheduler<C> {
    /// Builds a scheduler and its worker pool. Each worker holds a
    /// single-slot inbound channel and shares an `inflight` permit pool
    /// sized to `max_concurrent_jobs`; callers must separately
    /// `tokio::spawn` each returned `Worker::run` future alongside the
    /// scheduler's own background loops.
    pub fn new(
        config: SchedulerConfig,
        repository: Arc<dyn Repository>,
        dispatch: Arc<dyn RunnerDispatch>,
        local_executor: Arc<dyn LocalExecutor>,
        clock: C,
    ) -> (Arc<Self>, Vec<(Worker<C>, mpsc::Receiver<ScheduleJob>)>) {
        let mut worker_senders = Vec::with_capacity(config.worker_count);
        let mut workers = Vec::with_capacity(config.worker_count);
        let inflight = Arc::new(Semaphore::new(config.max_concurrent_jobs.max(1)));

        for id in 0..config.worker_count {
            let (tx, rx) = mpsc::channel(1);
            worker_senders.push(tx);
            workers.push((
                Worker {
                    id,
                    repository: repository.clone(),
                    dispatch: dispatch.clone(),
                    local_executor: local_executor.clone(),
                    inflight: inflight.clone(),
                    clock: clock.clone(),
                },
                rx,
            ));
        }

        let scheduler = Arc::new(Self {
            queues: Mutex::new(QueueSet::new(config.queue_size)),
            backoff: Mutex::new(VecDeque::new()),
            history: Mutex::new(QueueDepthHistory::new(config.max_history_size)),
            metrics: Mutex::new(SchedulerMetrics::new()),
            strategy: RwLock::new(config.default_strategy),
            running: AtomicBool::new(true),
            paused: AtomicBool::new(false),
            worker_senders,
            next_worker: AtomicUsize::new(0),
            inflight,
            config,
            repository,
            clock,
        });

        (scheduler, workers)
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn set_scheduling_strategy(&self, strategy: SchedulingStrategy) -> Result<(), SchedulerError> {
        if !strategy.is_implemented() {
            return Err(SchedulerError::UnsupportedStrategy(strategy));
        }
        *self.strategy.write() = strategy;
        Ok(())
    }

    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.lock().snapshot(self.clock.now())
    }

    pub fn submit_job(&self, mut job: ScheduleJob) -> Result<(), SchedulerError> {
        if !self.is_running() {
            return Err(CoreError::NotRunning.into());
        }
        let strategy = *self.strategy.read();
        if !strategy.is_implemented() {
            return Err(SchedulerError::UnsupportedStrategy(strategy));
        }

        let mut queues = self.queues.lock();
        match strategy {
            SchedulingStrategy::Fifo => queues.push_ready(job)?,
            SchedulingStrategy::Priority if self.config.enable_priority => queues.push_priority(job)?,
            SchedulingStrategy::Priority => queues.push_ready(job)?,
            SchedulingStrategy::LoadBalance if self.config.enable_priority && self.config.enable_load_balance => {
                job.priority = queues.least_loaded_priority();
                queues.push_priority(job)?;
            }
            SchedulingStrategy::LoadBalance if self.config.enable_priority => queues.push_priority(job)?,
            SchedulingStrategy::LoadBalance => queues.push_ready(job)?,
            SchedulingStrategy::ShortestJob | SchedulingStrategy::Deadline => unreachable!(
                "is_implemented() already rejected {strategy:?}"
            ),
        }
        Ok(())
    }

    pub fn submit_jobs(&self, jobs: Vec<ScheduleJob>) -> Result<(), SchedulerError> {
        for job in jobs {
            self.submit_job(job)?;
        }
        Ok(())
    }

    pub async fn cancel_job(
        &self,
        job_id: &cicd_core::JobId,
        dispatch: &Arc<dyn RunnerDispatch>,
        cancel: &CancelToken,
    ) -> Result<(), SchedulerError> {
        let mut job = match self.repository.get_job(job_id, cancel).await? {
            Some(job) => job,
            None => return Ok(()),
        };

        if let Some(runner_id) = job.assigned_runner.clone() {
            // Best-effort: a failed cancel request does not block the
            // status commit below.
            let _ = dispatch.cancel_job(&runner_id, job_id).await;
        }

        job.finish(JobStatus::Cancelled, None, self.clock.utc_now());
        self.repository.update_job(job, cancel).await?;
        Ok(())
    }

    /// One tick of the main loop: pops at most one job from the
    /// highest-occupied priority bucket, dependency-gates it, then
    /// dispatches as many ready jobs to idle workers as it can. Re-checking
    /// back-off entries is the dependency resolver's job, run as its own
    /// background task.
    pub async fn tick(&self, cancel: &CancelToken) -> Result<(), SchedulerError> {
        if self.paused.load(Ordering::Acquire) {
            return Ok(());
        }

        let popped = self.queues.lock().pop_highest_priority();
        if let Some(job) = popped {
            self.gate_or_requeue(job, cancel).await?;
        }

        self.dispatch_ready_jobs().await;
        Ok(())
    }

    /// One tick of the dependency resolver: re-checks every job whose
    /// back-off timer has elapsed and either moves it to the ready queue
    /// or re-schedules another back-off.
    pub async fn dependency_resolver_tick(&self, cancel: &CancelToken) -> Result<(), SchedulerError> {
        if self.paused.load(Ordering::Acquire) {
            return Ok(());
        }
        for job in self.due_backoff_jobs() {
            self.gate_or_requeue(job, cancel).await?;
        }
        Ok(())
    }

    /// Reports scheduler health: running/paused state and the number of
    /// runners currently available for dispatch.
    pub async fn health_check(&self, cancel: &CancelToken) -> Result<usize, SchedulerError> {
        let available = self.repository.available_runners_by_labels(&[], cancel).await?;
        Ok(available.len())
    }

    /// Pops every back-off entry whose timer has elapsed.
    fn due_backoff_jobs(&self) -> Vec<ScheduleJob> {
        let now = self.clock.now();
        let mut backoff = self.backoff.lock();
        let mut due = Vec::new();
        let remaining: VecDeque<_> = backoff
            .drain(..)
            .filter_map(|(at, job)| {
                if at <= now {
                    due.push(job);
                    None
                } else {
                    Some((at, job))
                }
            })
            .collect();
        *backoff = remaining;
        due
    }

    async fn gate_or_requeue(&self, job: ScheduleJob, cancel: &CancelToken) -> Result<(), SchedulerError> {
        let gated = !self.config.enable_dependency
            || job.dependencies.is_empty()
            || dependencies_satisfied(&self.repository, &job, cancel).await?;

        if gated {
            if let Err(CoreError::QueueFull) = self.queues.lock().push_ready(job) {
                warn!("ready queue full, job dropped back to discovery path");
            }
        } else {
            debug!(job_id = %job.job_id, "dependency not satisfied, re-queueing after back-off");
            self.backoff
                .lock()
                .push_back((self.clock.now() + DEPENDENCY_BACKOFF, job));
        }
        Ok(())
    }

    async fn dispatch_ready_jobs(&self) {
        loop {
            if self.queues.lock().ready_is_empty() {
                return;
            }

            let worker_count = self.worker_senders.len();
            let mut reserved = None;
            for _ in 0..worker_count {
                let idx = self.next_worker.fetch_add(1, Ordering::Relaxed) % worker_count;
                if let Ok(permit) = self.worker_senders[idx].try_reserve() {
                    reserved = Some(permit);
                    break;
                }
            }

            match reserved {
                Some(permit) => {
                    let job = self.queues.lock().pop_ready();
                    match job {
                        Some(job) => permit.send(job),
                        None => return,
                    }
                }
                None => return,
            }
        }
    }

    /// Scans the repository for jobs stuck in `Pending` that were never
    /// locally queued (crash recovery / cross-replica submission).
    pub async fn discovery_tick(&self, labels: &[String], cancel: &CancelToken) -> Result<usize, SchedulerError> {
        let pending = self.repository.pending_jobs_by_labels(labels, cancel).await?;
        let mut rediscovered = 0;
        for job in pending {
            let schedule_job = ScheduleJob {
                job_id: job.id,
                run_id: job.run_id,
                name: job.name,
                kind: job.kind,
                priority: job.priority,
                required_labels: job.required_labels,
                created_at: job.started_at.unwrap_or_else(|| self.clock.utc_now()),
                config: job.config,
                dependencies: job.dependencies,
                retry_count: job.retry_count,
                max_retries: job.max_retries,
                estimated_duration: None,
                resources: job.resources,
            };
            if self.submit_job(schedule_job).is_ok() {
                rediscovered += 1;
            }
        }
        Ok(rediscovered)
    }

    pub fn record_queue_depth_sample(&self) {
        let queues = self.queues.lock();
        self.history.lock().record(QueueDepthSample {
            total_depth: queues.total_depth(),
            ready_depth: queues.ready_depth(),
        });
    }

    pub fn record_completion(&self, runner_id: Option<RunnerId>, succeeded: bool, duration: std::time::Duration) {
        let mut metrics = self.metrics.lock();
        metrics.record_completion(succeeded, duration, self.clock.now());
        if let Some(runner_id) = runner_id {
            metrics.record_dispatch(runner_id);
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }
}

/// Runs the scheduler's main loop until `cancel` fires, ticking every
/// `PollInterval`.
pub async fn run_main_loop<C: Clock>(scheduler: Arc<Scheduler<C>>, cancel: CancelToken) {
    let mut interval = tokio::time::interval(scheduler.config.poll_interval);
    loop {
        interval.tick().await;
        if cancel.is_cancelled() || !scheduler.is_running() {
            return;
        }
        if let Err(err) = scheduler.tick(&cancel).await {
            warn!(error = %err, "scheduler tick failed");
        }
    }
}

/// Runs the discovery loop: periodically re-submits `Pending` jobs the
/// in-memory queues never saw (crash/cross-replica recovery).
pub async fn run_discovery_loop<C: Clock>(
    scheduler: Arc<Scheduler<C>>,
    labels: Vec<String>,
    cancel: CancelToken,
) {
    let mut interval = tokio::time::interval(scheduler.config.poll_interval);
    loop {
        interval.tick().await;
        if cancel.is_cancelled() || !scheduler.is_running() {
            return;
        }
        match scheduler.discovery_tick(&labels, &cancel).await {
            Ok(n) if n > 0 => info!(count = n, "discovery loop re-submitted pending jobs"),
            Ok(_) => {}
            Err(err) => warn!(error = %err, "discovery loop failed"),
        }
    }
}

/// Runs the queue-depth sampler at `QueueDepthInterval`.
pub async fn run_queue_depth_sampler<C: Clock>(scheduler: Arc<Scheduler<C>>, cancel: CancelToken) {
    let mut interval = tokio::time::interval(scheduler.config.queue_depth_interval);
    loop {
        interval.tick().await;
        if cancel.is_cancelled() {
            return;
        }
        scheduler.record_queue_depth_sample();
    }
}

/// Runs the dependency resolver at a fixed `DEPENDENCY_BACKOFF` cadence,
/// independent of the main loop's `PollInterval`.
pub async fn run_dependency_resolver_loop<C: Clock>(scheduler: Arc<Scheduler<C>>, cancel: CancelToken) {
    let mut interval = tokio::time::interval(DEPENDENCY_BACKOFF);
    loop {
        interval.tick().await;
        if cancel.is_cancelled() || !scheduler.is_running() {
            return;
        }
        if let Err(err) = scheduler.dependency_resolver_tick(&cancel).await {
            warn!(error = %err, "dependency resolver tick failed");
        }
    }
}

/// Runs the metrics loop at `MetricsInterval`, logging a snapshot.
/// Subsumes what would otherwise be a separate statistics loop: the
/// scheduler keeps a single `SchedulerMetrics` accumulator, so there is
/// only one set of numbers to sample.
pub async fn run_metrics_loop<C: Clock>(scheduler: Arc<Scheduler<C>>, cancel: CancelToken) {
    let mut interval = tokio::time::interval(scheduler.config.metrics_interval);
    loop {
        interval.tick().await;
        if cancel.is_cancelled() {
            return;
        }
        let snapshot = scheduler.metrics_snapshot();
        info!(
            jobs_completed = snapshot.jobs_completed,
            jobs_per_second = snapshot.jobs_per_second,
            success_rate = snapshot.success_rate,
            average_duration_ms = snapshot.average_duration.as_millis() as u64,
            "scheduler metrics"
        );
    }
}

/// Runs the scheduler-side health check at `HealthCheckInterval`, logging
/// the number of runners currently available for dispatch.
pub async fn run_health_check_loop<C: Clock>(scheduler: Arc<Scheduler<C>>, cancel: CancelToken) {
    let mut interval = tokio::time::interval(scheduler.config.health_check_interval);
    loop {
        interval.tick().await;
        if cancel.is_cancelled() {
            return;
        }
        match scheduler.health_check(&cancel).await {
            Ok(available) => debug!(available_runners = available, "scheduler health check"),
            Err(err) => warn!(error = %err, "scheduler health check failed"),
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
