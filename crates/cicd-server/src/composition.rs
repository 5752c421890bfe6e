// SPDX-License-Identifier: MIT
// Copyright (c) 2026 CI/CD Execution Core Contributors

//! Composition root: wires a `Repository`, `Storage`, and
//! `ContainerManager` together with the `Engine`, `Scheduler`, `Fleet`,
//! and `Executor`, and starts every background loop except the fleet's
//! TCP accept loop (the caller supplies the bound listener separately,
//! see `main.rs`).
//!
//! The persistent store, artifact storage, and container daemon are
//! supplied by the caller rather than constructed here; the `cicdd`
//! binary backs all three with `cicd-testing`'s in-memory fakes, the
//! only implementations the workspace carries.

use crate::config::ServerConfig;
use async_trait::async_trait;
use cicd_core::{
    CancelToken, Clock, ContainerManager, CoreError, JobId, JobOutcome, JobResultSink, Repository,
    Storage,
};
use cicd_engine::Engine;
use cicd_executor::{run_auto_cleaner, run_stats_collector, Executor};
use cicd_fleet::{run_heartbeat_checker, Fleet};
use cicd_scheduler::{
    run_dependency_resolver_loop, run_discovery_loop, run_health_check_loop, run_main_loop,
    run_metrics_loop, run_queue_depth_sampler, RunnerDispatch, Scheduler,
};
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;
use tracing::debug;

/// Every long-lived collaborator, wired together and ready to serve.
pub struct System<C: Clock> {
    pub repository: Arc<dyn Repository>,
    pub storage: Arc<dyn Storage>,
    pub container_manager: Arc<dyn ContainerManager>,
    pub scheduler: Arc<Scheduler<C>>,
    pub fleet: Arc<Fleet<C>>,
    pub executor: Arc<Executor<C>>,
    pub engine: Arc<Engine<C>>,
}

/// Forwards into `System.engine`, held only weakly so neither the fleet
/// nor the executor keep the whole system alive through their sink
/// handle. Breaks the same construction cycle `cicd_engine::EngineSink`
/// breaks for `Engine`/`Executor` alone, one level up: here `Fleet` and
/// `Executor` both need a sink before `Engine` (and therefore `System`)
/// exists.
struct SystemSink<C: Clock>(Weak<System<C>>);

#[async_trait]
impl<C: Clock> JobResultSink for SystemSink<C> {
    async fn handle_job_result(&self, job_id: &JobId, outcome: JobOutcome) -> Result<(), CoreError> {
        match self.0.upgrade() {
            Some(system) => system.engine.handle_job_result(job_id, outcome).await,
            None => Ok(()),
        }
    }
}

/// Builds the full system and starts every background loop that does
/// not need the caller-supplied TCP listener: the scheduler's worker
/// pool, main loop, discovery loop, queue-depth sampler, dependency
/// resolver, metrics loop, and health check; the executor's stats
/// collector and auto-cleaner; the fleet's heartbeat checker. All run
/// until `shutdown` fires.
///
/// `repository`/`storage`/`container_manager` are supplied by the
/// caller rather than constructed here: they are the system's external
/// interfaces, and callers (the `cicdd` binary, integration tests) need
/// their own handle on the concrete implementation to seed state or
/// simulate container lifecycles.
pub fn build<C: Clock>(
    config: &ServerConfig,
    repository: Arc<dyn Repository>,
    storage: Arc<dyn Storage>,
    container_manager: Arc<dyn ContainerManager>,
    clock: C,
    shutdown: CancelToken,
) -> Arc<System<C>> {
    let system = Arc::new_cyclic(|weak: &Weak<System<C>>| {
        let sink_for_executor: Arc<dyn JobResultSink> = Arc::new(SystemSink(weak.clone()));
        let sink_for_fleet: Arc<dyn JobResultSink> = Arc::new(SystemSink(weak.clone()));

        let executor = Arc::new(Executor::new(
            config.executor.clone(),
            repository.clone(),
            container_manager.clone(),
            sink_for_executor,
            clock.clone(),
        ));

        let fleet = Fleet::new(config.fleet.clone(), repository.clone(), sink_for_fleet, clock.clone());

        let dispatch: Arc<dyn RunnerDispatch> = fleet.clone();
        let (scheduler, workers) = Scheduler::new(
            config.scheduler.clone(),
            repository.clone(),
            dispatch.clone(),
            executor.clone(),
            clock.clone(),
        );

        for (worker, inbox) in workers {
            tokio::spawn(worker.run(inbox, shutdown.clone()));
        }

        let engine = Arc::new(Engine::new(
            repository.clone(),
            storage.clone(),
            scheduler.clone(),
            dispatch,
            executor.clone(),
            clock,
            shutdown.clone(),
        ));

        System { repository: repository.clone(), storage: storage.clone(), container_manager, scheduler, fleet, executor, engine }
    });

    spawn_background_loops(&system, &config.discovery_labels, shutdown);
    system
}

fn spawn_background_loops<C: Clock>(system: &Arc<System<C>>, discovery_labels: &[String], shutdown: CancelToken) {
    tokio::spawn(run_main_loop(system.scheduler.clone(), shutdown.clone()));
    tokio::spawn(run_discovery_loop(system.scheduler.clone(), discovery_labels.to_vec(), shutdown.clone()));
    tokio::spawn(run_queue_depth_sampler(system.scheduler.clone(), shutdown.clone()));
    tokio::spawn(run_dependency_resolver_loop(system.scheduler.clone(), shutdown.clone()));
    tokio::spawn(run_metrics_loop(system.scheduler.clone(), shutdown.clone()));
    tokio::spawn(run_health_check_loop(system.scheduler.clone(), shutdown.clone()));
    tokio::spawn(run_auto_cleaner(system.executor.clone(), shutdown.clone()));
    tokio::spawn(run_heartbeat_checker(system.fleet.clone(), shutdown.clone()));

    let (stats_tx, mut stats_rx) = mpsc::channel(256);
    tokio::spawn(run_stats_collector(system.executor.clone(), stats_tx, shutdown));
    tokio::spawn(async move {
        while let Some((job_id, stats)) = stats_rx.recv().await {
            debug!(
                job_id = %job_id,
                cpu_percent = stats.cpu_percent,
                memory_bytes = stats.memory_bytes,
                "container stats sample"
            );
        }
    });
}

#[cfg(test)]
#[path = "composition_tests.rs"]
mod tests;
