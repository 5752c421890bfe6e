// SPDX-License-Identifier: MIT
// Copyright (c) 2026 CI/CD Execution Core Contributors

//! Background stats-collector daemon: on a fixed cadence, samples every
//! running container and publishes a snapshot to a bounded,
//! best-effort channel. Distinct from the lifecycle monitor's own 5 s
//! per-execution sampling, which feeds `ContainerExecution.last_usage`
//! directly rather than a channel external consumers can drain.

use crate::lifecycle::Executor;
use cicd_core::{CancelToken, Clock, ContainerStats, JobId};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

pub async fn run_stats_collector<C: Clock>(
    executor: Arc<Executor<C>>,
    tx: mpsc::Sender<(JobId, ContainerStats)>,
    cancel: CancelToken,
) {
    let mut ticker = tokio::time::interval(executor.config().stats_interval);
    loop {
        ticker.tick().await;
        if cancel.is_cancelled() {
            return;
        }
        for (job_id, runtime_container_id, _) in executor.execution_snapshot() {
            match executor.container_manager().stats(&runtime_container_id).await {
                Ok(stats) => {
                    if tx.try_send((job_id.clone(), stats)).is_err() {
                        debug!(job_id = %job_id, "stats channel full, dropping sample");
                    }
                }
                Err(err) => debug!(job_id = %job_id, error = %err, "stats collector sample failed"),
            }
        }
    }
}
