// SPDX-License-Identifier: MIT
// Copyright (c) 2026 CI/CD Execution Core Contributors

//! Background auto-cleaner daemon: on `CleanupInterval`, removes
//! containers for executions that ended over an hour ago and prunes
//! unused images/networks/volumes.

use crate::lifecycle::Executor;
use cicd_core::{CancelToken, Clock};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

const GC_AGE: Duration = Duration::from_secs(60 * 60);

pub async fn run_auto_cleaner<C: Clock>(executor: Arc<Executor<C>>, cancel: CancelToken) {
    if !executor.config().enable_auto_cleanup {
        return;
    }
    let mut ticker = tokio::time::interval(executor.config().cleanup_interval);
    loop {
        ticker.tick().await;
        if cancel.is_cancelled() {
            return;
        }
        let now = executor.now();
        for (job_id, runtime_container_id, _) in executor.execution_snapshot() {
            if !executor.drop_if_old(&job_id, now, GC_AGE) {
                continue;
            }
            if let Err(err) = executor.container_manager().remove(&runtime_container_id, true).await {
                warn!(job_id = %job_id, error = %err, "auto-cleaner failed to remove container");
            }
        }
        if let Err(err) = executor.container_manager().system_prune().await {
            warn!(error = %err, "auto-cleaner system prune failed");
        }
    }
}
