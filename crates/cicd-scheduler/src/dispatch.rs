// SPDX-License-Identifier: MIT
// Copyright (c) 2026 CI/CD Execution Core Contributors

//! `RunnerDispatch` — the narrow interface the scheduler needs from the
//! fleet (`SendJob` + `OnlineRunners`), breaking the Scheduler/RunnerFleet
//! cyclic dependency: the fleet implements this trait and is injected
//! into the scheduler by the composition root (`cicd-server`), rather
//! than the scheduler depending on the fleet crate directly.

use async_trait::async_trait;
use cicd_core::{CoreError, JobMessage, RunnerId};

#[async_trait]
pub trait RunnerDispatch: Send + Sync {
    /// Non-blocking enqueue onto the runner's session send queue.
    /// Fails `NotConnected` or `QueueFull`.
    async fn send_job(&self, runner_id: &RunnerId, msg: JobMessage) -> Result<(), CoreError>;

    /// Enqueues a `job_cancel` for an in-flight job.
    async fn cancel_job(&self, runner_id: &RunnerId, job_id: &cicd_core::JobId) -> Result<(), CoreError>;

    /// Identities of runners with a live session.
    async fn online_runners(&self) -> Vec<RunnerId>;
}
