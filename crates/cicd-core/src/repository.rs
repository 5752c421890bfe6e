// SPDX-License-Identifier: MIT
// Copyright (c) 2026 CI/CD Execution Core Contributors

//! The persistent-store interface. The relational database
//! behind it is out of scope; the core only ever talks to this trait.

use crate::error::CoreError;
use crate::ids::{JobId, PipelineId, RunId, RunnerId};
use crate::job::Job;
use crate::pipeline::Pipeline;
use crate::run::PipelineRun;
use crate::runner::Runner;
use async_trait::async_trait;

/// Cooperative cancellation signal threaded through every repository call.
#[derive(Clone)]
pub struct CancelToken(tokio::sync::watch::Receiver<bool>);

impl CancelToken {
    pub fn new(rx: tokio::sync::watch::Receiver<bool>) -> Self {
        Self(rx)
    }

    /// A token that never cancels, for call sites without a parent scope.
    pub fn never() -> Self {
        let (_tx, rx) = tokio::sync::watch::channel(false);
        Self(rx)
    }

    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }
}

/// The authority for persistent state. Every user-visible status change
/// is committed here before being reflected anywhere else (metrics, API
/// responses, in-memory caches).
#[async_trait]
pub trait Repository: Send + Sync {
    async fn create_pipeline(&self, pipeline: Pipeline, cancel: &CancelToken) -> Result<(), CoreError>;
    async fn get_pipeline(
        &self,
        id: &PipelineId,
        cancel: &CancelToken,
    ) -> Result<Option<Pipeline>, CoreError>;
    async fn update_pipeline(&self, pipeline: Pipeline, cancel: &CancelToken) -> Result<(), CoreError>;
    async fn delete_pipeline(&self, id: &PipelineId, cancel: &CancelToken) -> Result<(), CoreError>;

    async fn create_pipeline_run(
        &self,
        run: PipelineRun,
        cancel: &CancelToken,
    ) -> Result<(), CoreError>;
    async fn get_pipeline_run(
        &self,
        id: &RunId,
        cancel: &CancelToken,
    ) -> Result<Option<PipelineRun>, CoreError>;
    async fn list_pipeline_runs(
        &self,
        pipeline_id: &PipelineId,
        cancel: &CancelToken,
    ) -> Result<Vec<PipelineRun>, CoreError>;
    async fn update_pipeline_run(
        &self,
        run: PipelineRun,
        cancel: &CancelToken,
    ) -> Result<(), CoreError>;

    async fn create_job(&self, job: Job, cancel: &CancelToken) -> Result<(), CoreError>;
    async fn get_job(&self, id: &JobId, cancel: &CancelToken) -> Result<Option<Job>, CoreError>;
    async fn update_job(&self, job: Job, cancel: &CancelToken) -> Result<(), CoreError>;
    async fn delete_job(&self, id: &JobId, cancel: &CancelToken) -> Result<(), CoreError>;
    async fn jobs_by_run(
        &self,
        run_id: &RunId,
        cancel: &CancelToken,
    ) -> Result<Vec<Job>, CoreError>;
    /// Jobs in `Pending` whose required labels are a subset of `labels`,
    /// used by the scheduler's discovery loop.
    async fn pending_jobs_by_labels(
        &self,
        labels: &[String],
        cancel: &CancelToken,
    ) -> Result<Vec<Job>, CoreError>;

    async fn register_runner(&self, runner: Runner, cancel: &CancelToken)
        -> Result<(), CoreError>;
    async fn update_runner(&self, runner: Runner, cancel: &CancelToken) -> Result<(), CoreError>;
    async fn get_runner(
        &self,
        id: &RunnerId,
        cancel: &CancelToken,
    ) -> Result<Option<Runner>, CoreError>;
    async fn unregister_runner(&self, id: &RunnerId, cancel: &CancelToken)
        -> Result<(), CoreError>;
    async fn update_runner_status(
        &self,
        id: &RunnerId,
        status: crate::runner::RunnerStatus,
        cancel: &CancelToken,
    ) -> Result<(), CoreError>;
    async fn available_runners_by_labels(
        &self,
        labels: &[String],
        cancel: &CancelToken,
    ) -> Result<Vec<Runner>, CoreError>;
}
