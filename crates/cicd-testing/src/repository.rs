// SPDX-License-Identifier: MIT
// Copyright (c) 2026 CI/CD Execution Core Contributors

//! In-memory `Repository` fake backed by `parking_lot::Mutex<HashMap<_, _>>`.

use async_trait::async_trait;
use cicd_core::{
    CancelToken, CoreError, Job, JobId, Pipeline, PipelineId, PipelineRun, Repository, RunId,
    Runner, RunnerId, RunnerStatus,
};
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Default)]
struct State {
    pipelines: HashMap<PipelineId, Pipeline>,
    runs: HashMap<RunId, PipelineRun>,
    jobs: HashMap<JobId, Job>,
    runners: HashMap<RunnerId, Runner>,
}

/// A trivial in-memory `Repository`. Not durable, not concurrent-writer
/// safe beyond the mutex — suitable only for tests.
#[derive(Default)]
pub struct InMemoryRepository {
    state: Mutex<State>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn create_pipeline(&self, pipeline: Pipeline, _cancel: &CancelToken) -> Result<(), CoreError> {
        self.state.lock().pipelines.insert(pipeline.id.clone(), pipeline);
        Ok(())
    }

    async fn get_pipeline(
        &self,
        id: &PipelineId,
        _cancel: &CancelToken,
    ) -> Result<Option<Pipeline>, CoreError> {
        Ok(self.state.lock().pipelines.get(id).cloned())
    }

    async fn update_pipeline(&self, pipeline: Pipeline, _cancel: &CancelToken) -> Result<(), CoreError> {
        self.state.lock().pipelines.insert(pipeline.id.clone(), pipeline);
        Ok(())
    }

    async fn delete_pipeline(&self, id: &PipelineId, _cancel: &CancelToken) -> Result<(), CoreError> {
        self.state.lock().pipelines.remove(id);
        Ok(())
    }

    async fn create_pipeline_run(
        &self,
        run: PipelineRun,
        _cancel: &CancelToken,
    ) -> Result<(), CoreError> {
        self.state.lock().runs.insert(run.id.clone(), run);
        Ok(())
    }

    async fn get_pipeline_run(
        &self,
        id: &RunId,
        _cancel: &CancelToken,
    ) -> Result<Option<PipelineRun>, CoreError> {
        Ok(self.state.lock().runs.get(id).cloned())
    }

    async fn list_pipeline_runs(
        &self,
        pipeline_id: &PipelineId,
        _cancel: &CancelToken,
    ) -> Result<Vec<PipelineRun>, CoreError> {
        Ok(self
            .state
            .lock()
            .runs
            .values()
            .filter(|r| &r.pipeline_id == pipeline_id)
            .cloned()
            .collect())
    }

    async fn update_pipeline_run(
        &self,
        run: PipelineRun,
        _cancel: &CancelToken,
    ) -> Result<(), CoreError> {
        self.state.lock().runs.insert(run.id.clone(), run);
        Ok(())
    }

    async fn create_job(&self, job: Job, _cancel: &CancelToken) -> Result<(), CoreError> {
        self.state.lock().jobs.insert(job.id.clone(), job);
        Ok(())
    }

    async fn get_job(&self, id: &JobId, _cancel: &CancelToken) -> Result<Option<Job>, CoreError> {
        Ok(self.state.lock().jobs.get(id).cloned())
    }

    async fn update_job(&self, job: Job, _cancel: &CancelToken) -> Result<(), CoreError> {
        self.state.lock().jobs.insert(job.id.clone(), job);
        Ok(())
    }

    async fn delete_job(&self, id: &JobId, _cancel: &CancelToken) -> Result<(), CoreError> {
        self.state.lock().jobs.remove(id);
        Ok(())
    }

    async fn jobs_by_run(
        &self,
        run_id: &RunId,
        _cancel: &CancelToken,
    ) -> Result<Vec<Job>, CoreError> {
        Ok(self
            .state
            .lock()
            .jobs
            .values()
            .filter(|j| &j.run_id == run_id)
            .cloned()
            .collect())
    }

    async fn pending_jobs_by_labels(
        &self,
        labels: &[String],
        _cancel: &CancelToken,
    ) -> Result<Vec<Job>, CoreError> {
        Ok(self
            .state
            .lock()
            .jobs
            .values()
            .filter(|j| {
                j.status == cicd_core::JobStatus::Pending
                    && j.required_labels.iter().all(|l| labels.contains(l))
            })
            .cloned()
            .collect())
    }

    async fn register_runner(
        &self,
        runner: Runner,
        _cancel: &CancelToken,
    ) -> Result<(), CoreError> {
        self.state.lock().runners.insert(runner.id.clone(), runner);
        Ok(())
    }

    async fn update_runner(&self, runner: Runner, _cancel: &CancelToken) -> Result<(), CoreError> {
        self.state.lock().runners.insert(runner.id.clone(), runner);
        Ok(())
    }

    async fn get_runner(
        &self,
        id: &RunnerId,
        _cancel: &CancelToken,
    ) -> Result<Option<Runner>, CoreError> {
        Ok(self.state.lock().runners.get(id).cloned())
    }

    async fn unregister_runner(
        &self,
        id: &RunnerId,
        _cancel: &CancelToken,
    ) -> Result<(), CoreError> {
        self.state.lock().runners.remove(id);
        Ok(())
    }

    async fn update_runner_status(
        &self,
        id: &RunnerId,
        status: RunnerStatus,
        _cancel: &CancelToken,
    ) -> Result<(), CoreError> {
        if let Some(runner) = self.state.lock().runners.get_mut(id) {
            runner.status = status;
        }
        Ok(())
    }

    async fn available_runners_by_labels(
        &self,
        labels: &[String],
        _cancel: &CancelToken,
    ) -> Result<Vec<Runner>, CoreError> {
        Ok(self
            .state
            .lock()
            .runners
            .values()
            .filter(|r| r.status.is_available() && r.has_labels(labels))
            .cloned()
            .collect())
    }
}
