// SPDX-License-Identifier: MIT
// Copyright (c) 2026 CI/CD Execution Core Contributors

//! Expands a [`PipelineDefinition`] into a job DAG for one run.
//! Resolves each job's `depends-on` names into freshly minted
//! [`JobId`]s and runs them through [`cicd_core::dag::detect_cycle`]
//! before a single row is ever written.

use crate::error::EngineError;
use cicd_core::{CoreError, Job, JobId, PipelineDefinition, RunId};
use std::collections::HashMap;

/// Builds the `Job` rows for `definition`, scoped to `run_id`. Returns
/// `CoreError::Cycle` wrapped in `EngineError` if the dependency graph
/// is not a DAG, and `CoreError::Validation` if a job names a
/// `depends-on` target that does not exist in the same definition.
pub fn expand_pipeline(run_id: &RunId, definition: &PipelineDefinition) -> Result<Vec<Job>, EngineError> {
    let mut name_to_id = HashMap::with_capacity(definition.jobs.len());
    for job_def in &definition.jobs {
        if name_to_id.insert(job_def.name.clone(), JobId::generate()).is_some() {
            return Err(EngineError::Core(CoreError::Validation(format!(
                "duplicate job name '{}' in pipeline definition",
                job_def.name
            ))));
        }
    }

    let mut edges = HashMap::with_capacity(definition.jobs.len());
    let mut jobs = Vec::with_capacity(definition.jobs.len());

    for job_def in &definition.jobs {
        let id = name_to_id[&job_def.name].clone();
        let mut dependencies = Vec::with_capacity(job_def.depends_on.len());
        for dep_name in &job_def.depends_on {
            let dep_id = name_to_id.get(dep_name).ok_or_else(|| {
                EngineError::Core(CoreError::Validation(format!(
                    "job '{}' depends on unknown job '{}'",
                    job_def.name, dep_name
                )))
            })?;
            dependencies.push(dep_id.clone());
        }
        edges.insert(id.clone(), dependencies.clone());

        let mut job = Job::new(id, run_id.clone(), job_def.name.clone(), job_def.kind, dependencies, job_def.steps.clone());
        job.priority = job_def.priority;
        job.required_labels = job_def.required_labels.clone();
        job.max_retries = job_def.max_retries;
        job.resources = job_def.resources;
        job.config = job_def.config.clone();
        jobs.push(job);
    }

    cicd_core::dag::detect_cycle(&edges).map_err(EngineError::Core)?;
    Ok(jobs)
}

#[cfg(test)]
#[path = "dag_tests.rs"]
mod tests;
