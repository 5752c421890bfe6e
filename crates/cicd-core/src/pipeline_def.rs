// SPDX-License-Identifier: MIT
// Copyright (c) 2026 CI/CD Execution Core Contributors

//! The parsed pipeline definition that `PipelineEngine::execute_pipeline`
//! consumes. Parsing a pipeline DSL is out of scope; callers hand the
//! engine an already-parsed definition.

use crate::job::{JobConfig, JobStep, JobType, ResourceRequest};
use serde::{Deserialize, Serialize};

/// A job as declared in a pipeline definition, before it is materialized
/// into a [`crate::job::Job`] row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDefinition {
    pub name: String,
    pub kind: JobType,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default = "default_priority")]
    pub priority: u8,
    #[serde(default)]
    pub required_labels: Vec<String>,
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default)]
    pub resources: ResourceRequest,
    pub steps: Vec<JobStep>,
    #[serde(default)]
    pub config: JobConfig,
}

fn default_priority() -> u8 {
    crate::job::DEFAULT_PRIORITY
}

/// An already-parsed pipeline definition: a flat list of jobs and their
/// `depends-on` names, scoped to the run being expanded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDefinition {
    pub jobs: Vec<JobDefinition>,
}
