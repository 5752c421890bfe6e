// SPDX-License-Identifier: MIT
// Copyright (c) 2026 CI/CD Execution Core Contributors

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

//! cicd-engine: the CI/CD execution core's Pipeline Engine.
//! Expands a pipeline definition into a job DAG, drives each run
//! concurrently to a terminal status, and is the single idempotent
//! ingestion point for job results reported by the fleet and the local
//! executor alike.

pub mod dag;
pub mod driver;
pub mod engine;
pub mod error;

pub use dag::expand_pipeline;
pub use engine::{Engine, EngineSink};
pub use error::EngineError;
