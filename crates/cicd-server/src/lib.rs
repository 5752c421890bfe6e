// SPDX-License-Identifier: MIT
// Copyright (c) 2026 CI/CD Execution Core Contributors

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

//! cicd-server: the composition root for the CI/CD execution core.
//! Wires a repository, storage, and container manager together with
//! the Pipeline Engine, Job Scheduler, Runner Fleet Manager, and
//! Container Executor, and runs every background loop. The `cicdd`
//! binary (`main.rs`) is a thin wrapper around this library so the same
//! wiring can be reused from integration tests.

pub mod composition;
pub mod config;

pub use composition::{build, System};
pub use config::ServerConfig;
