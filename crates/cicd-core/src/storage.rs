// SPDX-License-Identifier: MIT
// Copyright (c) 2026 CI/CD Execution Core Contributors

//! The log/artifact storage interface. Artifact/object storage
//! is an external collaborator; the core only ever talks to this trait.

use crate::error::CoreError;
use crate::ids::JobId;
use async_trait::async_trait;

/// What kind of log stream a chunk belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    Stdout,
    Stderr,
    Combined,
}

#[async_trait]
pub trait Storage: Send + Sync {
    async fn init(&self) -> Result<(), CoreError>;
    async fn shutdown(&self) -> Result<(), CoreError>;

    async fn write_log(&self, job_id: &JobId, kind: LogKind, bytes: &[u8])
        -> Result<(), CoreError>;

    async fn upload_artifact(&self, key: &str, bytes: &[u8]) -> Result<(), CoreError>;
    async fn download_artifact(&self, key: &str) -> Result<Vec<u8>, CoreError>;
}
