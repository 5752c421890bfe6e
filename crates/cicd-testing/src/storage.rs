// SPDX-License-Identifier: MIT
// Copyright (c) 2026 CI/CD Execution Core Contributors

//! In-memory `Storage` fake.

use async_trait::async_trait;
use cicd_core::{CoreError, JobId, LogKind, Storage};
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Default)]
pub struct FakeStorage {
    logs: Mutex<HashMap<(String, u8), Vec<u8>>>,
    artifacts: Mutex<HashMap<String, Vec<u8>>>,
}

impl FakeStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log_for(&self, job_id: &JobId, kind: LogKind) -> Option<Vec<u8>> {
        self.logs
            .lock()
            .get(&(job_id.to_string(), kind as u8))
            .cloned()
    }
}

#[async_trait]
impl Storage for FakeStorage {
    async fn init(&self) -> Result<(), CoreError> {
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), CoreError> {
        Ok(())
    }

    async fn write_log(
        &self,
        job_id: &JobId,
        kind: LogKind,
        bytes: &[u8],
    ) -> Result<(), CoreError> {
        self.logs
            .lock()
            .entry((job_id.to_string(), kind as u8))
            .or_default()
            .extend_from_slice(bytes);
        Ok(())
    }

    async fn upload_artifact(&self, key: &str, bytes: &[u8]) -> Result<(), CoreError> {
        self.artifacts.lock().insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn download_artifact(&self, key: &str) -> Result<Vec<u8>, CoreError> {
        self.artifacts
            .lock()
            .get(key)
            .cloned()
            .ok_or_else(|| CoreError::Infra(format!("no such artifact: {key}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_log_appends_across_calls() {
        let storage = FakeStorage::new();
        let job_id = JobId::new("job-1");
        storage.write_log(&job_id, LogKind::Stdout, b"hello ").await.unwrap();
        storage.write_log(&job_id, LogKind::Stdout, b"world").await.unwrap();

        assert_eq!(
            storage.log_for(&job_id, LogKind::Stdout).unwrap(),
            b"hello world"
        );
    }

    #[tokio::test]
    async fn download_unknown_artifact_is_an_error() {
        let storage = FakeStorage::new();
        assert!(storage.download_artifact("missing").await.is_err());
    }
}
