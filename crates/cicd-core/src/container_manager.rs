// SPDX-License-Identifier: MIT
// Copyright (c) 2026 CI/CD Execution Core Contributors

//! The container-runtime client interface. The actual
//! Docker-or-equivalent daemon is out of scope; the executor only ever
//! talks to this trait.

use crate::error::CoreError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Security posture applied to a container at creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub uid: u32,
    pub gid: u32,
    pub no_new_privileges: bool,
    pub privileged: bool,
    pub read_only_rootfs: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            uid: 1000,
            gid: 1000,
            no_new_privileges: true,
            privileged: false,
            read_only_rootfs: false,
        }
    }
}

/// A liveness probe run inside the container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckConfig {
    pub command: Vec<String>,
    pub interval: Duration,
    pub timeout: Duration,
    pub retries: u32,
    pub start_period: Duration,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            command: vec!["echo".to_string(), "healthy".to_string()],
            interval: Duration::from_secs(30),
            timeout: Duration::from_secs(5),
            retries: 3,
            start_period: Duration::from_secs(10),
        }
    }
}

/// Full container creation request, as built by `cicd-executor`'s plan
/// step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerConfig {
    pub name: String,
    pub image: String,
    pub command: Vec<String>,
    pub env: HashMap<String, String>,
    /// (host_path, container_path) pairs.
    pub volumes: Vec<(String, String)>,
    pub cpu_limit: f64,
    pub memory_limit_bytes: u64,
    pub disk_limit_bytes: u64,
    pub security: SecurityConfig,
    pub health_check: HealthCheckConfig,
    pub restart_policy: String,
    pub auto_remove: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerStatus {
    Created,
    Running,
    Exited,
    Removed,
}

/// Stats as sampled from the container daemon each monitor tick.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ContainerStats {
    pub cpu_percent: f64,
    pub memory_bytes: u64,
    pub disk_bytes: u64,
}

#[derive(Debug, Clone, Default)]
pub struct ContainerFilter {
    pub name_prefix: Option<String>,
    pub status: Option<ContainerStatus>,
}

#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    pub follow: bool,
    pub tail_lines: Option<usize>,
}

/// A handle to a created container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Container {
    pub id: String,
    pub name: String,
    pub status: ContainerStatus,
    pub exit_code: Option<i32>,
}

#[async_trait]
pub trait ContainerManager: Send + Sync {
    async fn create_container(&self, config: ContainerConfig) -> Result<Container, CoreError>;
    async fn start(&self, id: &str) -> Result<(), CoreError>;
    async fn stop(&self, id: &str, timeout: Duration) -> Result<(), CoreError>;
    async fn remove(&self, id: &str, force: bool) -> Result<(), CoreError>;
    async fn restart(&self, id: &str) -> Result<(), CoreError>;
    async fn inspect(&self, id: &str) -> Result<Container, CoreError>;
    async fn list(&self, filter: ContainerFilter) -> Result<Vec<Container>, CoreError>;
    async fn stats(&self, id: &str) -> Result<ContainerStats, CoreError>;
    async fn system_prune(&self) -> Result<(), CoreError>;
}
