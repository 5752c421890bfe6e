// SPDX-License-Identifier: MIT
// Copyright (c) 2026 CI/CD Execution Core Contributors

//! `ExecutorConfig` — the executor's tunable knobs, loadable from TOML,
//! plus the ambient daemon intervals (`stats_interval`, `cleanup_interval`,
//! `max_containers`) that aren't part of the externally observable config.

use serde::{Deserialize, Serialize};
use std::time::Duration;

mod humantime_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    pub max_concurrent_jobs: usize,
    #[serde(with = "humantime_secs")]
    pub default_timeout: Duration,
    pub default_cpu_limit: f64,
    pub default_memory_limit_bytes: u64,
    pub default_disk_limit_bytes: u64,
    pub enable_auto_cleanup: bool,
    #[serde(with = "humantime_secs")]
    pub cleanup_timeout: Duration,
    pub log_retention_days: u32,
    pub stream_logs: bool,
    /// How often the monitor samples `ContainerManager::stats`. The
    /// lifecycle monitor's own per-execution tick is fixed at 5 s; this
    /// governs the separate background stats daemon.
    #[serde(with = "humantime_secs")]
    pub stats_interval: Duration,
    /// How often the auto-cleaner sweeps finished executions older than
    /// one hour.
    #[serde(with = "humantime_secs")]
    pub cleanup_interval: Duration,
    /// Container-count ceiling enforced by the `ContainerManager`
    /// implementation; carried here so the composition root can configure
    /// both from one file.
    pub max_containers: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 10,
            default_timeout: Duration::from_secs(30 * 60),
            default_cpu_limit: 1.0,
            default_memory_limit_bytes: 512 * 1024 * 1024,
            default_disk_limit_bytes: 1024 * 1024 * 1024,
            enable_auto_cleanup: true,
            cleanup_timeout: Duration::from_secs(5 * 60),
            log_retention_days: 7,
            stream_logs: true,
            stats_interval: Duration::from_secs(10),
            cleanup_interval: Duration::from_secs(10 * 60),
            max_containers: 50,
        }
    }
}

impl ExecutorConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
