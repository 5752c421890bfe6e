// SPDX-License-Identifier: MIT
// Copyright (c) 2026 CI/CD Execution Core Contributors

//! `SchedulerConfig` — the scheduler's tunable knobs, loadable from TOML.

use crate::strategy::SchedulingStrategy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub worker_count: usize,
    pub queue_size: usize,
    #[serde(with = "humantime_secs")]
    pub poll_interval: Duration,
    #[serde(with = "humantime_secs")]
    pub job_timeout: Duration,
    pub max_retries: u32,
    pub enable_priority: bool,
    pub enable_load_balance: bool,
    pub enable_dependency: bool,
    pub max_history_size: usize,
    #[serde(with = "humantime_secs")]
    pub metrics_interval: Duration,
    #[serde(with = "humantime_secs")]
    pub queue_depth_interval: Duration,
    pub default_strategy: SchedulingStrategy,
    pub max_concurrent_jobs: usize,
    #[serde(with = "humantime_secs")]
    pub health_check_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            worker_count: 5,
            queue_size: 1000,
            poll_interval: Duration::from_secs(10),
            job_timeout: Duration::from_secs(30 * 60),
            max_retries: 3,
            enable_priority: true,
            enable_load_balance: true,
            enable_dependency: true,
            max_history_size: 1000,
            metrics_interval: Duration::from_secs(60),
            queue_depth_interval: Duration::from_secs(10),
            default_strategy: SchedulingStrategy::Priority,
            max_concurrent_jobs: 50,
            health_check_interval: Duration::from_secs(30),
        }
    }
}

impl SchedulerConfig {
    /// Bound on each of the ten priority queues.
    pub fn priority_queue_capacity(&self) -> usize {
        self.queue_size / 10
    }

    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}

/// (De)serializes a `Duration` as a whole number of seconds, for
/// human-editable TOML config over nested duration structs.
mod humantime_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(d)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
