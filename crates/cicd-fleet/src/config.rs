// SPDX-License-Identifier: MIT
// Copyright (c) 2026 CI/CD Execution Core Contributors

//! `FleetConfig` — the fleet's tunable knobs, loadable from TOML.

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
pub struct FleetConfig {
    pub send_queue_size: usize,
    #[serde(with = "humantime_secs")]
    pub read_deadline: Duration,
    #[serde(with = "humantime_secs")]
    pub write_deadline: Duration,
    #[serde(with = "humantime_secs")]
    pub ping_interval: Duration,
    #[serde(with = "humantime_secs")]
    pub liveness_window: Duration,
    #[serde(with = "humantime_secs")]
    pub heartbeat_check_interval: Duration,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            send_queue_size: 256,
            read_deadline: Duration::from_secs(60),
            write_deadline: Duration::from_secs(10),
            ping_interval: Duration::from_secs(54),
            liveness_window: Duration::from_secs(120),
            heartbeat_check_interval: Duration::from_secs(30),
        }
    }
}

impl FleetConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
