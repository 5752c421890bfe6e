// SPDX-License-Identifier: MIT
// Copyright (c) 2026 CI/CD Execution Core Contributors

//! `ServerConfig` — the composition root's own configuration, plus the
//! three subsystem configs it hands down to the scheduler, fleet, and
//! executor. Loadable from an optional `cicd.toml` the same way
//! `SchedulerConfig`/`FleetConfig`/`ExecutorConfig` load from TOML.

use cicd_executor::ExecutorConfig;
use cicd_fleet::FleetConfig;
use cicd_scheduler::SchedulerConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the fleet's runner-connection listener binds to.
    pub bind_addr: String,
    /// Labels this node's local executor advertises to the discovery
    /// loop's runner-selection fallback.
    pub discovery_labels: Vec<String>,
    /// Directory for the file-backed log, if file logging is wanted.
    /// `None` logs to stderr only.
    pub log_dir: Option<PathBuf>,
    pub scheduler: SchedulerConfig,
    pub fleet: FleetConfig,
    pub executor: ExecutorConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:7070".to_string(),
            discovery_labels: Vec::new(),
            log_dir: None,
            scheduler: SchedulerConfig::default(),
            fleet: FleetConfig::default(),
            executor: ExecutorConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Reads `cicd.toml` from the user's config directory
    /// (`dirs::config_dir()/cicd/cicd.toml`), falling back to defaults if
    /// the directory or file does not exist. Any other I/O or parse
    /// error is surfaced rather than silently swallowed.
    pub fn load() -> anyhow::Result<Self> {
        let Some(path) = config_path() else {
            return Ok(Self::default());
        };
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(Self::from_toml_str(&contents)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err.into()),
        }
    }
}

fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("cicd").join("cicd.toml"))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
