// SPDX-License-Identifier: MIT
// Copyright (c) 2026 CI/CD Execution Core Contributors

//! `Runner` — a remote executor registered with the system.

use crate::ids::RunnerId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Liveness/availability status of a registered runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunnerStatus {
    Online,
    Offline,
    Idle,
    Busy,
}

impl RunnerStatus {
    /// Runners in these states are eligible for dispatch.
    pub fn is_available(self) -> bool {
        matches!(self, RunnerStatus::Online | RunnerStatus::Idle)
    }
}

/// A remote agent that may hold a live session with the fleet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Runner {
    pub id: RunnerId,
    pub tenant: String,
    pub name: String,
    pub labels: HashSet<String>,
    pub status: RunnerStatus,
    pub os: String,
    pub arch: String,
    pub version: String,
    pub last_contact: Option<DateTime<Utc>>,
}

impl Runner {
    pub fn new(id: RunnerId, tenant: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            tenant: tenant.into(),
            name: name.into(),
            labels: HashSet::new(),
            status: RunnerStatus::Offline,
            os: String::new(),
            arch: String::new(),
            version: String::new(),
            last_contact: None,
        }
    }

    /// Whether this runner carries every label in `required`.
    pub fn has_labels(&self, required: &[String]) -> bool {
        required.iter().all(|l| self.labels.contains(l))
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
