// SPDX-License-Identifier: MIT
// Copyright (c) 2026 CI/CD Execution Core Contributors

//! `RunnerSession` — a live bidirectional channel to one runner.
//!
//! This module defines only the data shape; `cicd-fleet` owns the
//! reader/writer loops and the send-queue behaviour.

use crate::ids::{JobId, RunnerId, SessionId};
use chrono::{DateTime, Utc};

/// Metadata about one live runner session. The send queue itself lives in
/// `cicd-fleet` (it is a `tokio::sync::mpsc` channel, not serializable data).
#[derive(Debug, Clone)]
pub struct RunnerSessionInfo {
    pub session_id: SessionId,
    pub runner_id: RunnerId,
    pub connected_at: DateTime<Utc>,
    pub last_ping_at: DateTime<Utc>,
    pub assigned_job: Option<JobId>,
}

impl RunnerSessionInfo {
    pub fn new(session_id: SessionId, runner_id: RunnerId, now: DateTime<Utc>) -> Self {
        Self {
            session_id,
            runner_id,
            connected_at: now,
            last_ping_at: now,
            assigned_job: None,
        }
    }

    /// True when no inbound message has been seen for longer than `window`.
    pub fn is_stale(&self, now: DateTime<Utc>, window: std::time::Duration) -> bool {
        match chrono::Duration::from_std(window) {
            Ok(window) => now - self.last_ping_at > window,
            Err(_) => false,
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
