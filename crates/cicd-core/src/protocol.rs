// SPDX-License-Identifier: MIT
// Copyright (c) 2026 CI/CD Execution Core Contributors

//! Wire message shapes for the runner session protocol.
//!
//! These are pure data — framing, handshake, and the actual socket I/O
//! live in `cicd-fleet`. They live here, rather than in `cicd-fleet`
//! alongside the framing code, so `cicd-scheduler` can construct a
//! `JobMessage` to hand to the fleet's `RunnerDispatch` port without the
//! scheduler crate depending on the fleet crate.

use crate::ids::JobId;
use crate::job::{JobConfig, JobStatus};
use crate::storage::LogKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// `job_start`: dispatches one job to a runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobMessage {
    pub job_id: JobId,
    pub commands: Vec<String>,
    pub env: HashMap<String, String>,
    pub workspace: String,
    pub timeout_secs: u64,
    pub config: JobConfig,
}

/// `job_cancel`: requests best-effort cancellation of an in-flight job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobCancelMessage {
    pub job_id: JobId,
}

/// `job_result`: a terminal outcome reported by the runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResultMessage {
    pub job_id: JobId,
    pub status: JobStatus,
    pub exit_code: Option<i32>,
    pub output: String,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub artifacts: Vec<String>,
}

/// `job_progress`: a non-terminal status update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobProgressMessage {
    pub job_id: JobId,
    pub message: String,
}

/// `log`: a chunk of captured output for a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogMessage {
    pub job_id: JobId,
    pub kind: LogKind,
    pub chunk: Vec<u8>,
}

impl Serialize for LogKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let s = match self {
            LogKind::Stdout => "stdout",
            LogKind::Stderr => "stderr",
            LogKind::Combined => "combined",
        };
        serializer.serialize_str(s)
    }
}

impl<'de> Deserialize<'de> for LogKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            "stdout" => Ok(LogKind::Stdout),
            "stderr" => Ok(LogKind::Stderr),
            "combined" => Ok(LogKind::Combined),
            other => Err(serde::de::Error::unknown_variant(
                other,
                &["stdout", "stderr", "combined"],
            )),
        }
    }
}

/// Downstream (server -> runner) frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DownstreamMessage {
    JobStart(JobMessage),
    JobCancel(JobCancelMessage),
    /// Liveness probe; the runner is expected to answer with
    /// `UpstreamMessage::Heartbeat`.
    Ping,
}

/// Upstream (runner -> server) frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UpstreamMessage {
    JobResult(JobResultMessage),
    JobProgress(JobProgressMessage),
    Heartbeat,
    Log(LogMessage),
}
