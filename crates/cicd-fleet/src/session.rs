// SPDX-License-Identifier: MIT
// Copyright (c) 2026 CI/CD Execution Core Contributors

//! One runner session: a bounded outbound queue plus the reader/writer
//! loops that drain a full-duplex stream.

use crate::error::FleetError;
use crate::wire::{read_frame, write_frame};
use cicd_core::{
    CancelToken, Clock, CoreError, DownstreamMessage, JobOutcome, JobResultSink, RunnerId,
    RunnerSessionInfo, UpstreamMessage,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Per-session state shared between the session map and the two loops.
pub struct SessionHandle {
    pub info: Mutex<RunnerSessionInfo>,
    outbound: mpsc::Sender<DownstreamMessage>,
}

impl SessionHandle {
    pub fn new(info: RunnerSessionInfo, outbound: mpsc::Sender<DownstreamMessage>) -> Self {
        Self { info: Mutex::new(info), outbound }
    }

    /// Non-blocking enqueue onto the send queue (default capacity 256).
    pub fn try_send(&self, msg: DownstreamMessage) -> Result<(), FleetError> {
        self.outbound.try_send(msg).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => FleetError::Core(CoreError::QueueFull),
            mpsc::error::TrySendError::Closed(_) => FleetError::Core(CoreError::NotConnected),
        })
    }

    pub fn touch(&self, now: chrono::DateTime<chrono::Utc>) {
        self.info.lock().last_ping_at = now;
    }

    pub fn is_stale(&self, now: chrono::DateTime<chrono::Utc>, window: Duration) -> bool {
        self.info.lock().is_stale(now, window)
    }
}

/// Drains inbound frames until the stream errs, closes, or `cancel` fires.
/// Every frame refreshes the session's `last_ping_at`; `job_result` frames
/// are forwarded to `sink` with the reporting runner's identity attached.
pub async fn run_reader_loop<R, C>(
    reader: &mut R,
    handle: &Arc<SessionHandle>,
    sink: &Arc<dyn JobResultSink>,
    runner_id: &RunnerId,
    read_deadline: Duration,
    clock: &C,
    cancel: &CancelToken,
) -> Result<(), FleetError>
where
    R: AsyncRead + Unpin + Send,
    C: Clock,
{
    loop {
        if cancel.is_cancelled() {
            return Err(FleetError::Core(CoreError::Cancelled));
        }

        let msg: UpstreamMessage = read_frame(reader, read_deadline).await?;
        handle.touch(clock.utc_now());

        match msg {
            UpstreamMessage::JobResult(r) => {
                let outcome = JobOutcome {
                    status: r.status,
                    exit_code: r.exit_code,
                    output: r.output,
                    started_at: r.started_at,
                    finished_at: r.finished_at,
                    artifacts: r.artifacts,
                    reported_by: Some(runner_id.clone()),
                };
                if let Err(err) = sink.handle_job_result(&r.job_id, outcome).await {
                    warn!(error = %err, job_id = %r.job_id, "job result ingest failed");
                }
            }
            UpstreamMessage::JobProgress(p) => {
                debug!(job_id = %p.job_id, message = %p.message, "job progress");
            }
            UpstreamMessage::Heartbeat => {
                debug!(runner_id = %runner_id, "heartbeat received");
            }
            UpstreamMessage::Log(l) => {
                debug!(job_id = %l.job_id, kind = ?l.kind, bytes = l.chunk.len(), "log chunk received");
            }
        }
    }
}

/// Writes frames from `inbound` until the channel closes, emitting a
/// `Ping` every `ping_interval` in between.
pub async fn run_writer_loop<W>(
    writer: &mut W,
    mut inbound: mpsc::Receiver<DownstreamMessage>,
    write_deadline: Duration,
    ping_interval: Duration,
    cancel: &CancelToken,
) -> Result<(), FleetError>
where
    W: AsyncWrite + Unpin + Send,
{
    let mut ping_timer = tokio::time::interval(ping_interval);
    ping_timer.tick().await;

    loop {
        if cancel.is_cancelled() {
            return Err(FleetError::Core(CoreError::Cancelled));
        }

        tokio::select! {
            _ = ping_timer.tick() => {
                write_frame(writer, &DownstreamMessage::Ping, write_deadline).await?;
            }
            msg = inbound.recv() => {
                match msg {
                    Some(msg) => write_frame(writer, &msg, write_deadline).await?,
                    None => return Ok(()),
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
