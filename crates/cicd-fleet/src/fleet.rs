// SPDX-License-Identifier: MIT
// Copyright (c) 2026 CI/CD Execution Core Contributors

//! `Fleet` — owns the set of live runner sessions: shared context behind
//! an `Arc`, accept/connection handling run as spawned tasks, session
//! state behind a `parking_lot::Mutex`-guarded map.

use crate::config::FleetConfig;
use crate::error::FleetError;
use crate::session::{run_reader_loop, run_writer_loop, SessionHandle};
use async_trait::async_trait;
use cicd_core::{
    CancelToken, Clock, CoreError, DownstreamMessage, JobCancelMessage, JobId, JobMessage,
    JobResultSink, Repository, RunnerId, RunnerSessionInfo, RunnerStatus, SessionId,
};
use cicd_scheduler::RunnerDispatch;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tracing::{info, warn};

pub struct Fleet<C: Clock> {
    config: FleetConfig,
    repository: Arc<dyn Repository>,
    sink: Arc<dyn JobResultSink>,
    sessions: Mutex<HashMap<RunnerId, Arc<SessionHandle>>>,
    clock: C,
}

impl<C: Clock> Fleet<C> {
    pub fn new(
        config: FleetConfig,
        repository: Arc<dyn Repository>,
        sink: Arc<dyn JobResultSink>,
        clock: C,
    ) -> Arc<Self> {
        Arc::new(Self { config, repository, sink, sessions: Mutex::new(HashMap::new()), clock })
    }

    /// Validates the runner is registered, registers the session, marks it
    /// Online, then runs the reader and writer loops until either ends.
    /// Returns once the session has been torn down and the runner marked
    /// Offline.
    pub async fn handle_connection<S>(
        self: &Arc<Self>,
        stream: S,
        runner_id: RunnerId,
        cancel: CancelToken,
    ) -> Result<(), FleetError>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        self.repository
            .get_runner(&runner_id, &cancel)
            .await?
            .ok_or_else(|| FleetError::UnknownRunner(runner_id.to_string()))?;

        let (tx, rx) = mpsc::channel(self.config.send_queue_size);
        let info = RunnerSessionInfo::new(SessionId::generate(), runner_id.clone(), self.clock.utc_now());
        let handle = Arc::new(SessionHandle::new(info, tx));
        self.sessions.lock().insert(runner_id.clone(), handle.clone());
        self.repository.update_runner_status(&runner_id, RunnerStatus::Online, &cancel).await?;
        info!(runner_id = %runner_id, "runner session established");

        let (mut reader, mut writer) = tokio::io::split(stream);
        let result = tokio::select! {
            r = run_reader_loop(&mut reader, &handle, &self.sink, &runner_id, self.config.read_deadline, &self.clock, &cancel) => r,
            w = run_writer_loop(&mut writer, rx, self.config.write_deadline, self.config.ping_interval, &cancel) => w,
        };

        self.sessions.lock().remove(&runner_id);
        if let Err(err) = self.repository.update_runner_status(&runner_id, RunnerStatus::Offline, &cancel).await {
            warn!(error = %err, runner_id = %runner_id, "failed to mark runner offline after session end");
        }
        info!(runner_id = %runner_id, "runner session closed");
        result
    }

    pub fn online_runner_ids(&self) -> Vec<RunnerId> {
        self.sessions.lock().keys().cloned().collect()
    }

    pub fn has_session(&self, runner_id: &RunnerId) -> bool {
        self.sessions.lock().contains_key(runner_id)
    }

    /// Used by the handshake to answer 404 for an unknown `runner_id`
    /// before upgrading the connection.
    pub async fn runner_exists(&self, runner_id: &RunnerId, cancel: &CancelToken) -> Result<bool, CoreError> {
        Ok(self.repository.get_runner(runner_id, cancel).await?.is_some())
    }

    /// Fleet-level heartbeat checker: evicts any session whose
    /// `last_ping_at` predates `LivenessWindow`, independent of the
    /// per-session read deadline.
    pub async fn evict_stale_sessions(&self, cancel: &CancelToken) {
        let now = self.clock.utc_now();
        let window = self.config.liveness_window;
        let stale: Vec<RunnerId> = self
            .sessions
            .lock()
            .iter()
            .filter(|(_, handle)| handle.is_stale(now, window))
            .map(|(id, _)| id.clone())
            .collect();

        for runner_id in stale {
            self.sessions.lock().remove(&runner_id);
            if let Err(err) =
                self.repository.update_runner_status(&runner_id, RunnerStatus::Offline, cancel).await
            {
                warn!(error = %err, runner_id = %runner_id, "failed to evict stale runner");
            } else {
                info!(runner_id = %runner_id, "runner evicted for heartbeat liveness");
            }
        }
    }
}

#[async_trait]
impl<C: Clock> RunnerDispatch for Fleet<C> {
    async fn send_job(&self, runner_id: &RunnerId, msg: JobMessage) -> Result<(), CoreError> {
        let sessions = self.sessions.lock();
        let handle = sessions.get(runner_id).ok_or(CoreError::NotConnected)?;
        handle.try_send(DownstreamMessage::JobStart(msg)).map_err(fleet_to_core)
    }

    async fn cancel_job(&self, runner_id: &RunnerId, job_id: &JobId) -> Result<(), CoreError> {
        let sessions = self.sessions.lock();
        let handle = sessions.get(runner_id).ok_or(CoreError::NotConnected)?;
        handle
            .try_send(DownstreamMessage::JobCancel(JobCancelMessage { job_id: job_id.clone() }))
            .map_err(fleet_to_core)
    }

    async fn online_runners(&self) -> Vec<RunnerId> {
        self.online_runner_ids()
    }
}

fn fleet_to_core(err: FleetError) -> CoreError {
    match err {
        FleetError::Core(core) => core,
        other => CoreError::Infra(other.to_string()),
    }
}

/// Runs the fleet heartbeat checker at `HeartbeatCheckInterval` until
/// `cancel` fires.
pub async fn run_heartbeat_checker<C: Clock>(fleet: Arc<Fleet<C>>, cancel: CancelToken) {
    let mut interval = tokio::time::interval(fleet.config.heartbeat_check_interval);
    loop {
        interval.tick().await;
        if cancel.is_cancelled() {
            return;
        }
        fleet.evict_stale_sessions(&cancel).await;
    }
}

#[cfg(test)]
#[path = "fleet_tests.rs"]
mod tests;
