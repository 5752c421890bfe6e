// SPDX-License-Identifier: MIT
// Copyright (c) 2026 CI/CD Execution Core Contributors

//! Accept loop and connection handshake. No HTTP framework dependency
//! anywhere in the workspace, so the handshake is a minimal hand-rolled
//! request-line parse rather than a pulled-in axum/hyper dependency.

use crate::error::FleetError;
use crate::fleet::Fleet;
use cicd_core::{CancelToken, Clock, RunnerId};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info, warn};

const HTTP_400: &[u8] = b"HTTP/1.1 400 Bad Request\r\nContent-Length: 0\r\n\r\n";
const HTTP_404: &[u8] = b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n";
const HTTP_101: &[u8] = b"HTTP/1.1 101 Switching Protocols\r\nConnection: Upgrade\r\n\r\n";

/// Accepts connections on `listener`, spawning `handle_connection` for
/// each one, until `cancel` fires.
pub async fn run_accept_loop<C: Clock>(
    fleet: Arc<Fleet<C>>,
    listener: TcpListener,
    cancel: CancelToken,
) {
    loop {
        if cancel.is_cancelled() {
            return;
        }
        match listener.accept().await {
            Ok((stream, addr)) => {
                let fleet = fleet.clone();
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    if let Err(err) = accept_one(fleet, stream, cancel).await {
                        warn!(error = %err, peer = %addr, "runner connection ended with an error");
                    }
                });
            }
            Err(err) => error!(error = %err, "accept failed"),
        }
    }
}

async fn accept_one<C: Clock>(
    fleet: Arc<Fleet<C>>,
    mut stream: TcpStream,
    cancel: CancelToken,
) -> Result<(), FleetError> {
    let runner_id = match read_runner_id(&mut stream).await? {
        Some(id) => id,
        None => {
            stream.write_all(HTTP_400).await.ok();
            return Err(FleetError::MissingRunnerId);
        }
    };

    if !fleet.runner_exists(&runner_id, &cancel).await? {
        stream.write_all(HTTP_404).await.ok();
        return Err(FleetError::UnknownRunner(runner_id.to_string()));
    }

    stream.write_all(HTTP_101).await?;
    info!(runner_id = %runner_id, "runner connection upgraded");
    fleet.handle_connection(stream, runner_id, cancel).await
}

/// Parses the request line and extracts the `runner_id` query parameter
/// from a path like `/runners/connect?runner_id=<uuid>`.
async fn read_runner_id(stream: &mut TcpStream) -> Result<Option<RunnerId>, FleetError> {
    let mut buf = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        let n = stream.read(&mut byte).await?;
        if n == 0 {
            return Err(FleetError::Core(cicd_core::CoreError::Infra(
                "connection closed before request line".to_string(),
            )));
        }
        buf.push(byte[0]);
        if buf.ends_with(b"\r\n") || buf.len() > 8 * 1024 {
            break;
        }
    }

    let line = String::from_utf8_lossy(&buf);
    let path = line.split_whitespace().nth(1).unwrap_or("");
    let query = path.split_once('?').map(|(_, q)| q).unwrap_or("");

    let runner_id = query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == "runner_id" && !value.is_empty()).then(|| RunnerId::new(value))
    });

    Ok(runner_id)
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
