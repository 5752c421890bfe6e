// SPDX-License-Identifier: MIT
// Copyright (c) 2026 CI/CD Execution Core Contributors

//! `cicdd` — the CI/CD execution core daemon.
//!
//! Thin binary wrapper around [`cicd_server::composition::build`]: loads
//! configuration, sets up logging, wires the system, binds the fleet's
//! runner-connection listener, and runs until SIGTERM/SIGINT.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

use cicd_core::{CancelToken, SystemClock};
use cicd_server::{build, ServerConfig};
use cicd_testing::{FakeContainerManager, FakeStorage, InMemoryRepository};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("cicdd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            other => {
                eprintln!("error: unexpected argument '{other}'");
                eprintln!("usage: cicdd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = ServerConfig::load()?;
    let _log_guard = setup_logging(&config);

    info!("starting cicd execution core daemon");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown = CancelToken::new(shutdown_rx);

    let repository = Arc::new(InMemoryRepository::new());
    let storage = Arc::new(FakeStorage::new());
    let container_manager = Arc::new(FakeContainerManager::new());

    let system = build(&config, repository, storage, container_manager, SystemClock, shutdown.clone());

    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %config.bind_addr, "fleet listening for runner connections");
    tokio::spawn(cicd_fleet::run_accept_loop(system.fleet.clone(), listener, shutdown.clone()));

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
        _ = sigint.recv() => info!("received SIGINT, shutting down"),
    }

    let _ = shutdown_tx.send(true);
    info!("cicd execution core daemon stopped");
    Ok(())
}

fn print_help() {
    println!("cicdd {}", env!("CARGO_PKG_VERSION"));
    println!("CI/CD execution core daemon: Pipeline Engine, Job Scheduler, Runner Fleet Manager, Container Executor.");
    println!();
    println!("USAGE:");
    println!("    cicdd");
    println!();
    println!("Configuration is read from an optional cicd.toml under the user's config directory.");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Print help information");
    println!("    -V, --version    Print version information");
}

/// Sets up file-backed logging if `log_dir` is configured, otherwise logs
/// to stderr, using a non-blocking `tracing-appender` writer.
fn setup_logging(config: &ServerConfig) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match &config.log_dir {
        Some(dir) => {
            if std::fs::create_dir_all(dir).is_err() {
                tracing_subscriber::registry().with(filter).with(fmt::layer()).init();
                return None;
            }
            let appender = tracing_appender::rolling::daily(dir, "cicdd.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(non_blocking))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry().with(filter).with(fmt::layer()).init();
            None
        }
    }
}
