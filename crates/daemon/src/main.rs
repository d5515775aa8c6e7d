// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pald`: the long-lived process that owns the `.pal/` store for a project
//! (SPEC_FULL.md §4.1, §5). Acquires the project lock, opens the store,
//! binds the loopback HTTP surface, then serves until the process receives
//! a shutdown signal.

use pal_core::SystemClock;
use pal_daemon::http::{self, AppState};
use pal_daemon::hooks::HookDispatcher;
use pal_daemon::lifecycle;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let project_root = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(err) => {
            tracing::error!(error = %err, "failed to resolve current directory");
            return ExitCode::FAILURE;
        }
    };

    let startup = match lifecycle::startup(&project_root).await {
        Ok(result) => result,
        Err(err) => {
            tracing::error!(error = %err, "pald startup failed");
            return ExitCode::FAILURE;
        }
    };

    let port = startup.config.server.port;
    let loopback_only = startup.config.server.loopback_only;
    let bind_ip = if loopback_only { [127, 0, 0, 1] } else { [0, 0, 0, 0] };

    let dispatcher = Arc::new(HookDispatcher::new(startup.runtime.clone(), startup.config.clone(), SystemClock));
    let state = AppState { runtime: startup.runtime.clone(), dispatcher, clock: SystemClock };
    let app = http::router(state);

    let listener = match tokio::net::TcpListener::bind((bind_ip, port)).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(error = %err, port, "failed to bind HTTP listener");
            let _ = startup.shutdown().await;
            return ExitCode::FAILURE;
        }
    };
    let bound_port = match listener.local_addr() {
        Ok(addr) => addr.port(),
        Err(err) => {
            tracing::error!(error = %err, "failed to read bound address");
            let _ = startup.shutdown().await;
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = startup.publish_discovery(bound_port) {
        tracing::error!(error = %err, "failed to publish discovery file");
        let _ = startup.shutdown().await;
        return ExitCode::FAILURE;
    }

    tracing::info!(port = bound_port, root = %startup.paths.root().display(), "pald listening");

    let serve_result = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await;
    if let Err(err) = serve_result {
        tracing::error!(error = %err, "server loop exited with error");
    }

    tracing::info!("pald shutting down");
    if let Err(err) = startup.shutdown().await {
        tracing::error!(error = %err, "error during shutdown");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
