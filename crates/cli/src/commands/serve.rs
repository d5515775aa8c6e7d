// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pal serve` (SPEC_FULL.md §4.1, §5, §6).
//!
//! Runs `pald` in the foreground of the `pal` process itself rather than
//! spawning the separate `pald` binary as a detached child: `pal-daemon`'s
//! `lifecycle`/`http` modules are already linked into this binary for
//! `Context::daemon` discovery-file parsing, so standing the same listener
//! up here is a direct call rather than a new process-management surface.
//! Mirrors `crates/daemon/src/main.rs` exactly; the two are kept as two
//! thin entry points over one `pal_daemon::lifecycle`/`http` core rather
//! than factored into one, since `pald` remains runnable standalone (the
//! way an operator's process supervisor expects to invoke it).

use crate::exit_error::ExitError;
use clap::Args;
use pal_core::SystemClock;
use pal_daemon::http::{self, AppState};
use pal_daemon::hooks::HookDispatcher;
use pal_daemon::lifecycle;
use std::sync::Arc;

#[derive(Args)]
pub struct ServeArgs {}

pub async fn run(_args: ServeArgs) -> Result<(), ExitError> {
    let project_root = std::env::current_dir().map_err(|e| ExitError::new(2, format!("failed to resolve current directory: {e}")))?;

    let startup = lifecycle::startup(&project_root).await.map_err(|e| ExitError::new(3, format!("pald startup failed: {e}")))?;

    let port = startup.config.server.port;
    let loopback_only = startup.config.server.loopback_only;
    let bind_ip = if loopback_only { [127, 0, 0, 1] } else { [0, 0, 0, 0] };

    let dispatcher = Arc::new(HookDispatcher::new(startup.runtime.clone(), startup.config.clone(), SystemClock));
    let state = AppState { runtime: startup.runtime.clone(), dispatcher, clock: SystemClock };
    let app = http::router(state);

    let listener = match tokio::net::TcpListener::bind((bind_ip, port)).await {
        Ok(listener) => listener,
        Err(e) => {
            let _ = startup.shutdown().await;
            return Err(ExitError::new(3, format!("failed to bind HTTP listener on port {port}: {e}")));
        }
    };
    let bound_port = listener.local_addr().map(|a| a.port()).unwrap_or(port);

    if let Err(e) = startup.publish_discovery(bound_port) {
        let _ = startup.shutdown().await;
        return Err(ExitError::new(3, format!("failed to publish discovery file: {e}")));
    }

    tracing::info!(port = bound_port, root = %project_root.display(), "pal serve listening");

    let serve_result = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await;
    if let Err(e) = serve_result {
        tracing::error!(error = %e, "server loop exited with error");
    }

    startup.shutdown().await.map_err(|e| ExitError::new(3, format!("error during shutdown: {e}")))
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
