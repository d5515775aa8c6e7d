// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pal`: the coordination-core command-line surface (SPEC_FULL.md §6).

mod color;
mod commands;
mod context;
mod exit_error;
mod output;
mod problem;

use clap::{Parser, Subcommand};
use commands::{backup, data, hook, pipeline, port, serve, session, status};
use context::Context;
use exit_error::ExitError;
use output::OutputFormat;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pal", version, about = "PAL Kit coordination core", styles = color::styles())]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Project-wide overview: sessions, ports, pipelines, escalations.
    Status {
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Attention ports: units of work tracked against a checklist.
    Port(port::PortArgs),
    /// Ordered groups of ports with dependency edges.
    Pipeline(pipeline::PipelineArgs),
    /// Claude Code sessions and their hierarchy.
    Session(session::SessionArgs),
    /// The stdin/stdout hook contract invoked by the host assistant.
    Hook(hook::HookArgs),
    /// Store snapshot archives.
    Backup(backup::BackupArgs),
    /// Integrity checks and maintenance against the store.
    Data(data::DataArgs),
    /// Run `pald`'s HTTP+SSE surface in the foreground.
    Serve(serve::ServeArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = dispatch(cli.command).await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if !err.message.is_empty() {
                eprintln!("{}", color::header(&err.message));
            }
            ExitCode::from(err.code.clamp(0, 255) as u8)
        }
    }
}

async fn dispatch(command: Command) -> Result<(), ExitError> {
    match command {
        Command::Status { format } => status::run(&Context::resolve()?, format),
        Command::Port(args) => port::run(&Context::resolve()?, args.action).await,
        Command::Pipeline(args) => pipeline::run(&Context::resolve()?, args.action).await,
        Command::Session(args) => session::run(&Context::resolve()?, args.action).await,
        Command::Hook(args) => hook::run(&Context::resolve()?, args.action).await,
        Command::Backup(args) => backup::run(&Context::resolve()?, args.action),
        Command::Data(args) => data::run(&Context::resolve()?, args.action).await,
        Command::Serve(args) => serve::run(args).await,
    }
}
