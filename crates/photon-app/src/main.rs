// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Photon — headless remote-DOM renderer
//
// Entry point. Initialises logging, resolves configuration, connects to the
// UI server and serves one session, feeding scripted input from stdin.

mod cli;

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tracing::{error, info};

use photon_client::{Engine, SessionEnd, connect_with_retry, forward_commands, lock_engine, run_session, sink_from_config};
use photon_core::error::Result;

use cli::{Cli, perf_report};

/// Input events buffered between the stdin reader and the session.
const INPUT_QUEUE: usize = 64;

/// How long shutdown waits on a stdin read still blocked in the runtime.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(100);

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Photon starting");

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "failed to start the async runtime");
            return ExitCode::FAILURE;
        }
    };
    let result = runtime.block_on(run(cli));
    runtime.shutdown_timeout(SHUTDOWN_GRACE);

    match result {
        Ok(end) => {
            info!(?end, "Photon stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Photon failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<SessionEnd> {
    let config = cli.resolve_config()?;
    let engine = Engine::new(config.clone())?.shared();
    let mut sink = sink_from_config(&config)?;

    let stream = connect_with_retry(&config).await?;

    let (input_tx, input_rx) = mpsc::channel(INPUT_QUEUE);
    let input = tokio::spawn(async move {
        if let Err(e) = forward_commands(BufReader::new(tokio::io::stdin()), input_tx).await {
            error!(error = %e, "stdin input failed");
        }
    });

    let end = run_session(stream, engine.clone(), &mut sink, input_rx).await;
    input.abort();

    if cli.perf {
        let entries = lock_engine(&engine).perf().drain();
        print!("{}", perf_report(&entries));
    }
    end
}
