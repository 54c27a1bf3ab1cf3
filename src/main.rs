#![allow(missing_docs)]

//! termplot binary: parse arguments, set up logging and Ctrl-C, run the loop.

use std::io::IsTerminal;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tracing::{error, info, warn};

use termplot::cli::Cli;
use termplot::config::file::{resolve_file_defaults, FileDefaults};
use termplot::logging;
use termplot::monitor::RefreshSignal;
use termplot::runner::Runner;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.folder.is_none() && std::io::stdin().is_terminal() {
        Cli::command()
            .error(
                clap::error::ErrorKind::MissingRequiredArgument,
                "no FOLDER given and nothing piped on stdin",
            )
            .exit();
    }

    let file_defaults = match resolve_file_defaults(cli.config.as_deref()) {
        Ok(defaults) => defaults,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let debug = cli.debug;
    let _log_guard = match cli.log_dir(&file_defaults) {
        Some(dir) => match logging::init_with_file(&dir, debug) {
            Ok(guard) => Some(guard),
            Err(e) => {
                eprintln!("error: {e:#}");
                return ExitCode::FAILURE;
            }
        },
        None => {
            logging::init_cli(debug);
            None
        }
    };

    match run(cli, &file_defaults) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("termplot failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, file_defaults: &FileDefaults) -> Result<()> {
    let config = cli
        .into_config(file_defaults)
        .context("invalid configuration")?;
    info!(backend = %config.backend, follow = config.follow, "termplot starting");

    let mut runner = Runner::new(&config).context("failed to start")?;
    spawn_interrupt_handler(runner.signal());
    runner.run()?;
    Ok(())
}

/// Turn Ctrl-C into an interrupt of the run's signal.
fn spawn_interrupt_handler(signal: Arc<RefreshSignal>) {
    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!(error = %e, "failed to start Ctrl-C handler");
                return;
            }
        };
        runtime.block_on(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Ctrl-C received, stopping");
                    signal.interrupt();
                }
                Err(e) => warn!(error = %e, "failed to listen for Ctrl-C"),
            }
        });
    });
}
