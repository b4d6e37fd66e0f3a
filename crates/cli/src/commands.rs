// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command implementations. All wiring is explicit constructor calls: the
//! run command builds the whole daemon graph from one config snapshot, the
//! lighter commands build only what they need.

use crate::{EXIT_BAD_INPUT, EXIT_CONFIG, EXIT_FAILURE, EXIT_OK};
use aires_config::{ConfigStore, Document};
use aires_core::CancelSource;
use aires_daemon::{
    lifecycle, process_single_file, run_daemon, status_exit_code, status_report, DaemonError,
    DaemonOptions, ParserDialect,
};
use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[derive(Args)]
pub struct RunArgs {
    /// Compiler-output dialect: csharp or general
    #[arg(long, default_value = "csharp")]
    pub dialect: String,

    /// Seconds to wait for in-flight jobs at shutdown
    #[arg(long, default_value_t = 30)]
    pub shutdown_deadline: u64,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            dialect: "csharp".to_string(),
            shutdown_deadline: 30,
        }
    }
}

#[derive(Args)]
pub struct OnceArgs {
    /// Build-output file to process
    pub file: PathBuf,

    /// Compiler-output dialect: csharp or general
    #[arg(long, default_value = "csharp")]
    pub dialect: String,
}

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(clap::Subcommand)]
pub enum ConfigAction {
    /// Print one value as `section.key`
    Get { key: String },
    /// Write one value as `section.key value` and reload
    Set { key: String, value: String },
}

fn load_store(config_path: &Path) -> Result<Arc<ConfigStore>, u8> {
    match ConfigStore::load(config_path) {
        Ok(store) => Ok(store),
        Err(e) => {
            eprintln!("error: {e} ({})", e.code());
            Err(EXIT_CONFIG)
        }
    }
}

fn parse_dialect(raw: &str) -> Result<ParserDialect, u8> {
    raw.parse::<ParserDialect>().map_err(|e| {
        eprintln!("error: {e}");
        EXIT_BAD_INPUT
    })
}

/// `aires run`: the unattended service.
pub async fn run(config_path: &Path, args: RunArgs) -> u8 {
    let store = match load_store(config_path) {
        Ok(store) => store,
        Err(code) => return code,
    };
    let dialect = match parse_dialect(&args.dialect) {
        Ok(dialect) => dialect,
        Err(code) => return code,
    };

    let snapshot = store.get();
    let violations = snapshot.critical_violations();
    if !violations.is_empty() {
        for violation in &violations {
            eprintln!("error: {violation} (CONFIG_VALIDATION_ERROR)");
        }
        return EXIT_CONFIG;
    }

    let paths = lifecycle::DaemonPaths::from_config(&snapshot);
    if let Err(e) = paths.ensure() {
        eprintln!("error: {e}");
        return EXIT_CONFIG;
    }
    if let Err(e) = lifecycle::write_startup_marker(&paths) {
        eprintln!("error: cannot write to log directory: {e}");
        return EXIT_CONFIG;
    }
    let _log_guard = match lifecycle::setup_logging(&paths, &snapshot.logging.level) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("error: failed to set up logging: {e}");
            return EXIT_CONFIG;
        }
    };

    // Signals cancel the root context; the daemon drains and exits.
    let shutdown = CancelSource::new();
    spawn_signal_handler(shutdown.clone());

    let options = DaemonOptions {
        shutdown_deadline: Duration::from_secs(args.shutdown_deadline),
        dialect,
    };
    match run_daemon(store, shutdown.token(), options).await {
        Ok(()) => EXIT_OK,
        Err(DaemonError::LockFailed(_)) => {
            eprintln!("error: aires is already running (lock held)");
            EXIT_FAILURE
        }
        Err(e) => {
            eprintln!("error: {e}");
            EXIT_FAILURE
        }
    }
}

fn spawn_signal_handler(shutdown: CancelSource) {
    tokio::spawn(async move {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => tracing::info!("SIGINT received"),
            _ = sigterm.recv() => tracing::info!("SIGTERM received"),
        }
        shutdown.cancel();
    });
}

/// `aires once <file>`: one file, straight through the pipeline.
pub async fn once(config_path: &Path, args: OnceArgs) -> u8 {
    init_console_logging();
    let dialect = match parse_dialect(&args.dialect) {
        Ok(dialect) => dialect,
        Err(code) => return code,
    };
    if !args.file.is_file() {
        eprintln!("error: input file not found: {}", args.file.display());
        return EXIT_BAD_INPUT;
    }

    // A missing config file is fine for one-shot runs; defaults apply.
    let store = if config_path.exists() {
        match load_store(config_path) {
            Ok(store) => store,
            Err(code) => return code,
        }
    } else {
        ConfigStore::with_defaults(config_path)
    };

    match process_single_file(store, &args.file, dialect).await {
        Ok(saved) => {
            println!("{}", saved.display());
            EXIT_OK
        }
        Err(DaemonError::Pipeline(e)) if e.code() == "NO_ERRORS_FOUND" => {
            eprintln!("error: no errors found in input ({})", e.code());
            EXIT_BAD_INPUT
        }
        Err(DaemonError::Io(e)) => {
            eprintln!("error: cannot read input: {e}");
            EXIT_BAD_INPUT
        }
        Err(e) => {
            eprintln!("error: {e}");
            EXIT_FAILURE
        }
    }
}

/// `aires status`: one health sweep, rendered as text.
pub async fn status(config_path: &Path) -> u8 {
    init_console_logging();
    let store = match load_store(config_path) {
        Ok(store) => store,
        Err(code) => return code,
    };

    let report = status_report(store).await;
    print!("{}", report.render());
    status_exit_code(&report) as u8
}

/// `aires config get|set`: direct document access.
pub fn config(config_path: &Path, args: ConfigArgs) -> u8 {
    match args.action {
        ConfigAction::Get { key } => {
            let Some((section, key)) = split_key(&key) else {
                return EXIT_BAD_INPUT;
            };
            let text = match std::fs::read_to_string(config_path) {
                Ok(text) => text,
                Err(e) => {
                    eprintln!("error: {} ({})", e, "CONFIG_LOAD_ERROR");
                    return EXIT_CONFIG;
                }
            };
            match Document::parse(&text).get(section, key) {
                Some(value) => {
                    println!("{value}");
                    EXIT_OK
                }
                None => {
                    eprintln!("error: {section}.{key} is not set");
                    EXIT_BAD_INPUT
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let Some((section, key)) = split_key(&key) else {
                return EXIT_BAD_INPUT;
            };
            let store = match load_store(config_path) {
                Ok(store) => store,
                Err(code) => return code,
            };
            match store.set(section, key, &value) {
                Ok(()) => EXIT_OK,
                Err(e) => {
                    eprintln!("error: {e} ({})", e.code());
                    EXIT_CONFIG
                }
            }
        }
    }
}

fn split_key(raw: &str) -> Option<(&str, &str)> {
    match raw.split_once('.') {
        Some((section, key)) if !section.is_empty() && !key.is_empty() => Some((section, key)),
        _ => {
            eprintln!("error: expected <section>.<key>, got {raw:?}");
            None
        }
    }
}

fn init_console_logging() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
