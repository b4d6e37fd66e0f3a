// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! aires - AI Error Resolution System CLI
//!
//! `run` starts the unattended watchdog service (the default command);
//! `once` processes a single file; `status` prints aggregated health;
//! `config` reads and writes the INI file.
//!
//! Exit codes: 0 success, 2 config error, 3 unhealthy, 4 bad input.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

pub(crate) const EXIT_OK: u8 = 0;
pub(crate) const EXIT_FAILURE: u8 = 1;
pub(crate) const EXIT_CONFIG: u8 = 2;
pub(crate) const EXIT_UNHEALTHY: u8 = 3;
pub(crate) const EXIT_BAD_INPUT: u8 = 4;

#[derive(Parser)]
#[command(
    name = "aires",
    version,
    about = "AIRES - turns compiler output into AI research booklets"
)]
struct Cli {
    /// Path to the INI configuration file
    #[arg(
        short = 'c',
        long = "config",
        global = true,
        value_name = "FILE",
        default_value = "config/aires.ini"
    )]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the watchdog service (default)
    Run(commands::RunArgs),
    /// Process a single build-output file and exit
    Once(commands::OnceArgs),
    /// Print aggregated component health
    Status,
    /// Read or write configuration values
    Config(commands::ConfigArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let code = match cli.command {
        None => commands::run(&cli.config, commands::RunArgs::default()).await,
        Some(Commands::Run(args)) => commands::run(&cli.config, args).await,
        Some(Commands::Once(args)) => commands::once(&cli.config, args).await,
        Some(Commands::Status) => commands::status(&cli.config).await,
        Some(Commands::Config(args)) => commands::config(&cli.config, args),
    };
    ExitCode::from(code)
}
