// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `berth` - provision development containers and manage the runner.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod commands;

use clap::{Parser, Subcommand};
use commands::{register, spawn, start, status};

#[derive(Parser)]
#[command(name = "berth", version, about = "Development container provisioner and job runner")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Spawn (or reuse) a development container for a project
    Spawn(spawn::SpawnArgs),
    /// Register this machine as a runner for owner/project
    Register(register::RegisterArgs),
    /// Start the runner daemon (foreground)
    Start(start::StartArgs),
    /// Show registrations, named containers, and daemon state
    Status,
}

#[tokio::main]
async fn main() {
    // Usage failures exit 1 like every other failure; --help/--version
    // exit 0.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    let result = match cli.command {
        Command::Spawn(args) => spawn::spawn(args).await,
        Command::Register(args) => register::register(args).await,
        Command::Start(args) => start::start(args).await,
        Command::Status => status::status().await,
    };

    if let Err(e) = result {
        eprintln!("berth: {:#}", e);
        std::process::exit(1);
    }
}
