// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `berthd` - runner daemon entry point.

use berth_daemon::lifecycle::{self, StartOptions};

#[tokio::main]
async fn main() {
    if let Err(e) = lifecycle::run(StartOptions::default()).await {
        eprintln!("berthd: {}", e);
        std::process::exit(1);
    }
}
