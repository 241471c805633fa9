// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `berth start` - run the runner daemon in the foreground.

use anyhow::{anyhow, Result};
use berth_daemon::lifecycle::{self, StartOptions};
use clap::Args;
use std::time::Duration;

#[derive(Args)]
pub struct StartArgs {
    /// Seconds between job polls
    #[arg(long = "polling-interval", value_name = "SECONDS")]
    pub polling_interval: Option<u64>,
}

pub async fn start(args: StartArgs) -> Result<()> {
    let options = StartOptions {
        poll_interval: args.polling_interval.map(Duration::from_secs),
    };
    lifecycle::run(options).await.map_err(|e| anyhow!("{}", e))
}
