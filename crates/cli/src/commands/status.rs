// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `berth status` - registrations, named containers, daemon state.

use anyhow::{anyhow, Result};
use berth_daemon::{config, env, lifecycle, NamedContainerTable};

pub async fn status() -> Result<()> {
    let state_dir = env::state_dir().map_err(|e| anyhow!("{}", e))?;
    std::fs::create_dir_all(&state_dir)
        .map_err(|e| anyhow!("could not create state dir: {}", e))?;

    // The daemon holds the lock while running
    let running = lifecycle::acquire_lock(&state_dir).is_err();
    println!("Daemon: {}", if running { "running" } else { "not running" });

    let registrations =
        config::load_registrations(&env::registrations_path(&state_dir)).map_err(|e| anyhow!("{}", e))?;
    if registrations.is_empty() {
        println!("Registrations: none (run `berth register <owner/project>`)");
    } else {
        println!("Registrations:");
        for registration in &registrations {
            println!(
                "  {} as '{}' via {}",
                registration.slug(),
                registration.name,
                registration.server
            );
        }
    }

    let table =
        NamedContainerTable::load(env::containers_path(&state_dir)).map_err(|e| anyhow!("{}", e))?;
    let entries = table.entries();
    if entries.is_empty() {
        println!("Named containers: none");
    } else {
        println!("Named containers:");
        for entry in entries {
            println!(
                "  {} ({}) {}",
                entry.name,
                berth_core::short(&entry.container_id, 12),
                if entry.in_use { "in use" } else { "idle" }
            );
        }
    }
    Ok(())
}
