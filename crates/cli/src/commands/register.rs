// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `berth register` - register this machine as a runner.

use anyhow::{anyhow, bail, Result};
use berth_core::RunnerRegistration;
use berth_daemon::{config, env, JobClient};
use clap::Args;

/// Default queue server, overridable per registration.
const DEFAULT_SERVER: &str = "https://queue.berth.dev";

#[derive(Args)]
pub struct RegisterArgs {
    /// Target as owner/project
    pub slug: String,

    /// Runner name (defaults to a server-assigned one)
    #[arg(long)]
    pub name: Option<String>,

    /// Queue server base URL
    #[arg(long, default_value = DEFAULT_SERVER)]
    pub server: String,
}

pub async fn register(args: RegisterArgs) -> Result<()> {
    let (owner, project) = parse_slug(&args.slug)?;

    let client = JobClient::new();
    let response = client
        .register(&args.server, owner, project, args.name.as_deref())
        .await
        .map_err(|e| anyhow!("{}", e))?;

    let registration = RunnerRegistration {
        server: args.server.clone(),
        owner: owner.to_string(),
        project: project.to_string(),
        id: response.id,
        name: response.name,
        token: response.token,
    };

    let state_dir = env::state_dir().map_err(|e| anyhow!("{}", e))?;
    let path = env::registrations_path(&state_dir);
    config::append_registration(&path, &registration).map_err(|e| anyhow!("{}", e))?;

    // The token itself stays in the registrations file only
    println!(
        "Registered runner '{}' for {} (id {})",
        registration.name,
        registration.slug(),
        registration.id
    );
    println!("Stored in {}", path.display());
    Ok(())
}

fn parse_slug(slug: &str) -> Result<(&str, &str)> {
    match slug.split_once('/') {
        Some((owner, project)) if !owner.is_empty() && !project.is_empty() => {
            Ok((owner, project))
        }
        _ => bail!("invalid target '{}' (expected owner/project)", slug),
    }
}

#[cfg(test)]
#[path = "register_tests.rs"]
mod tests;
