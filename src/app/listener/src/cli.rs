// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::path::PathBuf;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub const DEFAULT_CONFIG_PATH: &str = "claims-listener.yaml";

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Claims records that reach the target status and hands them to the
/// configured handler exactly once
#[derive(Debug, clap::Parser)]
#[command(name = "claims-listener", version, about)]
pub struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, env = "CLAIMS_LISTENER_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// PostgreSQL connection URL, takes precedence over the configuration
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Apply bundled database migrations before starting
    #[arg(long)]
    pub migrate: bool,

    /// Log claimed records instead of invoking the configured handler.
    /// Records are still claimed in the database.
    #[arg(long)]
    pub dry_run: bool,
}
