// Keyscope
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Keyscope CLI Tool
//!
//! Scans a Redis keyspace and reports key counts and estimated sizes per prefix.

mod config;
mod render;

use clap::Parser;
use config::KeyscopeConfig;
use keyscope_core::{Classifier, InferenceHeuristic, PrefixRegistry, ProfileError, RedisKeyStore, SamplingPolicy, ScanCoordinator};
use std::path::PathBuf;
use std::process;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "keyscope")]
#[command(about = "Keyscope - Redis keyspace profiler")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file (TOML, defaults to $KEYSCOPE_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Redis host
    #[arg(long)]
    host: Option<String>,

    /// Redis port
    #[arg(long)]
    port: Option<u16>,

    /// Redis database
    #[arg(long)]
    db: Option<u32>,

    /// Redis password
    #[arg(long)]
    password: Option<String>,

    /// Full redis URL, overrides host/port/db/password
    #[arg(long)]
    url: Option<String>,

    /// Only scan keys matching this glob pattern
    #[arg(long = "match")]
    match_pattern: Option<String>,

    /// Batch size of the SCAN command
    #[arg(long)]
    scan_batch: Option<usize>,

    /// Limit of total keys scanned (0 = unlimited)
    #[arg(long)]
    limit: Option<u64>,

    /// Known prefixes file, one prefix per line (patterns are inferred when absent)
    #[arg(long)]
    prefixes: Option<PathBuf>,

    /// Pattern inference heuristic: hex-suffix or last-dot
    #[arg(long)]
    infer: Option<InferenceHeuristic>,

    /// Maximum number of unmatched keys to list
    #[arg(long)]
    max_unknowns: Option<usize>,

    /// Maximum number of keys introspected per group
    #[arg(long)]
    max_samples: Option<u64>,

    /// Sampling policy: first-n or reservoir
    #[arg(long)]
    sampling: Option<SamplingPolicy>,

    /// Seed for reservoir sampling
    #[arg(long)]
    seed: Option<u64>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn apply_overrides(&self, config: &mut KeyscopeConfig) {
        let connection = &mut config.connection;
        if let Some(host) = &self.host {
            connection.host = host.clone();
        }
        if let Some(port) = self.port {
            connection.port = port;
        }
        if let Some(db) = self.db {
            connection.db = db;
        }
        if let Some(password) = &self.password {
            connection.password = Some(password.clone());
        }
        if let Some(url) = &self.url {
            connection.url = Some(url.clone());
        }
        if let Some(pattern) = &self.match_pattern {
            connection.match_pattern = Some(pattern.clone());
        }

        if let Some(prefixes) = &self.prefixes {
            config.prefixes = Some(prefixes.clone());
        }

        let scan = &mut config.scan;
        if let Some(batch) = self.scan_batch {
            scan.scan_batch_size = batch;
        }
        if let Some(limit) = self.limit {
            scan.max_scans = limit;
        }
        if let Some(heuristic) = self.infer {
            scan.inference = heuristic;
        }
        if let Some(max_unknowns) = self.max_unknowns {
            scan.max_unknown_retained = max_unknowns;
        }
        if let Some(max_samples) = self.max_samples {
            scan.max_samples_per_group = max_samples;
        }
        if let Some(sampling) = self.sampling {
            scan.sampling = sampling;
        }
        if let Some(seed) = self.seed {
            scan.sampling_seed = seed;
        }
    }
}

fn main() {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        error!("exited with error: {:#}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = KeyscopeConfig::resolve_config(cli.config.clone())?;
    cli.apply_overrides(&mut config);
    config.scan.validate()?;

    let registry = config.prefixes.as_deref().map(PrefixRegistry::load_file).transpose()?;
    match &registry {
        Some(registry) if registry.is_empty() => warn!("Prefix file contains no prefixes, every key will be reported as unmatched"),
        Some(registry) => info!("Loaded {} known prefixes", registry.len()),
        None => info!("No prefix file given, inferring patterns ({})", config.scan.inference),
    }
    let classifier = Classifier::for_run(registry.as_ref(), config.scan.inference);

    info!("Connecting to {}", config.connection.display_target());
    let mut store = RedisKeyStore::connect(config.connection.connection_info()?).map_err(ProfileError::StoreConnection)?;
    if let Some(pattern) = &config.connection.match_pattern {
        store = store.with_match_pattern(pattern.clone());
    }

    let mut coordinator = ScanCoordinator::new(&mut store, classifier, &config.scan)?;
    coordinator.run()?;
    let report = coordinator.report()?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render::TextReport(&report));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from(["keyscope", "--host", "10.1.1.1", "--limit", "500", "--infer", "last-dot", "--sampling", "reservoir", "--match", "user:*"]);
        let mut config = KeyscopeConfig::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.connection.host, "10.1.1.1");
        assert_eq!(config.connection.match_pattern.as_deref(), Some("user:*"));
        assert_eq!(config.scan.max_scans, 500);
        assert_eq!(config.scan.inference, InferenceHeuristic::LastDot);
        assert_eq!(config.scan.sampling, SamplingPolicy::Reservoir);
        assert_eq!(config.scan.scan_batch_size, 1000);
        assert!(config.prefixes.is_none());
    }

    #[test]
    fn test_rejects_unknown_heuristic() {
        assert!(Cli::try_parse_from(["keyscope", "--infer", "regex"]).is_err());
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
