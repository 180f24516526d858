#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line interface for the geoscrub toolchain.
//!
//! Builds gazetteer snapshots from `GeoNames` dumps and runs resolution
//! queries against them. Query results are printed as JSON.
//!
//! Uses `indicatif-log-bridge` (via [`geoscrub_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and progress bars never fight for the terminal.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand};
use geoscrub_cli_utils::IndicatifProgress;
use geoscrub_gazetteer::{BuildSources, EnglishVariants, Gazetteer, build_snapshot, config};
use geoscrub_gazetteer_models::GazetteerConfig;
use geoscrub_scrub::{Resolver, ResolverOptions, verify};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "geoscrub", about = "City, state and country name resolution")]
struct Cli {
    /// Config file (defaults to `GEOSCRUB_CONFIG`, then `data/geoscrub.toml`)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Snapshot to read or write (overrides the config)
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a gazetteer snapshot from `GeoNames` dumps
    Build {
        /// `allCountries.txt`-style dumps, plain or zipped
        #[arg(long, required = true, num_args = 1..)]
        geonames: Vec<PathBuf>,
        /// `alternateNamesV2.txt`
        #[arg(long)]
        alternate_names: Option<PathBuf>,
        /// `countryInfo.txt`
        #[arg(long)]
        country_info: Option<PathBuf>,
        /// Postal-code dump
        #[arg(long)]
        postal_codes: Option<PathBuf>,
    },
    /// Find the best city for a possibly incomplete query
    Scrub {
        city: String,
        #[arg(long)]
        state: Option<String>,
        #[arg(long)]
        country: Option<String>,
    },
    /// Find the administrative division for a state name
    ScScrub {
        state: String,
        #[arg(long)]
        country: Option<String>,
    },
    /// List cities matching a query, relaxing it until something matches
    Find {
        city: String,
        #[arg(long)]
        state: Option<String>,
        #[arg(long)]
        country: Option<String>,
        /// Keep near-duplicate records
        #[arg(long)]
        no_dedup: bool,
        /// Also try alternate spellings of the city (never deduplicates)
        #[arg(long)]
        alternates: bool,
    },
    /// List divisions with a given name
    States {
        state: String,
        #[arg(long)]
        country: Option<String>,
    },
    /// Expand an abbreviation
    Expand {
        abbr: String,
        #[arg(long)]
        country: Option<String>,
    },
    /// Show a country's metadata
    Country { name: String },
    /// Run the embedded smoke tests against the snapshot
    Verify,
}

fn print_json(value: &impl Serialize) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn open_resolver(
    config: &GazetteerConfig,
    snapshot: PathBuf,
) -> Result<Resolver, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let gazetteer = Gazetteer::open(&snapshot)?;
    log::info!(
        "Opened {} in {:.1}s ({} entities)",
        snapshot.display(),
        start.elapsed().as_secs_f64(),
        gazetteer.store().len()
    );
    Ok(Resolver::with_options(
        Arc::new(gazetteer),
        ResolverOptions::from(config),
    ))
}

async fn build(
    snapshot: PathBuf,
    config: GazetteerConfig,
    sources: BuildSources,
    multi: &geoscrub_cli_utils::MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = snapshot.parent() {
        geoscrub_gazetteer::paths::ensure_dir(parent)?;
    }

    let start = Instant::now();
    let stats = build_snapshot(
        &snapshot,
        sources,
        config,
        Arc::new(EnglishVariants),
        IndicatifProgress::build_bars(multi),
    )
    .await?;
    log::info!(
        "Wrote {} in {:.1}s",
        snapshot.display(),
        start.elapsed().as_secs_f64()
    );
    print_json(&stats)
}

fn print_verify_report(report: &verify::SmokeTestReport) {
    for result in &report.results {
        let status = if result.passed { "PASS" } else { "FAIL" };
        println!(
            "{status} {:<45} -> {} ({})",
            result.query,
            result.matched.as_deref().unwrap_or("-"),
            result
                .score
                .map_or_else(|| "-".to_string(), |s| format!("{s:.2}")),
        );
        if let Some(reason) = &result.failure_reason {
            println!("     {reason}");
        }
    }
    println!("{}/{} passed", report.passed, report.total);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = geoscrub_cli_utils::init_logger();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => config::load_config_from(path)?,
        None => config::load_config()?,
    };
    let snapshot = cli
        .snapshot
        .unwrap_or_else(|| config::snapshot_path(&config));

    let command = match cli.command {
        Commands::Build {
            geonames,
            alternate_names,
            country_info,
            postal_codes,
        } => {
            let sources = BuildSources {
                geonames,
                alternate_names,
                country_info,
                postal_codes,
            };
            return build(snapshot, config, sources, &multi).await;
        }
        command => command,
    };

    let resolver = open_resolver(&config, snapshot)?;

    match command {
        Commands::Build { .. } => {}
        Commands::Scrub {
            city,
            state,
            country,
        } => {
            let result = resolver.scrub(Some(city), state, country).await?;
            print_json(&result)?;
        }
        Commands::ScScrub { state, country } => {
            print_json(&resolver.sc_scrub(&state, country.as_deref()))?;
        }
        Commands::Find {
            city,
            state,
            country,
            no_dedup,
            alternates,
        } => {
            let found = if alternates {
                resolver.list(Some(&city), state.as_deref(), country.as_deref())?
            } else {
                resolver.find_with_dedup(
                    Some(&city),
                    state.as_deref(),
                    country.as_deref(),
                    !no_dedup,
                )?
            };
            print_json(&found)?;
        }
        Commands::States { state, country } => {
            print_json(&resolver.find_states(&state, country.as_deref())?)?;
        }
        Commands::Expand { abbr, country } => {
            print_json(&resolver.expand(&abbr, country.as_deref())?)?;
        }
        Commands::Country { name } => {
            print_json(resolver.country_info(&name)?)?;
        }
        Commands::Verify => {
            let report = verify::run_smoke_tests(&resolver)?;
            print_verify_report(&report);
            if !report.all_passed() {
                return Err("smoke tests failed".into());
            }
        }
    }

    Ok(())
}
