//! Sailing-safety: vessel-specific sea-safety verdicts from marine forecasts.
//!
//! Single-binary Tokio application that:
//! 1. Fetches marine and atmospheric forecasts (with wind-based wave estimates offshore)
//! 2. Scores current and upcoming conditions for a vessel class
//! 3. Scans grids around a point and routes between two points
//! 4. Prints the result as JSON on stdout

mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info, warn};

use common::{Coordinate, Error, ServiceConfig, VesselClass};
use safety::{assess_payload, AssessOptions, AssessmentOutcome};
use spatial::SafetyService;

/// Sailing safety assessment
#[derive(Parser)]
#[command(name = "sailing-safety", about = "Vessel-specific sailing safety from marine forecasts")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch live forecasts for a point and assess them.
    Assess {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
        /// small_boat | fishing_boat | large_vessel (Indonesian names accepted).
        #[arg(long)]
        vessel: Option<String>,
    },
    /// Assess a stored forecast JSON document without network access.
    AssessFile {
        #[arg(long)]
        path: PathBuf,
        #[arg(long)]
        vessel: Option<String>,
    },
    /// Score an N×N grid around a point.
    Grid {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
        #[arg(long, default_value_t = 25.0)]
        radius_km: f64,
        #[arg(long, default_value_t = 5)]
        size: usize,
        #[arg(long)]
        vessel: Option<String>,
    },
    /// Score waypoints along a straight route.
    Route {
        #[arg(long, allow_negative_numbers = true)]
        from_lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        from_lon: f64,
        #[arg(long, allow_negative_numbers = true)]
        to_lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        to_lon: f64,
        #[arg(long, default_value_t = 10)]
        waypoints: usize,
        #[arg(long)]
        vessel: Option<String>,
    },
    /// Archived wind and estimated waves for recent days.
    History {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
        #[arg(long, default_value_t = 7)]
        days: u32,
    },
}

fn resolve_vessel(requested: Option<&str>, cfg: &ServiceConfig) -> VesselClass {
    let raw = requested.unwrap_or(&cfg.default_vessel);
    match raw.parse::<VesselClass>() {
        Ok(class) => class,
        Err(_) => {
            warn!("Unknown vessel class '{}', using {}", raw, VesselClass::default());
            VesselClass::default()
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(command: Command, cfg: &ServiceConfig, service: &SafetyService) -> Result<(), Error> {
    match command {
        Command::Assess { lat, lon, vessel } => {
            let vessel = resolve_vessel(vessel.as_deref(), cfg);
            info!("Assessing ({lat},{lon}) for {}", vessel.label());
            let outcome: AssessmentOutcome =
                service.assess_point(Coordinate::new(lat, lon), vessel).await.into();
            if let Some(err) = &outcome.error {
                warn!("Assessment failed: {}", err);
            }
            print_json(&outcome)
        }
        Command::AssessFile { path, vessel } => {
            let raw = std::fs::read_to_string(&path)?;
            let payload: serde_json::Value = serde_json::from_str(&raw)?;
            let vessel = vessel.unwrap_or_else(|| cfg.default_vessel.clone());
            let outcome = assess_payload(&payload, &vessel, &AssessOptions::from(&cfg.forecast));
            if let Some(err) = &outcome.error {
                warn!("Assessment of {} failed: {}", path.display(), err);
            }
            print_json(&outcome)
        }
        Command::Grid {
            lat,
            lon,
            radius_km,
            size,
            vessel,
        } => {
            let vessel = resolve_vessel(vessel.as_deref(), cfg);
            let grid = service
                .generate_safety_grid(Coordinate::new(lat, lon), radius_km, size, vessel)
                .await?;
            print_json(&grid)
        }
        Command::Route {
            from_lat,
            from_lon,
            to_lat,
            to_lon,
            waypoints,
            vessel,
        } => {
            let vessel = resolve_vessel(vessel.as_deref(), cfg);
            let route = service
                .generate_safety_route(
                    Coordinate::new(from_lat, from_lon),
                    Coordinate::new(to_lat, to_lon),
                    waypoints,
                    vessel,
                )
                .await?;
            print_json(&route)
        }
        Command::History { lat, lon, days } => {
            let history = service.history(Coordinate::new(lat, lon), days).await?;
            print_json(&history)
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "sailing_safety=info,marine_client=info,safety=info,spatial=info".into()
            }),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Load configuration.
    let cfg = match config::load_config() {
        Ok(c) => c,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    info!(
        "Upstream: marine={}, weather={}, cache_ttl={}s, {} req/s",
        cfg.upstream.marine_url,
        cfg.upstream.weather_url,
        cfg.cache.ttl_secs,
        cfg.upstream.requests_per_second,
    );

    let service = match SafetyService::new(&cfg) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to initialize forecast client: {}", e);
            std::process::exit(1);
        }
    };

    let result = run(cli.command, &cfg, &service).await;

    let stats = service.cache_stats();
    info!("Cache: {} entries, ttl={}s", stats.size, stats.ttl);

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}
