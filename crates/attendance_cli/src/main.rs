//! CLI probe for `attendance_core`.
//!
//! # Responsibility
//! - Verify core crate linkage.
//! - Evaluate one position against a deployment config:
//!   `attendance_cli --config <config.json> --lat <lat> --lon <lon> [--accuracy <m>]`.
//! - Write core logs to `$ATTENDANCE_LOG_DIR` when set.

use attendance_core::{AttendanceConfig, Coordinate, LocationVerifier, PositionSample};
use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(about = "Check one position against the configured office geofences")]
struct Args {
    #[arg(long)]
    config: PathBuf,

    #[arg(long, allow_negative_numbers = true)]
    lat: f64,

    #[arg(long, allow_negative_numbers = true)]
    lon: f64,

    /// Reported horizontal accuracy in meters. Omitted means unknown.
    #[arg(long)]
    accuracy: Option<f64>,
}

fn main() -> ExitCode {
    println!("attendance_core version={}", attendance_core::core_version());

    if let Ok(log_dir) = std::env::var("ATTENDANCE_LOG_DIR") {
        if let Err(err) = attendance_core::init_logging(attendance_core::default_log_level(), &log_dir)
        {
            eprintln!("warning: logging disabled: {err}");
        }
    }

    let args = Args::parse();
    match evaluate(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::from(2)
        }
    }
}

fn evaluate(args: &Args) -> Result<bool, String> {
    let config = AttendanceConfig::load(&args.config).map_err(|err| err.to_string())?;
    let coordinate = Coordinate::new(args.lat, args.lon);

    let site = config
        .resolve_site(coordinate)
        .ok_or_else(|| "config has no office sites".to_string())?;
    let sample = PositionSample::new(coordinate, args.accuracy, Utc::now());
    let result = LocationVerifier::new(config.max_accuracy_meters).verify(&sample, site);

    println!("site={}", site.name);
    println!("distance_m={:.1}", result.distance_meters);
    println!("within_radius={}", result.within_radius);
    println!("accuracy_acceptable={}", result.accuracy_acceptable);
    match result.rejection_reason() {
        None => println!("decision=accepted"),
        Some(reason) => println!("decision=rejected reason={reason}"),
    }
    Ok(result.accepted)
}
