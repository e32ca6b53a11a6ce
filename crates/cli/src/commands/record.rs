//! `glucocast record`: store a glucose reading for a user.

use std::path::Path;

use chrono::{DateTime, Utc};
use clap::Args;
use glucocast_core::history::GlucoseReading;
use glucocast_core::series::GlucoseSeries;
use tracing::{info, warn};

#[derive(Debug, Args)]
pub struct RecordArgs {
    /// User the reading belongs to
    #[arg(short, long)]
    pub user: String,

    /// Glucose value in mg/dL
    #[arg(long)]
    pub value: f64,

    /// When the reading was taken (RFC 3339); defaults to now
    #[arg(long, value_parser = parse_timestamp)]
    pub at: Option<DateTime<Utc>>,
}

pub async fn run(
    config_path: Option<&Path>,
    args: RecordArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;

    GlucoseSeries::check_value(0, args.value).map_err(|e| format!("Rejected reading: {e}"))?;

    let history = glucocast_history::build_from_config(&config);
    if history.name() == "in_memory" {
        warn!("history.backend is \"memory\"; the reading will not outlive this process");
    }

    let reading = match args.at {
        Some(at) => GlucoseReading::new(args.value, at),
        None => GlucoseReading::now(args.value),
    };
    let recorded_at = reading.recorded_at;
    history.record(&args.user, reading).await?;

    info!(user = %args.user, value = args.value, store = history.name(), "Reading recorded");
    println!(
        "Recorded {} mg/dL for user {} at {}",
        args.value,
        args.user,
        recorded_at.to_rfc3339()
    );
    Ok(())
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp: {e}"))
}
