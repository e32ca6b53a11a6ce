//! `glucocast health`: forecast the fixed probe and print the report.

use std::path::Path;

use glucocast_forecast::{Forecaster, HealthStatus};

pub async fn run(
    config_path: Option<&Path>,
    user: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let registry = glucocast_models::build_from_config(&config)?;
    let handle = registry.resolve(user.as_deref());

    let report = Forecaster::from_config(handle, &config).health_check();
    println!("{}", serde_json::to_string_pretty(&report)?);

    match report.status {
        HealthStatus::Healthy => Ok(()),
        HealthStatus::Unhealthy => Err(format!(
            "model '{}' failed the health check",
            report.model
        )
        .into()),
    }
}
