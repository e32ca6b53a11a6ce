//! `glucocast forecast`: run the pipeline and print the result JSON.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use glucocast_config::AppConfig;
use glucocast_core::forecast::{EventContext, ForecastResult};
use glucocast_forecast::ForecastService;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Args)]
pub struct ForecastArgs {
    #[command(flatten)]
    pub source: HistorySource,

    /// Grams of carbohydrate about to be eaten
    #[arg(long)]
    pub carbs: Option<f64>,

    /// Planned activity, e.g. "walk" or "run"
    #[arg(long)]
    pub activity: Option<String>,

    /// Planned activity duration in minutes
    #[arg(long, requires = "activity")]
    pub duration: Option<f64>,

    /// Include trend analysis in the output
    #[arg(long)]
    pub analysis: bool,

    /// Seed the realism noise for reproducible output
    #[arg(long, conflicts_with = "no_noise")]
    pub seed: Option<u64>,

    /// Disable realism noise
    #[arg(long)]
    pub no_noise: bool,

    /// Pretty-print the JSON result
    #[arg(long)]
    pub pretty: bool,
}

/// Where the readings come from. Exactly one is required.
#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct HistorySource {
    /// Comma-separated readings in mg/dL, oldest first
    #[arg(long, value_name = "READINGS")]
    pub history: Option<String>,

    /// JSON file: an array of readings, or {"history": [...], "context": {...}}
    #[arg(long, value_name = "PATH")]
    pub history_file: Option<PathBuf>,

    /// Forecast from this user's stored history with their model
    #[arg(long, value_name = "ID")]
    pub user: Option<String>,
}

pub async fn run(
    config_path: Option<&Path>,
    args: ForecastArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config(config_path)?;
    apply_noise_flags(&mut config, &args);

    let service = build_service(&config)?;
    let flags_context = context_from_flags(&args);
    let include_analysis = args.analysis || config.forecast.include_analysis;

    let result = match (&args.source.history, &args.source.history_file, &args.source.user) {
        (Some(list), _, _) => {
            let history = parse_history_list(list);
            debug!(readings = history.len(), "Forecasting from --history");
            service
                .forecaster_for(None)
                .forecast_raw(&history, flags_context.as_ref(), include_analysis)
        }
        (_, Some(path), _) => {
            let (history, file_context) = read_history_file(path)?;
            let context = flags_context.or(file_context);
            debug!(readings = history.len(), path = %path.display(), "Forecasting from file");
            service
                .forecaster_for(None)
                .forecast_raw(&history, context.as_ref(), include_analysis)
        }
        (_, _, Some(user)) => {
            service
                .forecast_for_user(user, flags_context.as_ref(), include_analysis)
                .await
        }
        (None, None, None) => {
            return Err("one of --history, --history-file or --user is required".into());
        }
    };

    print_result(&result, args.pretty)?;
    if result.is_success() {
        Ok(())
    } else {
        Err(format!(
            "forecast failed: {}",
            result.error_message.as_deref().unwrap_or("unknown error")
        )
        .into())
    }
}

/// Registry and history store as configured, combined into a service.
pub fn build_service(config: &AppConfig) -> Result<ForecastService, Box<dyn std::error::Error>> {
    let registry = glucocast_models::build_from_config(config)?;
    let history = glucocast_history::build_from_config(config);
    Ok(ForecastService::new(Arc::new(registry), history, config))
}

fn apply_noise_flags(config: &mut AppConfig, args: &ForecastArgs) {
    if args.no_noise {
        config.noise.enabled = false;
    }
    if let Some(seed) = args.seed {
        config.noise.enabled = true;
        config.noise.seed = Some(seed);
    }
}

fn context_from_flags(args: &ForecastArgs) -> Option<EventContext> {
    if args.carbs.is_none() && args.activity.is_none() {
        return None;
    }
    let mut ctx = EventContext::new().with_carbs(args.carbs.unwrap_or(0.0));
    if let Some(activity) = &args.activity {
        ctx = ctx.with_activity(activity.clone(), args.duration.unwrap_or(0.0));
    }
    Some(ctx)
}

/// Split a comma list into raw tokens; the validator decides what is numeric.
fn parse_history_list(list: &str) -> Vec<Value> {
    if list.trim().is_empty() {
        return Vec::new();
    }
    list.split(',')
        .map(|token| Value::String(token.trim().to_string()))
        .collect()
}

fn read_history_file(
    path: &Path,
) -> Result<(Vec<Value>, Option<EventContext>), Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .map_err(|e| format!("Failed to parse {}: {e}", path.display()))?;

    match value {
        Value::Array(history) => Ok((history, None)),
        Value::Object(mut fields) => {
            let history = match fields.remove("history") {
                Some(Value::Array(history)) => history,
                _ => {
                    return Err(format!("{}: \"history\" must be an array", path.display()).into());
                }
            };
            let context = fields
                .remove("context")
                .filter(|c| !c.is_null())
                .map(serde_json::from_value::<EventContext>)
                .transpose()
                .map_err(|e| format!("{}: invalid context: {e}", path.display()))?;
            Ok((history, context))
        }
        _ => Err(format!("{}: expected a JSON array or object", path.display()).into()),
    }
}

fn print_result(result: &ForecastResult, pretty: bool) -> Result<(), serde_json::Error> {
    let json = if pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };
    println!("{json}");
    Ok(())
}
