//! Caller-imposed deadlines.
//!
//! The pipeline is CPU-bound, so it runs on the blocking pool. When the
//! deadline passes first the caller gets a `Timeout` result; the rollout
//! finishes in the background and its output is dropped.

use std::sync::Arc;
use std::time::Duration;

use glucocast_core::error::ForecastError;
use glucocast_core::forecast::{EventContext, ForecastResult};
use tracing::warn;

use crate::pipeline::Forecaster;

pub async fn forecast_with_deadline(
    forecaster: Arc<Forecaster>,
    history: Vec<f64>,
    context: Option<EventContext>,
    include_analysis: bool,
    deadline: Duration,
) -> ForecastResult {
    let task = tokio::task::spawn_blocking(move || {
        forecaster.forecast(&history, context.as_ref(), include_analysis)
    });

    match tokio::time::timeout(deadline, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => {
            warn!(error = %join_error, "Forecast task failed");
            ForecastResult::failure(&ForecastError::Internal(format!(
                "forecast task failed: {join_error}"
            )))
        }
        Err(_) => {
            let timeout_ms = u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX);
            warn!(timeout_ms, "Forecast deadline exceeded");
            ForecastResult::failure(&ForecastError::Timeout { timeout_ms })
        }
    }
}
