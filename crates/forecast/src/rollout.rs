//! Autoregressive rollout over the opaque sequence model.
//!
//! Each step predicts one normalized value from the sliding window, maps it
//! back to mg/dL, then drops the oldest window entry and appends the
//! normalized prediction. Any failure discards the partial forecast.

use std::collections::VecDeque;

use glucocast_core::error::ModelError;
use glucocast_core::forecast::RawForecast;
use glucocast_core::model::ModelHandle;
use glucocast_core::series::{GlucoseSeries, HORIZON_STEPS};
use tracing::trace;

/// Run `HORIZON_STEPS` predictions starting from the series' trailing window.
pub fn rollout(handle: &ModelHandle, series: &GlucoseSeries) -> Result<RawForecast, ModelError> {
    let model = handle.model();
    let scaler = handle.scaler();
    let window_len = model.window_len();

    if window_len == 0 || window_len > series.len() {
        return Err(ModelError::WindowMismatch {
            model: model.name().to_string(),
            expected: window_len,
            got: series.len(),
        });
    }

    let tail = &series.values()[series.len() - window_len..];
    let mut window: VecDeque<f64> = tail.iter().map(|&v| scaler.transform(v)).collect();
    let mut predictions = Vec::with_capacity(HORIZON_STEPS);

    for step in 0..HORIZON_STEPS {
        let input = window.make_contiguous();
        let scaled = model.predict(input)?;
        if !scaled.is_finite() {
            return Err(ModelError::NonFinite {
                model: model.name().to_string(),
                step,
            });
        }

        let value = scaler.inverse_transform(scaled);
        if !value.is_finite() {
            return Err(ModelError::NonFinite {
                model: model.name().to_string(),
                step,
            });
        }
        trace!(model = model.name(), step, value, "rollout step");

        predictions.push(value);
        window.pop_front();
        window.push_back(scaled);
    }

    Ok(RawForecast::new(predictions))
}
