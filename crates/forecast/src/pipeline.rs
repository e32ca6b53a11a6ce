//! The forecasting pipeline.
//!
//! ```text
//! validate → rollout → constrain → baseline ─────────────── [+ noise] → original
//!                ↘ analyze (raw input window)   ↘ adjust(event context) → [+ noise] → adjusted
//! ```
//!
//! Both series receive the same per-step noise draws, so `adjusted - original`
//! is the event heuristic alone (up to clamping at the bounds).
//!
//! Every entry point returns a [`ForecastResult`]; failures are folded into
//! the error shape and never escape as `Err` or a panic.

use std::sync::Arc;

use glucocast_config::AppConfig;
use glucocast_core::error::{ForecastError, ValidationError};
use glucocast_core::forecast::{EventContext, ForecastResult};
use glucocast_core::model::ModelHandle;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::analysis::analyze;
use crate::assembler::{AssemblyOptions, PipelineOutput, assemble};
use crate::constraints::constrain;
use crate::events::adjust;
use crate::noise::{
    DEFAULT_NOISE_FACTOR, NoiseSource, apply_perturbations, perturbations, source_from_config,
};
use crate::rollout::rollout;
use crate::validator::{Validated, validate, validate_json};

/// The fixed probe the health check forecasts from.
pub const HEALTH_PROBE: [f64; 12] = [
    100.0, 102.0, 104.0, 106.0, 108.0, 110.0, 112.0, 114.0, 116.0, 118.0, 120.0, 122.0,
];

/// Runs the pipeline against one model handle.
///
/// Cheap to clone; the handle and noise source are shared.
#[derive(Clone)]
pub struct Forecaster {
    handle: ModelHandle,
    noise: Option<Arc<dyn NoiseSource>>,
    noise_factor: f64,
    round_output: bool,
}

impl Forecaster {
    /// A deterministic forecaster: no noise, rounded output.
    pub fn new(handle: ModelHandle) -> Self {
        Self {
            handle,
            noise: None,
            noise_factor: DEFAULT_NOISE_FACTOR,
            round_output: true,
        }
    }

    /// Apply realism noise to the baseline forecast.
    pub fn with_noise(mut self, source: Arc<dyn NoiseSource>, factor: f64) -> Self {
        self.noise = Some(source);
        self.noise_factor = factor;
        self
    }

    pub fn with_rounding(mut self, round_output: bool) -> Self {
        self.round_output = round_output;
        self
    }

    /// Noise and rounding as configured.
    pub fn from_config(handle: ModelHandle, config: &AppConfig) -> Self {
        let mut forecaster = Self::new(handle).with_rounding(config.forecast.round_output);
        if let Some(source) = source_from_config(&config.noise) {
            forecaster = forecaster.with_noise(Arc::from(source), config.noise.factor);
        }
        forecaster
    }

    pub fn handle(&self) -> &ModelHandle {
        &self.handle
    }

    pub fn noise_enabled(&self) -> bool {
        self.noise.is_some()
    }

    /// Forecast from numeric readings, oldest first.
    pub fn forecast(
        &self,
        history: &[f64],
        context: Option<&EventContext>,
        include_analysis: bool,
    ) -> ForecastResult {
        self.finish(validate(history), history.len(), context, include_analysis)
    }

    /// Forecast from loosely-typed readings (numbers or numeric strings).
    pub fn forecast_raw(
        &self,
        history: &[Value],
        context: Option<&EventContext>,
        include_analysis: bool,
    ) -> ForecastResult {
        self.finish(validate_json(history), history.len(), context, include_analysis)
    }

    /// Just the baseline prediction; empty on any error.
    pub fn forecast_simple(&self, history: &[f64]) -> Vec<f64> {
        let result = self.forecast(history, None, false);
        if result.is_success() {
            result.original_prediction
        } else {
            Vec::new()
        }
    }

    /// Forecast the fixed rising probe and report whether it succeeded.
    pub fn health_check(&self) -> HealthReport {
        let result = self.forecast(&HEALTH_PROBE, None, false);
        let healthy = result.is_success();
        if !healthy {
            warn!(
                model = self.handle.name(),
                error = result.error_message.as_deref().unwrap_or_default(),
                "Health check forecast failed"
            );
        }
        HealthReport {
            status: if healthy {
                HealthStatus::Healthy
            } else {
                HealthStatus::Unhealthy
            },
            model: self.handle.name().to_string(),
            scaler_range: (self.handle.scaler().data_min, self.handle.scaler().data_max),
            noise_enabled: self.noise_enabled(),
            test_prediction_success: healthy,
            error: result.error_message,
        }
    }

    fn finish(
        &self,
        validated: Result<Validated, ValidationError>,
        input_length: usize,
        context: Option<&EventContext>,
        include_analysis: bool,
    ) -> ForecastResult {
        let outcome = validated
            .map_err(ForecastError::from)
            .and_then(|v| self.run(v, input_length, context, include_analysis));
        match outcome {
            Ok(result) => result,
            Err(e) => {
                info!(kind = ?e.kind(), error = %e, "Forecast failed");
                ForecastResult::failure(&e)
            }
        }
    }

    fn run(
        &self,
        validated: Validated,
        input_length: usize,
        context: Option<&EventContext>,
        include_analysis: bool,
    ) -> Result<ForecastResult, ForecastError> {
        let Validated { series, jumps } = validated;
        let anchor = series.last();

        let raw = rollout(&self.handle, &series)?;
        let baseline = constrain(raw.values(), anchor);
        let analysis = analyze(series.window());

        let event_adjusted = context
            .filter(|c| c.is_active())
            .map(|ctx| adjust(baseline.values(), anchor, Some(ctx)));

        let (original, adjusted) = match &self.noise {
            Some(source) => {
                let draws = perturbations(baseline.values(), self.noise_factor, source.as_ref());
                let original = apply_perturbations(baseline.values(), &draws);
                let adjusted = match &event_adjusted {
                    Some(a) => apply_perturbations(a.values(), &draws),
                    None => original.clone(),
                };
                (original, adjusted)
            }
            None => {
                let original = baseline.into_values();
                let adjusted = match event_adjusted {
                    Some(a) => a.into_values(),
                    None => original.clone(),
                };
                (original, adjusted)
            }
        };

        debug!(
            model = self.handle.name(),
            trend = %analysis.trend,
            adjusted = context.is_some_and(EventContext::is_active),
            "Forecast complete"
        );

        Ok(assemble(
            PipelineOutput {
                original,
                adjusted,
                last_known: anchor,
                input_length,
                analysis,
                model: self.handle.name(),
                context,
                jumps,
            },
            AssemblyOptions {
                include_analysis,
                round_output: self.round_output,
            },
        ))
    }
}

impl std::fmt::Debug for Forecaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Forecaster")
            .field("handle", &self.handle)
            .field("noise", &self.noise.as_ref().map(|n| n.name().to_string()))
            .field("noise_factor", &self.noise_factor)
            .field("round_output", &self.round_output)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub model: String,
    pub scaler_range: (f64, f64),
    pub noise_enabled: bool,
    pub test_prediction_success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use glucocast_core::error::{ErrorKind, ModelError};
    use glucocast_core::model::SequenceModel;
    use glucocast_core::scaler::MinMaxScaler;
    use glucocast_core::series::HORIZON_STEPS;
    use glucocast_models::DriftModel;
    use serde_json::json;

    use crate::noise::GaussianNoise;

    fn drift() -> Forecaster {
        Forecaster::new(ModelHandle::new(
            Arc::new(DriftModel::default()),
            MinMaxScaler::default(),
        ))
    }

    struct Broken;

    impl SequenceModel for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn predict(&self, _window: &[f64]) -> Result<f64, ModelError> {
            Err(ModelError::Inference {
                model: "broken".into(),
                reason: "missing weights".into(),
            })
        }
    }

    #[test]
    fn health_input_forecast_continues_the_ramp() {
        let result = drift().forecast(&HEALTH_PROBE, None, true);
        assert!(result.is_success());
        let expected: Vec<f64> = (0..HORIZON_STEPS).map(|i| 124.0 + 2.0 * i as f64).collect();
        assert_eq!(result.original_prediction, expected);
        assert_eq!(result.adjusted_prediction, Some(expected));
        assert_eq!(result.last_known_glucose, Some(122.0));
        assert_eq!(result.input_length, Some(12));
        assert!(result.analysis.is_some());
    }

    #[test]
    fn metadata_present_without_analysis() {
        let result = drift().forecast(&HEALTH_PROBE, None, false);
        assert!(result.analysis.is_none());
        assert_eq!(result.metadata.unwrap().model, "drift");
    }

    #[test]
    fn raw_forecast_coerces_strings() {
        let history: Vec<Value> = HEALTH_PROBE.iter().map(|v| json!(v.to_string())).collect();
        assert!(drift().forecast_raw(&history, None, false).is_success());
    }

    #[test]
    fn model_failure_is_error_result() {
        let forecaster = Forecaster::new(ModelHandle::new(Arc::new(Broken), MinMaxScaler::default()));
        let result = forecaster.forecast(&HEALTH_PROBE, None, false);
        assert!(!result.is_success());
        assert_eq!(result.error_kind, Some(ErrorKind::ModelInference));
        assert!(result.original_prediction.is_empty());
        assert!(result.metadata.is_none());
    }

    #[test]
    fn simple_forecast_is_empty_on_error() {
        assert_eq!(drift().forecast_simple(&HEALTH_PROBE).len(), HORIZON_STEPS);
        assert!(drift().forecast_simple(&[120.0; 3]).is_empty());
    }

    #[test]
    fn health_check_reports_status() {
        let report = drift().health_check();
        assert_eq!(report.status, HealthStatus::Healthy);
        assert_eq!(report.model, "drift");
        assert!(report.test_prediction_success);
        assert!(!report.noise_enabled);

        let broken = Forecaster::new(ModelHandle::new(Arc::new(Broken), MinMaxScaler::default()));
        let report = broken.health_check();
        assert_eq!(report.status, HealthStatus::Unhealthy);
        assert!(report.error.unwrap().contains("missing weights"));
    }

    #[test]
    fn inactive_context_leaves_adjusted_equal() {
        let ctx = EventContext::new().with_carbs(0.0);
        let result = drift().forecast(&HEALTH_PROBE, Some(&ctx), false);
        assert_eq!(
            result.adjusted_prediction.as_deref(),
            Some(result.original_prediction.as_slice())
        );
        assert_eq!(result.metadata.unwrap().notes.len(), 3);
    }

    #[test]
    fn noise_does_not_change_the_event_gap() {
        let ctx = EventContext::new().with_activity("walk", 30.0);
        let quiet = drift().with_rounding(false).forecast(&HEALTH_PROBE, Some(&ctx), false);
        let noisy = drift()
            .with_rounding(false)
            .with_noise(Arc::new(GaussianNoise::seeded(0)), DEFAULT_NOISE_FACTOR)
            .forecast(&HEALTH_PROBE, Some(&ctx), false);

        let quiet_adjusted = quiet.adjusted_prediction.unwrap();
        let noisy_adjusted = noisy.adjusted_prediction.unwrap();
        assert_ne!(noisy.original_prediction, quiet.original_prediction);
        for i in 0..HORIZON_STEPS {
            let quiet_gap = quiet_adjusted[i] - quiet.original_prediction[i];
            let noisy_gap = noisy_adjusted[i] - noisy.original_prediction[i];
            assert!((quiet_gap - noisy_gap).abs() < 1e-9, "step {i}");
            assert!(noisy_adjusted[i] <= noisy.original_prediction[i], "step {i}");
        }
        assert!(noisy_adjusted[2] < noisy.original_prediction[2]);
    }

    #[test]
    fn config_controls_noise_and_rounding() {
        let mut config = AppConfig::default();
        config.noise.seed = Some(11);
        config.forecast.round_output = false;
        let handle = ModelHandle::new(Arc::new(DriftModel::default()), MinMaxScaler::default());

        let a = Forecaster::from_config(handle.clone(), &config).forecast(&HEALTH_PROBE, None, false);
        let b = Forecaster::from_config(handle, &config).forecast(&HEALTH_PROBE, None, false);
        assert_eq!(a.original_prediction, b.original_prediction);
        assert!(a.original_prediction.iter().any(|v| v.fract() != 0.0));
    }
}
