//! Forecast service: history store, model registry, and pipeline settings
//! combined behind per-user operations.

use std::sync::Arc;
use std::time::Duration;

use glucocast_config::AppConfig;
use glucocast_core::error::{ForecastError, HistoryError};
use glucocast_core::forecast::{EventContext, ForecastResult};
use glucocast_core::history::{GlucoseReading, HistoryProvider, reconcile};
use glucocast_models::ModelRegistry;
use tracing::{debug, info, warn};

use crate::deadline::forecast_with_deadline;
use crate::noise::{NoiseSource, source_from_config};
use crate::pipeline::Forecaster;

pub struct ForecastService {
    registry: Arc<ModelRegistry>,
    history: Arc<dyn HistoryProvider>,
    noise: Option<Arc<dyn NoiseSource>>,
    noise_factor: f64,
    round_output: bool,
    include_analysis: bool,
    history_limit: usize,
    deadline: Option<Duration>,
}

impl ForecastService {
    pub fn new(
        registry: Arc<ModelRegistry>,
        history: Arc<dyn HistoryProvider>,
        config: &AppConfig,
    ) -> Self {
        let deadline =
            (config.forecast.timeout_ms > 0).then(|| Duration::from_millis(config.forecast.timeout_ms));
        Self {
            registry,
            history,
            noise: source_from_config(&config.noise).map(Arc::from),
            noise_factor: config.noise.factor,
            round_output: config.forecast.round_output,
            include_analysis: config.forecast.include_analysis,
            history_limit: config.forecast.history_limit,
            deadline,
        }
    }

    /// Replace the configured noise source, e.g. to seed it per request.
    pub fn with_noise(mut self, source: Option<Arc<dyn NoiseSource>>) -> Self {
        self.noise = source;
        self
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn history(&self) -> &dyn HistoryProvider {
        self.history.as_ref()
    }

    /// A forecaster bound to the user's model, or the default model.
    pub fn forecaster_for(&self, user_id: Option<&str>) -> Forecaster {
        let forecaster =
            Forecaster::new(self.registry.resolve(user_id)).with_rounding(self.round_output);
        match &self.noise {
            Some(source) => forecaster.with_noise(source.clone(), self.noise_factor),
            None => forecaster,
        }
    }

    /// Forecast from the user's stored readings.
    pub async fn forecast_for_user(
        &self,
        user_id: &str,
        context: Option<&EventContext>,
        include_analysis: bool,
    ) -> ForecastResult {
        let readings = match self
            .history
            .recent_readings(user_id, self.history_limit)
            .await
        {
            Ok(readings) => readings,
            Err(e) => {
                warn!(user = user_id, error = %e, "Failed to read glucose history");
                return ForecastResult::failure(&ForecastError::Internal(format!(
                    "history store '{}' failed: {e}",
                    self.history.name()
                )));
            }
        };

        let values = reconcile(readings, self.history.order());
        debug!(user = user_id, readings = values.len(), "Loaded glucose history");

        let forecaster = self.forecaster_for(Some(user_id));
        let result = self
            .run(forecaster, values, context.cloned(), include_analysis)
            .await;
        if result.is_success() {
            info!(user = user_id, "Forecast served");
        }
        result
    }

    /// Forecast from caller-supplied readings with the default model.
    pub async fn forecast_values(
        &self,
        values: Vec<f64>,
        context: Option<&EventContext>,
        include_analysis: bool,
    ) -> ForecastResult {
        let forecaster = self.forecaster_for(None);
        self.run(forecaster, values, context.cloned(), include_analysis)
            .await
    }

    /// Store a reading for a user.
    pub async fn record(&self, user_id: &str, reading: GlucoseReading) -> Result<(), HistoryError> {
        self.history.record(user_id, reading).await
    }

    async fn run(
        &self,
        forecaster: Forecaster,
        values: Vec<f64>,
        context: Option<EventContext>,
        include_analysis: bool,
    ) -> ForecastResult {
        let include_analysis = include_analysis || self.include_analysis;
        match self.deadline {
            Some(deadline) => {
                forecast_with_deadline(
                    Arc::new(forecaster),
                    values,
                    context,
                    include_analysis,
                    deadline,
                )
                .await
            }
            None => forecaster.forecast(&values, context.as_ref(), include_analysis),
        }
    }
}
