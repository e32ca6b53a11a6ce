//! Forecast value objects: everything a pipeline invocation produces.
//!
//! All types here are request-scoped: created and discarded within one
//! forecast call, never mutated after the stage that builds them returns.

use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, ForecastError};
use crate::series::{MAX_CHANGE_RATE, MAX_GLUCOSE, MIN_GLUCOSE};

/// Model output before any constraint or adjustment, one value per step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawForecast {
    values: Vec<f64>,
}

impl RawForecast {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A forecast whose every value is within the physiological bounds and
/// within `MAX_CHANGE_RATE` of its predecessor (the anchor for step 0).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstrainedForecast {
    values: Vec<f64>,
    anchor: f64,
}

impl ConstrainedForecast {
    /// Wrap values produced by the constraint enforcer.
    ///
    /// The invariants are checked in debug builds only, and only for an
    /// anchor inside the physiological bounds; callers outside the enforcer
    /// should go through it instead.
    pub fn new(values: Vec<f64>, anchor: f64) -> Self {
        debug_assert!(
            !(MIN_GLUCOSE..=MAX_GLUCOSE).contains(&anchor) || satisfies_constraints(&values, anchor)
        );
        Self { values, anchor }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    pub fn anchor(&self) -> f64 {
        self.anchor
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Whether `values` respects the bound and per-step delta limits.
///
/// A small tolerance absorbs floating-point error from `prev ± 4` arithmetic.
pub fn satisfies_constraints(values: &[f64], anchor: f64) -> bool {
    const EPS: f64 = 1e-9;
    let mut prev = anchor;
    for &v in values {
        if !(MIN_GLUCOSE - EPS..=MAX_GLUCOSE + EPS).contains(&v) {
            return false;
        }
        if (v - prev).abs() > MAX_CHANGE_RATE + EPS {
            return false;
        }
        prev = v;
    }
    true
}

/// Direction of the recent glucose trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Stable,
    Rising,
    Falling,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Stable => "stable",
            Trend::Rising => "rising",
            Trend::Falling => "falling",
        }
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptive statistics over the input window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendAnalysis {
    /// OLS slope in mg/dL per step
    pub slope: f64,

    pub trend: Trend,

    /// 30–100; lower for noisier or steeper windows
    pub confidence: f64,

    /// Population standard deviation of the window, mg/dL
    pub variability: f64,

    pub r_squared: f64,

    /// max − min of the window, mg/dL
    pub range: f64,
}

/// A hypothetical near-future event that is not yet reflected in history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventContext {
    /// Grams of carbohydrate about to be eaten
    #[serde(default)]
    pub carbs: f64,

    /// Kind of planned activity ("walk", "run", ...)
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "activity_type")]
    pub activity_type: Option<String>,

    #[serde(
        default,
        alias = "activity_duration_minutes",
        alias = "activity_duration"
    )]
    pub activity_duration_minutes: f64,
}

impl EventContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_carbs(mut self, carbs: f64) -> Self {
        self.carbs = carbs;
        self
    }

    pub fn with_activity(mut self, activity_type: impl Into<String>, minutes: f64) -> Self {
        self.activity_type = Some(activity_type.into());
        self.activity_duration_minutes = minutes;
        self
    }

    /// Carbs count only when positive and finite.
    pub fn has_carbs(&self) -> bool {
        self.carbs.is_finite() && self.carbs > 0.0
    }

    /// The planned activity, if one is named (blank names are ignored).
    pub fn activity(&self) -> Option<&str> {
        self.activity_type
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
    }

    /// Whether this context changes the forecast at all.
    pub fn is_active(&self) -> bool {
        self.has_carbs() || self.activity().is_some()
    }

    /// Human-readable summary for response notes.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if self.has_carbs() {
            parts.push(format!("{}g carbs", self.carbs));
        }
        if let Some(activity) = self.activity() {
            if self.activity_duration_minutes > 0.0 {
                parts.push(format!(
                    "{activity} for {} min",
                    self.activity_duration_minutes
                ));
            } else {
                parts.push(activity.to_string());
            }
        }
        if parts.is_empty() {
            "none".into()
        } else {
            parts.join(", ")
        }
    }
}

/// A historical delta large enough to be suspicious but not to block a forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuspiciousJump {
    /// Index of the later reading of the pair
    pub index: usize,
    /// Absolute change in mg/dL
    pub delta: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForecastStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastMetadata {
    pub prediction_horizon_minutes: u32,
    pub time_step_minutes: u32,
    pub model_confidence: f64,

    /// Name of the model that produced the rollout
    pub model: String,

    pub notes: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<SuspiciousJump>,
}

/// The externally visible output of one forecast request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastResult {
    pub status: ForecastStatus,

    pub original_prediction: Vec<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adjusted_prediction: Option<Vec<f64>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_known_glucose: Option<f64>,

    /// Number of readings the request supplied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_length: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<TrendAnalysis>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ForecastMetadata>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl ForecastResult {
    /// The short-circuit shape for any failed request: no partial output.
    pub fn failure(err: &ForecastError) -> Self {
        Self {
            status: ForecastStatus::Error,
            original_prediction: Vec::new(),
            adjusted_prediction: None,
            last_known_glucose: None,
            input_length: None,
            analysis: None,
            metadata: None,
            error_message: Some(err.to_string()),
            error_kind: Some(err.kind()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ForecastStatus::Success
    }
}
