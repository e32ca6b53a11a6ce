//! End-to-end pipeline scenarios against the deterministic drift model.

use std::sync::Arc;

use glucocast_core::error::ErrorKind;
use glucocast_core::forecast::{EventContext, ForecastStatus, Trend};
use glucocast_core::model::ModelHandle;
use glucocast_core::scaler::MinMaxScaler;
use glucocast_forecast::{Forecaster, GaussianNoise};
use glucocast_models::DriftModel;
use serde_json::json;

fn forecaster() -> Forecaster {
    Forecaster::new(ModelHandle::new(
        Arc::new(DriftModel::default()),
        MinMaxScaler::default(),
    ))
}

/// `[100, 102, ..., 122]`
fn rising_history() -> Vec<f64> {
    (0..12).map(|i| 100.0 + 2.0 * i as f64).collect()
}

#[test]
fn scenario_a_rising_history_without_events() {
    let result = forecaster().forecast(&rising_history(), None, true);

    assert_eq!(result.status, ForecastStatus::Success);
    assert_eq!(result.original_prediction.len(), 12);
    assert_eq!(result.adjusted_prediction.as_ref().map(Vec::len), Some(12));
    assert_eq!(result.last_known_glucose, Some(122.0));

    let analysis = result.analysis.as_ref().unwrap();
    assert_eq!(analysis.trend, Trend::Rising);
    assert!((analysis.slope - 2.0).abs() < 0.01);

    let metadata = result.metadata.as_ref().unwrap();
    assert_eq!(metadata.prediction_horizon_minutes, 60);
    assert_eq!(metadata.time_step_minutes, 5);
    assert!(metadata.notes.iter().any(|n| n == "Current trend: rising"));
}

#[test]
fn scenario_b_short_history() {
    let result = forecaster().forecast(&[110.0, 112.0, 114.0, 116.0, 118.0], None, false);

    assert_eq!(result.status, ForecastStatus::Error);
    assert_eq!(result.error_kind, Some(ErrorKind::InsufficientHistory));
    assert!(
        result
            .error_message
            .as_deref()
            .unwrap()
            .contains("Insufficient history")
    );
    assert!(result.original_prediction.is_empty());
}

#[test]
fn scenario_c_out_of_range_reading() {
    let mut history = rising_history();
    history[4] = 500.0;
    let result = forecaster().forecast(&history, None, false);

    assert_eq!(result.status, ForecastStatus::Error);
    assert_eq!(result.error_kind, Some(ErrorKind::OutOfRange));
    assert!(
        result
            .error_message
            .as_deref()
            .unwrap()
            .contains("outside valid range")
    );
    assert!(result.original_prediction.is_empty());
}

#[test]
fn scenario_d_carbs_raise_the_tail() {
    let ctx = EventContext::new().with_carbs(60.0);
    let result = forecaster().forecast(&rising_history(), Some(&ctx), false);

    let original = &result.original_prediction;
    let adjusted = result.adjusted_prediction.as_ref().unwrap();
    assert!(adjusted[11] > original[11]);
    assert_eq!(original[11], 146.0);
    assert_eq!(adjusted[11], 162.0);
    assert_eq!(adjusted[..3], original[..3]);

    let notes = &result.metadata.as_ref().unwrap().notes;
    assert!(notes.iter().any(|n| n.contains("60g carbs")));
}

#[test]
fn scenario_e_walk_lowers_the_curve() {
    let ctx = EventContext::new().with_activity("walk", 30.0);
    let result = forecaster().forecast(&rising_history(), Some(&ctx), false);

    let original = &result.original_prediction;
    let adjusted = result.adjusted_prediction.as_ref().unwrap();
    assert!(adjusted[5] < original[5]);
    assert!(adjusted.iter().all(|v| *v >= 40.0));
    assert_eq!(adjusted[..2], original[..2]);
}

#[test]
fn walk_near_the_floor_never_goes_below_forty() {
    let ctx = EventContext::new().with_activity("run", 45.0);
    let result = forecaster().forecast(&[42.0; 12], Some(&ctx), false);
    let adjusted = result.adjusted_prediction.unwrap();
    assert!(adjusted.iter().all(|v| *v >= 40.0));
    assert_eq!(adjusted[11], 40.0);
}

#[test]
fn error_result_json_shape() {
    let result = forecaster().forecast(&[], None, false);
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(
        json,
        json!({
            "status": "error",
            "originalPrediction": [],
            "errorMessage": "Empty glucose history provided",
            "errorKind": "empty_history"
        })
    );
}

#[test]
fn snake_case_event_payload_is_accepted() {
    let ctx: EventContext =
        serde_json::from_value(json!({"carbs": 50, "activity_type": "walk", "activity_duration": 30}))
            .unwrap();
    let result = forecaster().forecast(&rising_history(), Some(&ctx), false);
    assert!(result.is_success());
    assert_ne!(
        result.adjusted_prediction.as_ref(),
        Some(&result.original_prediction)
    );
}

#[test]
fn suspicious_jump_is_a_warning_not_an_error() {
    let mut history = rising_history();
    history[6] = 160.0;
    let result = forecaster().forecast(&history, None, false);
    assert!(result.is_success());
    let warnings = &result.metadata.as_ref().unwrap().warnings;
    assert_eq!(warnings.len(), 2);
    assert_eq!(warnings[0].index, 6);
}

#[test]
fn seeded_noise_is_reproducible_and_bounded() {
    let noisy = || {
        forecaster().with_noise(Arc::new(GaussianNoise::seeded(2024)), 0.02)
    };
    let a = noisy().forecast(&rising_history(), None, false);
    let b = noisy().forecast(&rising_history(), None, false);
    assert_eq!(a.original_prediction, b.original_prediction);
    assert!(a.original_prediction.iter().all(|v| (40.0..=400.0).contains(v)));
}

#[test]
fn longer_history_uses_trailing_window() {
    let mut history = vec![300.0; 20];
    history.extend(rising_history());
    let result = forecaster().forecast(&history, None, true);
    assert_eq!(result.input_length, Some(32));
    assert_eq!(result.original_prediction[0], 124.0);
    assert_eq!(result.analysis.unwrap().trend, Trend::Rising);
}
