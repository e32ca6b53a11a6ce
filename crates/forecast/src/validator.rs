//! History validation: the pipeline's only way to obtain a [`GlucoseSeries`].
//!
//! Invalid data fails closed; nothing is clamped or dropped. Large jumps
//! between consecutive readings are allowed through but reported.

use glucocast_core::error::ValidationError;
use glucocast_core::forecast::SuspiciousJump;
use glucocast_core::series::{GlucoseSeries, MAX_CHANGE_RATE, SUSPICIOUS_JUMP_FACTOR};
use serde_json::Value;
use tracing::warn;

/// A validated series plus the non-fatal findings made while checking it.
#[derive(Debug, Clone, PartialEq)]
pub struct Validated {
    pub series: GlucoseSeries,
    pub jumps: Vec<SuspiciousJump>,
}

/// Validate numeric readings, oldest first.
pub fn validate(values: &[f64]) -> Result<Validated, ValidationError> {
    let series = GlucoseSeries::try_new(values.to_vec())?;
    let jumps = suspicious_jumps(series.values());
    Ok(Validated { series, jumps })
}

/// Validate loosely-typed readings as they arrive in a JSON payload.
///
/// Numbers and numeric strings are accepted; anything else is
/// `InvalidValue`. Elements are checked in index order, so the first bad
/// element decides the error, whether it is malformed or out of range.
pub fn validate_json(values: &[Value]) -> Result<Validated, ValidationError> {
    if values.is_empty() {
        return Err(ValidationError::EmptyHistory);
    }
    if values.len() < glucocast_core::series::LOOK_BACK {
        return Err(ValidationError::InsufficientHistory { got: values.len() });
    }

    let mut coerced = Vec::with_capacity(values.len());
    for (index, value) in values.iter().enumerate() {
        let number = coerce(value).ok_or_else(|| ValidationError::InvalidValue {
            index,
            value: display_value(value),
        })?;
        // range-check now so an earlier out-of-range value wins over a later
        // malformed one
        GlucoseSeries::check_value(index, number)?;
        coerced.push(number);
    }
    validate(&coerced)
}

fn coerce(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Consecutive deltas above `MAX_CHANGE_RATE * SUSPICIOUS_JUMP_FACTOR`.
pub fn suspicious_jumps(values: &[f64]) -> Vec<SuspiciousJump> {
    let limit = MAX_CHANGE_RATE * SUSPICIOUS_JUMP_FACTOR;
    values
        .windows(2)
        .enumerate()
        .filter_map(|(i, pair)| {
            let delta = (pair[1] - pair[0]).abs();
            (delta > limit).then(|| {
                warn!(
                    index = i + 1,
                    delta,
                    "Large glucose change between consecutive readings"
                );
                SuspiciousJump {
                    index: i + 1,
                    delta,
                }
            })
        })
        .collect()
}
