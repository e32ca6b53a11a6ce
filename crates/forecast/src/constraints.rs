//! Physiological constraints on a forecast sequence.
//!
//! For step `i` with predecessor `prev` (the anchor at step 0):
//!
//! 1. clamp to `[prev - MAX_CHANGE_RATE, prev + MAX_CHANGE_RATE]`
//! 2. clamp to `[MIN_GLUCOSE, MAX_GLUCOSE]`
//!
//! Pure and total. A NaN input lands on the lower delta bound, since
//! `f64::max` ignores NaN.

use glucocast_core::forecast::ConstrainedForecast;
use glucocast_core::series::{MAX_CHANGE_RATE, MAX_GLUCOSE, MIN_GLUCOSE};

pub fn constrain(values: &[f64], anchor: f64) -> ConstrainedForecast {
    let mut prev = anchor;
    let constrained = values
        .iter()
        .map(|&raw| {
            let stepped = raw
                .max(prev - MAX_CHANGE_RATE)
                .min(prev + MAX_CHANGE_RATE);
            let bounded = stepped.max(MIN_GLUCOSE).min(MAX_GLUCOSE);
            prev = bounded;
            bounded
        })
        .collect();
    ConstrainedForecast::new(constrained, anchor)
}
