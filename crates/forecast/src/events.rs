//! Hybrid event adjustment: heuristic curves for an upcoming meal or
//! activity layered on top of the model forecast.
//!
//! ```text
//! carbs:    +carbs/10 * 3.5/12 * (i - 2)   for i >= 3
//! activity: -25/12                         for i >= 2
//! ```
//!
//! Effects add up, then the result is re-constrained against the same anchor.

use glucocast_core::forecast::{ConstrainedForecast, EventContext};

use crate::constraints::constrain;

/// Rise per 10 g of carbohydrate over the hour, mg/dL.
pub const CARB_RISE_PER_10G: f64 = 3.5;

/// Steps before a meal starts to show.
pub const CARB_ONSET_STEP: usize = 3;

/// Total drop attributed to an activity over the hour, mg/dL.
pub const ACTIVITY_DROP: f64 = 25.0;

/// Steps before an activity starts to show.
pub const ACTIVITY_ONSET_STEP: usize = 2;

const SPREAD_STEPS: f64 = 12.0;

pub fn adjust(values: &[f64], anchor: f64, ctx: Option<&EventContext>) -> ConstrainedForecast {
    let mut adjusted = values.to_vec();

    if let Some(ctx) = ctx {
        if ctx.has_carbs() {
            let per_step = ctx.carbs / 10.0 * CARB_RISE_PER_10G / SPREAD_STEPS;
            for (i, v) in adjusted.iter_mut().enumerate().skip(CARB_ONSET_STEP) {
                *v += per_step * (i - (CARB_ONSET_STEP - 1)) as f64;
            }
        }

        if ctx.activity().is_some() {
            let per_step = ACTIVITY_DROP / SPREAD_STEPS;
            for v in adjusted.iter_mut().skip(ACTIVITY_ONSET_STEP) {
                *v -= per_step;
            }
        }
    }

    constrain(&adjusted, anchor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(value: f64) -> Vec<f64> {
        vec![value; 12]
    }

    #[test]
    fn no_context_only_constrains() {
        let out = adjust(&[130.0, 100.0], 100.0, None);
        assert_eq!(out.values(), &[104.0, 100.0]);
        let inactive = EventContext::new();
        assert_eq!(adjust(&[130.0, 100.0], 100.0, Some(&inactive)), out);
    }

    #[test]
    fn carbs_ramp_from_step_three() {
        let ctx = EventContext::new().with_carbs(60.0);
        let out = adjust(&flat(150.0), 150.0, Some(&ctx));
        let per_step = 60.0 / 10.0 * 3.5 / 12.0;
        assert_eq!(out.values()[..3], [150.0, 150.0, 150.0]);
        assert!((out.values()[3] - (150.0 + per_step)).abs() < 1e-9);
        assert!((out.values()[11] - (150.0 + 9.0 * per_step)).abs() < 1e-9);
    }

    #[test]
    fn activity_drops_from_step_two() {
        let ctx = EventContext::new().with_activity("walk", 30.0);
        let out = adjust(&flat(150.0), 150.0, Some(&ctx));
        assert_eq!(out.values()[..2], [150.0, 150.0]);
        for v in &out.values()[2..] {
            assert!((v - (150.0 - 25.0 / 12.0)).abs() < 1e-9);
        }
    }

    #[test]
    fn effects_are_additive() {
        let ctx = EventContext::new()
            .with_carbs(30.0)
            .with_activity("run", 20.0);
        let out = adjust(&flat(150.0), 150.0, Some(&ctx));
        let expected = 150.0 + 3.0 * 3.5 / 12.0 * 9.0 - 25.0 / 12.0;
        assert!((out.values()[11] - expected).abs() < 1e-9);
    }

    #[test]
    fn adjustment_is_re_constrained() {
        let ctx = EventContext::new().with_carbs(400.0);
        let out = adjust(&flat(100.0), 100.0, Some(&ctx));
        // 400 g would add 11.67 mg/dL at step 3, the delta bound caps it
        assert_eq!(out.values()[3], 104.0);

        let ctx = EventContext::new().with_activity("swim", 60.0);
        let out = adjust(&flat(41.0), 41.0, Some(&ctx));
        assert!(out.values().iter().all(|v| *v >= 40.0));
    }
}
