//! Trend and confidence analysis over the input window.
//!
//! - ordinary least squares of value against index `0..n`
//! - population standard deviation as variability
//! - `confidence = clamp(100 - 2 * std - 5 * |slope|, 30, 100)`
//!
//! Classification and confidence use unrounded statistics; reported values
//! are rounded (slope 2 dp, confidence 1 dp, variability 2 dp, r² 3 dp).

use glucocast_core::forecast::{Trend, TrendAnalysis};

/// |slope| below this is a stable trend, in mg/dL per step.
pub const TREND_THRESHOLD: f64 = 0.5;

pub const MIN_CONFIDENCE: f64 = 30.0;
pub const MAX_CONFIDENCE: f64 = 100.0;

pub fn analyze(window: &[f64]) -> TrendAnalysis {
    let n = window.len() as f64;
    if window.is_empty() {
        return TrendAnalysis {
            slope: 0.0,
            trend: Trend::Stable,
            confidence: MIN_CONFIDENCE,
            variability: 0.0,
            r_squared: 0.0,
            range: 0.0,
        };
    }

    let mean_x = (n - 1.0) / 2.0;
    let mean_y = window.iter().sum::<f64>() / n;

    let (mut sxx, mut sxy, mut syy) = (0.0, 0.0, 0.0);
    for (i, &y) in window.iter().enumerate() {
        let dx = i as f64 - mean_x;
        let dy = y - mean_y;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }

    let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
    let r_squared = if sxx > 0.0 && syy > 0.0 {
        (sxy * sxy) / (sxx * syy)
    } else {
        0.0
    };
    let std_dev = (syy / n).sqrt();

    let max = window.iter().copied().fold(f64::MIN, f64::max);
    let min = window.iter().copied().fold(f64::MAX, f64::min);

    let confidence =
        (100.0 - 2.0 * std_dev - 5.0 * slope.abs()).clamp(MIN_CONFIDENCE, MAX_CONFIDENCE);

    TrendAnalysis {
        slope: round_to(slope, 2),
        trend: classify(slope),
        confidence: round_to(confidence, 1),
        variability: round_to(std_dev, 2),
        r_squared: round_to(r_squared, 3),
        range: round_to(max - min, 2),
    }
}

pub fn classify(slope: f64) -> Trend {
    if slope.abs() < TREND_THRESHOLD {
        Trend::Stable
    } else if slope > 0.0 {
        Trend::Rising
    } else {
        Trend::Falling
    }
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(start: f64, step: f64) -> Vec<f64> {
        (0..12).map(|i| start + step * i as f64).collect()
    }

    #[test]
    fn rising_ramp() {
        let a = analyze(&ramp(100.0, 2.0));
        assert_eq!(a.slope, 2.0);
        assert_eq!(a.trend, Trend::Rising);
        assert_eq!(a.r_squared, 1.0);
        assert_eq!(a.range, 22.0);
        // population std of 0,2,..,22 is sqrt(143/3)
        assert_eq!(a.variability, 6.9);
        assert_eq!(a.confidence, 76.2);
    }

    #[test]
    fn range_is_rounded_like_variability() {
        let mut window = vec![110.0; 12];
        window[0] = 100.123;
        window[11] = 122.4567;
        let a = analyze(&window);
        assert_eq!(a.range, 22.33);
    }

    #[test]
    fn falling_ramp() {
        let a = analyze(&ramp(200.0, -1.0));
        assert_eq!(a.slope, -1.0);
        assert_eq!(a.trend, Trend::Falling);
    }

    #[test]
    fn flat_window_is_stable_with_zero_r_squared() {
        let a = analyze(&[120.0; 12]);
        assert_eq!(a.slope, 0.0);
        assert_eq!(a.trend, Trend::Stable);
        assert_eq!(a.r_squared, 0.0);
        assert_eq!(a.variability, 0.0);
        assert_eq!(a.confidence, 100.0);
    }

    #[test]
    fn threshold_is_inclusive_for_movement() {
        assert_eq!(classify(0.5), Trend::Rising);
        assert_eq!(classify(-0.5), Trend::Falling);
        assert_eq!(classify(0.49), Trend::Stable);
        assert_eq!(classify(-0.49), Trend::Stable);
    }

    #[test]
    fn confidence_floors_at_thirty() {
        let wild: Vec<f64> = (0..12)
            .map(|i| if i % 2 == 0 { 60.0 } else { 300.0 })
            .collect();
        let a = analyze(&wild);
        assert_eq!(a.confidence, MIN_CONFIDENCE);
        assert!(a.variability > 100.0);
    }

    #[test]
    fn classification_uses_unrounded_slope() {
        // slope 0.4965 rounds to 0.5 but is still stable
        let window = ramp(100.0, 0.4965);
        let a = analyze(&window);
        assert_eq!(a.slope, 0.5);
        assert_eq!(a.trend, Trend::Stable);
    }

    #[test]
    fn rounding_helper() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(1.23456, 3), 1.235);
        assert_eq!(round_to(-0.456, 1), -0.5);
    }
}
