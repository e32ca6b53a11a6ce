//! Min-max normalization: the scaling a model was trained with.
//!
//! `x' = lo + (x - data_min) * (hi - lo) / (data_max - data_min)`

use serde::{Deserialize, Serialize};

use crate::series::{MAX_GLUCOSE, MIN_GLUCOSE};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    pub data_min: f64,
    pub data_max: f64,
    #[serde(default = "default_feature_range")]
    pub feature_range: (f64, f64),
}

fn default_feature_range() -> (f64, f64) {
    (0.0, 1.0)
}

impl Default for MinMaxScaler {
    /// Scales the full physiological range onto `[0, 1]`.
    fn default() -> Self {
        Self {
            data_min: MIN_GLUCOSE,
            data_max: MAX_GLUCOSE,
            feature_range: default_feature_range(),
        }
    }
}

impl MinMaxScaler {
    pub fn new(data_min: f64, data_max: f64) -> Self {
        Self {
            data_min,
            data_max,
            feature_range: default_feature_range(),
        }
    }

    /// Multiplier from data units to feature units.
    ///
    /// A degenerate fit (constant training data) scales by 1, matching how
    /// the training library handles a zero data range.
    fn scale(&self) -> f64 {
        let data_range = self.data_max - self.data_min;
        let (lo, hi) = self.feature_range;
        if data_range == 0.0 {
            1.0
        } else {
            (hi - lo) / data_range
        }
    }

    pub fn transform(&self, value: f64) -> f64 {
        self.feature_range.0 + (value - self.data_min) * self.scale()
    }

    pub fn inverse_transform(&self, value: f64) -> f64 {
        (value - self.feature_range.0) / self.scale() + self.data_min
    }

    /// Reject parameters that would make scaling non-invertible.
    pub fn validate(&self) -> Result<(), String> {
        let (lo, hi) = self.feature_range;
        if ![self.data_min, self.data_max, lo, hi]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err("scaler parameters must be finite".into());
        }
        if self.data_max < self.data_min {
            return Err(format!(
                "data_max ({}) is below data_min ({})",
                self.data_max, self.data_min
            ));
        }
        if hi <= lo {
            return Err(format!("feature_range ({lo}, {hi}) is empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_maps_physiological_range_to_unit_interval() {
        let scaler = MinMaxScaler::default();
        assert_eq!(scaler.transform(40.0), 0.0);
        assert_eq!(scaler.transform(400.0), 1.0);
        assert!((scaler.transform(220.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn inverse_undoes_transform() {
        let scaler = MinMaxScaler {
            data_min: 55.0,
            data_max: 310.0,
            feature_range: (-1.0, 1.0),
        };
        for v in [55.0, 100.0, 183.5, 310.0] {
            assert!((scaler.inverse_transform(scaler.transform(v)) - v).abs() < 1e-9);
        }
    }

    #[test]
    fn degenerate_fit_uses_unit_scale() {
        let scaler = MinMaxScaler::new(120.0, 120.0);
        assert_eq!(scaler.transform(121.0), 1.0);
        assert_eq!(scaler.inverse_transform(1.0), 121.0);
        assert!(scaler.validate().is_ok());
    }

    #[test]
    fn parses_artifact_json() {
        let scaler: MinMaxScaler =
            serde_json::from_str(r#"{"data_min": 62.0, "data_max": 288.0}"#).unwrap();
        assert_eq!(scaler.feature_range, (0.0, 1.0));
        assert!(scaler.validate().is_ok());
    }

    #[test]
    fn rejects_inverted_parameters() {
        assert!(MinMaxScaler::new(300.0, 100.0).validate().is_err());
        let empty = MinMaxScaler {
            feature_range: (1.0, 1.0),
            ..MinMaxScaler::default()
        };
        assert!(empty.validate().is_err());
    }
}
