//! Realism noise: cosmetic variability on top of a constrained forecast.
//!
//! Each step gets one zero-mean Gaussian perturbation with standard deviation
//! `baseline * factor`. The same draws are added to every series derived
//! from that baseline, so the gap between them is unchanged. Results are
//! clamped to the physiological bounds; the delta bound is not re-applied.

use std::sync::Mutex;

use glucocast_config::NoiseConfig;
use glucocast_core::series::{MAX_GLUCOSE, MIN_GLUCOSE};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

pub const DEFAULT_NOISE_FACTOR: f64 = 0.02;

/// A source of zero-mean perturbations.
pub trait NoiseSource: Send + Sync {
    fn name(&self) -> &str;

    /// Draw one perturbation with the given standard deviation.
    fn sample(&self, std_dev: f64) -> f64;
}

/// Gaussian perturbations from a seeded generator or the thread RNG.
pub struct GaussianNoise {
    seeded: Option<Mutex<StdRng>>,
}

impl GaussianNoise {
    /// Reproducible draws.
    pub fn seeded(seed: u64) -> Self {
        Self {
            seeded: Some(Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }

    /// Draws from the thread-local generator.
    pub fn from_entropy() -> Self {
        Self { seeded: None }
    }
}

impl NoiseSource for GaussianNoise {
    fn name(&self) -> &str {
        "gaussian"
    }

    fn sample(&self, std_dev: f64) -> f64 {
        if !std_dev.is_finite() || std_dev <= 0.0 {
            return 0.0;
        }
        let z: f64 = match &self.seeded {
            Some(rng) => match rng.lock() {
                Ok(mut rng) => rng.sample(StandardNormal),
                Err(poisoned) => poisoned.into_inner().sample(StandardNormal),
            },
            None => rand::rng().sample(StandardNormal),
        };
        z * std_dev
    }
}

/// Always zero; used when noise is disabled.
pub struct NoNoise;

impl NoiseSource for NoNoise {
    fn name(&self) -> &str {
        "none"
    }

    fn sample(&self, _std_dev: f64) -> f64 {
        0.0
    }
}

/// Build the source described by `[noise]`, or `None` when disabled.
pub fn source_from_config(config: &NoiseConfig) -> Option<Box<dyn NoiseSource>> {
    if !config.enabled || config.factor == 0.0 {
        return None;
    }
    Some(match config.seed {
        Some(seed) => Box::new(GaussianNoise::seeded(seed)),
        None => Box::new(GaussianNoise::from_entropy()),
    })
}

/// One draw per step, scaled by the baseline value at that step.
pub fn perturbations(baseline: &[f64], factor: f64, source: &dyn NoiseSource) -> Vec<f64> {
    baseline.iter().map(|&v| source.sample(v * factor)).collect()
}

/// Add precomputed draws step by step and clamp to the bounds.
pub fn apply_perturbations(values: &[f64], draws: &[f64]) -> Vec<f64> {
    values
        .iter()
        .zip(draws)
        .map(|(v, d)| (v + d).clamp(MIN_GLUCOSE, MAX_GLUCOSE))
        .collect()
}

pub fn add_noise(values: &[f64], factor: f64, source: &dyn NoiseSource) -> Vec<f64> {
    apply_perturbations(values, &perturbations(values, factor, source))
}
