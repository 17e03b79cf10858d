//! Label-conditioned synthetic feature injection.
//!
//! `Voice_Jitter` and `Family_History` are not measured anywhere in the raw
//! table; they are fabricated per row from distributions conditioned on the
//! diagnosis label. Sampling takes an explicit random source so a fixed seed
//! reproduces the exact dataset.

use crate::data::{FeatureRow, IDX_FAMILY_HISTORY, IDX_VOICE_JITTER};
use anyhow::{Context, Result};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use tracing::debug;

/// Voice jitter distribution for positive-label rows
pub const JITTER_POS_MEAN: f32 = 2.5;
pub const JITTER_POS_STD: f32 = 0.8;
/// Voice jitter distribution for negative-label rows
pub const JITTER_NEG_MEAN: f32 = 1.2;
pub const JITTER_NEG_STD: f32 = 0.4;

/// Family history indicator value when present
pub const FAMILY_HISTORY_VALUE: f32 = 15.0;
/// Probability of a family history for positive-label rows
pub const FAMILY_POS_PROB: f64 = 0.6;
/// Probability of a family history for negative-label rows
pub const FAMILY_NEG_PROB: f64 = 0.2;

/// Samples the two synthetic feature columns
pub struct SyntheticSampler {
    jitter_pos: Normal<f32>,
    jitter_neg: Normal<f32>,
}

impl SyntheticSampler {
    /// Create a sampler with the fixed distribution parameters
    pub fn new() -> Result<Self> {
        Ok(Self {
            jitter_pos: Normal::new(JITTER_POS_MEAN, JITTER_POS_STD)
                .context("Invalid positive jitter distribution")?,
            jitter_neg: Normal::new(JITTER_NEG_MEAN, JITTER_NEG_STD)
                .context("Invalid negative jitter distribution")?,
        })
    }

    /// Sample a voice jitter value conditioned on the label.
    ///
    /// Unclamped Gaussian noise; negative values are possible and accepted.
    pub fn sample_voice_jitter<R: Rng + ?Sized>(&self, label: u8, rng: &mut R) -> f32 {
        if label == 1 {
            self.jitter_pos.sample(rng)
        } else {
            self.jitter_neg.sample(rng)
        }
    }

    /// Sample a family history value conditioned on the label
    pub fn sample_family_history<R: Rng + ?Sized>(&self, label: u8, rng: &mut R) -> f32 {
        let p = if label == 1 {
            FAMILY_POS_PROB
        } else {
            FAMILY_NEG_PROB
        };
        if rng.gen_bool(p) {
            FAMILY_HISTORY_VALUE
        } else {
            0.0
        }
    }

    /// Fill any unfilled synthetic slots, independently per row.
    ///
    /// Measured values already present in a row pass through untouched.
    pub fn inject<R: Rng + ?Sized>(&self, rows: &mut [FeatureRow], rng: &mut R) {
        for row in rows.iter_mut() {
            if row.features[IDX_VOICE_JITTER].is_nan() {
                row.features[IDX_VOICE_JITTER] = self.sample_voice_jitter(row.label, rng);
            }
            if row.features[IDX_FAMILY_HISTORY].is_nan() {
                row.features[IDX_FAMILY_HISTORY] = self.sample_family_history(row.label, rng);
            }
        }
        debug!("Injected synthetic features into {} rows", rows.len());
    }
}
