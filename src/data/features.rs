//! Deterministic feature derivation from raw subject records.

use crate::data::{FeatureRow, SubjectRecord, IDX_FAMILY_HISTORY, IDX_VOICE_JITTER};
use anyhow::{bail, Result};
use tracing::{info, warn};

/// Cycle code for a regular menstrual cycle
pub const CYCLE_CODE_REGULAR: f32 = 2.0;
/// Cycle code for an irregular menstrual cycle
pub const CYCLE_CODE_IRREGULAR: f32 = 4.0;
/// Scale applied to the symptom indicator sum
pub const MARKER_SCALE: f32 = 10.0;

/// Policy for cycle codes other than 2 or 4.
///
/// The raw data encodes only the two values; anything else is a data defect
/// that must be handled explicitly rather than propagated as an undefined
/// feature value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CycleCodePolicy {
    /// Drop the row with a warning
    #[default]
    Skip,
    /// Treat an unmapped code as a fatal error
    Strict,
}

/// Outcome of feature derivation
#[derive(Debug, Clone)]
pub struct DeriveOutcome {
    /// Derived feature rows (synthetic slots still unfilled)
    pub rows: Vec<FeatureRow>,
    /// Rows dropped for missing raw fields
    pub skipped_missing: usize,
    /// Rows dropped for an unmapped cycle code
    pub skipped_cycle: usize,
}

/// Derives the model features from raw records
pub struct FeatureBuilder {
    policy: CycleCodePolicy,
    allow_unlabeled: bool,
}

impl FeatureBuilder {
    /// Create a builder with the default (skip) cycle-code policy
    pub fn new() -> Self {
        Self {
            policy: CycleCodePolicy::default(),
            allow_unlabeled: false,
        }
    }

    /// Set the cycle-code policy
    pub fn with_policy(mut self, policy: CycleCodePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Keep unlabeled rows that carry both measured synthetic columns.
    ///
    /// For prediction inputs. The placeholder label on such rows is 0 and
    /// carries no meaning; without measured columns an unlabeled row still
    /// drops, since the synthetic sampler conditions on the label.
    pub fn allow_unlabeled(mut self) -> Self {
        self.allow_unlabeled = true;
        self
    }

    /// Derive feature rows from raw records.
    ///
    /// Rows with missing raw fields are dropped. Measured `Voice_Jitter` and
    /// `Family_History` values pass through into their feature slots; rows
    /// without them keep NaN there for the sampler. Unmapped cycle codes are
    /// handled per the configured [`CycleCodePolicy`].
    pub fn derive(&self, records: &[SubjectRecord]) -> Result<DeriveOutcome> {
        let mut rows = Vec::with_capacity(records.len());
        let mut skipped_missing = 0;
        let mut skipped_cycle = 0;

        for (i, record) in records.iter().enumerate() {
            if !record.has_feature_fields() {
                skipped_missing += 1;
                continue;
            }
            let label = match record.label {
                Some(label) => label,
                None if self.allow_unlabeled && record.has_measured_synthetic() => 0,
                None => {
                    skipped_missing += 1;
                    continue;
                }
            };

            // has_feature_fields guarantees every field below
            let cycle_code = record.cycle_code.unwrap_or_default();
            let cycle_irregular = match map_cycle_code(cycle_code) {
                Some(v) => v,
                None => match self.policy {
                    CycleCodePolicy::Skip => {
                        warn!("Row {}: unmapped cycle code {}, skipping", i, cycle_code);
                        skipped_cycle += 1;
                        continue;
                    }
                    CycleCodePolicy::Strict => {
                        bail!("Row {}: unmapped cycle code {}", i, cycle_code);
                    }
                },
            };

            let marker = marker_score(
                record.hair_growth.unwrap_or_default(),
                record.skin_darkening.unwrap_or_default(),
                record.hair_loss.unwrap_or_default(),
                record.pimples.unwrap_or_default(),
            );

            let mut row = FeatureRow::new(cycle_irregular, marker, record.bmi.unwrap_or_default(), label);
            if let Some(v) = record.voice_jitter {
                row.features[IDX_VOICE_JITTER] = v;
            }
            if let Some(v) = record.family_history {
                row.features[IDX_FAMILY_HISTORY] = v;
            }
            rows.push(row);
        }

        if skipped_missing > 0 || skipped_cycle > 0 {
            info!(
                "Derived {} feature rows ({} dropped for missing fields, {} for unmapped cycle codes)",
                rows.len(),
                skipped_missing,
                skipped_cycle
            );
        } else {
            info!("Derived {} feature rows", rows.len());
        }

        Ok(DeriveOutcome {
            rows,
            skipped_missing,
            skipped_cycle,
        })
    }
}

impl Default for FeatureBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Map the raw cycle regularity code to a 0/1 feature value
pub fn map_cycle_code(code: f32) -> Option<f32> {
    if code == CYCLE_CODE_REGULAR {
        Some(0.0)
    } else if code == CYCLE_CODE_IRREGULAR {
        Some(1.0)
    } else {
        None
    }
}

/// Sum the four binary symptom indicators, scaled by 10
pub fn marker_score(hair_growth: f32, skin_darkening: f32, hair_loss: f32, pimples: f32) -> f32 {
    (hair_growth + skin_darkening + hair_loss + pimples) * MARKER_SCALE
}
