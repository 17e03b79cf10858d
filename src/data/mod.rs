pub mod features;
pub mod loader;
pub mod preprocessing;
pub mod synthetic;

use serde::{Deserialize, Serialize};

/// Number of model input features
pub const NUM_FEATURES: usize = 5;

/// Feature names in the fixed column order fed to the model
pub const FEATURE_NAMES: [&str; NUM_FEATURES] = [
    "Cycle_Irregular",
    "Marker_Score",
    "Family_History",
    "Voice_Jitter",
    "BMI",
];

/// Feature column indices
pub const IDX_CYCLE_IRREGULAR: usize = 0;
pub const IDX_MARKER_SCORE: usize = 1;
pub const IDX_FAMILY_HISTORY: usize = 2;
pub const IDX_VOICE_JITTER: usize = 3;
pub const IDX_BMI: usize = 4;

/// Raw column headers (after trimming) expected in the source table
pub const COL_CYCLE: &str = "Cycle(R/I)";
pub const COL_HAIR_GROWTH: &str = "hair growth(Y/N)";
pub const COL_SKIN_DARKENING: &str = "Skin darkening (Y/N)";
pub const COL_HAIR_LOSS: &str = "Hair loss(Y/N)";
pub const COL_PIMPLES: &str = "Pimples(Y/N)";
pub const COL_BMI: &str = "BMI";
pub const COL_LABEL: &str = "PCOS (Y/N)";

/// Optional measured columns for the otherwise-synthetic features
pub const COL_VOICE_JITTER: &str = "Voice_Jitter";
pub const COL_FAMILY_HISTORY: &str = "Family_History";

/// One subject row as read from the raw table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubjectRecord {
    /// Cycle regularity code (2 = regular, 4 = irregular)
    pub cycle_code: Option<f32>,
    /// Binary symptom indicator: excess hair growth
    pub hair_growth: Option<f32>,
    /// Binary symptom indicator: skin darkening
    pub skin_darkening: Option<f32>,
    /// Binary symptom indicator: hair loss
    pub hair_loss: Option<f32>,
    /// Binary symptom indicator: pimples
    pub pimples: Option<f32>,
    /// Body mass index
    pub bmi: Option<f32>,
    /// Measured voice jitter, when the table provides it
    pub voice_jitter: Option<f32>,
    /// Measured family history indicator, when the table provides it
    pub family_history: Option<f32>,
    /// Diagnosis label (1 = PCOS, 0 = control)
    pub label: Option<u8>,
}

impl SubjectRecord {
    /// Check if the record carries the raw fields feature derivation needs
    pub fn has_feature_fields(&self) -> bool {
        self.cycle_code.is_some()
            && self.hair_growth.is_some()
            && self.skin_darkening.is_some()
            && self.hair_loss.is_some()
            && self.pimples.is_some()
            && self.bmi.is_some()
    }

    /// Check if the record carries every field the training pipeline needs
    pub fn is_complete(&self) -> bool {
        self.has_feature_fields() && self.label.is_some()
    }

    /// Check if both normally-synthetic columns were measured
    pub fn has_measured_synthetic(&self) -> bool {
        self.voice_jitter.is_some() && self.family_history.is_some()
    }
}

/// Derived feature row ready for synthetic injection and training.
///
/// Rows have no identity beyond their position in the source table.
/// The synthetic slots (`Family_History`, `Voice_Jitter`) are NaN until
/// [`synthetic::SyntheticSampler::inject`] fills them.
#[derive(Debug, Clone)]
pub struct FeatureRow {
    /// Feature values in [`FEATURE_NAMES`] order
    pub features: [f32; NUM_FEATURES],
    /// Ground-truth diagnosis label
    pub label: u8,
}

impl FeatureRow {
    /// Create a feature row with NaN synthetic slots
    pub fn new(cycle_irregular: f32, marker_score: f32, bmi: f32, label: u8) -> Self {
        let mut features = [f32::NAN; NUM_FEATURES];
        features[IDX_CYCLE_IRREGULAR] = cycle_irregular;
        features[IDX_MARKER_SCORE] = marker_score;
        features[IDX_BMI] = bmi;
        Self { features, label }
    }

    /// Check whether the synthetic columns have been filled
    pub fn is_injected(&self) -> bool {
        !self.features[IDX_FAMILY_HISTORY].is_nan() && !self.features[IDX_VOICE_JITTER].is_nan()
    }
}

/// Dataset split configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Held-out test set ratio
    pub test_ratio: f32,
    /// Random seed
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_ratio: 0.2,
            seed: 2026,
        }
    }
}

/// Dataset container
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Training rows
    pub train: Vec<FeatureRow>,
    /// Held-out test rows
    pub test: Vec<FeatureRow>,
}

impl Dataset {
    /// Create empty dataset
    pub fn new() -> Self {
        Self {
            train: Vec::new(),
            test: Vec::new(),
        }
    }

    /// Get total number of rows
    pub fn total_rows(&self) -> usize {
        self.train.len() + self.test.len()
    }

    /// Get positive-label count across both partitions
    pub fn positive_count(&self) -> usize {
        let count = |rows: &[FeatureRow]| rows.iter().filter(|r| r.label == 1).count();
        count(&self.train) + count(&self.test)
    }
}

impl Default for Dataset {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_row_new() {
        let row = FeatureRow::new(1.0, 30.0, 24.5, 1);

        assert_eq!(row.features[IDX_CYCLE_IRREGULAR], 1.0);
        assert_eq!(row.features[IDX_MARKER_SCORE], 30.0);
        assert_eq!(row.features[IDX_BMI], 24.5);
        assert!(row.features[IDX_FAMILY_HISTORY].is_nan());
        assert!(row.features[IDX_VOICE_JITTER].is_nan());
        assert!(!row.is_injected());
    }

    #[test]
    fn test_record_completeness() {
        let mut record = SubjectRecord::default();
        assert!(!record.is_complete());

        record.cycle_code = Some(2.0);
        record.hair_growth = Some(0.0);
        record.skin_darkening = Some(1.0);
        record.hair_loss = Some(0.0);
        record.pimples = Some(1.0);
        record.bmi = Some(22.0);
        assert!(record.has_feature_fields());
        assert!(!record.is_complete());

        record.label = Some(0);
        assert!(record.is_complete());

        assert!(!record.has_measured_synthetic());
        record.voice_jitter = Some(1.4);
        record.family_history = Some(0.0);
        assert!(record.has_measured_synthetic());
    }

    #[test]
    fn test_dataset_counts() {
        let mut dataset = Dataset::new();
        dataset.train.push(FeatureRow::new(0.0, 0.0, 20.0, 1));
        dataset.train.push(FeatureRow::new(1.0, 10.0, 25.0, 0));
        dataset.test.push(FeatureRow::new(1.0, 20.0, 30.0, 1));

        assert_eq!(dataset.total_rows(), 3);
        assert_eq!(dataset.positive_count(), 2);
    }
}
