pub mod predictor;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Prediction result for a single subject row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskPrediction {
    /// Zero-based row index in the source table
    pub row: usize,
    /// Predicted PCOS probability
    pub probability: f32,
    /// Binary prediction (0 or 1)
    pub prediction: u8,
    /// Confidence score (distance from decision boundary)
    pub confidence: f32,
}

impl RiskPrediction {
    /// Create new risk prediction at the given threshold
    pub fn new(row: usize, probability: f32, threshold: f32) -> Self {
        let prediction = if probability >= threshold { 1 } else { 0 };
        let confidence = (probability - threshold).abs() * 2.0;

        Self {
            row,
            probability,
            prediction,
            confidence: confidence.min(1.0),
        }
    }

    /// Check if prediction is positive
    pub fn is_positive(&self) -> bool {
        self.prediction == 1
    }

    /// Get prediction as string
    pub fn prediction_label(&self) -> &'static str {
        if self.is_positive() {
            "pcos_risk"
        } else {
            "low_risk"
        }
    }
}

/// Batch prediction results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchPredictionResult {
    /// Per-row predictions
    pub predictions: Vec<RiskPrediction>,
    /// Summary statistics
    pub summary: PredictionSummary,
}

impl BatchPredictionResult {
    /// Create new batch prediction result
    pub fn new(predictions: Vec<RiskPrediction>) -> Self {
        let summary = PredictionSummary::from_predictions(&predictions);
        Self {
            predictions,
            summary,
        }
    }

    /// Get positive predictions only
    pub fn get_positive_predictions(&self) -> Vec<&RiskPrediction> {
        self.predictions.iter().filter(|p| p.is_positive()).collect()
    }

    /// Export to CSV format
    pub fn to_csv(&self) -> String {
        let mut csv = String::from("row,probability,prediction,confidence\n");

        for pred in &self.predictions {
            csv.push_str(&format!(
                "{},{:.6},{},{:.6}\n",
                pred.row, pred.probability, pred.prediction, pred.confidence
            ));
        }

        csv
    }

    /// Write predictions to a CSV file
    pub fn save_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_csv())
            .with_context(|| format!("Failed to write predictions to {:?}", path))
    }

    /// Write predictions to a JSON file
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize predictions")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write predictions to {:?}", path))
    }
}

/// Prediction summary statistics
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PredictionSummary {
    /// Total number of predictions
    pub total_predictions: usize,
    /// Number of positive predictions
    pub positive_predictions: usize,
    /// Number of negative predictions
    pub negative_predictions: usize,
    /// Proportion of positive predictions
    pub positive_rate: f64,
    /// Average probability
    pub avg_probability: f64,
    /// Average confidence
    pub avg_confidence: f64,
}

impl PredictionSummary {
    /// Create summary from predictions
    pub fn from_predictions(predictions: &[RiskPrediction]) -> Self {
        let total = predictions.len();
        let positive = predictions.iter().filter(|p| p.is_positive()).count();
        let negative = total - positive;

        let avg_prob = if total > 0 {
            predictions.iter().map(|p| p.probability as f64).sum::<f64>() / total as f64
        } else {
            0.0
        };

        let avg_conf = if total > 0 {
            predictions.iter().map(|p| p.confidence as f64).sum::<f64>() / total as f64
        } else {
            0.0
        };

        Self {
            total_predictions: total,
            positive_predictions: positive,
            negative_predictions: negative,
            positive_rate: if total > 0 {
                positive as f64 / total as f64
            } else {
                0.0
            },
            avg_probability: avg_prob,
            avg_confidence: avg_conf,
        }
    }

    /// Print summary to stdout
    pub fn print(&self) {
        println!("\n=== Prediction Summary ===");
        println!("Total predictions: {}", self.total_predictions);
        println!(
            "Positive predictions: {} ({:.2}%)",
            self.positive_predictions,
            self.positive_rate * 100.0
        );
        println!("Negative predictions: {}", self.negative_predictions);
        println!("Average probability: {:.4}", self.avg_probability);
        println!("Average confidence: {:.4}", self.avg_confidence);
        println!("==========================\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_prediction() {
        let pred = RiskPrediction::new(0, 0.8, 0.5);

        assert_eq!(pred.row, 0);
        assert_eq!(pred.probability, 0.8);
        assert_eq!(pred.prediction, 1);
        assert!(pred.is_positive());
        assert_eq!(pred.prediction_label(), "pcos_risk");

        let negative = RiskPrediction::new(1, 0.2, 0.5);
        assert!(!negative.is_positive());
        assert_eq!(negative.prediction_label(), "low_risk");
    }

    #[test]
    fn test_batch_prediction_result() {
        let predictions = vec![
            RiskPrediction::new(0, 0.8, 0.5),
            RiskPrediction::new(1, 0.3, 0.5),
            RiskPrediction::new(2, 0.9, 0.5),
        ];

        let result = BatchPredictionResult::new(predictions);

        assert_eq!(result.predictions.len(), 3);
        assert_eq!(result.summary.total_predictions, 3);
        assert_eq!(result.summary.positive_predictions, 2);
        assert_eq!(result.get_positive_predictions().len(), 2);
    }

    #[test]
    fn test_csv_export() {
        let result = BatchPredictionResult::new(vec![RiskPrediction::new(0, 0.8, 0.5)]);
        let csv = result.to_csv();

        assert!(csv.contains("row,probability,prediction,confidence"));
        assert!(csv.contains("0,0.800000,1"));
    }

    #[test]
    fn test_empty_summary() {
        let summary = PredictionSummary::from_predictions(&[]);
        assert_eq!(summary.total_predictions, 0);
        assert_eq!(summary.positive_rate, 0.0);
    }
}
