pub mod metrics;
pub mod trainer;

use serde::{Deserialize, Serialize};

/// Training configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Number of training epochs
    pub epochs: usize,
    /// Batch size
    pub batch_size: usize,
    /// Learning rate
    pub learning_rate: f64,
    /// Random seed for the backend and batch shuffling
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 100,
            batch_size: 16,
            learning_rate: 0.001,
            seed: 2026,
        }
    }
}

impl TrainingConfig {
    /// Create configuration for quick smoke runs
    pub fn quick_test() -> Self {
        Self {
            epochs: 5,
            ..Default::default()
        }
    }
}

/// Training state accumulated across epochs
#[derive(Debug, Clone, Default)]
pub struct TrainingState {
    /// Completed epochs
    pub epoch: usize,
    /// Completed optimizer steps
    pub global_step: usize,
    /// Mean training loss per epoch
    pub train_loss_history: Vec<f64>,
}

impl TrainingState {
    /// Create new training state
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed epoch
    pub fn update_epoch(&mut self, train_loss: f64) {
        self.epoch += 1;
        self.train_loss_history.push(train_loss);
    }

    /// Mean loss of the most recent epoch
    pub fn last_loss(&self) -> Option<f64> {
        self.train_loss_history.last().copied()
    }
}

/// Training result
#[derive(Debug, Clone)]
pub struct TrainingResult {
    /// Final training state
    pub state: TrainingState,
    /// Metrics on the held-out test partition
    pub test_metrics: metrics::Metrics,
    /// Training duration in seconds
    pub duration_secs: f64,
}
