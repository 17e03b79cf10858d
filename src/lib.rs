//! # pcosnet: PCOS Risk Prediction Tool
//!
//! pcosnet trains a small neural network that predicts polycystic ovary
//! syndrome (PCOS) risk from a handful of clinical survey features, and
//! exports it as a compact artifact for on-device inference.
//!
//! ## Features
//!
//! - Dataset download and caching (CSV preferred, XLSX fallback)
//! - Deterministic feature derivation from the raw survey table
//! - Label-conditioned synthetic feature injection with a fixed seed
//! - Reproducible train/test split, training, and export
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use pcosnet::data::features::FeatureBuilder;
//! use pcosnet::data::loader::DataLoader;
//! use pcosnet::data::synthetic::SyntheticSampler;
//! use pcosnet::data::{preprocessing, SplitConfig};
//! use pcosnet::model::ModelConfig;
//! use pcosnet::training::{trainer::Trainer, TrainingConfig};
//! use pcosnet::utils::random::seeded_rng;
//!
//! // Load and derive features
//! let records = DataLoader::new().load("PCOS_data_without_infertility.csv").unwrap();
//! let mut rows = FeatureBuilder::new().derive(&records).unwrap().rows;
//!
//! // Inject synthetic features and split
//! let sampler = SyntheticSampler::new().unwrap();
//! sampler.inject(&mut rows, &mut seeded_rng(2026));
//! let dataset = preprocessing::split_rows(rows, &SplitConfig::default());
//!
//! // Train
//! type Backend = burn::backend::Autodiff<pcosnet::DefaultBackend>;
//! let device = burn::backend::ndarray::NdArrayDevice::default();
//! let trainer = Trainer::<Backend>::new(
//!     TrainingConfig::default(),
//!     ModelConfig::pcos_default(),
//!     device,
//! );
//! let outcome = trainer.train(&dataset).unwrap();
//! ```

pub mod acquire;
pub mod cli;
pub mod data;
pub mod model;
pub mod predict;
pub mod training;
pub mod utils;

use burn_ndarray::NdArray;

/// Default backend type
pub type DefaultBackend = NdArray<f32>;

/// Re-export commonly used types
pub use data::loader::DataLoader;
pub use data::{Dataset, FeatureRow, SubjectRecord};
pub use model::{architecture::PcosModel, ModelConfig};
pub use predict::{BatchPredictionResult, RiskPrediction};
pub use training::{TrainingConfig, TrainingResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!(
        "{} v{} - PCOS risk prediction tool using deep learning",
        NAME, VERSION
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_info() {
        let info_str = info();
        assert!(info_str.contains("pcosnet"));
        assert!(info_str.contains(VERSION));
    }
}
