//! On-device model export.
//!
//! The trained network is serialized with burn's compact (MessagePack,
//! half-precision) recorder into a single binary artifact, plus a JSON
//! metadata sidecar that makes reload possible without hardcoding the
//! architecture.

use crate::data::FEATURE_NAMES;
use crate::model::architecture::{init_model, PcosModel};
use crate::model::ModelConfig;
use crate::training::metrics::Metrics;
use anyhow::{Context, Result};
use burn::module::Module;
use burn::record::{CompactRecorder, Recorder};
use burn::tensor::backend::Backend;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Fixed artifact name written into the output directory
pub const EXPORT_FILENAME: &str = "pcos_hybrid_model.mpk";

/// Export metadata written next to the model artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportMetadata {
    /// Crate version that produced the artifact
    pub version: String,
    /// Model configuration
    pub model_config: ModelConfig,
    /// Feature column order the model expects
    pub feature_names: Vec<String>,
    /// Training hyperparameters
    pub training: TrainingMetadata,
    /// Final held-out test metrics
    pub test_metrics: Metrics,
    /// RFC 3339 timestamp
    pub timestamp: String,
}

impl ExportMetadata {
    /// Feature names in pipeline order, for the sidecar
    pub fn pipeline_feature_names() -> Vec<String> {
        FEATURE_NAMES.iter().map(|s| s.to_string()).collect()
    }
}

/// Training hyperparameters recorded in the metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingMetadata {
    /// Learning rate
    pub learning_rate: f64,
    /// Batch size
    pub batch_size: usize,
    /// Number of epochs
    pub epochs: usize,
    /// Random seed
    pub seed: u64,
    /// Optimizer name
    pub optimizer: String,
}

/// Saves and loads the exported inference artifact
pub struct ModelExporter;

impl ModelExporter {
    /// Export the trained model and its metadata sidecar.
    ///
    /// Returns the path of the binary artifact.
    pub fn export<B: Backend, P: AsRef<Path>>(
        model: &PcosModel<B>,
        path: P,
        metadata: &ExportMetadata,
    ) -> Result<PathBuf> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        let record = model.clone().into_record();
        CompactRecorder::new()
            .record(record, path.clone())
            .context("Failed to write model artifact")?;

        let metadata_path = path.with_extension("json");
        let metadata_json =
            serde_json::to_string_pretty(metadata).context("Failed to serialize metadata")?;
        fs::write(&metadata_path, metadata_json).context("Failed to write metadata file")?;

        info!("Exported model to {:?}", path);
        Ok(path)
    }

    /// Load an exported model and its metadata for inference
    pub fn load<B: Backend, P: AsRef<Path>>(
        path: P,
        device: &B::Device,
    ) -> Result<(PcosModel<B>, ExportMetadata)> {
        let path = path.as_ref();
        info!("Loading model from {:?}", path);

        let metadata_path = path.with_extension("json");
        let metadata_json = fs::read_to_string(&metadata_path)
            .with_context(|| format!("Failed to read metadata file {:?}", metadata_path))?;
        let metadata: ExportMetadata =
            serde_json::from_str(&metadata_json).context("Failed to parse metadata")?;

        let record = CompactRecorder::new()
            .load(path.to_path_buf(), device)
            .context("Failed to load model artifact")?;
        let model = init_model::<B>(&metadata.model_config, device).load_record(record);

        Ok((model, metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::Tensor;
    use tempfile::TempDir;

    type TestBackend = NdArray<f32>;

    fn test_metadata() -> ExportMetadata {
        ExportMetadata {
            version: "0.1.0".to_string(),
            model_config: ModelConfig::pcos_default(),
            feature_names: ExportMetadata::pipeline_feature_names(),
            training: TrainingMetadata {
                learning_rate: 0.001,
                batch_size: 16,
                epochs: 100,
                seed: 2026,
                optimizer: "Adam".to_string(),
            },
            test_metrics: Metrics::default(),
            timestamp: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_export_writes_nonempty_artifact() {
        let temp_dir = TempDir::new().unwrap();
        let device = <TestBackend as Backend>::Device::default();
        let model = init_model::<TestBackend>(&ModelConfig::pcos_default(), &device);

        let path = ModelExporter::export(&model, temp_dir.path().join(EXPORT_FILENAME), &test_metadata())
            .unwrap();

        assert!(path.exists());
        assert!(fs::metadata(&path).unwrap().len() > 0);
        assert!(path.with_extension("json").exists());
    }

    #[test]
    fn test_export_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let device = <TestBackend as Backend>::Device::default();
        let model = init_model::<TestBackend>(&ModelConfig::pcos_default(), &device);

        let path = temp_dir.path().join(EXPORT_FILENAME);
        ModelExporter::export(&model, &path, &test_metadata()).unwrap();

        let (loaded, metadata) = ModelExporter::load::<TestBackend, _>(&path, &device).unwrap();

        assert_eq!(metadata.training.epochs, 100);
        assert_eq!(metadata.model_config.input_size, 5);

        // Identical weights produce identical outputs
        let input = Tensor::<TestBackend, 2>::ones([2, 5], &device);
        let a: Vec<f32> = model.forward(input.clone()).into_data().to_vec().unwrap();
        let b: Vec<f32> = loaded.forward(input).into_data().to_vec().unwrap();
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() < 1e-2, "{} vs {}", x, y);
        }
    }
}
