use crate::acquire::TableSource;
use crate::data::features::{CycleCodePolicy, FeatureBuilder};
use crate::data::loader::DataLoader;
use crate::data::synthetic::SyntheticSampler;
use crate::data::FeatureRow;
use crate::model::architecture::PcosModel;
use crate::model::export::{ExportMetadata, ModelExporter};
use crate::predict::{BatchPredictionResult, RiskPrediction};
use crate::training::metrics::{self, Metrics};
use crate::training::trainer::predict_probabilities;
use anyhow::{bail, Result};
use burn::tensor::backend::Backend;
use std::path::Path;
use tracing::info;

const DEFAULT_BATCH_SIZE: usize = 16;
const DEFAULT_THRESHOLD: f32 = 0.5;

/// Runs inference with an exported model
pub struct Predictor<B: Backend> {
    model: PcosModel<B>,
    metadata: ExportMetadata,
    device: B::Device,
    batch_size: usize,
    threshold: f32,
}

impl<B: Backend> Predictor<B> {
    /// Load a predictor from an exported model artifact
    pub fn from_file<P: AsRef<Path>>(path: P, device: B::Device) -> Result<Self> {
        let (model, metadata) = ModelExporter::load::<B, _>(path, &device)?;
        Ok(Self {
            model,
            metadata,
            device,
            batch_size: DEFAULT_BATCH_SIZE,
            threshold: DEFAULT_THRESHOLD,
        })
    }

    /// Create a predictor from an in-memory model
    pub fn new(model: PcosModel<B>, metadata: ExportMetadata, device: B::Device) -> Self {
        Self {
            model,
            metadata,
            device,
            batch_size: DEFAULT_BATCH_SIZE,
            threshold: DEFAULT_THRESHOLD,
        }
    }

    /// Set inference batch size
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Set decision threshold
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Get the metadata stored alongside the model
    pub fn metadata(&self) -> &ExportMetadata {
        &self.metadata
    }

    /// Predict risk for derived feature rows
    pub fn predict_rows(&self, rows: &[FeatureRow]) -> Result<BatchPredictionResult> {
        if rows.is_empty() {
            bail!("No rows to predict");
        }
        if let Some(row) = rows.iter().position(|r| !r.is_injected()) {
            bail!("Row {} is missing synthetic features", row);
        }

        let probabilities =
            predict_probabilities(&self.model, rows, self.batch_size, &self.device)?;

        let predictions = probabilities
            .into_iter()
            .enumerate()
            .map(|(row, probability)| RiskPrediction::new(row, probability, self.threshold))
            .collect();

        Ok(BatchPredictionResult::new(predictions))
    }

    /// Run the full pipeline on a raw table and predict every usable row.
    ///
    /// Measured `Voice_Jitter`/`Family_History` columns pass through into the
    /// feature vector; rows without them fall back to seeded sampling, which
    /// conditions on the label, so unlabeled rows are kept only when both
    /// columns are measured.
    pub fn predict_source(
        &self,
        source: &TableSource,
        policy: CycleCodePolicy,
        seed: u64,
    ) -> Result<BatchPredictionResult> {
        let rows = derive_rows(source, policy, seed, true)?;
        info!("Predicting {} rows from {:?}", rows.len(), source.path());
        self.predict_rows(&rows)
    }

    /// Compare predictions on a labeled table against its labels.
    ///
    /// Unlabeled rows are dropped; there is nothing to score them against.
    pub fn evaluate_source(
        &self,
        source: &TableSource,
        policy: CycleCodePolicy,
        seed: u64,
    ) -> Result<Metrics> {
        let rows = derive_rows(source, policy, seed, false)?;
        if rows.is_empty() {
            bail!("No usable rows in {:?}", source.path());
        }

        let probabilities =
            predict_probabilities(&self.model, &rows, self.batch_size, &self.device)?;
        let targets: Vec<u8> = rows.iter().map(|r| r.label).collect();

        Ok(metrics::classification(&probabilities, &targets, self.threshold))
    }
}

/// Load a table and derive injected feature rows, as training does.
///
/// With `keep_unlabeled`, rows without a label survive when both synthetic
/// columns are measured in the table.
pub fn derive_rows(
    source: &TableSource,
    policy: CycleCodePolicy,
    seed: u64,
    keep_unlabeled: bool,
) -> Result<Vec<FeatureRow>> {
    let loader = DataLoader::new();
    let records = match source {
        TableSource::Delimited(path) => loader.load(path)?,
        TableSource::Spreadsheet { path, sheet } => loader.load_sheet(path, *sheet)?,
    };

    let mut builder = FeatureBuilder::new().with_policy(policy);
    if keep_unlabeled {
        builder = builder.allow_unlabeled();
    }
    let outcome = builder.derive(&records)?;
    let mut rows = outcome.rows;

    let sampler = SyntheticSampler::new()?;
    let mut rng = crate::utils::random::seeded_rng(seed);
    sampler.inject(&mut rows, &mut rng);

    Ok(rows)
}
