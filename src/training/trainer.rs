use crate::data::{Dataset, FeatureRow, NUM_FEATURES};
use crate::model::architecture::{init_model, PcosModel};
use crate::model::ModelConfig;
use crate::training::metrics::{self, Metrics};
use crate::training::{TrainingConfig, TrainingResult, TrainingState};
use anyhow::{anyhow, bail, Context, Result};
use burn::module::AutodiffModule;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::{ElementConversion, Int, Tensor, TensorData};
use indicatif::{ProgressBar, ProgressStyle};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Instant;
use tracing::{debug, info};

/// Trained model together with the training result
pub struct TrainOutcome<B: AutodiffBackend> {
    /// Trained model on the inference backend
    pub model: PcosModel<B::InnerBackend>,
    /// Training history and final test metrics
    pub result: TrainingResult,
}

/// Trainer for the PCOS risk model
pub struct Trainer<B: AutodiffBackend> {
    /// Training configuration
    config: TrainingConfig,
    /// Model configuration
    model_config: ModelConfig,
    /// Device
    device: B::Device,
}

impl<B: AutodiffBackend> Trainer<B> {
    /// Create new trainer
    pub fn new(config: TrainingConfig, model_config: ModelConfig, device: B::Device) -> Self {
        Self {
            config,
            model_config,
            device,
        }
    }

    /// Train the model on the dataset's train partition.
    ///
    /// Runs Adam over shuffled mini-batches for the configured epoch count;
    /// no early stopping and no validation monitoring during fit. Final
    /// metrics come from the held-out test partition.
    pub fn train(&self, dataset: &Dataset) -> Result<TrainOutcome<B>> {
        if dataset.train.is_empty() {
            bail!("Training partition is empty");
        }

        info!(
            "Training for {} epochs (batch_size={}, lr={}, seed={})",
            self.config.epochs,
            self.config.batch_size,
            self.config.learning_rate,
            self.config.seed
        );

        B::seed(self.config.seed);
        let start_time = Instant::now();
        let mut state = TrainingState::new();

        let mut model = init_model::<B>(&self.model_config, &self.device);
        let mut optim = AdamConfig::new().init();
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);

        let mut indices: Vec<usize> = (0..dataset.train.len()).collect();

        let progress = ProgressBar::new(self.config.epochs as u64);
        progress.set_style(
            ProgressStyle::with_template(
                "[{bar:40.cyan/blue}] epoch {pos}/{len} {msg}",
            )
            .context("Invalid progress bar template")?
            .progress_chars("=>-"),
        );

        for epoch in 1..=self.config.epochs {
            indices.shuffle(&mut rng);

            let mut epoch_loss = 0.0f64;
            let mut batches = 0usize;

            for chunk in indices.chunks(self.config.batch_size) {
                let (features, targets) =
                    batch_tensors::<B>(&dataset.train, chunk, &self.device);

                let output = model.forward_training(features, targets);
                let loss = output.loss;

                let grads = GradientsParams::from_grads(loss.backward(), &model);
                model = optim.step(self.config.learning_rate, model, grads);

                epoch_loss += loss.into_scalar().elem::<f32>() as f64;
                batches += 1;
                state.global_step += 1;
            }

            let mean_loss = epoch_loss / batches as f64;
            state.update_epoch(mean_loss);

            progress.set_message(format!("loss {:.4}", mean_loss));
            progress.inc(1);

            if epoch % 10 == 0 || epoch == self.config.epochs {
                debug!("Epoch {}/{}: loss={:.4}", epoch, self.config.epochs, mean_loss);
            }
        }
        progress.finish_with_message("done");

        let inference_model = model.valid();
        let test_metrics = evaluate(
            &inference_model,
            &dataset.test,
            self.config.batch_size,
            &self.device,
        )?;

        let duration_secs = start_time.elapsed().as_secs_f64();
        info!(
            "Training finished in {:.2}s (final loss {:.4})",
            duration_secs,
            state.last_loss().unwrap_or(f64::NAN)
        );

        Ok(TrainOutcome {
            model: inference_model,
            result: TrainingResult {
                state,
                test_metrics,
                duration_secs,
            },
        })
    }
}

/// Build batch tensors for the given row indices
pub fn batch_tensors<B: Backend>(
    rows: &[FeatureRow],
    indices: &[usize],
    device: &B::Device,
) -> (Tensor<B, 2>, Tensor<B, 1, Int>) {
    let mut features = Vec::with_capacity(indices.len() * NUM_FEATURES);
    let mut labels = Vec::with_capacity(indices.len());

    for &i in indices {
        features.extend_from_slice(&rows[i].features);
        labels.push(rows[i].label as i64);
    }

    let features = Tensor::from_data(
        TensorData::new(features, [indices.len(), NUM_FEATURES]),
        device,
    );
    let targets = Tensor::from_data(TensorData::new(labels, [indices.len()]), device);

    (features, targets)
}

/// Compute predicted probabilities for rows in batches
pub fn predict_probabilities<B: Backend>(
    model: &PcosModel<B>,
    rows: &[FeatureRow],
    batch_size: usize,
    device: &B::Device,
) -> Result<Vec<f32>> {
    let indices: Vec<usize> = (0..rows.len()).collect();
    let mut probabilities = Vec::with_capacity(rows.len());

    for chunk in indices.chunks(batch_size.max(1)) {
        let (features, _) = batch_tensors::<B>(rows, chunk, device);
        let output = model.predict(features);
        let probs: Vec<f32> = output
            .probabilities
            .into_data()
            .to_vec()
            .map_err(|e| anyhow!("Failed to read probabilities: {:?}", e))?;
        probabilities.extend(probs);
    }

    Ok(probabilities)
}

/// Evaluate the model against labeled rows
pub fn evaluate<B: Backend>(
    model: &PcosModel<B>,
    rows: &[FeatureRow],
    batch_size: usize,
    device: &B::Device,
) -> Result<Metrics> {
    if rows.is_empty() {
        return Ok(Metrics::default());
    }

    let probabilities = predict_probabilities(model, rows, batch_size, device)?;
    let targets: Vec<u8> = rows.iter().map(|r| r.label).collect();

    Ok(metrics::classification(&probabilities, &targets, 0.5))
}
