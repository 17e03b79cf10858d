use anyhow::{bail, Context, Result};
use burn::backend::ndarray::NdArrayDevice;
use burn::backend::{Autodiff, NdArray};
use pcosnet::acquire::{locate_table, DatasetFetcher, TableSource};
use pcosnet::cli::{
    parse_args, setup_logging, Commands, EvaluateArgs, FetchArgs, PredictArgs, TrainArgs,
};
use pcosnet::data::features::FeatureBuilder;
use pcosnet::data::loader::DataLoader;
use pcosnet::data::synthetic::SyntheticSampler;
use pcosnet::data::{preprocessing, SplitConfig};
use pcosnet::model::export::{ExportMetadata, ModelExporter, TrainingMetadata, EXPORT_FILENAME};
use pcosnet::model::ModelConfig;
use pcosnet::predict::predictor::Predictor;
use pcosnet::training::{trainer::Trainer, TrainingConfig};
use tracing::{error, info, warn};

type InferenceBackend = NdArray<f32>;
type TrainBackend = Autodiff<InferenceBackend>;

fn main() {
    let cli = parse_args();

    setup_logging(cli.verbose);

    info!("{}", pcosnet::info());

    let result = match cli.command {
        Commands::Fetch(args) => run_fetch(args),
        Commands::Train(args) => run_train(args),
        Commands::Predict(args) => run_predict(args),
        Commands::Evaluate(args) => run_evaluate(args),
    };

    if let Err(e) = result {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run_fetch(args: FetchArgs) -> Result<()> {
    let fetcher = DatasetFetcher::new()?;
    let dir = fetcher.fetch(&args.dataset)?;
    let source = locate_table(&dir)?;
    info!("Dataset ready: {:?}", source.path());
    Ok(())
}

fn run_train(args: TrainArgs) -> Result<()> {
    info!("Starting training...");
    info!("Output directory: {:?}", args.output);

    pcosnet::utils::ensure_dir(&args.output)?;
    pcosnet::utils::validation::in_range(args.test_ratio, 0.0, 0.5, "test ratio")?;

    let source = match &args.input {
        Some(path) => TableSource::from_path(path)?,
        None => {
            let fetcher = DatasetFetcher::new()?;
            let dir = fetcher.fetch(&args.dataset)?;
            locate_table(&dir)?
        }
    };
    info!("Input table: {:?}", source.path());

    info!("Loading data...");
    let loader = DataLoader::new();
    let records = match &source {
        TableSource::Delimited(path) => loader.load(path),
        TableSource::Spreadsheet { path, sheet } => loader.load_sheet(path, *sheet),
    }
    .with_context(|| format!("Failed to load data from {:?}", source.path()))?;
    info!("Loaded {} records", records.len());

    info!("Deriving features...");
    let outcome = FeatureBuilder::new()
        .with_policy(args.cycle_policy.into())
        .derive(&records)?;
    if outcome.skipped_missing > 0 || outcome.skipped_cycle > 0 {
        warn!(
            "Dropped {} rows with missing fields and {} rows with unmapped cycle codes",
            outcome.skipped_missing, outcome.skipped_cycle
        );
    }
    let mut rows = outcome.rows;
    if rows.is_empty() {
        bail!("No usable rows after feature derivation");
    }

    info!("Injecting synthetic features (seed {})...", args.seed);
    let sampler = SyntheticSampler::new()?;
    let mut rng = pcosnet::utils::random::seeded_rng(args.seed);
    sampler.inject(&mut rows, &mut rng);

    info!("Splitting dataset...");
    let split_config = SplitConfig {
        test_ratio: args.test_ratio,
        seed: args.seed,
    };
    let dataset = preprocessing::split_rows(rows, &split_config);

    let training_config = TrainingConfig {
        epochs: if args.quick { 5 } else { args.epochs },
        batch_size: args.batch_size,
        learning_rate: args.learning_rate,
        seed: args.seed,
    };
    let model_config = ModelConfig::pcos_default().with_dropout(args.dropout);

    let device = NdArrayDevice::default();
    let trainer = Trainer::<TrainBackend>::new(training_config.clone(), model_config.clone(), device);

    info!("Starting model training...");
    let outcome = trainer.train(&dataset).context("Training failed")?;
    let result = &outcome.result;

    info!("\n=== Training Results ===");
    info!("Total epochs: {}", result.state.epoch);
    info!(
        "Final training loss: {:.4}",
        result.state.last_loss().unwrap_or(f64::NAN)
    );
    info!(
        "Training time: {}",
        pcosnet::utils::format_duration(result.duration_secs)
    );
    info!("\nFinal Test Metrics:");
    info!("  Loss: {:.4}", result.test_metrics.loss);
    info!("  Accuracy: {:.4}", result.test_metrics.accuracy);
    info!("  Precision: {:.4}", result.test_metrics.precision);
    info!("  Recall: {:.4}", result.test_metrics.recall);
    info!("  F1: {:.4}", result.test_metrics.f1);

    let metadata = ExportMetadata {
        version: pcosnet::VERSION.to_string(),
        model_config,
        feature_names: ExportMetadata::pipeline_feature_names(),
        training: TrainingMetadata {
            learning_rate: training_config.learning_rate,
            batch_size: training_config.batch_size,
            epochs: training_config.epochs,
            seed: training_config.seed,
            optimizer: "adam".to_string(),
        },
        test_metrics: result.test_metrics.clone(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    };

    let export_path = args.output.join(EXPORT_FILENAME);
    let artifact = ModelExporter::export(&outcome.model, &export_path, &metadata)?;
    info!("\nModel saved to: {:?}", artifact);

    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    info!("Starting prediction...");
    info!("Input file: {:?}", args.input);
    info!("Model: {:?}", args.model);

    let device = NdArrayDevice::default();
    let predictor = Predictor::<InferenceBackend>::from_file(&args.model, device)
        .with_context(|| format!("Failed to load model from {:?}", args.model))?
        .with_batch_size(args.batch_size)
        .with_threshold(args.threshold);

    let source = TableSource::from_path(&args.input)?;
    let result = predictor.predict_source(&source, args.cycle_policy.into(), args.seed)?;

    match args.format.as_str() {
        "csv" => result.save_csv(&args.output)?,
        "json" => result.save_json(&args.output)?,
        other => bail!("Unsupported output format: {}", other),
    }

    result.summary.print();
    info!("Predictions saved to: {:?}", args.output);

    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    info!("Starting evaluation...");
    info!("Input file: {:?}", args.input);
    info!("Model: {:?}", args.model);

    let device = NdArrayDevice::default();
    let predictor = Predictor::<InferenceBackend>::from_file(&args.model, device)
        .with_context(|| format!("Failed to load model from {:?}", args.model))?
        .with_batch_size(args.batch_size);

    let source = TableSource::from_path(&args.input)?;
    let metrics = predictor.evaluate_source(&source, args.cycle_policy.into(), args.seed)?;

    info!("\n=== Evaluation Results ===");
    info!("  Loss: {:.4}", metrics.loss);
    info!("  Accuracy: {:.4}", metrics.accuracy);
    info!("  Precision: {:.4}", metrics.precision);
    info!("  Recall: {:.4}", metrics.recall);
    info!("  F1: {:.4}", metrics.f1);

    if let Some(output) = &args.output {
        let report = serde_json::to_string_pretty(&metrics)
            .context("Failed to serialize evaluation report")?;
        std::fs::write(output, report)
            .with_context(|| format!("Failed to write report to {:?}", output))?;
        info!("Report saved to: {:?}", output);
    }

    Ok(())
}
