use crate::data::features::CycleCodePolicy;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI value for the unmapped cycle code policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum CyclePolicyArg {
    /// Drop the row with a warning
    #[default]
    Skip,
    /// Treat an unmapped code as a fatal error
    Strict,
}

impl From<CyclePolicyArg> for CycleCodePolicy {
    fn from(arg: CyclePolicyArg) -> Self {
        match arg {
            CyclePolicyArg::Skip => CycleCodePolicy::Skip,
            CyclePolicyArg::Strict => CycleCodePolicy::Strict,
        }
    }
}

/// pcosnet: PCOS risk prediction tool using deep learning
#[derive(Parser, Debug)]
#[command(name = "pcosnet")]
#[command(about = "PCOS risk prediction tool using deep learning")]
#[command(version)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download and cache the survey dataset
    Fetch(FetchArgs),

    /// Train a new model
    Train(TrainArgs),

    /// Make predictions using a trained model
    Predict(PredictArgs),

    /// Evaluate model performance on a labeled table
    Evaluate(EvaluateArgs),
}

/// Dataset fetch arguments
#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// Kaggle dataset slug (owner/name)
    #[arg(short, long, default_value = crate::acquire::DEFAULT_DATASET)]
    pub dataset: String,
}

/// Training arguments
#[derive(Parser, Debug)]
pub struct TrainArgs {
    /// Input table (CSV/TSV/XLSX); downloaded when omitted
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Kaggle dataset slug used when no input file is given
    #[arg(short, long, default_value = crate::acquire::DEFAULT_DATASET)]
    pub dataset: String,

    /// Output directory for the exported model
    #[arg(short, long, default_value = "./output")]
    pub output: PathBuf,

    /// Number of training epochs
    #[arg(short, long, default_value = "100")]
    pub epochs: usize,

    /// Batch size
    #[arg(short, long, default_value = "16")]
    pub batch_size: usize,

    /// Learning rate
    #[arg(long, default_value = "0.001")]
    pub learning_rate: f64,

    /// Dropout rate
    #[arg(long, default_value = "0.2")]
    pub dropout: f64,

    /// Test ratio
    #[arg(long, default_value = "0.2")]
    pub test_ratio: f32,

    /// Random seed for the split and synthetic features
    #[arg(long, default_value = "2026")]
    pub seed: u64,

    /// How to treat unmapped cycle codes
    #[arg(long, value_enum, default_value_t = CyclePolicyArg::Skip)]
    pub cycle_policy: CyclePolicyArg,

    /// Quick test mode (fewer epochs)
    #[arg(long)]
    pub quick: bool,
}

/// Prediction arguments
#[derive(Parser, Debug)]
pub struct PredictArgs {
    /// Input table (CSV/TSV/XLSX)
    #[arg(short, long, required = true)]
    pub input: PathBuf,

    /// Exported model artifact
    #[arg(short, long, required = true)]
    pub model: PathBuf,

    /// Output file for predictions
    #[arg(short, long, default_value = "predictions.csv")]
    pub output: PathBuf,

    /// Output format (csv, json)
    #[arg(short, long, default_value = "csv")]
    pub format: String,

    /// Batch size for prediction
    #[arg(short, long, default_value = "16")]
    pub batch_size: usize,

    /// Probability threshold for positive classification
    #[arg(long, default_value = "0.5")]
    pub threshold: f32,

    /// How to treat unmapped cycle codes
    #[arg(long, value_enum, default_value_t = CyclePolicyArg::Skip)]
    pub cycle_policy: CyclePolicyArg,

    /// Random seed for the synthetic features
    #[arg(long, default_value = "2026")]
    pub seed: u64,
}

/// Evaluation arguments
#[derive(Parser, Debug)]
pub struct EvaluateArgs {
    /// Input table with ground truth labels
    #[arg(short, long, required = true)]
    pub input: PathBuf,

    /// Exported model artifact
    #[arg(short, long, required = true)]
    pub model: PathBuf,

    /// Output file for the evaluation report (JSON)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Batch size for evaluation
    #[arg(short, long, default_value = "16")]
    pub batch_size: usize,

    /// How to treat unmapped cycle codes
    #[arg(long, value_enum, default_value_t = CyclePolicyArg::Skip)]
    pub cycle_policy: CyclePolicyArg,

    /// Random seed for the synthetic features
    #[arg(long, default_value = "2026")]
    pub seed: u64,
}

/// Parse CLI arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

/// Setup logging based on verbosity
pub fn setup_logging(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
