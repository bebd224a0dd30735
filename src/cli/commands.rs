// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands: `train` and `predict`
// and all their configurable flags.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use crate::application::train_use_case::TrainConfig;

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a classifier on a JSON array file or synthetic blobs
    Train(TrainArgs),

    /// Apply a trained checkpoint and report / save its outputs
    Predict(PredictArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// JSON array file (column 0 = features, column 1 = integer labels).
    /// Without it, synthetic blobs are generated.
    #[arg(long)]
    pub data: Option<String>,

    /// Synthetic data: number of samples
    #[arg(long, default_value_t = 100)]
    pub samples: usize,

    /// Synthetic data: features per sample
    #[arg(long, default_value_t = 10)]
    pub features: usize,

    /// Synthetic data: number of classes
    #[arg(long, default_value_t = 3)]
    pub classes: usize,

    /// Seeds data generation, the split, weight init and shuffling
    #[arg(long)]
    pub seed: Option<u64>,

    /// Width of the optional hidden layer (0 = linear model)
    #[arg(long, default_value_t = 0)]
    pub hidden_dim: usize,

    /// Dropout probability, active during training only
    #[arg(long, default_value_t = 0.0)]
    pub dropout: f64,

    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 5)]
    pub epochs: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Adam weight decay (e.g. 1e-5); off when omitted
    #[arg(long)]
    pub weight_decay: Option<f32>,

    /// Share of samples held out for validation
    #[arg(long, default_value_t = 0.2)]
    pub val_fraction: f64,

    /// Directory to save config, metrics and weights
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Report every epoch
    #[arg(long, short)]
    pub verbose: bool,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data:           a.data,
            samples:        a.samples,
            features:       a.features,
            classes:        a.classes,
            seed:           a.seed,
            hidden_dim:     a.hidden_dim,
            dropout:        a.dropout,
            batch_size:     a.batch_size,
            epochs:         a.epochs,
            lr:             a.lr,
            weight_decay:   a.weight_decay,
            val_fraction:   a.val_fraction,
            checkpoint_dir: a.checkpoint_dir,
            verbose:        a.verbose,
            ..TrainConfig::default()
        }
    }
}

/// All arguments for the `predict` command
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// JSON array file to predict on; defaults to the training data source
    #[arg(long)]
    pub data: Option<String>,

    /// Directory where `train` saved its checkpoint
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Write the outputs as a JSON array file
    #[arg(long)]
    pub output: Option<String>,
}
