// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and hands off to Layer 2.
// This is the only layer that prints for the user.
//
// Two commands are supported:
//   1. `train`   — fits a classifier and writes a checkpoint
//   2. `predict` — loads the checkpoint and applies it
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, PredictArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "array-fit",
    version,
    about = "Fit burn models on numeric arrays with Adam, then apply them."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)   => run_train(args),
            Commands::Predict(args) => run_predict(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    let checkpoint_dir = args.checkpoint_dir.clone();
    let report = TrainUseCase::new(args.into()).execute()?;

    println!(
        "Trained on {} samples ({} held out for validation).",
        report.train_samples, report.val_samples
    );
    for m in &report.history {
        println!("Epoch {:>3} | {}", m.epoch, m);
    }
    if let Some(epoch) = report.best_epoch {
        println!("Best validation loss at epoch {}.", epoch);
    }
    println!("Checkpoint saved to '{}'.", checkpoint_dir);
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::predict_use_case::PredictUseCase;

    let use_case = PredictUseCase::new(&args.checkpoint_dir)?;
    let report   = use_case.predict(args.data, args.output.clone())?;

    println!("Predicted {} samples.", report.samples());
    if let Some(acc) = report.accuracy {
        println!("Accuracy: {:.1}%", acc * 100.0);
    }
    if let Some(path) = args.output {
        println!("Outputs written to '{}'.", path);
    }
    Ok(())
}
