// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates a full training run in order:
//
//   Step 1: Load arrays               (Layer 4/6 - ArraySource)
//   Step 2: Build the dataset         (Layer 4 - data)
//   Step 3: Discover model shape      (input width, class count)
//   Step 4: Split train/validation    (Layer 4 - data)
//   Step 5: Build the model           (Layer 5 - ml)
//   Step 6: Save config               (Layer 6 - infra)
//   Step 7: Fit                       (Layer 5 - ml)
//   Step 8: Log metrics + checkpoint  (Layer 6 - infra),
//           noting the epoch with the lowest validation loss

use anyhow::{ensure, Context, Result};
use burn::{data::dataset::Dataset, module::AutodiffModule, tensor::backend::Backend};
use serde::{Deserialize, Serialize};

use crate::data::{
    dataset::dataset_from_arrays,
    splitter::split_indices,
    synthetic::BlobSource,
};
use crate::domain::{array::RawArray, traits::ArraySource};
use crate::infra::{
    array_store::JsonArrayStore,
    checkpoint::CheckpointManager,
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::{
    backend::{InferBackend, TrainBackend},
    model::ClassifierConfig,
    trainer::{FitConfig, Trainer},
};

/// Seed for synthetic data when none is given.
const DEFAULT_DATA_SEED: u64 = 42;

// ─── Training Configuration ──────────────────────────────────────────────────
// Everything needed to repeat a run, and to rebuild its model for
// prediction. Saved next to the weights as train_config.json.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    /// JSON array file; `None` trains on synthetic blobs
    pub data:           Option<String>,
    pub samples:        usize,
    pub features:       usize,
    pub classes:        usize,
    pub seed:           Option<u64>,
    pub hidden_dim:     usize,
    pub dropout:        f64,
    pub batch_size:     usize,
    pub epochs:         usize,
    pub lr:             f64,
    pub weight_decay:   Option<f32>,
    pub val_fraction:   f64,
    pub checkpoint_dir: String,
    pub verbose:        bool,
    /// Filled in from the data during `execute`
    pub input_dim:      usize,
    /// Filled in from the data during `execute`
    pub num_classes:    usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data:           None,
            samples:        100,
            features:       10,
            classes:        3,
            seed:           None,
            hidden_dim:     0,
            dropout:        0.0,
            batch_size:     32,
            epochs:         5,
            lr:             1e-3,
            weight_decay:   None,
            val_fraction:   0.2,
            checkpoint_dir: "checkpoints".to_string(),
            verbose:        false,
            input_dim:      0,
            num_classes:    0,
        }
    }
}

impl TrainConfig {
    /// Where the arrays come from.
    pub fn source(&self) -> Box<dyn ArraySource> {
        match &self.data {
            Some(path) => Box::new(JsonArrayStore::new(path)),
            None => Box::new(BlobSource::new(
                self.samples,
                self.features,
                self.classes,
                self.seed.unwrap_or(DEFAULT_DATA_SEED),
            )),
        }
    }

    pub fn classifier(&self) -> ClassifierConfig {
        ClassifierConfig::new(self.input_dim, self.num_classes)
            .with_hidden_dim(self.hidden_dim)
            .with_dropout(self.dropout)
    }
}

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct TrainReport {
    pub train_samples: usize,
    pub val_samples:   usize,
    pub history:       Vec<EpochMetrics>,
    /// Epoch with the lowest validation loss; `None` without validation
    pub best_epoch:    Option<usize>,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<TrainReport> {
        let mut cfg = self.config.clone();
        ensure!(
            (0.0..1.0).contains(&cfg.val_fraction),
            "val_fraction must be in [0, 1), got {}",
            cfg.val_fraction
        );

        // ── Step 1: Load arrays ───────────────────────────────────────────────
        let source = cfg.source();
        tracing::info!("Loading {}", source.describe());
        let arrays = source.load_arrays()?;
        ensure!(
            arrays.len() >= 2,
            "training needs a feature column and a label column, got {} column(s)",
            arrays.len()
        );

        // ── Step 2: Build dataset ─────────────────────────────────────────────
        let dataset = dataset_from_arrays(&arrays, None)?;
        tracing::info!("Dataset ready: {} samples", dataset.len());

        // ── Step 3: Discover model shape ──────────────────────────────────────
        cfg.input_dim   = arrays[0].row_len();
        cfg.num_classes = class_count(&arrays[1])?;
        tracing::info!("Model shape: {} inputs → {} classes", cfg.input_dim, cfg.num_classes);

        // ── Step 4: Train / validation split ──────────────────────────────────
        let (train_idx, val_idx) = split_indices(dataset.len(), 1.0 - cfg.val_fraction, cfg.seed);
        ensure!(
            !train_idx.is_empty(),
            "val_fraction {} leaves no training samples out of {}",
            cfg.val_fraction, dataset.len()
        );
        let train_ds = dataset.subset(&train_idx)?;
        let val_ds   = dataset.subset(&val_idx)?;
        tracing::info!("Split: {} train, {} validation", train_ds.len(), val_ds.len());

        // ── Step 5: Build model ───────────────────────────────────────────────
        if let Some(seed) = cfg.seed {
            TrainBackend::seed(seed);
        }
        let device = Default::default();
        let model  = cfg.classifier().init::<TrainBackend>(&device);

        // ── Step 6: Save config for prediction ────────────────────────────────
        let ckpt = CheckpointManager::new(&cfg.checkpoint_dir)?;
        ckpt.save_config(&cfg)?;

        // ── Step 7: Fit ───────────────────────────────────────────────────────
        let fit_cfg = FitConfig {
            batch_size:   cfg.batch_size,
            epochs:       cfg.epochs,
            lr:           cfg.lr,
            weight_decay: cfg.weight_decay,
            seed:         cfg.seed,
            verbose:      cfg.verbose,
        };
        let outcome = Trainer::<TrainBackend>::new(fit_cfg)
            .with_device(device)
            .with_validation(val_ds.clone())
            .fit_with_history(model, &train_ds)?;

        // ── Step 8: Metrics + checkpoint ──────────────────────────────────────
        let logger = MetricsLogger::new(&cfg.checkpoint_dir)?;
        let mut best_val_loss = f64::INFINITY;
        let mut best_epoch    = None;
        for m in &outcome.history {
            logger.log(m)?;
            if let Some(v) = m.val_loss.filter(|_| m.is_improvement(best_val_loss)) {
                best_val_loss = v;
                best_epoch    = Some(m.epoch);
            }
        }
        if let Some(epoch) = best_epoch {
            tracing::info!("Best validation loss {:.4} at epoch {}", best_val_loss, epoch);
        }
        ckpt.save_model::<InferBackend, _>(&outcome.model.valid(), cfg.epochs)?;
        tracing::info!("Training complete!");

        Ok(TrainReport {
            train_samples: train_ds.len(),
            val_samples:   val_ds.len(),
            history:       outcome.history,
            best_epoch,
        })
    }
}

/// Number of classes implied by an integer label column (max label + 1).
fn class_count(labels: &RawArray) -> Result<usize> {
    ensure!(
        !labels.element_type().is_float(),
        "label column must hold integer class indices, found {:?}",
        labels.element_type()
    );
    let values = labels.to_buffer().to_i64_vec();
    ensure!(values.iter().all(|&v| v >= 0), "class labels must be non-negative");
    let max = values.iter().copied().max().context("label column is empty")?;
    Ok(max as usize + 1)
}
