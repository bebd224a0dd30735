// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records training metrics to a CSV file after each epoch.
//
// Metrics recorded per epoch:
//   - epoch:        the epoch number (1, 2, 3, ...)
//   - train_loss:   mean batch loss over the epoch
//   - val_loss:     mean per-sample loss on the validation set
//   - val_accuracy: fraction of validation labels predicted
//
// Validation columns are left empty when no validation set
// was configured (or the labels are not class indices).
//
// Output file: <checkpoint_dir>/metrics.csv
//
//   epoch,train_loss,val_loss,val_accuracy
//   1,1.093112,1.041877,0.550000
//   2,0.981245,0.944310,0.700000
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use std::{
    fmt,
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    /// Mean of the batch-mean losses
    pub train_loss: f64,

    pub val_loss: Option<f64>,

    /// Range: [0.0, 1.0]
    pub val_accuracy: Option<f64>,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64) -> Self {
        Self { epoch, train_loss, val_loss: None, val_accuracy: None }
    }

    pub fn with_validation(mut self, val_loss: f64, val_accuracy: Option<f64>) -> Self {
        self.val_loss     = Some(val_loss);
        self.val_accuracy = val_accuracy;
        self
    }

    /// Returns true if this epoch beat `best_val_loss`.
    /// Epochs without validation never count as an improvement.
    pub fn is_improvement(&self, best_val_loss: f64) -> bool {
        self.val_loss.is_some_and(|v| v < best_val_loss)
    }
}

impl fmt::Display for EpochMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "train_loss={:.4}", self.train_loss)?;
        if let Some(v) = self.val_loss {
            write!(f, " | val_loss={:.4}", v)?;
        }
        if let Some(a) = self.val_accuracy {
            write!(f, " | val_acc={:.1}%", a * 100.0)?;
        }
        Ok(())
    }
}

fn csv_field(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.6}")).unwrap_or_default()
}

/// Appends epoch metrics to a CSV file.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create the directory if needed and write the header on a new file.
    /// An existing file is appended to, so several runs share one log.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create metrics directory '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "epoch,train_loss,val_loss,val_accuracy")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{:.6},{},{}",
            m.epoch,
            m.train_loss,
            csv_field(m.val_loss),
            csv_field(m.val_accuracy),
        )?;

        tracing::debug!("Logged epoch {} metrics: {}", m.epoch, m);
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
