// ============================================================
// Layer 2 — PredictUseCase
// ============================================================
// Rebuilds the trained model and applies it:
//
//   Step 1: Load train_config.json     (Layer 6 - infra)
//   Step 2: Rebuild + load weights     (Layer 5/6)
//   Step 3: Load arrays → dataset      (Layer 4/6)
//   Step 4: Apply (ordered, no grads)  (Layer 5 - ml)
//   Step 5: Score against labels, if the data carries them
//   Step 6: Write outputs JSON, if asked

use anyhow::{anyhow, ensure, Result};
use burn::tensor::TensorData;
use std::path::PathBuf;

use crate::application::train_use_case::TrainConfig;
use crate::data::dataset::dataset_from_arrays;
use crate::domain::array::RawArray;
use crate::infra::{array_store::JsonArrayStore, checkpoint::CheckpointManager};
use crate::ml::{
    backend::InferBackend,
    inferencer::Inferencer,
    loss::NllLoss,
    model::LinearClassifier,
};

/// Outputs of one prediction run.
#[derive(Debug, Clone)]
pub struct PredictReport {
    /// Log-probabilities, shape [samples, classes]
    pub outputs:  TensorData,
    /// Present when the data had an integer label column
    pub accuracy: Option<f64>,
}

impl PredictReport {
    pub fn samples(&self) -> usize {
        self.outputs.shape[0]
    }
}

pub struct PredictUseCase {
    config: TrainConfig,
    model:  LinearClassifier<InferBackend>,
}

impl PredictUseCase {
    /// Load the config and latest weights from `checkpoint_dir`.
    pub fn new(checkpoint_dir: impl Into<PathBuf>) -> Result<Self> {
        let ckpt   = CheckpointManager::new(checkpoint_dir)?;
        let config = ckpt.load_config()?;

        let device = Default::default();
        let model  = config.classifier().init::<InferBackend>(&device);
        let model  = ckpt.load_model::<InferBackend, _>(model, &device)?;
        tracing::info!("Model loaded from checkpoint");

        Ok(Self { config, model })
    }

    /// Apply the model to `data` (or, without a file, to the synthetic
    /// data the model was trained on) and optionally save the outputs.
    pub fn predict(&self, data: Option<String>, output: Option<String>) -> Result<PredictReport> {
        let source = match data {
            Some(path) => TrainConfig { data: Some(path), ..self.config.clone() }.source(),
            None       => self.config.source(),
        };
        tracing::info!("Loading {}", source.describe());
        let arrays = source.load_arrays()?;

        let dataset = dataset_from_arrays(&arrays, None)?;
        ensure!(
            arrays[0].row_len() == self.config.input_dim,
            "model expects {} inputs per sample, data has {}",
            self.config.input_dim, arrays[0].row_len()
        );

        let inferencer = Inferencer::<InferBackend>::new();
        let outputs    = inferencer.apply(&self.model, &dataset)?;

        let accuracy = match arrays.get(1) {
            Some(labels) if !labels.element_type().is_float() => {
                inferencer.evaluate(&self.model, &dataset, &NllLoss)?.accuracy
            }
            _ => None,
        };

        if let Some(path) = output {
            let values = outputs
                .to_vec::<f32>()
                .map_err(|e| anyhow!("cannot read outputs: {e:?}"))?;
            let array = RawArray::new(values, outputs.shape.clone())?;
            JsonArrayStore::save(&path, &[array])?;
            tracing::info!("Wrote outputs to '{}'", path);
        }

        Ok(PredictReport { outputs, accuracy })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::TrainUseCase;
    use crate::domain::traits::ArraySource;

    #[test]
    fn test_predict_after_train() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = TrainConfig {
            samples:        40,
            features:       3,
            classes:        2,
            seed:           Some(8),
            epochs:         1,
            checkpoint_dir: dir.path().display().to_string(),
            ..Default::default()
        };
        TrainUseCase::new(cfg).execute().unwrap();

        let out_path = dir.path().join("preds.json").display().to_string();
        let report = PredictUseCase::new(dir.path())
            .unwrap()
            .predict(None, Some(out_path.clone()))
            .unwrap();

        assert_eq!(report.samples(), 40);
        assert_eq!(report.outputs.shape, vec![40, 2]);
        assert!(report.accuracy.is_some());

        let saved = JsonArrayStore::new(out_path).load_arrays().unwrap();
        assert_eq!(saved[0].shape(), &[40, 2]);
    }

    #[test]
    fn test_predict_without_checkpoint_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(PredictUseCase::new(dir.path()).is_err());
    }
}
