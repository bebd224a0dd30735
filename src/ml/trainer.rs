// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Mini-batch gradient descent with Burn's DataLoader and Adam.
//
// Per call:
//   - the device is the configured one, or the device of the
//     model's first parameter
//   - a fresh Adam optimiser is bound to the model; it is
//     dropped when `fit` returns
//   - the DataLoader shuffles; every `iter()` reshuffles, so
//     each epoch sees a new batch order
//
// Per batch:
//   forward → batch-mean loss → backward → GradientsParams → step
//
// Burn computes fresh gradients on every `backward()`, so
// there is nothing to zero between steps. The model lives on
// the autodiff backend here, which is what "training mode"
// means in Burn (dropout active); `model.valid()` gives the
// evaluation twin used for validation.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use std::{marker::PhantomData, sync::Arc};

use anyhow::{ensure, Context, Result};
use burn::{
    data::{
        dataloader::{DataLoader, DataLoaderBuilder},
        dataset::Dataset,
    },
    module::AutodiffModule,
    nn::loss::Reduction,
    optim::{decay::WeightDecayConfig, AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::data::{
    batcher::{ArrayBatch, ArrayBatcher},
    dataset::ArrayDataset,
};
use crate::infra::metrics::EpochMetrics;
use crate::ml::{
    inferencer::Inferencer,
    loss::{Loss, NllLoss},
    model::{module_device, Forward},
};

// ─── FitConfig ────────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub batch_size:   usize,
    pub epochs:       usize,
    /// Adam learning rate
    pub lr:           f64,
    /// L2 penalty folded into Adam; `None` disables it
    pub weight_decay: Option<f32>,
    /// Shuffle seed; `None` draws one from the thread RNG
    pub seed:         Option<u64>,
    /// Report every epoch at info level instead of debug
    pub verbose:      bool,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            batch_size:   32,
            epochs:       1,
            lr:           1e-3,
            weight_decay: None,
            seed:         None,
            verbose:      false,
        }
    }
}

/// The trained model plus one metrics row per epoch.
#[derive(Debug)]
pub struct FitOutcome<M> {
    pub model:   M,
    pub history: Vec<EpochMetrics>,
}

// ─── Trainer ──────────────────────────────────────────────────────────────────
pub struct Trainer<B: AutodiffBackend, L = NllLoss> {
    config:     FitConfig,
    loss:       L,
    device:     Option<B::Device>,
    validation: Option<ArrayDataset>,
    _backend:   PhantomData<B>,
}

impl<B: AutodiffBackend> Trainer<B, NllLoss> {
    pub fn new(config: FitConfig) -> Self {
        Self {
            config,
            loss:       NllLoss,
            device:     None,
            validation: None,
            _backend:   PhantomData,
        }
    }
}

impl<B: AutodiffBackend, L> Trainer<B, L> {
    pub fn with_loss<L2>(self, loss: L2) -> Trainer<B, L2> {
        Trainer {
            config:     self.config,
            loss,
            device:     self.device,
            validation: self.validation,
            _backend:   PhantomData,
        }
    }

    /// Pin batches to `device` instead of the model's first parameter.
    pub fn with_device(mut self, device: B::Device) -> Self {
        self.device = Some(device);
        self
    }

    /// Evaluate on `dataset` after every epoch. Empty datasets are skipped.
    pub fn with_validation(mut self, dataset: ArrayDataset) -> Self {
        self.validation = (!dataset.is_empty()).then_some(dataset);
        self
    }

    /// Shuffling loader over `dataset`. Every `iter()` draws a new order;
    /// a fixed `FitConfig::seed` makes the sequence of orders repeatable.
    pub(crate) fn train_loader(
        &self,
        dataset: &ArrayDataset,
        device: &B::Device,
    ) -> Arc<dyn DataLoader<ArrayBatch<B>>> {
        let seed = self.config.seed.unwrap_or_else(rand::random);
        DataLoaderBuilder::new(ArrayBatcher::<B>::new(device.clone()))
            .batch_size(self.config.batch_size)
            .shuffle(seed)
            .build(dataset.clone())
    }

    /// Train `model` on `dataset` and hand it back with updated parameters.
    pub fn fit<M>(&self, model: M, dataset: &ArrayDataset) -> Result<M>
    where
        L: Loss<B> + Loss<B::InnerBackend>,
        M: AutodiffModule<B> + Forward<B>,
        M::InnerModule: Forward<B::InnerBackend>,
    {
        Ok(self.fit_with_history(model, dataset)?.model)
    }

    pub fn fit_with_history<M>(&self, mut model: M, dataset: &ArrayDataset) -> Result<FitOutcome<M>>
    where
        L: Loss<B> + Loss<B::InnerBackend>,
        M: AutodiffModule<B> + Forward<B>,
        M::InnerModule: Forward<B::InnerBackend>,
    {
        let cfg = &self.config;
        ensure!(cfg.batch_size > 0, "batch_size must be > 0");
        ensure!(!dataset.is_empty(), "cannot train on an empty dataset");
        ensure!(
            dataset.has_labels(),
            "training needs a label column; the dataset has {} column(s)",
            dataset.num_columns()
        );

        let device = match &self.device {
            Some(d) => d.clone(),
            None    => module_device::<B, M>(&model)?,
        };
        tracing::debug!("Training on device {:?}", device);

        // ── Adam optimiser ────────────────────────────────────────────────────
        let mut optim_cfg = AdamConfig::new();
        if let Some(penalty) = cfg.weight_decay {
            optim_cfg = optim_cfg.with_weight_decay(Some(WeightDecayConfig::new(penalty)));
        }
        let mut optim = optim_cfg.init::<B, M>();

        // ── Shuffling data loader ─────────────────────────────────────────────
        let loader = self.train_loader(dataset, &device);

        let mut history = Vec::with_capacity(cfg.epochs);

        for epoch in 1..=cfg.epochs {
            let mut loss_sum = 0.0f64;
            let mut batches  = 0usize;

            for batch in loader.iter() {
                let output  = model.forward(batch.inputs.to_device(&device));
                let targets = batch
                    .targets
                    .context("batch has no targets")?
                    .to_device(&device);

                let loss = <L as Loss<B>>::compute(&self.loss, output, targets, Reduction::Mean)?;
                loss_sum += loss.clone().into_scalar().elem::<f64>();
                batches  += 1;

                let grads = loss.backward();
                let grads = GradientsParams::from_grads(grads, &model);
                model = optim.step(cfg.lr, model, grads);
            }

            let train_loss = loss_sum / batches.max(1) as f64;

            let mut metrics = EpochMetrics::new(epoch, train_loss);
            if let Some(val) = &self.validation {
                let eval = Inferencer::<B::InnerBackend>::new()
                    .evaluate(&model.valid(), val, &self.loss)?;
                metrics = metrics.with_validation(eval.loss, eval.accuracy);
            }

            if cfg.verbose {
                tracing::info!("Epoch {:>3}/{} | {}", epoch, cfg.epochs, metrics);
            } else {
                tracing::debug!("Epoch {:>3}/{} | {}", epoch, cfg.epochs, metrics);
            }
            history.push(metrics);
        }

        Ok(FitOutcome { model, history })
    }
}

/// Fit with the default NLL loss. See [`Trainer`] for the knobs.
pub fn fit<B, M>(model: M, dataset: &ArrayDataset, config: FitConfig) -> Result<M>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + Forward<B>,
    M::InnerModule: Forward<B::InnerBackend>,
{
    Trainer::<B>::new(config).fit(model, dataset)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{dataset::dataset_from_arrays, synthetic::BlobSource};
    use crate::domain::{array::RawArray, traits::ArraySource};
    use crate::ml::model::{ClassifierConfig, LinearClassifier};

    type TestBackend = burn::backend::Autodiff<burn::backend::NdArray>;

    fn blobs(samples: usize, features: usize, classes: usize) -> ArrayDataset {
        let arrays = BlobSource::new(samples, features, classes, 11).load_arrays().unwrap();
        dataset_from_arrays(&arrays, None).unwrap()
    }

    fn classifier(input_dim: usize, classes: usize) -> LinearClassifier<TestBackend> {
        ClassifierConfig::new(input_dim, classes).init(&Default::default())
    }

    fn weights(model: &LinearClassifier<TestBackend>) -> Vec<f32> {
        model.output.weight.val().into_data().to_vec::<f32>().unwrap()
    }

    #[test]
    fn test_zero_epochs_leaves_parameters_unchanged() {
        let ds     = blobs(40, 4, 2);
        let model  = classifier(4, 2);
        let before = weights(&model);

        let config = FitConfig { epochs: 0, ..Default::default() };
        let model  = fit::<TestBackend, _>(model, &ds, config).unwrap();
        assert_eq!(weights(&model), before);
    }

    #[test]
    fn test_training_changes_parameters() {
        let ds     = blobs(40, 4, 2);
        let model  = classifier(4, 2);
        let before = weights(&model);

        let config = FitConfig { epochs: 2, batch_size: 8, seed: Some(1), ..Default::default() };
        let model  = fit::<TestBackend, _>(model, &ds, config).unwrap();
        assert_ne!(weights(&model), before);
    }

    #[test]
    fn test_linear_classifier_loss_goes_down() {
        // features (100, 10), integer labels in [0, 3)
        let ds    = blobs(100, 10, 3);
        let model = classifier(10, 3);

        let before = Inferencer::<burn::backend::NdArray>::new()
            .evaluate(&model.valid(), &ds, &NllLoss)
            .unwrap()
            .loss;

        let config  = FitConfig { epochs: 5, batch_size: 32, seed: Some(5), ..Default::default() };
        let outcome = Trainer::<TestBackend>::new(config).fit_with_history(model, &ds).unwrap();

        let after = Inferencer::<burn::backend::NdArray>::new()
            .evaluate(&outcome.model.valid(), &ds, &NllLoss)
            .unwrap()
            .loss;

        assert_eq!(outcome.history.len(), 5);
        assert!(after < before, "loss went from {before} to {after}");
    }

    #[test]
    fn test_validation_metrics_are_recorded() {
        let ds  = blobs(60, 3, 2);
        let val = ds.subset(&(0..20).collect::<Vec<_>>()).unwrap();

        let config  = FitConfig { epochs: 2, seed: Some(2), ..Default::default() };
        let outcome = Trainer::<TestBackend>::new(config)
            .with_validation(val)
            .fit_with_history(classifier(3, 2), &ds)
            .unwrap();

        for m in &outcome.history {
            assert!(m.val_loss.is_some());
            let acc = m.val_accuracy.unwrap();
            assert!((0.0..=1.0).contains(&acc));
        }
    }

    fn epoch_orders(trainer: &Trainer<TestBackend>, ds: &ArrayDataset, epochs: usize) -> Vec<Vec<f32>> {
        let loader = trainer.train_loader(ds, &Default::default());
        (0..epochs)
            .map(|_| {
                loader
                    .iter()
                    .flat_map(|b| b.inputs.into_data().to_vec::<f32>().unwrap())
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_batches_are_reshuffled_every_epoch() {
        // one column whose value is the row index, so a batch reveals the order
        let n      = 64;
        let index  = RawArray::new((0..n).map(|i| i as f32).collect(), [n]).unwrap();
        let ds     = dataset_from_arrays(&[index], None).unwrap();
        let config = FitConfig { batch_size: 16, seed: Some(4), ..Default::default() };
        let in_order: Vec<f32> = (0..n).map(|i| i as f32).collect();

        let orders = epoch_orders(&Trainer::<TestBackend>::new(config.clone()), &ds, 2);
        for order in &orders {
            let mut sorted = order.clone();
            sorted.sort_by(f32::total_cmp);
            assert_eq!(sorted, in_order, "every sample appears exactly once");
            assert_ne!(order, &in_order);
        }
        assert_ne!(orders[0], orders[1]);

        // the same seed replays the same sequence of epoch orders
        let replay = epoch_orders(&Trainer::<TestBackend>::new(config), &ds, 2);
        assert_eq!(orders, replay);
    }

    #[test]
    fn test_empty_dataset_is_rejected() {
        let ds    = blobs(20, 3, 2);
        let empty = ds.subset(&[]).unwrap();
        let config = FitConfig { epochs: 3, ..Default::default() };
        let err = Trainer::<TestBackend>::new(config)
            .fit_with_history(classifier(3, 2), &empty)
            .unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_unlabelled_dataset_is_rejected() {
        let x  = RawArray::new(vec![0.0f32; 8], [4, 2]).unwrap();
        let ds = dataset_from_arrays(&[x], None).unwrap();
        let err = fit::<TestBackend, _>(classifier(2, 2), &ds, FitConfig::default()).unwrap_err();
        assert!(err.to_string().contains("label"));
    }

    #[test]
    fn test_float_labels_with_nll_fail() {
        let x  = RawArray::new(vec![1.0f32; 8], [4, 2]).unwrap();
        let y  = RawArray::new(vec![0.5f64; 4], [4]).unwrap();
        let ds = dataset_from_arrays(&[x, y], None).unwrap();
        assert!(fit::<TestBackend, _>(classifier(2, 2), &ds, FitConfig::default()).is_err());
    }
}
