// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Runs a model over a dataset in fixed batches, in dataset
// order, and collects every output row on the host.
//
//   dataset ──(no shuffle, 512 per batch, column 0 only)──▶ model
//        └─ each batch output ─ into_data() ─▶ host rows ─ concat ─▶ [N, k]
//
// Eval mode: pass a plain-backend model, or use
// `apply_trained` which calls `.valid()` on an autodiff model
// (inner backend: dropout off, no graph). Autodiff models
// handed straight to `apply` or `evaluate` are rejected. The returned
// TensorData is plain host memory and carries no autograd
// state whatever backend produced it.

use std::marker::PhantomData;

use anyhow::{anyhow, bail, ensure, Result};
use burn::{
    data::{dataloader::DataLoaderBuilder, dataset::Dataset},
    module::AutodiffModule,
    nn::loss::Reduction,
    prelude::*,
    tensor::{backend::AutodiffBackend, TensorData},
};

use crate::data::{
    batcher::{ArrayBatcher, Targets},
    dataset::ArrayDataset,
};
use crate::ml::{
    loss::Loss,
    model::{module_device, Forward},
};

/// Batch size used for inference unless overridden.
pub const APPLY_BATCH_SIZE: usize = 512;

/// Result of an ordered evaluation pass.
#[derive(Debug, Clone, Copy)]
pub struct Evaluation {
    /// Mean loss per sample
    pub loss:     f64,
    /// Argmax accuracy; `None` for float targets
    pub accuracy: Option<f64>,
    pub samples:  usize,
}

pub struct Inferencer<B: Backend> {
    batch_size: usize,
    device:     Option<B::Device>,
    _backend:   PhantomData<B>,
}

impl<B: Backend> Default for Inferencer<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> Inferencer<B> {
    pub fn new() -> Self {
        Self {
            batch_size: APPLY_BATCH_SIZE,
            device:     None,
            _backend:   PhantomData,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_device(mut self, device: B::Device) -> Self {
        self.device = Some(device);
        self
    }

    fn resolve_device<M: Module<B>>(&self, model: &M) -> Result<B::Device> {
        match &self.device {
            Some(d) => Ok(d.clone()),
            None    => module_device::<B, M>(model),
        }
    }

    /// Forward every sample and return the outputs, row i for sample i.
    ///
    /// Columns after the first are ignored.
    pub fn apply<M>(&self, model: &M, dataset: &ArrayDataset) -> Result<TensorData>
    where
        M: Module<B> + Forward<B>,
    {
        ensure!(
            !B::ad_enabled(),
            "model is on an autodiff backend; use apply_trained to run its eval twin"
        );
        ensure!(!dataset.is_empty(), "cannot apply a model to an empty dataset");
        ensure!(self.batch_size > 0, "batch_size must be > 0");

        let device = self.resolve_device(model)?;
        let loader = DataLoaderBuilder::new(ArrayBatcher::<B>::inputs_only(device.clone()))
            .batch_size(self.batch_size)
            .build(dataset.clone());

        let mut rows:  Vec<f32>      = Vec::new();
        let mut width: Option<usize> = None;
        let mut count  = 0usize;

        for batch in loader.iter() {
            let output = model.forward(batch.inputs.to_device(&device));
            let [n, k] = output.dims();
            match width {
                None                 => width = Some(k),
                Some(w) if w != k    => bail!("model output width changed from {} to {}", w, k),
                Some(_)              => {}
            }

            // device → host
            let host = output
                .into_data()
                .convert::<f32>()
                .to_vec::<f32>()
                .map_err(|e| anyhow!("cannot read model output: {e:?}"))?;
            rows.extend(host);
            count += n;
        }

        let width = width.unwrap_or(0);
        tracing::debug!("Applied model to {} samples ({} outputs each)", count, width);
        Ok(TensorData::new(rows, [count, width]))
    }

    /// Ordered pass that reports mean loss and, for class labels, accuracy.
    pub fn evaluate<M, L>(&self, model: &M, dataset: &ArrayDataset, loss: &L) -> Result<Evaluation>
    where
        M: Module<B> + Forward<B>,
        L: Loss<B>,
    {
        ensure!(
            !B::ad_enabled(),
            "model is on an autodiff backend; evaluate its `.valid()` twin"
        );
        ensure!(!dataset.is_empty(), "cannot evaluate on an empty dataset");
        ensure!(dataset.has_labels(), "evaluation needs a label column");

        let device = self.resolve_device(model)?;
        let loader = DataLoaderBuilder::new(ArrayBatcher::<B>::new(device.clone()))
            .batch_size(self.batch_size)
            .build(dataset.clone());

        let mut loss_sum = 0.0f64;
        let mut correct  = 0i64;
        let mut samples  = 0usize;
        let mut classes  = true;

        for batch in loader.iter() {
            let output = model.forward(batch.inputs.to_device(&device));
            let Some(targets) = batch.targets else {
                bail!("batch has no targets");
            };
            let targets = targets.to_device(&device);
            samples += targets.rows();

            if let Targets::Classes(labels) = &targets {
                // argmax(1) returns [batch, 1]; flatten before comparing with [batch]
                let predicted = output.clone().argmax(1).flatten::<1>(0, 1);
                correct += predicted
                    .equal(labels.clone())
                    .int()
                    .sum()
                    .into_scalar()
                    .elem::<i64>();
            } else {
                classes = false;
            }

            let batch_loss = <L as Loss<B>>::compute(loss, output, targets, Reduction::Sum)?;
            loss_sum += batch_loss.into_scalar().elem::<f64>();
        }

        Ok(Evaluation {
            loss:     loss_sum / samples.max(1) as f64,
            accuracy: classes.then(|| correct as f64 / samples.max(1) as f64),
            samples,
        })
    }
}

/// Apply with default settings (batches of 512, device from the model).
pub fn apply<B, M>(model: &M, dataset: &ArrayDataset) -> Result<TensorData>
where
    B: Backend,
    M: Module<B> + Forward<B>,
{
    Inferencer::<B>::new().apply(model, dataset)
}

/// Switch an autodiff-trained model to eval mode (`.valid()`) and apply it.
pub fn apply_trained<B, M>(model: &M, dataset: &ArrayDataset) -> Result<TensorData>
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
    M::InnerModule: Forward<B::InnerBackend>,
{
    Inferencer::<B::InnerBackend>::new().apply(&model.valid(), dataset)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::dataset_from_arrays;
    use crate::domain::array::RawArray;
    use crate::ml::{
        loss::NllLoss,
        model::{ClassifierConfig, LinearClassifier},
    };

    type TestBackend = burn::backend::NdArray;

    fn ramp_dataset(n: usize, features: usize) -> (RawArray, ArrayDataset) {
        let x = RawArray::new(
            (0..n * features).map(|v| (v % 97) as f32 / 97.0).collect(),
            [n, features],
        )
        .unwrap();
        let y = RawArray::new((0..n).map(|v| (v % 3) as i64).collect(), [n]).unwrap();
        let ds = dataset_from_arrays(&[x.clone(), y], None).unwrap();
        (x, ds)
    }

    #[test]
    fn test_output_rows_follow_dataset_order() {
        let device = Default::default();
        let model: LinearClassifier<TestBackend> = ClassifierConfig::new(4, 3).init(&device);
        let (x, ds) = ramp_dataset(1000, 4);

        let out = apply::<TestBackend, _>(&model, &ds).unwrap();
        assert_eq!(out.shape, vec![1000, 3]);

        // one big forward over the whole array is the reference ordering
        let full = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(x.to_vec::<f32>().unwrap(), [1000, 4]),
            &device,
        );
        let expected = model.forward(full).into_data().to_vec::<f32>().unwrap();
        let got      = out.to_vec::<f32>().unwrap();
        for (i, (a, b)) in got.iter().zip(expected.iter()).enumerate() {
            assert!((a - b).abs() < 1e-5, "row {} differs: {a} vs {b}", i / 3);
        }
    }

    #[test]
    fn test_batch_size_does_not_change_outputs() {
        let device = Default::default();
        let model: LinearClassifier<TestBackend> = ClassifierConfig::new(4, 2).init(&device);
        let (_, ds) = ramp_dataset(50, 4);

        let big   = Inferencer::<TestBackend>::new().apply(&model, &ds).unwrap();
        let small = Inferencer::<TestBackend>::new().with_batch_size(7).apply(&model, &ds).unwrap();
        assert_eq!(big.to_vec::<f32>().unwrap(), small.to_vec::<f32>().unwrap());
    }

    #[test]
    fn test_apply_trained_uses_eval_twin() {
        type Ad = burn::backend::Autodiff<TestBackend>;
        let model: LinearClassifier<Ad> = ClassifierConfig::new(4, 3)
            .with_dropout(0.9)
            .init(&Default::default());
        let (_, ds) = ramp_dataset(10, 4);

        // dropout is off in eval mode, so two passes agree exactly
        let a = apply_trained::<Ad, _>(&model, &ds).unwrap();
        let b = apply_trained::<Ad, _>(&model, &ds).unwrap();
        assert_eq!(a.shape, vec![10, 3]);
        assert_eq!(a.to_vec::<f32>().unwrap(), b.to_vec::<f32>().unwrap());
    }

    #[test]
    fn test_autodiff_model_is_rejected() {
        type Ad = burn::backend::Autodiff<TestBackend>;
        let model: LinearClassifier<Ad> = ClassifierConfig::new(4, 3)
            .with_dropout(0.9)
            .init(&Default::default());
        let (_, ds) = ramp_dataset(10, 4);

        let err = apply::<Ad, _>(&model, &ds).unwrap_err();
        assert!(err.to_string().contains("apply_trained"));
        assert!(Inferencer::<Ad>::new().evaluate(&model, &ds, &NllLoss).is_err());
    }

    #[test]
    fn test_out_of_range_label_is_an_error() {
        let model: LinearClassifier<TestBackend> =
            ClassifierConfig::new(2, 2).init(&Default::default());
        let x  = RawArray::new(vec![0.1f32, 0.2, 0.3, 0.4, 0.5, 0.6], [3, 2]).unwrap();
        let y  = RawArray::new(vec![0i64, 1, 5], [3]).unwrap();
        let ds = dataset_from_arrays(&[x, y], None).unwrap();

        let err = Inferencer::<TestBackend>::new().evaluate(&model, &ds, &NllLoss).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_empty_dataset_is_rejected() {
        let model: LinearClassifier<TestBackend> =
            ClassifierConfig::new(4, 2).init(&Default::default());
        let (_, ds) = ramp_dataset(5, 4);
        let empty = ds.subset(&[]).unwrap();
        assert!(apply::<TestBackend, _>(&model, &empty).is_err());
    }

    #[test]
    fn test_evaluate_reports_accuracy() {
        let model: LinearClassifier<TestBackend> =
            ClassifierConfig::new(4, 3).init(&Default::default());
        let (_, ds) = ramp_dataset(30, 4);

        let eval = Inferencer::<TestBackend>::new()
            .with_batch_size(8)
            .evaluate(&model, &ds, &NllLoss)
            .unwrap();
        assert_eq!(eval.samples, 30);
        assert!(eval.loss.is_finite() && eval.loss > 0.0);
        let acc = eval.accuracy.unwrap();
        assert!((0.0..=1.0).contains(&acc));
    }
}
