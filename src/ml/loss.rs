// ============================================================
// Layer 5 — Loss Functions
// ============================================================
// A loss takes (prediction, target, reduction) and returns a
// one-element tensor the trainer can call `.backward()` on.
//
//   NllLoss           log-probabilities + class indices (default)
//   CrossEntropyLoss  raw logits + class indices
//   MseLoss           float predictions + float targets
//
// Targets come from the dataset's second column; the batcher
// decides between Classes and Values from its dtype, and a
// loss rejects the kind it cannot handle instead of panicking
// deep inside a tensor op.
//
// Reference: Burn Book §3 (Building Blocks — loss functions)

use anyhow::{bail, ensure, Result};
use burn::{
    nn::loss::{MseLoss as BurnMse, Reduction},
    prelude::*,
    tensor::activation::log_softmax,
};

use crate::data::batcher::Targets;

/// Loss used by the trainer and by evaluation.
pub trait Loss<B: Backend>: Send + Sync {
    fn compute(&self, output: Tensor<B, 2>, targets: Targets<B>, reduction: Reduction) -> Result<Tensor<B, 1>>;
}

fn reduce<B: Backend, const D: usize>(values: Tensor<B, D>, reduction: Reduction) -> Tensor<B, 1> {
    match reduction {
        Reduction::Sum => values.sum(),
        Reduction::Mean | Reduction::Auto => values.mean(),
    }
}

fn check_rows<B: Backend>(output: &Tensor<B, 2>, targets: &Targets<B>) -> Result<()> {
    let [rows, _] = output.dims();
    ensure!(
        rows == targets.rows(),
        "model produced {} rows but the batch has {} targets",
        rows, targets.rows()
    );
    Ok(())
}

// ─── NllLoss ──────────────────────────────────────────────────────────────────
/// Negative log-likelihood: `-output[i, target[i]]`, reduced over the batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct NllLoss;

impl<B: Backend> Loss<B> for NllLoss {
    fn compute(&self, output: Tensor<B, 2>, targets: Targets<B>, reduction: Reduction) -> Result<Tensor<B, 1>> {
        check_rows(&output, &targets)?;
        let Targets::Classes(classes) = targets else {
            bail!("nll loss needs integer class labels, got float targets");
        };
        // gather panics on an out-of-range index, so check the label range first
        let [_, width] = output.dims();
        let lowest  = classes.clone().min().into_scalar().elem::<i64>();
        let highest = classes.clone().max().into_scalar().elem::<i64>();
        ensure!(
            lowest >= 0 && (highest as usize) < width,
            "class label out of range: labels span [{}, {}] but the model has {} outputs",
            lowest, highest, width
        );
        // gather along the class axis → [batch, 1]
        let picked = output.gather(1, classes.unsqueeze_dim::<2>(1)).neg();
        Ok(reduce(picked, reduction))
    }
}

// ─── CrossEntropyLoss ─────────────────────────────────────────────────────────
/// NLL over `log_softmax(output)`, for models that emit raw logits.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrossEntropyLoss;

impl<B: Backend> Loss<B> for CrossEntropyLoss {
    fn compute(&self, output: Tensor<B, 2>, targets: Targets<B>, reduction: Reduction) -> Result<Tensor<B, 1>> {
        NllLoss.compute(log_softmax(output, 1), targets, reduction)
    }
}

// ─── MseLoss ──────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, Default)]
pub struct MseLoss;

impl<B: Backend> Loss<B> for MseLoss {
    fn compute(&self, output: Tensor<B, 2>, targets: Targets<B>, reduction: Reduction) -> Result<Tensor<B, 1>> {
        check_rows(&output, &targets)?;
        let Targets::Values(values) = targets else {
            bail!("mse loss needs float targets, got class labels");
        };
        ensure!(
            output.dims() == values.dims(),
            "prediction shape {:?} does not match target shape {:?}",
            output.dims(), values.dims()
        );
        Ok(BurnMse::new().forward(output, values, reduction))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray;

    fn scalar(t: Tensor<TestBackend, 1>) -> f32 {
        t.into_scalar().elem::<f32>()
    }

    fn log_probs() -> Tensor<TestBackend, 2> {
        let device = Default::default();
        Tensor::<TestBackend, 2>::from_floats(
            [[0.5f32.ln(), 0.5f32.ln()], [0.25f32.ln(), 0.75f32.ln()]],
            &device,
        )
    }

    fn classes(labels: [i64; 2]) -> Targets<TestBackend> {
        let device = Default::default();
        Targets::Classes(Tensor::<TestBackend, 1, Int>::from_ints(labels, &device))
    }

    #[test]
    fn test_nll_mean_and_sum() {
        let expected_sum = 2.0f32.ln() - 0.75f32.ln();

        let mean = scalar(NllLoss.compute(log_probs(), classes([0, 1]), Reduction::Mean).unwrap());
        assert!((mean - expected_sum / 2.0).abs() < 1e-5);

        let sum = scalar(NllLoss.compute(log_probs(), classes([0, 1]), Reduction::Sum).unwrap());
        assert!((sum - expected_sum).abs() < 1e-5);
    }

    #[test]
    fn test_cross_entropy_matches_nll_on_logits() {
        // log_softmax is shift-invariant, so adding 3 to the log-probs changes nothing
        let logits = log_probs() + 3.0;
        let ce  = scalar(CrossEntropyLoss.compute(logits, classes([1, 0]), Reduction::Mean).unwrap());
        let nll = scalar(NllLoss.compute(log_probs(), classes([1, 0]), Reduction::Mean).unwrap());
        assert!((ce - nll).abs() < 1e-5);
    }

    #[test]
    fn test_mse() {
        let device = Default::default();
        let pred   = Tensor::<TestBackend, 2>::from_floats([[1.0], [3.0]], &device);
        let target = Targets::Values(Tensor::<TestBackend, 2>::from_floats([[0.0], [1.0]], &device));
        let loss   = scalar(MseLoss.compute(pred, target, Reduction::Mean).unwrap());
        assert!((loss - 2.5).abs() < 1e-6);
    }

    #[test]
    fn test_wrong_target_kind_is_an_error() {
        let device = Default::default();
        let values = Targets::Values(Tensor::<TestBackend, 2>::zeros([2, 2], &device));
        assert!(NllLoss.compute(log_probs(), values, Reduction::Mean).is_err());
        assert!(MseLoss.compute(log_probs(), classes([0, 0]), Reduction::Mean).is_err());
    }

    #[test]
    fn test_label_beyond_output_width_is_an_error() {
        let err = NllLoss.compute(log_probs(), classes([0, 2]), Reduction::Mean).unwrap_err();
        assert!(err.to_string().contains("out of range"));
        assert!(NllLoss.compute(log_probs(), classes([-1, 0]), Reduction::Sum).is_err());
        assert!(CrossEntropyLoss.compute(log_probs(), classes([1, 7]), Reduction::Mean).is_err());
    }

    #[test]
    fn test_row_mismatch_is_an_error() {
        let device = Default::default();
        let three = Targets::Classes(Tensor::<TestBackend, 1, Int>::from_ints([0, 1, 0], &device));
        assert!(NllLoss.compute(log_probs(), three, Reduction::Mean).is_err());
    }
}
