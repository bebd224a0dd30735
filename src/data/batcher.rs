// ============================================================
// Layer 4 — Array Batcher
// ============================================================
// Implements Burn's Batcher trait to convert a Vec<Sample>
// into tensors on the batcher's device.
//
// How batching works here:
//   Input:  N samples, field 0 holding `row_len` numbers each
//   Output: inputs  [N, row_len]   (float)
//           targets [N]            (int labels → Classes)
//                or [N, k]         (float labels → Values)
//
// Every feature row is flattened, so a [N, 4, 4] column
// reaches the model as [N, 16]. Columns after the second are
// never batched.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
    tensor::TensorData,
};

use crate::data::dataset::Sample;

// ─── Targets ──────────────────────────────────────────────────────────────────
/// Label tensor for one batch. The kind follows the label column's dtype.
#[derive(Debug, Clone)]
pub enum Targets<B: Backend> {
    /// Integer class indices — shape: [batch_size]
    Classes(Tensor<B, 1, Int>),
    /// Float regression targets — shape: [batch_size, k]
    Values(Tensor<B, 2>),
}

impl<B: Backend> Targets<B> {
    pub fn to_device(self, device: &B::Device) -> Self {
        match self {
            Targets::Classes(t) => Targets::Classes(t.to_device(device)),
            Targets::Values(t)  => Targets::Values(t.to_device(device)),
        }
    }

    /// Number of samples the targets cover.
    pub fn rows(&self) -> usize {
        match self {
            Targets::Classes(t) => t.dims()[0],
            Targets::Values(t)  => t.dims()[0],
        }
    }
}

// ─── ArrayBatch ───────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct ArrayBatch<B: Backend> {
    /// Model input — shape: [batch_size, row_len]
    pub inputs: Tensor<B, 2>,

    /// `None` when the dataset has a single column or the
    /// batcher was built with `inputs_only`.
    pub targets: Option<Targets<B>>,
}

// ─── ArrayBatcher ─────────────────────────────────────────────────────────────
/// Holds the target device so tensors are created where the model lives.
#[derive(Clone, Debug)]
pub struct ArrayBatcher<B: Backend> {
    device:       B::Device,
    with_targets: bool,
}

impl<B: Backend> ArrayBatcher<B> {
    /// Batch the input column and, when present, the label column.
    pub fn new(device: B::Device) -> Self {
        Self { device, with_targets: true }
    }

    /// Batch only the input column; labels are ignored.
    pub fn inputs_only(device: B::Device) -> Self {
        Self { device, with_targets: false }
    }
}

impl<B: Backend> Batcher<Sample, ArrayBatch<B>> for ArrayBatcher<B> {
    fn batch(&self, items: Vec<Sample>) -> ArrayBatch<B> {
        let batch_size = items.len();
        let row_len    = items[0].fields[0].values.len();

        let input_flat: Vec<f32> = items
            .iter()
            .flat_map(|s| s.fields[0].values.to_f32_vec())
            .collect();
        let inputs = Tensor::<B, 2>::from_data(
            TensorData::new(input_flat, [batch_size, row_len]).convert::<B::FloatElem>(),
            &self.device,
        );

        let targets = match items[0].fields.get(1) {
            Some(label) if self.with_targets => {
                if label.values.element_type().is_float() {
                    let width = label.values.len();
                    let flat: Vec<f32> = items
                        .iter()
                        .flat_map(|s| s.fields[1].values.to_f32_vec())
                        .collect();
                    Some(Targets::Values(Tensor::<B, 2>::from_data(
                        TensorData::new(flat, [batch_size, width]).convert::<B::FloatElem>(),
                        &self.device,
                    )))
                } else {
                    let flat: Vec<i64> = items
                        .iter()
                        .flat_map(|s| s.fields[1].values.to_i64_vec())
                        .collect();
                    let count = flat.len();
                    Some(Targets::Classes(Tensor::<B, 1, Int>::from_data(
                        TensorData::new(flat, [count]).convert::<B::IntElem>(),
                        &self.device,
                    )))
                }
            }
            _ => None,
        };

        ArrayBatch { inputs, targets }
    }
}
