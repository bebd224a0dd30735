use anyhow::{Context, Result};
use burn::{
    nn::{Dropout, DropoutConfig, Linear, LinearConfig},
    prelude::*,
    tensor::activation::{log_softmax, relu},
};

// ─── Forward ──────────────────────────────────────────────────────────────────
/// The one capability the trainer and inferencer need from a model.
///
/// Inputs are per-sample rows flattened to `[batch, row_len]`.
/// Implement it for every backend (`impl<B: Backend> Forward<B> for M<B>`)
/// so the `.valid()` twin of an autodiff model can be applied too.
pub trait Forward<B: Backend> {
    fn forward(&self, inputs: Tensor<B, 2>) -> Tensor<B, 2>;
}

/// Device of the model's first parameter.
///
/// Fails for parameterless modules; configure a device explicitly for those.
pub fn module_device<B: Backend, M: Module<B>>(model: &M) -> Result<B::Device> {
    model
        .devices()
        .into_iter()
        .next()
        .context("model has no parameters to infer a device from; set one explicitly")
}

// ─── Reference classifier ─────────────────────────────────────────────────────
// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct ClassifierConfig {
    pub input_dim:   usize,
    pub num_classes: usize,
    /// 0 = no hidden layer, i.e. plain multinomial logistic regression
    #[config(default = 0)]
    pub hidden_dim:  usize,
    #[config(default = 0.0)]
    pub dropout:     f64,
}

impl ClassifierConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> LinearClassifier<B> {
        let (hidden, head_in) = if self.hidden_dim > 0 {
            let layer = LinearConfig::new(self.input_dim, self.hidden_dim).init(device);
            (Some(layer), self.hidden_dim)
        } else {
            (None, self.input_dim)
        };
        LinearClassifier {
            hidden,
            output:  LinearConfig::new(head_in, self.num_classes).init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
        }
    }
}

/// `[batch, input_dim]` → log-probabilities `[batch, num_classes]`.
#[derive(Module, Debug)]
pub struct LinearClassifier<B: Backend> {
    pub hidden:  Option<Linear<B>>,
    pub output:  Linear<B>,
    pub dropout: Dropout,
}

impl<B: Backend> Forward<B> for LinearClassifier<B> {
    fn forward(&self, inputs: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = match &self.hidden {
            Some(layer) => relu(layer.forward(inputs)),
            None        => inputs,
        };
        // Dropout is only active on autodiff backends.
        let x = self.dropout.forward(x);
        log_softmax(self.output.forward(x), 1)
    }
}
