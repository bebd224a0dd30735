//! Turn numeric arrays into burn datasets, fit models on them with Adam,
//! and collect model outputs in dataset order.
//!
//! ```ignore
//! let ds    = dataset_from_arrays(&[features, labels], None)?;
//! let model = fit::<Autodiff<NdArray>, _>(model, &ds, FitConfig::default())?;
//! let out   = apply_trained::<Autodiff<NdArray>, _>(&model, &ds)?;
//! ```
#![recursion_limit = "256"]

pub mod application;
pub mod cli;
pub mod data;
pub mod domain;
pub mod infra;
pub mod ml;

pub use data::dataset::{dataset_from_arrays, ArrayDataset};
pub use domain::array::{ElementType, RawArray};
pub use ml::inferencer::{apply, apply_trained, Inferencer};
pub use ml::loss::{CrossEntropyLoss, Loss, MseLoss, NllLoss};
pub use ml::model::Forward;
pub use ml::trainer::{fit, FitConfig, Trainer};
