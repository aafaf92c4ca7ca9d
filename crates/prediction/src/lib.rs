//! Reconstruction model boundary.
//!
//! The model is an opaque [`Predictor`]: normalized frames go in, a
//! [`PredictionResult`] with a loosely defined schema comes out. The
//! [`PredictionAdapter`] resolves each canonical Gaussian field through an
//! ordered [`AliasTable`] and materializes a [`recon_common::GaussianSet`].

pub mod adapter;
pub mod aliases;
pub mod error;
pub mod predictor;
pub mod result;
pub mod tensor;

pub use adapter::PredictionAdapter;
pub use aliases::{AliasTable, CanonicalField};
pub use error::{AdapterError, PredictError, TensorError};
pub use predictor::{HttpPredictor, Predictor, PredictorConfig};
pub use result::{AttributeBag, PredictionResult, SplatHeadOutput};
pub use tensor::{Tensor, TensorData};
