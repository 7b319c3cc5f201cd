//! # scat-scattering
//!
//! Scattering transform and Scattering Spectra statistics of multichannel
//! time series, with the adjoint needed for gradient-based synthesis.
//!
//! ## Pipeline
//!
//! ```mermaid
//! graph LR
//!     A["TimeSeries (R, N, T)"] -->|"forward"| B["ScatteringField"]
//!     B -->|"reduce + EstimationOperator"| C["DescribedTensor (R, C, T′)"]
//!     C -.->|"Model::backward"| A
//! ```
//!
//! ## Statistics
//!
//! | Type | Row | Normalization |
//! |------|-----|---------------|
//! | mean | `avg x_n` | none |
//! | spars | `avg |W_k|` | `σ_k` |
//! | variance | `avg W_{nl,k} · conj(W_{nr,k})` | none |
//! | skewness | `avg U_{k1,k2} · conj(W_{k2})` | `σ_{k1} σ_{k2}` |
//! | kurtosis | `avg U_{k1,k3} · conj(U_{k2,k3})` | `σ_{k1} σ_{k2}` |
//!
//! with `W_k = x ⋆ ψ_k`, `U_{k1,k2} = |W_{k1}| ⋆ ψ_{k2}` and
//! `σ_k = sqrt(avg_t |W_k|²)`.
//!
//! ## Quick Start
//!
//! ```ignore
//! use scat_scattering::{ExecutionContext, ModelConfig, analyze};
//! use scat_wavelet::TimeSeries;
//!
//! let x = TimeSeries::from_single(samples)?;
//! let stats = analyze(&x, &ModelConfig::new(6, 1), &ExecutionContext::sequential())?;
//! assert_eq!(stats.n_coeffs(), 69);
//! ```

mod adjoint;
mod context;
mod error;
mod estimator;
mod extract;
mod indexer;
mod model;
mod plan;
mod transform;

pub use context::ExecutionContext;
pub use error::ScatteringError;
pub use estimator::{Averager, EstimationOperator};
pub use extract::{ScaleNormalization, batch_sigma, wavelet_sigma};
pub use indexer::ScaleIndexer;
pub use model::{Evaluation, Model, ModelConfig, ModelType, analyze};
pub use plan::single_channel_row_count;
pub use transform::{ScatteringField, ScatteringTransform};
