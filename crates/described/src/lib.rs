//! # scat-described
//!
//! Described tensors: complex statistic values paired row-for-row with a
//! typed descriptor table, plus structured queries over that table.
//!
//! ## Usage
//!
//! ```mermaid
//! graph LR
//!     A["DescribedTensor"] -->|"query(&Query)"| B["DescribedTensor (subset)"]
//!     A -->|"mean_batch()"| C["DescribedTensor (R = 1)"]
//!     D["&quot;jl1=0,1&quot;"] -->|"Query::parse_filter"| E["Query"]
//!     E --> A
//! ```
//!
//! ## Descriptor Columns
//!
//! | Column | Meaning |
//! |--------|---------|
//! | `coeff_type` | mean, spars, variance, skewness, kurtosis |
//! | `nl`, `nr` | left/right channel |
//! | `q` | moment order |
//! | `rl`, `rr` | scattering order of each factor |
//! | `scl`, `scr` | scale-path id of each factor |
//! | `jl1`, `jr1`, `j2` | individual scale indices |
//! | `al`, `ar` | orientation |
//! | `is_low` | low-pass coefficient |
//!
//! ## Quick Start
//!
//! ```ignore
//! use scat_described::{CoeffType, Query};
//!
//! let variance = tensor.query(&Query::new().coeff_type(CoeffType::Variance));
//! let averaged = variance.mean_batch();
//! ```

mod coeff;
mod descriptor;
mod error;
mod query;
mod tensor;

pub use coeff::{CoeffType, parse_coeff_types};
pub use descriptor::{CoeffDescriptor, DescriptorTable, INDEX_FIELDS};
pub use error::DescribedError;
pub use query::{Match, Query};
pub use tensor::DescribedTensor;
