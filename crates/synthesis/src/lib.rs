//! # scat-synthesis
//!
//! Generates time series whose Scattering Spectra match a target, by
//! minimizing the squared distance between statistics with L-BFGS.
//!
//! ## Generation Loop
//!
//! ```mermaid
//! graph TD
//!     A["Target::Series / Target::Described"] -->|"σ, τ"| B["SynthesisProblem"]
//!     C["initial candidate (seeded noise)"] --> D["L-BFGS + More-Thuente"]
//!     B -->|"loss, adjoint gradient"| D
//!     D -->|"best candidate"| E["Generation"]
//!     E -.->|"store"| F["<cache_dir>/<sha256>.json"]
//!     F -.->|"load + signature check"| E
//! ```
//!
//! ## Status
//!
//! | Status | Meaning |
//! |--------|---------|
//! | `converged` | loss change below the tolerance |
//! | `budget_exhausted` | iteration budget reached |
//! | `diverged` | non-finite loss, gradient or candidate; surfaced as an error |
//!
//! ## Quick Start
//!
//! ```ignore
//! use scat_described::CoeffType;
//! use scat_scattering::{ExecutionContext, ModelConfig};
//! use scat_synthesis::{SynthesisConfig, Target, generate};
//!
//! let config = SynthesisConfig::new(ModelConfig::new(6, 1)).with_seed(7);
//! let out = generate(&Target::Series(observed), None, &config, &ExecutionContext::sequential())?;
//! println!("{} after {} iterations", out.report.status, out.report.iterations);
//! ```

mod cache;
mod config;
mod error;
mod generate;
mod problem;
mod state;

pub use cache::{GenerationCache, GenerationSignature};
pub use config::{DEFAULT_HISTORY, DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE, SynthesisConfig};
pub use error::SynthesisError;
pub use generate::{Generation, Target, generate};
pub use state::{GenerationReport, GenerationStatus};
