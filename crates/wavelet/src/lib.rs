//! # scat-wavelet
//!
//! Frequency-domain wavelet filter banks for the Scattering Spectra.
//!
//! ## Construction Pipeline
//!
//! ```mermaid
//! graph LR
//!     A["FilterBankConfig::new(T, J, Q)"] -->|"validate()?"| B["FilterBankConfig"]
//!     B -->|"filter_bank(&config)?"| C["Arc&lt;FilterBank&gt;"]
//!     C --> D[".band_pass()"]
//!     C --> E[".low_pass()"]
//!     C --> F[".littlewood_paley()"]
//!     G["TimeSeries::new(data)?"] -->|"validate"| H["TimeSeries"]
//! ```
//!
//! ## Supported Families
//!
//! | Family | Shape | Role of `Q` |
//! |--------|-------|-------------|
//! | [`WaveletFamily::BattleLemarie`] | cubic-spline, orthonormal for `Q = 1` | dilation step; mother warped to `1/Q` octave |
//! | [`WaveletFamily::Morlet`] | Gaussian, zero-mean corrected | bandwidth; sum flattened per bin |
//!
//! ## Quick Start
//!
//! ```ignore
//! use scat_wavelet::{FilterBankConfig, filter_bank};
//!
//! let bank = filter_bank(&FilterBankConfig::new(1024, 6, 1))?;
//! assert_eq!(bank.n_band_pass(), 6);
//! let lp = bank.littlewood_paley();
//! ```

mod bank;
mod cache;
mod error;
mod family;
mod mother;
mod series;

pub use bank::{
    DEFAULT_CUTOFF, Filter, FilterBank, FilterBankConfig, FilterRole, build_filter_bank,
    build_wavenumbers,
};
pub use cache::{cached_bank_count, filter_bank};
pub use error::WaveletError;
pub use family::{FilterNormalization, WaveletFamily};
pub use mother::{BL_PEAK_FREQUENCY, battle_lemarie_phi_sq, battle_lemarie_psi_sq};
pub use series::TimeSeries;
