//! Frequency-domain filter bank construction.
//!
//! Builds `J·Q` analytic band-pass filters and one low-pass filter on the
//! FFT grid of a series of length `T`. All filters are real and
//! non-negative (zero phase), so every scale is centred on `t = 0`.

use ndarray::Array1;
use num_complex::Complex64;
use std::f64::consts::{PI, SQRT_2};
use tracing::debug;

use crate::error::WaveletError;
use crate::family::{FilterNormalization, WaveletFamily};
use crate::mother::one_sided;

/// Default high-frequency cutoff in cycles per sample.
pub const DEFAULT_CUTOFF: f64 = 0.425;

/// Minimum number of cycles the coarsest centre frequency must complete.
const MIN_CYCLES: f64 = 2.0;

/// Smallest series length any family accepts.
const MIN_LEN: usize = 4;

/// Configuration for a wavelet filter bank.
///
/// # Defaults
///
/// | Parameter | Default |
/// |-----------|---------|
/// | `family` | [`WaveletFamily::BattleLemarie`] |
/// | `cutoff` | `0.425` |
/// | `normalization` | [`FilterNormalization::L1`] |
///
/// # Example
///
/// ```ignore
/// use scat_wavelet::{FilterBankConfig, WaveletFamily};
///
/// let config = FilterBankConfig::new(1024, 6, 1)
///     .with_family(WaveletFamily::Morlet)
///     .with_cutoff(0.4);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct FilterBankConfig {
    /// Series length `T`.
    len: usize,
    /// Number of octaves `J`.
    j: usize,
    /// Wavelets per octave `Q`.
    q: usize,
    family: WaveletFamily,
    /// Peak of the finest filter in cycles per sample.
    cutoff: f64,
    normalization: FilterNormalization,
}

impl FilterBankConfig {
    /// Creates a config for series length `len`, `j` octaves and `q` wavelets per octave.
    pub fn new(len: usize, j: usize, q: usize) -> Self {
        Self {
            len,
            j,
            q,
            family: WaveletFamily::default(),
            cutoff: DEFAULT_CUTOFF,
            normalization: FilterNormalization::default(),
        }
    }

    /// Sets the series length.
    pub fn with_len(mut self, len: usize) -> Self {
        self.len = len;
        self
    }

    /// Sets the wavelet family.
    pub fn with_family(mut self, family: WaveletFamily) -> Self {
        self.family = family;
        self
    }

    /// Sets the high-frequency cutoff in cycles per sample.
    pub fn with_cutoff(mut self, cutoff: f64) -> Self {
        self.cutoff = cutoff;
        self
    }

    /// Sets the filter normalization.
    pub fn with_normalization(mut self, normalization: FilterNormalization) -> Self {
        self.normalization = normalization;
        self
    }

    /// Returns the series length `T`.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` when the configured length is zero.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of octaves `J`.
    pub fn j(&self) -> usize {
        self.j
    }

    /// Returns the number of wavelets per octave `Q`.
    pub fn q(&self) -> usize {
        self.q
    }

    /// Returns the wavelet family.
    pub fn family(&self) -> WaveletFamily {
        self.family
    }

    /// Returns the high-frequency cutoff.
    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// Returns the filter normalization.
    pub fn normalization(&self) -> FilterNormalization {
        self.normalization
    }

    /// Total number of band-pass filters `J·Q`.
    pub fn n_band_pass(&self) -> usize {
        self.j * self.q
    }

    /// Centre angular frequency `ξ_k = 2π·cutoff·2^(-k/Q)` of band-pass filter `k`.
    pub fn centre_frequency(&self, k: usize) -> f64 {
        2.0 * PI * self.cutoff * 2f64.powf(-(k as f64) / self.q as f64)
    }

    /// Checks every constraint the builder relies on.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`WaveletError::InvalidCutoff`] | `cutoff` not in `(0, 0.5)` |
    /// | [`WaveletError::InvalidScales`] | `J == 0` or `Q == 0` |
    /// | [`WaveletError::IncompatibleLength`] | `T < 4`, or odd `T` with Battle–Lemarié |
    /// | [`WaveletError::SupportExceedsSeries`] | coarsest centre frequency completes fewer than 2 cycles over `T` |
    pub fn validate(&self) -> Result<(), WaveletError> {
        if !(self.cutoff > 0.0 && self.cutoff < 0.5) {
            return Err(WaveletError::InvalidCutoff {
                cutoff: self.cutoff,
            });
        }
        if self.j == 0 || self.q == 0 {
            return Err(WaveletError::InvalidScales {
                j: self.j,
                q: self.q,
            });
        }
        if self.len < MIN_LEN {
            return Err(WaveletError::IncompatibleLength {
                len: self.len,
                family: self.family.name().to_string(),
                reason: format!("length must be at least {MIN_LEN}"),
            });
        }
        if self.family == WaveletFamily::BattleLemarie && self.len % 2 != 0 {
            return Err(WaveletError::IncompatibleLength {
                len: self.len,
                family: self.family.name().to_string(),
                reason: "length must be even".to_string(),
            });
        }
        let n_filters = self.n_band_pass();
        let cycles = self.len as f64 * self.centre_frequency(n_filters - 1) / (2.0 * PI);
        if cycles < MIN_CYCLES {
            return Err(WaveletError::SupportExceedsSeries {
                n_filters,
                len: self.len,
                cycles,
            });
        }
        Ok(())
    }
}

/// Whether a filter selects a frequency band or the residual low frequencies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilterRole {
    /// Analytic band-pass wavelet.
    BandPass,
    /// Real, even low-pass complement.
    LowPass,
}

/// A single frequency-domain filter of length `T`.
#[derive(Clone, Debug)]
pub struct Filter {
    hat: Array1<Complex64>,
    index: usize,
    octave: usize,
    sub: usize,
    role: FilterRole,
    orientation: usize,
    centre_frequency: f64,
}

impl Filter {
    /// Frequency response on the FFT grid.
    pub fn hat(&self) -> &Array1<Complex64> {
        &self.hat
    }

    /// Scale index `j` in `0..J·Q` (`J·Q` for the low-pass).
    pub fn index(&self) -> usize {
        self.index
    }

    /// Octave `j / Q`.
    pub fn octave(&self) -> usize {
        self.octave
    }

    /// Sub-octave index `j mod Q`.
    pub fn sub(&self) -> usize {
        self.sub
    }

    /// Band-pass or low-pass.
    pub fn role(&self) -> FilterRole {
        self.role
    }

    /// Orientation, always 0 for one-dimensional signals.
    pub fn orientation(&self) -> usize {
        self.orientation
    }

    /// Centre angular frequency (radians per sample); 0 for the low-pass.
    pub fn centre_frequency(&self) -> f64 {
        self.centre_frequency
    }

    /// Energy `(1/T)·Σ|ĥ|²`.
    pub fn energy(&self) -> f64 {
        self.hat.iter().map(|h| h.norm_sqr()).sum::<f64>() / self.hat.len() as f64
    }
}

/// An immutable bank of `J·Q` band-pass filters and one low-pass filter.
///
/// Build with [`build_filter_bank`] or fetch a shared copy through
/// [`crate::filter_bank`].
#[derive(Clone, Debug)]
pub struct FilterBank {
    config: FilterBankConfig,
    band_pass: Vec<Filter>,
    low_pass: Filter,
}

impl FilterBank {
    /// Returns the parameters the bank was built from.
    pub fn config(&self) -> &FilterBankConfig {
        &self.config
    }

    /// Series length `T` every filter is sampled on.
    pub fn len(&self) -> usize {
        self.config.len
    }

    /// Always `false`: a validated bank has `T >= 4`.
    pub fn is_empty(&self) -> bool {
        self.config.len == 0
    }

    /// Band-pass filters ordered from the finest (`j = 0`) to the coarsest scale.
    pub fn band_pass(&self) -> &[Filter] {
        &self.band_pass
    }

    /// Number of band-pass filters `J·Q`.
    pub fn n_band_pass(&self) -> usize {
        self.band_pass.len()
    }

    /// The low-pass filter.
    pub fn low_pass(&self) -> &Filter {
        &self.low_pass
    }

    /// Per-bin Littlewood–Paley sum
    /// `½·Σⱼ(|ψ̂ⱼ(ω)|² + |ψ̂ⱼ(−ω)|²) + |φ̂(ω)|²`.
    pub fn littlewood_paley(&self) -> Array1<f64> {
        let t = self.len();
        Array1::from_shape_fn(t, |b| {
            let mirror = (t - b) % t;
            let band: f64 = self
                .band_pass
                .iter()
                .map(|f| f.hat[b].norm_sqr() + f.hat[mirror].norm_sqr())
                .sum();
            0.5 * band + self.low_pass.hat[b].norm_sqr()
        })
    }
}

/// Angular frequency of every FFT bin for a series of length `n`.
///
/// Bin `k` maps to `2πk/n` for `k <= n/2` and to `2π(k−n)/n` above.
pub fn build_wavenumbers(n: usize) -> Array1<f64> {
    let df = 2.0 * PI / n as f64;
    Array1::from_shape_fn(n, |i| {
        if i <= n / 2 {
            i as f64 * df
        } else {
            -((n - i) as f64) * df
        }
    })
}

/// Builds a filter bank after validating `config`.
///
/// # Errors
///
/// Same as [`FilterBankConfig::validate`].
pub fn build_filter_bank(config: &FilterBankConfig) -> Result<FilterBank, WaveletError> {
    config.validate()?;
    Ok(build_validated(config))
}

/// Builds a bank from a config that already passed validation.
pub(crate) fn build_validated(config: &FilterBankConfig) -> FilterBank {
    let omega = build_wavenumbers(config.len);
    let n_filters = config.n_band_pass();

    // One-sided magnitudes b_k(ω) on ω > 0.
    let mut base: Vec<Array1<f64>> = (0..n_filters)
        .map(|k| {
            let xi = config.centre_frequency(k);
            omega.mapv(|w| {
                if w > 0.0 {
                    one_sided(config.family, w, xi, config.q)
                } else {
                    0.0
                }
            })
        })
        .collect();

    let xi_0 = config.centre_frequency(0);
    let xi_last = config.centre_frequency(n_filters - 1);
    let band_sum = |base: &[Array1<f64>]| -> Array1<f64> {
        Array1::from_shape_fn(config.len, |b| base.iter().map(|f| f[b] * f[b]).sum::<f64>())
    };
    let raw = band_sum(base.as_slice());

    match config.family {
        // Shared constant so the band sum peaks at one over (0, ξ_0].
        WaveletFamily::BattleLemarie => {
            let peak = omega
                .iter()
                .zip(raw.iter())
                .filter(|&(&w, _)| w > 0.0 && w <= xi_0)
                .map(|(_, &v)| v)
                .fold(0.0_f64, f64::max);
            if peak > 0.0 {
                let scale = peak.sqrt().recip();
                for f in &mut base {
                    f.mapv_inplace(|v| v * scale);
                }
            }
        }
        // Gaussians on a geometric grid ripple, so the band sum is flattened
        // bin by bin on [ξ_last, ξ_0] and held at its edge values outside.
        WaveletFamily::Morlet => {
            let df = 2.0 * PI / config.len as f64;
            let lo = (xi_last / df).ceil() as usize;
            let hi = ((xi_0 / df).floor() as usize).max(lo);
            for f in &mut base {
                for (b, v) in f.iter_mut().enumerate() {
                    if omega[b] > 0.0 {
                        let s = raw[b.clamp(lo, hi)];
                        *v = if s > 0.0 { *v / s.sqrt() } else { 0.0 };
                    }
                }
            }
        }
    }

    // Tight-frame complement below the coarsest centre frequency.
    let band = band_sum(base.as_slice());
    let low_hat = Array1::from_shape_fn(config.len, |b| {
        if omega[b].abs() > xi_last {
            return Complex64::new(0.0, 0.0);
        }
        let positive = if omega[b] >= 0.0 { b } else { config.len - b };
        Complex64::new((1.0 - band[positive]).max(0.0).sqrt(), 0.0)
    });

    // The Nyquist bin of an even grid stands for both +π and -π.
    let nyquist = (config.len % 2 == 0).then_some(config.len / 2);
    let band_pass: Vec<Filter> = base
        .into_iter()
        .enumerate()
        .map(|(k, b)| {
            let mut hat = Array1::from_shape_fn(config.len, |i| {
                let weight = if Some(i) == nyquist { 1.0 } else { SQRT_2 };
                Complex64::new(weight * b[i], 0.0)
            });
            if config.normalization == FilterNormalization::L2 {
                let energy = hat.iter().map(|h| h.norm_sqr()).sum::<f64>() / config.len as f64;
                if energy > 0.0 {
                    let scale = energy.sqrt().recip();
                    hat.mapv_inplace(|h| h * scale);
                }
            }
            Filter {
                hat,
                index: k,
                octave: k / config.q,
                sub: k % config.q,
                role: FilterRole::BandPass,
                orientation: 0,
                centre_frequency: config.centre_frequency(k),
            }
        })
        .collect();

    let low_pass = Filter {
        hat: low_hat,
        index: n_filters,
        octave: config.j,
        sub: 0,
        role: FilterRole::LowPass,
        orientation: 0,
        centre_frequency: 0.0,
    };

    debug!(
        len = config.len,
        j = config.j,
        q = config.q,
        family = %config.family,
        normalization = %config.normalization,
        "filter bank built"
    );

    FilterBank {
        config: config.clone(),
        band_pass,
        low_pass,
    }
}
