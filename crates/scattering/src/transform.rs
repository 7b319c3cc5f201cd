//! Cascaded wavelet convolution and modulus.
//!
//! Every convolution runs on the full-resolution grid: no subsampling, so
//! all scales share the same time axis and cross-scale products align
//! sample by sample.

use std::sync::Arc;

use ndarray::{Array2, Array3, Array4, ArrayView1, Axis, s};
use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use scat_wavelet::{FilterBank, TimeSeries};
use tracing::debug;

use crate::context::ExecutionContext;
use crate::error::ScatteringError;

const ZERO: Complex64 = Complex64::new(0.0, 0.0);

/// Position of the pair `(k1, k2)`, `k1 <= k2 < k`, in the packed second-order axis.
pub(crate) fn pair_index(k: usize, k1: usize, k2: usize) -> usize {
    k1 * k - k1 * k1.saturating_sub(1) / 2 + (k2 - k1)
}

/// Number of packed second-order pairs for `k` scales.
pub(crate) fn n_pairs(k: usize) -> usize {
    k * (k + 1) / 2
}

/// Whether the second layer computes `|W_{k1}| ⋆ ψ_{k2}` with `q` wavelets
/// per octave: the diagonal, or `k2` at a strictly coarser octave than `k1`.
pub(crate) fn is_computed_pair(q: usize, k1: usize, k2: usize) -> bool {
    k1 == k2 || (k1 < k2 && k1 / q < k2 / q)
}

/// Scattering coefficients of a batch of series.
///
/// | Array | Shape | Content |
/// |-------|-------|---------|
/// | series | `(R, N, T)` | input samples |
/// | first | `(R, N, K, T)` | `W_k = x ⋆ ψ_k` |
/// | second | `(R, N, K(K+1)/2, T)` | `U_{k1,k2} = |W_{k1}| ⋆ ψ_{k2}` for `k1 <= k2` |
///
/// `second` is empty when the transform ran at order 1. Pairs within one
/// octave, off the diagonal, are left at zero.
#[derive(Clone, Debug)]
pub struct ScatteringField {
    n_scales: usize,
    q: usize,
    max_order: usize,
    series: Array3<f64>,
    first: Array4<Complex64>,
    second: Array4<Complex64>,
}

impl ScatteringField {
    /// Number of band-pass scales `K`.
    pub fn n_scales(&self) -> usize {
        self.n_scales
    }

    /// Highest order computed.
    pub fn max_order(&self) -> usize {
        self.max_order
    }

    /// `(R, N, T)`.
    pub fn shape(&self) -> [usize; 3] {
        let (r, n, t) = self.series.dim();
        [r, n, t]
    }

    /// Input samples.
    pub fn series(&self) -> &Array3<f64> {
        &self.series
    }

    /// Complex first-layer coefficients `(R, N, K, T)`.
    pub fn first(&self) -> &Array4<Complex64> {
        &self.first
    }

    /// Complex second-layer coefficients `(R, N, K(K+1)/2, T)`.
    pub fn second(&self) -> &Array4<Complex64> {
        &self.second
    }

    /// `x ⋆ ψ_k` for one realization and channel.
    pub fn wavelet(&self, r: usize, n: usize, k: usize) -> ArrayView1<'_, Complex64> {
        self.first.slice(s![r, n, k, ..])
    }

    /// Order-1 field `|x ⋆ ψ_k|`.
    pub fn order1(&self, r: usize, n: usize, k: usize) -> ndarray::Array1<f64> {
        self.wavelet(r, n, k).mapv(|w| w.norm())
    }

    /// `|x ⋆ ψ_{k1}| ⋆ ψ_{k2}` for `k1 == k2` or `k2` at a coarser octave,
    /// or `None` for other pairs or when order 2 was not computed.
    pub fn envelope(
        &self,
        r: usize,
        n: usize,
        k1: usize,
        k2: usize,
    ) -> Option<ArrayView1<'_, Complex64>> {
        if self.max_order < 2 || k2 >= self.n_scales || !is_computed_pair(self.q, k1, k2) {
            return None;
        }
        let p = pair_index(self.n_scales, k1, k2);
        Some(self.second.slice(s![r, n, p, ..]))
    }

    /// Order-2 field `||x ⋆ ψ_{k1}| ⋆ ψ_{k2}|`, defined for `k2` at a
    /// strictly coarser octave than `k1`.
    pub fn order2(&self, r: usize, n: usize, k1: usize, k2: usize) -> Option<ndarray::Array1<f64>> {
        if k2 <= k1 {
            return None;
        }
        self.envelope(r, n, k1, k2).map(|u| u.mapv(|v| v.norm()))
    }
}

/// Forward and adjoint wavelet convolutions for one filter bank.
///
/// FFT plans are planned once and shared read-only across threads.
#[derive(Clone)]
pub struct ScatteringTransform {
    bank: Arc<FilterBank>,
    fft: Arc<dyn Fft<f64>>,
    ifft: Arc<dyn Fft<f64>>,
}

impl std::fmt::Debug for ScatteringTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScatteringTransform")
            .field("len", &self.bank.len())
            .field("n_scales", &self.bank.n_band_pass())
            .finish()
    }
}

impl ScatteringTransform {
    /// Plans forward and inverse FFTs for the bank's length.
    pub fn new(bank: Arc<FilterBank>) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(bank.len());
        let ifft = planner.plan_fft_inverse(bank.len());
        Self { bank, fft, ifft }
    }

    /// The filter bank in use.
    pub fn bank(&self) -> &FilterBank {
        &self.bank
    }

    /// Series length `T`.
    pub fn len(&self) -> usize {
        self.bank.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bank.is_empty()
    }

    /// Number of band-pass scales `K`.
    pub fn n_scales(&self) -> usize {
        self.bank.n_band_pass()
    }

    /// Runs the cascade up to `max_order` on every realization and channel.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`ScatteringError::ShapeMismatch`] | series length differs from the bank's `T` |
    /// | [`ScatteringError::ShapeMismatch`] | `max_order` is not 1 or 2 |
    pub fn forward(
        &self,
        series: &TimeSeries,
        max_order: usize,
        ctx: &ExecutionContext,
    ) -> Result<ScatteringField, ScatteringError> {
        if series.len() != self.len() {
            return Err(ScatteringError::ShapeMismatch {
                what: "series length",
                expected: self.len(),
                found: series.len(),
            });
        }
        if !(1..=2).contains(&max_order) {
            return Err(ScatteringError::ShapeMismatch {
                what: "scattering order (1 or 2)",
                expected: 2,
                found: max_order,
            });
        }

        let [r_count, n_count, t] = series.shape();
        let k = self.n_scales();
        let p = if max_order >= 2 { n_pairs(k) } else { 0 };
        debug!(r = r_count, n = n_count, t, k, max_order, "scattering forward");

        let x = series.view();
        let per_realization = ctx.map(r_count, |r| {
            (0..n_count)
                .map(|n| self.channel_forward(x.slice(s![r, n, ..]), max_order))
                .collect::<Vec<_>>()
        });

        let mut first = Array4::zeros((r_count, n_count, k, t));
        let mut second = Array4::zeros((r_count, n_count, p, t));
        for (r, channels) in per_realization.into_iter().enumerate() {
            for (n, (w, u)) in channels.into_iter().enumerate() {
                first.slice_mut(s![r, n, .., ..]).assign(&w);
                if p > 0 {
                    second.slice_mut(s![r, n, .., ..]).assign(&u);
                }
            }
        }

        Ok(ScatteringField {
            n_scales: k,
            q: self.bank.config().q(),
            max_order,
            series: series.view().to_owned(),
            first,
            second,
        })
    }

    /// First and (optionally) second layer of a single channel.
    fn channel_forward(
        &self,
        x: ArrayView1<'_, f64>,
        max_order: usize,
    ) -> (Array2<Complex64>, Array2<Complex64>) {
        let t = self.len();
        let k = self.n_scales();
        let spectrum = self.spectrum(x.iter().map(|&v| Complex64::new(v, 0.0)));

        let mut w = Array2::zeros((k, t));
        for (j, mut row) in w.axis_iter_mut(Axis(0)).enumerate() {
            row.assign(&ndarray::Array1::from(self.filtered(&spectrum, j)));
        }

        if max_order < 2 {
            return (w, Array2::zeros((0, t)));
        }

        let q = self.bank.config().q();
        let mut u = Array2::zeros((n_pairs(k), t));
        for k1 in 0..k {
            let modulus = self.spectrum(w.row(k1).iter().map(|v| Complex64::new(v.norm(), 0.0)));
            for k2 in (k1..k).filter(|&k2| is_computed_pair(q, k1, k2)) {
                let p = pair_index(k, k1, k2);
                u.row_mut(p)
                    .assign(&ndarray::Array1::from(self.filtered(&modulus, k2)));
            }
        }
        (w, u)
    }

    /// Unnormalized forward FFT of a length-`T` signal.
    pub(crate) fn spectrum(&self, signal: impl Iterator<Item = Complex64>) -> Vec<Complex64> {
        let mut buffer: Vec<Complex64> = signal.collect();
        self.fft.process(&mut buffer);
        buffer
    }

    /// `(1/T)·IFFT(spectrum · ψ̂_k)`.
    pub(crate) fn filtered(&self, spectrum: &[Complex64], k: usize) -> Vec<Complex64> {
        let hat = self.bank.band_pass()[k].hat();
        let mut buffer: Vec<Complex64> = spectrum.iter().zip(hat.iter()).map(|(x, h)| x * h).collect();
        self.ifft.process(&mut buffer);
        let scale = (self.len() as f64).recip();
        for b in &mut buffer {
            *b *= scale;
        }
        buffer
    }

    /// `Σ_k A_k^H g_k` with `A_k^H g = (1/T)·IFFT(FFT(g) · conj(ψ̂_k))`.
    ///
    /// Returns zeros when `grads` is empty.
    pub(crate) fn adjoint_sum<'a>(
        &self,
        grads: impl IntoIterator<Item = (usize, ArrayView1<'a, Complex64>)>,
    ) -> Vec<Complex64> {
        let t = self.len();
        let mut acc = vec![ZERO; t];
        let mut any = false;
        for (k, g) in grads {
            let spec = self.spectrum(g.iter().copied());
            let hat = self.bank.band_pass()[k].hat();
            for ((a, s), h) in acc.iter_mut().zip(&spec).zip(hat.iter()) {
                *a += s * h.conj();
            }
            any = true;
        }
        if !any {
            return acc;
        }
        self.ifft.process(&mut acc);
        let scale = (t as f64).recip();
        for a in &mut acc {
            *a *= scale;
        }
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use scat_wavelet::{FilterBankConfig, filter_bank};

    fn transform(t: usize, j: usize) -> ScatteringTransform {
        ScatteringTransform::new(filter_bank(&FilterBankConfig::new(t, j, 1)).unwrap())
    }

    #[test]
    fn pair_index_is_dense() {
        let k = 5;
        let mut seen = vec![false; n_pairs(k)];
        let mut expected = 0;
        for k1 in 0..k {
            for k2 in k1..k {
                let p = pair_index(k, k1, k2);
                assert_eq!(p, expected);
                assert!(!seen[p]);
                seen[p] = true;
                expected += 1;
            }
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn convolution_matches_direct_sum() {
        let tr = transform(32, 2);
        let x: Vec<f64> = (0..32).map(|i| ((i * 7) % 5) as f64 - 2.0).collect();
        let spec = tr.spectrum(x.iter().map(|&v| Complex64::new(v, 0.0)));
        let w = tr.filtered(&spec, 1);
        // Impulse response of ψ_1, then circular convolution.
        let mut delta = vec![ZERO; 32];
        delta[0] = Complex64::new(1.0, 0.0);
        let psi = tr.filtered(&tr.spectrum(delta.into_iter()), 1);
        for t in 0..32 {
            let direct: Complex64 = (0..32).map(|s| psi[(t + 32 - s) % 32] * x[s]).sum();
            assert_abs_diff_eq!(w[t].re, direct.re, epsilon = 1e-10);
            assert_abs_diff_eq!(w[t].im, direct.im, epsilon = 1e-10);
        }
    }

    #[test]
    fn adjoint_inner_product() {
        let tr = transform(64, 3);
        let x: Vec<Complex64> = (0..64)
            .map(|i| Complex64::new((i as f64 * 0.3).sin(), (i as f64 * 0.11).cos()))
            .collect();
        let g: Vec<Complex64> = (0..64)
            .map(|i| Complex64::new((i as f64 * 0.7).cos(), -(i as f64 * 0.05)))
            .collect();
        let ax = tr.filtered(&tr.spectrum(x.iter().copied()), 2);
        let ahg = tr.adjoint_sum([(2, ArrayView1::from(&g))]);
        let lhs: Complex64 = ax.iter().zip(&g).map(|(a, b)| a * b.conj()).sum();
        let rhs: Complex64 = x.iter().zip(&ahg).map(|(a, b)| a * b.conj()).sum();
        assert_abs_diff_eq!(lhs.re, rhs.re, epsilon = 1e-9);
        assert_abs_diff_eq!(lhs.im, rhs.im, epsilon = 1e-9);
    }

    #[test]
    fn forward_shapes() {
        let tr = transform(128, 3);
        let series = TimeSeries::new(Array3::from_shape_fn((2, 3, 128), |(r, n, t)| {
            ((t * (r + 1) + n) as f64 * 0.37).sin()
        }))
        .unwrap();
        let ctx = ExecutionContext::sequential();
        let f1 = tr.forward(&series, 1, &ctx).unwrap();
        assert_eq!(f1.first().dim(), (2, 3, 3, 128));
        assert_eq!(f1.second().dim(), (2, 3, 0, 128));
        assert!(f1.envelope(0, 0, 0, 1).is_none());

        let f2 = tr.forward(&series, 2, &ctx).unwrap();
        assert_eq!(f2.second().dim(), (2, 3, 6, 128));
        assert!(f2.order2(1, 2, 0, 2).is_some());
        assert!(f2.order2(1, 2, 1, 1).is_none());
        assert!(f2.envelope(1, 2, 1, 1).is_some());
    }

    #[test]
    fn second_layer_skips_same_octave_pairs() {
        let tr = ScatteringTransform::new(filter_bank(&FilterBankConfig::new(256, 3, 2)).unwrap());
        let series = TimeSeries::from_single((0..256).map(|t| (t as f64 * 0.41).sin()).collect()).unwrap();
        let field = tr.forward(&series, 2, &ExecutionContext::sequential()).unwrap();
        assert!(field.envelope(0, 0, 0, 1).is_none());
        assert!(field.envelope(0, 0, 1, 1).is_some());
        assert!(field.order2(0, 0, 1, 2).is_some());
        assert!(field.order2(0, 0, 2, 3).is_none());
        let skipped = field.second().slice(s![0, 0, pair_index(6, 2, 3), ..]).to_owned();
        assert!(skipped.iter().all(|u| *u == ZERO));
        assert!(is_computed_pair(2, 1, 2));
        assert!(!is_computed_pair(2, 3, 2));
    }

    #[test]
    fn forward_rejects_bad_inputs() {
        let tr = transform(128, 3);
        let ctx = ExecutionContext::sequential();
        let short = TimeSeries::from_single(vec![0.0; 64]).unwrap();
        assert!(matches!(
            tr.forward(&short, 1, &ctx),
            Err(ScatteringError::ShapeMismatch {
                expected: 128,
                found: 64,
                ..
            })
        ));
        let ok = TimeSeries::from_single(vec![0.0; 128]).unwrap();
        assert!(matches!(
            tr.forward(&ok, 3, &ctx),
            Err(ScatteringError::ShapeMismatch { found: 3, .. })
        ));
        assert!(tr.forward(&ok, 0, &ctx).is_err());
    }

    #[test]
    fn threaded_forward_matches_sequential() {
        let tr = transform(64, 2);
        let series = TimeSeries::new(Array3::from_shape_fn((4, 1, 64), |(r, _, t)| {
            ((t + 3 * r) as f64 * 0.9).cos()
        }))
        .unwrap();
        let a = tr.forward(&series, 2, &ExecutionContext::sequential()).unwrap();
        let b = tr
            .forward(&series, 2, &ExecutionContext::threaded(Some(2)).unwrap())
            .unwrap();
        assert_eq!(a.first(), b.first());
        assert_eq!(a.second(), b.second());
    }
}
