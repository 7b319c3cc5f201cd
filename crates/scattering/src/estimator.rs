//! Estimation operators: how a statistic is reduced over time.

use std::fmt;
use std::ops::Range;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::ScatteringError;

/// Replaces the time average of a statistic.
///
/// | Operator | Output length `T′` |
/// |----------|--------------------|
/// | [`EstimationOperator::FullAverage`] | 1 |
/// | [`EstimationOperator::WindowSelect`] | window length |
/// | [`EstimationOperator::WindowedAverage`] | 1 |
/// | [`EstimationOperator::Pooling`] | `⌈T / stride⌉` |
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimationOperator {
    /// Mean over the whole series.
    #[default]
    FullAverage,
    /// Raw values inside the window.
    WindowSelect(Range<usize>),
    /// Mean over the window.
    WindowedAverage(Range<usize>),
    /// Block `i` averages `[i·stride, min(i·stride + kernel, T))`.
    Pooling { kernel: usize, stride: usize },
}

impl fmt::Display for EstimationOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FullAverage => write!(f, "full_average"),
            Self::WindowSelect(w) => write!(f, "window_select[{}..{}]", w.start, w.end),
            Self::WindowedAverage(w) => write!(f, "windowed_average[{}..{}]", w.start, w.end),
            Self::Pooling { kernel, stride } => write!(f, "pooling[k={kernel},s={stride}]"),
        }
    }
}

impl EstimationOperator {
    /// Resolves the operator for series length `len`.
    ///
    /// # Errors
    ///
    /// Returns [`ScatteringError::InvalidEstimator`] for an empty or
    /// out-of-range window, a zero kernel or stride, or a kernel longer than
    /// the series.
    pub fn plan(&self, len: usize) -> Result<Averager, ScatteringError> {
        let check_window = |w: &Range<usize>| {
            if w.start >= w.end || w.end > len {
                Err(ScatteringError::InvalidEstimator(format!(
                    "window {}..{} must be non-empty and within 0..{len}",
                    w.start, w.end
                )))
            } else {
                Ok(())
            }
        };
        let blocks = match self {
            Self::FullAverage => vec![0..len],
            Self::WindowSelect(w) => {
                check_window(w)?;
                w.clone().map(|t| t..t + 1).collect()
            }
            Self::WindowedAverage(w) => {
                check_window(w)?;
                vec![w.clone()]
            }
            &Self::Pooling { kernel, stride } => {
                if kernel == 0 || stride == 0 {
                    return Err(ScatteringError::InvalidEstimator(format!(
                        "pooling kernel ({kernel}) and stride ({stride}) must be >= 1"
                    )));
                }
                if kernel > len {
                    return Err(ScatteringError::InvalidEstimator(format!(
                        "pooling kernel {kernel} exceeds series length {len}"
                    )));
                }
                (0..len.div_ceil(stride))
                    .map(|i| i * stride..(i * stride + kernel).min(len))
                    .collect()
            }
        };
        Ok(Averager { len, blocks })
    }
}

/// An estimation operator resolved for a fixed series length.
///
/// Every output sample is the mean of one block of input samples.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Averager {
    len: usize,
    blocks: Vec<Range<usize>>,
}

impl Averager {
    /// Input length `T`.
    pub fn input_len(&self) -> usize {
        self.len
    }

    /// Output length `T′`.
    pub fn output_len(&self) -> usize {
        self.blocks.len()
    }

    /// Averages `signal` (length `T`) into `out` (length `T′`).
    pub fn apply_into(&self, signal: &[Complex64], out: &mut [Complex64]) {
        for (o, block) in out.iter_mut().zip(&self.blocks) {
            let sum: Complex64 = signal[block.clone()].iter().sum();
            *o = sum / block.len() as f64;
        }
    }

    pub fn apply(&self, signal: &[Complex64]) -> Vec<Complex64> {
        let mut out = vec![Complex64::new(0.0, 0.0); self.blocks.len()];
        self.apply_into(signal, &mut out);
        out
    }

    /// Weights turning `T′` block averages into one mean over time, and
    /// whether that mean is the mean over the whole series.
    ///
    /// When some blocks partition `0..T` back to back, only those carry
    /// weight, in proportion to their length. Otherwise every block is
    /// weighted by its length and the result is the mean over the samples
    /// the operator sees.
    pub fn time_weights(&self) -> (Vec<f64>, bool) {
        let mut weights = vec![0.0; self.blocks.len()];
        if let Some(tiling) = self.tiling() {
            for i in tiling {
                weights[i] = self.blocks[i].len() as f64 / self.len as f64;
            }
            return (weights, true);
        }
        let covered: usize = self.blocks.iter().map(|b| b.len()).sum();
        for (w, block) in weights.iter_mut().zip(&self.blocks) {
            *w = block.len() as f64 / covered.max(1) as f64;
        }
        (weights, false)
    }

    /// Indices of blocks that partition `0..T` back to back.
    fn tiling(&self) -> Option<Vec<usize>> {
        let mut picked = Vec::new();
        let mut t = 0;
        while t < self.len {
            // Blocks are sorted by start.
            let i = self.blocks.partition_point(|b| b.start < t);
            let block = self.blocks.get(i).filter(|b| b.start == t && b.end > t)?;
            picked.push(i);
            t = block.end;
        }
        Some(picked)
    }

    /// Adds the adjoint of the averaging applied to `grad` (length `T′`) into
    /// `acc` (length `T`).
    pub fn adjoint_into(&self, grad: &[Complex64], acc: &mut [Complex64]) {
        for (g, block) in grad.iter().zip(&self.blocks) {
            let share = g / block.len() as f64;
            for a in &mut acc[block.clone()] {
                *a += share;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn ramp(n: usize) -> Vec<Complex64> {
        (0..n).map(|t| Complex64::new(t as f64, 1.0)).collect()
    }

    #[test]
    fn full_average() {
        let avg = EstimationOperator::FullAverage.plan(4).unwrap();
        assert_eq!(avg.output_len(), 1);
        let out = avg.apply(&ramp(4));
        assert_abs_diff_eq!(out[0].re, 1.5);
        assert_abs_diff_eq!(out[0].im, 1.0);
    }

    #[test]
    fn window_select_passes_raw_values() {
        let avg = EstimationOperator::WindowSelect(2..5).plan(8).unwrap();
        assert_eq!(avg.output_len(), 3);
        let out = avg.apply(&ramp(8));
        assert_eq!(out, ramp(8)[2..5].to_vec());
    }

    #[test]
    fn windowed_average() {
        let avg = EstimationOperator::WindowedAverage(4..8).plan(8).unwrap();
        assert_eq!(avg.output_len(), 1);
        assert_abs_diff_eq!(avg.apply(&ramp(8))[0].re, 5.5);
    }

    #[test]
    fn pooling_blocks() {
        let avg = EstimationOperator::Pooling { kernel: 4, stride: 3 }
            .plan(10)
            .unwrap();
        // Blocks: [0,4) [3,7) [6,10) [9,10)
        assert_eq!(avg.output_len(), 4);
        let out = avg.apply(&ramp(10));
        assert_abs_diff_eq!(out[0].re, 1.5);
        assert_abs_diff_eq!(out[1].re, 4.5);
        assert_abs_diff_eq!(out[2].re, 7.5);
        assert_abs_diff_eq!(out[3].re, 9.0);
    }

    #[test]
    fn time_weights_recover_the_series_mean() {
        let signal: Vec<Complex64> = (0..10).map(|i| Complex64::new((i * i) as f64, 0.0)).collect();
        let full = signal.iter().map(|v| v.re).sum::<f64>() / 10.0;
        for op in [
            EstimationOperator::FullAverage,
            EstimationOperator::Pooling { kernel: 4, stride: 4 },
            EstimationOperator::Pooling { kernel: 4, stride: 2 },
            EstimationOperator::Pooling { kernel: 3, stride: 1 },
        ] {
            let avg = op.plan(10).unwrap();
            let (weights, exact) = avg.time_weights();
            assert!(exact, "{op}");
            let mean: f64 = avg.apply(&signal).iter().zip(&weights).map(|(v, w)| v.re * w).sum();
            assert!((mean - full).abs() < 1e-12, "{op}: {mean} vs {full}");
        }
    }

    #[test]
    fn time_weights_fall_back_to_seen_samples() {
        let signal: Vec<Complex64> = (0..10).map(|i| Complex64::new(i as f64, 0.0)).collect();
        let avg = EstimationOperator::WindowSelect(2..6).plan(10).unwrap();
        let (weights, exact) = avg.time_weights();
        assert!(!exact);
        let mean: f64 = avg.apply(&signal).iter().zip(&weights).map(|(v, w)| v.re * w).sum();
        assert!((mean - 3.5).abs() < 1e-12);

        let (_, exact) = EstimationOperator::Pooling { kernel: 4, stride: 3 }
            .plan(10)
            .unwrap()
            .time_weights();
        assert!(!exact);
    }

    #[test]
    fn invalid_operators() {
        for op in [
            EstimationOperator::WindowSelect(3..3),
            EstimationOperator::WindowSelect(0..9),
            EstimationOperator::WindowedAverage(5..2),
            EstimationOperator::Pooling { kernel: 0, stride: 1 },
            EstimationOperator::Pooling { kernel: 2, stride: 0 },
            EstimationOperator::Pooling { kernel: 9, stride: 1 },
        ] {
            assert!(
                matches!(op.plan(8), Err(ScatteringError::InvalidEstimator(_))),
                "{op} should be rejected"
            );
        }
    }

    #[test]
    fn adjoint_is_transpose() {
        // <A x, y> == <x, A^T y> for real-weighted averaging.
        let avg = EstimationOperator::Pooling { kernel: 3, stride: 2 }
            .plan(7)
            .unwrap();
        let x: Vec<Complex64> = (0..7).map(|t| Complex64::new((t * t) as f64, -(t as f64))).collect();
        let y: Vec<Complex64> = (0..avg.output_len())
            .map(|i| Complex64::new(1.0 + i as f64, 0.5))
            .collect();
        let ax = avg.apply(&x);
        let mut aty = vec![Complex64::new(0.0, 0.0); 7];
        avg.adjoint_into(&y, &mut aty);
        let lhs: Complex64 = ax.iter().zip(&y).map(|(a, b)| a * b.conj()).sum();
        let rhs: Complex64 = x.iter().zip(&aty).map(|(a, b)| a * b.conj()).sum();
        assert_abs_diff_eq!(lhs.re, rhs.re, epsilon = 1e-10);
        assert_abs_diff_eq!(lhs.im, rhs.im, epsilon = 1e-10);
    }

    #[test]
    fn display_names() {
        assert_eq!(EstimationOperator::FullAverage.to_string(), "full_average");
        assert_eq!(
            EstimationOperator::Pooling { kernel: 8, stride: 4 }.to_string(),
            "pooling[k=8,s=4]"
        );
    }
}
