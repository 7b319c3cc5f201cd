//! Reduction of scattering fields into normalized statistics.

use ndarray::{Array2, Array3, ArrayView1, s};
use num_complex::Complex64;
use scat_described::DescribedTensor;
use tracing::debug;

use crate::context::ExecutionContext;
use crate::error::ScatteringError;
use crate::estimator::Averager;
use crate::plan::{RowSpec, StatisticPlan};
use crate::transform::{ScatteringField, pair_index};

/// Below this a scale normalization is treated as absent.
const SIGMA_FLOOR: f64 = 1e-12;

/// Source of the per-scale normalization `σ_{n,k}`.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ScaleNormalization {
    /// `σ_{n,k} = sqrt(avg_t |W_{n,k}|²)` of each realization.
    #[default]
    PerRealization,
    /// Fixed `(N, K)` table shared by every realization.
    Fixed(Array2<f64>),
}

/// `sqrt(avg_t |W|²)` per realization, channel and scale: shape `(R, N, K)`.
pub fn wavelet_sigma(field: &ScatteringField) -> Array3<f64> {
    let first = field.first();
    let (r, n, k, _) = first.dim();
    Array3::from_shape_fn((r, n, k), |(ri, ni, ki)| {
        let w = first.slice(s![ri, ni, ki, ..]);
        (w.iter().map(|v| v.norm_sqr()).sum::<f64>() / w.len() as f64).sqrt()
    })
}

/// Realization-averaged energy normalization `sqrt(avg_r avg_t |W|²)`: shape `(N, K)`.
pub fn batch_sigma(field: &ScatteringField) -> Array2<f64> {
    let first = field.first();
    let (r, n, k, t) = first.dim();
    Array2::from_shape_fn((n, k), |(ni, ki)| {
        let energy: f64 = first
            .slice(s![.., ni, ki, ..])
            .iter()
            .map(|v| v.norm_sqr())
            .sum();
        (energy / (r * t) as f64).sqrt()
    })
}

/// Replaces vanishing normalizations with one.
pub(crate) fn guard(sigma: f64) -> f64 {
    if sigma > SIGMA_FLOOR { sigma } else { 1.0 }
}

/// Guarded `(R, N, K)` normalization table for every realization.
pub(crate) fn resolve_sigma(
    field: &ScatteringField,
    normalization: &ScaleNormalization,
) -> Array3<f64> {
    match normalization {
        ScaleNormalization::PerRealization => wavelet_sigma(field).mapv(guard),
        ScaleNormalization::Fixed(table) => {
            let [r, n, _] = field.shape();
            let k = field.n_scales();
            Array3::from_shape_fn((r, n, k), |(_, ni, ki)| guard(table[[ni, ki]]))
        }
    }
}

/// Time-domain signal of one row before estimation.
pub(crate) fn row_signal(
    field: &ScatteringField,
    r: usize,
    row: RowSpec,
    sigma: &Array2<f64>,
) -> Vec<Complex64> {
    let k = field.n_scales();
    let w = |n: usize, j: usize| field.first().slice(s![r, n, j, ..]);
    let u = |n: usize, j1: usize, j2: usize| field.second().slice(s![r, n, pair_index(k, j1, j2), ..]);
    let product = |a: ArrayView1<'_, Complex64>, b: ArrayView1<'_, Complex64>, scale: f64| {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| x * y.conj() * scale)
            .collect::<Vec<_>>()
    };
    match row {
        RowSpec::Mean { n } => field
            .series()
            .slice(s![r, n, ..])
            .iter()
            .map(|&v| Complex64::new(v, 0.0))
            .collect(),
        RowSpec::Spars { n, k: j } => {
            let scale = sigma[[n, j]].recip();
            w(n, j)
                .iter()
                .map(|v| Complex64::new(v.norm() * scale, 0.0))
                .collect()
        }
        RowSpec::Variance { nl, nr, k: j } => product(w(nl, j), w(nr, j), 1.0),
        RowSpec::Skewness { n, k1, k2 } => {
            let scale = (sigma[[n, k1]] * sigma[[n, k2]]).recip();
            product(u(n, k1, k2), w(n, k2), scale)
        }
        RowSpec::Kurtosis { n, k1, k2, k3 } => {
            let scale = (sigma[[n, k1]] * sigma[[n, k2]]).recip();
            product(u(n, k1, k3), u(n, k2, k3), scale)
        }
    }
}

/// Reduces `field` into a described tensor of shape `(R, C, T′)`.
///
/// # Errors
///
/// | Variant | Trigger |
/// |---------|---------|
/// | [`ScatteringError::ShapeMismatch`] | averager length differs from the field's `T` |
/// | [`ScatteringError::ShapeMismatch`] | fixed `σ` table is not `(N, K)` |
/// | [`ScatteringError::ShapeMismatch`] | the plan needs order 2 but the field stops at order 1 |
pub(crate) fn reduce(
    field: &ScatteringField,
    plan: &StatisticPlan,
    averager: &Averager,
    normalization: &ScaleNormalization,
    ctx: &ExecutionContext,
) -> Result<DescribedTensor, ScatteringError> {
    let [r_count, n_count, t] = field.shape();
    let k = field.n_scales();
    if averager.input_len() != t {
        return Err(ScatteringError::ShapeMismatch {
            what: "estimator input length",
            expected: t,
            found: averager.input_len(),
        });
    }
    if let ScaleNormalization::Fixed(table) = normalization
        && table.dim() != (n_count, k)
    {
        return Err(ScatteringError::ShapeMismatch {
            what: "normalization table size",
            expected: n_count * k,
            found: table.len(),
        });
    }
    if plan.max_order() > field.max_order() {
        return Err(ScatteringError::ShapeMismatch {
            what: "scattering order",
            expected: plan.max_order(),
            found: field.max_order(),
        });
    }

    let sigmas = resolve_sigma(field, normalization);
    let t_out = averager.output_len();
    let c = plan.len();
    debug!(r = r_count, c, t_out, "reducing scattering field");

    let blocks = ctx.map(r_count, |r| {
        let sigma = sigmas.slice(s![r, .., ..]).to_owned();
        let mut block = Array2::<Complex64>::zeros((c, t_out));
        for (i, &row) in plan.rows().iter().enumerate() {
            let signal = row_signal(field, r, row, &sigma);
            block
                .row_mut(i)
                .assign(&ArrayView1::from(&averager.apply(&signal)));
        }
        block
    });

    let mut values = Array3::zeros((r_count, c, t_out));
    for (r, block) in blocks.into_iter().enumerate() {
        values.slice_mut(s![r, .., ..]).assign(&block);
    }
    Ok(DescribedTensor::new(values, plan.table().clone())?)
}
