//! Hand-derived adjoint of the statistic pipeline.
//!
//! Gradients of a real loss with respect to a complex quantity `z` are
//! carried as `ḡ_z = ∂L/∂Re z + i·∂L/∂Im z`. With that convention:
//!
//! | Forward | Adjoint |
//! |---------|---------|
//! | `z = u · conj(v)` | `ḡ_u += ḡ_z · v`, `ḡ_v += conj(ḡ_z) · u` |
//! | `m = |w|` | `ḡ_w += g_m · w / |w|` |
//! | `w = x ⋆ ψ` (real `x`) | `g_x += Re(A^H ḡ_w)` |
//! | block average | spread `ḡ / |block|` over the block |

use ndarray::{Array2, Array3, s};
use num_complex::Complex64;

use crate::context::ExecutionContext;
use crate::error::ScatteringError;
use crate::estimator::Averager;
use crate::extract::guard;
use crate::plan::{RowSpec, StatisticPlan};
use crate::transform::{ScatteringField, ScatteringTransform, n_pairs, pair_index};

const ZERO: Complex64 = Complex64::new(0.0, 0.0);

/// Gradient of `Σ Re(conj(grad) · values)` with respect to the input series.
///
/// `sigma` is the fixed `(N, K)` normalization the forward pass used;
/// `grad` has the shape `(R, C, T′)` of the described values.
///
/// # Errors
///
/// Returns [`ScatteringError::ShapeMismatch`] when `grad` or `sigma` does
/// not match the field and plan.
pub(crate) fn backward(
    transform: &ScatteringTransform,
    field: &ScatteringField,
    plan: &StatisticPlan,
    averager: &Averager,
    sigma: &Array2<f64>,
    grad: &Array3<Complex64>,
    ctx: &ExecutionContext,
) -> Result<Array3<f64>, ScatteringError> {
    let [r_count, n_count, t] = field.shape();
    let k = field.n_scales();
    let expected = (r_count, plan.len(), averager.output_len());
    if grad.dim() != expected {
        return Err(ScatteringError::ShapeMismatch {
            what: "gradient size",
            expected: expected.0 * expected.1 * expected.2,
            found: grad.len(),
        });
    }
    if sigma.dim() != (n_count, k) {
        return Err(ScatteringError::ShapeMismatch {
            what: "normalization table size",
            expected: n_count * k,
            found: sigma.len(),
        });
    }
    let sigma = sigma.mapv(guard);
    let second_order = plan.max_order() >= 2 && field.max_order() >= 2;

    let per_realization = ctx.map(r_count, |r| {
        let first = field.first().slice(s![r, .., .., ..]);
        let second = field.second().slice(s![r, .., .., ..]);
        let mut g_x = Array2::<f64>::zeros((n_count, t));
        let mut g_m = Array3::<f64>::zeros((n_count, k, t));
        let mut g_w = Array3::<Complex64>::zeros((n_count, k, t));
        let mut g_u = Array3::<Complex64>::zeros((n_count, if second_order { n_pairs(k) } else { 0 }, t));
        let mut g_t = vec![ZERO; t];

        for (i, &row) in plan.rows().iter().enumerate() {
            g_t.fill(ZERO);
            let g_out = grad.slice(s![r, i, ..]).to_vec();
            averager.adjoint_into(&g_out, &mut g_t);

            match row {
                RowSpec::Mean { n } => {
                    for (gx, g) in g_x.row_mut(n).iter_mut().zip(&g_t) {
                        *gx += g.re;
                    }
                }
                RowSpec::Spars { n, k: j } => {
                    let scale = sigma[[n, j]].recip();
                    for (gm, g) in g_m.slice_mut(s![n, j, ..]).iter_mut().zip(&g_t) {
                        *gm += g.re * scale;
                    }
                }
                RowSpec::Variance { nl, nr, k: j } => {
                    for ti in 0..t {
                        let g = g_t[ti];
                        let wl = first[[nl, j, ti]];
                        let wr = first[[nr, j, ti]];
                        g_w[[nl, j, ti]] += g * wr;
                        g_w[[nr, j, ti]] += g.conj() * wl;
                    }
                }
                RowSpec::Skewness { n, k1, k2 } => {
                    let scale = (sigma[[n, k1]] * sigma[[n, k2]]).recip();
                    let p = pair_index(k, k1, k2);
                    for ti in 0..t {
                        let g = g_t[ti] * scale;
                        g_u[[n, p, ti]] += g * first[[n, k2, ti]];
                        g_w[[n, k2, ti]] += g.conj() * second[[n, p, ti]];
                    }
                }
                RowSpec::Kurtosis { n, k1, k2, k3 } => {
                    let scale = (sigma[[n, k1]] * sigma[[n, k2]]).recip();
                    let pl = pair_index(k, k1, k3);
                    let pr = pair_index(k, k2, k3);
                    for ti in 0..t {
                        let g = g_t[ti] * scale;
                        let ul = second[[n, pl, ti]];
                        let ur = second[[n, pr, ti]];
                        g_u[[n, pl, ti]] += g * ur;
                        g_u[[n, pr, ti]] += g.conj() * ul;
                    }
                }
            }
        }

        for n in 0..n_count {
            if second_order {
                for k1 in 0..k {
                    let grads = (k1..k).map(|k2| (k2, g_u.slice(s![n, pair_index(k, k1, k2), ..])));
                    let back = transform.adjoint_sum(grads);
                    for (gm, b) in g_m.slice_mut(s![n, k1, ..]).iter_mut().zip(&back) {
                        *gm += b.re;
                    }
                }
            }
            for j in 0..k {
                for ti in 0..t {
                    let w = first[[n, j, ti]];
                    let modulus = w.norm();
                    if modulus > 0.0 {
                        g_w[[n, j, ti]] += w * (g_m[[n, j, ti]] / modulus);
                    }
                }
            }
            let back = transform.adjoint_sum((0..k).map(|j| (j, g_w.slice(s![n, j, ..]))));
            for (gx, b) in g_x.row_mut(n).iter_mut().zip(&back) {
                *gx += b.re;
            }
        }
        g_x
    });

    let mut out = Array3::zeros((r_count, n_count, t));
    for (r, g) in per_realization.into_iter().enumerate() {
        out.slice_mut(s![r, .., ..]).assign(&g);
    }
    Ok(out)
}
