//! Closed-form mother wavelets in the frequency domain.
//!
//! Every function here returns the one-sided magnitude `b(ω)` of a filter
//! at angular frequency `ω > 0` (radians per sample). The analytic √2
//! factor and the zero on `ω ≤ 0` are applied by the bank builder.

use std::f64::consts::PI;

use crate::family::WaveletFamily;

/// Angular frequency at which the cubic Battle–Lemarié `|ψ̂|` peaks.
pub const BL_PEAK_FREQUENCY: f64 = 4.272_926_244_749_23;

/// `sin(x) / x` with the removable singularity filled in.
fn sinc(x: f64) -> f64 {
    if x.abs() < 1e-12 {
        1.0
    } else {
        x.sin() / x
    }
}

/// Denominator polynomial of the cubic-spline orthonormalisation.
///
/// Bounded below by 5 so every ratio built from it is finite.
fn bl_poly(omega: f64) -> f64 {
    let c = (omega / 2.0).cos();
    let s = (omega / 2.0).sin();
    let c2 = c * c;
    let s2 = s * s;
    5.0 + 30.0 * c2 + 30.0 * s2 * c2 + 70.0 * c2 * c2 + 2.0 * s2 * s2 * c2
        + (2.0 / 3.0) * s2 * s2 * s2
}

/// Squared magnitude of the cubic Battle–Lemarié scaling function.
pub fn battle_lemarie_phi_sq(omega: f64) -> f64 {
    105.0 / bl_poly(omega) * sinc(omega / 2.0).powi(8)
}

/// Squared magnitude of the cubic Battle–Lemarié mother wavelet.
pub fn battle_lemarie_psi_sq(omega: f64) -> f64 {
    let num = bl_poly(omega / 2.0 + PI);
    let den = bl_poly(omega) * bl_poly(omega / 2.0);
    let envelope = (omega / 4.0).sin() * sinc(omega / 4.0);
    105.0 * num / den * envelope.powi(8)
}

/// Half-power Morlet width for centre frequency `xi` and `q` filters per octave.
pub fn morlet_sigma(xi: f64, q: usize) -> f64 {
    let ratio = 2f64.powf(-1.0 / q as f64);
    xi * (1.0 - ratio) / ((1.0 + ratio) * 2f64.ln().sqrt())
}

/// One-sided magnitude of filter `xi` of the given family at `omega > 0`.
///
/// Battle–Lemarié filters evaluate the mother at `Ω·(ω/ξ)^q`: the peak
/// lands on `xi`, adjacent filters `ξ·2^(−1/q)` apart are exact dilations,
/// and the `q` interleaved dyadic lattices tile one partition of unity.
/// For `q = 1` this is the plain dilated mother. Morlet filters are
/// Gaussians of width [`morlet_sigma`] with the envelope term removed so
/// `b(0) = 0`.
pub fn one_sided(family: WaveletFamily, omega: f64, xi: f64, q: usize) -> f64 {
    match family {
        WaveletFamily::BattleLemarie => {
            let warped = (omega / xi).powi(q as i32);
            battle_lemarie_psi_sq(BL_PEAK_FREQUENCY * warped).sqrt()
        }
        WaveletFamily::Morlet => {
            let sigma = morlet_sigma(xi, q);
            let two_var = 2.0 * sigma * sigma;
            let beta = (-xi * xi / two_var).exp();
            let value = (-(omega - xi).powi(2) / two_var).exp() - beta * (-omega * omega / two_var).exp();
            value.max(0.0)
        }
    }
}
