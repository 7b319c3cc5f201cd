//! Loss and gradient of a candidate against the target statistics.
//!
//! **Not part of the public API.**

use std::sync::{Mutex, PoisonError};

use argmin::core::{CostFunction, Gradient};
use ndarray::{Array2, Array3, Zip};
use num_complex::Complex64;
use scat_scattering::{ExecutionContext, Model};
use scat_wavelet::TimeSeries;
use tracing::{debug, trace};

use crate::error::SynthesisError;
use crate::state::{GenerationState, GenerationStatus};

/// One evaluated candidate.
struct Evaluated {
    param: Vec<f64>,
    loss: f64,
    gradient: Vec<f64>,
}

/// `L(x) = (1/S) Σ_s Σ_rows Σ_t′ |Φ(x_s) − τ|²` over flattened `(S, N, T)` candidates.
///
/// argmin queries the cost and the gradient separately at the same point;
/// the last evaluation is cached so each point costs one forward and one
/// backward pass.
pub(crate) struct SynthesisProblem<'a> {
    model: &'a Model,
    sigma: &'a Array2<f64>,
    /// Batch-averaged target rows, shape `(1, C, T′)`.
    target: &'a Array3<Complex64>,
    shape: [usize; 3],
    ctx: &'a ExecutionContext,
    state: &'a Mutex<GenerationState>,
    last: Mutex<Option<Evaluated>>,
}

impl<'a> SynthesisProblem<'a> {
    pub(crate) fn new(
        model: &'a Model,
        sigma: &'a Array2<f64>,
        target: &'a Array3<Complex64>,
        shape: [usize; 3],
        ctx: &'a ExecutionContext,
        state: &'a Mutex<GenerationState>,
    ) -> Self {
        Self {
            model,
            sigma,
            target,
            shape,
            ctx,
            state,
            last: Mutex::new(None),
        }
    }

    fn diverged(&self, evaluation: usize, quantity: &'static str) -> SynthesisError {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.advance(GenerationStatus::Diverged);
        SynthesisError::NumericalDivergence {
            evaluation,
            quantity,
        }
    }

    /// Loss and gradient at `param`, reusing the previous evaluation when possible.
    fn evaluate(&self, param: &[f64]) -> Result<(f64, Vec<f64>), SynthesisError> {
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(e) = last.as_ref()
            && e.param == param
        {
            return Ok((e.loss, e.gradient.clone()));
        }

        let evaluation = self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .begin_evaluation();
        if param.iter().any(|v| !v.is_finite()) {
            return Err(self.diverged(evaluation, "candidate"));
        }

        let series = TimeSeries::from_vec(self.shape, param.to_vec())?;
        let forward = self.model.evaluate(&series, self.sigma, self.ctx)?;
        let values = forward.described().values();
        let s = self.shape[0] as f64;

        // Target has R = 1 and broadcasts over the candidate realizations.
        let mut residual = values.clone();
        Zip::from(&mut residual)
            .and_broadcast(self.target)
            .for_each(|r, &t| *r -= t);
        let loss = residual.iter().map(|r| r.norm_sqr()).sum::<f64>() / s;
        if !loss.is_finite() {
            return Err(self.diverged(evaluation, "loss"));
        }

        let upstream = residual.mapv(|r| r * (2.0 / s));
        let grad = self.model.backward(&forward, self.sigma, &upstream, self.ctx)?;
        if grad.iter().any(|g| !g.is_finite()) {
            return Err(self.diverged(evaluation, "gradient"));
        }
        let gradient: Vec<f64> = grad.iter().copied().collect();

        trace!(evaluation, loss, "loss evaluated");
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record(loss, param);
        *last = Some(Evaluated {
            param: param.to_vec(),
            loss,
            gradient: gradient.clone(),
        });
        Ok((loss, gradient))
    }
}

impl CostFunction for SynthesisProblem<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, param: &Self::Param) -> Result<Self::Output, argmin::core::Error> {
        Ok(self.evaluate(param)?.0)
    }
}

impl Gradient for SynthesisProblem<'_> {
    type Param = Vec<f64>;
    type Gradient = Vec<f64>;

    fn gradient(&self, param: &Self::Param) -> Result<Self::Gradient, argmin::core::Error> {
        let (loss, gradient) = self.evaluate(param)?;
        debug!(loss, "gradient evaluated");
        Ok(gradient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use scat_described::CoeffType;
    use scat_scattering::ModelConfig;

    fn setup() -> (Model, Array2<f64>, Array3<Complex64>, TimeSeries) {
        let config = ModelConfig::new(3, 1).with_coeff_types(vec![CoeffType::Mean, CoeffType::Variance]);
        let model = Model::new(&config, 64, 1).unwrap();
        let target = TimeSeries::new(Array3::from_shape_fn((1, 1, 64), |(_, _, t)| {
            (t as f64 * 0.4).sin() + 0.1
        }))
        .unwrap();
        let ctx = ExecutionContext::sequential();
        let sigma = model.sigma(&target, &ctx).unwrap();
        let tau = model
            .describe_with_sigma(&target, &sigma, &ctx)
            .unwrap()
            .values()
            .clone();
        (model, sigma, tau, target)
    }

    #[test]
    fn zero_loss_at_target() {
        let (model, sigma, tau, target) = setup();
        let ctx = ExecutionContext::sequential();
        let state = Mutex::new(GenerationState::new());
        let problem = SynthesisProblem::new(&model, &sigma, &tau, [1, 1, 64], &ctx, &state);
        let param = target.view().iter().copied().collect::<Vec<_>>();
        let (loss, gradient) = problem.evaluate(&param).unwrap();
        assert_abs_diff_eq!(loss, 0.0, epsilon = 1e-20);
        for g in gradient {
            assert_abs_diff_eq!(g, 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn repeated_point_is_cached() {
        let (model, sigma, tau, _) = setup();
        let ctx = ExecutionContext::sequential();
        let state = Mutex::new(GenerationState::new());
        let problem = SynthesisProblem::new(&model, &sigma, &tau, [1, 1, 64], &ctx, &state);
        let param: Vec<f64> = (0..64).map(|t| (t as f64 * 0.9).cos()).collect();
        let first = problem.cost(&param).unwrap();
        let _ = problem.gradient(&param).unwrap();
        let second = problem.cost(&param).unwrap();
        assert_eq!(first, second);
        assert_eq!(state.lock().unwrap().evaluations(), 1);
    }

    #[test]
    fn non_finite_candidate_diverges() {
        let (model, sigma, tau, _) = setup();
        let ctx = ExecutionContext::sequential();
        let state = Mutex::new(GenerationState::new());
        state.lock().unwrap().advance(GenerationStatus::Iterating);
        let problem = SynthesisProblem::new(&model, &sigma, &tau, [1, 1, 64], &ctx, &state);
        let mut param = vec![0.5; 64];
        param[10] = f64::NAN;
        let err = problem.evaluate(&param).unwrap_err();
        assert!(matches!(
            err,
            SynthesisError::NumericalDivergence { quantity: "candidate", .. }
        ));
        assert_eq!(state.lock().unwrap().status(), GenerationStatus::Diverged);
    }
}
