//! Gradient-based generation of series matching target statistics.

use std::sync::{Mutex, PoisonError};

use argmin::core::observers::ObserverMode;
use argmin::core::{Executor, State, TerminationReason};
use argmin::solver::linesearch::MoreThuenteLineSearch;
use argmin::solver::quasinewton::LBFGS;
use ndarray::{Array2, Array3, Axis};
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use scat_described::{CoeffType, DescribedTensor, Query};
use scat_scattering::{ExecutionContext, Model};
use scat_wavelet::TimeSeries;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::cache::{GenerationCache, GenerationSignature, fingerprint_series};
use crate::config::SynthesisConfig;
use crate::error::SynthesisError;
use crate::problem::SynthesisProblem;
use crate::state::{GenerationReport, GenerationState, GenerationStatus, IterationCounter};

/// What the generated series should look like.
#[derive(Clone, Debug)]
pub enum Target {
    /// Observed series; statistics and normalization are taken from it.
    Series(TimeSeries),
    /// Precomputed statistics for series of `len` samples over `n_channels` channels.
    Described {
        stats: DescribedTensor,
        len: usize,
        n_channels: usize,
    },
}

impl Target {
    /// Series length `T` of the generated series.
    pub fn len(&self) -> usize {
        match self {
            Self::Series(x) => x.len(),
            Self::Described { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn n_channels(&self) -> usize {
        match self {
            Self::Series(x) => x.n_channels(),
            Self::Described { n_channels, .. } => *n_channels,
        }
    }
}

/// A generated batch and how it was obtained.
#[derive(Clone, Debug)]
pub struct Generation {
    /// Best candidate seen, shape `(S, N, T)`.
    pub series: TimeSeries,
    pub report: GenerationReport,
}

/// Generates series whose statistics match `target`.
///
/// Starts from `initial` when given, otherwise from seeded Gaussian white
/// noise with the target's mean and standard deviation per channel. The
/// candidate batch is optimized with L-BFGS and a More-Thuente line search
/// against the batch-averaged target rows of the matched coefficient types,
/// with the scale normalization held fixed.
///
/// # Errors
///
/// | Variant | Trigger |
/// |---------|---------|
/// | [`SynthesisError::InvalidConfig`] | `config` fails [`SynthesisConfig::validate`] |
/// | [`SynthesisError::TargetMismatch`] | `initial` or the target rows do not fit the model |
/// | [`SynthesisError::Scattering`] | the model cannot be built for the target |
/// | [`SynthesisError::NumericalDivergence`] | a loss, gradient or candidate became non-finite |
/// | [`SynthesisError::CacheCorruption`] | the cached entry does not match the request |
/// | [`SynthesisError::CacheIo`] | the cache cannot be read or written |
/// | [`SynthesisError::SignatureEncoding`] | a cache is configured and the run parameters have no cache key |
/// | [`SynthesisError::Optimizer`] | the optimizer failed before evaluating any candidate |
pub fn generate(
    target: &Target,
    initial: Option<&TimeSeries>,
    config: &SynthesisConfig,
    ctx: &ExecutionContext,
) -> Result<Generation, SynthesisError> {
    config.validate()?;
    let (len, n_channels) = (target.len(), target.n_channels());
    let realizations = match initial {
        Some(x) if x.len() != len || x.n_channels() != n_channels => {
            return Err(SynthesisError::TargetMismatch(format!(
                "initial series has {} channels of length {}, target needs {n_channels} of length {len}",
                x.n_channels(),
                x.len()
            )));
        }
        Some(x) => x.n_realizations(),
        None => config.realizations(),
    };
    let shape = [realizations, n_channels, len];

    let model = Model::new(&config.matching_model(), len, n_channels)?;
    let (sigma, tau) = resolve_target(&model, target, ctx)?;

    let cache = config.cache_dir().map(GenerationCache::new);
    let signature = GenerationSignature::new(
        config.model(),
        config.coeff_types(),
        config.exp_name().map(str::to_string),
        shape,
        config.seed(),
        config.max_iterations(),
        config.tolerance(),
        config.history(),
        fingerprint(target, initial)?,
    );
    if let Some(cache) = &cache
        && let Some(hit) = cache.load(&signature)?
    {
        return Ok(hit);
    }

    let init = match initial {
        Some(x) => x.view().iter().copied().collect(),
        None => white_noise(target, shape, config.seed()),
    };
    let generation = optimize(&model, &sigma, &tau, shape, init, config, ctx)?;

    if let Some(cache) = &cache {
        cache.store(&signature, &generation)?;
    }
    Ok(generation)
}

/// Fixed `(N, K)` normalization and batch-averaged target rows `(1, C, T′)`.
fn resolve_target(
    model: &Model,
    target: &Target,
    ctx: &ExecutionContext,
) -> Result<(Array2<f64>, Array3<Complex64>), SynthesisError> {
    match target {
        Target::Series(x) => {
            let sigma = model.sigma(x, ctx)?;
            let tau = model.describe_with_sigma(x, &sigma, ctx)?.mean_batch();
            Ok((sigma, tau.values().clone()))
        }
        Target::Described { stats, .. } => {
            let normalized = model
                .descriptors()
                .coeff_types()
                .iter()
                .any(|t| !matches!(t, CoeffType::Mean | CoeffType::Variance));
            let sigma = if normalized {
                model
                    .sigma_from_variance(stats)
                    .map_err(|e| SynthesisError::TargetMismatch(e.to_string()))?
            } else {
                Array2::ones((model.n_channels(), model.n_scales()))
            };
            if stats.n_times() != model.n_times() {
                return Err(SynthesisError::TargetMismatch(format!(
                    "target has {} time samples per row, estimator produces {}",
                    stats.n_times(),
                    model.n_times()
                )));
            }
            let averaged = stats.mean_batch();
            let available = averaged.descriptors();
            let mut tau = Array3::zeros((1, model.n_coeffs(), model.n_times()));
            for (i, wanted) in model.descriptors().rows().enumerate() {
                let row = (0..available.len())
                    .find(|&j| available.row(j) == wanted)
                    .ok_or_else(|| {
                        SynthesisError::TargetMismatch(format!(
                            "no {} row for channels ({:?}, {:?}) scales ({:?}, {:?}, {:?})",
                            wanted.coeff_type, wanted.nl, wanted.nr, wanted.jl1, wanted.jr1, wanted.j2
                        ))
                    })?;
                tau.index_axis_mut(Axis(1), i)
                    .assign(&averaged.values().index_axis(Axis(1), row));
            }
            Ok((sigma, tau))
        }
    }
}

/// SHA-256 of the target and the initial candidate.
fn fingerprint(target: &Target, initial: Option<&TimeSeries>) -> Result<String, SynthesisError> {
    let mut hasher = Sha256::new();
    match target {
        Target::Series(x) => fingerprint_series(&mut hasher, x),
        Target::Described {
            stats,
            len,
            n_channels,
        } => {
            let bytes = serde_json::to_vec(stats)
                .map_err(|e| SynthesisError::TargetMismatch(format!("unserializable target: {e}")))?;
            hasher.update(&bytes);
            hasher.update((*len as u64).to_le_bytes());
            hasher.update((*n_channels as u64).to_le_bytes());
        }
    }
    if let Some(x) = initial {
        fingerprint_series(&mut hasher, x);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Per-channel `(mean, std)` the initial noise is drawn with.
fn channel_moments(target: &Target) -> Vec<(f64, f64)> {
    match target {
        Target::Series(x) => (0..x.n_channels())
            .map(|n| {
                let view = x.view();
                let channel = view.index_axis(Axis(1), n);
                let count = channel.len() as f64;
                let mean = channel.sum() / count;
                let var = channel.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count;
                (mean, var.sqrt())
            })
            .collect(),
        Target::Described {
            stats, n_channels, ..
        } => {
            let averaged = stats.mean_batch();
            let total = |query: Query| -> Option<f64> {
                let rows = averaged.query(&query);
                (rows.n_coeffs() > 0).then(|| {
                    rows.values().iter().map(|v| v.re).sum::<f64>() / rows.n_times().max(1) as f64
                })
            };
            (0..*n_channels)
                .map(|n| {
                    let mean = total(Query::new().coeff_type(CoeffType::Mean).nl(n)).unwrap_or(0.0);
                    // Band energies add up to the variance for a tight frame.
                    let var = total(Query::new().coeff_type(CoeffType::Variance).nl(n).nr(n))
                        .unwrap_or(1.0);
                    (mean, var.max(0.0).sqrt())
                })
                .collect()
        }
    }
}

/// Seeded Gaussian white noise with the target's channel moments.
fn white_noise(target: &Target, shape: [usize; 3], seed: u64) -> Vec<f64> {
    let moments = channel_moments(target);
    let mut rng = StdRng::seed_from_u64(seed);
    let [s, n, t] = shape;
    let mut out = Vec::with_capacity(s * n * t);
    for _ in 0..s {
        for &(mean, std) in &moments {
            for _ in 0..t {
                let z: f64 = rng.sample(StandardNormal);
                out.push(mean + std * z);
            }
        }
    }
    out
}

/// Runs L-BFGS from `init` and returns the best candidate seen.
fn optimize(
    model: &Model,
    sigma: &Array2<f64>,
    tau: &Array3<Complex64>,
    shape: [usize; 3],
    init: Vec<f64>,
    config: &SynthesisConfig,
    ctx: &ExecutionContext,
) -> Result<Generation, SynthesisError> {
    let state = Mutex::new(GenerationState::new());
    let problem = SynthesisProblem::new(model, sigma, tau, shape, ctx, &state);
    let solver = LBFGS::new(MoreThuenteLineSearch::new(), config.history())
        .with_tolerance_cost(config.tolerance())
        .map_err(|e| SynthesisError::Optimizer(e.to_string()))?;

    let lock = || state.lock().unwrap_or_else(PoisonError::into_inner);
    lock().advance(GenerationStatus::Iterating);
    info!(
        shape = ?shape,
        rows = model.n_coeffs(),
        max_iterations = config.max_iterations(),
        tolerance = config.tolerance(),
        "synthesis started"
    );

    let counter = IterationCounter::default();
    let outcome = Executor::new(problem, solver)
        .configure(|s| s.param(init).max_iters(config.max_iterations()))
        .add_observer(counter.clone(), ObserverMode::Always)
        .run();
    let (iterations, exhausted) = match outcome {
        Ok(result) => {
            let st = result.state();
            (
                st.get_iter(),
                matches!(st.get_termination_reason(), Some(TerminationReason::MaxItersReached)),
            )
        }
        Err(e) => match e.downcast::<SynthesisError>() {
            Ok(err) => return Err(err),
            Err(e) if lock().evaluations() > 0 => {
                // Line-search breakdown near a flat optimum; keep the best point.
                warn!(error = %e, iterations = counter.get(), "optimizer stopped early");
                (counter.get(), false)
            }
            Err(e) => return Err(SynthesisError::Optimizer(e.to_string())),
        },
    };

    let mut state = lock();
    state.advance(if exhausted {
        GenerationStatus::BudgetExhausted
    } else {
        GenerationStatus::Converged
    });
    let (best_loss, best) = state
        .take_best()
        .ok_or_else(|| SynthesisError::Optimizer("no candidate was evaluated".into()))?;
    let report = state.report(iterations, best_loss);
    info!(
        status = %report.status,
        iterations,
        evaluations = report.evaluations,
        initial_loss = report.initial_loss,
        best_loss,
        "synthesis finished"
    );
    Ok(Generation {
        series: TimeSeries::from_vec(shape, best)?,
        report,
    })
}
