//! Statistical models: which statistics are extracted and how.

use std::fmt;
use std::str::FromStr;

use ndarray::{Array2, Array3};
use num_complex::Complex64;
use scat_described::{CoeffType, DescribedTensor, DescriptorTable, Query};
use scat_wavelet::{
    DEFAULT_CUTOFF, FilterBankConfig, FilterNormalization, TimeSeries, WaveletFamily, filter_bank,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::adjoint::backward;
use crate::context::ExecutionContext;
use crate::error::ScatteringError;
use crate::estimator::{Averager, EstimationOperator};
use crate::extract::{ScaleNormalization, batch_sigma, reduce};
use crate::indexer::ScaleIndexer;
use crate::plan::StatisticPlan;
use crate::transform::{ScatteringField, ScatteringTransform};

/// Named statistic sets.
///
/// | Model | Coefficient types |
/// |-------|-------------------|
/// | [`ModelType::ScatSpectra`] | mean, spars, variance, skewness, kurtosis |
/// | [`ModelType::Covariance`] | mean, variance |
/// | [`ModelType::ScatMarginal`] | mean, spars, variance |
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    #[default]
    ScatSpectra,
    Covariance,
    ScatMarginal,
}

impl ModelType {
    /// All model types.
    pub const ALL: [ModelType; 3] = [Self::ScatSpectra, Self::Covariance, Self::ScatMarginal];

    pub fn name(&self) -> &'static str {
        match self {
            Self::ScatSpectra => "scat_spectra",
            Self::Covariance => "covariance",
            Self::ScatMarginal => "scat_marginal",
        }
    }

    /// Parses a model name.
    ///
    /// # Errors
    ///
    /// Returns [`ScatteringError::UnsupportedModel`] for an unknown name.
    pub fn from_name(name: &str) -> Result<Self, ScatteringError> {
        Self::ALL
            .into_iter()
            .find(|m| m.name() == name)
            .ok_or_else(|| ScatteringError::UnsupportedModel(name.to_string()))
    }

    /// Coefficient types the model extracts, in canonical order.
    pub fn coeff_types(&self) -> Vec<CoeffType> {
        match self {
            Self::ScatSpectra => CoeffType::ALL.to_vec(),
            Self::Covariance => vec![CoeffType::Mean, CoeffType::Variance],
            Self::ScatMarginal => vec![CoeffType::Mean, CoeffType::Spars, CoeffType::Variance],
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelType {
    type Err = ScatteringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

/// Configuration of an analysis model.
///
/// # Defaults
///
/// | Parameter | Default |
/// |-----------|---------|
/// | `model_type` | [`ModelType::ScatSpectra`] |
/// | `family` | [`WaveletFamily::BattleLemarie`] |
/// | `cutoff` | `0.425` |
/// | `normalization` | [`FilterNormalization::L1`] |
/// | `estimator` | [`EstimationOperator::FullAverage`] |
/// | `coeff_types` | all types of the model |
///
/// # Example
///
/// ```ignore
/// use scat_scattering::{ModelConfig, ModelType};
///
/// let config = ModelConfig::new(6, 1).with_model_type(ModelType::Covariance);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ModelConfig {
    model_type: ModelType,
    /// Number of octaves `J`.
    j: usize,
    /// Wavelets per octave `Q`.
    q: usize,
    family: WaveletFamily,
    cutoff: f64,
    normalization: FilterNormalization,
    estimator: EstimationOperator,
    /// Restriction of the model's coefficient types.
    coeff_types: Option<Vec<CoeffType>>,
}

impl ModelConfig {
    /// Creates a config with `j` octaves and `q` wavelets per octave.
    pub fn new(j: usize, q: usize) -> Self {
        Self {
            model_type: ModelType::default(),
            j,
            q,
            family: WaveletFamily::default(),
            cutoff: DEFAULT_CUTOFF,
            normalization: FilterNormalization::default(),
            estimator: EstimationOperator::default(),
            coeff_types: None,
        }
    }

    pub fn with_model_type(mut self, model_type: ModelType) -> Self {
        self.model_type = model_type;
        self
    }

    pub fn with_family(mut self, family: WaveletFamily) -> Self {
        self.family = family;
        self
    }

    /// Sets the high-frequency cutoff in cycles per sample.
    pub fn with_cutoff(mut self, cutoff: f64) -> Self {
        self.cutoff = cutoff;
        self
    }

    pub fn with_normalization(mut self, normalization: FilterNormalization) -> Self {
        self.normalization = normalization;
        self
    }

    pub fn with_estimator(mut self, estimator: EstimationOperator) -> Self {
        self.estimator = estimator;
        self
    }

    /// Restricts extraction to `coeff_types` (sorted and deduplicated).
    pub fn with_coeff_types(mut self, mut coeff_types: Vec<CoeffType>) -> Self {
        coeff_types.sort();
        coeff_types.dedup();
        self.coeff_types = Some(coeff_types);
        self
    }

    pub fn model_type(&self) -> ModelType {
        self.model_type
    }

    pub fn j(&self) -> usize {
        self.j
    }

    pub fn q(&self) -> usize {
        self.q
    }

    pub fn family(&self) -> WaveletFamily {
        self.family
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    pub fn normalization(&self) -> FilterNormalization {
        self.normalization
    }

    pub fn estimator(&self) -> &EstimationOperator {
        &self.estimator
    }

    /// Explicit restriction, if any.
    pub fn coeff_type_filter(&self) -> Option<&[CoeffType]> {
        self.coeff_types.as_deref()
    }

    /// Coefficient types that will be extracted.
    ///
    /// An explicit restriction wins over the model's default set.
    pub fn coeff_types(&self) -> Vec<CoeffType> {
        match &self.coeff_types {
            Some(types) => types.clone(),
            None => self.model_type.coeff_types(),
        }
    }

    /// Filter-bank config for series of length `len`.
    pub fn bank_config(&self, len: usize) -> FilterBankConfig {
        FilterBankConfig::new(len, self.j, self.q)
            .with_family(self.family)
            .with_cutoff(self.cutoff)
            .with_normalization(self.normalization)
    }
}

/// Forward pass kept for a later [`Model::backward`].
#[derive(Clone, Debug)]
pub struct Evaluation {
    field: ScatteringField,
    described: DescribedTensor,
}

impl Evaluation {
    pub fn field(&self) -> &ScatteringField {
        &self.field
    }

    pub fn described(&self) -> &DescribedTensor {
        &self.described
    }

    pub fn into_described(self) -> DescribedTensor {
        self.described
    }
}

/// A model resolved for a series length and channel count.
///
/// Holds the shared filter bank, FFT plans, row plan and estimator, so
/// repeated evaluations (as in synthesis) rebuild nothing.
#[derive(Debug)]
pub struct Model {
    config: ModelConfig,
    n_channels: usize,
    transform: ScatteringTransform,
    plan: StatisticPlan,
    averager: Averager,
}

impl Model {
    /// Resolves `config` for series of length `len` with `n_channels` channels.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`ScatteringError::Wavelet`] | the filter-bank parameters are invalid for `len` |
    /// | [`ScatteringError::InvalidEstimator`] | the estimator does not fit `len` |
    /// | [`ScatteringError::ShapeMismatch`] | `n_channels` is zero |
    pub fn new(config: &ModelConfig, len: usize, n_channels: usize) -> Result<Self, ScatteringError> {
        if n_channels == 0 {
            return Err(ScatteringError::ShapeMismatch {
                what: "channel count",
                expected: 1,
                found: 0,
            });
        }
        let bank = filter_bank(&config.bank_config(len))?;
        let averager = config.estimator.plan(len)?;
        let indexer = ScaleIndexer::new(bank.config().j(), [bank.config().q(); 2], 2);
        let plan = StatisticPlan::new(&config.coeff_types(), &indexer, n_channels);
        debug!(
            model = %config.model_type,
            len,
            n_channels,
            rows = plan.len(),
            estimator = %config.estimator,
            "model resolved"
        );
        Ok(Self {
            config: config.clone(),
            n_channels,
            transform: ScatteringTransform::new(bank),
            plan,
            averager,
        })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Series length `T`.
    pub fn len(&self) -> usize {
        self.transform.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transform.is_empty()
    }

    pub fn n_channels(&self) -> usize {
        self.n_channels
    }

    /// Number of band-pass scales `K = J·Q`.
    pub fn n_scales(&self) -> usize {
        self.transform.n_scales()
    }

    /// Number of statistic rows `C`.
    pub fn n_coeffs(&self) -> usize {
        self.plan.len()
    }

    /// Estimator output length `T′`.
    pub fn n_times(&self) -> usize {
        self.averager.output_len()
    }

    /// Descriptor table shared by every output.
    pub fn descriptors(&self) -> &DescriptorTable {
        self.plan.table()
    }

    fn check_channels(&self, x: &TimeSeries) -> Result<(), ScatteringError> {
        if x.n_channels() != self.n_channels {
            return Err(ScatteringError::ShapeMismatch {
                what: "channel count",
                expected: self.n_channels,
                found: x.n_channels(),
            });
        }
        Ok(())
    }

    /// Scattering field up to the order the statistics need.
    ///
    /// # Errors
    ///
    /// Returns [`ScatteringError::ShapeMismatch`] when `x` does not have the
    /// model's length or channel count.
    pub fn scattering(&self, x: &TimeSeries, ctx: &ExecutionContext) -> Result<ScatteringField, ScatteringError> {
        self.check_channels(x)?;
        self.transform.forward(x, self.plan.max_order(), ctx)
    }

    /// Statistics of `x` normalized per realization.
    ///
    /// # Errors
    ///
    /// Same as [`Model::scattering`].
    pub fn analyze(&self, x: &TimeSeries, ctx: &ExecutionContext) -> Result<DescribedTensor, ScatteringError> {
        let field = self.scattering(x, ctx)?;
        reduce(&field, &self.plan, &self.averager, &ScaleNormalization::PerRealization, ctx)
    }

    /// Realization-averaged scale normalization `(N, K)` of `x`.
    ///
    /// # Errors
    ///
    /// Same as [`Model::scattering`].
    pub fn sigma(&self, x: &TimeSeries, ctx: &ExecutionContext) -> Result<Array2<f64>, ScatteringError> {
        self.check_channels(x)?;
        let field = self.transform.forward(x, 1, ctx)?;
        Ok(batch_sigma(&field))
    }

    /// Scale normalization `(N, K)` read from the variance rows of `target`.
    ///
    /// Uses `σ_{n,k} = sqrt(Re avg_r Σ_{t′} w_{t′} variance(n, n, k))` with
    /// the weights of [`Averager::time_weights`]. This matches
    /// [`Model::sigma`] on the series whenever the estimator's blocks tile it
    /// (full average, pooling with the kernel a multiple of the stride).
    /// Otherwise only the samples the estimator sees are known, and `σ` is
    /// the energy over those; a warning is logged.
    ///
    /// # Errors
    ///
    /// Returns [`ScatteringError::ShapeMismatch`] when a diagonal variance
    /// row is missing for some channel and scale, or when `target` does not
    /// have the estimator's `T′`.
    pub fn sigma_from_variance(&self, target: &DescribedTensor) -> Result<Array2<f64>, ScatteringError> {
        if target.n_times() != self.n_times() {
            return Err(ScatteringError::ShapeMismatch {
                what: "time samples per statistic",
                expected: self.n_times(),
                found: target.n_times(),
            });
        }
        let (weights, whole_series) = self.averager.time_weights();
        if !whole_series {
            warn!(
                estimator = %self.config.estimator,
                "estimator does not cover the series; scale normalization uses the covered samples"
            );
        }
        let k = self.n_scales();
        let values = target.values();
        let n_realizations = target.n_realizations().max(1) as f64;
        let mut sigma = Array2::zeros((self.n_channels, k));
        for n in 0..self.n_channels {
            for j in 0..k {
                let query = Query::new()
                    .coeff_type(CoeffType::Variance)
                    .nl(n)
                    .nr(n)
                    .jl1(j);
                let rows = query.select(target.descriptors());
                let &[row] = rows.as_slice() else {
                    return Err(ScatteringError::ShapeMismatch {
                        what: "variance rows per channel and scale",
                        expected: 1,
                        found: rows.len(),
                    });
                };
                let column = values.slice(ndarray::s![.., row, ..]);
                let energy = column
                    .rows()
                    .into_iter()
                    .map(|times| times.iter().zip(&weights).map(|(v, w)| v.re * w).sum::<f64>())
                    .sum::<f64>()
                    / n_realizations;
                sigma[[n, j]] = energy.max(0.0).sqrt();
            }
        }
        Ok(sigma)
    }

    /// Statistics of `x` under the fixed `(N, K)` normalization `sigma`.
    ///
    /// # Errors
    ///
    /// Returns [`ScatteringError::ShapeMismatch`] when `x` or `sigma` does not
    /// fit the model.
    pub fn describe_with_sigma(
        &self,
        x: &TimeSeries,
        sigma: &Array2<f64>,
        ctx: &ExecutionContext,
    ) -> Result<DescribedTensor, ScatteringError> {
        Ok(self.evaluate(x, sigma, ctx)?.into_described())
    }

    /// Forward pass under a fixed normalization, kept for [`Model::backward`].
    ///
    /// # Errors
    ///
    /// Same as [`Model::describe_with_sigma`].
    pub fn evaluate(
        &self,
        x: &TimeSeries,
        sigma: &Array2<f64>,
        ctx: &ExecutionContext,
    ) -> Result<Evaluation, ScatteringError> {
        let field = self.scattering(x, ctx)?;
        let normalization = ScaleNormalization::Fixed(sigma.clone());
        let described = reduce(&field, &self.plan, &self.averager, &normalization, ctx)?;
        Ok(Evaluation { field, described })
    }

    /// Gradient with respect to the series of `Σ Re(conj(grad) · values)`.
    ///
    /// `grad` has the shape `(R, C, T′)` of the evaluation's values and
    /// `sigma` must be the table the evaluation used.
    ///
    /// # Errors
    ///
    /// Returns [`ScatteringError::ShapeMismatch`] when `grad` or `sigma` has
    /// the wrong shape.
    pub fn backward(
        &self,
        evaluation: &Evaluation,
        sigma: &Array2<f64>,
        grad: &Array3<Complex64>,
        ctx: &ExecutionContext,
    ) -> Result<Array3<f64>, ScatteringError> {
        backward(
            &self.transform,
            &evaluation.field,
            &self.plan,
            &self.averager,
            sigma,
            grad,
            ctx,
        )
    }
}

/// Extracts the statistics of `x` described by `config`.
///
/// # Errors
///
/// See [`Model::new`] and [`Model::analyze`].
pub fn analyze(
    x: &TimeSeries,
    config: &ModelConfig,
    ctx: &ExecutionContext,
) -> Result<DescribedTensor, ScatteringError> {
    Model::new(config, x.len(), x.n_channels())?.analyze(x, ctx)
}
