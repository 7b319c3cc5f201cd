//! Synthesis parameters.

use std::path::{Path, PathBuf};

use scat_described::CoeffType;
use scat_scattering::ModelConfig;

use crate::error::SynthesisError;

/// Default iteration budget.
pub const DEFAULT_MAX_ITERATIONS: u64 = 1000;

/// Default stopping threshold on the change of the loss between iterations.
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

/// Default number of L-BFGS correction pairs.
pub const DEFAULT_HISTORY: usize = 10;

/// Configuration of a synthesis run.
///
/// # Defaults
///
/// | Parameter | Default |
/// |-----------|---------|
/// | `coeff_types` | all types of the model |
/// | `realizations` | `1` |
/// | `max_iterations` | `1000` |
/// | `tolerance` | `1e-9` |
/// | `seed` | `0` |
/// | `history` | `10` |
/// | `cache_dir` | none |
/// | `exp_name` | none |
///
/// # Example
///
/// ```ignore
/// use scat_described::CoeffType;
/// use scat_scattering::ModelConfig;
/// use scat_synthesis::SynthesisConfig;
///
/// let config = SynthesisConfig::new(ModelConfig::new(6, 1))
///     .with_coeff_types(vec![CoeffType::Mean, CoeffType::Variance])
///     .with_realizations(4)
///     .with_seed(7);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct SynthesisConfig {
    model: ModelConfig,
    /// Coefficient types matched against the target.
    coeff_types: Option<Vec<CoeffType>>,
    /// Number of series generated jointly, `S`.
    realizations: usize,
    max_iterations: u64,
    tolerance: f64,
    seed: u64,
    /// L-BFGS memory.
    history: usize,
    cache_dir: Option<PathBuf>,
    exp_name: Option<String>,
}

impl SynthesisConfig {
    /// Creates a config matching the statistics of `model`.
    pub fn new(model: ModelConfig) -> Self {
        Self {
            model,
            coeff_types: None,
            realizations: 1,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
            seed: 0,
            history: DEFAULT_HISTORY,
            cache_dir: None,
            exp_name: None,
        }
    }

    /// Restricts the matched statistics (sorted and deduplicated).
    pub fn with_coeff_types(mut self, mut coeff_types: Vec<CoeffType>) -> Self {
        coeff_types.sort();
        coeff_types.dedup();
        self.coeff_types = Some(coeff_types);
        self
    }

    pub fn with_realizations(mut self, realizations: usize) -> Self {
        self.realizations = realizations;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u64) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Seed of the white-noise initial candidate.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Number of L-BFGS correction pairs.
    pub fn with_history(mut self, history: usize) -> Self {
        self.history = history;
        self
    }

    /// Enables the persisted generation cache under `dir`.
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Tags cache entries so otherwise identical runs stay apart.
    pub fn with_exp_name(mut self, name: impl Into<String>) -> Self {
        self.exp_name = Some(name.into());
        self
    }

    pub fn model(&self) -> &ModelConfig {
        &self.model
    }

    /// Matched coefficient types: the explicit restriction, or the model's.
    pub fn coeff_types(&self) -> Vec<CoeffType> {
        match &self.coeff_types {
            Some(types) => types.clone(),
            None => self.model.coeff_types(),
        }
    }

    pub fn realizations(&self) -> usize {
        self.realizations
    }

    pub fn max_iterations(&self) -> u64 {
        self.max_iterations
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn history(&self) -> usize {
        self.history
    }

    pub fn cache_dir(&self) -> Option<&Path> {
        self.cache_dir.as_deref()
    }

    pub fn exp_name(&self) -> Option<&str> {
        self.exp_name.as_deref()
    }

    /// Model config restricted to the matched coefficient types.
    pub fn matching_model(&self) -> ModelConfig {
        self.model.clone().with_coeff_types(self.coeff_types())
    }

    /// Checks every constraint [`crate::generate`] relies on.
    ///
    /// # Errors
    ///
    /// Returns [`SynthesisError::InvalidConfig`] when `realizations`,
    /// `max_iterations` or `history` is zero, when `tolerance` is negative or
    /// non-finite, or when no coefficient type is matched.
    pub fn validate(&self) -> Result<(), SynthesisError> {
        if self.realizations == 0 {
            return Err(SynthesisError::InvalidConfig("realizations must be >= 1".into()));
        }
        if self.max_iterations == 0 {
            return Err(SynthesisError::InvalidConfig("max_iterations must be >= 1".into()));
        }
        if self.history == 0 {
            return Err(SynthesisError::InvalidConfig("history must be >= 1".into()));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(SynthesisError::InvalidConfig(format!(
                "tolerance must be finite and >= 0, got {}",
                self.tolerance
            )));
        }
        if self.coeff_types().is_empty() {
            return Err(SynthesisError::InvalidConfig("no coefficient types to match".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SynthesisConfig::new(ModelConfig::new(4, 1));
        assert_eq!(config.realizations(), 1);
        assert_eq!(config.max_iterations(), DEFAULT_MAX_ITERATIONS);
        assert_eq!(config.history(), DEFAULT_HISTORY);
        assert_eq!(config.coeff_types(), CoeffType::ALL.to_vec());
        assert!(config.cache_dir().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn matching_model_restricts_types() {
        let config = SynthesisConfig::new(ModelConfig::new(4, 1))
            .with_coeff_types(vec![CoeffType::Variance, CoeffType::Mean]);
        assert_eq!(
            config.matching_model().coeff_types(),
            vec![CoeffType::Mean, CoeffType::Variance]
        );
    }

    #[test]
    fn invalid_values_rejected() {
        let base = SynthesisConfig::new(ModelConfig::new(4, 1));
        for config in [
            base.clone().with_realizations(0),
            base.clone().with_max_iterations(0),
            base.clone().with_history(0),
            base.clone().with_tolerance(f64::NAN),
            base.clone().with_tolerance(-1.0),
            base.clone().with_coeff_types(vec![]),
        ] {
            assert!(matches!(
                config.validate(),
                Err(SynthesisError::InvalidConfig(_))
            ));
        }
    }
}
