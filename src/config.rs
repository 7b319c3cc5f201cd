use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Top-level scatspectra configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScatConfig {
    /// Statistical model settings.
    #[serde(default)]
    pub model: ModelToml,

    /// Estimation operator settings.
    #[serde(default)]
    pub estimator: EstimatorToml,

    /// Synthesis settings.
    #[serde(default)]
    pub synthesis: SynthesisToml,

    /// Execution settings.
    #[serde(default)]
    pub execution: ExecutionToml,
}

/// Reads and parses a TOML configuration file.
pub fn load(path: &Path) -> Result<ScatConfig> {
    let toml_str = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    toml::from_str(&toml_str).context("failed to parse TOML config")
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelToml {
    #[serde(default = "default_model_type")]
    pub model_type: String,
    #[serde(default = "default_j")]
    pub j: usize,
    #[serde(default = "default_q")]
    pub q: usize,
    #[serde(default = "default_wavelet_family")]
    pub wavelet_family: String,
    #[serde(default = "default_high_freq_cutoff")]
    pub high_freq_cutoff: f64,
    #[serde(default = "default_normalization")]
    pub normalization: String,
    /// Restricts the extracted coefficient types.
    #[serde(default)]
    pub coeff_types: Option<Vec<String>>,
}

impl Default for ModelToml {
    fn default() -> Self {
        Self {
            model_type: default_model_type(),
            j: default_j(),
            q: default_q(),
            wavelet_family: default_wavelet_family(),
            high_freq_cutoff: default_high_freq_cutoff(),
            normalization: default_normalization(),
            coeff_types: None,
        }
    }
}

fn default_model_type() -> String {
    "scat_spectra".to_string()
}
fn default_j() -> usize {
    6
}
fn default_q() -> usize {
    1
}
fn default_wavelet_family() -> String {
    "battle_lemarie".to_string()
}
fn default_high_freq_cutoff() -> f64 {
    0.425
}
fn default_normalization() -> String {
    "l1".to_string()
}

/// Estimation operator: `kind` selects which of the other fields apply.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EstimatorToml {
    #[serde(default = "default_estimator_kind")]
    pub kind: String,
    /// `[start, end)` for `window_select` and `windowed_average`.
    #[serde(default)]
    pub window: Option<[usize; 2]>,
    /// Block length for `pooling`.
    #[serde(default)]
    pub kernel: Option<usize>,
    /// Block step for `pooling`; defaults to `kernel`.
    #[serde(default)]
    pub stride: Option<usize>,
}

impl Default for EstimatorToml {
    fn default() -> Self {
        Self {
            kind: default_estimator_kind(),
            window: None,
            kernel: None,
            stride: None,
        }
    }
}

fn default_estimator_kind() -> String {
    "full_average".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SynthesisToml {
    /// Coefficient types to match; the model's when absent.
    #[serde(default)]
    pub coeff_types: Option<Vec<String>>,
    #[serde(default = "default_realizations")]
    pub realizations: usize,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u64,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_history")]
    pub history: usize,
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    #[serde(default)]
    pub exp_name: Option<String>,
}

impl Default for SynthesisToml {
    fn default() -> Self {
        Self {
            coeff_types: None,
            realizations: default_realizations(),
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
            seed: 0,
            history: default_history(),
            cache_dir: None,
            exp_name: None,
        }
    }
}

fn default_realizations() -> usize {
    1
}
fn default_max_iterations() -> u64 {
    scat_synthesis::DEFAULT_MAX_ITERATIONS
}
fn default_tolerance() -> f64 {
    scat_synthesis::DEFAULT_TOLERANCE
}
fn default_history() -> usize {
    scat_synthesis::DEFAULT_HISTORY
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExecutionToml {
    /// Run realizations on a thread pool.
    #[serde(default)]
    pub parallel: bool,
    /// Pool size; rayon's default when absent.
    #[serde(default)]
    pub threads: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config: ScatConfig = toml::from_str("").unwrap();
        assert_eq!(config.model.model_type, "scat_spectra");
        assert_eq!((config.model.j, config.model.q), (6, 1));
        assert_eq!(config.model.high_freq_cutoff, 0.425);
        assert_eq!(config.estimator.kind, "full_average");
        assert_eq!(config.synthesis.realizations, 1);
        assert!(!config.execution.parallel);
    }

    #[test]
    fn full_file_parses() {
        let config: ScatConfig = toml::from_str(
            r#"
            [model]
            model_type = "covariance"
            j = 4
            q = 2
            wavelet_family = "morlet"
            normalization = "l2"
            coeff_types = ["mean", "variance"]

            [estimator]
            kind = "pooling"
            kernel = 64
            stride = 32

            [synthesis]
            realizations = 8
            max_iterations = 300
            seed = 42
            cache_dir = "cache"
            exp_name = "demo"

            [execution]
            parallel = true
            threads = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.model.wavelet_family, "morlet");
        assert_eq!(config.estimator.kernel, Some(64));
        assert_eq!(config.synthesis.seed, 42);
        assert_eq!(config.synthesis.cache_dir, Some(PathBuf::from("cache")));
        assert_eq!(config.execution.threads, Some(4));
    }

    #[test]
    fn unknown_fields_rejected() {
        assert!(toml::from_str::<ScatConfig>("[model]\nwavelet = \"morlet\"\n").is_err());
        assert!(toml::from_str::<ScatConfig>("[plot]\nshow = true\n").is_err());
    }
}
