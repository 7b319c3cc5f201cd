//! Pure conversion functions: TOML config structs -> crate API config types.

use anyhow::{Result, bail};

use crate::config::*;

use scat_described::{CoeffType, parse_coeff_types};
use scat_scattering::{EstimationOperator, ExecutionContext, ModelConfig, ModelType};
use scat_synthesis::SynthesisConfig;
use scat_wavelet::{FilterNormalization, WaveletFamily};

/// Parses a coefficient type list, rejecting an empty one.
pub fn parse_types(names: &[String]) -> Result<Vec<CoeffType>> {
    let types = parse_coeff_types(names)?;
    if types.is_empty() {
        bail!("coeff_types must name at least one type");
    }
    Ok(types)
}

/// Converts the TOML estimator section into an `EstimationOperator`.
///
/// `window` is required by the window kinds and `kernel` by `pooling`.
pub fn build_estimator(e: &EstimatorToml) -> Result<EstimationOperator> {
    let window = || match e.window {
        Some([start, end]) => Ok(start..end),
        None => bail!("estimator kind {:?} requires window = [start, end]", e.kind),
    };
    match e.kind.to_lowercase().as_str() {
        "full_average" => Ok(EstimationOperator::FullAverage),
        "window_select" => Ok(EstimationOperator::WindowSelect(window()?)),
        "windowed_average" => Ok(EstimationOperator::WindowedAverage(window()?)),
        "pooling" => {
            let Some(kernel) = e.kernel else {
                bail!("estimator kind \"pooling\" requires kernel");
            };
            Ok(EstimationOperator::Pooling {
                kernel,
                stride: e.stride.unwrap_or(kernel),
            })
        }
        other => bail!("unknown estimator kind: {other:?}"),
    }
}

/// Converts the TOML model and estimator sections into a `ModelConfig`.
pub fn build_model_config(m: &ModelToml, e: &EstimatorToml) -> Result<ModelConfig> {
    let mut config = ModelConfig::new(m.j, m.q)
        .with_model_type(ModelType::from_name(&m.model_type)?)
        .with_family(WaveletFamily::from_name(&m.wavelet_family)?)
        .with_cutoff(m.high_freq_cutoff)
        .with_normalization(FilterNormalization::from_name(&m.normalization)?)
        .with_estimator(build_estimator(e)?);
    if let Some(names) = &m.coeff_types {
        config = config.with_coeff_types(parse_types(names)?);
    }
    Ok(config)
}

/// Converts the full config into a `SynthesisConfig`.
pub fn build_synthesis_config(c: &ScatConfig) -> Result<SynthesisConfig> {
    let s = &c.synthesis;
    let mut config = SynthesisConfig::new(build_model_config(&c.model, &c.estimator)?)
        .with_realizations(s.realizations)
        .with_max_iterations(s.max_iterations)
        .with_tolerance(s.tolerance)
        .with_seed(s.seed)
        .with_history(s.history);
    if let Some(names) = &s.coeff_types {
        config = config.with_coeff_types(parse_types(names)?);
    }
    if let Some(dir) = &s.cache_dir {
        config = config.with_cache_dir(dir);
    }
    if let Some(name) = &s.exp_name {
        config = config.with_exp_name(name);
    }
    Ok(config)
}

/// Builds the execution context from the TOML execution section.
pub fn build_context(x: &ExecutionToml) -> Result<ExecutionContext> {
    if !x.parallel {
        if x.threads.is_some() {
            bail!("execution.threads requires parallel = true");
        }
        return Ok(ExecutionContext::sequential());
    }
    Ok(ExecutionContext::threaded(x.threads)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> ScatConfig {
        toml::from_str(s).unwrap()
    }

    #[test]
    fn default_model() {
        let c = parse("");
        let m = build_model_config(&c.model, &c.estimator).unwrap();
        assert_eq!(m.model_type(), ModelType::ScatSpectra);
        assert_eq!(m.family(), WaveletFamily::BattleLemarie);
        assert_eq!(m.normalization(), FilterNormalization::L1);
        assert_eq!(*m.estimator(), EstimationOperator::FullAverage);
        assert!(m.coeff_type_filter().is_none());
    }

    #[test]
    fn estimator_kinds() {
        let c = parse("[estimator]\nkind = \"windowed_average\"\nwindow = [10, 50]\n");
        assert_eq!(build_estimator(&c.estimator).unwrap(), EstimationOperator::WindowedAverage(10..50));

        let c = parse("[estimator]\nkind = \"pooling\"\nkernel = 16\n");
        assert_eq!(
            build_estimator(&c.estimator).unwrap(),
            EstimationOperator::Pooling { kernel: 16, stride: 16 }
        );

        let c = parse("[estimator]\nkind = \"window_select\"\n");
        assert!(build_estimator(&c.estimator).is_err());
        let c = parse("[estimator]\nkind = \"pooling\"\n");
        assert!(build_estimator(&c.estimator).is_err());
        let c = parse("[estimator]\nkind = \"median\"\n");
        assert!(build_estimator(&c.estimator).is_err());
    }

    #[test]
    fn unknown_names_rejected() {
        for bad in [
            "[model]\nmodel_type = \"gaussian\"\n",
            "[model]\nwavelet_family = \"haar\"\n",
            "[model]\nnormalization = \"l3\"\n",
            "[model]\ncoeff_types = [\"moments\"]\n",
            "[model]\ncoeff_types = []\n",
        ] {
            let c = parse(bad);
            assert!(build_model_config(&c.model, &c.estimator).is_err(), "{bad}");
        }
    }

    #[test]
    fn synthesis_overrides() {
        let c = parse(
            r#"
            [synthesis]
            coeff_types = ["variance", "mean"]
            realizations = 4
            seed = 9
            cache_dir = "gen"
            exp_name = "run"
            "#,
        );
        let s = build_synthesis_config(&c).unwrap();
        assert_eq!(s.coeff_types(), vec![CoeffType::Mean, CoeffType::Variance]);
        assert_eq!(s.realizations(), 4);
        assert_eq!(s.seed(), 9);
        assert_eq!(s.exp_name(), Some("run"));
    }

    #[test]
    fn context() {
        let c = parse("");
        assert_eq!(build_context(&c.execution).unwrap().threads(), 1);
        let c = parse("[execution]\nparallel = true\nthreads = 2\n");
        assert_eq!(build_context(&c.execution).unwrap().threads(), 2);
        let c = parse("[execution]\nthreads = 2\n");
        assert!(build_context(&c.execution).is_err());
    }
}
