//! Content-addressed store of finished generations.
//!
//! An entry lives at `<dir>/<sha256>.json`, where the hash is taken over the
//! canonical JSON of its [`GenerationSignature`]. The entry repeats the
//! signature, and a load compares it with the request before trusting the
//! stored series.

use std::fs;
use std::path::{Path, PathBuf};

use scat_described::CoeffType;
use scat_scattering::{EstimationOperator, ModelConfig};
use scat_wavelet::TimeSeries;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::error::SynthesisError;
use crate::generate::Generation;
use crate::state::GenerationReport;

/// Every parameter that determines a generated series.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationSignature {
    pub model_type: String,
    pub j: usize,
    pub q: usize,
    pub wavelet_family: String,
    pub high_freq_cutoff: f64,
    pub normalization: String,
    pub estimator: EstimationOperator,
    pub coeff_types: Vec<CoeffType>,
    pub exp_name: Option<String>,
    /// Output shape `[S, N, T]`.
    pub shape: [usize; 3],
    pub seed: u64,
    pub max_iterations: u64,
    pub tolerance: f64,
    pub history: usize,
    /// SHA-256 of the target (and initial candidate, if any).
    pub target: String,
}

impl GenerationSignature {
    /// Collects the model parameters of `model` and the run parameters.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        model: &ModelConfig,
        coeff_types: Vec<CoeffType>,
        exp_name: Option<String>,
        shape: [usize; 3],
        seed: u64,
        max_iterations: u64,
        tolerance: f64,
        history: usize,
        target: String,
    ) -> Self {
        Self {
            model_type: model.model_type().name().to_string(),
            j: model.j(),
            q: model.q(),
            wavelet_family: model.family().name().to_string(),
            high_freq_cutoff: model.cutoff(),
            normalization: model.normalization().name().to_string(),
            estimator: model.estimator().clone(),
            coeff_types,
            exp_name,
            shape,
            seed,
            max_iterations,
            tolerance,
            history,
            target,
        }
    }

    /// Hex SHA-256 of the canonical JSON encoding.
    ///
    /// # Errors
    ///
    /// Returns [`SynthesisError::SignatureEncoding`] when a float field is
    /// not finite (JSON would write it as `null`, so distinct signatures
    /// would share a key) or when serialization fails.
    pub fn key(&self) -> Result<String, SynthesisError> {
        for (field, value) in [
            ("high_freq_cutoff", self.high_freq_cutoff),
            ("tolerance", self.tolerance),
        ] {
            if !value.is_finite() {
                return Err(SynthesisError::SignatureEncoding(format!("{field} is not finite")));
            }
        }
        let bytes = serde_json::to_vec(self).map_err(|e| SynthesisError::SignatureEncoding(e.to_string()))?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }
}

/// Stored form of one generation.
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    signature: GenerationSignature,
    report: GenerationReport,
    shape: [usize; 3],
    data: Vec<f64>,
}

/// Directory of persisted generations.
#[derive(Clone, Debug)]
pub struct GenerationCache {
    dir: PathBuf,
}

impl GenerationCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Location of the entry for `signature`.
    ///
    /// # Errors
    ///
    /// Same as [`GenerationSignature::key`].
    pub fn path_for(&self, signature: &GenerationSignature) -> Result<PathBuf, SynthesisError> {
        Ok(self.dir.join(format!("{}.json", signature.key()?)))
    }

    /// Reads the entry for `signature`; `Ok(None)` on a miss.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`SynthesisError::SignatureEncoding`] | `signature` has no key |
    /// | [`SynthesisError::CacheIo`] | the file exists but cannot be read |
    /// | [`SynthesisError::CacheCorruption`] | the file does not parse |
    /// | [`SynthesisError::CacheCorruption`] | the stored signature differs from `signature` |
    /// | [`SynthesisError::CacheCorruption`] | the stored series is malformed |
    pub fn load(&self, signature: &GenerationSignature) -> Result<Option<Generation>, SynthesisError> {
        let path = self.path_for(signature)?;
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "generation cache miss");
                return Ok(None);
            }
            Err(e) => {
                return Err(SynthesisError::CacheIo {
                    path,
                    message: e.to_string(),
                });
            }
        };
        let corrupt = |reason: String| SynthesisError::CacheCorruption {
            path: path.clone(),
            reason,
        };
        let entry: CacheEntry = serde_json::from_str(&text).map_err(|e| corrupt(e.to_string()))?;
        if entry.signature != *signature {
            warn!(path = %path.display(), "cached signature differs from request");
            return Err(corrupt("stored signature does not match the request".into()));
        }
        if entry.shape != signature.shape {
            return Err(corrupt(format!(
                "stored shape {:?} differs from requested {:?}",
                entry.shape, signature.shape
            )));
        }
        let series = TimeSeries::from_vec(entry.shape, entry.data).map_err(|e| corrupt(e.to_string()))?;
        info!(path = %path.display(), "generation cache hit");
        let mut report = entry.report;
        report.from_cache = true;
        Ok(Some(Generation { series, report }))
    }

    /// Writes `generation` under `signature`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`SynthesisError::CacheIo`] when the directory or file cannot
    /// be written, and [`SynthesisError::SignatureEncoding`] when
    /// `signature` has no key.
    pub fn store(
        &self,
        signature: &GenerationSignature,
        generation: &Generation,
    ) -> Result<PathBuf, SynthesisError> {
        let io = |path: &Path, e: std::io::Error| SynthesisError::CacheIo {
            path: path.to_path_buf(),
            message: e.to_string(),
        };
        let path = self.path_for(signature)?;
        fs::create_dir_all(&self.dir).map_err(|e| io(&self.dir, e))?;
        let entry = CacheEntry {
            signature: signature.clone(),
            report: generation.report.clone(),
            shape: generation.series.shape(),
            data: generation.series.view().iter().copied().collect(),
        };
        let text = serde_json::to_string(&entry).map_err(|e| SynthesisError::CacheIo {
            path: path.clone(),
            message: e.to_string(),
        })?;
        fs::write(&path, text).map_err(|e| io(&path, e))?;
        info!(path = %path.display(), "generation cached");
        Ok(path)
    }
}

/// Feeds the shape and samples of `series` into `hasher`.
pub(crate) fn fingerprint_series(hasher: &mut Sha256, series: &TimeSeries) {
    for d in series.shape() {
        hasher.update((d as u64).to_le_bytes());
    }
    for v in series.view().iter() {
        hasher.update(v.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signature() -> GenerationSignature {
        GenerationSignature::new(
            &ModelConfig::new(4, 1),
            vec![CoeffType::Mean, CoeffType::Variance],
            Some("demo".into()),
            [1, 1, 8],
            7,
            100,
            1e-9,
            10,
            "ab".into(),
        )
    }

    #[test]
    fn key_is_stable_and_sensitive() {
        let a = signature().key().unwrap();
        assert_eq!(a, signature().key().unwrap());
        assert_eq!(a.len(), 64);
        let mut b = signature();
        b.seed = 8;
        assert_ne!(a, b.key().unwrap());
        let mut c = signature();
        c.exp_name = None;
        assert_ne!(a, c.key().unwrap());
    }

    #[test]
    fn non_finite_floats_have_no_key() {
        let mut nan = signature();
        nan.tolerance = f64::NAN;
        let mut inf = signature();
        inf.tolerance = f64::INFINITY;
        for sig in [nan, inf] {
            assert!(matches!(sig.key(), Err(SynthesisError::SignatureEncoding(_))));
        }
        let mut cutoff = signature();
        cutoff.high_freq_cutoff = f64::NAN;
        let cache = GenerationCache::new("unused");
        assert!(matches!(
            cache.load(&cutoff),
            Err(SynthesisError::SignatureEncoding(m)) if m.contains("high_freq_cutoff")
        ));
    }

    #[test]
    fn fingerprint_depends_on_samples() {
        let x = TimeSeries::from_single(vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let y = TimeSeries::from_single(vec![1.0, 2.0, 3.0, 4.5]).unwrap();
        let digest = |s: &TimeSeries| {
            let mut h = Sha256::new();
            fingerprint_series(&mut h, s);
            hex::encode(h.finalize())
        };
        assert_eq!(digest(&x), digest(&x));
        assert_ne!(digest(&x), digest(&y));
    }
}
