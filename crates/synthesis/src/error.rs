//! Error types for the scat-synthesis crate.

use std::path::PathBuf;

use scat_described::DescribedError;
use scat_scattering::ScatteringError;
use scat_wavelet::WaveletError;

/// Error type for all fallible operations in the scat-synthesis crate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SynthesisError {
    /// Series validation failed.
    #[error(transparent)]
    Wavelet(#[from] WaveletError),

    /// Target rows could not be queried.
    #[error(transparent)]
    Described(#[from] DescribedError),

    /// Model construction, forward pass or adjoint failed.
    #[error(transparent)]
    Scattering(#[from] ScatteringError),

    /// Returned when a synthesis parameter is out of range.
    #[error("invalid synthesis config: {0}")]
    InvalidConfig(String),

    /// Returned when the target lacks rows or shape the model needs.
    #[error("target mismatch: {0}")]
    TargetMismatch(String),

    /// Returned when the loss, gradient or candidate becomes non-finite.
    #[error("numerical divergence at evaluation {evaluation}: non-finite {quantity}")]
    NumericalDivergence {
        /// One-based count of loss evaluations when divergence was detected.
        evaluation: usize,
        /// Quantity that stopped being finite.
        quantity: &'static str,
    },

    /// Returned when a stored generation does not match the request.
    #[error("corrupt cache entry {}: {reason}", path.display())]
    CacheCorruption {
        /// Entry that failed validation.
        path: PathBuf,
        /// What failed.
        reason: String,
    },

    /// Returned when a cache entry cannot be read or written.
    #[error("cache I/O error at {}: {message}", path.display())]
    CacheIo {
        /// Entry or directory involved.
        path: PathBuf,
        /// Underlying I/O message.
        message: String,
    },

    /// Returned when a generation signature cannot be turned into a cache key.
    #[error("cannot encode generation signature: {0}")]
    SignatureEncoding(String),

    /// Returned when the optimizer fails for a reason other than divergence.
    #[error("optimizer failed: {0}")]
    Optimizer(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_invalid_config() {
        let err = SynthesisError::InvalidConfig("realizations must be >= 1".into());
        assert_eq!(
            err.to_string(),
            "invalid synthesis config: realizations must be >= 1"
        );
    }

    #[test]
    fn error_target_mismatch() {
        let err = SynthesisError::TargetMismatch("missing variance row".into());
        assert_eq!(err.to_string(), "target mismatch: missing variance row");
    }

    #[test]
    fn error_numerical_divergence() {
        let err = SynthesisError::NumericalDivergence {
            evaluation: 12,
            quantity: "loss",
        };
        assert_eq!(
            err.to_string(),
            "numerical divergence at evaluation 12: non-finite loss"
        );
    }

    #[test]
    fn error_cache_corruption() {
        let err = SynthesisError::CacheCorruption {
            path: PathBuf::from("/tmp/cache/ab12.json"),
            reason: "signature mismatch".into(),
        };
        assert_eq!(
            err.to_string(),
            "corrupt cache entry /tmp/cache/ab12.json: signature mismatch"
        );
    }

    #[test]
    fn error_cache_io() {
        let err = SynthesisError::CacheIo {
            path: PathBuf::from("/ro/cache"),
            message: "permission denied".into(),
        };
        assert_eq!(err.to_string(), "cache I/O error at /ro/cache: permission denied");
    }

    #[test]
    fn error_signature_encoding() {
        let err = SynthesisError::SignatureEncoding("tolerance is not finite".into());
        assert_eq!(
            err.to_string(),
            "cannot encode generation signature: tolerance is not finite"
        );
    }

    #[test]
    fn error_optimizer() {
        let err = SynthesisError::Optimizer("line search failed".into());
        assert_eq!(err.to_string(), "optimizer failed: line search failed");
    }

    #[test]
    fn error_wraps_transparently() {
        let err: SynthesisError = ScatteringError::UnsupportedModel("x".into()).into();
        assert_eq!(err.to_string(), "unsupported model type: x");
        let err: SynthesisError = WaveletError::NonFiniteData.into();
        assert_eq!(err.to_string(), WaveletError::NonFiniteData.to_string());
    }

    #[test]
    fn error_is_std_error() {
        fn assert_impl<T: std::error::Error>() {}
        assert_impl::<SynthesisError>();
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync>() {}
        assert_impl::<SynthesisError>();
    }
}
