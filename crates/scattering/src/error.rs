//! Error types for the scat-scattering crate.

use scat_described::DescribedError;
use scat_wavelet::WaveletError;

/// Error type for all fallible operations in the scat-scattering crate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScatteringError {
    /// Filter-bank configuration or series validation failed.
    #[error(transparent)]
    Wavelet(#[from] WaveletError),

    /// Coefficient type or descriptor query failed.
    #[error(transparent)]
    Described(#[from] DescribedError),

    /// Returned when an input does not have the size the pipeline expects.
    #[error("shape mismatch for {what}: expected {expected}, found {found}")]
    ShapeMismatch {
        /// Quantity that was checked.
        what: &'static str,
        /// Expected size.
        expected: usize,
        /// Size that was provided.
        found: usize,
    },

    /// Returned when an estimation operator is invalid for the series length.
    #[error("invalid estimator: {0}")]
    InvalidEstimator(String),

    /// Returned when an unsupported model type name is provided.
    #[error("unsupported model type: {0}")]
    UnsupportedModel(String),

    /// Returned when the rayon thread pool cannot be created.
    #[error("failed to build thread pool: {0}")]
    ThreadPool(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_shape_mismatch() {
        let err = ScatteringError::ShapeMismatch {
            what: "series length",
            expected: 1024,
            found: 512,
        };
        assert_eq!(
            err.to_string(),
            "shape mismatch for series length: expected 1024, found 512"
        );
    }

    #[test]
    fn error_invalid_estimator() {
        let err = ScatteringError::InvalidEstimator("pooling kernel must be >= 1".into());
        assert_eq!(
            err.to_string(),
            "invalid estimator: pooling kernel must be >= 1"
        );
    }

    #[test]
    fn error_unsupported_model() {
        let err = ScatteringError::UnsupportedModel("phase_harmonics".into());
        assert_eq!(err.to_string(), "unsupported model type: phase_harmonics");
    }

    #[test]
    fn error_thread_pool() {
        let err = ScatteringError::ThreadPool("global pool already set".into());
        assert_eq!(
            err.to_string(),
            "failed to build thread pool: global pool already set"
        );
    }

    #[test]
    fn error_wraps_transparently() {
        let err: ScatteringError = WaveletError::InvalidCutoff { cutoff: 0.7 }.into();
        assert_eq!(err.to_string(), "high-frequency cutoff 0.7 outside (0, 0.5)");
        let err: ScatteringError = DescribedError::UnknownCoeffType("x".into()).into();
        assert_eq!(err.to_string(), "unknown coefficient type: x");
    }

    #[test]
    fn error_is_std_error() {
        fn assert_impl<T: std::error::Error>() {}
        assert_impl::<ScatteringError>();
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync>() {}
        assert_impl::<ScatteringError>();
    }
}
