//! Error types for the scat-wavelet crate.

/// Error type for all fallible operations in the scat-wavelet crate.
///
/// Covers invalid filter-bank parameters and malformed input series.
/// Every variant carries the offending parameters so callers can surface
/// them unchanged.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WaveletError {
    /// Returned when the high-frequency cutoff is outside `(0, 0.5)`.
    #[error("high-frequency cutoff {cutoff} outside (0, 0.5)")]
    InvalidCutoff {
        /// Cutoff that was requested, in cycles per sample.
        cutoff: f64,
    },

    /// Returned when the number of octaves or wavelets per octave is zero.
    #[error("invalid scale parameters: J = {j}, Q = {q} (both must be >= 1)")]
    InvalidScales {
        /// Number of octaves.
        j: usize,
        /// Wavelets per octave.
        q: usize,
    },

    /// Returned when the coarsest band-pass filter does not fit in the series.
    #[error(
        "coarsest of {n_filters} band-pass filters exceeds series length {len} \
         (centre frequency covers {cycles:.2} cycles, need at least 2)"
    )]
    SupportExceedsSeries {
        /// Total number of band-pass filters (J·Q).
        n_filters: usize,
        /// Series length.
        len: usize,
        /// Number of cycles the coarsest centre frequency completes over `len`.
        cycles: f64,
    },

    /// Returned when the series length is incompatible with the wavelet family.
    #[error("series length {len} incompatible with {family} filters: {reason}")]
    IncompatibleLength {
        /// Series length.
        len: usize,
        /// Wavelet family name.
        family: String,
        /// Constraint that failed.
        reason: String,
    },

    /// Returned when an unsupported wavelet family name is provided.
    #[error("unsupported wavelet family: {0}")]
    UnsupportedFamily(String),

    /// Returned when an unsupported filter normalization name is provided.
    #[error("unsupported filter normalization: {0}")]
    UnsupportedNormalization(String),

    /// Returned when a series axis has zero length.
    #[error("series axis '{axis}' is empty")]
    EmptyAxis {
        /// Name of the empty axis.
        axis: &'static str,
    },

    /// Returned when the data length does not match the declared shape.
    #[error("data length {len} does not match shape {shape:?}")]
    ShapeMismatch {
        /// Declared `(R, N, T)` shape.
        shape: [usize; 3],
        /// Number of samples provided.
        len: usize,
    },

    /// Returned when the input data contains non-finite values (NaN or infinity).
    #[error("input data contains non-finite values")]
    NonFiniteData,
}
