//! Validated multi-channel time-series batch.

use ndarray::{Array3, ArrayView1, ArrayView3, Axis};

use crate::error::WaveletError;

/// A validated batch of real time series with shape `(R, N, T)`.
///
/// `R` counts independent realizations, `N` channels and `T` time samples.
/// Guarantees:
/// - every axis is non-empty
/// - all values are finite (no NaN or infinity)
///
/// # Example
///
/// ```ignore
/// use scat_wavelet::TimeSeries;
///
/// let ts = TimeSeries::from_vec([1, 1, 4], vec![1.0, 2.0, 3.0, 4.0])?;
/// assert_eq!(ts.shape(), [1, 1, 4]);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct TimeSeries {
    data: Array3<f64>,
}

impl TimeSeries {
    /// Creates a new `TimeSeries` after validating the array.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`WaveletError::EmptyAxis`] | any axis has length zero |
    /// | [`WaveletError::NonFiniteData`] | any element is NaN or infinite |
    pub fn new(data: Array3<f64>) -> Result<Self, WaveletError> {
        let (r, n, t) = data.dim();
        for (len, axis) in [(r, "realizations"), (n, "channels"), (t, "time")] {
            if len == 0 {
                return Err(WaveletError::EmptyAxis { axis });
            }
        }
        if !data.iter().all(|v| v.is_finite()) {
            return Err(WaveletError::NonFiniteData);
        }
        Ok(Self { data })
    }

    /// Creates a `TimeSeries` from row-major samples and an `(R, N, T)` shape.
    ///
    /// # Errors
    ///
    /// Returns [`WaveletError::ShapeMismatch`] when `data.len()` differs from
    /// `R·N·T`, otherwise the same errors as [`TimeSeries::new`].
    pub fn from_vec(shape: [usize; 3], data: Vec<f64>) -> Result<Self, WaveletError> {
        let len = data.len();
        let array = Array3::from_shape_vec((shape[0], shape[1], shape[2]), data)
            .map_err(|_| WaveletError::ShapeMismatch { shape, len })?;
        Self::new(array)
    }

    /// Creates a single-realization, single-channel series.
    ///
    /// # Errors
    ///
    /// Same as [`TimeSeries::new`].
    pub fn from_single(samples: Vec<f64>) -> Result<Self, WaveletError> {
        let len = samples.len();
        Self::from_vec([1, 1, len], samples)
    }

    /// Returns the `(R, N, T)` shape.
    pub fn shape(&self) -> [usize; 3] {
        let (r, n, t) = self.data.dim();
        [r, n, t]
    }

    /// Returns the number of realizations `R`.
    pub fn n_realizations(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    /// Returns the number of channels `N`.
    pub fn n_channels(&self) -> usize {
        self.data.len_of(Axis(1))
    }

    /// Returns the number of time samples `T`.
    pub fn len(&self) -> usize {
        self.data.len_of(Axis(2))
    }

    /// Returns `true` if the series has no samples.
    ///
    /// Note: a valid `TimeSeries` is never empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns a view of the whole `(R, N, T)` array.
    pub fn view(&self) -> ArrayView3<'_, f64> {
        self.data.view()
    }

    /// Returns the samples of one realization and channel.
    ///
    /// # Panics
    ///
    /// Panics if `realization` or `channel` is out of bounds.
    pub fn channel(&self, realization: usize, channel: usize) -> ArrayView1<'_, f64> {
        self.data.slice(ndarray::s![realization, channel, ..])
    }

    /// Sample mean over every element.
    pub fn mean(&self) -> f64 {
        self.data.mean().unwrap_or(0.0)
    }

    /// Population standard deviation over every element.
    pub fn std(&self) -> f64 {
        self.data.std(0.0)
    }

    /// Consumes the series and returns the underlying array.
    pub fn into_inner(self) -> Array3<f64> {
        self.data
    }
}

impl AsRef<Array3<f64>> for TimeSeries {
    fn as_ref(&self) -> &Array3<f64> {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_valid_series() {
        let ts = TimeSeries::from_vec([2, 1, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(ts.shape(), [2, 1, 3]);
        assert_eq!(ts.n_realizations(), 2);
        assert_eq!(ts.n_channels(), 1);
        assert_eq!(ts.len(), 3);
        assert!(!ts.is_empty());
        assert_eq!(ts.channel(1, 0).to_vec(), vec![4.0, 5.0, 6.0]);
    }

    #[test]
    fn from_single_shape() {
        let ts = TimeSeries::from_single(vec![1.0, -1.0, 1.0, -1.0]).unwrap();
        assert_eq!(ts.shape(), [1, 1, 4]);
        assert!(ts.mean().abs() < 1e-15);
        assert!((ts.std() - 1.0).abs() < 1e-15);
    }

    #[test]
    fn empty_axis_rejected() {
        let err = TimeSeries::from_vec([1, 0, 4], vec![]).unwrap_err();
        assert!(matches!(err, WaveletError::EmptyAxis { axis: "channels" }));

        let err = TimeSeries::from_single(vec![]).unwrap_err();
        assert!(matches!(err, WaveletError::EmptyAxis { axis: "time" }));
    }

    #[test]
    fn shape_mismatch_rejected() {
        let err = TimeSeries::from_vec([2, 1, 4], vec![0.0; 7]).unwrap_err();
        assert!(matches!(
            err,
            WaveletError::ShapeMismatch {
                shape: [2, 1, 4],
                len: 7
            }
        ));
    }

    #[test]
    fn nan_rejected() {
        let err = TimeSeries::from_single(vec![1.0, f64::NAN, 3.0]).unwrap_err();
        assert!(matches!(err, WaveletError::NonFiniteData));
    }

    #[test]
    fn infinity_rejected() {
        let err = TimeSeries::from_single(vec![f64::NEG_INFINITY, 1.0]).unwrap_err();
        assert!(matches!(err, WaveletError::NonFiniteData));
    }

    #[test]
    fn series_is_send_and_sync() {
        fn assert_impl<T: Send + Sync + Clone>() {}
        assert_impl::<TimeSeries>();
    }
}
