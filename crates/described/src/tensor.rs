//! Values paired row-for-row with a descriptor table.

use ndarray::{Array3, Axis, s};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::descriptor::DescriptorTable;
use crate::error::DescribedError;
use crate::query::Query;

/// Complex statistic values of shape `(R, C, T′)` with one descriptor row per
/// coefficient `C`.
///
/// Row `i` of [`DescribedTensor::descriptors`] always describes
/// `values[.., i, ..]`. Deserialization goes through
/// [`DescribedTensor::new`], so the same check applies to files.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDescribedTensor")]
pub struct DescribedTensor {
    values: Array3<Complex64>,
    descriptors: DescriptorTable,
}

#[derive(Deserialize)]
struct RawDescribedTensor {
    values: Array3<Complex64>,
    descriptors: DescriptorTable,
}

impl TryFrom<RawDescribedTensor> for DescribedTensor {
    type Error = DescribedError;

    fn try_from(raw: RawDescribedTensor) -> Result<Self, Self::Error> {
        Self::new(raw.values, raw.descriptors)
    }
}

impl DescribedTensor {
    /// Pairs a value array with its descriptor table.
    ///
    /// # Errors
    ///
    /// Returns [`DescribedError::RowCountMismatch`] when the coefficient axis
    /// length differs from the number of rows.
    pub fn new(values: Array3<Complex64>, descriptors: DescriptorTable) -> Result<Self, DescribedError> {
        let columns = values.len_of(Axis(1));
        if columns != descriptors.len() {
            return Err(DescribedError::RowCountMismatch {
                rows: descriptors.len(),
                columns,
            });
        }
        Ok(Self {
            values,
            descriptors,
        })
    }

    /// The `(R, C, T′)` value array.
    pub fn values(&self) -> &Array3<Complex64> {
        &self.values
    }

    /// The descriptor table.
    pub fn descriptors(&self) -> &DescriptorTable {
        &self.descriptors
    }

    /// `(R, C, T′)`.
    pub fn shape(&self) -> [usize; 3] {
        let (r, c, t) = self.values.dim();
        [r, c, t]
    }

    pub fn n_realizations(&self) -> usize {
        self.values.len_of(Axis(0))
    }

    pub fn n_coeffs(&self) -> usize {
        self.values.len_of(Axis(1))
    }

    pub fn n_times(&self) -> usize {
        self.values.len_of(Axis(2))
    }

    /// Rows matching `query`, in their original order.
    ///
    /// No match yields a valid tensor with zero coefficients.
    pub fn query(&self, query: &Query) -> DescribedTensor {
        if query.is_identity() {
            return self.clone();
        }
        let indices = query.select(&self.descriptors);
        Self {
            values: self.values.select(Axis(1), &indices),
            descriptors: self.descriptors.select(&indices),
        }
    }

    /// Averages over the realization axis; the table is unchanged.
    pub fn mean_batch(&self) -> DescribedTensor {
        let r = self.n_realizations();
        if r == 0 {
            return self.clone();
        }
        let scale = (r as f64).recip();
        let values = self
            .values
            .sum_axis(Axis(0))
            .mapv(|v| v * scale)
            .insert_axis(Axis(0));
        Self {
            values,
            descriptors: self.descriptors.clone(),
        }
    }

    /// Multiplies the values of every row matching `query` by `factor`.
    ///
    /// Returns the number of rows touched.
    pub fn scale_rows(&mut self, query: &Query, factor: Complex64) -> usize {
        let indices = query.select(&self.descriptors);
        for &i in &indices {
            self.values
                .slice_mut(s![.., i, ..])
                .mapv_inplace(|v| v * factor);
        }
        indices.len()
    }

    /// Consumes the tensor and returns its parts.
    pub fn into_parts(self) -> (Array3<Complex64>, DescriptorTable) {
        (self.values, self.descriptors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coeff::CoeffType;
    use crate::descriptor::CoeffDescriptor;
    use approx::assert_abs_diff_eq;

    fn tensor() -> DescribedTensor {
        let table: DescriptorTable = [CoeffType::Mean, CoeffType::Spars, CoeffType::Variance]
            .into_iter()
            .map(CoeffDescriptor::empty)
            .collect();
        let values = Array3::from_shape_fn((2, 3, 1), |(r, c, _)| {
            Complex64::new((r * 10 + c) as f64, r as f64)
        });
        DescribedTensor::new(values, table).unwrap()
    }

    #[test]
    fn new_rejects_row_mismatch() {
        let table: DescriptorTable = std::iter::once(CoeffDescriptor::empty(CoeffType::Mean)).collect();
        let err = DescribedTensor::new(Array3::zeros((1, 2, 1)), table).unwrap_err();
        assert_eq!(err, DescribedError::RowCountMismatch { rows: 1, columns: 2 });
    }

    #[test]
    fn query_identity_and_subset() {
        let t = tensor();
        assert_eq!(t.query(&Query::new()), t);
        let sub = t.query(&Query::new().coeff_type(CoeffType::Variance));
        assert_eq!(sub.shape(), [2, 1, 1]);
        assert_eq!(sub.values()[[1, 0, 0]], Complex64::new(12.0, 1.0));
    }

    #[test]
    fn query_no_match_is_empty() {
        let sub = tensor().query(&Query::new().jl1(4));
        assert_eq!(sub.shape(), [2, 0, 1]);
        assert!(sub.descriptors().is_empty());
    }

    #[test]
    fn mean_batch_collapses_realizations() {
        let m = tensor().mean_batch();
        assert_eq!(m.shape(), [1, 3, 1]);
        assert_abs_diff_eq!(m.values()[[0, 2, 0]].re, 7.0);
        assert_abs_diff_eq!(m.values()[[0, 2, 0]].im, 0.5);
        assert_eq!(m.descriptors(), tensor().descriptors());
    }

    #[test]
    fn scale_rows_only_touches_matches() {
        let mut t = tensor();
        let touched = t.scale_rows(
            &Query::new().coeff_type(CoeffType::Spars),
            Complex64::new(2.0, 0.0),
        );
        assert_eq!(touched, 1);
        assert_eq!(t.values()[[1, 1, 0]], Complex64::new(22.0, 2.0));
        assert_eq!(t.values()[[1, 2, 0]], Complex64::new(12.0, 1.0));
    }

    #[test]
    fn clone_is_deep() {
        let original = tensor();
        let mut copy = original.clone();
        copy.scale_rows(&Query::new(), Complex64::new(0.0, 0.0));
        assert_eq!(original.values()[[1, 0, 0]], Complex64::new(10.0, 1.0));
    }

    #[test]
    fn serde_round_trip() {
        let t = tensor();
        let json = serde_json::to_string(&t).unwrap();
        let back: DescribedTensor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn deserialize_rejects_row_count_mismatch() {
        let mut json = serde_json::to_value(tensor()).unwrap();
        let short: DescriptorTable = [CoeffType::Mean, CoeffType::Spars]
            .into_iter()
            .map(CoeffDescriptor::empty)
            .collect();
        json["descriptors"] = serde_json::to_value(short).unwrap();
        let err = serde_json::from_value::<DescribedTensor>(json).unwrap_err();
        assert!(err.to_string().contains("2 rows but values have 3 coefficients"), "{err}");
    }

    #[test]
    fn deserialize_rejects_duplicated_descriptor_rows() {
        let mut json = serde_json::to_value(tensor()).unwrap();
        for column in json["descriptors"].as_object_mut().unwrap().values_mut() {
            let entries = column.as_array_mut().unwrap();
            let copy = entries.clone();
            entries.extend(copy);
        }
        let err = serde_json::from_value::<DescribedTensor>(json).unwrap_err();
        assert!(err.to_string().contains("6 rows but values have 3 coefficients"), "{err}");
    }

    #[test]
    fn deserialize_rejects_ragged_descriptor_columns() {
        let mut json = serde_json::to_value(tensor()).unwrap();
        json["descriptors"]["coeff_type"] = serde_json::json!(["mean", "spars", "variance", "mean"]);
        json["descriptors"]["is_low"] = serde_json::json!([false, false, false, false]);
        assert!(serde_json::from_value::<DescribedTensor>(json).is_err());
    }
}
