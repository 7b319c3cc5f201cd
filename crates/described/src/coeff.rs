//! Coefficient type labels.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DescribedError;

/// Kind of statistic a descriptor row carries.
///
/// The derived ordering is the canonical row order of a described tensor.
///
/// | Type | Moment order `q` | Statistic |
/// |------|------------------|-----------|
/// | [`CoeffType::Mean`] | 1 | average of the raw series |
/// | [`CoeffType::Spars`] | 1 | first-order sparsity `avg|x⋆ψ| / σ` |
/// | [`CoeffType::Variance`] | 2 | wavelet power spectrum and cross-spectrum |
/// | [`CoeffType::Skewness`] | 2 | phase-modulus cross-correlation |
/// | [`CoeffType::Kurtosis`] | 2 | modulus-modulus cross-correlation |
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoeffType {
    Mean,
    Spars,
    Variance,
    Skewness,
    Kurtosis,
}

impl CoeffType {
    /// All types in canonical order.
    pub const ALL: [CoeffType; 5] = [
        CoeffType::Mean,
        CoeffType::Spars,
        CoeffType::Variance,
        CoeffType::Skewness,
        CoeffType::Kurtosis,
    ];

    /// Returns the canonical lower-case name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Spars => "spars",
            Self::Variance => "variance",
            Self::Skewness => "skewness",
            Self::Kurtosis => "kurtosis",
        }
    }

    /// Moment order of the statistic.
    pub fn moment_order(&self) -> usize {
        match self {
            Self::Mean | Self::Spars => 1,
            Self::Variance | Self::Skewness | Self::Kurtosis => 2,
        }
    }
}

impl fmt::Display for CoeffType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CoeffType {
    type Err = DescribedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mean" => Ok(Self::Mean),
            "spars" => Ok(Self::Spars),
            "variance" => Ok(Self::Variance),
            "skewness" => Ok(Self::Skewness),
            "kurtosis" => Ok(Self::Kurtosis),
            _ => Err(DescribedError::UnknownCoeffType(s.to_string())),
        }
    }
}

/// Parses a list of names and returns them sorted and deduplicated.
///
/// # Errors
///
/// Returns [`DescribedError::UnknownCoeffType`] on the first unknown name.
pub fn parse_coeff_types<S: AsRef<str>>(names: &[S]) -> Result<Vec<CoeffType>, DescribedError> {
    let mut types = names
        .iter()
        .map(|n| n.as_ref().parse())
        .collect::<Result<Vec<CoeffType>, _>>()?;
    types.sort();
    types.dedup();
    Ok(types)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_order() {
        let mut shuffled = vec![
            CoeffType::Kurtosis,
            CoeffType::Mean,
            CoeffType::Skewness,
            CoeffType::Variance,
            CoeffType::Spars,
        ];
        shuffled.sort();
        assert_eq!(shuffled, CoeffType::ALL);
    }

    #[test]
    fn from_str_round_trip() {
        for t in CoeffType::ALL {
            assert_eq!(t.name().parse::<CoeffType>().unwrap(), t);
        }
        assert_eq!(" Variance ".parse::<CoeffType>().unwrap(), CoeffType::Variance);
    }

    #[test]
    fn from_str_unknown() {
        let err = "energy".parse::<CoeffType>().unwrap_err();
        assert_eq!(err, DescribedError::UnknownCoeffType("energy".into()));
    }

    #[test]
    fn parse_list_sorted_dedup() {
        let types = parse_coeff_types(&["variance", "mean", "variance"]).unwrap();
        assert_eq!(types, vec![CoeffType::Mean, CoeffType::Variance]);
        assert!(parse_coeff_types(&["mean", "bogus"]).is_err());
    }

    #[test]
    fn moment_orders() {
        assert_eq!(CoeffType::Mean.moment_order(), 1);
        assert_eq!(CoeffType::Spars.moment_order(), 1);
        assert_eq!(CoeffType::Kurtosis.moment_order(), 2);
    }

    #[test]
    fn serde_snake_case() {
        let json = serde_json::to_string(&CoeffType::Skewness).unwrap();
        assert_eq!(json, "\"skewness\"");
        let back: CoeffType = serde_json::from_str("\"kurtosis\"").unwrap();
        assert_eq!(back, CoeffType::Kurtosis);
    }
}
