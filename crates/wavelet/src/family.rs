//! Wavelet family and filter normalization definitions.

use std::fmt;

use crate::error::WaveletError;

/// Supported mother wavelets for the band-pass filters.
///
/// Both families are built directly in the frequency domain. They differ in
/// what the sub-resolution `Q` means:
///
/// | Family | Role of `Q` |
/// |--------|-------------|
/// | [`WaveletFamily::BattleLemarie`] | dilation step: scale `j` is the mother dilated by `2^(-j/Q)`, where the mother is the cubic-spline wavelet warped in log-frequency to span `1/Q` octave so the `Q` interleaved lattices tile |
/// | [`WaveletFamily::Morlet`] | frequency resolution: the Gaussian width shrinks with `Q` so adjacent filters cross at half power |
///
/// # Example
///
/// ```ignore
/// use scat_wavelet::WaveletFamily;
///
/// let family = WaveletFamily::from_name("battle_lemarie")?;
/// assert_eq!(family, WaveletFamily::BattleLemarie);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WaveletFamily {
    /// Cubic-spline Battle–Lemarié wavelet (orthogonal for `Q = 1`).
    BattleLemarie,
    /// Morlet (Gabor) wavelet with a zero-mean correction.
    Morlet,
}

impl Default for WaveletFamily {
    /// Returns `WaveletFamily::BattleLemarie` as the default family.
    fn default() -> Self {
        Self::BattleLemarie
    }
}

impl WaveletFamily {
    /// Returns the canonical lower-case name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::BattleLemarie => "battle_lemarie",
            Self::Morlet => "morlet",
        }
    }

    /// Parses a wavelet family from a case-insensitive name string.
    ///
    /// # Supported Names
    ///
    /// | Input | Family |
    /// |-------|--------|
    /// | `"battle_lemarie"`, `"battle-lemarie"`, `"bl"` | [`WaveletFamily::BattleLemarie`] |
    /// | `"morlet"` | [`WaveletFamily::Morlet`] |
    ///
    /// # Errors
    ///
    /// Returns [`WaveletError::UnsupportedFamily`] if the name is not recognized.
    pub fn from_name(name: &str) -> Result<Self, WaveletError> {
        match name.to_lowercase().as_str() {
            "battle_lemarie" | "battle-lemarie" | "bl" => Ok(Self::BattleLemarie),
            "morlet" => Ok(Self::Morlet),
            _ => Err(WaveletError::UnsupportedFamily(name.to_string())),
        }
    }
}

impl fmt::Display for WaveletFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How filter magnitudes are scaled after construction.
///
/// `L1` keeps the Littlewood–Paley sum flat up to the finest centre
/// frequency (tight frame): Battle–Lemarié filters share one constant and
/// stay exact dilations, Morlet filters are flattened bin by bin over the
/// band range. `L2` gives every filter
/// unit energy, which makes white-noise variance coefficients independent of
/// scale but breaks the flat frame envelope.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FilterNormalization {
    /// Band-pass Littlewood–Paley sum of one over the band range.
    #[default]
    L1,
    /// Unit energy per filter: `(1/T)·Σ|ψ̂|² = 1`.
    L2,
}

impl FilterNormalization {
    /// Returns the canonical lower-case name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::L1 => "l1",
            Self::L2 => "l2",
        }
    }

    /// Parses a normalization from a case-insensitive name string.
    ///
    /// # Errors
    ///
    /// Returns [`WaveletError::UnsupportedNormalization`] if the name is not recognized.
    pub fn from_name(name: &str) -> Result<Self, WaveletError> {
        match name.to_lowercase().as_str() {
            "l1" => Ok(Self::L1),
            "l2" => Ok(Self::L2),
            _ => Err(WaveletError::UnsupportedNormalization(name.to_string())),
        }
    }
}

impl fmt::Display for FilterNormalization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
