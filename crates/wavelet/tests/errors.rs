//! Integration tests for WaveletError variants.

use scat_wavelet::{
    FilterBankConfig, TimeSeries, WaveletError, WaveletFamily, FilterNormalization, filter_bank,
};

#[test]
fn error_invalid_cutoff() {
    let result = filter_bank(&FilterBankConfig::new(256, 3, 1).with_cutoff(0.55));
    assert!(matches!(
        result,
        Err(WaveletError::InvalidCutoff { cutoff }) if cutoff == 0.55
    ));
}

#[test]
fn error_invalid_scales() {
    let result = filter_bank(&FilterBankConfig::new(256, 0, 2));
    assert!(matches!(
        result,
        Err(WaveletError::InvalidScales { j: 0, q: 2 })
    ));
}

#[test]
fn error_support_exceeds_series() {
    // 128 · 0.425 · 2^(-23/4) ≈ 1.0 cycles.
    let result = filter_bank(&FilterBankConfig::new(128, 6, 4));
    assert!(matches!(
        result,
        Err(WaveletError::SupportExceedsSeries {
            n_filters: 24,
            len: 128,
            ..
        })
    ));
}

#[test]
fn error_odd_length_battle_lemarie() {
    let result = filter_bank(&FilterBankConfig::new(513, 4, 1));
    assert!(matches!(
        result,
        Err(WaveletError::IncompatibleLength { len: 513, ref family, .. }) if family == "battle_lemarie"
    ));
}

#[test]
fn odd_length_morlet_accepted() {
    let bank = filter_bank(&FilterBankConfig::new(513, 4, 1).with_family(WaveletFamily::Morlet))
        .unwrap();
    assert_eq!(bank.len(), 513);
}

#[test]
fn error_unsupported_names() {
    assert!(matches!(
        WaveletFamily::from_name("paul"),
        Err(WaveletError::UnsupportedFamily(_))
    ));
    assert!(matches!(
        FilterNormalization::from_name("linf"),
        Err(WaveletError::UnsupportedNormalization(_))
    ));
}

#[test]
fn error_series_non_finite() {
    let result = TimeSeries::from_vec([1, 2, 2], vec![0.0, 1.0, f64::INFINITY, 2.0]);
    assert!(matches!(result, Err(WaveletError::NonFiniteData)));
}

#[test]
fn error_series_empty_realizations() {
    let result = TimeSeries::from_vec([0, 1, 4], vec![]);
    assert!(matches!(
        result,
        Err(WaveletError::EmptyAxis {
            axis: "realizations"
        })
    ));
}
