//! JSON series files: `{"shape": [R, N, T], "data": [...]}` in row-major order.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use scat_wavelet::TimeSeries;

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct SeriesFile {
    shape: [usize; 3],
    data: Vec<f64>,
}

/// Reads a series file.
pub fn read_series(path: &Path) -> Result<TimeSeries> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read series file: {}", path.display()))?;
    let file: SeriesFile = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse series file: {}", path.display()))?;
    TimeSeries::from_vec(file.shape, file.data)
        .with_context(|| format!("invalid series in {}", path.display()))
}

/// Writes a series file, replacing any existing one.
pub fn write_series(path: &Path, series: &TimeSeries) -> Result<()> {
    let file = SeriesFile {
        shape: series.shape(),
        data: series.view().iter().copied().collect(),
    };
    write_json(path, &file)
}

/// Serializes `value` as pretty JSON to `path`.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    std::fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
}
