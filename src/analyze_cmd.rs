//! Analyze command: extract Scattering Spectra statistics from a series file.

use anyhow::{Context, Result};
use tracing::{info, info_span};

use scat_described::Query;
use scat_scattering::analyze;

use crate::cli::AnalyzeArgs;
use crate::{config, convert, series_io};

/// Run the analysis pipeline.
pub fn run(args: AnalyzeArgs) -> Result<()> {
    let _cmd = info_span!("analyze").entered();
    // 1. Load project TOML
    let config = config::load(&args.config)?;
    let model = convert::build_model_config(&config.model, &config.estimator)?;
    let ctx = convert::build_context(&config.execution)?;

    // 2. Build the row filter before doing any work
    let mut query = Query::new();
    for filter in &args.filters {
        query = query
            .with_filter(filter)
            .with_context(|| format!("invalid filter: {filter:?}"))?;
    }

    // 3. Read and analyze
    let series = series_io::read_series(&args.input)?;
    let [r, n, t] = series.shape();
    info!(path = %args.input.display(), r, n, t, "series loaded");

    let mut stats = analyze(&series, &model, &ctx).context("analysis failed")?;
    if args.mean_batch {
        stats = stats.mean_batch();
    }
    let stats = stats.query(&query);
    info!(
        model = %model.model_type(),
        n_coeffs = stats.n_coeffs(),
        n_realizations = stats.n_realizations(),
        "statistics extracted"
    );

    // 4. Write
    match &args.output {
        Some(path) => {
            series_io::write_json(path, &stats)?;
            info!(path = %path.display(), "statistics written");
        }
        None => {
            let text = serde_json::to_string_pretty(&stats).context("failed to serialize output")?;
            println!("{text}");
        }
    }
    Ok(())
}
