//! Generate command: synthesize series matching the statistics of a target.

use anyhow::{Context, Result};
use tracing::{info, info_span};

use scat_synthesis::{Target, generate};

use crate::cli::GenerateArgs;
use crate::{config, convert, series_io};

/// Run the generation pipeline.
pub fn run(args: GenerateArgs) -> Result<()> {
    let _cmd = info_span!("generate").entered();
    // 1. Load project TOML, then apply CLI overrides
    let mut config = config::load(&args.config)?;
    if let Some(seed) = args.seed {
        config.synthesis.seed = seed;
    }
    if let Some(dir) = args.cache_dir {
        config.synthesis.cache_dir = Some(dir);
    }
    if let Some(name) = args.exp_name {
        config.synthesis.exp_name = Some(name);
    }
    let synthesis = convert::build_synthesis_config(&config)?;
    let ctx = convert::build_context(&config.execution)?;

    // 2. Read target and optional initial candidate
    let target = series_io::read_series(&args.input)?;
    info!(path = %args.input.display(), shape = ?target.shape(), "target loaded");
    let initial = args
        .initial
        .as_deref()
        .map(series_io::read_series)
        .transpose()?;

    // 3. Generate
    let out = generate(&Target::Series(target), initial.as_ref(), &synthesis, &ctx)
        .context("generation failed")?;
    info!(
        status = %out.report.status,
        iterations = out.report.iterations,
        best_loss = out.report.best_loss,
        from_cache = out.report.from_cache,
        "generation finished"
    );

    // 4. Write series and report side by side
    series_io::write_series(&args.output, &out.series)?;
    let report_path = args.output.with_extension("report.json");
    series_io::write_json(&report_path, &out.report)?;
    info!(
        series = %args.output.display(),
        report = %report_path.display(),
        "output written"
    );
    Ok(())
}
