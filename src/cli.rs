use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Scattering Spectra analysis and synthesis of time series.
#[derive(Parser)]
#[command(
    name = "scatspectra",
    version,
    about = "Scattering Spectra analysis and synthesis of time series"
)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Extract Scattering Spectra statistics from a series file.
    Analyze(AnalyzeArgs),
    /// Generate series matching the statistics of a series file.
    Generate(GenerateArgs),
}

/// Arguments for the `analyze` subcommand.
#[derive(clap::Args)]
pub struct AnalyzeArgs {
    /// Path to TOML configuration file.
    #[arg(short, long, default_value = "scatspectra.toml")]
    pub config: PathBuf,

    /// Input series JSON (`{"shape": [R, N, T], "data": [...]}`).
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output JSON path; stdout when omitted.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Row filter `field=v1,v2`; repeat to combine.
    #[arg(short, long = "filter")]
    pub filters: Vec<String>,

    /// Average the statistics over realizations.
    #[arg(long)]
    pub mean_batch: bool,
}

/// Arguments for the `generate` subcommand.
#[derive(clap::Args)]
pub struct GenerateArgs {
    /// Path to TOML configuration file.
    #[arg(short, long, default_value = "scatspectra.toml")]
    pub config: PathBuf,

    /// Target series JSON.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output path for the generated series JSON.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Initial candidate series JSON; seeded white noise when omitted.
    #[arg(long)]
    pub initial: Option<PathBuf>,

    /// Override the synthesis seed from config.
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Override the generation cache directory from config.
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Override the experiment name from config.
    #[arg(long)]
    pub exp_name: Option<String>,
}
