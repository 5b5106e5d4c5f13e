use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "fieldframe",
    author,
    version,
    about = "SDF art-frame compositor daemon",
    arg_required_else_help = false
)]
pub struct Cli {
    /// Path to the configuration file (defaults to the user config directory).
    #[arg(value_name = "CONFIG")]
    pub config: Option<PathBuf>,

    /// Run a bounded number of ticks then exit (0 runs forever).
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub ticks: u64,

    /// Write the final presented frame to the given PNG path before exiting.
    #[arg(long, value_name = "PATH")]
    pub export: Option<PathBuf>,

    /// Override the rotation seed from the configuration.
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Override the display resolution (e.g. `240x320`).
    #[arg(long, value_name = "WIDTHxHEIGHT")]
    pub size: Option<String>,
}

pub fn parse() -> Cli {
    Cli::parse()
}

/// Parses a `WIDTHxHEIGHT` resolution override.
pub fn parse_surface_size(value: &str) -> Result<(u32, u32)> {
    let (width_raw, height_raw) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| anyhow!("expected WIDTHxHEIGHT, got '{value}'"))?;
    let width: u32 = width_raw
        .trim()
        .parse()
        .map_err(|_| anyhow!("invalid width in '{value}'"))?;
    let height: u32 = height_raw
        .trim()
        .parse()
        .map_err(|_| anyhow!("invalid height in '{value}'"))?;
    if width == 0 || height == 0 {
        return Err(anyhow!("surface dimensions must be nonzero, got '{value}'"));
    }
    Ok((width, height))
}
