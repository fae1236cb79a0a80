//! livetmpl - render templates against a live-reloading template cache.

mod cli;

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};
use cli::Cli;
use livetmpl::config::Config;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let mut config = Config::load(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    config.apply_overrides(cli.root.clone(), cli.ext.clone(), cli.verbose)?;
    livetmpl::logger::set_verbose(config.log.verbose);

    cli::run(&cli, &config)
}
