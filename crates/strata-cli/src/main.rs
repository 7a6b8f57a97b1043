//! # Strata
//!
//! Command-line driver for the Strata world model:
//! - `generate` a world from a seed and save it
//! - `inspect` a save (size, surface, block counts)
//! - `preview` a save as a PNG
//! - `edit` a save by placing or destroying blocks
//! - `list` the saves in a directory

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod commands;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::commands::Cli;

/// Main entry point.
fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("strata=info".parse()?))
        .init();

    info!("Strata {}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    commands::run(cli)
}
