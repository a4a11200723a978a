//! Output rendering for resolved package metadata.
//!
//! Renderers are pure projections of [`PackageMetadata`]; they write to any
//! [`std::io::Write`] so tests can capture the output.

mod json;
mod table;

use std::io::Write;

use anyhow::Result;
use clap::ValueEnum;

use crate::package::PackageMetadata;

pub use json::render_json;
pub use table::render_table;

/// Output format selected on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

pub fn render<W: Write>(
    out: &mut W,
    metadata: &PackageMetadata,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Table => render_table(out, metadata),
        OutputFormat::Json => render_json(out, metadata),
    }
}

/// Print a failure the way every command reports errors.
pub fn render_error<W: Write>(out: &mut W, message: &str) -> Result<()> {
    writeln!(out, "Error: {}", message)?;
    Ok(())
}
