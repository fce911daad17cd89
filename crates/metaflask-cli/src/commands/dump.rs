//! Dump command implementation.

use clap::Parser;

use crate::cli::CommandContext;
use crate::error::CliError;
use crate::output::Output;

/// Print every member and project as JSON
#[derive(Debug, Parser)]
pub struct DumpCommand {}

impl DumpCommand {
    pub fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        let view = ctx.open_registry()?;
        // Always JSON, whatever --format says.
        Output::new(ctx).json(&view.to_json()?)?;
        Ok(())
    }
}
