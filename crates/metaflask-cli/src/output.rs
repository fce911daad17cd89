//! Format-aware printing to stdout.

use std::fmt::Display;
use std::io::{self, IsTerminal, Write};

use clap::ColorChoice;
use crossterm::style::{Color, Stylize};
use metaflask_sync::{ProjectSyncStatus, RosterAction};
use serde_json::Value;

use crate::cli::{CommandContext, OutputFormat};

/// Main output handler
pub struct Output {
    format: OutputFormat,
    color: bool,
    quiet: bool,
}

impl Output {
    pub fn new(ctx: &CommandContext) -> Self {
        let color = match ctx.color {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => {
                io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none()
            }
        };
        Self {
            format: ctx.format,
            color,
            quiet: ctx.quiet,
        }
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Pretty-print a JSON document. Printed even with `--quiet`.
    pub fn json(&self, value: &Value) -> io::Result<()> {
        let mut out = io::stdout().lock();
        serde_json::to_writer_pretty(&mut out, value)?;
        writeln!(out)
    }

    /// Print a line of text output.
    pub fn line(&self, text: impl Display) -> io::Result<()> {
        writeln!(io::stdout().lock(), "{text}")
    }

    /// Print a progress note; suppressed by `--quiet` and in JSON mode.
    pub fn note(&self, text: impl Display) -> io::Result<()> {
        if self.quiet || self.is_json() {
            return Ok(());
        }
        writeln!(io::stdout().lock(), "{text}")
    }

    pub fn paint(&self, text: &str, color: Color) -> String {
        if self.color {
            text.with(color).to_string()
        } else {
            text.to_string()
        }
    }

    pub fn dim(&self, text: &str) -> String {
        if self.color {
            text.dim().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn bold(&self, text: &str) -> String {
        if self.color {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    /// `  <action>  <identity>` with the action colored by kind.
    pub fn roster_line(&self, action: RosterAction, identity: &str) -> String {
        let color = match action {
            RosterAction::Added => Color::Green,
            RosterAction::Retained | RosterAction::Pending => Color::Cyan,
            RosterAction::Deleted => Color::Red,
        };
        format!("  {}  {identity}", self.paint(&format!("{:<8}", action.as_str()), color))
    }

    pub fn project_line(&self, status: ProjectSyncStatus, project: &str) -> String {
        let color = match status {
            ProjectSyncStatus::Updated => Color::Cyan,
            ProjectSyncStatus::NotFound => Color::Yellow,
            ProjectSyncStatus::Skipped => Color::DarkGrey,
        };
        format!("  {}  {project}", self.paint(&format!("{:<9}", status.as_str()), color))
    }
}
