//! Projects command implementation.

use clap::{Parser, Subcommand};
use crossterm::style::Color;
use metaflask_registry::{MetaView, Project};
use serde_json::Value;

use crate::cli::CommandContext;
use crate::error::CliError;
use crate::output::Output;

/// Inspect registry projects
#[derive(Debug, Parser)]
pub struct ProjectsCommand {
    #[command(subcommand)]
    pub action: ProjectsAction,
}

#[derive(Debug, Subcommand)]
pub enum ProjectsAction {
    /// List all projects
    List,
    /// Show one project by directory name
    Show {
        /// Internal project name (the directory under projects/)
        name: String,
    },
    /// List projects that are Flask extensions
    Extensions,
    /// List projects without any resolvable steward
    NeedsStewards,
}

impl ProjectsCommand {
    pub fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        let view = ctx.open_registry()?;
        let out = Output::new(ctx);

        match &self.action {
            ProjectsAction::List => print_list(&out, view.iter_projects()),
            ProjectsAction::Extensions => print_list(&out, view.iter_extensions()?),
            ProjectsAction::NeedsStewards => {
                print_list(&out, view.iter_projects().filter(|p| !p.has_stewards()))
            }
            ProjectsAction::Show { name } => show(&out, &view, name),
        }
    }
}

fn print_list<'a>(
    out: &Output,
    projects: impl IntoIterator<Item = &'a Project>,
) -> Result<(), CliError> {
    if out.is_json() {
        let list = projects
            .into_iter()
            .map(|p| p.to_json(true))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(out.json(&Value::Array(list))?);
    }

    for project in projects {
        let mut line = format!(
            "{:<24} {:<28}",
            project.internal_name(),
            project.name()?.unwrap_or("")
        );
        if let Some(release) = project.latest_release() {
            line.push_str(&out.dim(release));
        }
        if project.extension_status()?.is_some_and(|s| s.is_approved()) {
            line.push_str(&format!(" {}", out.paint("approved", Color::Green)));
        }
        out.line(line.trim_end())?;
    }
    Ok(())
}

fn show(out: &Output, view: &MetaView, name: &str) -> Result<(), CliError> {
    let project = view
        .project(name)
        .ok_or_else(|| CliError::not_found("project", name))?;
    if out.is_json() {
        return Ok(out.json(&project.to_json(false)?)?);
    }

    out.line(out.bold(project.name()?.unwrap_or(project.internal_name())))?;
    let fields = [
        ("website", project.website()?.map(str::to_string)),
        ("github", project.github()?.map(str::to_string)),
        ("docs", project.documentation()?.map(str::to_string)),
        ("bugs", project.bugtracker()?.map(str::to_string)),
        ("pypi", project.pypi_url()?),
        ("license", project.license()?.map(str::to_string)),
        ("status", project.status()?.map(str::to_string)),
        ("release", project.latest_release().map(str::to_string)),
        (
            "lead",
            project
                .project_lead()?
                .map(|lead| lead.person().name().unwrap_or("(unnamed)").to_string()),
        ),
    ];
    for (key, value) in fields {
        if let Some(value) = value {
            out.line(format!("  {} {value}", out.dim(&format!("{key:<8}"))))?;
        }
    }

    let stewards: Vec<&str> = project.stewards().iter().map(|m| m.id()).collect();
    let stewards = if stewards.is_empty() {
        out.paint("none", Color::Yellow)
    } else {
        stewards.join(", ")
    };
    out.line(format!("  {} {stewards}", out.dim("stewards")))?;

    if let Some(readme) = project.readme()? {
        out.line("")?;
        out.line(readme)?;
    }
    Ok(())
}
