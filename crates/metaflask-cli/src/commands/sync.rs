//! Sync command implementation.

use clap::{Args, Parser, Subcommand};
use metaflask_registry::MetaView;
use metaflask_sync::{
    sync_checkout, sync_members, sync_projects, GitHubTeamRoster, PackageIndexClient,
    ReconcileError, RosterChange,
};
use serde_json::json;
use tracing::info;

use crate::cli::CommandContext;
use crate::error::CliError;
use crate::output::Output;

/// Update the checkout, the member team or the package cache
#[derive(Debug, Parser)]
pub struct SyncCommand {
    #[command(subcommand)]
    pub target: SyncTarget,
}

#[derive(Debug, Subcommand)]
pub enum SyncTarget {
    /// Clone the metadata repository if needed, then pull
    Git,
    /// Make the GitHub member team match the registry
    Members(PullArgs),
    /// Refresh cached package metadata for every project
    Projects(PullArgs),
    /// Pull, then sync members and projects
    All(PullArgs),
}

#[derive(Debug, Args)]
pub struct PullArgs {
    /// Use the checkout as it is instead of pulling first
    #[arg(long)]
    pub no_pull: bool,
}

impl SyncCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        let out = Output::new(ctx);
        match &self.target {
            SyncTarget::Git => {
                pull(ctx, &out).await?;
                if out.is_json() {
                    out.json(&json!({ "checkout": ctx.checkout_path }))?;
                }
            }
            SyncTarget::Members(args) => {
                let view = prepare(ctx, &out, args).await?;
                let changes = members(ctx, &out, &view).await?;
                if out.is_json() {
                    out.json(&json!({ "members": changes }))?;
                }
            }
            SyncTarget::Projects(args) => {
                let view = prepare(ctx, &out, args).await?;
                let results = projects(ctx, &out, &view).await?;
                if out.is_json() {
                    out.json(&json!({ "projects": results }))?;
                }
            }
            SyncTarget::All(args) => {
                let view = prepare(ctx, &out, args).await?;
                let changes = members(ctx, &out, &view).await?;
                let results = projects(ctx, &out, &view).await?;
                if out.is_json() {
                    out.json(&json!({ "members": changes, "projects": results }))?;
                }
            }
        }
        Ok(())
    }
}

async fn pull(ctx: &CommandContext, out: &Output) -> Result<(), CliError> {
    out.note(out.bold("Updating checkout"))?;
    let path = sync_checkout(&ctx.checkout(), &ctx.checkout_path).await?;
    out.note(format!("  {}", path.display()))?;
    Ok(())
}

async fn prepare(ctx: &CommandContext, out: &Output, args: &PullArgs) -> Result<MetaView, CliError> {
    if !args.no_pull {
        pull(ctx, out).await?;
    }
    ctx.open_registry()
}

async fn members(
    ctx: &CommandContext,
    out: &Output,
    view: &MetaView,
) -> Result<Vec<RosterChange>, CliError> {
    let roster = GitHubTeamRoster::new(ctx.http_client()?, &ctx.config.github)?;
    out.note(out.bold(&format!("Syncing members with team {}", roster.team_id())))?;

    match sync_members(view, &roster).await {
        Ok(changes) => {
            print_changes(out, &changes)?;
            Ok(changes)
        }
        Err(err) => {
            // Whatever was applied before the failure has happened remotely.
            print_changes(out, &err.applied)?;
            report_partial(&err);
            Err(err.into())
        }
    }
}

fn print_changes(out: &Output, changes: &[RosterChange]) -> Result<(), CliError> {
    if out.is_json() {
        return Ok(());
    }
    for change in changes {
        out.line(out.roster_line(change.action, &change.identity))?;
    }
    Ok(())
}

fn report_partial(err: &ReconcileError) {
    let mutations = err.applied.iter().filter(|c| c.action.is_mutation()).count();
    info!(applied = err.applied.len(), mutations, "member sync stopped early");
}

async fn projects(
    ctx: &CommandContext,
    out: &Output,
    view: &MetaView,
) -> Result<Vec<metaflask_sync::ProjectSyncResult>, CliError> {
    let packages = PackageIndexClient::new(ctx.http_client()?, &ctx.config.pypi)?;
    out.note(out.bold("Syncing project package data"))?;

    let results = sync_projects(view, &packages).await?;
    if !out.is_json() {
        for result in &results {
            out.line(out.project_line(result.status, &result.project))?;
        }
    }
    Ok(results)
}
