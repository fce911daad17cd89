//! Members command implementation.

use clap::{Parser, Subcommand};
use serde_json::Value;

use crate::cli::CommandContext;
use crate::error::CliError;
use crate::output::Output;

/// Inspect registry members
#[derive(Debug, Parser)]
pub struct MembersCommand {
    #[command(subcommand)]
    pub action: MembersAction,
}

#[derive(Debug, Subcommand)]
pub enum MembersAction {
    /// List members by number
    List,
    /// Show one member by id
    Show {
        /// Member id (the part of the file name after the number)
        id: String,
    },
    /// Print the sponsorship tree, optionally rooted at one member
    Tree {
        /// Only show members sponsored by this member
        #[arg(long)]
        root: Option<String>,
    },
}

impl MembersCommand {
    pub fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        let view = ctx.open_registry()?;
        let out = Output::new(ctx);
        let index = view.member_index();

        match &self.action {
            MembersAction::List => {
                if out.is_json() {
                    let members: Vec<Value> =
                        view.iter_members().map(|m| m.to_json(index, true)).collect();
                    return Ok(out.json(&Value::Array(members))?);
                }
                for member in view.iter_members() {
                    out.line(format!(
                        "{:>4}  {:<20} {}",
                        member.num(),
                        member.id(),
                        member.name().unwrap_or("")
                    ))?;
                }
            }
            MembersAction::Show { id } => {
                let member = view
                    .member_by_id(id)
                    .ok_or_else(|| CliError::not_found("member", id))?;
                if out.is_json() {
                    return Ok(out.json(&member.to_json(index, false))?);
                }
                out.line(out.bold(&format!("#{} {}", member.num(), member.id())))?;
                let sponsor = view
                    .sponsor_of(member)
                    .map(|s| format!("{} (#{})", s.id(), s.num()));
                let person = member.person();
                for (key, value) in [
                    ("name", person.name().map(str::to_string)),
                    ("github", person.github().map(str::to_string)),
                    ("twitter", person.twitter()),
                    ("email", person.email().map(str::to_string)),
                    ("sponsor", sponsor),
                ] {
                    if let Some(value) = value {
                        out.line(format!("  {} {value}", out.dim(&format!("{key:<8}"))))?;
                    }
                }
                if !person.description().is_empty() {
                    out.line("")?;
                    out.line(person.description())?;
                }
            }
            MembersAction::Tree { root } => {
                let tree = match root {
                    Some(id) => {
                        let member = view
                            .member_by_id(id)
                            .ok_or_else(|| CliError::not_found("member", id))?;
                        view.sponsorship_subtree(member)
                    }
                    None => view.sponsorship_tree(),
                };
                if out.is_json() {
                    return Ok(out.json(&tree.to_json())?);
                }
                if let Some(sponsor) = &tree.sponsor {
                    out.line(out.bold(sponsor.id()))?;
                }
                let offset = usize::from(tree.sponsor.is_some());
                for (depth, member) in tree.walk() {
                    out.line(format!("{}{}", "  ".repeat(depth + offset), member.id()))?;
                }
            }
        }
        Ok(())
    }
}
