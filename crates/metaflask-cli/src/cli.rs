//! CLI argument definitions using clap derive macros.

use std::path::{Path, PathBuf};

use clap::{ArgAction, ColorChoice, Parser, Subcommand, ValueHint};
use metaflask_common_config::{CheckoutConfig, ConfigLoader, Environment, MetaflaskConfig};
use metaflask_common_http::{HttpClient, HttpConfig};
use metaflask_registry::MetaView;

use crate::commands::{DumpCommand, MembersCommand, ProjectsCommand, SyncCommand};
use crate::error::CliError;

/// Metaflask - the Flask community member and project registry
///
/// Reads a checkout of the metadata repository and keeps the GitHub member
/// team and cached package data in line with it.
#[derive(Debug, Parser)]
#[command(
    name = "metaflask",
    author,
    version,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Increase verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(
        short,
        long,
        global = true,
        env = "METAFLASK_CONFIG",
        value_hint = ValueHint::FilePath
    )]
    pub config: Option<PathBuf>,

    /// Metadata checkout to read instead of the configured one
    #[arg(long, global = true, env = "METAFLASK_CHECKOUT", value_hint = ValueHint::DirPath)]
    pub checkout: Option<PathBuf>,

    /// When to use terminal colors
    #[arg(long, global = true, default_value = "auto", value_enum)]
    pub color: ColorChoice,

    /// Output format
    #[arg(long, global = true, default_value = "text", value_enum)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Available subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Update the checkout, the member team or the package cache
    Sync(SyncCommand),

    /// Inspect registry members
    Members(MembersCommand),

    /// Inspect registry projects
    Projects(ProjectsCommand),

    /// Print every member and project as JSON
    Dump(DumpCommand),
}

impl Cli {
    /// Load configuration from `--config` or `.metaflask/config.yaml` in the
    /// working directory. Returns the config and the directory relative paths
    /// in it are resolved against.
    pub fn load_config(&self) -> Result<(MetaflaskConfig, PathBuf), CliError> {
        let cwd = std::env::current_dir()
            .map_err(|e| CliError::Other(anyhow::Error::new(e).context("no working directory")))?;

        let (mut config, base) = match &self.config {
            Some(path) => {
                let base = config_base_dir(path, &cwd);
                (ConfigLoader::new(&base).load_file(&cwd.join(path))?, base)
            }
            None => (ConfigLoader::new(&cwd).load()?, cwd),
        };

        if config.github.access_token.is_empty() {
            if let Some(token) = Environment::github_token() {
                config.github.access_token = token;
            }
        }
        Ok((config, base))
    }

    /// Execute the selected command
    pub async fn execute(self, config: MetaflaskConfig, base_dir: PathBuf) -> Result<(), CliError> {
        let cwd = std::env::current_dir().unwrap_or_else(|_| base_dir.clone());
        let checkout_path = match &self.checkout {
            Some(path) => cwd.join(path),
            None => config.checkout.resolved_path(&base_dir),
        };

        let ctx = CommandContext {
            config,
            checkout_path,
            format: self.format,
            color: self.color,
            quiet: self.quiet,
        };

        match self.command {
            Command::Sync(cmd) => cmd.execute(&ctx).await,
            Command::Members(cmd) => cmd.execute(&ctx),
            Command::Projects(cmd) => cmd.execute(&ctx),
            Command::Dump(cmd) => cmd.execute(&ctx),
        }
    }
}

/// A config file at `<dir>/.metaflask/config.yaml` resolves relative paths
/// against `<dir>`; any other file against its own directory.
fn config_base_dir(path: &Path, cwd: &Path) -> PathBuf {
    let absolute = cwd.join(path);
    let parent = absolute.parent().map(Path::to_path_buf).unwrap_or_else(|| cwd.to_path_buf());
    match (parent.file_name(), parent.parent()) {
        (Some(name), Some(grandparent)) if name == metaflask_common_config::CONFIG_DIR => {
            grandparent.to_path_buf()
        }
        _ => parent,
    }
}

/// Context passed to all commands
#[derive(Debug)]
pub struct CommandContext {
    pub config: MetaflaskConfig,
    /// Resolved checkout directory.
    pub checkout_path: PathBuf,
    pub format: OutputFormat,
    pub color: ColorChoice,
    pub quiet: bool,
}

impl CommandContext {
    /// Checkout settings with the path already resolved.
    pub fn checkout(&self) -> CheckoutConfig {
        CheckoutConfig {
            path: self.checkout_path.clone(),
            ..self.config.checkout.clone()
        }
    }

    pub fn open_registry(&self) -> Result<MetaView, CliError> {
        Ok(MetaView::open(&self.checkout_path)?)
    }

    pub fn http_client(&self) -> Result<HttpClient, CliError> {
        Ok(HttpClient::with_config(HttpConfig::from(&self.config.http))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "metaflask", "members", "show", "mitsuhiko", "--format", "json", "-vv",
        ])
        .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["metaflask", "-q", "-v", "dump"]).is_err());
    }

    #[test]
    fn test_config_base_dir() {
        let cwd = Path::new("/work");
        assert_eq!(
            config_base_dir(Path::new(".metaflask/config.yaml"), cwd),
            PathBuf::from("/work")
        );
        assert_eq!(
            config_base_dir(Path::new("/etc/metaflask.yaml"), cwd),
            PathBuf::from("/etc")
        );
    }
}
