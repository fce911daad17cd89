//! Local clone of the metadata repository.

use std::path::{Path, PathBuf};

use metaflask_common_config::CheckoutConfig;
use metaflask_common_log::sync_span;
use tokio::process::Command;
use tracing::{debug, info, Instrument};

use crate::error::{SyncError, SyncResult};

/// Make sure the checkout exists and is up to date.
///
/// A missing checkout is cloned from the configured repository first. Either
/// way `git pull` runs afterwards. Relative checkout paths are resolved
/// against `base`. Returns the checkout directory.
pub async fn sync_checkout(config: &CheckoutConfig, base: &Path) -> SyncResult<PathBuf> {
    let path = config.resolved_path(base);
    async {
        if !path.exists() {
            let parent = path.parent().unwrap_or(base);
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SyncError::io(parent, e))?;

            let url = config.clone_url();
            let target = path.to_string_lossy().into_owned();
            info!(%url, path = %path.display(), "cloning metadata repository");
            git(parent, &["clone", &url, &target]).await?;
        }

        git(&path, &["pull"]).await?;
        info!(path = %path.display(), "checkout up to date");
        Ok::<_, SyncError>(())
    }
    .instrument(sync_span("git"))
    .await?;
    Ok(path)
}

async fn git(cwd: &Path, args: &[&str]) -> SyncResult<()> {
    let output = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .output()
        .await
        .map_err(|e| SyncError::io(cwd, e))?;

    if !output.status.success() {
        return Err(SyncError::Git {
            command: args.first().copied().unwrap_or_default().to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    debug!(command = ?args, "git finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command as StdCommand;

    fn git_available() -> bool {
        StdCommand::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn run(cwd: &Path, args: &[&str]) {
        let status = StdCommand::new("git")
            .args(args)
            .current_dir(cwd)
            .env("GIT_AUTHOR_NAME", "test")
            .env("GIT_AUTHOR_EMAIL", "test@example.com")
            .env("GIT_COMMITTER_NAME", "test")
            .env("GIT_COMMITTER_EMAIL", "test@example.com")
            .status()
            .unwrap();
        assert!(status.success(), "git {args:?} failed");
    }

    #[tokio::test]
    async fn test_clone_then_pull() {
        if !git_available() {
            return;
        }
        let upstream = tempfile::tempdir().unwrap();
        let source = upstream.path().join("meta");
        std::fs::create_dir(&source).unwrap();
        run(&source, &["init", "--quiet"]);
        std::fs::write(source.join("README"), "hello\n").unwrap();
        run(&source, &["add", "README"]);
        run(&source, &["commit", "--quiet", "-m", "initial"]);

        let work = tempfile::tempdir().unwrap();
        let config = CheckoutConfig {
            path: PathBuf::from("nested/checkout"),
            repository: "meta".to_string(),
            clone_base_url: format!("file://{}", upstream.path().display()),
        };

        let path = sync_checkout(&config, work.path()).await.unwrap();
        assert_eq!(path, work.path().join("nested/checkout"));
        assert_eq!(std::fs::read_to_string(path.join("README")).unwrap(), "hello\n");

        // Second run only pulls.
        std::fs::write(source.join("NEW"), "x").unwrap();
        run(&source, &["add", "NEW"]);
        run(&source, &["commit", "--quiet", "-m", "second"]);
        sync_checkout(&config, work.path()).await.unwrap();
        assert!(path.join("NEW").exists());
    }

    #[tokio::test]
    async fn test_pull_outside_repository_fails() {
        if !git_available() {
            return;
        }
        let work = tempfile::tempdir().unwrap();
        std::fs::create_dir(work.path().join("checkout")).unwrap();
        let config = CheckoutConfig {
            path: work.path().join("checkout"),
            ..CheckoutConfig::default()
        };
        let err = sync_checkout(&config, work.path()).await.unwrap_err();
        match err {
            SyncError::Git { command, .. } => assert_eq!(command, "pull"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
