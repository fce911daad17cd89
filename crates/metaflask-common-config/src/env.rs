//! Process environment and `.env` files.

use std::env;

/// Variables the tools read directly.
pub mod vars {
    /// Config file path, same as `--config`.
    pub const METAFLASK_CONFIG: &str = "METAFLASK_CONFIG";
    /// GitHub token used when the config file leaves `github.access_token` empty.
    pub const METAFLASK_GITHUB_TOKEN: &str = "METAFLASK_GITHUB_TOKEN";
    /// Selects an extra `.env.<name>` file.
    pub const METAFLASK_ENV: &str = "METAFLASK_ENV";
}

/// Marker that `.env` files have been loaded into the process environment.
#[derive(Debug)]
pub struct Environment {
    profile: Option<String>,
}

impl Environment {
    /// Load `.env`, `.env.local` and `.env.<METAFLASK_ENV>` from the working
    /// directory when present. Variables already set in the process win, and
    /// earlier files win over later ones.
    pub fn init() -> Self {
        for file in [".env", ".env.local"] {
            // Missing files are the common case.
            let _ = dotenvy::from_filename(file);
        }

        let profile = Self::var(vars::METAFLASK_ENV);
        if let Some(name) = &profile {
            let _ = dotenvy::from_filename(format!(".env.{name}"));
        }

        Self { profile }
    }

    /// Value of `METAFLASK_ENV` at load time.
    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    /// A variable's value, treating empty as unset.
    pub fn var(name: &str) -> Option<String> {
        env::var(name).ok().filter(|v| !v.trim().is_empty())
    }

    pub fn github_token() -> Option<String> {
        Self::var(vars::METAFLASK_GITHUB_TOKEN)
    }
}
