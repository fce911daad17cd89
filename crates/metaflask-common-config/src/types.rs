//! Configuration types.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetaflaskConfig {
    /// Local metadata checkout.
    pub checkout: CheckoutConfig,
    /// GitHub team synchronisation.
    pub github: GitHubConfig,
    /// Package index.
    pub pypi: PypiConfig,
    /// Shared HTTP client settings.
    pub http: HttpSettings,
}

/// Where the metadata repository lives locally and where it is cloned from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckoutConfig {
    /// Checkout directory. Relative paths are resolved against the config base directory.
    pub path: PathBuf,
    /// Repository in `owner/name` form.
    pub repository: String,
    /// Prefix joined with `repository` to form the clone URL.
    pub clone_base_url: String,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("checkout"),
            repository: "pocoo/metaflask".to_string(),
            clone_base_url: "https://github.com/".to_string(),
        }
    }
}

impl CheckoutConfig {
    /// Full clone URL of the metadata repository.
    pub fn clone_url(&self) -> String {
        format!(
            "{}/{}",
            self.clone_base_url.trim_end_matches('/'),
            self.repository.trim_start_matches('/')
        )
    }

    /// Checkout directory, resolved against `base` when relative.
    pub fn resolved_path(&self, base: &Path) -> PathBuf {
        if self.path.is_absolute() {
            self.path.clone()
        } else {
            base.join(&self.path)
        }
    }
}

/// GitHub API access for member team synchronisation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub api_base_url: String,
    /// Personal access token. Usually `${METAFLASK_GITHUB_TOKEN}`.
    pub access_token: String,
    /// Team whose membership mirrors the registry's members.
    pub member_team_id: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.github.com/".to_string(),
            access_token: String::new(),
            member_team_id: 899232,
        }
    }
}

/// Package index access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PypiConfig {
    pub base_url: String,
}

impl Default for PypiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://pypi.python.org/pypi/".to_string(),
        }
    }
}

/// Timeouts applied to every outgoing request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
        }
    }
}

impl HttpSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
