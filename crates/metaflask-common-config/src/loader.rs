//! Configuration file loading and parsing.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use thiserror::Error;
use url::Url;

use crate::types::MetaflaskConfig;

/// Directory holding the config file, relative to the base directory.
pub const CONFIG_DIR: &str = ".metaflask";
pub const CONFIG_FILE: &str = "config.yaml";

static ENV_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([^}:]+)(?::-([^}]*))?\}").expect("env reference pattern"));

/// Config loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read config: {source}")]
    ReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("invalid YAML at line {}: {message}", line.map(|l| l.to_string()).unwrap_or_else(|| "unknown".to_string()))]
    ParseError { line: Option<usize>, message: String },

    #[error("validation error: {message}")]
    ValidationError { message: String },

    #[error("environment variable not found: {var}")]
    EnvVarNotFound { var: String },
}

impl ConfigError {
    fn invalid(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }
}

/// Configuration loader rooted at a base directory.
pub struct ConfigLoader {
    base_path: PathBuf,
}

impl ConfigLoader {
    /// Create a loader for the given base directory.
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Default location of the config file.
    pub fn config_path(&self) -> PathBuf {
        self.base_path.join(CONFIG_DIR).join(CONFIG_FILE)
    }

    /// Load `.metaflask/config.yaml`, falling back to defaults when it is absent.
    pub fn load(&self) -> Result<MetaflaskConfig, ConfigError> {
        let config_path = self.config_path();
        if !config_path.exists() {
            return Ok(MetaflaskConfig::default());
        }
        self.load_file(&config_path)
    }

    /// Load an explicitly named config file, which must exist.
    pub fn load_file(&self, path: &Path) -> Result<MetaflaskConfig, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let contents = std::fs::read_to_string(path)?;
        let config = Self::parse(&contents)?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Expand environment references and deserialize.
    pub fn parse(contents: &str) -> Result<MetaflaskConfig, ConfigError> {
        let expanded = expand_env_vars(contents)?;
        serde_yaml::from_str(&expanded).map_err(|e| ConfigError::ParseError {
            line: e.location().map(|l| l.line()),
            message: e.to_string(),
        })
    }

    /// Validate configuration values.
    pub fn validate(config: &MetaflaskConfig) -> Result<(), ConfigError> {
        if config.github.member_team_id == 0 {
            return Err(ConfigError::invalid("github.member_team_id must be set"));
        }

        if config.http.connect_timeout_secs == 0 || config.http.request_timeout_secs == 0 {
            return Err(ConfigError::invalid("http timeouts must be greater than 0"));
        }

        if config.checkout.repository.trim().is_empty() {
            return Err(ConfigError::invalid("checkout.repository must not be empty"));
        }

        for (field, value) in [
            ("github.api_base_url", &config.github.api_base_url),
            ("pypi.base_url", &config.pypi.base_url),
            ("checkout.clone_base_url", &config.checkout.clone_base_url),
        ] {
            Url::parse(value)
                .map_err(|e| ConfigError::invalid(format!("{field} is not a valid URL: {e}")))?;
        }

        Ok(())
    }

    /// Save configuration to the default location.
    pub fn save(&self, config: &MetaflaskConfig) -> Result<(), ConfigError> {
        let config_dir = self.base_path.join(CONFIG_DIR);
        std::fs::create_dir_all(&config_dir)?;

        let yaml = serde_yaml::to_string(config).map_err(|e| ConfigError::ParseError {
            line: None,
            message: e.to_string(),
        })?;

        std::fs::write(config_dir.join(CONFIG_FILE), yaml)?;
        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new(std::env::current_dir().unwrap_or_default())
    }
}

/// Expand `${VAR}` and `${VAR:-default}` references.
pub fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
    let mut missing = None;
    let expanded = ENV_REF.replace_all(content, |cap: &Captures<'_>| {
        let var_name = &cap[1];
        match (std::env::var(var_name), cap.get(2)) {
            (Ok(value), _) => value,
            (Err(_), Some(default)) => default.as_str().to_string(),
            (Err(_), None) => {
                missing.get_or_insert_with(|| var_name.to_string());
                String::new()
            }
        }
    });

    match missing {
        Some(var) => Err(ConfigError::EnvVarNotFound { var }),
        None => Ok(expanded.into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_config(dir: &Path, contents: &str) {
        let config_dir = dir.join(CONFIG_DIR);
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join(CONFIG_FILE), contents).unwrap();
    }

    #[test]
    fn test_load_defaults_when_no_file() {
        let dir = tempdir().unwrap();
        let config = ConfigLoader::new(dir.path()).load().unwrap();
        assert_eq!(config, MetaflaskConfig::default());
    }

    #[test]
    fn test_load_config_from_yaml_file() {
        let dir = tempdir().unwrap();
        write_config(
            dir.path(),
            r#"
checkout:
  path: /srv/metaflask
  repository: example/meta
github:
  access_token: abc123
  member_team_id: 42
pypi:
  base_url: https://pypi.example.org/pypi/
"#,
        );

        let config = ConfigLoader::new(dir.path()).load().unwrap();
        assert_eq!(config.checkout.path, PathBuf::from("/srv/metaflask"));
        assert_eq!(config.checkout.repository, "example/meta");
        assert_eq!(config.github.access_token, "abc123");
        assert_eq!(config.github.member_team_id, 42);
        assert_eq!(config.pypi.base_url, "https://pypi.example.org/pypi/");
        assert_eq!(config.http.request_timeout_secs, 30);
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempdir().unwrap();
        let loader = ConfigLoader::new(dir.path());
        let err = loader.load_file(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn test_env_var_expansion() {
        std::env::set_var("METAFLASK_TEST_TOKEN", "from-env");
        let result = expand_env_vars("token: ${METAFLASK_TEST_TOKEN}").unwrap();
        assert_eq!(result, "token: from-env");
        std::env::remove_var("METAFLASK_TEST_TOKEN");
    }

    #[test]
    fn test_env_var_default() {
        let result = expand_env_vars("key: ${METAFLASK_TEST_NONEXISTENT:-fallback}").unwrap();
        assert_eq!(result, "key: fallback");
    }

    #[test]
    fn test_env_var_missing_error() {
        match expand_env_vars("key: ${METAFLASK_TEST_MISSING}") {
            Err(ConfigError::EnvVarNotFound { var }) => assert_eq!(var, "METAFLASK_TEST_MISSING"),
            other => panic!("Expected EnvVarNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_multiple_env_vars_in_single_value() {
        std::env::set_var("METAFLASK_TEST_OWNER", "pallets");
        std::env::set_var("METAFLASK_TEST_REPO", "meta");
        let result = expand_env_vars("repository: ${METAFLASK_TEST_OWNER}/${METAFLASK_TEST_REPO}").unwrap();
        assert_eq!(result, "repository: pallets/meta");
        std::env::remove_var("METAFLASK_TEST_OWNER");
        std::env::remove_var("METAFLASK_TEST_REPO");
    }

    #[test]
    fn test_validation_errors() {
        let mut config = MetaflaskConfig::default();
        config.github.member_team_id = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::ValidationError { message }) if message.contains("member_team_id")
        ));

        let mut config = MetaflaskConfig::default();
        config.http.connect_timeout_secs = 0;
        assert!(ConfigLoader::validate(&config).is_err());

        let mut config = MetaflaskConfig::default();
        config.pypi.base_url = "not a url".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::ValidationError { message }) if message.contains("pypi.base_url")
        ));

        assert!(ConfigLoader::validate(&MetaflaskConfig::default()).is_ok());
    }

    #[test]
    fn test_parse_error_with_line_number() {
        let dir = tempdir().unwrap();
        write_config(dir.path(), "github:\n  access_token: [unclosed\n");
        match ConfigLoader::new(dir.path()).load() {
            Err(ConfigError::ParseError { line, .. }) => assert!(line.is_some()),
            other => panic!("Expected ParseError, got {other:?}"),
        }
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let loader = ConfigLoader::new(dir.path());

        let mut config = MetaflaskConfig::default();
        config.github.member_team_id = 7;
        config.checkout.path = PathBuf::from("meta");
        loader.save(&config).unwrap();

        assert!(loader.config_path().exists());
        assert_eq!(loader.load().unwrap(), config);
    }
}
