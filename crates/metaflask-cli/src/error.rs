//! CLI error type and exit codes.

use std::process::ExitCode;

use metaflask_common_config::ConfigError;
use metaflask_common_http::HttpError;
use metaflask_common_log::LogError;
use metaflask_registry::RegistryError;
use metaflask_sync::{ReconcileError, SyncError};
use thiserror::Error;

/// Everything a command can fail with, grouped by exit code.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{message}")]
    Io {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("{message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("{message}")]
    Data {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("{resource_type} not found: {resource_name}")]
    NotFound {
        resource_type: String,
        resource_name: String,
    },

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Process exit status for this error.
    pub fn code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Io { .. } => 3,
            Self::Network { .. } => 4,
            Self::Data { .. } => 5,
            Self::NotFound { .. } => 6,
            Self::Other(_) => 1,
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.code())
    }

    pub fn not_found(resource_type: impl Into<String>, resource_name: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            resource_name: resource_name.into(),
        }
    }

    fn io(message: String, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Io {
            message,
            source: Some(Box::new(source)),
        }
    }

    fn network(message: String, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Network {
            message,
            source: Some(Box::new(source)),
        }
    }

    fn data(message: String, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Data {
            message,
            source: Some(Box::new(source)),
        }
    }
}

impl From<RegistryError> for CliError {
    fn from(err: RegistryError) -> Self {
        let message = err.to_string();
        if err.is_data_error() {
            Self::data(message, err)
        } else {
            Self::io(message, err)
        }
    }
}

impl From<HttpError> for CliError {
    fn from(err: HttpError) -> Self {
        Self::network(format!("http client error: {err}"), err)
    }
}

impl From<SyncError> for CliError {
    fn from(err: SyncError) -> Self {
        let message = err.to_string();
        match err {
            SyncError::Registry(inner) => inner.into(),
            SyncError::Remote { .. } | SyncError::Response { .. } | SyncError::Url { .. } => {
                Self::network(message, err)
            }
            SyncError::Git { .. } | SyncError::Io { .. } => Self::io(message, err),
        }
    }
}

impl From<ReconcileError> for CliError {
    fn from(err: ReconcileError) -> Self {
        let message = err.to_string();
        Self::Network {
            message,
            source: Some(Box::new(err.source)),
        }
    }
}

impl From<LogError> for CliError {
    fn from(err: LogError) -> Self {
        Self::Other(anyhow::Error::new(err).context("failed to set up logging"))
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::io(format!("output error: {err}"), err)
    }
}
