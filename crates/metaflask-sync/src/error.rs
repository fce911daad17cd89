//! Error types for synchronisation passes.

use std::path::PathBuf;

use metaflask_common_http::{HttpError, ResponseError};
use metaflask_registry::RegistryError;
use thiserror::Error;

use crate::reconcile::RosterChange;

/// Result type for synchronisation.
pub type SyncResult<T> = Result<T, SyncError>;

/// Failure of a synchronisation step.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The registry checkout could not be read.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A remote call failed at the transport level or returned an error status.
    #[error("{service} request failed: {source}")]
    Remote {
        service: &'static str,
        #[source]
        source: HttpError,
    },

    /// A remote service answered with an unexpected body.
    #[error("{service} returned an unexpected response: {source}")]
    Response {
        service: &'static str,
        #[source]
        source: ResponseError,
    },

    /// A request URL could not be built from the configured base.
    #[error("invalid URL {url:?}: {message}")]
    Url { url: String, message: String },

    /// `git` exited unsuccessfully.
    #[error("git {command} failed with {status}: {stderr}")]
    Git {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("io error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SyncError {
    pub(crate) fn remote(service: &'static str, source: HttpError) -> Self {
        Self::Remote { service, source }
    }

    pub(crate) fn response(service: &'static str, source: ResponseError) -> Self {
        Self::Response { service, source }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True for failures talking to a remote service.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. } | Self::Response { .. })
    }
}

/// A reconciliation pass that stopped part way.
///
/// Changes made before the failure are not rolled back; `applied` lists every
/// action emitted up to that point.
#[derive(Debug, Error)]
#[error("roster reconciliation aborted after {} action(s): {source}", applied.len())]
pub struct ReconcileError {
    pub applied: Vec<RosterChange>,
    #[source]
    pub source: SyncError,
}
