//! Synchronisation of the Metaflask registry with the outside world.
//!
//! - [`reconcile`]: bring a remote roster (the GitHub member team) in line
//!   with the registry's members.
//! - [`projects`]: refresh cached package metadata from the package index.
//! - [`checkout`]: clone or update the local metadata checkout.
//!
//! Remote services sit behind the [`RosterProvider`] and
//! [`PackageInfoProvider`] traits; [`GitHubTeamRoster`] and
//! [`PackageIndexClient`] are the HTTP implementations.

pub mod checkout;
pub mod error;
pub mod github;
pub mod projects;
pub mod pypi;
pub mod reconcile;

pub use checkout::sync_checkout;
pub use error::{ReconcileError, SyncError, SyncResult};
pub use github::GitHubTeamRoster;
pub use projects::{sync_projects, ProjectSyncResult, ProjectSyncStatus};
pub use pypi::{PackageIndexClient, PackageInfoProvider};
pub use reconcile::{
    intended_identities, reconcile, sync_members, RosterAction, RosterChange, RosterProvider,
};
