//! Roster reconciliation: bring a remote team in line with the registry.

use std::collections::HashSet;
use std::fmt;

use async_trait::async_trait;
use metaflask_common_log::{record_error, sync_span};
use metaflask_registry::MetaView;
use serde::Serialize;
use tracing::{debug, info, Instrument};

use crate::error::{ReconcileError, SyncResult};

/// A remote list of identities that can be edited one entry at a time.
#[async_trait]
pub trait RosterProvider: Send + Sync {
    /// Identities currently on the roster, in provider order.
    async fn list_current(&self) -> SyncResult<Vec<String>>;

    /// Add or invite `identity`.
    async fn add(&self, identity: &str) -> SyncResult<()>;

    /// Remove `identity`.
    async fn remove(&self, identity: &str) -> SyncResult<()>;

    /// Whether `identity` has an outstanding invitation.
    async fn is_pending(&self, identity: &str) -> SyncResult<bool>;
}

/// Outcome for one identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RosterAction {
    /// On the roster and intended; untouched.
    Retained,
    /// Intended but missing; added to the roster.
    Added,
    /// Intended but missing with an invitation already outstanding; untouched.
    Pending,
    /// On the roster but not intended; removed.
    Deleted,
}

impl RosterAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Retained => "retained",
            Self::Added => "added",
            Self::Pending => "pending",
            Self::Deleted => "deleted",
        }
    }

    /// True if the action issued a mutating remote call.
    pub fn is_mutation(&self) -> bool {
        matches!(self, Self::Added | Self::Deleted)
    }
}

impl fmt::Display for RosterAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the reconciliation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterChange {
    pub action: RosterAction,
    pub identity: String,
}

impl RosterChange {
    fn new(action: RosterAction, identity: &str) -> Self {
        Self {
            action,
            identity: identity.to_string(),
        }
    }
}

/// GitHub handles of all members in ascending member-number order.
///
/// Members without a handle are skipped and repeated handles are kept once.
pub fn intended_identities(view: &MetaView) -> Vec<String> {
    let mut seen = HashSet::new();
    view.iter_members()
        .filter_map(|member| member.github())
        .filter(|handle| seen.insert(*handle))
        .map(str::to_string)
        .collect()
}

/// Reconcile `intended` against the roster held by `provider`.
///
/// Intended identities are handled first, in order, one action each. Roster
/// entries that are not intended follow in provider order and are removed.
/// The first provider failure stops the pass; earlier changes stay applied.
pub async fn reconcile<P>(intended: &[String], provider: &P) -> Result<Vec<RosterChange>, ReconcileError>
where
    P: RosterProvider + ?Sized,
{
    let mut applied = Vec::new();
    match run(intended, provider, &mut applied).await {
        Ok(()) => {
            let mutations = applied.iter().filter(|c| c.action.is_mutation()).count();
            info!(actions = applied.len(), mutations, "roster reconciled");
            Ok(applied)
        }
        Err(source) => Err(ReconcileError { applied, source }),
    }
}

async fn run<P>(intended: &[String], provider: &P, applied: &mut Vec<RosterChange>) -> SyncResult<()>
where
    P: RosterProvider + ?Sized,
{
    let current = provider.list_current().await?;
    let current_set: HashSet<&str> = current.iter().map(String::as_str).collect();
    let mut handled: HashSet<&str> = HashSet::new();

    for identity in intended {
        if !handled.insert(identity.as_str()) {
            continue;
        }

        let action = if current_set.contains(identity.as_str()) {
            RosterAction::Retained
        } else if provider.is_pending(identity).await? {
            RosterAction::Pending
        } else {
            provider.add(identity).await?;
            RosterAction::Added
        };
        debug!(%identity, %action, "roster entry");
        applied.push(RosterChange::new(action, identity));
    }

    for identity in &current {
        if !handled.insert(identity.as_str()) {
            continue;
        }
        provider.remove(identity).await?;
        debug!(%identity, action = %RosterAction::Deleted, "roster entry");
        applied.push(RosterChange::new(RosterAction::Deleted, identity));
    }

    Ok(())
}

/// Reconcile the registry's members against `roster`.
pub async fn sync_members<P>(view: &MetaView, roster: &P) -> Result<Vec<RosterChange>, ReconcileError>
where
    P: RosterProvider + ?Sized,
{
    let span = sync_span("members");
    let intended = intended_identities(view);
    let result = reconcile(&intended, roster).instrument(span.clone()).await;
    if let Err(err) = &result {
        let _entered = span.enter();
        record_error(&err.source);
    }
    result
}
