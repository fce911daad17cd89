//! Refresh of cached package metadata for every project.

use std::fmt;

use metaflask_common_log::{record_error, sync_span};
use metaflask_registry::{MetaView, PACKAGE_CACHE_GROUP};
use serde::Serialize;
use tracing::{debug, info, Instrument};

use crate::error::SyncResult;
use crate::pypi::PackageInfoProvider;

/// What happened to one project during a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectSyncStatus {
    /// Fresh metadata was written to the cache.
    Updated,
    /// The project names a package the index does not know.
    NotFound,
    /// The project names no package.
    Skipped,
}

impl ProjectSyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Updated => "updated",
            Self::NotFound => "not_found",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for ProjectSyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectSyncResult {
    pub project: String,
    pub status: ProjectSyncStatus,
}

/// Fetch package metadata for every project that names a package and store
/// the raw document in the view's cache. Stops at the first failure.
///
/// The view's projects memoize what they read, so open a fresh view to see
/// the new data.
pub async fn sync_projects<P>(view: &MetaView, packages: &P) -> SyncResult<Vec<ProjectSyncResult>>
where
    P: PackageInfoProvider + ?Sized,
{
    let span = sync_span("projects");
    let result = refresh_all(view, packages).instrument(span.clone()).await;
    if let Err(err) = &result {
        let _entered = span.enter();
        record_error(err);
    }
    result
}

async fn refresh_all<P>(view: &MetaView, packages: &P) -> SyncResult<Vec<ProjectSyncResult>>
where
    P: PackageInfoProvider + ?Sized,
{
    let mut results = Vec::new();

    for project in view.iter_projects() {
        let name = project.internal_name();
        let status = match project.pypi()? {
            None => ProjectSyncStatus::Skipped,
            Some(package) => match packages.fetch(package).await? {
                Some(bytes) => {
                    view.cache().write(PACKAGE_CACHE_GROUP, name, &bytes)?;
                    ProjectSyncStatus::Updated
                }
                None => ProjectSyncStatus::NotFound,
            },
        };
        debug!(project = name, %status, "project refreshed");
        results.push(ProjectSyncResult {
            project: name.to_string(),
            status,
        });
    }

    let updated = results
        .iter()
        .filter(|r| r.status == ProjectSyncStatus::Updated)
        .count();
    info!(projects = results.len(), updated, "package metadata refreshed");
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use metaflask_common_http::HttpError;
    use metaflask_test_utils::CheckoutFixture;
    use pretty_assertions::assert_eq;

    use crate::error::SyncError;

    #[derive(Default)]
    struct FakeIndex {
        documents: HashMap<String, Vec<u8>>,
        broken: Option<String>,
        requested: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PackageInfoProvider for FakeIndex {
        async fn fetch(&self, package: &str) -> SyncResult<Option<Vec<u8>>> {
            self.requested.lock().unwrap().push(package.to_string());
            if self.broken.as_deref() == Some(package) {
                return Err(SyncError::remote("fake", HttpError::Timeout));
            }
            Ok(self.documents.get(package).cloned())
        }
    }

    fn checkout() -> CheckoutFixture {
        let fixture = CheckoutFixture::new();
        fixture.write_project_file("flask", "META", "Name: Flask\nPyPI: Flask\n");
        fixture.write_project_file("gone", "META", "Name: Gone\nPyPI: gone-package\n");
        fixture.write_project_file("notes", "META", "Name: Notes\n");
        fixture
    }

    #[tokio::test]
    async fn test_statuses_and_cache() {
        let fixture = checkout();
        let index = FakeIndex {
            documents: [("Flask".to_string(), br#"{"info": {"version": "1.0.2"}}"#.to_vec())]
                .into_iter()
                .collect(),
            ..FakeIndex::default()
        };

        let view = MetaView::open(fixture.root()).unwrap();
        let results = sync_projects(&view, &index).await.unwrap();
        let summary: Vec<_> = results
            .iter()
            .map(|r| (r.project.as_str(), r.status))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("flask", ProjectSyncStatus::Updated),
                ("gone", ProjectSyncStatus::NotFound),
                ("notes", ProjectSyncStatus::Skipped),
            ]
        );
        assert_eq!(
            *index.requested.lock().unwrap(),
            vec!["Flask".to_string(), "gone-package".to_string()]
        );

        let reopened = MetaView::open(fixture.root()).unwrap();
        assert_eq!(reopened.project("flask").unwrap().latest_release(), Some("1.0.2"));
        assert_eq!(reopened.project("gone").unwrap().latest_release(), None);
    }

    #[tokio::test]
    async fn test_remote_failure_aborts() {
        let fixture = checkout();
        let index = FakeIndex {
            broken: Some("Flask".to_string()),
            ..FakeIndex::default()
        };
        let view = MetaView::open(fixture.root()).unwrap();
        let err = sync_projects(&view, &index).await.unwrap_err();
        assert!(err.is_remote());
        assert_eq!(index.requested.lock().unwrap().len(), 1);
    }
}
