//! The registry view over a metadata checkout.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use metaflask_common_log::{registry_span, timed};
use serde_json::{json, Value};
use tracing::info;

use crate::cache::ContentCache;
use crate::error::RegistryResult;
use crate::index::MemberIndex;
use crate::person::Member;
use crate::project::Project;
use crate::reader::{read_members, read_project_names};
use crate::tree::SponsorTree;

/// Directory names inside a checkout.
pub const MEMBERS_DIR: &str = "members";
pub const PROJECTS_DIR: &str = "projects";
pub const CACHE_DIR: &str = ".cache";

/// Read-only view of all members and projects in a checkout.
///
/// Members are read and indexed eagerly; projects are discovered eagerly and
/// hydrated on first access. A view is never updated in place: build a new
/// one to pick up changes on disk.
#[derive(Debug)]
pub struct MetaView {
    root: PathBuf,
    members: Arc<MemberIndex>,
    projects: BTreeMap<String, Project>,
    cache: Arc<ContentCache>,
}

impl MetaView {
    /// Open the checkout at `root`. Any malformed member file fails the open.
    pub fn open(root: impl AsRef<Path>) -> RegistryResult<Self> {
        let root = root.as_ref().to_path_buf();
        let _span = registry_span(&root).entered();

        let members = timed!("read_members", read_members(&root.join(MEMBERS_DIR)))?;
        let members = Arc::new(MemberIndex::build(members));
        let cache = Arc::new(ContentCache::new(root.join(CACHE_DIR)));

        let projects_dir = root.join(PROJECTS_DIR);
        let projects = read_project_names(&projects_dir)?
            .into_iter()
            .map(|name| {
                let project = Project::new(
                    name.clone(),
                    projects_dir.join(&name),
                    members.clone(),
                    cache.clone(),
                );
                (name, project)
            })
            .collect::<BTreeMap<_, _>>();

        info!(
            members = members.len(),
            projects = projects.len(),
            "registry opened"
        );

        Ok(Self {
            root,
            members,
            projects,
            cache,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn members_dir(&self) -> PathBuf {
        self.root.join(MEMBERS_DIR)
    }

    pub fn projects_dir(&self) -> PathBuf {
        self.root.join(PROJECTS_DIR)
    }

    /// Cache of remote package snapshots for this checkout.
    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }

    /// Underlying member indices.
    pub fn member_index(&self) -> &MemberIndex {
        &self.members
    }

    /// Members ordered by ascending number.
    pub fn iter_members(&self) -> impl Iterator<Item = &Arc<Member>> {
        self.members.iter()
    }

    /// Projects ordered by internal name.
    pub fn iter_projects(&self) -> impl Iterator<Item = &Project> {
        self.projects.values()
    }

    /// Projects that carry an extension-status file, ordered by internal name.
    pub fn iter_extensions(&self) -> RegistryResult<Vec<&Project>> {
        let mut extensions = Vec::new();
        for project in self.iter_projects() {
            if project.is_extension()? {
                extensions.push(project);
            }
        }
        Ok(extensions)
    }

    pub fn member_by_id(&self, id: &str) -> Option<&Arc<Member>> {
        self.members.by_id(id)
    }

    pub fn member_by_num(&self, num: u32) -> Option<&Arc<Member>> {
        self.members.by_num(num)
    }

    pub fn member_by_github(&self, handle: &str) -> Option<&Arc<Member>> {
        self.members.by_github(handle)
    }

    pub fn member_by_checksum(&self, checksum: &str) -> Option<&Arc<Member>> {
        self.members.by_checksum(checksum)
    }

    pub fn member_by_path(&self, path: &Path) -> Option<&Arc<Member>> {
        self.members.by_path(path)
    }

    /// The sponsoring member, resolved by GitHub handle.
    pub fn sponsor_of(&self, member: &Member) -> Option<&Arc<Member>> {
        self.members.sponsor_of(member)
    }

    pub fn project(&self, internal_name: &str) -> Option<&Project> {
        self.projects.get(internal_name)
    }

    pub fn project_count(&self) -> usize {
        self.projects.len()
    }

    /// Resolve a file or symlink to the member it denotes.
    pub fn locate_linked_member(&self, path: &Path) -> Option<Arc<Member>> {
        self.members.locate_linked_member(path)
    }

    /// Sponsorship tree over every member.
    pub fn sponsorship_tree(&self) -> SponsorTree {
        SponsorTree::build(&self.members)
    }

    /// Members sponsored, directly or transitively, by `member`.
    pub fn sponsorship_subtree(&self, member: &Arc<Member>) -> SponsorTree {
        SponsorTree::subtree(&self.members, member)
    }

    /// Full dump of the registry: every member and every project.
    pub fn to_json(&self) -> RegistryResult<Value> {
        let members: Vec<Value> = self
            .iter_members()
            .map(|m| m.to_json(&self.members, false))
            .collect();
        let projects = self
            .iter_projects()
            .map(|p| p.to_json(false))
            .collect::<RegistryResult<Vec<_>>>()?;
        Ok(json!({ "members": members, "projects": projects }))
    }
}
