//! Projects and their lazily loaded auxiliary files.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{debug, warn};
use url::Url;

use crate::cache::ContentCache;
use crate::error::{RegistryError, RegistryResult};
use crate::header::{decode_text, HeaderBlock};
use crate::index::MemberIndex;
use crate::package::PackageSnapshot;
use crate::person::{Member, Person};

/// Standard file names inside a project directory.
pub mod names {
    pub const METADATA: &str = "META";
    pub const README_CANDIDATES: [&str; 3] = ["README.rst", "README.md", "README"];
    pub const EXTENSION_STATUS: &str = "EXTENSION_STATUS";
    pub const PROJECT_LEAD: &str = "PROJECT_LEAD";
    pub const STEWARDSHIP: &str = "stewardship";
}

/// Cache group holding package-index snapshots, keyed by internal name.
pub const PACKAGE_CACHE_GROUP: &str = "projects";

/// Public package page prefix used for `pypi_url`.
pub const PYPI_PROJECT_URL: &str = "https://pypi.python.org/pypi/";

/// Extension approval state. Present only for projects that are extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionStatus {
    meta: HeaderBlock,
}

impl ExtensionStatus {
    pub fn from_header(meta: HeaderBlock) -> Self {
        Self { meta }
    }

    /// True iff the `approved` header is exactly `yes`.
    pub fn is_approved(&self) -> bool {
        self.meta.get("approved") == Some("yes")
    }

    pub fn meta(&self) -> &HeaderBlock {
        &self.meta
    }
}

/// A project lead: either a registry member or an independent person record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectLead {
    Member(Arc<Member>),
    Person(Person),
}

impl ProjectLead {
    pub fn person(&self) -> &Person {
        match self {
            Self::Member(member) => member.person(),
            Self::Person(person) => person,
        }
    }

    pub fn as_member(&self) -> Option<&Arc<Member>> {
        match self {
            Self::Member(member) => Some(member),
            Self::Person(_) => None,
        }
    }

    pub fn is_member(&self) -> bool {
        matches!(self, Self::Member(_))
    }
}

/// One project directory. Everything but the name is read on first access
/// and memoized for the lifetime of the value.
#[derive(Debug)]
pub struct Project {
    internal_name: String,
    path: PathBuf,
    members: Arc<MemberIndex>,
    cache: Arc<ContentCache>,
    meta: OnceCell<HeaderBlock>,
    readme: OnceCell<Option<String>>,
    extension_status: OnceCell<Option<ExtensionStatus>>,
    project_lead: OnceCell<Option<ProjectLead>>,
    stewards: OnceCell<Vec<Arc<Member>>>,
    package_info: OnceCell<Option<PackageSnapshot>>,
}

impl Project {
    pub(crate) fn new(
        internal_name: String,
        path: PathBuf,
        members: Arc<MemberIndex>,
        cache: Arc<ContentCache>,
    ) -> Self {
        Self {
            internal_name,
            path,
            members,
            cache,
            meta: OnceCell::new(),
            readme: OnceCell::new(),
            extension_status: OnceCell::new(),
            project_lead: OnceCell::new(),
            stewards: OnceCell::new(),
            package_info: OnceCell::new(),
        }
    }

    /// Directory name; the stable identifier of the project.
    pub fn internal_name(&self) -> &str {
        &self.internal_name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The `META` header block. A missing file reads as an empty block.
    pub fn metadata(&self) -> RegistryResult<&HeaderBlock> {
        self.meta.get_or_try_init(|| {
            let path = self.path.join(names::METADATA);
            match HeaderBlock::read_file(&path) {
                Err(RegistryError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                    debug!(project = %self.internal_name, "no metadata file");
                    Ok(HeaderBlock::empty(path))
                }
                other => other,
            }
        })
    }

    fn field(&self, key: &str) -> RegistryResult<Option<&str>> {
        Ok(self.metadata()?.get(key))
    }

    pub fn name(&self) -> RegistryResult<Option<&str>> {
        self.field("name")
    }

    pub fn website(&self) -> RegistryResult<Option<&str>> {
        self.field("website")
    }

    pub fn github(&self) -> RegistryResult<Option<&str>> {
        self.field("github")
    }

    pub fn bugtracker(&self) -> RegistryResult<Option<&str>> {
        self.field("bugtracker")
    }

    pub fn documentation(&self) -> RegistryResult<Option<&str>> {
        self.field("documentation")
    }

    /// Package name on the package index.
    pub fn pypi(&self) -> RegistryResult<Option<&str>> {
        self.field("pypi")
    }

    pub fn license(&self) -> RegistryResult<Option<&str>> {
        self.field("license")
    }

    pub fn status(&self) -> RegistryResult<Option<&str>> {
        self.field("status")
    }

    /// Public package page. The package name is percent-encoded except for
    /// `/` and `:`.
    pub fn pypi_url(&self) -> RegistryResult<Option<String>> {
        Ok(self.pypi()?.and_then(pypi_project_url))
    }

    /// First README candidate that can be read, with trailing whitespace stripped.
    pub fn readme(&self) -> RegistryResult<Option<&str>> {
        let readme = self.readme.get_or_try_init(|| {
            for candidate in names::README_CANDIDATES {
                let path = self.path.join(candidate);
                if let Ok(bytes) = fs::read(&path) {
                    let text = decode_text(&bytes, &path)?;
                    return Ok::<_, RegistryError>(Some(text.trim_end().to_string()));
                }
            }
            Ok(None)
        })?;
        Ok(readme.as_deref())
    }

    /// Parsed `EXTENSION_STATUS`, if the file can be opened.
    pub fn extension_status(&self) -> RegistryResult<Option<&ExtensionStatus>> {
        let status = self.extension_status.get_or_try_init(|| {
            let path = self.path.join(names::EXTENSION_STATUS);
            match fs::File::open(&path) {
                Ok(file) => HeaderBlock::parse(io::BufReader::new(file), &path)
                    .map(|meta| Some(ExtensionStatus::from_header(meta))),
                Err(_) => Ok(None),
            }
        })?;
        Ok(status.as_ref())
    }

    /// A project is an extension iff it carries an extension-status file.
    pub fn is_extension(&self) -> RegistryResult<bool> {
        Ok(self.extension_status()?.is_some())
    }

    /// The project lead: a linked member if the lead file resolves to one,
    /// otherwise the file read as an independent person.
    pub fn project_lead(&self) -> RegistryResult<Option<&ProjectLead>> {
        let lead = self.project_lead.get_or_try_init(|| {
            let path = self.path.join(names::PROJECT_LEAD);
            if !path.exists() {
                return Ok(None);
            }
            if let Some(member) = self.members.locate_linked_member(&path) {
                return Ok(Some(ProjectLead::Member(member)));
            }
            Person::read(&path).map(|person| Some(ProjectLead::Person(person)))
        })?;
        Ok(lead.as_ref())
    }

    /// Members listed under `stewardship/`. Entries that resolve to no member
    /// are dropped.
    pub fn stewards(&self) -> &[Arc<Member>] {
        self.stewards.get_or_init(|| {
            let dir = self.path.join(names::STEWARDSHIP);
            let Ok(entries) = fs::read_dir(&dir) else {
                return Vec::new();
            };

            let mut paths: Vec<PathBuf> = entries
                .filter_map(Result::ok)
                .map(|entry| entry.path())
                .collect();
            paths.sort();

            paths
                .iter()
                .filter_map(|path| {
                    let member = self.members.locate_linked_member(path);
                    if member.is_none() {
                        warn!(
                            project = %self.internal_name,
                            entry = %path.display(),
                            "stewardship entry does not resolve to a member"
                        );
                    }
                    member
                })
                .collect()
        })
    }

    pub fn has_stewards(&self) -> bool {
        !self.stewards().is_empty()
    }

    /// Last package-index snapshot stored in the content cache.
    pub fn package_info(&self) -> Option<&PackageSnapshot> {
        self.package_info
            .get_or_init(|| {
                let bytes = match self.cache.read(PACKAGE_CACHE_GROUP, &self.internal_name) {
                    Ok(bytes) => bytes?,
                    Err(e) => {
                        warn!(project = %self.internal_name, error = %e, "unreadable package cache entry");
                        return None;
                    }
                };
                match PackageSnapshot::from_slice(&bytes) {
                    Ok(snapshot) => Some(snapshot),
                    Err(e) => {
                        warn!(project = %self.internal_name, error = %e, "invalid package cache entry");
                        None
                    }
                }
            })
            .as_ref()
    }

    /// Latest released version according to the cached snapshot.
    pub fn latest_release(&self) -> Option<&str> {
        self.package_info().and_then(PackageSnapshot::latest_release)
    }

    pub(crate) fn members(&self) -> &MemberIndex {
        &self.members
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Project {:?}>", self.internal_name)
    }
}

fn pypi_project_url(name: &str) -> Option<String> {
    let mut url = Url::parse(PYPI_PROJECT_URL).ok()?;
    url.path_segments_mut()
        .ok()?
        .pop_if_empty()
        .extend(name.split('/'))
        .push("");
    Some(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use metaflask_test_utils::{temp_dir, CheckoutFixture};

    fn project(fixture: &CheckoutFixture, name: &str, members: MemberIndex) -> Project {
        Project::new(
            name.to_string(),
            fixture.add_project(name),
            Arc::new(members),
            Arc::new(ContentCache::new(fixture.root().join(".cache"))),
        )
    }

    #[test]
    fn test_missing_files_are_absent() {
        let fixture = CheckoutFixture::new();
        let p = project(&fixture, "bare", MemberIndex::default());
        assert!(p.metadata().unwrap().is_empty());
        assert_eq!(p.name().unwrap(), None);
        assert_eq!(p.readme().unwrap(), None);
        assert!(!p.is_extension().unwrap());
        assert!(p.project_lead().unwrap().is_none());
        assert!(p.stewards().is_empty());
        assert!(p.package_info().is_none());
        assert_eq!(p.pypi_url().unwrap(), None);
    }

    #[test]
    fn test_metadata_fields() {
        let fixture = CheckoutFixture::new();
        fixture.write_project_file(
            "flask",
            "META",
            "Name: Flask\nWebsite: http://flask.pocoo.org/\nGitHub: pallets/flask\nPyPI: Flask\nLicense: BSD\nStatus: stable\n",
        );
        let p = project(&fixture, "flask", MemberIndex::default());
        assert_eq!(p.name().unwrap(), Some("Flask"));
        assert_eq!(p.github().unwrap(), Some("pallets/flask"));
        assert_eq!(p.license().unwrap(), Some("BSD"));
        assert_eq!(p.status().unwrap(), Some("stable"));
        assert_eq!(
            p.pypi_url().unwrap().as_deref(),
            Some("https://pypi.python.org/pypi/Flask/")
        );
    }

    #[test]
    fn test_pypi_url_is_percent_encoded() {
        assert_eq!(
            pypi_project_url("a b/c").as_deref(),
            Some("https://pypi.python.org/pypi/a%20b/c/")
        );
        assert_eq!(
            pypi_project_url("ns:pkg?x#y").as_deref(),
            Some("https://pypi.python.org/pypi/ns:pkg%3Fx%23y/")
        );
    }

    #[test]
    fn test_malformed_metadata_is_an_error() {
        let fixture = CheckoutFixture::new();
        fixture.write_project_file("broken", "META", "this is not a header\n");
        let p = project(&fixture, "broken", MemberIndex::default());
        assert!(matches!(p.metadata(), Err(RegistryError::Format { .. })));
    }

    #[test]
    fn test_readme_candidate_order() {
        let fixture = CheckoutFixture::new();
        fixture.write_project_file("jinja", "README", "plain");
        fixture.write_project_file("jinja", "README.md", "markdown\n\n");
        let p = project(&fixture, "jinja", MemberIndex::default());
        assert_eq!(p.readme().unwrap(), Some("markdown"));
    }

    #[test]
    fn test_readme_must_be_utf8() {
        let fixture = CheckoutFixture::new();
        fixture.write_project_file("bad", "README.rst", b"\xff\xfe".as_slice());
        let p = project(&fixture, "bad", MemberIndex::default());
        assert!(matches!(p.readme(), Err(RegistryError::Encoding { .. })));
    }

    #[test]
    fn test_extension_status() {
        let fixture = CheckoutFixture::new();
        fixture.write_project_file("flask-sqlalchemy", "EXTENSION_STATUS", "Approved: yes\n");
        fixture.write_project_file("flask-foo", "EXTENSION_STATUS", "Approved: Yes\n");
        let approved = project(&fixture, "flask-sqlalchemy", MemberIndex::default());
        let pending = project(&fixture, "flask-foo", MemberIndex::default());

        assert!(approved.is_extension().unwrap());
        assert!(approved.extension_status().unwrap().unwrap().is_approved());
        assert!(pending.is_extension().unwrap());
        assert!(!pending.extension_status().unwrap().unwrap().is_approved());
    }

    #[test]
    fn test_independent_lead_is_a_person() {
        let fixture = CheckoutFixture::new();
        fixture.write_project_file("click", "PROJECT_LEAD", "Name: Outside Contributor\n\nHi.\n");
        let p = project(&fixture, "click", MemberIndex::default());
        let lead = p.project_lead().unwrap().unwrap();
        assert!(!lead.is_member());
        assert_eq!(lead.person().name(), Some("Outside Contributor"));
        assert_eq!(lead.person().description(), "Hi.");
    }

    #[test]
    fn test_copied_lead_resolves_to_member() {
        let fixture = CheckoutFixture::new();
        let alice = fixture.add_member(1, "alice", Some("alice"), None);
        let members = MemberIndex::build([Member::new(Person::read(&alice).unwrap(), 1, "alice")]);
        fixture.copy_into_project("click", "PROJECT_LEAD", &alice);

        let p = project(&fixture, "click", members);
        let lead = p.project_lead().unwrap().unwrap();
        assert_eq!(lead.as_member().unwrap().id(), "alice");
    }

    #[test]
    fn test_unresolved_stewards_are_dropped() {
        let fixture = CheckoutFixture::new();
        let alice = fixture.add_member(1, "alice", Some("alice"), None);
        let members = MemberIndex::build([Member::new(Person::read(&alice).unwrap(), 1, "alice")]);
        fixture.copy_into_project("werkzeug", "stewardship/alice", &alice);
        fixture.write_project_file("werkzeug", "stewardship/nobody", "Name: Nobody\n");

        let p = project(&fixture, "werkzeug", members);
        let ids: Vec<_> = p.stewards().iter().map(|m| m.id()).collect();
        assert_eq!(ids, vec!["alice"]);
        assert!(p.has_stewards());
    }

    #[test]
    fn test_package_info_from_cache() {
        let fixture = CheckoutFixture::new();
        let cache = ContentCache::new(fixture.root().join(".cache"));
        cache
            .write(PACKAGE_CACHE_GROUP, "flask", br#"{"info": {"version": "0.12"}}"#)
            .unwrap();

        let p = project(&fixture, "flask", MemberIndex::default());
        assert_eq!(p.latest_release(), Some("0.12"));
    }

    #[test]
    fn test_invalid_package_cache_is_absent() {
        let dir = temp_dir();
        let cache = ContentCache::new(dir.path());
        cache.write(PACKAGE_CACHE_GROUP, "flask", b"not json").unwrap();
        let p = Project::new(
            "flask".to_string(),
            dir.path().join("flask"),
            Arc::new(MemberIndex::default()),
            Arc::new(cache),
        );
        assert!(p.package_info().is_none());
    }

    #[test]
    fn test_lazy_fields_are_memoized() {
        let fixture = CheckoutFixture::new();
        fixture.write_project_file("flask", "README", "first");
        let p = project(&fixture, "flask", MemberIndex::default());
        assert_eq!(p.readme().unwrap(), Some("first"));

        fixture.write_project_file("flask", "README", "second");
        assert_eq!(p.readme().unwrap(), Some("first"));
    }
}
