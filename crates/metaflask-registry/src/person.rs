//! People and members.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{RegistryError, RegistryResult};
use crate::header::HeaderBlock;

/// Sponsor value meaning "this member is a root of the sponsorship tree".
pub const SELF_SPONSOR: &str = "<self>";

/// A person record read from a header-block file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    path: PathBuf,
    meta: HeaderBlock,
    description: String,
}

impl Person {
    /// Read a person from `path`. The stored path is canonicalized.
    pub fn read(path: impl AsRef<Path>) -> RegistryResult<Self> {
        let path = path.as_ref();
        let canonical = path
            .canonicalize()
            .map_err(|e| RegistryError::io(path, e))?;
        let meta = HeaderBlock::read_file(&canonical)?;
        Self::from_header(canonical, meta)
    }

    /// Build a person from an already parsed block.
    pub fn from_header(path: PathBuf, meta: HeaderBlock) -> RegistryResult<Self> {
        let description = meta.body_text()?.trim_end().to_string();
        Ok(Self {
            path,
            meta,
            description,
        })
    }

    /// Canonical path of the source file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> Option<&str> {
        self.meta.get("name")
    }

    pub fn github(&self) -> Option<&str> {
        self.meta.get("github")
    }

    /// Twitter handle, always prefixed with a single `@`.
    pub fn twitter(&self) -> Option<String> {
        self.meta
            .get("twitter")
            .filter(|handle| !handle.is_empty())
            .map(|handle| format!("@{}", handle.trim_start_matches('@')))
    }

    pub fn email(&self) -> Option<&str> {
        self.meta.get("e-mail")
    }

    /// Free-text body with trailing whitespace removed.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Checksum of the complete source file.
    pub fn checksum(&self) -> &str {
        self.meta.checksum()
    }

    /// Raw header block.
    pub fn meta(&self) -> &HeaderBlock {
        &self.meta
    }
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Person {:?}>", self.name().unwrap_or_default())
    }
}

/// A person with formal membership: a sequential number and a string id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    person: Person,
    num: u32,
    id: String,
}

impl Member {
    pub fn new(person: Person, num: u32, id: impl Into<String>) -> Self {
        Self {
            person,
            num,
            id: id.into(),
        }
    }

    /// Membership number, the primary ordering key.
    pub fn num(&self) -> u32 {
        self.num
    }

    /// Id taken from the member's filename.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The identity record this membership wraps.
    pub fn person(&self) -> &Person {
        &self.person
    }

    pub fn name(&self) -> Option<&str> {
        self.person.name()
    }

    pub fn github(&self) -> Option<&str> {
        self.person.github()
    }

    pub fn checksum(&self) -> &str {
        self.person.checksum()
    }

    pub fn path(&self) -> &Path {
        self.person.path()
    }

    /// GitHub handle of the sponsoring member.
    ///
    /// `None` when the header is absent, empty, or [`SELF_SPONSOR`]. The
    /// handle is resolved against a registry by
    /// [`MemberIndex::sponsor_of`](crate::MemberIndex::sponsor_of).
    pub fn sponsor_handle(&self) -> Option<&str> {
        self.person
            .meta()
            .get("sponsor")
            .filter(|s| !s.is_empty() && *s != SELF_SPONSOR)
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Member {:04}: {:?}>", self.num, self.id)
    }
}
