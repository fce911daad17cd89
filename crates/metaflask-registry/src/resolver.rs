//! Identity resolution: does a file on disk denote a known member?
//!
//! A project may reference a member either through a symlink into the
//! `members/` directory or through a byte-identical copy of the member file.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::trace;

use crate::header::content_checksum;
use crate::index::MemberIndex;
use crate::person::Member;

impl MemberIndex {
    /// Resolve `path` to a member, first by symlink target, then by content checksum.
    ///
    /// Never fails: link errors fall through to the checksum lookup, and read
    /// errors or unknown content yield `None`.
    pub fn locate_linked_member(&self, path: &Path) -> Option<Arc<Member>> {
        if let Some(target) = resolve_link(path) {
            if let Some(member) = self.by_path(&target) {
                trace!(path = %path.display(), member = %member.id(), "resolved by link");
                return Some(member.clone());
            }
        }

        let bytes = fs::read(path).ok()?;
        let member = self.by_checksum(&content_checksum(&bytes))?;
        trace!(path = %path.display(), member = %member.id(), "resolved by checksum");
        Some(member.clone())
    }
}

/// Canonical target of a symlink, interpreted relative to its directory.
fn resolve_link(path: &Path) -> Option<PathBuf> {
    let target = fs::read_link(path).ok()?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    base.join(target).canonicalize().ok()
}
