//! Directory scanning for members and projects.

use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, trace};

use crate::error::{RegistryError, RegistryResult};
use crate::person::{Member, Person};

static MEMBER_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})_(.*?)\.txt$").expect("member filename pattern"));

/// Split a member filename into its number and id.
pub fn parse_member_filename(name: &str) -> Option<(u32, &str)> {
    let caps = MEMBER_FILE.captures(name)?;
    let num = caps.get(1)?.as_str().parse().ok()?;
    Some((num, caps.get(2)?.as_str()))
}

/// Read every `NNNN_<id>.txt` file in `dir`, ordered by `(num, id)`.
///
/// Non-matching names are ignored. Any unreadable or malformed member file
/// fails the whole read.
pub fn read_members(dir: &Path) -> RegistryResult<Vec<Member>> {
    let entries = fs::read_dir(dir).map_err(|e| RegistryError::io(dir, e))?;
    let mut members = Vec::new();

    for entry in entries {
        let entry = entry.map_err(|e| RegistryError::io(dir, e))?;
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            trace!(entry = ?file_name, "skipping non-UTF-8 file name");
            continue;
        };
        let Some((num, id)) = parse_member_filename(name) else {
            trace!(entry = name, "skipping non-member file");
            continue;
        };

        let person = Person::read(entry.path())?;
        members.push(Member::new(person, num, id));
    }

    members.sort_by(|a, b| (a.num(), a.id()).cmp(&(b.num(), b.id())));
    debug!(count = members.len(), dir = %dir.display(), "members read");
    Ok(members)
}

/// Names of the project directories in `dir`, sorted. Dot entries are skipped.
pub fn read_project_names(dir: &Path) -> RegistryResult<Vec<String>> {
    let entries = fs::read_dir(dir).map_err(|e| RegistryError::io(dir, e))?;
    let mut names = Vec::new();

    for entry in entries {
        let entry = entry.map_err(|e| RegistryError::io(dir, e))?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        if entry.path().is_dir() {
            names.push(name);
        }
    }

    names.sort();
    debug!(count = names.len(), dir = %dir.display(), "projects discovered");
    Ok(names)
}
