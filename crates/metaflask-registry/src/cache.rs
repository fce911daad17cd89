//! Content cache for blobs fetched from remote services.
//!
//! Entries live at `<root>/<group>/<sha256(key)>`, so arbitrary keys map to
//! safe file names.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{RegistryError, RegistryResult};
use crate::header::content_checksum;

/// How a cache entry is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheMode {
    /// Open an existing entry; absent entries yield `None`.
    Read,
    /// Create or truncate the entry.
    Write,
}

/// A directory of cached blobs grouped by kind.
#[derive(Debug, Clone)]
pub struct ContentCache {
    root: PathBuf,
}

impl ContentCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of the entry for `key` in `group`.
    pub fn entry_path(&self, group: &str, key: &str) -> PathBuf {
        self.root
            .join(group)
            .join(content_checksum(key.as_bytes()))
    }

    /// Open the entry for `key`. The group directory is created on demand.
    pub fn open(&self, group: &str, key: &str, mode: CacheMode) -> RegistryResult<Option<File>> {
        let folder = self.root.join(group);
        fs::create_dir_all(&folder).map_err(|e| RegistryError::io(&folder, e))?;

        let path = self.entry_path(group, key);
        let result = match mode {
            CacheMode::Read => File::open(&path),
            CacheMode::Write => OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&path),
        };

        match result {
            Ok(file) => Ok(Some(file)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(RegistryError::io(&path, e)),
        }
    }

    /// Read the whole entry, if present.
    pub fn read(&self, group: &str, key: &str) -> RegistryResult<Option<Vec<u8>>> {
        let Some(mut file) = self.open(group, key, CacheMode::Read)? else {
            return Ok(None);
        };
        let mut contents = Vec::new();
        file.read_to_end(&mut contents)
            .map_err(|e| RegistryError::io(self.entry_path(group, key), e))?;
        Ok(Some(contents))
    }

    /// Replace the entry atomically: write a temporary sibling, then rename.
    pub fn write(&self, group: &str, key: &str, contents: &[u8]) -> RegistryResult<()> {
        let folder = self.root.join(group);
        fs::create_dir_all(&folder).map_err(|e| RegistryError::io(&folder, e))?;

        let path = self.entry_path(group, key);
        let mut temp_path = path.clone();
        if let Some(name) = path.file_name() {
            temp_path.set_file_name(format!(".{}.tmp", name.to_string_lossy()));
        }

        {
            let mut file = File::create(&temp_path).map_err(|e| RegistryError::io(&temp_path, e))?;
            file.write_all(contents)
                .and_then(|_| file.sync_all())
                .map_err(|e| RegistryError::io(&temp_path, e))?;
        }

        fs::rename(&temp_path, &path).map_err(|e| RegistryError::io(&path, e))?;
        debug!(group, key, bytes = contents.len(), "cache entry written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metaflask_test_utils::temp_dir;

    #[test]
    fn test_missing_entry_is_absent() {
        let dir = temp_dir();
        let cache = ContentCache::new(dir.path().join(".cache"));
        assert!(cache.open("projects", "flask", CacheMode::Read).unwrap().is_none());
        assert!(cache.read("projects", "flask").unwrap().is_none());
        // The group folder is created even for reads.
        assert!(dir.path().join(".cache/projects").is_dir());
    }

    #[test]
    fn test_write_then_read() {
        let dir = temp_dir();
        let cache = ContentCache::new(dir.path());
        cache.write("projects", "flask", b"{\"info\": {}}").unwrap();
        assert_eq!(
            cache.read("projects", "flask").unwrap().as_deref(),
            Some(&b"{\"info\": {}}"[..])
        );
        // Overwrite replaces the whole entry.
        cache.write("projects", "flask", b"{}").unwrap();
        assert_eq!(cache.read("projects", "flask").unwrap().as_deref(), Some(&b"{}"[..]));
    }

    #[test]
    fn test_write_mode_open() {
        let dir = temp_dir();
        let cache = ContentCache::new(dir.path());
        let mut file = cache
            .open("projects", "jinja", CacheMode::Write)
            .unwrap()
            .unwrap();
        file.write_all(b"data").unwrap();
        drop(file);
        assert_eq!(cache.read("projects", "jinja").unwrap().unwrap(), b"data");
    }

    #[test]
    fn test_entry_names_are_hashed_keys() {
        let cache = ContentCache::new("/cache");
        let path = cache.entry_path("projects", "../../etc/passwd");
        assert_eq!(path.parent().unwrap(), Path::new("/cache/projects"));
        assert_eq!(path.file_name().unwrap().len(), 64);
    }
}
