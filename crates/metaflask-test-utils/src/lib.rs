//! Test utilities for Metaflask crates.
//!
//! The main export is [`CheckoutFixture`], a throwaway on-disk checkout with
//! the `members/` and `projects/` layout the registry reads.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Creates a temporary directory that is cleaned up on drop.
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Creates a temporary file with given content.
pub fn temp_file(content: &[u8]) -> (TempDir, PathBuf) {
    let dir = temp_dir();
    let path = dir.path().join("test_file");
    fs::write(&path, content).expect("Failed to write temp file");
    (dir, path)
}

/// Renders a member file body from its common header fields.
pub fn member_document(name: &str, github: Option<&str>, sponsor: Option<&str>) -> String {
    let mut doc = format!("Name: {name}\n");
    if let Some(github) = github {
        doc.push_str(&format!("GitHub: {github}\n"));
    }
    if let Some(sponsor) = sponsor {
        doc.push_str(&format!("Sponsor: {sponsor}\n"));
    }
    doc.push_str("\nLongtime contributor.\n");
    doc
}

/// An on-disk metadata checkout living in a temporary directory.
pub struct CheckoutFixture {
    dir: TempDir,
}

impl CheckoutFixture {
    /// Create an empty checkout with `members/` and `projects/` directories.
    pub fn new() -> Self {
        let dir = temp_dir();
        fs::create_dir_all(dir.path().join("members")).expect("Failed to create members dir");
        fs::create_dir_all(dir.path().join("projects")).expect("Failed to create projects dir");
        Self { dir }
    }

    /// Root of the checkout.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Path of the `members/` directory.
    pub fn members_dir(&self) -> PathBuf {
        self.root().join("members")
    }

    /// Path of the `projects/` directory.
    pub fn projects_dir(&self) -> PathBuf {
        self.root().join("projects")
    }

    /// Write a raw member file named `NNNN_<id>.txt`.
    pub fn write_member_raw(&self, num: u32, id: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.members_dir().join(format!("{num:04}_{id}.txt"));
        fs::write(&path, contents).expect("Failed to write member file");
        path
    }

    /// Write a member file with the usual header fields.
    pub fn add_member(
        &self,
        num: u32,
        id: &str,
        github: Option<&str>,
        sponsor: Option<&str>,
    ) -> PathBuf {
        let name = format!("Member {id}");
        self.write_member_raw(num, id, member_document(&name, github, sponsor))
    }

    /// Write an arbitrary file in the members directory.
    pub fn write_members_file(&self, filename: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.members_dir().join(filename);
        fs::write(&path, contents).expect("Failed to write file");
        path
    }

    /// Create a project directory.
    pub fn add_project(&self, name: &str) -> PathBuf {
        let path = self.projects_dir().join(name);
        fs::create_dir_all(&path).expect("Failed to create project dir");
        path
    }

    /// Write a file inside a project directory, creating parents as needed.
    pub fn write_project_file(
        &self,
        project: &str,
        relative: &str,
        contents: impl AsRef<[u8]>,
    ) -> PathBuf {
        let path = self.projects_dir().join(project).join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        fs::write(&path, contents).expect("Failed to write project file");
        path
    }

    /// Create a relative symlink at `project/relative` pointing at `target`.
    #[cfg(unix)]
    pub fn link_project_file(&self, project: &str, relative: &str, target: &Path) -> PathBuf {
        let link = self.projects_dir().join(project).join(relative);
        let parent = link.parent().expect("link has a parent").to_path_buf();
        fs::create_dir_all(&parent).expect("Failed to create parent dir");
        let relative_target = relative_path(target, &parent);
        std::os::unix::fs::symlink(relative_target, &link).expect("Failed to create symlink");
        link
    }

    /// Copy `source` byte-for-byte into `project/relative`.
    pub fn copy_into_project(&self, project: &str, relative: &str, source: &Path) -> PathBuf {
        let contents = fs::read(source).expect("Failed to read source file");
        self.write_project_file(project, relative, contents)
    }
}

impl Default for CheckoutFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Compute `path` relative to `base`. Both must be absolute.
fn relative_path(path: &Path, base: &Path) -> PathBuf {
    let path: Vec<_> = path.components().collect();
    let base: Vec<_> = base.components().collect();
    let common = path
        .iter()
        .zip(base.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut result = PathBuf::new();
    for _ in common..base.len() {
        result.push("..");
    }
    for component in &path[common..] {
        result.push(component);
    }
    result
}

/// Assert that a Result is Ok and return the value.
#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match $expr {
            Ok(v) => v,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
}

/// Assert that a Result is Err.
#[macro_export]
macro_rules! assert_err {
    ($expr:expr) => {
        match $expr {
            Ok(v) => panic!("Expected Err, got Ok: {:?}", v),
            Err(_) => {}
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_fixture_layout() {
        let fixture = CheckoutFixture::new();
        assert!(fixture.members_dir().is_dir());
        assert!(fixture.projects_dir().is_dir());
    }

    #[test]
    fn test_member_filename_is_zero_padded() {
        let fixture = CheckoutFixture::new();
        let path = fixture.add_member(7, "alice", Some("alice"), None);
        assert_eq!(path.file_name().unwrap(), "0007_alice.txt");
        let contents = fs::read_to_string(path).unwrap();
        assert!(contents.starts_with("Name: Member alice\nGitHub: alice\n\n"));
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(
            relative_path(Path::new("/a/members/x.txt"), Path::new("/a/projects/p")),
            PathBuf::from("../../members/x.txt")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_project_symlink_resolves() {
        let fixture = CheckoutFixture::new();
        let member = fixture.add_member(1, "alice", Some("alice"), None);
        fixture.add_project("flask");
        let link = fixture.link_project_file("flask", "PROJECT_LEAD", &member);
        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read(&link).unwrap(), fs::read(&member).unwrap());
    }

    proptest! {
        #[test]
        fn test_temp_file_content_roundtrip(content in proptest::collection::vec(any::<u8>(), 0..256)) {
            let (_dir, path) = temp_file(&content);
            let read_content = fs::read(&path).unwrap();
            prop_assert_eq!(content, read_content);
        }
    }
}
