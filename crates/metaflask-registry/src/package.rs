//! Interpretation of a cached package-index (PyPI JSON) document.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Classifier that marks Python 3 support. Matched exactly, case-insensitively.
pub const PYTHON3_CLASSIFIER: &str = "programming language :: python :: 3";

/// The subset of the package-index JSON document the registry reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageSnapshot {
    #[serde(default)]
    info: PackageInfo,
    #[serde(default)]
    releases: Option<BTreeMap<String, Vec<ReleaseFile>>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PackageInfo {
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    classifiers: Option<Vec<String>>,
    #[serde(default)]
    downloads: Option<DownloadStats>,
}

/// A file entry of a release. Every field is optional so that one odd entry
/// does not hide the rest of the snapshot.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ReleaseFile {
    python_version: Option<String>,
    upload_time: Option<String>,
    url: String,
    packagetype: String,
    filename: String,
    size: u64,
}

/// Download counters reported by the index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadStats {
    #[serde(default)]
    pub last_month: i64,
    #[serde(default)]
    pub last_week: i64,
    #[serde(default)]
    pub last_day: i64,
}

/// One downloadable file of a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Download {
    pub py_version: Option<String>,
    pub upload_time: String,
    pub url: String,
    pub pkg_type: String,
    pub filename: String,
    pub size: u64,
}

/// A release with its files, dated by its earliest upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Release {
    pub version: String,
    pub downloads: Vec<Download>,
    pub release_date: String,
}

impl PackageSnapshot {
    /// Parse a raw JSON blob.
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    /// `info.version`.
    pub fn latest_release(&self) -> Option<&str> {
        self.info.version.as_deref()
    }

    pub fn supports_python3(&self) -> bool {
        self.info
            .classifiers
            .iter()
            .flatten()
            .any(|c| c.to_lowercase() == PYTHON3_CLASSIFIER)
    }

    /// Reported download counters; all-zero when the index reports none.
    pub fn download_stats(&self) -> DownloadStats {
        self.info.downloads.unwrap_or_default()
    }

    /// Releases that have at least one dated file, in ascending version order.
    ///
    /// Files without an upload time are left out.
    pub fn releases(&self) -> Vec<Release> {
        let mut releases: Vec<Release> = self
            .releases
            .iter()
            .flatten()
            .filter_map(|(version, files)| {
                let downloads: Vec<Download> = files.iter().filter_map(Download::from_file).collect();
                let release_date = downloads.iter().map(|d| d.upload_time.clone()).min()?;
                Some(Release {
                    version: version.clone(),
                    downloads,
                    release_date,
                })
            })
            .collect();

        releases.sort_by(|a, b| compare_versions(&a.version, &b.version));
        releases
    }
}

impl Download {
    fn from_file(file: &ReleaseFile) -> Option<Self> {
        let upload_time = file.upload_time.as_deref()?;
        let py_version = file
            .python_version
            .as_deref()
            .filter(|v| !v.is_empty() && *v != "source")
            .map(str::to_string);

        Some(Self {
            py_version,
            upload_time: format!("{}Z", upload_time.trim_end_matches('Z')),
            url: file.url.clone(),
            pkg_type: file.packagetype.clone(),
            filename: file.filename.clone(),
            size: file.size,
        })
    }
}

static VERSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^v?(\d+(?:\.\d+)*)(?:[-_.]?(dev|alpha|a|beta|b|rc|c|preview|pre|post)[-_.]?(\d*))?(.*)$",
    )
    .expect("version pattern")
});

/// Sort key for a release version.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum VersionKey {
    /// Anything that does not start with a dotted number sorts first.
    Legacy(String),
    Release {
        numbers: Vec<u64>,
        stage: u8,
        stage_num: u64,
        rest: String,
    },
}

fn version_key(version: &str) -> VersionKey {
    let Some(caps) = VERSION.captures(version.trim()) else {
        return VersionKey::Legacy(version.to_string());
    };

    let mut numbers: Vec<u64> = caps[1]
        .split('.')
        .map(|n| n.parse().unwrap_or(u64::MAX))
        .collect();
    while numbers.len() > 1 && numbers.last() == Some(&0) {
        numbers.pop();
    }

    let stage = match caps.get(2).map(|m| m.as_str().to_lowercase()).as_deref() {
        Some("dev") => 0,
        Some("a" | "alpha") => 1,
        Some("b" | "beta") => 2,
        Some("c" | "rc" | "pre" | "preview") => 3,
        None => 4,
        Some(_) => 5,
    };
    let stage_num = caps
        .get(3)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0);

    VersionKey::Release {
        numbers,
        stage,
        stage_num,
        rest: caps[4].to_string(),
    }
}

/// Order release version strings: dotted numbers compare numerically and
/// pre-releases come before the final release.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    version_key(a).cmp(&version_key(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(value: serde_json::Value) -> PackageSnapshot {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_empty_document() {
        let snap = snapshot(json!({}));
        assert_eq!(snap.latest_release(), None);
        assert!(!snap.supports_python3());
        assert_eq!(snap.download_stats(), DownloadStats::default());
        assert!(snap.releases().is_empty());
    }

    #[test]
    fn test_python3_classifier_is_exact_match() {
        let snap = snapshot(json!({"info": {"classifiers": [
            "Programming Language :: Python :: 3.6",
            "Programming Language :: Python :: 2",
        ]}}));
        assert!(!snap.supports_python3());

        let snap = snapshot(json!({"info": {"classifiers": [
            "PROGRAMMING LANGUAGE :: PYTHON :: 3",
        ]}}));
        assert!(snap.supports_python3());
    }

    #[test]
    fn test_null_fields_are_tolerated() {
        let snap = snapshot(json!({"info": {"classifiers": null, "downloads": null, "version": "1.0"}, "releases": null}));
        assert_eq!(snap.latest_release(), Some("1.0"));
        assert!(!snap.supports_python3());
        assert!(snap.releases().is_empty());
    }

    #[test]
    fn test_download_stats() {
        let snap = snapshot(json!({"info": {"downloads": {"last_month": 10, "last_week": 3, "last_day": -1}}}));
        assert_eq!(
            snap.download_stats(),
            DownloadStats { last_month: 10, last_week: 3, last_day: -1 }
        );
    }

    #[test]
    fn test_releases_are_normalized_and_sorted() {
        let file = |time: &str, pyver: &str| json!({
            "python_version": pyver,
            "upload_time": time,
            "url": "https://files.example/pkg.tar.gz",
            "packagetype": "sdist",
            "filename": "pkg.tar.gz",
            "size": 1024,
        });
        let snap = snapshot(json!({"releases": {
            "0.10": [file("2013-06-13T11:00:00", "source")],
            "0.9": [file("2012-07-01T10:00:00Z", "py2.7"), file("2012-06-30T09:00:00", "")],
            "1.0rc1": [file("2018-04-01T00:00:00", "py3")],
            "1.0": [file("2018-04-26T00:00:00", "py2.py3")],
            "0.1": [],
        }}));

        let releases = snap.releases();
        let versions: Vec<_> = releases.iter().map(|r| r.version.as_str()).collect();
        assert_eq!(versions, vec!["0.9", "0.10", "1.0rc1", "1.0"]);

        let old = &releases[0];
        assert_eq!(old.release_date, "2012-06-30T09:00:00Z");
        assert_eq!(old.downloads[0].upload_time, "2012-07-01T10:00:00Z");
        assert_eq!(old.downloads[0].py_version.as_deref(), Some("py2.7"));
        assert_eq!(old.downloads[1].py_version, None);
        assert_eq!(releases[1].downloads[0].py_version, None);
        assert_eq!(old.downloads[0].pkg_type, "sdist");
    }

    #[test]
    fn test_incomplete_release_file_keeps_snapshot() {
        let snap = PackageSnapshot::from_slice(
            br#"{"info": {"version": "2.0"}, "releases": {
                "1.0": [{"filename": "pkg-1.0.tar.gz"}],
                "2.0": [
                    {"upload_time": "2020-01-02T00:00:00", "packagetype": "sdist"},
                    {"url": "https://files.example/pkg-2.0.whl"}
                ]
            }}"#,
        )
        .unwrap();

        assert_eq!(snap.latest_release(), Some("2.0"));
        let releases = snap.releases();
        assert_eq!(releases.len(), 1);
        assert_eq!(releases[0].version, "2.0");
        assert_eq!(releases[0].release_date, "2020-01-02T00:00:00Z");
        assert_eq!(releases[0].downloads.len(), 1);
        assert_eq!(releases[0].downloads[0].url, "");
    }

    #[test]
    fn test_version_ordering() {
        assert_eq!(compare_versions("1.0", "1.0.0"), Ordering::Equal);
        assert_eq!(compare_versions("0.9", "0.10"), Ordering::Less);
        assert_eq!(compare_versions("1.0.dev1", "1.0a1"), Ordering::Less);
        assert_eq!(compare_versions("1.0b2", "1.0rc1"), Ordering::Less);
        assert_eq!(compare_versions("1.0", "1.0.post1"), Ordering::Less);
        assert_eq!(compare_versions("weird", "0.1"), Ordering::Less);
    }
}
