//! Header-block documents.
//!
//! A document is a run of `key: value` lines, optionally folded onto
//! continuation lines that start with whitespace, terminated by a blank line
//! and followed by a free-text body. An indented line that still reads as
//! `key: value` starts a new header; only lines without a key fold. The
//! checksum covers every byte of the document in stream order, so two files
//! share a checksum only when their contents are byte-identical.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

use crate::error::{RegistryError, RegistryResult};

static HEADER_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*?)\s*:\s*(.*)$").expect("header line pattern"));

/// Hex-encoded SHA-256 of `bytes`.
///
/// Equal to [`HeaderBlock::checksum`] of a document parsed from the same bytes.
pub fn content_checksum(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// A parsed header block plus its raw body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderBlock {
    source: PathBuf,
    entries: Vec<(String, String)>,
    body: Vec<u8>,
    checksum: String,
}

impl HeaderBlock {
    /// A block with no headers and no body, as if read from an empty file.
    pub fn empty(source: impl AsRef<Path>) -> Self {
        Self {
            source: source.as_ref().to_path_buf(),
            entries: Vec::new(),
            body: Vec::new(),
            checksum: content_checksum(&[]),
        }
    }

    /// Open and parse the file at `path`.
    pub fn read_file(path: impl AsRef<Path>) -> RegistryResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| RegistryError::io(path, e))?;
        Self::parse(BufReader::new(file), path)
    }

    /// Parse a document from `reader`. `source` is only used for error reporting.
    pub fn parse<R: BufRead>(mut reader: R, source: impl AsRef<Path>) -> RegistryResult<Self> {
        let source = source.as_ref();
        let mut hasher = Sha256::new();
        let mut entries: Vec<(String, String)> = Vec::new();
        let mut raw = Vec::new();
        let mut line_no = 0;

        loop {
            raw.clear();
            reader
                .read_until(b'\n', &mut raw)
                .map_err(|e| RegistryError::io(source, e))?;
            hasher.update(&raw);
            line_no += 1;

            // End of stream and the first blank line both close the header section.
            if raw.iter().all(u8::is_ascii_whitespace) {
                break;
            }

            let line = decode_text(trim_newline(&raw), source)?;

            let header = HEADER_LINE
                .captures(line)
                .map(|caps| (caps[1].trim_start().to_string(), caps[2].to_string()));

            match (header, strip_fold(line)) {
                (Some((key, value)), _) if !key.is_empty() => entries.push((key, value)),
                (_, Some(rest)) => {
                    let (_, value) = entries.last_mut().ok_or_else(|| {
                        RegistryError::format(source, line_no, "continuation line before any header")
                    })?;
                    value.push(' ');
                    value.push_str(rest);
                }
                (Some(_), None) => {
                    return Err(RegistryError::format(source, line_no, "empty header name"));
                }
                (None, None) => {
                    return Err(RegistryError::format(
                        source,
                        line_no,
                        format!("expected `key: value`, found {line:?}"),
                    ));
                }
            }
        }

        let mut body = Vec::new();
        reader
            .read_to_end(&mut body)
            .map_err(|e| RegistryError::io(source, e))?;
        hasher.update(&body);

        Ok(Self {
            source: source.to_path_buf(),
            entries,
            body,
            checksum: format!("{:x}", hasher.finalize()),
        })
    }

    /// Look up a header value. Names compare case-insensitively; the last
    /// occurrence wins.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// All values recorded for `key`, in document order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Headers in document order, duplicates included.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of header lines (after unfolding).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the block carries no headers.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw body bytes following the blank separator line.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body decoded as UTF-8.
    pub fn body_text(&self) -> RegistryResult<&str> {
        decode_text(&self.body, &self.source)
    }

    /// Hex SHA-256 over the whole document.
    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    /// File the block was read from.
    pub fn source(&self) -> &Path {
        &self.source
    }
}

/// Decode UTF-8 text, rejecting NUL bytes.
pub(crate) fn decode_text<'a>(bytes: &'a [u8], source: &Path) -> RegistryResult<&'a str> {
    if bytes.contains(&0) {
        return Err(RegistryError::encoding(source, "embedded NUL byte"));
    }
    std::str::from_utf8(bytes).map_err(|e| RegistryError::encoding(source, e.to_string()))
}

fn trim_newline(mut line: &[u8]) -> &[u8] {
    while let Some((last, rest)) = line.split_last() {
        if *last == b'\n' || *last == b'\r' {
            line = rest;
        } else {
            break;
        }
    }
    line
}

/// Continuation lines drop exactly one leading whitespace character.
fn strip_fold(line: &str) -> Option<&str> {
    let mut chars = line.chars();
    match chars.next() {
        Some(c) if c.is_whitespace() => Some(chars.as_str()),
        _ => None,
    }
}
