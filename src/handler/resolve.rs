//! Root-relative path resolution with traversal protection.
//!
//! Resolution is the one place a directory escape could hide, so it lives
//! in a single explicit pure function over the request path rather than a
//! chain of library calls. It never touches the filesystem.

use percent_encoding::percent_decode_str;
use std::fmt;
use std::path::{Path, PathBuf};

/// Reasons a request path cannot be mapped to a filesystem path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveError {
    /// Percent-encoded bytes in the path did not decode to valid UTF-8
    BadEncoding,
    /// The path attempts to climb above the served root
    Traversal,
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadEncoding => write!(f, "malformed percent-encoding in request path"),
            Self::Traversal => write!(f, "request path escapes the served root"),
        }
    }
}

impl std::error::Error for ResolveError {}

/// Resolve `request_path` against `root`.
///
/// The path is percent-decoded, then normalized segment by segment: empty
/// and `.` segments are dropped, and `..` pops the previous segment. A `..`
/// with nothing left to pop would climb above the root and is rejected, so
/// the returned path is always inside `root`. Whether it exists is the
/// caller's concern.
pub fn resolve(root: &Path, request_path: &str) -> Result<PathBuf, ResolveError> {
    let decoded = percent_decode_str(request_path)
        .decode_utf8()
        .map_err(|_| ResolveError::BadEncoding)?;

    // Decoding happens before splitting, so an encoded slash (%2f) acts as
    // a segment separator and cannot smuggle separators into a segment.
    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(ResolveError::Traversal);
                }
            }
            name => segments.push(name),
        }
    }

    let mut path = root.to_path_buf();
    for segment in &segments {
        path.push(segment);
    }
    Ok(path)
}
