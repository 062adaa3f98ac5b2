//! Domain newtypes with validation
//!
//! This module provides strongly-typed wrappers for the names and paths that
//! cross the remote protocol. Each newtype ensures validity at construction.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

// ============================================================================
// RemoteName
// ============================================================================

/// Characters that cannot appear in a remote folder name.
const FORBIDDEN_REMOTE_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Logical name under which a local folder is stored server-side
///
/// Construction trims surrounding whitespace and replaces every forbidden
/// character with `_`, so a name never contains a path separator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RemoteName(String);

impl RemoteName {
    /// Create a new RemoteName from user input
    ///
    /// # Errors
    /// Returns `DomainError::InvalidRemoteName` if nothing is left after trimming
    pub fn new(name: impl AsRef<str>) -> Result<Self, DomainError> {
        let trimmed = name.as_ref().trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidRemoteName(
                "name must not be empty".to_string(),
            ));
        }

        let sanitized: String = trimmed
            .chars()
            .map(|c| {
                if FORBIDDEN_REMOTE_CHARS.contains(&c) {
                    '_'
                } else {
                    c
                }
            })
            .collect();

        if sanitized == "." || sanitized == ".." {
            return Err(DomainError::InvalidRemoteName(sanitized));
        }

        Ok(Self(sanitized))
    }

    /// Get the string value
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RemoteName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RemoteName {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for RemoteName {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RemoteName> for String {
    fn from(name: RemoteName) -> Self {
        name.0
    }
}

// ============================================================================
// RelativePath
// ============================================================================

/// Posix-style path of a file relative to the root of a backed-up folder
///
/// Segments are joined with `/`. The path is never empty, never absolute and
/// never contains `.`/`..` or empty segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RelativePath(String);

impl RelativePath {
    /// Create a RelativePath from a `/`-joined string
    ///
    /// # Errors
    /// Returns `DomainError::InvalidPath` for empty, absolute or traversing paths
    pub fn new(path: impl Into<String>) -> Result<Self, DomainError> {
        let path = path.into();
        if path.is_empty() || path.starts_with('/') {
            return Err(DomainError::InvalidPath(path));
        }
        for segment in path.split('/') {
            Self::validate_segment(segment).map_err(|_| DomainError::InvalidPath(path.clone()))?;
        }
        Ok(Self(path))
    }

    /// Create a single-segment path for an entry at the folder root
    ///
    /// # Errors
    /// Returns `DomainError::InvalidPath` if `name` is not a valid segment
    pub fn from_name(name: &str) -> Result<Self, DomainError> {
        Self::validate_segment(name)?;
        Ok(Self(name.to_string()))
    }

    /// Append one segment, returning the child path
    ///
    /// # Errors
    /// Returns `DomainError::InvalidPath` if `name` is not a valid segment
    pub fn join(&self, name: &str) -> Result<Self, DomainError> {
        Self::validate_segment(name)?;
        Ok(Self(format!("{}/{}", self.0, name)))
    }

    /// Build a child path from an optional parent
    ///
    /// # Errors
    /// Returns `DomainError::InvalidPath` if `name` is not a valid segment
    pub fn child_of(parent: Option<&RelativePath>, name: &str) -> Result<Self, DomainError> {
        match parent {
            Some(parent) => parent.join(name),
            None => Self::from_name(name),
        }
    }

    /// Get the string value
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterate over the path segments
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// Last segment of the path (the file name)
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    fn validate_segment(segment: &str) -> Result<(), DomainError> {
        if segment.is_empty() || segment == "." || segment == ".." || segment.contains('/') {
            return Err(DomainError::InvalidPath(format!(
                "Invalid path component: {segment:?}"
            )));
        }
        Ok(())
    }
}

impl Display for RelativePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for RelativePath {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RelativePath> for String {
    fn from(path: RelativePath) -> Self {
        path.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod remote_name_tests {
        use super::*;

        #[test]
        fn test_trims_whitespace() {
            let name = RemoteName::new("  Photos  ").unwrap();
            assert_eq!(name.as_str(), "Photos");
        }

        #[test]
        fn test_replaces_forbidden_characters() {
            let name = RemoteName::new(r#"a/b\c:d*e?f"g<h>i|j"#).unwrap();
            assert_eq!(name.as_str(), "a_b_c_d_e_f_g_h_i_j");
        }

        #[test]
        fn test_rejects_empty() {
            assert!(RemoteName::new("").is_err());
            assert!(RemoteName::new("   ").is_err());
        }

        #[test]
        fn test_rejects_dot_names() {
            assert!(RemoteName::new("..").is_err());
            assert!(RemoteName::new(".").is_err());
        }

        #[test]
        fn test_serde_sanitizes_on_deserialize() {
            let name: RemoteName = serde_json::from_str(r#"" docs/2024 ""#).unwrap();
            assert_eq!(name.as_str(), "docs_2024");
            assert_eq!(serde_json::to_string(&name).unwrap(), r#""docs_2024""#);
        }
    }

    mod relative_path_tests {
        use super::*;

        #[test]
        fn test_join_builds_posix_path() {
            let root = RelativePath::from_name("a").unwrap();
            let child = root.join("b").unwrap().join("c.txt").unwrap();
            assert_eq!(child.as_str(), "a/b/c.txt");
            assert_eq!(child.file_name(), "c.txt");
            assert_eq!(child.segments().collect::<Vec<_>>(), vec!["a", "b", "c.txt"]);
        }

        #[test]
        fn test_child_of_root() {
            let path = RelativePath::child_of(None, "top.txt").unwrap();
            assert_eq!(path.as_str(), "top.txt");
        }

        #[test]
        fn test_rejects_traversal_and_absolute() {
            assert!(RelativePath::new("/etc/passwd").is_err());
            assert!(RelativePath::new("a/../b").is_err());
            assert!(RelativePath::new("a//b").is_err());
            assert!(RelativePath::new("").is_err());
            assert!(RelativePath::from_name("a/b").is_err());
        }

        #[test]
        fn test_new_accepts_nested() {
            let path = RelativePath::new("dir/sub dir/file name.bin").unwrap();
            assert_eq!(path.file_name(), "file name.bin");
        }
    }
}
