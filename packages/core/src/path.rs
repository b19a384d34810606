//! Validated node paths.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

/// Errors related to node path validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// The path string is empty.
    #[error("invalid path: path is empty")]
    Empty,
    /// The path climbs out of its base directory.
    #[error("invalid path '{path}': must not contain '..'")]
    ParentComponent { path: String },
    /// The path is absolute but the node did not opt in to absolute paths.
    #[error("invalid path '{path}': absolute paths must be explicitly allowed")]
    Absolute { path: String },
}

/// The location of a node, relative to the base directory of its tree.
///
/// Node paths never contain `..`. They are relative unless the node was
/// declared with `absolute: true`, in which case the base directory is
/// ignored when the node is resolved.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct NodePath {
    path: PathBuf,
}

impl NodePath {
    /// Parse a relative node path.
    ///
    /// ```rust
    /// use treeconf_core::NodePath;
    ///
    /// let path = NodePath::parse("params/run.json").unwrap();
    /// assert!(!path.is_absolute());
    ///
    /// assert!(NodePath::parse("../escape.json").is_err());
    /// assert!(NodePath::parse("/etc/passwd").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, PathError> {
        Self::parse_with(s, false)
    }

    /// Parse a node path, accepting absolute paths when `allow_absolute` is set.
    pub fn parse_with(s: &str, allow_absolute: bool) -> Result<Self, PathError> {
        if s.trim().is_empty() {
            return Err(PathError::Empty);
        }

        let path = PathBuf::from(s);
        let mut normal = 0usize;
        for component in path.components() {
            match component {
                Component::ParentDir => {
                    return Err(PathError::ParentComponent {
                        path: s.to_string(),
                    });
                }
                Component::Prefix(_) | Component::RootDir => {
                    if !allow_absolute {
                        return Err(PathError::Absolute {
                            path: s.to_string(),
                        });
                    }
                }
                Component::Normal(_) => normal += 1,
                Component::CurDir => {}
            }
        }

        if normal == 0 && !path.is_absolute() {
            return Err(PathError::Empty);
        }

        Ok(NodePath { path })
    }

    pub fn is_absolute(&self) -> bool {
        self.path.is_absolute()
    }

    pub fn as_path(&self) -> &Path {
        &self.path
    }

    /// The lower-cased extension of the final component, with a leading dot.
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext.to_lowercase()))
    }

    /// The concrete location of this node beneath `base`.
    ///
    /// Absolute node paths are returned unchanged.
    pub fn resolve(&self, base: &Path) -> PathBuf {
        if self.is_absolute() {
            self.path.clone()
        } else {
            base.join(&self.path)
        }
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

impl AsRef<Path> for NodePath {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}
