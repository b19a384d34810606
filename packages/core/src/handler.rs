//! The handler capability: read and write one file or resource.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::tree::Tree;
use crate::{Error, Result, Value};

/// Read and write the data stored at a single path.
///
/// Handlers are the only place file formats are understood. The tree layer
/// resolves a path for every node and hands it to the node's handler.
///
/// # Object Safety
///
/// This trait is object-safe: nodes hold handlers as [`HandlerRef`].
pub trait Handler: Send + Sync {
    /// Read the data at `path`.
    ///
    /// Handlers should fail with [`Error::PathNotFound`] when `path` does not
    /// exist.
    fn read(&self, path: &Path) -> Result<Value>;

    /// Write `data` to `path`.
    ///
    /// Handlers should fail with [`Error::DestinationExists`] when `path`
    /// exists and `overwrite_ok` is false.
    fn write(&self, path: &Path, data: &Value, overwrite_ok: bool) -> Result<()>;

    /// A short human-readable name, used when rendering trees.
    fn name(&self) -> String {
        short_type_name(std::any::type_name::<Self>())
    }

    /// The tree behind this handler, when the handler is a tree itself.
    ///
    /// Nodes whose handler is a tree are resolved as nested trees.
    fn as_tree(&self) -> Option<&Tree> {
        None
    }
}

/// A shared handler instance.
pub type HandlerRef = Arc<dyn Handler>;

/// Produces handler instances. Registered in the [`Registry`](crate::Registry).
pub type HandlerFactory = Arc<dyn Fn() -> HandlerRef + Send + Sync>;

fn short_type_name(full: &str) -> String {
    if full.contains('<') {
        return full.to_string();
    }
    full.rsplit("::").next().unwrap_or(full).to_string()
}

/// Fail with [`Error::PathNotFound`] unless `path` exists.
pub fn ensure_source(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(Error::PathNotFound {
            path: path.to_path_buf(),
        })
    }
}

/// Check `path` may be written and create its parent directories.
///
/// Fails with [`Error::DestinationExists`] when `path` exists and
/// `overwrite_ok` is false.
pub fn prepare_destination(path: &Path, overwrite_ok: bool) -> Result<()> {
    if path.exists() && !overwrite_ok {
        return Err(Error::DestinationExists {
            path: path.to_path_buf(),
        });
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            log::debug!("Creating directory {}", parent.display());
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

// Blanket implementations for smart pointers

impl<T: Handler + ?Sized> Handler for Arc<T> {
    fn read(&self, path: &Path) -> Result<Value> {
        self.as_ref().read(path)
    }

    fn write(&self, path: &Path, data: &Value, overwrite_ok: bool) -> Result<()> {
        self.as_ref().write(path, data, overwrite_ok)
    }

    fn name(&self) -> String {
        self.as_ref().name()
    }

    fn as_tree(&self) -> Option<&Tree> {
        self.as_ref().as_tree()
    }
}

impl<T: Handler + ?Sized> Handler for Box<T> {
    fn read(&self, path: &Path) -> Result<Value> {
        self.as_ref().read(path)
    }

    fn write(&self, path: &Path, data: &Value, overwrite_ok: bool) -> Result<()> {
        self.as_ref().write(path, data, overwrite_ok)
    }

    fn name(&self) -> String {
        self.as_ref().name()
    }

    fn as_tree(&self) -> Option<&Tree> {
        self.as_ref().as_tree()
    }
}
