//! Error types for treeconf.

use std::path::PathBuf;

use thiserror::Error;

use crate::path::PathError;

/// Errors raised while building, instantiating, reading or writing a tree.
#[derive(Debug, Error)]
pub enum Error {
    /// A handler's read target does not exist.
    #[error("path not found: {}", path.display())]
    PathNotFound { path: PathBuf },

    /// A write target exists and overwriting was not permitted.
    #[error("destination exists and overwrite is not permitted: {}", path.display())]
    DestinationExists { path: PathBuf },

    /// A handler could not be determined from a registry key or extension.
    #[error("handler resolution failed: {message}")]
    HandlerResolution { message: String },

    /// A tree instance could not be constructed from its type and overrides.
    #[error("cannot construct field '{field}': {message}")]
    Construction { field: String, message: String },

    /// The data passed to `write` has no entry for a declared field.
    #[error("no data supplied for field '{field}'")]
    MissingField { field: String },

    /// Data has the wrong shape for the handler it was given to.
    #[error("invalid data: {message}")]
    InvalidData { message: String },

    /// A base directory exists but is not a directory.
    #[error("not a directory: {}", path.display())]
    NotADirectory { path: PathBuf },

    /// A schema declaration is malformed.
    #[error("invalid schema: {message}")]
    Schema { message: String },

    /// Node path validation error.
    #[error(transparent)]
    Path(#[from] PathError),

    /// A handler failed to decode file contents.
    #[error("decode error ({}): {message}", path.display())]
    Decode { path: PathBuf, message: String },

    /// A handler failed to encode a value.
    #[error("encode error ({}): {message}", path.display())]
    Encode { path: PathBuf, message: String },

    /// An I/O error from the underlying filesystem.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A failure while reading or writing a single field of a tree.
    #[error("field '{field}' ({}): {source}", path.display())]
    Field {
        field: String,
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub fn handler_resolution(message: impl Into<String>) -> Self {
        Error::HandlerResolution {
            message: message.into(),
        }
    }

    pub fn construction(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Construction {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Error::InvalidData {
            message: message.into(),
        }
    }

    pub(crate) fn in_field(self, field: &str, path: impl Into<PathBuf>) -> Self {
        Error::Field {
            field: field.to_string(),
            path: path.into(),
            source: Box::new(self),
        }
    }

    /// The underlying cause, with any field context stripped.
    pub fn root(&self) -> &Error {
        let mut current = self;
        while let Error::Field { source, .. } = current {
            current = &**source;
        }
        current
    }

    /// Names of the fields implicated, outermost first.
    pub fn field_chain(&self) -> Vec<&str> {
        let mut chain = Vec::new();
        let mut current = self;
        while let Error::Field { field, source, .. } = current {
            chain.push(field.as_str());
            current = &**source;
        }
        chain
    }
}

pub type Result<T> = std::result::Result<T, Error>;
