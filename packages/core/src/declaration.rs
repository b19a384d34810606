//! Tree types declared as JSON.
//!
//! ```json
//! {
//!   "params": {"path": "params.json", "handler": "json"},
//!   "notes": {"handler": "text"},
//!   "inputs": {"path": "inputs", "handler": {"tree": {
//!     "grid": {"path": "grid.json"}
//!   }}}
//! }
//! ```
//!
//! Key order in the document is the declaration order of the fields. A string
//! handler is a registry key; `{"tree": {...}}` declares a nested tree type.

use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::schema::{FieldSpec, HandlerSpec, TreeType};
use crate::{Error, Result};

/// The declared fields of a tree type, in document order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TreeDecl {
    pub fields: Vec<(String, FieldDecl)>,
}

/// The declaration of one field.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDecl {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub handler: Option<HandlerDecl>,
    #[serde(default)]
    pub absolute: bool,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum HandlerDecl {
    /// A registry key.
    Key(String),
    /// A nested tree type.
    Tree { tree: TreeDecl },
}

impl<'de> Deserialize<'de> for TreeDecl {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TreeDeclVisitor;

        impl<'de> Visitor<'de> for TreeDeclVisitor {
            type Value = TreeDecl;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map from field name to field declaration")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<TreeDecl, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut fields: Vec<(String, FieldDecl)> = Vec::new();
                while let Some((name, decl)) = map.next_entry::<String, FieldDecl>()? {
                    if fields.iter().any(|(existing, _)| *existing == name) {
                        return Err(de::Error::custom(format!("duplicate field '{}'", name)));
                    }
                    fields.push((name, decl));
                }
                Ok(TreeDecl { fields })
            }
        }

        deserializer.deserialize_map(TreeDeclVisitor)
    }
}

impl TreeType {
    /// Build a tree type from a parsed declaration.
    ///
    /// Nested tree types are named `<name>.<field>`.
    pub fn from_decl(name: &str, decl: &TreeDecl) -> Result<TreeType> {
        let mut builder = TreeType::builder(name);

        for (field, field_decl) in &decl.fields {
            let mut spec = FieldSpec::new().absolute(field_decl.absolute);
            if let Some(path) = &field_decl.path {
                spec = spec.path(path.clone());
            }
            match &field_decl.handler {
                Some(HandlerDecl::Key(key)) => spec = spec.handler(HandlerSpec::key(key.clone())),
                Some(HandlerDecl::Tree { tree }) => {
                    let nested = TreeType::from_decl(&format!("{}.{}", name, field), tree)?;
                    spec = spec.handler(Arc::new(nested));
                }
                None => {}
            }
            builder = builder.field(field.clone(), spec);
        }

        builder.build()
    }

    /// Build a tree type from a JSON document.
    pub fn from_json_str(name: &str, json: &str) -> Result<TreeType> {
        let decl: TreeDecl = serde_json::from_str(json).map_err(|err| Error::Schema {
            message: format!("'{}': {}", name, err),
        })?;
        Self::from_decl(name, &decl)
    }

    /// Build a tree type from a JSON file.
    pub fn from_json_file(name: &str, path: impl AsRef<Path>) -> Result<TreeType> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => Error::PathNotFound {
                path: path.to_path_buf(),
            },
            _ => Error::Io(err),
        })?;
        Self::from_json_str(name, &json)
    }
}
