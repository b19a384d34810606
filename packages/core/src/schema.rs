//! Tree types: ordered field declarations, and their instantiation.
//!
//! A [`TreeType`] is built once, at setup time, from an ordered list of
//! [`FieldSpec`]s. Each spec may fix a node's path, its handler, both or
//! neither. Whatever is left open must be filled in when a [`Tree`] is
//! instantiated from the type, through [`Overrides`].
//!
//! # Example
//!
//! ```rust
//! use treeconf_core::{FieldSpec, Overrides, Registry, TreeType};
//!
//! let tree_type = TreeType::builder("RunConfig")
//!     .field("params", FieldSpec::new().path("params.json").handler("json"))
//!     .field("notes", FieldSpec::new())
//!     .build()
//!     .unwrap();
//!
//! let requirements = tree_type.requirements();
//! assert!(requirements[0].1.is_fixed());
//! assert!(requirements[1].1.path);
//!
//! // Without a registered "json" handler, construction fails.
//! let result = tree_type.instantiate_with(
//!     &Registry::new(),
//!     Overrides::new().set("notes", "notes.txt"),
//! );
//! assert!(result.is_err());
//! ```

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::handler::{Handler, HandlerFactory, HandlerRef};
use crate::path::NodePath;
use crate::registry::{self, Registry};
use crate::tree::{Node, NodeKind, Tree};
use crate::{Error, Result};

/// How a node's handler is given.
#[derive(Clone)]
pub enum HandlerSpec {
    /// A shared handler instance.
    Instance(HandlerRef),
    /// A factory called once at construction.
    Factory(HandlerFactory),
    /// A key looked up in the registry at construction.
    Key(String),
    /// A nested tree type, instantiated without overrides at construction.
    Tree(Arc<TreeType>),
    /// An already constructed nested tree, compared by identity.
    Subtree(Arc<Tree>),
}

impl HandlerSpec {
    pub fn instance<H: Handler + 'static>(handler: H) -> Self {
        HandlerSpec::Instance(Arc::new(handler))
    }

    pub fn factory<F>(factory: F) -> Self
    where
        F: Fn() -> HandlerRef + Send + Sync + 'static,
    {
        HandlerSpec::Factory(Arc::new(factory))
    }

    pub fn key(key: impl Into<String>) -> Self {
        HandlerSpec::Key(key.into())
    }

    pub fn tree(tree_type: TreeType) -> Self {
        HandlerSpec::Tree(Arc::new(tree_type))
    }

    /// Whether two specs denote the same handler.
    ///
    /// Keys compare by value; everything else by identity.
    pub fn same_as(&self, other: &HandlerSpec) -> bool {
        match (self, other) {
            (HandlerSpec::Key(a), HandlerSpec::Key(b)) => a == b,
            (HandlerSpec::Instance(a), HandlerSpec::Instance(b)) => Arc::ptr_eq(a, b),
            (HandlerSpec::Factory(a), HandlerSpec::Factory(b)) => Arc::ptr_eq(a, b),
            (HandlerSpec::Tree(a), HandlerSpec::Tree(b)) => Arc::ptr_eq(a, b),
            (HandlerSpec::Subtree(a), HandlerSpec::Subtree(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    fn resolve(&self, registry: &Registry) -> Result<NodeKind> {
        match self {
            HandlerSpec::Instance(handler) => Ok(node_kind(handler.clone())),
            HandlerSpec::Factory(factory) => Ok(node_kind(factory())),
            HandlerSpec::Key(key) => {
                let factory = registry.resolve_by_key(key)?;
                Ok(node_kind(factory()))
            }
            HandlerSpec::Tree(tree_type) => Ok(NodeKind::Tree(
                tree_type.instantiate_with(registry, Overrides::new())?,
            )),
            HandlerSpec::Subtree(tree) => Ok(NodeKind::Tree(Tree::clone(tree))),
        }
    }
}

/// Handlers that are trees become nested trees; anything else, wrapped trees
/// included, stays a file handler.
fn node_kind(handler: HandlerRef) -> NodeKind {
    if let Some(tree) = handler.as_tree() {
        return NodeKind::Tree(tree.clone());
    }
    NodeKind::File(handler)
}

impl fmt::Debug for HandlerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerSpec::Instance(handler) => write!(f, "Instance({})", handler.name()),
            HandlerSpec::Factory(_) => write!(f, "Factory"),
            HandlerSpec::Key(key) => write!(f, "Key({:?})", key),
            HandlerSpec::Tree(tree_type) => write!(f, "Tree({})", tree_type.name()),
            HandlerSpec::Subtree(tree) => write!(f, "Subtree({})", tree.type_name()),
        }
    }
}

impl From<&str> for HandlerSpec {
    fn from(key: &str) -> Self {
        HandlerSpec::Key(key.to_string())
    }
}

impl From<String> for HandlerSpec {
    fn from(key: String) -> Self {
        HandlerSpec::Key(key)
    }
}

impl From<HandlerRef> for HandlerSpec {
    fn from(handler: HandlerRef) -> Self {
        HandlerSpec::Instance(handler)
    }
}

impl From<TreeType> for HandlerSpec {
    fn from(tree_type: TreeType) -> Self {
        HandlerSpec::tree(tree_type)
    }
}

impl From<Arc<TreeType>> for HandlerSpec {
    fn from(tree_type: Arc<TreeType>) -> Self {
        HandlerSpec::Tree(tree_type)
    }
}

impl From<Tree> for HandlerSpec {
    fn from(tree: Tree) -> Self {
        HandlerSpec::Subtree(Arc::new(tree))
    }
}

impl From<Arc<Tree>> for HandlerSpec {
    fn from(tree: Arc<Tree>) -> Self {
        HandlerSpec::Subtree(tree)
    }
}

/// The declaration of one field of a tree type.
#[derive(Clone, Debug, Default)]
pub struct FieldSpec {
    path: Option<String>,
    handler: Option<HandlerSpec>,
    absolute: bool,
}

impl FieldSpec {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn handler(mut self, handler: impl Into<HandlerSpec>) -> Self {
        self.handler = Some(handler.into());
        self
    }

    /// Accept an absolute path for this field.
    #[must_use]
    pub fn absolute(mut self, absolute: bool) -> Self {
        self.absolute = absolute;
        self
    }
}

/// What a field still needs at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Requirements {
    /// No path is fixed; an override must supply one.
    pub path: bool,
    /// No handler is fixed; an override may supply one, otherwise it is
    /// inferred from the path's extension.
    pub handler: bool,
}

impl Requirements {
    pub fn is_fixed(&self) -> bool {
        !self.path && !self.handler
    }
}

#[derive(Clone, Debug)]
struct FieldDef {
    name: String,
    path: Option<NodePath>,
    handler: Option<HandlerSpec>,
    absolute: bool,
}

impl FieldDef {
    fn requirements(&self) -> Requirements {
        Requirements {
            path: self.path.is_none(),
            handler: self.handler.is_none(),
        }
    }
}

/// An ordered set of field declarations from which trees are instantiated.
#[derive(Clone, Debug)]
pub struct TreeType {
    name: String,
    fields: Vec<FieldDef>,
}

impl TreeType {
    pub fn builder(name: impl Into<String>) -> TreeTypeBuilder {
        TreeTypeBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Build a tree type from `(name, spec)` pairs, in declaration order.
    pub fn new<I, S>(name: impl Into<String>, fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, FieldSpec)>,
        S: Into<String>,
    {
        let mut builder = Self::builder(name);
        for (field, spec) in fields {
            builder = builder.field(field, spec);
        }
        builder.build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.name.as_str())
    }

    /// What each field needs at construction, in declaration order.
    pub fn requirements(&self) -> Vec<(&str, Requirements)> {
        self.fields
            .iter()
            .map(|field| (field.name.as_str(), field.requirements()))
            .collect()
    }

    /// Construct a tree, resolving handlers against the process-wide registry.
    pub fn instantiate(&self, overrides: Overrides) -> Result<Tree> {
        let registry = registry::global().clone();
        self.instantiate_with(&registry, overrides)
    }

    /// Construct a tree, resolving handlers against `registry`.
    ///
    /// Every field ends up with a concrete path and handler; the result never
    /// consults a registry again. Overrides that contradict a fixed path or
    /// handler, and overrides for undeclared fields, are errors.
    pub fn instantiate_with(&self, registry: &Registry, mut overrides: Overrides) -> Result<Tree> {
        let mut nodes = Vec::with_capacity(self.fields.len());

        for field in &self.fields {
            let supplied = overrides.take(&field.name);
            nodes.push(Self::resolve_field(field, supplied, registry)?);
        }

        if let Some((name, _)) = overrides.entries.first() {
            return Err(Error::construction(
                name.clone(),
                format!("'{}' declares no such field", self.name),
            ));
        }

        Ok(Tree::from_nodes(self.name.clone(), nodes))
    }

    fn resolve_field(field: &FieldDef, supplied: Option<Override>, registry: &Registry) -> Result<Node> {
        let supplied = supplied.unwrap_or_default();

        let path = match (&field.path, supplied.path) {
            (Some(fixed), Some(given)) => {
                let given = NodePath::parse_with(&given, field.absolute || supplied.absolute)?;
                if &given != fixed {
                    return Err(Error::construction(
                        &field.name,
                        format!("path '{}' contradicts fixed path '{}'", given, fixed),
                    ));
                }
                fixed.clone()
            }
            (Some(fixed), None) => fixed.clone(),
            (None, Some(given)) => {
                NodePath::parse_with(&given, field.absolute || supplied.absolute)?
            }
            (None, None) => {
                return Err(Error::construction(&field.name, "no path supplied"));
            }
        };

        let handler = match (&field.handler, supplied.handler) {
            (Some(fixed), Some(given)) => {
                if !fixed.same_as(&given) {
                    return Err(Error::construction(
                        &field.name,
                        format!("handler {:?} contradicts fixed handler {:?}", given, fixed),
                    ));
                }
                fixed.clone()
            }
            (Some(fixed), None) => fixed.clone(),
            (None, Some(given)) => given,
            (None, None) => {
                let factory = registry
                    .resolve_by_extension(path.as_path())
                    .map_err(|err| in_resolution(&field.name, err))?;
                HandlerSpec::Factory(factory)
            }
        };

        let kind = handler
            .resolve(registry)
            .map_err(|err| in_resolution(&field.name, err))?;

        log::debug!("Resolved field '{}' at '{}'", field.name, path);
        Ok(Node::new(field.name.clone(), path, kind))
    }
}

fn in_resolution(field: &str, err: Error) -> Error {
    match err {
        Error::HandlerResolution { message } => {
            Error::handler_resolution(format!("field '{}': {}", field, message))
        }
        other => other,
    }
}

/// Builds a [`TreeType`] one field at a time.
pub struct TreeTypeBuilder {
    name: String,
    fields: Vec<(String, FieldSpec)>,
}

impl TreeTypeBuilder {
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.fields.push((name.into(), spec));
        self
    }

    /// Validate the declarations.
    ///
    /// Field names must be unique and non-empty; fixed paths must be valid.
    pub fn build(self) -> Result<TreeType> {
        let mut fields: Vec<FieldDef> = Vec::with_capacity(self.fields.len());

        for (name, spec) in self.fields {
            if name.is_empty() {
                return Err(Error::Schema {
                    message: format!("'{}' declares a field with an empty name", self.name),
                });
            }
            if fields.iter().any(|field| field.name == name) {
                return Err(Error::Schema {
                    message: format!("'{}' declares field '{}' more than once", self.name, name),
                });
            }

            let path = spec
                .path
                .as_deref()
                .map(|path| NodePath::parse_with(path, spec.absolute))
                .transpose()?;

            fields.push(FieldDef {
                name,
                path,
                handler: spec.handler,
                absolute: spec.absolute,
            });
        }

        Ok(TreeType {
            name: self.name,
            fields,
        })
    }
}

/// A construction-time value for one field.
#[derive(Clone, Debug, Default)]
pub struct Override {
    path: Option<String>,
    handler: Option<HandlerSpec>,
    absolute: bool,
}

impl Override {
    /// Supply a path; the handler is inferred from its extension unless fixed.
    pub fn path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn handler(handler: impl Into<HandlerSpec>) -> Self {
        Self {
            handler: Some(handler.into()),
            ..Self::default()
        }
    }

    pub fn node(path: impl Into<String>, handler: impl Into<HandlerSpec>) -> Self {
        Self {
            path: Some(path.into()),
            handler: Some(handler.into()),
            absolute: false,
        }
    }

    #[must_use]
    pub fn absolute(mut self, absolute: bool) -> Self {
        self.absolute = absolute;
        self
    }

    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    pub fn path_str(&self) -> Option<&str> {
        self.path.as_deref()
    }
}

impl From<&str> for Override {
    fn from(path: &str) -> Self {
        Override::path(path)
    }
}

impl From<String> for Override {
    fn from(path: String) -> Self {
        Override::path(path)
    }
}

/// Absolute paths still need the field, or [`Override::absolute`], to opt in.
impl From<&Path> for Override {
    fn from(path: &Path) -> Self {
        Override::path(path.to_string_lossy().into_owned())
    }
}

/// Named construction-time values.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    entries: Vec<(String, Override)>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the override for `field`, replacing any earlier one.
    #[must_use]
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Override>) -> Self {
        let field = field.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(name, _)| *name == field) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((field, value)),
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn take(&mut self, field: &str) -> Option<Override> {
        let index = self.entries.iter().position(|(name, _)| name == field)?;
        Some(self.entries.remove(index).1)
    }
}

impl<K: Into<String>, V: Into<Override>> FromIterator<(K, V)> for Overrides {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Overrides::new(), |overrides, (field, value)| overrides.set(field, value))
    }
}
