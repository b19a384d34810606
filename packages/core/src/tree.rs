//! Tree instances: resolved nodes and the recursive read/write traversal.

use std::fmt;
use std::fs;
use std::path::Path;

use crate::handler::{Handler, HandlerRef};
use crate::path::NodePath;
use crate::{Config, Error, Result, Value};

/// What sits at a node's path: a single file, or a nested tree.
#[derive(Clone)]
pub enum NodeKind {
    File(HandlerRef),
    Tree(Tree),
}

/// A named, resolved location within a tree.
#[derive(Clone)]
pub struct Node {
    name: String,
    path: NodePath,
    kind: NodeKind,
}

impl Node {
    pub(crate) fn new(name: String, path: NodePath, kind: NodeKind) -> Self {
        Self { name, path, kind }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &NodePath {
        &self.path
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// The handler of a file node.
    pub fn handler(&self) -> Option<&HandlerRef> {
        match &self.kind {
            NodeKind::File(handler) => Some(handler),
            NodeKind::Tree(_) => None,
        }
    }

    /// The nested tree of a directory node.
    pub fn subtree(&self) -> Option<&Tree> {
        match &self.kind {
            NodeKind::File(_) => None,
            NodeKind::Tree(tree) => Some(tree),
        }
    }

    pub fn handler_name(&self) -> String {
        match &self.kind {
            NodeKind::File(handler) => handler.name(),
            NodeKind::Tree(tree) => tree.type_name().to_string(),
        }
    }

    fn read(&self, base: &Path) -> Result<Value> {
        let full_path = self.path.resolve(base);
        log::debug!("Reading field '{}' from {}", self.name, full_path.display());

        let value = match &self.kind {
            NodeKind::File(handler) => handler.read(&full_path),
            NodeKind::Tree(tree) => tree.read(&full_path).map(Value::Config),
        };
        value.map_err(|err| err.in_field(&self.name, full_path))
    }

    fn write(&self, base: &Path, data: &Value, overwrite_ok: bool) -> Result<()> {
        let full_path = self.path.resolve(base);
        log::debug!("Writing field '{}' to {}", self.name, full_path.display());

        let result = match &self.kind {
            NodeKind::File(handler) => handler.write(&full_path, data, overwrite_ok),
            NodeKind::Tree(tree) => tree.write_value(&full_path, data, overwrite_ok),
        };
        result.map_err(|err| err.in_field(&self.name, full_path))
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("path", &self.path.to_string())
            .field("handler", &self.handler_name())
            .finish()
    }
}

/// A constructed tree: one resolved node per declared field.
///
/// Reads and writes visit nodes depth-first in declaration order. A tree may
/// be read from and written to any number of base directories.
#[derive(Clone, Debug)]
pub struct Tree {
    type_name: String,
    nodes: Vec<Node>,
}

impl Tree {
    pub(crate) fn from_nodes(type_name: String, nodes: Vec<Node>) -> Self {
        Self { type_name, nodes }
    }

    /// The name of the tree type this tree was instantiated from.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.name == name)
    }

    /// Nodes in declaration order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Every node, depth-first, with its depth (top-level nodes are depth 1).
    pub fn walk(&self) -> Vec<(usize, &Node)> {
        let mut out = Vec::new();
        self.walk_into(1, &mut out);
        out
    }

    fn walk_into<'a>(&'a self, depth: usize, out: &mut Vec<(usize, &'a Node)>) {
        for node in &self.nodes {
            out.push((depth, node));
            if let NodeKind::Tree(tree) = &node.kind {
                tree.walk_into(depth + 1, out);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Read every node beneath `base`.
    ///
    /// The result has one entry per field, in declaration order. A filtered
    /// node whose read is skipped contributes `MISSING`; it never affects its
    /// siblings. The first error aborts the traversal.
    pub fn read(&self, base: impl AsRef<Path>) -> Result<Config> {
        let base = base.as_ref();
        if !base.exists() {
            return Err(Error::PathNotFound {
                path: base.to_path_buf(),
            });
        }
        if !base.is_dir() {
            return Err(Error::NotADirectory {
                path: base.to_path_buf(),
            });
        }

        let mut config = Config::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let value = node.read(base)?;
            config.insert(node.name.clone(), value);
        }
        Ok(config)
    }

    /// Write `data` to the nodes beneath `base`, creating `base` if needed.
    ///
    /// `data` must hold an entry, possibly `MISSING`, for every field.
    /// `overwrite_ok` is passed unchanged to every handler. A failure aborts
    /// the remaining writes; files already written are left in place.
    pub fn write(&self, base: impl AsRef<Path>, data: &Config, overwrite_ok: bool) -> Result<()> {
        let base = base.as_ref();
        if !base.is_dir() {
            if base.exists() {
                return Err(Error::NotADirectory {
                    path: base.to_path_buf(),
                });
            }
            log::info!("Creating new directory at '{}'", base.display());
            fs::create_dir_all(base)?;
        }

        for node in &self.nodes {
            let value = data.get(&node.name).ok_or_else(|| Error::MissingField {
                field: node.name.clone(),
            })?;
            node.write(base, value, overwrite_ok)?;
        }

        for key in data.keys().filter(|key| self.get(key).is_none()) {
            log::debug!("Ignoring undeclared field '{}' in '{}'", key, self.type_name);
        }

        Ok(())
    }

    fn write_value(&self, base: &Path, data: &Value, overwrite_ok: bool) -> Result<()> {
        match data {
            Value::Config(config) => self.write(base, config, overwrite_ok),
            other => Err(Error::invalid_data(format!(
                "'{}' expects a config, got {}",
                self.type_name,
                other.kind()
            ))),
        }
    }
}

/// A tree is itself a handler for the directory it is rooted at.
impl Handler for Tree {
    fn read(&self, path: &Path) -> Result<Value> {
        Tree::read(self, path).map(Value::Config)
    }

    fn write(&self, path: &Path, data: &Value, overwrite_ok: bool) -> Result<()> {
        self.write_value(path, data, overwrite_ok)
    }

    fn name(&self) -> String {
        self.type_name.clone()
    }

    fn as_tree(&self) -> Option<&Tree> {
        Some(self)
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name)?;
        let rendered = self.render(None, true);
        if !rendered.is_empty() {
            write!(f, "\n{}", rendered)?;
        }
        Ok(())
    }
}
