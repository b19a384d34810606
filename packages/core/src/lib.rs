//! treeconf core: typed directory trees of configuration files
//!
//! A configuration is a directory tree. Each file in it is read and written by
//! a handler that understands its format; a tree type declares which files
//! exist, where, and how they are handled:
//! - `Value` / `Config`: the data a node or tree reads and writes
//! - `Handler`: reads and writes the data at one path
//! - `Registry`: resolves handlers by key or by file extension
//! - `Filter`: guards a handler with read and write tests
//! - `TreeType` / `Tree`: ordered field declarations, and their instances
//!
//! # Example
//!
//! ```rust
//! use treeconf_core::{Config, Overrides, TreeType};
//!
//! fn load(tree_type: &TreeType, dir: &std::path::Path) -> treeconf_core::Result<Config> {
//!     tree_type.instantiate(Overrides::new())?.read(dir)
//! }
//! ```

mod declaration;
mod error;
pub mod filter;
mod handler;
mod path;
pub mod registry;
mod render;
mod schema;
mod tree;
mod value;

pub use declaration::{FieldDecl, HandlerDecl, TreeDecl};
pub use error::{Error, Result};
pub use filter::{filter_missing, Filter, ReadTest, WriteTest};
pub use handler::{ensure_source, prepare_destination, Handler, HandlerFactory, HandlerRef};
pub use path::{NodePath, PathError};
pub use registry::Registry;
pub use render::render_dir;
pub use schema::{
    FieldSpec, HandlerSpec, Override, Overrides, Requirements, TreeType, TreeTypeBuilder,
};
pub use tree::{Node, NodeKind, Tree};
pub use value::{Config, Value, MISSING};
