//! treeconf: typed directory trees of configuration files
//!
//! Declare which files a configuration directory holds, then read the whole
//! directory into an ordered [`Config`] and write one back. Each file is read
//! and written by a [`Handler`]; handlers are given explicitly or inferred from
//! the file extension through the [`Registry`].
//!
//! # Example
//!
//! ```rust
//! use treeconf::{FieldSpec, Overrides, TreeType};
//!
//! treeconf::register_builtin();
//!
//! let run = TreeType::builder("Run")
//!     .field("params", FieldSpec::new().path("params.json"))
//!     .field("notes", FieldSpec::new().handler("text"))
//!     .build()
//!     .unwrap();
//!
//! let tree = run
//!     .instantiate(Overrides::new().set("notes", "NOTES.md"))
//!     .unwrap();
//! assert_eq!(tree.get("notes").unwrap().handler_name(), "TextHandler");
//! ```

pub use treeconf_core::*;
pub use treeconf_handlers::{
    from_value, json_to_value, register_builtin, register_builtin_into, to_value, value_to_json,
    JsonHandler, TextHandler,
};
