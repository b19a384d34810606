//! File handlers for treeconf
//!
//! - `JsonHandler`: JSON documents, registered as `"json"` for `.json`
//! - `TextHandler`: UTF-8 text, registered as `"text"` for `.txt` and `.md`
//!
//! Call [`register_builtin`] once at startup to make both available to
//! [`TreeType::instantiate`](treeconf_core::TreeType::instantiate).

mod convert;
mod json;
mod text;

pub use convert::{from_value, json_to_value, to_value, value_to_json};
pub use json::JsonHandler;
pub use text::TextHandler;

use treeconf_core::{registry, Registry};

/// Register the built-in handlers in `registry`.
pub fn register_builtin_into(registry: &mut Registry) {
    registry.register_default::<JsonHandler>("json", &[".json"]);
    registry.register_default::<TextHandler>("text", &[".txt", ".md"]);
}

/// Register the built-in handlers in the process-wide registry.
pub fn register_builtin() {
    register_builtin_into(&mut registry::global_mut());
}
