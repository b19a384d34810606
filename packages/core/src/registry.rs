//! Handler registry: symbolic keys and file extensions to handler factories.
//!
//! A process-wide registry backs [`register`] and the default construction
//! path of [`TreeType::instantiate`](crate::TreeType::instantiate). Registration
//! is expected to happen once during setup, before trees are built.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use lazy_static::lazy_static;

use crate::handler::{Handler, HandlerFactory, HandlerRef};
use crate::{Error, Result};

lazy_static! {
    static ref GLOBAL: RwLock<Registry> = RwLock::new(Registry::new());
}

/// Mapping from key to handler factory, and from extension to key.
///
/// Both mappings are append-only; re-registering a key or an extension
/// replaces the previous entry (last write wins).
#[derive(Clone, Default)]
pub struct Registry {
    handlers: HashMap<String, HandlerFactory>,
    extensions: HashMap<String, String>,
}

/// Normalize an extension to lower case with a single leading dot.
pub fn normalize_extension(extension: &str) -> String {
    let trimmed = extension.trim().trim_start_matches('.');
    format!(".{}", trimmed.to_lowercase())
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate `key` with `factory` and each of `extensions` with `key`.
    pub fn register<F>(&mut self, key: &str, factory: F, extensions: &[&str])
    where
        F: Fn() -> HandlerRef + Send + Sync + 'static,
    {
        self.register_factory(key, Arc::new(factory), extensions);
    }

    /// Register a handler type constructed with `Default::default()`.
    pub fn register_default<H>(&mut self, key: &str, extensions: &[&str])
    where
        H: Handler + Default + 'static,
    {
        self.register(key, || Arc::new(H::default()) as HandlerRef, extensions);
    }

    pub fn register_factory(&mut self, key: &str, factory: HandlerFactory, extensions: &[&str]) {
        if self.handlers.insert(key.to_string(), factory).is_some() {
            log::warn!("'{}' already exists in handler registry and was overwritten", key);
        }

        for extension in extensions {
            let extension = normalize_extension(extension);
            if let Some(previous) = self.extensions.insert(extension.clone(), key.to_string()) {
                if previous != key {
                    log::warn!(
                        "Extension '{}' was mapped to '{}' and is now mapped to '{}'",
                        extension,
                        previous,
                        key
                    );
                }
            }
        }
    }

    /// Look up a handler factory by key.
    pub fn resolve_by_key(&self, key: &str) -> Result<HandlerFactory> {
        self.handlers.get(key).cloned().ok_or_else(|| {
            Error::handler_resolution(format!("no handler registered under key '{}'", key))
        })
    }

    /// Look up a handler factory by the extension of `path`.
    pub fn resolve_by_extension(&self, path: &Path) -> Result<HandlerFactory> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(normalize_extension)
            .ok_or_else(|| {
                Error::handler_resolution(format!(
                    "cannot infer a handler for '{}': path has no extension",
                    path.display()
                ))
            })?;

        let key = self.extensions.get(&extension).ok_or_else(|| {
            Error::handler_resolution(format!(
                "no handler found for extension '{}' in the handler registry",
                extension
            ))
        })?;

        self.resolve_by_key(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.handlers.contains_key(key)
    }

    /// The key an extension is currently mapped to.
    pub fn key_for_extension(&self, extension: &str) -> Option<&str> {
        self.extensions
            .get(&normalize_extension(extension))
            .map(String::as_str)
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

/// Read access to the process-wide registry.
pub fn global() -> RwLockReadGuard<'static, Registry> {
    GLOBAL.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Write access to the process-wide registry.
pub fn global_mut() -> RwLockWriteGuard<'static, Registry> {
    GLOBAL.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Register a handler factory in the process-wide registry.
pub fn register<F>(key: &str, factory: F, extensions: &[&str])
where
    F: Fn() -> HandlerRef + Send + Sync + 'static,
{
    global_mut().register(key, factory, extensions);
}

/// Register a `Default` handler type in the process-wide registry.
pub fn register_default<H>(key: &str, extensions: &[&str])
where
    H: Handler + Default + 'static,
{
    global_mut().register_default::<H>(key, extensions);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::test_support::{capture_logs, logged, RecordingHandler, StringHandler};

    #[test]
    fn normalize() {
        assert_eq!(normalize_extension("json"), ".json");
        assert_eq!(normalize_extension(".JSON"), ".json");
        assert_eq!(normalize_extension(" .Yml "), ".yml");
    }

    #[test]
    fn resolve_by_extension_and_key() {
        let mut registry = Registry::new();
        registry.register_default::<StringHandler>("string", &[".txt", "MD"]);

        let handler = (registry.resolve_by_key("string").unwrap())();
        assert_eq!(handler.name(), "StringHandler");

        let by_ext = registry.resolve_by_extension(Path::new("notes/README.md")).unwrap();
        assert_eq!(by_ext().name(), "StringHandler");
        let upper = registry.resolve_by_extension(Path::new("A.TXT")).unwrap();
        assert_eq!(upper().name(), "StringHandler");
    }

    #[test]
    fn unknown_key_fails() {
        let registry = Registry::new();
        assert!(matches!(
            registry.resolve_by_key("yaml"),
            Err(Error::HandlerResolution { .. })
        ));
    }

    #[test]
    fn unknown_or_absent_extension_fails() {
        let mut registry = Registry::new();
        registry.register_default::<StringHandler>("string", &[".txt"]);

        assert!(matches!(
            registry.resolve_by_extension(Path::new("x.dat")),
            Err(Error::HandlerResolution { .. })
        ));
        assert!(matches!(
            registry.resolve_by_extension(Path::new("Makefile")),
            Err(Error::HandlerResolution { .. })
        ));
    }

    #[test]
    fn last_registration_wins() {
        let mut registry = Registry::new();
        registry.register_default::<StringHandler>("a", &[".txt"]);
        registry.register_default::<RecordingHandler>("b", &[".txt"]);

        assert_eq!(registry.key_for_extension("txt"), Some("b"));
        let handler = registry.resolve_by_extension(Path::new("x.txt")).unwrap();
        assert_eq!(handler().name(), "RecordingHandler");

        registry.register_default::<RecordingHandler>("a", &[]);
        assert_eq!((registry.resolve_by_key("a").unwrap())().name(), "RecordingHandler");
        assert_eq!(registry.keys(), vec!["a", "b"]);
    }

    #[test]
    fn global_registry_registration() {
        register_default::<StringHandler>("registry-test-string", &[".registrytest"]);
        let registry = global();
        assert!(registry.contains_key("registry-test-string"));
        assert_eq!(
            registry.key_for_extension(".registrytest"),
            Some("registry-test-string")
        );
    }

    #[test]
    fn overwrites_are_warned_about() {
        capture_logs();
        let mut registry = Registry::new();
        registry.register_default::<StringHandler>("twice-registered", &[".twicemapped"]);
        registry.register_default::<RecordingHandler>("twice-registered", &[]);
        registry.register_default::<RecordingHandler>("remapped-owner", &[".twicemapped"]);

        let key_warnings = logged(log::Level::Warn, "'twice-registered' already exists");
        assert_eq!(key_warnings.len(), 1);
        let extension_warnings = logged(log::Level::Warn, "'.twicemapped'");
        assert_eq!(extension_warnings.len(), 1);
        assert!(extension_warnings[0].contains("'remapped-owner'"));
    }
}
