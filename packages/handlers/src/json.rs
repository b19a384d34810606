use std::fs;
use std::path::Path;

use treeconf_core::{ensure_source, prepare_destination, Error, Handler, Result, Value};

use crate::convert::{json_to_value, value_to_json};

/// Reads and writes JSON files.
///
/// Output is pretty printed with a trailing newline.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonHandler;

impl Handler for JsonHandler {
    fn read(&self, path: &Path) -> Result<Value> {
        ensure_source(path)?;
        let text = fs::read_to_string(path)?;
        let json: serde_json::Value = serde_json::from_str(&text).map_err(|err| Error::Decode {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        log::debug!("Read JSON from {}", path.display());
        Ok(json_to_value(json))
    }

    fn write(&self, path: &Path, data: &Value, overwrite_ok: bool) -> Result<()> {
        let json = value_to_json(data.clone()).map_err(|err| Error::Encode {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        let mut text = serde_json::to_string_pretty(&json).map_err(|err| Error::Encode {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        text.push('\n');

        prepare_destination(path, overwrite_ok)?;
        fs::write(path, text)?;
        log::debug!("Wrote JSON to {}", path.display());
        Ok(())
    }
}
