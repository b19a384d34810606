use std::fs;
use std::path::Path;

use treeconf_core::{ensure_source, prepare_destination, Error, Handler, Result, Value};

/// Reads and writes UTF-8 text files as [`Value::String`].
#[derive(Clone, Copy, Debug, Default)]
pub struct TextHandler;

impl Handler for TextHandler {
    fn read(&self, path: &Path) -> Result<Value> {
        ensure_source(path)?;
        let bytes = fs::read(path)?;
        let text = String::from_utf8(bytes).map_err(|err| Error::Decode {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        Ok(Value::String(text))
    }

    fn write(&self, path: &Path, data: &Value, overwrite_ok: bool) -> Result<()> {
        let text = data.as_str().ok_or_else(|| Error::Encode {
            path: path.to_path_buf(),
            message: format!("expected string, got {}", data.kind()),
        })?;
        prepare_destination(path, overwrite_ok)?;
        fs::write(path, text)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes/readme.md");

        TextHandler
            .write(&path, &Value::from("# Notes\n"), false)
            .unwrap();
        assert_eq!(TextHandler.read(&path).unwrap(), Value::from("# Notes\n"));
        assert!(matches!(
            TextHandler.write(&path, &Value::from("again"), false),
            Err(Error::DestinationExists { .. })
        ));
    }

    #[test]
    fn only_strings_are_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("n.txt");
        assert!(matches!(
            TextHandler.write(&path, &Value::Integer(3), false),
            Err(Error::Encode { .. })
        ));
        assert!(!path.exists());
    }

    #[test]
    fn invalid_utf8_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bin.txt");
        fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();
        assert!(matches!(
            TextHandler.read(&path),
            Err(Error::Decode { .. })
        ));
    }
}
