//! Conversions between Value and serde types.

use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Serialize;
use treeconf_core::{Error, Result, Value};

/// Convert a Value to a Rust type via serde.
pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T> {
    let json = value_to_json(value)?;
    serde_json::from_value(json).map_err(|e| Error::invalid_data(e.to_string()))
}

/// Convert a Rust type to a Value via serde.
pub fn to_value<T: Serialize>(data: &T) -> Result<Value> {
    let json = serde_json::to_value(data).map_err(|e| Error::invalid_data(e.to_string()))?;
    Ok(json_to_value(json))
}

/// Convert a Value to serde_json::Value.
///
/// Bytes become base64 strings and nested configs become objects. `MISSING`
/// has no JSON form and is rejected.
pub fn value_to_json(value: Value) -> Result<serde_json::Value> {
    Ok(match value {
        Value::Missing => {
            return Err(Error::invalid_data("MISSING cannot be encoded"));
        }
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(b),
        Value::Integer(i) => serde_json::Value::Number(i.into()),
        Value::Float(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::String(s) => serde_json::Value::String(s),
        Value::Bytes(b) => {
            serde_json::Value::String(base64::engine::general_purpose::STANDARD.encode(&b))
        }
        Value::Array(arr) => serde_json::Value::Array(
            arr.into_iter()
                .map(value_to_json)
                .collect::<Result<Vec<_>>>()?,
        ),
        Value::Map(map) => serde_json::Value::Object(
            map.into_iter()
                .map(|(k, v)| Ok((k, value_to_json(v)?)))
                .collect::<Result<serde_json::Map<_, _>>>()?,
        ),
        Value::Config(config) => serde_json::Value::Object(
            config
                .into_iter()
                .map(|(k, v)| Ok((k, value_to_json(v)?)))
                .collect::<Result<serde_json::Map<_, _>>>()?,
        ),
    })
}

/// Convert serde_json::Value to a Value.
///
/// Objects become [`Value::Map`]; a JSON document never yields `MISSING` or
/// a nested config.
pub fn json_to_value(json: serde_json::Value) -> Value {
    use serde_json::Value as Json;

    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(b),
        Json::Number(n) => n
            .as_i64()
            .map(Value::Integer)
            .or_else(|| n.as_f64().map(Value::Float))
            .unwrap_or_else(|| Value::String(n.to_string())),
        Json::String(s) => Value::String(s),
        Json::Array(items) => Value::Array(items.into_iter().map(json_to_value).collect()),
        Json::Object(fields) => {
            Value::Map(fields.into_iter().map(|(k, v)| (k, json_to_value(v))).collect())
        }
    }
}
