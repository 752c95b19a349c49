//! Data source loading.
//! Reads JSON or YAML files into a string-keyed `serde_json::Value` tree.

use log::debug;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Supported data formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Json,
    Yaml,
}

impl DataFormat {
    /// Detects the format from the file extension (case-insensitive).
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match extension.as_deref() {
            Some("json") => Ok(DataFormat::Json),
            Some("yaml") | Some("yml") => Ok(DataFormat::Yaml),
            _ => Err(Error::DataError(format!(
                "unsupported file extension for '{}': expected .json, .yaml, or .yml",
                path.display()
            ))),
        }
    }
}

/// Loads a data file, detecting its format by extension.
pub fn load<P: AsRef<Path>>(path: P) -> Result<serde_json::Value> {
    let path = path.as_ref();
    let format = DataFormat::from_path(path)?;
    let content = fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => {
            Error::InputError(format!("data file does not exist: '{}'", path.display()))
        }
        _ => Error::file(path, e),
    })?;
    debug!("Loading {:?} data from '{}'", format, path.display());
    parse(&content, format)
}

/// Parses raw bytes in the given format.
pub fn parse(content: &[u8], format: DataFormat) -> Result<serde_json::Value> {
    match format {
        DataFormat::Json => serde_json::from_slice(content)
            .map_err(|e| Error::DataError(format!("failed to parse JSON: {e}"))),
        DataFormat::Yaml => {
            let value: serde_yaml::Value = serde_yaml::from_slice(content)
                .map_err(|e| Error::DataError(format!("failed to parse YAML: {e}")))?;
            yaml_to_json(value)
        }
    }
}

/// Converts a YAML value into a JSON value, stringifying non-string map keys.
fn yaml_to_json(value: serde_yaml::Value) -> Result<serde_json::Value> {
    use serde_yaml::Value as Yaml;

    Ok(match value {
        Yaml::Null => serde_json::Value::Null,
        Yaml::Bool(b) => serde_json::Value::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                serde_json::Value::from(i)
            } else if let Some(u) = n.as_u64() {
                serde_json::Value::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(serde_json::Value::Number)
                    .unwrap_or(serde_json::Value::Null)
            }
        }
        Yaml::String(s) => serde_json::Value::String(s),
        Yaml::Sequence(items) => serde_json::Value::Array(
            items.into_iter().map(yaml_to_json).collect::<Result<Vec<_>>>()?,
        ),
        Yaml::Mapping(mapping) => {
            let mut object = serde_json::Map::with_capacity(mapping.len());
            for (key, value) in mapping {
                object.insert(yaml_key(key)?, yaml_to_json(value)?);
            }
            serde_json::Value::Object(object)
        }
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value)?,
    })
}

fn yaml_key(key: serde_yaml::Value) -> Result<String> {
    use serde_yaml::Value as Yaml;

    match key {
        Yaml::String(s) => Ok(s),
        Yaml::Bool(b) => Ok(b.to_string()),
        Yaml::Number(n) => Ok(n.to_string()),
        Yaml::Null => Ok("null".to_string()),
        other => Err(Error::DataError(format!("unsupported YAML map key: {other:?}"))),
    }
}
