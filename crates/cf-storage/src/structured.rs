//! Structured data sources: a single JSON or YAML file holding many records.

use std::path::Path;

use serde_json::Value;

use crate::storage::{Storage, StorageError};

/// Record key holding an explicit id.
const ID_KEY: &str = "id";

/// One record of a structured data file.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Explicit `id` field, map key, or array position.
    pub id: String,
    /// Record payload, validated later against a collection schema.
    pub data: Value,
}

/// Supported structured file formats, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Yaml,
}

impl Format {
    fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

/// Read a structured data file into records.
///
/// - An array yields one record per element. The id is the element's `id`
///   field (string or integer) when present, otherwise its array position.
///   An `id` of any other type is an error.
/// - A map yields one record per entry, keyed by the map key.
///
/// # Errors
///
/// Returns [`StorageError`] if the file is missing or unreadable, has an
/// unsupported extension, fails to parse, or has a top-level value that is
/// neither an array nor a map.
pub fn read_structured_file(storage: &dyn Storage, path: &Path) -> Result<Vec<Record>, StorageError> {
    let format = Format::from_path(path).ok_or_else(|| {
        StorageError::invalid_format(path, "unsupported data file extension (expected .json, .yaml or .yml)")
    })?;
    let content = storage.read(path)?;

    let value: Value = match format {
        Format::Json => serde_json::from_str(&content)
            .map_err(|e| StorageError::invalid_format(path, format!("Invalid JSON: {e}")))?,
        Format::Yaml => {
            let yaml: serde_yaml::Value = serde_yaml::from_str(&content)
                .map_err(|e| StorageError::invalid_format(path, format!("Invalid YAML: {e}")))?;
            serde_json::to_value(yaml).map_err(|e| {
                StorageError::invalid_format(path, format!("YAML cannot be represented as JSON: {e}"))
            })?
        }
    };

    let records: Vec<Record> = match value {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(position, data)| {
                let id = explicit_id(&data)
                    .map_err(|detail| StorageError::invalid_format(path, format!("record {position}: {detail}")))?
                    .unwrap_or_else(|| position.to_string());
                Ok::<_, StorageError>(Record { id, data })
            })
            .collect::<Result<_, _>>()?,
        Value::Object(map) => map
            .into_iter()
            .map(|(id, data)| Record { id, data })
            .collect(),
        _ => {
            return Err(StorageError::invalid_format(
                path,
                "top-level value must be an array or a map of records",
            ));
        }
    };

    tracing::debug!(path = %path.display(), count = records.len(), "Read structured file");
    Ok(records)
}

/// Extract an explicit id from a record, accepting strings and integers.
fn explicit_id(data: &Value) -> Result<Option<String>, String> {
    match data.get(ID_KEY) {
        None => Ok(None),
        Some(Value::String(id)) => Ok(Some(id.clone())),
        Some(Value::Number(n)) if n.is_i64() || n.is_u64() => Ok(Some(n.to_string())),
        Some(other) => Err(format!("\"{ID_KEY}\" must be a string or an integer, found {other}")),
    }
}
