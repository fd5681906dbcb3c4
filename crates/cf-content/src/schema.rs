//! Declarative record schemas.
//!
//! Every entity type lists its fields as a static `&[FieldSpec]`. Records are
//! checked against that list before typed deserialization so that failures
//! name the entry and the exact field path instead of a serde position.

use serde_json::{Map, Value};

use crate::error::SchemaValidationError;
use crate::name::CollectionName;

/// Expected shape of a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// A string.
    Text,
    /// An integer (the ordering key `number`).
    Integer,
    /// An ordered list of strings.
    TextList,
    /// The id of an entry in another collection.
    Reference(CollectionName),
    /// An ordered list of ids in another collection.
    ReferenceList(CollectionName),
}

impl FieldType {
    fn expected(self) -> String {
        match self {
            Self::Text => "string".to_owned(),
            Self::Integer => "integer".to_owned(),
            Self::TextList => "list of strings".to_owned(),
            Self::Reference(target) => format!("reference to {target} (string id)"),
            Self::ReferenceList(target) => format!("list of references to {target}"),
        }
    }

    /// Element type of list fields.
    fn element(self) -> Option<Self> {
        match self {
            Self::TextList => Some(Self::Text),
            Self::ReferenceList(target) => Some(Self::Reference(target)),
            _ => None,
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Text | Self::Reference(_) => value.is_string(),
            // Integer fields deserialize into i64.
            Self::Integer => value.is_i64(),
            Self::TextList | Self::ReferenceList(_) => value.is_array(),
        }
    }
}

/// One field of a collection schema. Every schema field must be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field name as written in the source (e.g. `shortTitle`).
    pub name: &'static str,
    /// Expected shape.
    pub ty: FieldType,
}

impl FieldSpec {
    #[must_use]
    pub const fn required(name: &'static str, ty: FieldType) -> Self {
        Self { name, ty }
    }
}

/// Shape name of a JSON value, used as the "actual" side of validation errors.
#[must_use]
pub fn shape_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() => "integer",
        Value::Number(n) if n.is_u64() => "integer out of range",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Check a record against a schema.
///
/// Fields are checked in schema order; the first failure is returned. Fields
/// not named by the schema are ignored.
///
/// # Errors
///
/// Returns [`SchemaValidationError`] if the record is not an object, a required
/// field is missing, or a field (or list element) has the wrong shape.
pub fn validate(
    collection: CollectionName,
    entity: &str,
    record: &Value,
    schema: &[FieldSpec],
) -> Result<(), SchemaValidationError> {
    let error = |field: String, expected: String, actual: &str| SchemaValidationError {
        collection,
        entity: entity.to_owned(),
        field,
        expected,
        actual: actual.to_owned(),
    };

    let Value::Object(fields) = record else {
        return Err(error("$".to_owned(), "object".to_owned(), shape_of(record)));
    };

    for spec in schema {
        let Some(value) = fields.get(spec.name) else {
            return Err(error(spec.name.to_owned(), spec.ty.expected(), "missing"));
        };

        if !spec.ty.accepts(value) {
            return Err(error(spec.name.to_owned(), spec.ty.expected(), shape_of(value)));
        }

        if let (Some(element), Value::Array(items)) = (spec.ty.element(), value) {
            for (index, item) in items.iter().enumerate() {
                if !element.accepts(item) {
                    return Err(error(
                        format!("{}[{index}]", spec.name),
                        element.expected(),
                        shape_of(item),
                    ));
                }
            }
        }
    }

    log_unknown_fields(collection, entity, fields, schema);
    Ok(())
}

fn log_unknown_fields(
    collection: CollectionName,
    entity: &str,
    fields: &Map<String, Value>,
    schema: &[FieldSpec],
) {
    for name in fields.keys() {
        if !schema.iter().any(|spec| spec.name == name) {
            tracing::debug!(%collection, entity, field = %name, "Ignoring unknown field");
        }
    }
}
