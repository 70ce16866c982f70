//! # Compact Filter Codec
//!
//! Positional JSON arrays for embedding filters in a URL:
//!
//! - simple: `["datastore.database.table.field", operator, value, root]`
//! - compound: `[type, root, child, child, ...]`
//!
//! A filter list is a JSON array of those. Ids, names and relation links
//! are not encoded. A simple filter without a value drops the trailing
//! elements and decodes back unchanged.
//!
//! One shape does not round-trip: a simple filter with no value and an
//! `or` root must keep its root, so its value is written as `null` and it
//! decodes with an explicit `null` value. Filters that differ only in
//! that way are not equivalent.

mod errors;

pub use errors::{CodecError, CodecResult};

use serde_json::Value;

use crate::config::{SavedCompoundFilterDesign, SavedFilterDesign, SavedSimpleFilterDesign};
use crate::datasource::FieldKey;
use crate::design::CompoundType;

/// Encode saved filters as a compact JSON string
pub fn encode_filters(filters: &[SavedFilterDesign]) -> String {
    Value::Array(filters.iter().map(encode_filter).collect()).to_string()
}

/// Decode a compact JSON string into saved filters
pub fn decode_filters(input: &str) -> CodecResult<Vec<SavedFilterDesign>> {
    let parsed: Value =
        serde_json::from_str(input).map_err(|e| CodecError::InvalidJson(e.to_string()))?;
    let Value::Array(items) = parsed else {
        return Err(CodecError::ExpectedArray("filters".to_string()));
    };
    items
        .iter()
        .enumerate()
        .map(|(position, item)| decode_filter(item, &format!("filters[{}]", position)))
        .collect()
}

/// Positional array for one filter
pub fn encode_filter(filter: &SavedFilterDesign) -> Value {
    match filter {
        SavedFilterDesign::Simple(simple) => {
            let path = format!(
                "{}.{}.{}.{}",
                simple.datastore, simple.database, simple.table, simple.field
            );
            let mut items = vec![Value::from(path), Value::from(simple.operator.clone())];
            if simple.value.is_some() || simple.root == CompoundType::Or {
                items.push(simple.value.clone().unwrap_or(Value::Null));
                items.push(Value::from(simple.root.as_str()));
            }
            Value::Array(items)
        }
        SavedFilterDesign::Compound(compound) => {
            let mut items = vec![
                Value::from(compound.kind.as_str()),
                Value::from(compound.root.as_str()),
            ];
            items.extend(compound.filters.iter().map(encode_filter));
            Value::Array(items)
        }
    }
}

/// Decode one positional array; `location` names it in errors
pub fn decode_filter(value: &Value, location: &str) -> CodecResult<SavedFilterDesign> {
    let Some(items) = value.as_array() else {
        return Err(CodecError::ExpectedArray(location.to_string()));
    };
    let head = items.first().and_then(Value::as_str).unwrap_or_default();

    if let Some(kind) = CompoundType::parse(head) {
        let root = decode_root(items.get(1))?;
        let filters = items
            .iter()
            .enumerate()
            .skip(2)
            .map(|(position, child)| decode_filter(child, &format!("{}[{}]", location, position)))
            .collect::<CodecResult<Vec<_>>>()?;
        return Ok(SavedFilterDesign::Compound(SavedCompoundFilterDesign {
            id: None,
            name: None,
            kind,
            root,
            filters,
            relations: Vec::new(),
        }));
    }

    let field =
        FieldKey::from_path(head).ok_or_else(|| CodecError::InvalidFieldPath(head.to_string()))?;
    let operator = items
        .get(1)
        .and_then(Value::as_str)
        .filter(|operator| !operator.is_empty())
        .ok_or_else(|| CodecError::MissingOperator(location.to_string()))?;

    Ok(SavedFilterDesign::Simple(SavedSimpleFilterDesign {
        id: None,
        name: None,
        root: decode_root(items.get(3))?,
        datastore: field.datastore,
        database: field.database.name,
        table: field.table.name,
        field: field.field.column_name,
        operator: operator.to_string(),
        value: items.get(2).cloned(),
        relations: Vec::new(),
    }))
}

fn decode_root(value: Option<&Value>) -> CodecResult<CompoundType> {
    match value {
        None | Some(Value::Null) => Ok(CompoundType::And),
        Some(Value::String(keyword)) => {
            CompoundType::parse(keyword).ok_or_else(|| CodecError::UnknownConnective(keyword.clone()))
        }
        Some(other) => Err(CodecError::UnknownConnective(other.to_string())),
    }
}
