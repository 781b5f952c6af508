//! Conversions between typed entities, request payloads and storage rows.

use crate::entity::EntityDescriptor;
use crate::error::{AppError, StoreError};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

/// A stored record: field name to JSON value.
pub type Row = Map<String, Value>;

/// Zero value in the Go/GORM sense: null, empty string, 0, false, empty array or object.
pub fn is_zero(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

pub fn to_row<T: Serialize>(obj: &T) -> Result<Row, AppError> {
    match serde_json::to_value(obj) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(AppError::Internal("entity must serialize to an object".into())),
        Err(e) => Err(AppError::Internal(format!("serialize entity: {}", e))),
    }
}

pub fn from_row<T: DeserializeOwned>(row: Row) -> Result<T, StoreError> {
    serde_json::from_value(Value::Object(row)).map_err(|e| StoreError::Decode(e.to_string()))
}

/// Columns to insert for a new object: declared, writable fields only. Zero values are omitted
/// when the field has a default (storage applies it) and nulls are always omitted.
pub fn insert_row(entity: &EntityDescriptor, obj: Row) -> Row {
    obj.into_iter()
        .filter(|(k, v)| {
            let Some(f) = entity.get(k) else { return false };
            if f.primary_key || f.read_only || v.is_null() {
                return false;
            }
            !(f.default.is_some() && is_zero(v))
        })
        .collect()
}

/// Partial-merge changes from a decoded update payload: only non-zero, writable fields.
pub fn update_changes(entity: &EntityDescriptor, obj: Row) -> Row {
    obj.into_iter()
        .filter(|(k, v)| {
            entity
                .get(k)
                .map_or(false, |f| !f.primary_key && !f.read_only && !is_zero(v))
        })
        .collect()
}
