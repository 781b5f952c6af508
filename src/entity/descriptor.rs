//! Entity descriptor: the runtime shape of one model (table, fields, primary key, rules).

use crate::entity::ValidationRule;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use std::collections::BTreeMap;

/// Column carrying the soft-delete marker.
pub const DELETED_AT: &str = "deleted_at";
pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";

/// Canonical text form of a timestamp: UTC with a `Z` suffix, the same shape the models serialize to.
pub fn timestamp_value(at: DateTime<Utc>) -> Value {
    Value::String(at.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

/// Storage type of a field. Drives SQL casts, DDL and query-string coercion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Int,
    Float,
    Bool,
    Text,
    Timestamp,
}

impl FieldKind {
    /// PostgreSQL type used for parameter casts.
    pub fn sql_type(self) -> &'static str {
        match self {
            FieldKind::Int => "bigint",
            FieldKind::Float => "double precision",
            FieldKind::Bool => "boolean",
            FieldKind::Text => "text",
            FieldKind::Timestamp => "timestamptz",
        }
    }

    /// Parse a raw query-string value into a JSON value of this kind. `None` when it does not parse.
    pub fn coerce(self, raw: &str) -> Option<Value> {
        match self {
            FieldKind::Int => raw.trim().parse::<i64>().ok().map(Value::from),
            FieldKind::Float => raw
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number),
            FieldKind::Bool => {
                if raw.eq_ignore_ascii_case("true") || raw == "1" {
                    Some(Value::Bool(true))
                } else if raw.eq_ignore_ascii_case("false") || raw == "0" {
                    Some(Value::Bool(false))
                } else {
                    None
                }
            }
            FieldKind::Timestamp => DateTime::parse_from_rfc3339(raw.trim())
                .ok()
                .map(|t| timestamp_value(t.with_timezone(&Utc))),
            FieldKind::Text => Some(Value::String(raw.to_string())),
        }
    }
}

#[derive(Clone, Debug)]
pub struct FieldDef {
    pub name: String,
    pub kind: FieldKind,
    pub primary_key: bool,
    pub unique: bool,
    pub nullable: bool,
    /// Never taken from request payloads (timestamps, soft-delete marker).
    pub read_only: bool,
    /// Applied by storage when the payload leaves the field at its zero value.
    pub default: Option<Value>,
    pub max_length: Option<u32>,
}

impl FieldDef {
    pub fn new(name: &str, kind: FieldKind) -> Self {
        FieldDef {
            name: name.to_string(),
            kind,
            primary_key: false,
            unique: false,
            nullable: true,
            read_only: false,
            default: None,
            max_length: None,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn max_length(mut self, n: u32) -> Self {
        self.max_length = Some(n);
        self
    }
}

/// Describes one entity for the whole process lifetime. Built once at startup, never mutated.
#[derive(Clone, Debug)]
pub struct EntityDescriptor {
    pub table: String,
    /// Path segment the entity is mounted under (e.g. `users`).
    pub resource: String,
    pub pk: String,
    pub fields: Vec<FieldDef>,
    pub soft_delete: bool,
    pub validation: BTreeMap<String, ValidationRule>,
}

impl EntityDescriptor {
    /// New descriptor with an `id` bigint primary key; resource defaults to the table name.
    pub fn new(table: &str) -> Self {
        EntityDescriptor {
            table: table.to_string(),
            resource: table.to_string(),
            pk: "id".to_string(),
            fields: vec![FieldDef::new("id", FieldKind::Int).primary_key()],
            soft_delete: false,
            validation: BTreeMap::new(),
        }
    }

    pub fn resource(mut self, segment: &str) -> Self {
        self.resource = segment.to_string();
        self
    }

    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Adds read-only `created_at` / `updated_at` timestamps maintained by storage.
    pub fn timestamps(self) -> Self {
        self.field(FieldDef::new(CREATED_AT, FieldKind::Timestamp).read_only())
            .field(FieldDef::new(UPDATED_AT, FieldKind::Timestamp).read_only())
    }

    /// Adds a `deleted_at` marker; deletes then hide rows instead of removing them.
    pub fn soft_delete(mut self) -> Self {
        self.soft_delete = true;
        self.field(FieldDef::new(DELETED_AT, FieldKind::Timestamp).read_only())
    }

    pub fn rule(mut self, field: &str, rule: ValidationRule) -> Self {
        self.validation.insert(field.to_string(), rule);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Resolve a client-supplied field reference: `field` or `<table>.field` for this entity's own table.
    pub fn resolve(&self, raw: &str) -> Option<&FieldDef> {
        let name = match raw.split_once('.') {
            Some((table, field)) if table == self.table => field,
            Some(_) => return None,
            None => raw,
        };
        self.get(name)
    }

    pub fn unique_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.unique)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn items() -> EntityDescriptor {
        EntityDescriptor::new("items")
            .field(FieldDef::new("name", FieldKind::Text))
            .field(FieldDef::new("qty", FieldKind::Int))
            .timestamps()
            .soft_delete()
    }

    #[test]
    fn resolves_plain_and_qualified_names() {
        let d = items();
        assert_eq!(d.resolve("qty").map(|f| f.kind), Some(FieldKind::Int));
        assert!(d.resolve("items.name").is_some());
        assert!(d.resolve("orders.name").is_none());
        assert!(d.resolve("missing").is_none());
    }

    #[test]
    fn builder_marks_managed_fields_read_only() {
        let d = items();
        assert!(d.soft_delete);
        for name in [CREATED_AT, UPDATED_AT, DELETED_AT] {
            assert!(d.get(name).unwrap().read_only, "{name}");
        }
        assert!(d.get("id").unwrap().primary_key);
    }

    #[test]
    fn coerce_by_kind() {
        assert_eq!(FieldKind::Int.coerce("42"), Some(json!(42)));
        assert_eq!(FieldKind::Int.coerce("4x"), None);
        assert_eq!(FieldKind::Bool.coerce("TRUE"), Some(json!(true)));
        assert_eq!(FieldKind::Bool.coerce("maybe"), None);
        assert_eq!(FieldKind::Float.coerce("1.5"), Some(json!(1.5)));
        assert_eq!(FieldKind::Text.coerce("abc"), Some(json!("abc")));
    }

    #[test]
    fn timestamps_parse_and_normalize_to_utc() {
        assert_eq!(
            FieldKind::Timestamp.coerce("2024-05-01T10:00:00+02:00"),
            Some(json!("2024-05-01T08:00:00Z"))
        );
        assert_eq!(
            FieldKind::Timestamp.coerce("2024-05-01T08:00:00.250Z"),
            Some(json!("2024-05-01T08:00:00.250Z"))
        );
        assert_eq!(FieldKind::Timestamp.coerce("not-a-time"), None);
        assert_eq!(FieldKind::Timestamp.coerce("2024-05-01"), None);
    }
}
