//! In-process store with auto-increment ids, defaults, unique checks and soft delete.

use crate::entity::{timestamp_value, EntityDescriptor, Row, CREATED_AT, DELETED_AT, UPDATED_AT};
use crate::error::StoreError;
use crate::query::{Predicate, SelectQuery, SortDirection};
use crate::store::Store;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct Table {
    last_id: i64,
    rows: BTreeMap<i64, Row>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Table>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Table>> {
        self.tables.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Table>> {
        self.tables.write().unwrap_or_else(|e| e.into_inner())
    }

    fn live_rows<'a>(
        table: Option<&'a Table>,
        entity: &'a EntityDescriptor,
        query: &'a SelectQuery,
    ) -> impl Iterator<Item = &'a Row> + 'a {
        table
            .into_iter()
            .flat_map(|t| t.rows.values())
            .filter(move |row| is_live(entity, row) && matches(row, &query.predicates))
    }
}

fn now() -> Value {
    timestamp_value(chrono::Utc::now())
}

/// Strings that parse as RFC 3339 compare as instants, not as text.
fn instant(v: &Value) -> Option<DateTime<FixedOffset>> {
    v.as_str().and_then(|s| DateTime::parse_from_rfc3339(s).ok())
}

fn is_live(entity: &EntityDescriptor, row: &Row) -> bool {
    !entity.soft_delete || row.get(DELETED_AT).map_or(true, Value::is_null)
}

fn row_id(entity: &EntityDescriptor, row: &Row) -> i64 {
    row.get(&entity.pk).and_then(Value::as_i64).unwrap_or_default()
}

fn text_of(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::String(x), Value::String(y)) if x != y => match (instant(a), instant(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
        _ => a == b,
    }
}

fn matches(row: &Row, predicates: &[Predicate]) -> bool {
    predicates.iter().all(|p| match p {
        Predicate::Eq { field, value } => row.get(field).map_or(false, |v| values_equal(v, value)),
        Predicate::AnyContains { fields, term } => {
            let needle = term.to_lowercase();
            fields.iter().any(|f| {
                row.get(f)
                    .and_then(text_of)
                    .map_or(false, |s| s.to_lowercase().contains(&needle))
            })
        }
    })
}

/// Nulls compare greater than any value, so they land last ascending and first descending,
/// matching PostgreSQL's default null placement.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x @ Value::String(_)), Some(y @ Value::String(_))) => match (instant(x), instant(y)) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => x.as_str().cmp(&y.as_str()),
        },
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

/// First unique field whose value in `row` is already held by another live row.
fn unique_conflict(
    entity: &EntityDescriptor,
    table: &Table,
    row: &Row,
    except_id: Option<i64>,
) -> Option<String> {
    entity.unique_fields().find_map(|f| {
        let value = row.get(&f.name).filter(|v| !v.is_null())?;
        let taken = table.rows.values().any(|other| {
            Some(row_id(entity, other)) != except_id
                && is_live(entity, other)
                && other.get(&f.name).map_or(false, |v| values_equal(v, value))
        });
        taken.then(|| f.name.clone())
    })
}

#[async_trait]
impl Store for MemoryStore {
    async fn count(&self, entity: &EntityDescriptor, query: &SelectQuery) -> Result<u64, StoreError> {
        let tables = self.read();
        let n = Self::live_rows(tables.get(&entity.table), entity, query).count();
        Ok(n as u64)
    }

    async fn find(&self, entity: &EntityDescriptor, query: &SelectQuery) -> Result<Vec<Row>, StoreError> {
        let tables = self.read();
        let mut rows: Vec<&Row> = Self::live_rows(tables.get(&entity.table), entity, query).collect();
        let (field, direction) = match &query.order {
            Some(o) => (o.field.as_str(), o.direction),
            None => (entity.pk.as_str(), SortDirection::Asc),
        };
        rows.sort_by(|a, b| {
            let primary = match direction {
                SortDirection::Asc => compare_values(a.get(field), b.get(field)),
                SortDirection::Desc => compare_values(b.get(field), a.get(field)),
            };
            primary.then_with(|| row_id(entity, a).cmp(&row_id(entity, b)))
        });
        let offset = usize::try_from(query.offset.unwrap_or(0)).unwrap_or(usize::MAX);
        let limit = query.limit.map_or(usize::MAX, |n| n as usize);
        Ok(rows.into_iter().skip(offset).take(limit).cloned().collect())
    }

    async fn find_by_id(&self, entity: &EntityDescriptor, id: i64) -> Result<Option<Row>, StoreError> {
        let tables = self.read();
        Ok(tables
            .get(&entity.table)
            .and_then(|t| t.rows.get(&id))
            .filter(|row| is_live(entity, row))
            .cloned())
    }

    async fn insert(&self, entity: &EntityDescriptor, row: Row) -> Result<Row, StoreError> {
        let mut tables = self.write();
        let table = tables.entry(entity.table.clone()).or_default();

        let mut stored = Row::new();
        for f in &entity.fields {
            let value = row
                .get(&f.name)
                .cloned()
                .or_else(|| f.default.clone())
                .unwrap_or(Value::Null);
            stored.insert(f.name.clone(), value);
        }
        if let Some(field) = unique_conflict(entity, table, &stored, None) {
            return Err(StoreError::UniqueViolation { field });
        }

        table.last_id += 1;
        let id = table.last_id;
        stored.insert(entity.pk.clone(), Value::from(id));
        for stamp in [CREATED_AT, UPDATED_AT] {
            if entity.has_field(stamp) {
                stored.insert(stamp.to_string(), now());
            }
        }
        table.rows.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update(
        &self,
        entity: &EntityDescriptor,
        id: i64,
        changes: Row,
    ) -> Result<Option<Row>, StoreError> {
        let mut tables = self.write();
        let Some(table) = tables.get_mut(&entity.table) else {
            return Ok(None);
        };
        let Some(current) = table.rows.get(&id).filter(|row| is_live(entity, row)) else {
            return Ok(None);
        };

        let mut next = current.clone();
        for (k, v) in changes {
            if k != entity.pk && entity.has_field(&k) {
                next.insert(k, v);
            }
        }
        if let Some(field) = unique_conflict(entity, table, &next, Some(id)) {
            return Err(StoreError::UniqueViolation { field });
        }
        if entity.has_field(UPDATED_AT) {
            next.insert(UPDATED_AT.to_string(), now());
        }
        table.rows.insert(id, next.clone());
        Ok(Some(next))
    }

    async fn delete(&self, entity: &EntityDescriptor, id: i64) -> Result<bool, StoreError> {
        let mut tables = self.write();
        let Some(table) = tables.get_mut(&entity.table) else {
            return Ok(false);
        };
        if entity.soft_delete {
            match table.rows.get_mut(&id) {
                Some(row) if is_live(entity, row) => {
                    row.insert(DELETED_AT.to_string(), now());
                    Ok(true)
                }
                _ => Ok(false),
            }
        } else {
            Ok(table.rows.remove(&id).is_some())
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
