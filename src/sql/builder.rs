//! Renders select descriptions and writes into parameterized PostgreSQL.
//!
//! Identifiers come from the entity descriptor and are always quoted; values are always
//! bind parameters cast to the field's type.

use crate::entity::{EntityDescriptor, FieldKind, Row, DELETED_AT, UPDATED_AT};
use crate::query::{Predicate, SelectQuery};
use serde_json::Value;

/// Quote identifier for PostgreSQL.
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value) -> usize {
        self.params.push(v);
        self.params.len()
    }

    /// Placeholder for a value of `kind`, e.g. `$2::bigint`.
    fn placeholder(&mut self, v: Value, kind: FieldKind) -> String {
        let n = self.push_param(v);
        format!("${}::{}", n, kind.sql_type())
    }
}

fn kind_of(entity: &EntityDescriptor, field: &str) -> FieldKind {
    entity.get(field).map_or(FieldKind::Text, |f| f.kind)
}

fn column_list(entity: &EntityDescriptor) -> String {
    entity
        .fields
        .iter()
        .map(|f| quoted(&f.name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Escape LIKE wildcards so the term matches literally.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn where_clause(q: &mut QueryBuf, entity: &EntityDescriptor, select: &SelectQuery) -> String {
    let mut parts = Vec::new();
    if entity.soft_delete {
        parts.push(format!("{} IS NULL", quoted(DELETED_AT)));
    }
    for p in &select.predicates {
        match p {
            Predicate::Eq { field, value } => {
                let ph = q.placeholder(value.clone(), kind_of(entity, field));
                parts.push(format!("{} = {}", quoted(field), ph));
            }
            Predicate::AnyContains { fields, term } => {
                let n = q.push_param(Value::String(like_pattern(term)));
                let ors: Vec<String> = fields
                    .iter()
                    .map(|f| format!("{}::text ILIKE ${}", quoted(f), n))
                    .collect();
                parts.push(format!("({})", ors.join(" OR ")));
            }
        }
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    }
}

/// SELECT with filters, ORDER BY (primary key as tiebreaker) and optional LIMIT/OFFSET.
pub fn select_list(entity: &EntityDescriptor, select: &SelectQuery) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_sql = where_clause(&mut q, entity, select);
    let pk = quoted(&entity.pk);
    let order_sql = match &select.order {
        Some(o) if o.field != entity.pk => {
            format!(" ORDER BY {} {}, {}", quoted(&o.field), o.direction.as_sql(), pk)
        }
        Some(o) => format!(" ORDER BY {} {}", pk, o.direction.as_sql()),
        None => format!(" ORDER BY {}", pk),
    };
    let limit_sql = select.limit.map(|n| format!(" LIMIT {}", n)).unwrap_or_default();
    let offset_sql = select.offset.map(|n| format!(" OFFSET {}", n)).unwrap_or_default();
    q.sql = format!(
        "SELECT {} FROM {}{}{}{}{}",
        column_list(entity),
        quoted(&entity.table),
        where_sql,
        order_sql,
        limit_sql,
        offset_sql
    );
    q
}

/// SELECT COUNT(*) over the filtered set; order and window are ignored.
pub fn count(entity: &EntityDescriptor, select: &SelectQuery) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_sql = where_clause(&mut q, entity, select);
    q.sql = format!("SELECT COUNT(*) FROM {}{}", quoted(&entity.table), where_sql);
    q
}

pub fn select_by_id(entity: &EntityDescriptor, id: i64) -> QueryBuf {
    let select = SelectQuery::new().filter(entity.pk.clone(), Value::from(id));
    let mut q = QueryBuf::new();
    let where_sql = where_clause(&mut q, entity, &select);
    q.sql = format!(
        "SELECT {} FROM {}{}",
        column_list(entity),
        quoted(&entity.table),
        where_sql
    );
    q
}

/// INSERT the given columns; omitted columns take their database default.
pub fn insert(entity: &EntityDescriptor, row: &Row) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for f in &entity.fields {
        if let Some(v) = row.get(&f.name) {
            placeholders.push(q.placeholder(v.clone(), f.kind));
            cols.push(quoted(&f.name));
        }
    }
    let table = quoted(&entity.table);
    q.sql = if cols.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", table, column_list(entity))
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            table,
            cols.join(", "),
            placeholders.join(", "),
            column_list(entity)
        )
    };
    q
}

/// UPDATE by id: SET only the given declared columns, bump `updated_at` when the entity has it.
pub fn update(entity: &EntityDescriptor, id: i64, changes: &Row) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for f in &entity.fields {
        if f.primary_key {
            continue;
        }
        if let Some(v) = changes.get(&f.name) {
            let ph = q.placeholder(v.clone(), f.kind);
            sets.push(format!("{} = {}", quoted(&f.name), ph));
        }
    }
    if entity.has_field(UPDATED_AT) {
        sets.push(format!("{} = NOW()", quoted(UPDATED_AT)));
    }
    if sets.is_empty() {
        return select_by_id(entity, id);
    }
    let id_ph = q.placeholder(Value::from(id), FieldKind::Int);
    let live = if entity.soft_delete {
        format!(" AND {} IS NULL", quoted(DELETED_AT))
    } else {
        String::new()
    };
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {}{} RETURNING {}",
        quoted(&entity.table),
        sets.join(", "),
        quoted(&entity.pk),
        id_ph,
        live,
        column_list(entity)
    );
    q
}

/// DELETE by id, or mark `deleted_at` for soft-delete entities.
pub fn delete(entity: &EntityDescriptor, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let id_ph = q.placeholder(Value::from(id), FieldKind::Int);
    let table = quoted(&entity.table);
    let pk = quoted(&entity.pk);
    q.sql = if entity.soft_delete {
        let marker = quoted(DELETED_AT);
        format!(
            "UPDATE {} SET {} = NOW() WHERE {} = {} AND {} IS NULL",
            table, marker, pk, id_ph, marker
        )
    } else {
        format!("DELETE FROM {} WHERE {} = {}", table, pk, id_ph)
    };
    q
}
