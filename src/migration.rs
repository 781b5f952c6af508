//! Apply entity descriptors to the database: tables, unique indexes, soft-delete indexes.

use crate::config::validate_descriptor;
use crate::entity::{EntityDescriptor, FieldDef, FieldKind, CREATED_AT, DELETED_AT, UPDATED_AT};
use crate::error::AppError;
use crate::sql::quoted;
use serde_json::Value;
use sqlx::PgPool;

fn literal(v: &Value) -> String {
    match v {
        Value::Null => "NULL".to_string(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("'{}'", s.replace('\'', "''")),
        other => format!("'{}'::jsonb", other.to_string().replace('\'', "''")),
    }
}

fn column_def(f: &FieldDef) -> String {
    if f.primary_key {
        return format!("{} BIGSERIAL PRIMARY KEY", quoted(&f.name));
    }
    let typ = match (f.kind, f.max_length) {
        (FieldKind::Text, Some(n)) => format!("VARCHAR({})", n),
        (kind, _) => kind.sql_type().to_uppercase(),
    };
    let mut def = format!("{} {}", quoted(&f.name), typ);
    if !f.nullable {
        def.push_str(" NOT NULL");
    }
    if let Some(v) = &f.default {
        def.push_str(&format!(" DEFAULT {}", literal(v)));
    } else if f.name == CREATED_AT || f.name == UPDATED_AT {
        def.push_str(" DEFAULT NOW()");
    }
    def
}

/// DDL statements for one entity, in execution order. Idempotent (`IF NOT EXISTS`).
///
/// Unique fields get a unique index; on soft-delete tables it only covers live rows.
pub fn create_table_sql(entity: &EntityDescriptor) -> Vec<String> {
    let table = quoted(&entity.table);
    let cols: Vec<String> = entity.fields.iter().map(column_def).collect();
    let mut stmts = vec![format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
        table,
        cols.join(",\n    ")
    )];
    let live = if entity.soft_delete {
        format!(" WHERE {} IS NULL", quoted(DELETED_AT))
    } else {
        String::new()
    };
    for f in entity.unique_fields() {
        stmts.push(format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS {} ON {} ({}){}",
            quoted(&format!("uq_{}_{}", entity.table, f.name)),
            table,
            quoted(&f.name),
            live
        ));
    }
    if entity.soft_delete {
        stmts.push(format!(
            "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
            quoted(&format!("idx_{}_{}", entity.table, DELETED_AT)),
            table,
            quoted(DELETED_AT)
        ));
    }
    stmts
}

/// Validate and create every entity's table. Safe to run on each start.
pub async fn apply_migrations(pool: &PgPool, entities: &[EntityDescriptor]) -> Result<(), AppError> {
    for entity in entities {
        validate_descriptor(entity)?;
        for stmt in create_table_sql(entity) {
            tracing::debug!(sql = %stmt, "migration");
            sqlx::query(&stmt)
                .execute(pool)
                .await
                .map_err(|e| AppError::Internal(format!("migrate {}: {}", entity.table, e)))?;
        }
        tracing::info!(table = %entity.table, "table ready");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn users() -> EntityDescriptor {
        EntityDescriptor::new("users")
            .field(FieldDef::new("name", FieldKind::Text).not_null().max_length(100))
            .field(FieldDef::new("email", FieldKind::Text).not_null().unique())
            .field(FieldDef::new("status", FieldKind::Text).default_value(json!("in'active")))
            .field(FieldDef::new("age", FieldKind::Int).default_value(json!(0)))
            .timestamps()
            .soft_delete()
    }

    #[test]
    fn renders_table_ddl() {
        let stmts = create_table_sql(&users());
        let ddl = &stmts[0];
        assert!(ddl.starts_with("CREATE TABLE IF NOT EXISTS \"users\""));
        assert!(ddl.contains("\"id\" BIGSERIAL PRIMARY KEY"));
        assert!(ddl.contains("\"name\" VARCHAR(100) NOT NULL"));
        assert!(ddl.contains("\"status\" TEXT DEFAULT 'in''active'"));
        assert!(ddl.contains("\"age\" BIGINT DEFAULT 0"));
        assert!(ddl.contains("\"created_at\" TIMESTAMPTZ DEFAULT NOW()"));
        assert!(ddl.contains("\"deleted_at\" TIMESTAMPTZ"));
    }

    #[test]
    fn unique_index_covers_live_rows_only() {
        let stmts = create_table_sql(&users());
        assert_eq!(
            stmts[1],
            "CREATE UNIQUE INDEX IF NOT EXISTS \"uq_users_email\" ON \"users\" (\"email\") WHERE \"deleted_at\" IS NULL"
        );
        assert_eq!(stmts.len(), 3);
    }
}
