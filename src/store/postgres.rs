//! PostgreSQL store: renders queries with the safe SQL builder and decodes rows to JSON.

use crate::entity::{timestamp_value, EntityDescriptor, Row};
use crate::error::StoreError;
use crate::query::SelectQuery;
use crate::sql::{self, PgBindValue, QueryBuf};
use crate::store::Store;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_optional(&self, q: &QueryBuf) -> Result<Option<Row>, StoreError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let row = query.fetch_optional(&self.pool).await.map_err(classify)?;
        Ok(row.map(|r| row_to_json(&r)))
    }

    async fn fetch_all(&self, q: &QueryBuf) -> Result<Vec<Row>, StoreError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let rows = query.fetch_all(&self.pool).await.map_err(classify)?;
        Ok(rows.iter().map(row_to_json).collect())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn count(&self, entity: &EntityDescriptor, query: &SelectQuery) -> Result<u64, StoreError> {
        let q = sql::count(entity, query);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut count = sqlx::query_scalar::<_, i64>(&q.sql);
        for p in &q.params {
            count = count.bind(PgBindValue::from_json(p));
        }
        let n = count.fetch_one(&self.pool).await.map_err(classify)?;
        Ok(u64::try_from(n).unwrap_or(0))
    }

    async fn find(&self, entity: &EntityDescriptor, query: &SelectQuery) -> Result<Vec<Row>, StoreError> {
        self.fetch_all(&sql::select_list(entity, query)).await
    }

    async fn find_by_id(&self, entity: &EntityDescriptor, id: i64) -> Result<Option<Row>, StoreError> {
        self.fetch_optional(&sql::select_by_id(entity, id)).await
    }

    async fn insert(&self, entity: &EntityDescriptor, row: Row) -> Result<Row, StoreError> {
        self.fetch_optional(&sql::insert(entity, &row))
            .await?
            .ok_or(StoreError::Db(sqlx::Error::RowNotFound))
    }

    async fn update(
        &self,
        entity: &EntityDescriptor,
        id: i64,
        changes: Row,
    ) -> Result<Option<Row>, StoreError> {
        self.fetch_optional(&sql::update(entity, id, &changes)).await
    }

    async fn delete(&self, entity: &EntityDescriptor, id: i64) -> Result<bool, StoreError> {
        let q = sql::delete(entity, id);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let done = query.execute(&self.pool).await.map_err(classify)?;
        Ok(done.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// PostgreSQL unique violations (SQLSTATE 23505) become `UniqueViolation`; the rest stay opaque.
fn classify(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") {
            return StoreError::UniqueViolation {
                field: db_err.constraint().unwrap_or("unknown").to_string(),
            };
        }
    }
    StoreError::Db(err)
}

fn row_to_json(row: &sqlx::postgres::PgRow) -> Row {
    use sqlx::Column;
    use sqlx::Row as _;
    let mut map = Row::new();
    for col in row.columns() {
        let name = col.name();
        map.insert(name.to_string(), cell_to_value(row, name));
    }
    map
}

fn cell_to_value(row: &sqlx::postgres::PgRow, name: &str) -> Value {
    use sqlx::Row as _;
    if let Ok(v) = row.try_get::<Option<i64>, _>(name) {
        return v.map_or(Value::Null, Value::from);
    }
    if let Ok(v) = row.try_get::<Option<i32>, _>(name) {
        return v.map_or(Value::Null, Value::from);
    }
    if let Ok(v) = row.try_get::<Option<i16>, _>(name) {
        return v.map_or(Value::Null, Value::from);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(name) {
        return v
            .and_then(serde_json::Number::from_f64)
            .map_or(Value::Null, Value::Number);
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(name) {
        return v.map_or(Value::Null, Value::Bool);
    }
    if let Ok(v) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name) {
        return v.map_or(Value::Null, timestamp_value);
    }
    if let Ok(v) = row.try_get::<Option<chrono::NaiveDateTime>, _>(name) {
        return v.map_or(Value::Null, |d| {
            Value::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
        });
    }
    if let Ok(v) = row.try_get::<Option<uuid::Uuid>, _>(name) {
        return v.map_or(Value::Null, |u| Value::String(u.to_string()));
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(name) {
        return v.map_or(Value::Null, Value::String);
    }
    if let Ok(v) = row.try_get::<Option<Value>, _>(name) {
        return v.unwrap_or(Value::Null);
    }
    Value::Null
}
