//! Generic CRUD over any `Entity`: list, retrieve, create, update, destroy.
//!
//! These are the default implementations behind every viewset route. Overrides registered on a
//! `ViewSetBuilder` replace the route's entry in the operation table but can still call these
//! methods to reuse the generic behavior.

use crate::entity::payload::{from_row, insert_row, to_row, update_changes};
use crate::entity::{Entity, EntityDescriptor, RequestValidator, Row};
use crate::error::{AppError, AppResult};
use crate::query::{
    apply_filters, apply_order, apply_pagination, build_pagination, extract_filters,
    extract_pagination, SelectQuery,
};
use crate::response::{success, success_with_pagination};
use crate::store::Store;
use crate::viewset::{Action, Operations, RouteRegistrar, ViewRequest};
use axum::response::Response;
use serde_json::{json, Value};
use std::sync::Arc;

pub(crate) struct Inner<T: Entity> {
    pub(crate) store: Arc<dyn Store>,
    pub(crate) entity: EntityDescriptor,
    pub(crate) ops: Operations<T>,
    pub(crate) actions: Vec<Action<T>>,
    pub(crate) routes: Option<RouteRegistrar<T>>,
}

/// A viewset bound to one entity type and one store. Cheap to clone.
pub struct ViewSet<T: Entity> {
    pub(crate) inner: Arc<Inner<T>>,
}

impl<T: Entity> Clone for ViewSet<T> {
    fn clone(&self) -> Self {
        ViewSet {
            inner: Arc::clone(&self.inner),
        }
    }
}

fn decode<T: Entity>(body: Row) -> AppResult<T> {
    serde_json::from_value(Value::Object(body))
        .map_err(|e| AppError::BadRequest(format!("invalid request body: {}", e)))
}

impl<T: Entity> ViewSet<T> {
    pub fn entity(&self) -> &EntityDescriptor {
        &self.inner.entity
    }

    pub fn store(&self) -> &dyn Store {
        self.inner.store.as_ref()
    }

    pub fn operations(&self) -> &Operations<T> {
        &self.inner.ops
    }

    /// List with the default parameter handling.
    pub async fn list(&self, req: ViewRequest) -> AppResult<Response> {
        self.list_with(&req, &[], |query| query).await
    }

    /// List, excluding extra keys from the equality filters and letting the caller add
    /// predicates before the generic filters are applied.
    ///
    /// The total is counted on the filtered query before order and window are applied.
    pub async fn list_with<F>(
        &self,
        req: &ViewRequest,
        exclude: &[&str],
        customize: F,
    ) -> AppResult<Response>
    where
        F: FnOnce(SelectQuery) -> SelectQuery + Send,
    {
        let entity = self.entity();
        let pagination = extract_pagination(&req.query);
        let filters = extract_filters(&req.query, exclude);

        let query = customize(SelectQuery::new());
        let query = apply_filters(query, entity, &filters)?;
        let total = self
            .store()
            .count(entity, &query)
            .await
            .map_err(|e| AppError::storage("count failed", e))?;
        let query = apply_order(query, entity, filters.order.as_ref())?;
        let query = apply_pagination(query, &pagination);
        let rows = self
            .store()
            .find(entity, &query)
            .await
            .map_err(|e| AppError::storage("query failed", e))?;
        let items = rows
            .into_iter()
            .map(from_row::<T>)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(resource = %entity.resource, total, returned = items.len(), "list");
        Ok(success_with_pagination(items, build_pagination(&pagination, total)))
    }

    pub async fn retrieve(&self, req: ViewRequest) -> AppResult<Response> {
        let id = req.id()?;
        let obj = self.get_object_or_404(id).await?;
        Ok(success(obj))
    }

    pub async fn create(&self, req: ViewRequest) -> AppResult<Response> {
        let obj = self.validated_body(&req)?;
        let created = self.perform_create(obj).await?;
        Ok(success(created))
    }

    /// Partial update: only non-zero fields of the body overwrite the stored row.
    pub async fn update(&self, req: ViewRequest) -> AppResult<Response> {
        let id = req.id()?;
        let existing = self.get_object_or_404(id).await?;
        let patch: T = decode(req.json_object()?)?;
        let changes = update_changes(self.entity(), to_row(&patch)?);
        RequestValidator::validate_partial(&changes, &self.entity().validation)?;
        let updated = self.perform_update(id, existing, changes).await?;
        Ok(success(updated))
    }

    pub async fn destroy(&self, req: ViewRequest) -> AppResult<Response> {
        let id = req.id()?;
        let obj = self.get_object_or_404(id).await?;
        self.perform_destroy(id, obj).await?;
        Ok(success(json!({ "message": "deleted" })))
    }

    /// Body checked against the full rule set and decoded into a new object.
    pub fn validated_body(&self, req: &ViewRequest) -> AppResult<T> {
        let body = req.json_object()?;
        RequestValidator::validate(&body, &self.entity().validation)?;
        decode(body)
    }

    /// Fetch one live object by primary key; `NotFound` when there is none.
    pub async fn get_object_or_404(&self, id: i64) -> AppResult<T> {
        let row = self
            .store()
            .find_by_id(self.entity(), id)
            .await
            .map_err(|e| AppError::storage("query failed", e))?
            .ok_or_else(|| AppError::NotFound("record not found".into()))?;
        Ok(from_row(row)?)
    }

    /// Run the create hook, insert and return the stored object with generated fields.
    pub async fn perform_create(&self, obj: T) -> AppResult<T> {
        let obj = (self.operations().before_create)(self.clone(), obj).await?;
        let row = insert_row(self.entity(), to_row(&obj)?);
        let stored = self
            .store()
            .insert(self.entity(), row)
            .await
            .map_err(|e| AppError::storage("create failed", e))?;
        tracing::debug!(resource = %self.entity().resource, id = ?stored.get(&self.entity().pk), "created");
        Ok(from_row(stored)?)
    }

    /// Run the update hook, write the changed columns and re-read the row.
    pub async fn perform_update(&self, id: i64, existing: T, changes: Row) -> AppResult<T> {
        let changes = (self.operations().before_update)(self.clone(), existing, changes).await?;
        if !changes.is_empty() {
            let written = self
                .store()
                .update(self.entity(), id, changes)
                .await
                .map_err(|e| AppError::storage("update failed", e))?;
            if written.is_none() {
                return Err(AppError::NotFound("record not found".into()));
            }
            tracing::debug!(resource = %self.entity().resource, id, "updated");
        }
        self.get_object_or_404(id).await
    }

    pub async fn perform_destroy(&self, id: i64, obj: T) -> AppResult<()> {
        (self.operations().before_destroy)(self.clone(), obj).await?;
        let deleted = self
            .store()
            .delete(self.entity(), id)
            .await
            .map_err(|e| AppError::storage("delete failed", e))?;
        if !deleted {
            return Err(AppError::NotFound("record not found".into()));
        }
        tracing::debug!(resource = %self.entity().resource, id, "deleted");
        Ok(())
    }

    /// Number of live rows where `field = value`.
    pub async fn count_where(&self, field: &str, value: Value) -> AppResult<u64> {
        self.count(SelectQuery::new().filter(field, value)).await
    }

    pub async fn count(&self, query: SelectQuery) -> AppResult<u64> {
        self.store()
            .count(self.entity(), &query)
            .await
            .map_err(|e| AppError::storage("count failed", e))
    }
}
