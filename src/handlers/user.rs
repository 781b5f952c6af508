//! User viewset: generic CRUD with an email pre-check on create, keyword search on list and
//! status actions.

use crate::entity::Row;
use crate::error::{AppError, AppResult, ConfigError};
use crate::models::user::{User, STATUS_ACTIVE, STATUS_INACTIVE};
use crate::query::{apply_search, SelectQuery};
use crate::response::success;
use crate::store::Store;
use crate::viewset::{ActionMethod, ViewRequest, ViewSet};
use axum::response::Response;
use serde_json::json;
use std::sync::Arc;

/// Fields matched by `?keyword=`.
pub const SEARCH_FIELDS: &[&str] = &["name", "email", "phone"];

pub fn user_viewset(store: Arc<dyn Store>) -> Result<ViewSet<User>, ConfigError> {
    ViewSet::<User>::builder(store)
        .override_list(list)
        .override_create(create)
        .action(ActionMethod::Post, "/:id/activate", activate)
        .action(ActionMethod::Post, "/:id/deactivate", deactivate)
        .action(ActionMethod::Post, "/:id/reset_password", reset_password)
        .action(ActionMethod::Get, "/stats", stats)
        .build()
}

/// GET /users/?keyword=... : OR substring match over `SEARCH_FIELDS`, then the generic filters.
pub async fn list(vs: ViewSet<User>, req: ViewRequest) -> AppResult<Response> {
    let keyword = req.query.get_non_empty("keyword").map(str::to_string);
    vs.list_with(&req, &["keyword"], move |query| match keyword {
        Some(term) => apply_search(query, &term, SEARCH_FIELDS),
        None => query,
    })
    .await
}

/// POST /users/ with a duplicate-email check and `inactive` as the default status.
///
/// The check is best effort; a concurrent duplicate still hits the unique index.
pub async fn create(vs: ViewSet<User>, req: ViewRequest) -> AppResult<Response> {
    let mut user = vs.validated_body(&req)?;
    if vs.count_where("email", json!(user.email)).await? > 0 {
        return Err(AppError::BadRequest("email already registered".into()));
    }
    if user.status.is_empty() {
        user.status = STATUS_INACTIVE.to_string();
    }
    let created = vs.perform_create(user).await?;
    Ok(success(created))
}

async fn set_status(
    vs: ViewSet<User>,
    req: ViewRequest,
    status: &str,
    message: &str,
) -> AppResult<Response> {
    let id = req.id()?;
    let user = vs.get_object_or_404(id).await?;
    let mut changes = Row::new();
    changes.insert("status".into(), json!(status));
    let user = vs.perform_update(id, user, changes).await?;
    Ok(success(json!({ "message": message, "user": user })))
}

/// POST /users/:id/activate
pub async fn activate(vs: ViewSet<User>, req: ViewRequest) -> AppResult<Response> {
    set_status(vs, req, STATUS_ACTIVE, "user activated").await
}

/// POST /users/:id/deactivate
pub async fn deactivate(vs: ViewSet<User>, req: ViewRequest) -> AppResult<Response> {
    set_status(vs, req, STATUS_INACTIVE, "user deactivated").await
}

/// POST /users/:id/reset_password. Acknowledges only; no password is stored.
pub async fn reset_password(vs: ViewSet<User>, req: ViewRequest) -> AppResult<Response> {
    let user = vs.get_object_or_404(req.id()?).await?;
    Ok(success(json!({
        "message": "password reset email sent",
        "user_id": user.id,
        "email": user.email,
    })))
}

/// GET /users/stats
pub async fn stats(vs: ViewSet<User>, _req: ViewRequest) -> AppResult<Response> {
    let total = vs.count(SelectQuery::new()).await?;
    let active = vs.count_where("status", json!(STATUS_ACTIVE)).await?;
    let inactive = vs.count_where("status", json!(STATUS_INACTIVE)).await?;
    Ok(success(json!({
        "total": total,
        "active": active,
        "inactive": inactive,
    })))
}

fn sample_users() -> Vec<User> {
    [
        ("Zhang San", "zhangsan@example.com", STATUS_ACTIVE, 25, "13800138000"),
        ("Li Si", "lisi@example.com", STATUS_ACTIVE, 30, "13800138001"),
        ("Wang Wu", "wangwu@example.com", STATUS_INACTIVE, 28, "13800138002"),
    ]
    .into_iter()
    .map(|(name, email, status, age, phone)| User {
        name: name.into(),
        email: email.into(),
        status: status.into(),
        age,
        phone: phone.into(),
        ..Default::default()
    })
    .collect()
}

/// Insert three sample users when the table has no live rows. Returns how many were created.
pub async fn seed_sample_users(vs: &ViewSet<User>) -> AppResult<usize> {
    if vs.count(SelectQuery::new()).await? > 0 {
        return Ok(0);
    }
    let users = sample_users();
    let n = users.len();
    for user in users {
        vs.perform_create(user).await?;
    }
    tracing::info!(count = n, "sample users created");
    Ok(n)
}
