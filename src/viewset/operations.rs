//! The replaceable operation table of a viewset.
//!
//! Each CRUD operation and lifecycle hook is a boxed async function. `Operations::default()`
//! points every slot at the generic implementation on `ViewSet`; a `ViewSetBuilder` swaps
//! individual slots while the rest keep delegating to the generic code.

use crate::entity::{Entity, Row};
use crate::error::AppResult;
use crate::viewset::{ViewRequest, ViewSet};
use axum::response::Response;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;

pub type Operation<T> =
    Arc<dyn Fn(ViewSet<T>, ViewRequest) -> BoxFuture<'static, AppResult<Response>> + Send + Sync>;

/// Runs before insert; may rewrite the object or reject it.
pub type BeforeCreate<T> = Arc<dyn Fn(ViewSet<T>, T) -> BoxFuture<'static, AppResult<T>> + Send + Sync>;

/// Runs before a partial update with the stored object and the changed columns.
pub type BeforeUpdate<T> =
    Arc<dyn Fn(ViewSet<T>, T, Row) -> BoxFuture<'static, AppResult<Row>> + Send + Sync>;

pub type BeforeDestroy<T> = Arc<dyn Fn(ViewSet<T>, T) -> BoxFuture<'static, AppResult<()>> + Send + Sync>;

pub fn operation<T, F, Fut>(f: F) -> Operation<T>
where
    T: Entity,
    F: Fn(ViewSet<T>, ViewRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AppResult<Response>> + Send + 'static,
{
    Arc::new(move |vs: ViewSet<T>, req: ViewRequest| -> BoxFuture<'static, AppResult<Response>> {
        Box::pin(f(vs, req))
    })
}

pub fn before_create<T, F, Fut>(f: F) -> BeforeCreate<T>
where
    T: Entity,
    F: Fn(ViewSet<T>, T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AppResult<T>> + Send + 'static,
{
    Arc::new(move |vs: ViewSet<T>, obj: T| -> BoxFuture<'static, AppResult<T>> { Box::pin(f(vs, obj)) })
}

pub fn before_update<T, F, Fut>(f: F) -> BeforeUpdate<T>
where
    T: Entity,
    F: Fn(ViewSet<T>, T, Row) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AppResult<Row>> + Send + 'static,
{
    Arc::new(
        move |vs: ViewSet<T>, existing: T, changes: Row| -> BoxFuture<'static, AppResult<Row>> {
            Box::pin(f(vs, existing, changes))
        },
    )
}

pub fn before_destroy<T, F, Fut>(f: F) -> BeforeDestroy<T>
where
    T: Entity,
    F: Fn(ViewSet<T>, T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AppResult<()>> + Send + 'static,
{
    Arc::new(move |vs: ViewSet<T>, obj: T| -> BoxFuture<'static, AppResult<()>> { Box::pin(f(vs, obj)) })
}

pub struct Operations<T: Entity> {
    pub list: Operation<T>,
    pub retrieve: Operation<T>,
    pub create: Operation<T>,
    pub update: Operation<T>,
    pub destroy: Operation<T>,
    pub before_create: BeforeCreate<T>,
    pub before_update: BeforeUpdate<T>,
    pub before_destroy: BeforeDestroy<T>,
}

impl<T: Entity> Default for Operations<T> {
    fn default() -> Self {
        Operations {
            list: operation(|vs: ViewSet<T>, req| async move { vs.list(req).await }),
            retrieve: operation(|vs: ViewSet<T>, req| async move { vs.retrieve(req).await }),
            create: operation(|vs: ViewSet<T>, req| async move { vs.create(req).await }),
            update: operation(|vs: ViewSet<T>, req| async move { vs.update(req).await }),
            destroy: operation(|vs: ViewSet<T>, req| async move { vs.destroy(req).await }),
            before_create: before_create(|_, obj: T| async move { Ok(obj) }),
            before_update: before_update(|_, _: T, changes: Row| async move { Ok(changes) }),
            before_destroy: before_destroy(|_, _: T| async move { Ok(()) }),
        }
    }
}

impl<T: Entity> Clone for Operations<T> {
    fn clone(&self) -> Self {
        Operations {
            list: self.list.clone(),
            retrieve: self.retrieve.clone(),
            create: self.create.clone(),
            update: self.update.clone(),
            destroy: self.destroy.clone(),
            before_create: self.before_create.clone(),
            before_update: self.before_update.clone(),
            before_destroy: self.before_destroy.clone(),
        }
    }
}

/// HTTP method(s) a custom action answers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Any,
}

/// A named operation mounted under the viewset's resource path, e.g. `/:id/activate`.
pub struct Action<T: Entity> {
    pub method: ActionMethod,
    pub path: String,
    pub handler: Operation<T>,
}

impl<T: Entity> Clone for Action<T> {
    fn clone(&self) -> Self {
        Action {
            method: self.method,
            path: self.path.clone(),
            handler: self.handler.clone(),
        }
    }
}
