//! Viewset construction and route registration.

use crate::config::{compile_rules, validate_descriptor};
use crate::entity::{Entity, EntityDescriptor, Row};
use crate::error::{AppResult, ConfigError};
use crate::store::Store;
use crate::viewset::generic::Inner;
use crate::viewset::operations::{before_create, before_destroy, before_update, operation};
use crate::viewset::{Action, ActionMethod, Operation, Operations, ViewRequest, ViewSet};
use axum::{
    handler::Handler,
    response::Response,
    routing::{any, delete, get, patch, post, put, MethodRouter},
    Router,
};
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;

/// Replaces the default route table; receives the built viewset.
pub type RouteRegistrar<T> = Arc<dyn Fn(&ViewSet<T>) -> Router + Send + Sync>;

impl ActionMethod {
    fn route<H, X>(self, handler: H) -> MethodRouter
    where
        H: Handler<X, ()>,
        X: 'static,
    {
        match self {
            ActionMethod::Get => get(handler),
            ActionMethod::Post => post(handler),
            ActionMethod::Put => put(handler),
            ActionMethod::Patch => patch(handler),
            ActionMethod::Delete => delete(handler),
            ActionMethod::Any => any(handler),
        }
    }
}

pub struct ViewSetBuilder<T: Entity> {
    store: Arc<dyn Store>,
    entity: EntityDescriptor,
    ops: Operations<T>,
    actions: Vec<Action<T>>,
    routes: Option<RouteRegistrar<T>>,
}

impl<T: Entity> ViewSetBuilder<T> {
    pub fn new(store: Arc<dyn Store>) -> Self {
        ViewSetBuilder {
            store,
            entity: T::descriptor(),
            ops: Operations::default(),
            actions: Vec::new(),
            routes: None,
        }
    }

    pub fn override_list<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(ViewSet<T>, ViewRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<Response>> + Send + 'static,
    {
        self.ops.list = operation(f);
        self
    }

    pub fn override_retrieve<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(ViewSet<T>, ViewRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<Response>> + Send + 'static,
    {
        self.ops.retrieve = operation(f);
        self
    }

    pub fn override_create<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(ViewSet<T>, ViewRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<Response>> + Send + 'static,
    {
        self.ops.create = operation(f);
        self
    }

    pub fn override_update<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(ViewSet<T>, ViewRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<Response>> + Send + 'static,
    {
        self.ops.update = operation(f);
        self
    }

    pub fn override_destroy<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(ViewSet<T>, ViewRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<Response>> + Send + 'static,
    {
        self.ops.destroy = operation(f);
        self
    }

    pub fn before_create<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(ViewSet<T>, T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<T>> + Send + 'static,
    {
        self.ops.before_create = before_create(f);
        self
    }

    pub fn before_update<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(ViewSet<T>, T, Row) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<Row>> + Send + 'static,
    {
        self.ops.before_update = before_update(f);
        self
    }

    pub fn before_destroy<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(ViewSet<T>, T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<()>> + Send + 'static,
    {
        self.ops.before_destroy = before_destroy(f);
        self
    }

    /// Mount a custom operation at `path` relative to the resource, e.g. `/:id/activate` or `/stats`.
    pub fn action<F, Fut>(mut self, method: ActionMethod, path: &str, f: F) -> Self
    where
        F: Fn(ViewSet<T>, ViewRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<Response>> + Send + 'static,
    {
        self.actions.push(Action {
            method,
            path: format!("/{}", path.trim_start_matches('/')),
            handler: operation(f),
        });
        self
    }

    /// Replace route registration. The registrar can start from `ViewSet::default_routes`.
    pub fn routes<F>(mut self, f: F) -> Self
    where
        F: Fn(&ViewSet<T>) -> Router + Send + Sync + 'static,
    {
        self.routes = Some(Arc::new(f));
        self
    }

    /// Validate the descriptor, compile its rule patterns and freeze the viewset.
    pub fn build(self) -> Result<ViewSet<T>, ConfigError> {
        let mut entity = self.entity;
        validate_descriptor(&entity)?;
        compile_rules(&mut entity)?;
        Ok(ViewSet {
            inner: Arc::new(Inner {
                store: self.store,
                entity,
                ops: self.ops,
                actions: self.actions,
                routes: self.routes,
            }),
        })
    }
}

impl<T: Entity> ViewSet<T> {
    pub fn builder(store: Arc<dyn Store>) -> ViewSetBuilder<T> {
        ViewSetBuilder::new(store)
    }

    /// Viewset with every operation left at its generic implementation.
    pub fn new(store: Arc<dyn Store>) -> Result<Self, ConfigError> {
        Self::builder(store).build()
    }

    pub fn actions(&self) -> &[Action<T>] {
        &self.inner.actions
    }

    /// Router for this viewset, through the custom registrar when one was set.
    pub fn router(&self) -> Router {
        match &self.inner.routes {
            Some(register) => register(self),
            None => self.default_routes(),
        }
    }

    /// `/{resource}` and `/{resource}/` for list and create, `/{resource}/:id` for retrieve,
    /// update and destroy, plus every custom action under `/{resource}`.
    pub fn default_routes(&self) -> Router {
        let ops = self.operations();
        let base = format!("/{}", self.entity().resource);
        let collection = get(self.endpoint("list", ops.list.clone()))
            .post(self.endpoint("create", ops.create.clone()));
        let item = get(self.endpoint("retrieve", ops.retrieve.clone()))
            .put(self.endpoint("update", ops.update.clone()))
            .delete(self.endpoint("destroy", ops.destroy.clone()));

        let mut router = Router::new()
            .route(&base, collection.clone())
            .route(&format!("{}/", base), collection)
            .route(&format!("{}/:id", base), item);
        for action in self.actions() {
            let path = format!("{}{}", base, action.path);
            tracing::debug!(resource = %self.entity().resource, path = %path, method = ?action.method, "action registered");
            router = router.route(&path, action.method.route(self.endpoint("action", action.handler.clone())));
        }
        router
    }

    /// An axum handler that runs `op` against this viewset.
    pub fn endpoint(
        &self,
        name: &'static str,
        op: Operation<T>,
    ) -> impl Fn(ViewRequest) -> BoxFuture<'static, AppResult<Response>> + Clone + Send + Sync + 'static
    {
        let vs = self.clone();
        move |req: ViewRequest| {
            tracing::debug!(resource = %vs.entity().resource, operation = name, "dispatch");
            op(vs.clone(), req)
        }
    }
}
