//! Viewsets: the generic CRUD dispatcher, its override table and route registration.

mod generic;
pub mod operations;
mod request;
mod routes;

pub use generic::ViewSet;
pub use operations::{
    operation, Action, ActionMethod, BeforeCreate, BeforeDestroy, BeforeUpdate, Operation,
    Operations,
};
pub use request::ViewRequest;
pub use routes::{RouteRegistrar, ViewSetBuilder};
