//! Viewset SDK: generic REST viewsets over typed entities.
//!
//! Declare an [`Entity`], build a [`ViewSet`] over a [`Store`], and mount its router to get
//! list/retrieve/create/update/destroy endpoints with pagination, filtering and ordering.

pub mod config;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod migration;
pub mod models;
pub mod query;
pub mod response;
pub mod routes;
pub mod sql;
pub mod state;
pub mod store;
pub mod viewset;

pub use config::{validate_descriptor, ServerConfig};
pub use entity::{Entity, EntityDescriptor, FieldDef, FieldKind, Row, ValidationRule};
pub use error::{AppError, AppResult, ConfigError, StoreError};
pub use migration::apply_migrations;
pub use response::{success, success_with_pagination, Envelope, PaginationMeta};
pub use routes::{app_router, common_routes, common_routes_with_ready};
pub use state::AppState;
pub use store::{MemoryStore, PgStore, Store};
pub use viewset::{ActionMethod, ViewRequest, ViewSet, ViewSetBuilder};
