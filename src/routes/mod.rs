pub mod common;

pub use common::{common_routes, common_routes_with_ready};

use crate::error::ConfigError;
use crate::handlers::user_viewset;
use crate::state::AppState;
use axum::Router;

/// Every viewset mounted by the server, relative to the API prefix.
pub fn api_routes(state: &AppState) -> Result<Router, ConfigError> {
    let users = user_viewset(state.store.clone())?;
    Ok(Router::new().merge(users.router()))
}

/// Common routes at the root plus the API under `config.api_prefix`. No middleware layers.
pub fn app_router(state: AppState) -> Result<Router, ConfigError> {
    let api = api_routes(&state)?;
    let prefix = state.config.api_prefix.clone();
    let router = common_routes_with_ready(state);
    Ok(if prefix == "/" {
        router.merge(api)
    } else {
        router.nest(&prefix, api)
    })
}
