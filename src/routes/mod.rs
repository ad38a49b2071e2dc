//! Route aggregation: common routes plus every resource router under one base path.

pub mod common;
pub mod entity;

pub use common::common_routes;
pub use entity::resource_routes;

use crate::auth::{require_auth, IdentityProvider};
use crate::error;
use crate::state::AppState;
use axum::{
    http::{header, HeaderValue, Method},
    middleware, Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

/// Maximum accepted request body.
pub const BODY_LIMIT_BYTES: usize = 1024 * 1024;

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
}

/// Every resource router behind the identity gate.
pub fn entity_routes(state: &AppState, identity: Arc<dyn IdentityProvider>) -> Router<AppState> {
    let mut router = Router::new();
    for resource in state.registry.iter() {
        router = router.merge(resource_routes(resource.clone()));
    }
    router.route_layer(middleware::from_fn_with_state(identity, require_auth))
}

/// The application's HTTP surface, mounted under the configured base path.
pub fn api_router(state: AppState, identity: Arc<dyn IdentityProvider>) -> Router {
    error::set_environment(state.config.environment);
    let api = common_routes().merge(entity_routes(&state, identity));
    let base = state.config.base_path.clone();
    let app = if base.is_empty() {
        api
    } else {
        Router::new().nest(&base, api)
    };
    app.fallback(common::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors_origins))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .with_state(state)
}
