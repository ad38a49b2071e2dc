//! Resource routes built from route descriptors. Disabled operations register nothing.

use crate::config::{Operation, ResolvedResource};
use crate::handlers::entity;
use crate::state::AppState;
use axum::{routing::MethodRouter, Extension, Router};
use std::collections::BTreeMap;
use std::sync::Arc;

fn handler_for(op: Operation) -> MethodRouter<AppState> {
    match op {
        Operation::List => axum::routing::get(entity::list),
        Operation::Get => axum::routing::get(entity::get_one),
        Operation::Create => axum::routing::post(entity::create),
        Operation::Patch => axum::routing::patch(entity::patch),
        Operation::Delete => axum::routing::delete(entity::delete),
    }
}

/// One handler per enabled route descriptor of `resource`.
pub fn resource_routes(resource: Arc<ResolvedResource>) -> Router<AppState> {
    let mut by_path: BTreeMap<String, MethodRouter<AppState>> = BTreeMap::new();
    for route in resource.routes.iter() {
        let path = route.axum_path();
        let method_router = match by_path.remove(&path) {
            Some(existing) => existing.merge(handler_for(route.operation)),
            None => handler_for(route.operation),
        };
        by_path.insert(path, method_router);
    }

    let mut router = Router::new();
    for (path, method_router) in by_path {
        router = router.route(&path, method_router);
    }
    tracing::debug!(
        entity = %resource.name(),
        routes = resource.routes.len(),
        "routes created for entity"
    );
    router.layer(Extension(resource))
}
