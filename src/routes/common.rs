//! Common routes: health, readiness, version, docs. Public, outside the auth gate.

use crate::openapi::{build_document, DocInfo};
use crate::response::failure;
use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;

#[derive(Serialize)]
struct HealthBody {
    success: bool,
    status: &'static str,
}

#[derive(Serialize)]
struct ReadyBody {
    success: bool,
    status: &'static str,
    store: &'static str,
}

async fn health() -> Json<HealthBody> {
    Json(HealthBody {
        success: true,
        status: "OK",
    })
}

async fn ready(State(state): State<AppState>) -> Result<Json<ReadyBody>, (StatusCode, Json<ReadyBody>)> {
    if let Err(e) = state.store.ping().await {
        tracing::warn!(error = %e, "readiness check failed");
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyBody {
                success: false,
                status: "degraded",
                store: "unavailable",
            }),
        ));
    }
    Ok(Json(ReadyBody {
        success: true,
        status: "OK",
        store: "ok",
    }))
}

async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn docs(State(state): State<AppState>) -> Response {
    let server = match state.config.base_path.as_str() {
        "" => "/".to_string(),
        base => base.to_string(),
    };
    let info = DocInfo::new("Tenant CRUD API", env!("CARGO_PKG_VERSION"), server);
    Json(build_document(&state.registry, &info)).into_response()
}

pub async fn not_found() -> Response {
    failure(StatusCode::NOT_FOUND, "Not Found")
}

/// GET /health, /ready, /version, /docs.
pub fn common_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/version", get(version))
        .route("/docs", get(docs))
}
