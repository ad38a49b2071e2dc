//! Entity CRUD handlers: list, get, create, patch, delete.
//!
//! The resource a handler serves is attached to its router as an extension. Requests are
//! validated against the schemas of that resource's route descriptors before the service runs.

use crate::auth::RequestContext;
use crate::config::{Operation, ResolvedResource};
use crate::error::{AppError, ValidationError};
use crate::response::{no_content, success_created, success_one, success_page};
use crate::route_config::RouteDescriptor;
use crate::service::{CrudService, PageRequest};
use crate::state::AppState;
use crate::store::Record;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

pub type Resource = Extension<Arc<ResolvedResource>>;

fn route(resource: &ResolvedResource, op: Operation) -> Result<&RouteDescriptor, AppError> {
    resource
        .routes
        .get(op)
        .ok_or_else(|| AppError::Internal(format!("{:?} is not enabled for {}", op, resource.name())))
}

fn validated_id(route: &RouteDescriptor, raw: &HashMap<String, String>) -> Result<i64, AppError> {
    let Some(schema) = &route.request.params else {
        return Err(AppError::Internal(format!("{} has no path parameters", route.path)));
    };
    let params = schema.validate_coerced(raw)?;
    params
        .get("id")
        .and_then(Value::as_i64)
        .ok_or_else(|| AppError::Internal("validated id is not an integer".into()))
}

fn validated_body(route: &RouteDescriptor, body: Result<Json<Value>, JsonRejection>) -> Result<Record, AppError> {
    let Json(value) = body.map_err(|rejection| ValidationError::single("invalid_json", Vec::new(), rejection.body_text()))?;
    let Some(spec) = &route.request.body else {
        return Err(AppError::Internal(format!("{} {} has no request body", route.method, route.path)));
    };
    Ok(spec.schema.validate(&value)?)
}

pub async fn list(
    State(state): State<AppState>,
    Extension(resource): Resource,
    ctx: RequestContext,
    Query(raw): Query<HashMap<String, String>>,
) -> Result<Response, AppError> {
    let route = route(&resource, Operation::List)?;
    let query = match &route.request.query {
        Some(schema) => schema.validate_coerced(&raw)?,
        None => Record::new(),
    };
    let page = PageRequest::from_query(&query);
    let result = CrudService::list(state.store.as_ref(), &resource, &ctx.scope(), page).await?;
    Ok(success_page(result.data, result.pagination).into_response())
}

pub async fn get_one(
    State(state): State<AppState>,
    Extension(resource): Resource,
    ctx: RequestContext,
    Path(raw): Path<HashMap<String, String>>,
) -> Result<Response, AppError> {
    let id = validated_id(route(&resource, Operation::Get)?, &raw)?;
    let row = CrudService::get(state.store.as_ref(), &resource, &ctx.scope(), id).await?;
    Ok(success_one(row).into_response())
}

pub async fn create(
    State(state): State<AppState>,
    Extension(resource): Resource,
    ctx: RequestContext,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, AppError> {
    let values = validated_body(route(&resource, Operation::Create)?, body)?;
    let row = CrudService::create(state.store.as_ref(), &resource, &ctx.scope(), values).await?;
    Ok(success_created(row).into_response())
}

pub async fn patch(
    State(state): State<AppState>,
    Extension(resource): Resource,
    ctx: RequestContext,
    Path(raw): Path<HashMap<String, String>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, AppError> {
    let route = route(&resource, Operation::Patch)?;
    let id = validated_id(route, &raw)?;
    let values = validated_body(route, body)?;
    let row = CrudService::patch(state.store.as_ref(), &resource, &ctx.scope(), id, values).await?;
    Ok(success_one(row).into_response())
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(resource): Resource,
    ctx: RequestContext,
    Path(raw): Path<HashMap<String, String>>,
) -> Result<Response, AppError> {
    let id = validated_id(route(&resource, Operation::Delete)?, &raw)?;
    CrudService::delete(state.store.as_ref(), &resource, &ctx.scope(), id).await?;
    Ok(no_content())
}
