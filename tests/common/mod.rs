#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tenant_crud::config::{FieldDef, FieldType, TableDef};
use tenant_crud::{
    api_router, resolve, AppConfig, AppState, HeaderIdentityProvider, IdentityProvider, MemoryStore,
    ResourceDescriptor,
};
use tower::ServiceExt;

pub const ORG_A: &str = "org-a";
pub const ORG_B: &str = "org-b";

pub fn descriptors() -> Vec<ResourceDescriptor> {
    vec![
        ResourceDescriptor::new(
            "tasks",
            TableDef::new("tasks")
                .field(FieldDef::text("title"))
                .field(FieldDef::text("description").nullable())
                .field(FieldDef::boolean("completed").default_value(json!(false))),
        )
        .tag("Tasks")
        .dependent("comments"),
        ResourceDescriptor::new(
            "comments",
            TableDef::new("comments")
                .field(FieldDef::text("body"))
                .field(FieldDef::integer("taskId")),
        ),
        ResourceDescriptor::new(
            "expenses",
            TableDef::new("expenses")
                .field(FieldDef::text("title"))
                .field(FieldDef::text("amount"))
                .field(FieldDef::new("date", FieldType::Date)),
        ),
    ]
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
}

pub fn setup_app() -> TestApp {
    setup_app_with(descriptors())
}

pub fn setup_app_with(descriptors: Vec<ResourceDescriptor>) -> TestApp {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let store = Arc::new(MemoryStore::new());
    let registry = resolve(descriptors).expect("descriptors resolve");
    let state = AppState::new(store.clone(), registry, AppConfig::default());
    let identity: Arc<dyn IdentityProvider> = Arc::new(HeaderIdentityProvider);
    TestApp {
        router: api_router(state, identity),
        store,
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub raw: Vec<u8>,
}

impl TestApp {
    /// Request as user `u-<org>` in `org`; `None` sends no identity headers.
    pub async fn request(&self, method: Method, uri: &str, org: Option<&str>, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(org) = org {
            builder = builder
                .header("x-user-id", format!("u-{}", org))
                .header("x-organization-id", org);
        }
        let request = match body {
            Some(b) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let raw = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec();
        let body = if raw.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&raw).unwrap_or(Value::Null)
        };
        TestResponse { status, body, raw }
    }

    pub async fn get(&self, uri: &str, org: &str) -> TestResponse {
        self.request(Method::GET, uri, Some(org), None).await
    }

    pub async fn post(&self, uri: &str, org: &str, body: Value) -> TestResponse {
        self.request(Method::POST, uri, Some(org), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, org: &str, body: Value) -> TestResponse {
        self.request(Method::PATCH, uri, Some(org), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, org: &str) -> TestResponse {
        self.request(Method::DELETE, uri, Some(org), None).await
    }
}
