//! Tenant CRUD: descriptor-driven, multi-tenant REST backend library.
//!
//! Each [`config::ResourceDescriptor`] is turned into validation schemas, five route
//! descriptors, tenant-scoped soft-delete-aware handlers and OpenAPI documentation.

pub mod auth;
pub mod case;
pub mod config;
pub mod error;
pub mod handlers;
pub mod migration;
pub mod openapi;
pub mod response;
pub mod route_config;
pub mod routes;
pub mod schema;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;
pub mod tenant;

pub use auth::{HeaderIdentityProvider, Identity, IdentityProvider, RequestContext};
pub use config::{load_descriptors, resolve, AppConfig, Environment, ResourceDescriptor, ResourceRegistry};
pub use error::{AppError, ConfigError, StoreError};
pub use migration::ensure_tables;
pub use openapi::{build_document, DocInfo};
pub use route_config::{build_routes, RouteDescriptor, RouteSet};
pub use routes::{api_router, common_routes, resource_routes};
pub use schema::{derive_all, DerivedSchemas, ObjectSchema};
pub use service::{CrudService, PageRequest, Pagination};
pub use state::AppState;
pub use store::{ensure_database_exists, MemoryStore, PgStore, RecordStore};
pub use tenant::TenantScope;
