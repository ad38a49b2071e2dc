//! Typed errors and HTTP mapping.

use crate::config::Environment;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::OnceLock;
use thiserror::Error;

/// Message returned when no identity could be attached to a request.
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized. You are not logged in.";

static ENVIRONMENT: OnceLock<Environment> = OnceLock::new();

/// Record the environment 500 bodies are rendered for. The first call wins.
pub fn set_environment(environment: Environment) {
    if ENVIRONMENT.set(environment).is_err() && ENVIRONMENT.get() != Some(&environment) {
        tracing::warn!(
            requested = environment.as_str(),
            "error environment already recorded, keeping the first one"
        );
    }
}

/// Recorded environment, else `APP_ENV`.
fn environment() -> Environment {
    ENVIRONMENT.get().copied().unwrap_or_else(Environment::current)
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing reference: {kind} '{id}'")]
    MissingReference { kind: &'static str, id: String },
    #[error("duplicate {kind}: {name}")]
    Duplicate { kind: &'static str, name: String },
    #[error("reserved column name '{column}' declared on table {table}")]
    ReservedColumn { table: String, column: String },
    #[error("invalid relation {parent} -> {child}: {reason}")]
    InvalidRelation {
        parent: String,
        child: String,
        reason: String,
    },
    #[error("schema: {0}")]
    Schema(String),
    #[error("environment variable {name}: {reason}")]
    Env { name: &'static str, reason: String },
    #[error("config load: {0}")]
    Load(String),
    #[error("validation: {0}")]
    Validation(String),
}

/// Failures surfaced by a [`crate::store::RecordStore`] implementation.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("unknown table: {0}")]
    UnknownTable(String),
    #[error("insert into {0} returned no row")]
    NoRowReturned(String),
    #[error("store: {0}")]
    Other(String),
}

/// One item of a validation failure, addressed by its path inside the input.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ValidationIssue {
    pub code: String,
    pub path: Vec<PathSegment>,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(s: &str) -> Self {
        PathSegment::Key(s.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(i: usize) -> Self {
        PathSegment::Index(i)
    }
}

impl ValidationIssue {
    pub fn new(code: &str, path: Vec<PathSegment>, message: impl Into<String>) -> Self {
        ValidationIssue {
            code: code.to_string(),
            path,
            message: message.into(),
        }
    }
}

/// Itemized validation failure (422).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ValidationError {
    pub name: String,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        ValidationError {
            name: "ValidationError".to_string(),
            issues,
        }
    }

    pub fn single(code: &str, path: Vec<PathSegment>, message: impl Into<String>) -> Self {
        Self::new(vec![ValidationIssue::new(code, path, message)])
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .issues
            .iter()
            .map(|i| {
                let path: Vec<String> = i
                    .path
                    .iter()
                    .map(|p| match p {
                        PathSegment::Key(k) => k.clone(),
                        PathSegment::Index(n) => n.to_string(),
                    })
                    .collect();
                format!("{}: {}", path.join("."), i.message)
            })
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

impl std::error::Error for ValidationError {}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("validation: {0}")]
    Validation(#[from] ValidationError),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{}", UNAUTHORIZED_MESSAGE)]
    Unauthorized,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("internal: {0}")]
    Internal(String),
}

impl AppError {
    /// Error name reported in 500 bodies.
    fn name(&self) -> &'static str {
        match self {
            AppError::Config(_) => "ConfigError",
            AppError::Validation(_) => "ValidationError",
            AppError::NotFound(_) => "NotFoundError",
            AppError::Unauthorized => "Unauthorized",
            AppError::Store(_) => "StorageError",
            AppError::Internal(_) => "InternalError",
        }
    }
}

#[derive(Serialize)]
pub struct FailureBody {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<Vec<String>>,
}

#[derive(Serialize)]
pub struct ValidationFailureBody<'a> {
    pub success: bool,
    pub message: &'static str,
    pub errors: &'a ValidationError,
}

fn source_chain(err: &dyn std::error::Error) -> Vec<String> {
    let mut out = vec![err.to_string()];
    let mut current = err.source();
    while let Some(e) = current {
        out.push(e.to_string());
        current = e.source();
    }
    out
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.into_response_for(environment())
    }
}

impl AppError {
    /// Render for `env`: 500 bodies carry the source chain outside production.
    pub fn into_response_for(self, env: Environment) -> Response {
        match &self {
            AppError::Validation(v) => {
                let body = ValidationFailureBody {
                    success: false,
                    message: "Validation Error",
                    errors: v,
                };
                (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
            }
            AppError::NotFound(_) => {
                let body = FailureBody {
                    success: false,
                    error: self.to_string(),
                    stack: None,
                };
                (StatusCode::NOT_FOUND, Json(body)).into_response()
            }
            AppError::Unauthorized => {
                let body = FailureBody {
                    success: false,
                    error: UNAUTHORIZED_MESSAGE.to_string(),
                    stack: None,
                };
                (StatusCode::UNAUTHORIZED, Json(body)).into_response()
            }
            AppError::Config(_) | AppError::Store(_) | AppError::Internal(_) => {
                tracing::error!(error = %self, kind = self.name(), "request failed");
                let stack = if env.is_production() {
                    None
                } else {
                    Some(source_chain(&self))
                };
                let body = FailureBody {
                    success: false,
                    error: format!("{}: {}", self.name(), self),
                    stack,
                };
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}
