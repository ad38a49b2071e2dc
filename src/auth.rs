//! Identity collaborator: resolves the caller, gates entity routes, exposes request context.
//!
//! Session issuance lives outside this crate. An [`IdentityProvider`] only maps request
//! headers to an [`Identity`]; [`require_auth`] rejects requests it cannot resolve.

use crate::error::AppError;
use crate::tenant::TenantScope;
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use std::sync::Arc;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const ORGANIZATION_ID_HEADER: &str = "x-organization-id";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: String,
    pub organization_id: String,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn resolve(&self, headers: &HeaderMap) -> Option<Identity>;
}

/// Development provider trusting `X-User-Id` / `X-Organization-Id`. Without an
/// organization header the user works in a personal workspace keyed by the user id.
#[derive(Clone, Debug, Default)]
pub struct HeaderIdentityProvider;

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[async_trait]
impl IdentityProvider for HeaderIdentityProvider {
    async fn resolve(&self, headers: &HeaderMap) -> Option<Identity> {
        let user_id = header(headers, USER_ID_HEADER)?;
        let organization_id = header(headers, ORGANIZATION_ID_HEADER).unwrap_or_else(|| user_id.clone());
        Some(Identity {
            user_id,
            organization_id,
        })
    }
}

/// Attach the caller's [`Identity`] or answer 401.
pub async fn require_auth(
    State(provider): State<Arc<dyn IdentityProvider>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    match provider.resolve(req.headers()).await {
        Some(identity) => {
            req.extensions_mut().insert(identity);
            Ok(next.run(req).await)
        }
        None => {
            tracing::warn!(method = %req.method(), path = %req.uri().path(), "rejected request without session");
            Err(AppError::Unauthorized)
        }
    }
}

/// Tenant and actor of the current request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestContext {
    pub organization_id: String,
    pub actor_id: String,
}

impl RequestContext {
    pub fn scope(&self) -> TenantScope {
        TenantScope::new(self.organization_id.clone(), self.actor_id.clone())
    }
}

impl From<Identity> for RequestContext {
    fn from(identity: Identity) -> Self {
        RequestContext {
            organization_id: identity.organization_id,
            actor_id: identity.user_id,
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(RequestContext::from)
            .ok_or(AppError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut h = HeaderMap::new();
        for (k, v) in pairs {
            h.insert(*k, HeaderValue::from_str(v).unwrap());
        }
        h
    }

    #[tokio::test]
    async fn resolves_user_and_organization() {
        let id = HeaderIdentityProvider
            .resolve(&headers(&[(USER_ID_HEADER, "u1"), (ORGANIZATION_ID_HEADER, "org-1")]))
            .await
            .unwrap();
        assert_eq!(id.user_id, "u1");
        assert_eq!(id.organization_id, "org-1");
    }

    #[tokio::test]
    async fn personal_workspace_when_no_organization() {
        let id = HeaderIdentityProvider
            .resolve(&headers(&[(USER_ID_HEADER, "u1")]))
            .await
            .unwrap();
        assert_eq!(id.organization_id, "u1");
    }

    #[tokio::test]
    async fn blank_user_is_unresolved() {
        assert!(HeaderIdentityProvider
            .resolve(&headers(&[(USER_ID_HEADER, "  ")]))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn context_requires_identity_extension() {
        let (mut parts, _) = axum::http::Request::new(()).into_parts();
        let err = RequestContext::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
        parts.extensions.insert(Identity {
            user_id: "u1".into(),
            organization_id: "org-1".into(),
        });
        let ctx = RequestContext::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(ctx.actor_id, "u1");
    }
}
