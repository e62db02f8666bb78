//! Authentication middleware for Axum
//!
//! [`auth_middleware`] resolves the caller from either a JWT bearer token or
//! an API key and stores an [`AuthenticatedUser`] in the request extensions.
//! The guard middlewares below run after it and only look at that value.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;

use crate::application::{ApiKeyService, IdentityService};
use crate::domain::api_key::{SCOPE_ADMIN, SCOPE_INGEST, SCOPE_READ};
use crate::domain::{ApiKey, User, UserRole};
use crate::infrastructure::crypto::api_key::looks_like_api_key;
use crate::interfaces::http::common::{status_for, ApiResponse};

/// Header carrying an API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Services the auth middleware needs
#[derive(Clone)]
pub struct AuthState {
    pub identity: Arc<IdentityService>,
    pub api_keys: Arc<ApiKeyService>,
}

/// How the caller was authenticated
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthMethod {
    Jwt,
    ApiKey { key_id: String },
}

/// The caller of the current request, either an agent or an API key
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    /// User id for agents, key id for API keys
    pub principal_id: String,
    pub username: String,
    /// Set for agents only
    pub role: Option<UserRole>,
    /// Set for API keys only
    pub scopes: Vec<String>,
    pub auth_method: AuthMethod,
}

impl AuthenticatedUser {
    pub fn from_user(user: &User) -> Self {
        Self {
            principal_id: user.id.clone(),
            username: user.username.clone(),
            role: Some(user.role),
            scopes: Vec::new(),
            auth_method: AuthMethod::Jwt,
        }
    }

    pub fn from_api_key(key: &ApiKey) -> Self {
        Self {
            principal_id: key.id.clone(),
            username: key.name.clone(),
            role: None,
            scopes: key.scopes.clone(),
            auth_method: AuthMethod::ApiKey {
                key_id: key.id.clone(),
            },
        }
    }

    /// Agent id when authenticated with a JWT
    pub fn user_id(&self) -> Option<&str> {
        match self.auth_method {
            AuthMethod::Jwt => Some(&self.principal_id),
            AuthMethod::ApiKey { .. } => None,
        }
    }

    fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope || s == SCOPE_ADMIN)
    }

    pub fn is_admin(&self) -> bool {
        match self.auth_method {
            AuthMethod::Jwt => self.role == Some(UserRole::Admin),
            AuthMethod::ApiKey { .. } => self.has_scope(SCOPE_ADMIN),
        }
    }

    /// Any agent may read; keys need the `read` scope
    pub fn can_read(&self) -> bool {
        match self.auth_method {
            AuthMethod::Jwt => true,
            AuthMethod::ApiKey { .. } => self.has_scope(SCOPE_READ),
        }
    }

    /// Any agent may act; keys only with the `admin` scope
    pub fn can_write(&self) -> bool {
        match self.auth_method {
            AuthMethod::Jwt => true,
            AuthMethod::ApiKey { .. } => self.has_scope(SCOPE_ADMIN),
        }
    }

    /// Keys with the `ingest` scope, and admins
    pub fn can_ingest(&self) -> bool {
        match self.auth_method {
            AuthMethod::Jwt => self.is_admin(),
            AuthMethod::ApiKey { .. } => self.has_scope(SCOPE_INGEST),
        }
    }
}

/// Credentials found on a request
#[derive(Debug, PartialEq, Eq)]
enum Credentials<'a> {
    Bearer(&'a str),
    ApiKey(&'a str),
}

fn credentials(headers: &HeaderMap) -> Option<Credentials<'_>> {
    if let Some(key) = headers.get(API_KEY_HEADER).and_then(|h| h.to_str().ok()) {
        return Some(Credentials::ApiKey(key.trim()));
    }

    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())?
        .trim();
    let token = value.strip_prefix("Bearer ").map(str::trim).unwrap_or(value);
    if looks_like_api_key(token) {
        Some(Credentials::ApiKey(token))
    } else if value.starts_with("Bearer ") {
        Some(Credentials::Bearer(token))
    } else {
        None
    }
}

fn reject(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ApiResponse::<()>::error(message))).into_response()
}

/// JWT / API-key authentication middleware
pub async fn auth_middleware(
    State(auth_state): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let principal = match credentials(request.headers()) {
        None => return reject(StatusCode::UNAUTHORIZED, "Missing authentication token"),
        Some(Credentials::Bearer(token)) => auth_state
            .identity
            .authenticate_token(token)
            .await
            .map(|user| AuthenticatedUser::from_user(&user)),
        Some(Credentials::ApiKey(key)) => auth_state
            .api_keys
            .authenticate(key)
            .await
            .map(|key| AuthenticatedUser::from_api_key(&key)),
    };

    match principal {
        Ok(user) => {
            debug!(principal = %user.username, method = ?user.auth_method, "Request authenticated");
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => reject(status_for(&e), e.to_string()),
    }
}

fn caller(request: &Request<Body>) -> Result<&AuthenticatedUser, Response> {
    request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "Not authenticated"))
}

/// Admin agents and `admin`-scoped keys only
pub async fn require_admin(request: Request<Body>, next: Next) -> Response {
    match caller(&request) {
        Ok(user) if user.is_admin() => next.run(request).await,
        Ok(_) => reject(StatusCode::FORBIDDEN, "Admin access required"),
        Err(response) => response,
    }
}

/// Callers allowed to record assistant messages
pub async fn require_ingest(request: Request<Body>, next: Next) -> Response {
    match caller(&request) {
        Ok(user) if user.can_ingest() => next.run(request).await,
        Ok(_) => reject(StatusCode::FORBIDDEN, "The 'ingest' scope is required"),
        Err(response) => response,
    }
}

/// Reads need read access, everything else write access
pub async fn require_access(request: Request<Body>, next: Next) -> Response {
    let read_only = matches!(*request.method(), Method::GET | Method::HEAD);
    match caller(&request) {
        Ok(user) if read_only && user.can_read() => next.run(request).await,
        Ok(user) if !read_only && user.can_write() => next.run(request).await,
        Ok(_) => reject(StatusCode::FORBIDDEN, "Insufficient permissions"),
        Err(response) => response,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn key_user(scopes: &[&str]) -> AuthenticatedUser {
        AuthenticatedUser {
            principal_id: "k-1".into(),
            username: "bot".into(),
            role: None,
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
            auth_method: AuthMethod::ApiKey {
                key_id: "k-1".into(),
            },
        }
    }

    fn agent(role: UserRole) -> AuthenticatedUser {
        AuthenticatedUser {
            principal_id: "u-1".into(),
            username: "maria".into(),
            role: Some(role),
            scopes: Vec::new(),
            auth_method: AuthMethod::Jwt,
        }
    }

    #[test]
    fn credentials_prefer_api_key_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer jwt.token.here"));
        assert_eq!(credentials(&headers), Some(Credentials::Bearer("jwt.token.here")));

        headers.insert(API_KEY_HEADER, HeaderValue::from_static("rlty_bot_abc"));
        assert_eq!(credentials(&headers), Some(Credentials::ApiKey("rlty_bot_abc")));
    }

    #[test]
    fn api_key_accepted_in_authorization_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("rlty_bot_abc"));
        assert_eq!(credentials(&headers), Some(Credentials::ApiKey("rlty_bot_abc")));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer rlty_bot_abc"));
        assert_eq!(credentials(&headers), Some(Credentials::ApiKey("rlty_bot_abc")));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic Zm9vOmJhcg=="));
        assert_eq!(credentials(&headers), None);
    }

    #[test]
    fn agents_read_and_write_but_only_admins_ingest() {
        let maria = agent(UserRole::Agent);
        assert!(maria.can_read() && maria.can_write());
        assert!(!maria.can_ingest() && !maria.is_admin());
        assert_eq!(maria.user_id(), Some("u-1"));

        let admin = agent(UserRole::Admin);
        assert!(admin.is_admin() && admin.can_ingest());
    }

    #[test]
    fn key_permissions_follow_scopes() {
        let ingest = key_user(&[SCOPE_INGEST]);
        assert!(ingest.can_ingest());
        assert!(!ingest.can_read() && !ingest.can_write() && !ingest.is_admin());
        assert_eq!(ingest.user_id(), None);

        let read = key_user(&[SCOPE_READ]);
        assert!(read.can_read() && !read.can_write());

        let admin = key_user(&[SCOPE_ADMIN]);
        assert!(admin.can_read() && admin.can_write() && admin.can_ingest() && admin.is_admin());
    }
}
