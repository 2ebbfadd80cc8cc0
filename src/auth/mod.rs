/*!
 * Bearer-token verification.
 *
 * Tokens are issued by the storefront's auth service; this crate only
 * verifies them (HS256, shared secret) and turns the claims into an
 * [`AuthUser`] request extension. `sub` is the user id and the `admin`
 * role unlocks privileged routes.
 */

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::errors::ServiceError;

pub const ADMIN_ROLE: &str = "admin";

/// Claim structure for JWT tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    pub nbf: i64,
    pub iss: String,
    pub aud: String,
}

/// Authenticated caller, inserted into request extensions by the auth middlewares.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub roles: Vec<String>,
    pub token_id: String,
}

impl AuthUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            name: claims.name,
            email: claims.email,
            roles: claims.roles,
            token_id: claims.jti,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_audience: String,
    pub jwt_issuer: String,
}

impl AuthConfig {
    pub fn new(jwt_secret: String, jwt_audience: String, jwt_issuer: String) -> Self {
        Self {
            jwt_secret,
            jwt_audience,
            jwt_issuer,
        }
    }
}

impl From<&AppConfig> for AuthConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self::new(
            cfg.jwt_secret.clone(),
            cfg.auth_audience.clone(),
            cfg.auth_issuer.clone(),
        )
    }
}

#[derive(Debug, Clone)]
pub struct AuthService {
    pub config: AuthConfig,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Validate a JWT token and extract the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[self.config.jwt_audience.as_str()]);
        validation.set_issuer(&[self.config.jwt_issuer.as_str()]);
        validation.validate_nbf = true;

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })
    }

    /// Mints a token the way the auth service does. Used by tooling and tests.
    pub fn issue_token(
        &self,
        user_id: &str,
        roles: &[&str],
        ttl: Duration,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            name: None,
            email: None,
            roles: roles.iter().map(|r| r.to_string()).collect(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            nbf: now.timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication required")]
    MissingAuth,

    #[error("Invalid authentication token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("Authentication service not available")]
    ServiceUnavailable,
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingAuth | AuthError::InvalidToken | AuthError::TokenExpired => {
                ServiceError::Unauthorized(err.to_string())
            }
            AuthError::InsufficientPermissions => ServiceError::Forbidden(err.to_string()),
            AuthError::TokenCreation(_) | AuthError::ServiceUnavailable => {
                ServiceError::InternalError(err.to_string())
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ServiceError::from(self).into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::MissingAuth)
    }
}

/// `Ok(None)` when no bearer token was sent; an error when one was sent but is bad.
fn bearer_user(headers: &HeaderMap, auth_service: &AuthService) -> Result<Option<AuthUser>, AuthError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| AuthError::InvalidToken)?;
    let token = value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or(AuthError::InvalidToken)?;

    let claims = auth_service.validate_token(token)?;
    debug!(user_id = %claims.sub, "bearer token verified");
    Ok(Some(claims.into()))
}

fn auth_service_from(request: &Request) -> Result<Arc<AuthService>, AuthError> {
    request
        .extensions()
        .get::<Arc<AuthService>>()
        .cloned()
        .ok_or(AuthError::ServiceUnavailable)
}

/// Requires a valid bearer token.
pub async fn auth_middleware(mut request: Request, next: Next) -> Result<Response, AuthError> {
    let auth_service = auth_service_from(&request)?;
    let user = bearer_user(request.headers(), &auth_service)?.ok_or(AuthError::MissingAuth)?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Attaches the caller when a token is present; anonymous requests pass through.
pub async fn optional_auth_middleware(
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_service = auth_service_from(&request)?;
    if let Some(user) = bearer_user(request.headers(), &auth_service)? {
        request.extensions_mut().insert(user);
    }
    Ok(next.run(request).await)
}

/// Role middleware to check if a user has the required role
pub async fn role_middleware(
    State(required_role): State<String>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or(AuthError::MissingAuth)?;

    if !user.has_role(&required_role) {
        return Err(AuthError::InsufficientPermissions);
    }

    Ok(next.run(request).await)
}

/// Extension methods for Router to add auth middleware
pub trait AuthRouterExt {
    fn with_auth(self) -> Self;
    fn with_optional_auth(self) -> Self;
    fn with_role(self, role: &str) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self) -> Self {
        self.layer(axum::middleware::from_fn(auth_middleware))
    }

    fn with_optional_auth(self) -> Self {
        self.layer(axum::middleware::from_fn(optional_auth_middleware))
    }

    fn with_role(self, role: &str) -> Self {
        self.layer(axum::middleware::from_fn_with_state(
            role.to_string(),
            role_middleware,
        ))
        .with_auth()
    }
}
