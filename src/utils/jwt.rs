// src/utils/jwt.rs

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{config::Config, error::AppError, state::DynStore};

/// JWT Claims structure, as issued by the identity provider.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    /// Subject - the account UUID. Admin rights come from the account row,
    /// the provider's other claims are ignored.
    pub sub: String,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

impl Claims {
    pub fn account_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub).map_err(|_| AppError::AuthError("Invalid token subject".to_string()))
    }
}

/// Identity of the caller, if any. Inserted by the auth middlewares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewer(pub Option<Uuid>);

impl Viewer {
    pub fn id(self) -> Option<Uuid> {
        self.0
    }

    pub fn require(self) -> Result<Uuid, AppError> {
        self.0.ok_or(AppError::AuthError("Not authenticated".to_string()))
    }
}

/// Signs a token the same way the identity provider does (HS256).
pub fn sign_jwt(
    id: Uuid,
    secret: &str,
    expiration_seconds: u64,
) -> Result<String, AppError> {
    // Calculate expiration: current time + expiration_seconds
    let expiration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .as_secs() as usize
        + expiration_seconds as usize;

    let claims = Claims {
        sub: id.to_string(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Verifies and decodes a JWT string.
///
/// Returns the `Claims` if valid, otherwise returns an `AppError`.
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    let mut validation = Validation::default();
    // provider tokens carry an audience we do not pin
    validation.validate_aud = false;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|_| AppError::AuthError("Invalid token".to_string()))?;

    Ok(token_data.claims)
}

fn bearer_token(req: &Request<Body>) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

fn authenticate(token: &str, secret: &str) -> Result<Uuid, StatusCode> {
    verify_jwt(token, secret)
        .and_then(|claims| claims.account_id())
        .map_err(|_| StatusCode::UNAUTHORIZED)
}

/// Axum Middleware: Authentication.
///
/// Validates the 'Authorization: Bearer <token>' header and injects the
/// caller's `Viewer` into the request extensions. Returns 401 otherwise.
pub async fn auth_middleware(
    State(config): State<Config>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = bearer_token(&req).ok_or(StatusCode::UNAUTHORIZED)?;
    let id = authenticate(token, &config.jwt_secret)?;

    req.extensions_mut().insert(Viewer(Some(id)));
    Ok(next.run(req).await)
}

/// Axum Middleware: Optional Authentication.
///
/// Anonymous requests pass through with `Viewer(None)`; a token that is
/// present but invalid is still rejected with 401.
pub async fn optional_auth_middleware(
    State(config): State<Config>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let viewer = match bearer_token(&req) {
        Some(token) => Viewer(Some(authenticate(token, &config.jwt_secret)?)),
        None => Viewer(None),
    };

    req.extensions_mut().insert(viewer);
    Ok(next.run(req).await)
}

/// Axum Middleware: Admin Authorization.
///
/// Must be used AFTER `auth_middleware`. Loads the caller's account and
/// checks its admin flag; 403 Forbidden if it is not set.
pub async fn admin_middleware(
    State(store): State<DynStore>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let viewer = req
        .extensions()
        .get::<Viewer>()
        .copied()
        .unwrap_or(Viewer(None))
        .require()?;

    let account = store
        .find_account(viewer)
        .await?
        .ok_or(AppError::Forbidden("Administrators only".to_string()))?;

    if !account.is_admin {
        tracing::warn!("Non-admin {} attempted to access admin routes", viewer);
        return Err(AppError::Forbidden("Administrators only".to_string()));
    }

    Ok(next.run(req).await)
}
