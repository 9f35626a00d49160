use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    error::{ApiError, ApiResult},
};

/// Claims
///
/// Payload of every access token. Signed with HS256 using the configured secret.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's id.
    pub sub: Uuid,
    /// Expiration time (seconds since the epoch).
    pub exp: usize,
    /// Issued at (seconds since the epoch).
    pub iat: usize,
}

/// TokenService
///
/// Issues and verifies access tokens. Built once from `AppConfig` and shared through
/// `AppState`.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    expires_in: i64,
}

pub type TokenState = Arc<TokenService>;

impl TokenService {
    pub fn new(secret: &str, expires_in: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            expires_in,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.jwt_secret, config.jwt_expires_in)
    }

    /// issue
    ///
    /// Signs a token for `user_id` valid for the configured lifetime.
    pub fn issue(&self, user_id: Uuid) -> ApiResult<String> {
        let iat = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id,
            iat: iat as usize,
            exp: (iat + self.expires_in) as usize,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(ApiError::internal)
    }

    /// verify
    ///
    /// Checks signature, algorithm and expiry. Every failure is `Unauthorized`.
    pub fn verify(&self, token: &str) -> ApiResult<Claims> {
        match decode::<Claims>(token, &self.decoding, &self.validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => {
                match e.kind() {
                    ErrorKind::ExpiredSignature => tracing::debug!("rejected expired token"),
                    other => tracing::warn!(reason = ?other, "rejected invalid token"),
                }
                Err(ApiError::Unauthorized)
            }
        }
    }
}

/// AuthUser
///
/// The resolved identity of an authenticated request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
}

fn bearer_token(headers: &HeaderMap) -> ApiResult<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(ApiError::Unauthorized)
}

fn authenticate(tokens: &TokenService, headers: &HeaderMap) -> ApiResult<AuthUser> {
    let token = bearer_token(headers)?;
    let claims = tokens.verify(token)?;
    Ok(AuthUser { id: claims.sub })
}

/// AuthUser Extractor Implementation
///
/// Reuses the identity `auth_middleware` stored in the request extensions; otherwise
/// resolves it from the `Authorization: Bearer <token>` header. The token is the only
/// input: whether the account still exists is checked by the services that need it.
///
/// Rejection: `ApiError::Unauthorized` (401) on any failure.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    TokenState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(*user);
        }

        let tokens = TokenState::from_ref(state);
        let user = authenticate(&tokens, &parts.headers)?;
        parts.extensions.insert(user);
        Ok(user)
    }
}

/// auth_middleware
///
/// Guards the authenticated router. A request without a valid bearer token is answered
/// with 401 before any handler runs; otherwise the identity is attached to the request
/// extensions for the `AuthUser` extractor.
pub async fn auth_middleware(
    State(tokens): State<TokenState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(&tokens, request.headers())?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
