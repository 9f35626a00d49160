use std::{sync::Arc, time::SystemTime};

use articles_api::{
    AppConfig, AppState, InMemoryRepository, MockStorageService,
    auth::{AuthUser, Claims, TokenService},
    error::ApiError,
};
use axum::{
    extract::FromRequestParts,
    http::{Method, Request, StatusCode, header, request::Parts},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

// --- Helper Functions ---

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";
const TEST_USER_ID: Uuid = Uuid::from_u128(1);

fn now() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

fn sign<T: serde::Serialize>(claims: &T, secret: &str) -> String {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

fn create_token(user_id: Uuid, issued_ago: u64, lifetime: u64) -> String {
    let iat = now() - issued_ago;
    let claims = Claims {
        sub: user_id,
        iat: iat as usize,
        exp: (iat + lifetime) as usize,
    };
    sign(&claims, TEST_JWT_SECRET)
}

fn create_app_state() -> AppState {
    let config = AppConfig {
        jwt_secret: TEST_JWT_SECRET.to_string(),
        ..AppConfig::default()
    };
    AppState::new(
        Arc::new(InMemoryRepository::new()),
        Arc::new(MockStorageService::new()),
        config,
    )
}

fn request_parts(authorization: Option<&str>) -> Parts {
    let mut builder = Request::builder().method(Method::GET).uri("/user");
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    let (parts, _) = builder.body(axum::body::Body::empty()).unwrap().into_parts();
    parts
}

async fn extract(authorization: Option<&str>) -> Result<AuthUser, ApiError> {
    let state = create_app_state();
    let mut parts = request_parts(authorization);
    AuthUser::from_request_parts(&mut parts, &state).await
}

fn assert_unauthorized(result: Result<AuthUser, ApiError>) {
    let err = result.expect_err("request should be rejected");
    assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(err.to_string(), "Unauthorized");
}

// --- Tests ---

#[tokio::test]
async fn test_auth_success_with_valid_jwt() {
    let token = create_token(TEST_USER_ID, 0, 3600);

    let user = extract(Some(&format!("Bearer {token}")))
        .await
        .expect("valid token should authenticate");

    assert_eq!(user.id, TEST_USER_ID);
}

#[tokio::test]
async fn test_auth_failure_with_missing_header() {
    assert_unauthorized(extract(None).await);
}

#[tokio::test]
async fn test_auth_failure_with_wrong_scheme() {
    let token = create_token(TEST_USER_ID, 0, 3600);
    assert_unauthorized(extract(Some(&format!("Basic {token}"))).await);
}

#[tokio::test]
async fn test_auth_failure_with_empty_bearer() {
    assert_unauthorized(extract(Some("Bearer ")).await);
}

#[tokio::test]
async fn test_auth_failure_with_foreign_signature() {
    let claims = Claims {
        sub: TEST_USER_ID,
        iat: now() as usize,
        exp: (now() + 3600) as usize,
    };
    let token = sign(&claims, "some-other-secret");
    assert_unauthorized(extract(Some(&format!("Bearer {token}"))).await);
}

#[tokio::test]
async fn test_auth_failure_with_expired_jwt() {
    // Expired an hour ago, well past the default leeway.
    let token = create_token(TEST_USER_ID, 7200, 3600);
    assert_unauthorized(extract(Some(&format!("Bearer {token}"))).await);
}

#[tokio::test]
async fn test_auth_failure_with_malformed_subject() {
    let claims = serde_json::json!({
        "sub": "not-a-uuid",
        "iat": now(),
        "exp": now() + 3600,
    });
    let token = sign(&claims, TEST_JWT_SECRET);
    assert_unauthorized(extract(Some(&format!("Bearer {token}"))).await);
}

#[tokio::test]
async fn test_auth_failure_with_garbage_token() {
    assert_unauthorized(extract(Some("Bearer not.a.jwt")).await);
}

#[tokio::test]
async fn test_user_id_header_is_not_an_identity() {
    let state = create_app_state();
    let mut parts = request_parts(None);
    parts.headers.insert(
        header::HeaderName::from_static("x-user-id"),
        header::HeaderValue::from_str(&TEST_USER_ID.to_string()).unwrap(),
    );

    assert_unauthorized(AuthUser::from_request_parts(&mut parts, &state).await);
}

#[tokio::test]
async fn test_identity_from_extensions_is_reused() {
    let state = create_app_state();
    let mut parts = request_parts(None);
    parts.extensions.insert(AuthUser { id: TEST_USER_ID });

    let user = AuthUser::from_request_parts(&mut parts, &state)
        .await
        .expect("middleware identity should be reused");
    assert_eq!(user.id, TEST_USER_ID);
}

#[test]
fn test_issued_token_round_trips() {
    let tokens = TokenService::new(TEST_JWT_SECRET, 900);
    let user_id = Uuid::new_v4();

    let token = tokens.issue(user_id).unwrap();
    let claims = tokens.verify(&token).unwrap();

    assert_eq!(claims.sub, user_id);
    assert_eq!(claims.exp - claims.iat, 900);
}

#[test]
fn test_token_from_other_service_is_rejected() {
    let issuer = TokenService::new("issuer-secret", 900);
    let verifier = TokenService::new(TEST_JWT_SECRET, 900);

    let token = issuer.issue(TEST_USER_ID).unwrap();
    let err = verifier.verify(&token).unwrap_err();

    assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
}

#[test]
fn test_unauthorized_body_shape() {
    let body = serde_json::to_value(ApiError::Unauthorized.body()).unwrap();
    assert_eq!(
        body,
        serde_json::json!({
            "statusCode": 401,
            "message": "Unauthorized",
            "error": "Unauthorized"
        })
    );
}
