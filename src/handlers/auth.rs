use axum::{Json, extract::State};
use validator::Validate;

use crate::{
    error::{ApiResult, ErrorBody},
    extract::AppJson,
    models::{LoginRequest, LoginResponse},
    services::AuthService,
};

/// login
///
/// [Public Route] Exchanges email and password for a bearer token.
#[utoipa::path(
    post,
    path = "/auth",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 401, description = "Email or password is invalid", body = ErrorBody)
    )
)]
pub async fn login(
    State(service): State<AuthService>,
    AppJson(payload): AppJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    payload.validate()?;
    Ok(Json(service.login(payload).await?))
}
