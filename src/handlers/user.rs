use axum::{Json, extract::State, http::StatusCode};
use validator::Validate;

use crate::{
    auth::AuthUser,
    error::{ApiResult, ErrorBody},
    extract::AppJson,
    models::{
        ChangePasswordRequest, CreateUserRequest, MessageResponse, UpdateUserRequest,
        UserProfile, UserUpdatedResponse,
    },
    services::UserService,
};

/// create_user
///
/// [Public Route] Registers a new account.
#[utoipa::path(
    post,
    path = "/user",
    tag = "user",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = MessageResponse),
        (status = 400, description = "Invalid payload or email taken", body = ErrorBody)
    )
)]
pub async fn create_user(
    State(service): State<UserService>,
    AppJson(payload): AppJson<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    payload.validate()?;
    let response = service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// get_user
///
/// [Authenticated Route] The caller's own profile.
#[utoipa::path(
    get,
    path = "/user",
    tag = "user",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Profile", body = UserProfile),
        (status = 401, description = "Unauthorized", body = ErrorBody)
    )
)]
pub async fn get_user(
    AuthUser { id }: AuthUser,
    State(service): State<UserService>,
) -> ApiResult<Json<UserProfile>> {
    Ok(Json(service.profile(id).await?))
}

#[utoipa::path(
    patch,
    path = "/user",
    tag = "user",
    security(("bearer" = [])),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserUpdatedResponse),
        (status = 400, description = "Invalid payload or email taken", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody)
    )
)]
pub async fn update_user(
    AuthUser { id }: AuthUser,
    State(service): State<UserService>,
    AppJson(payload): AppJson<UpdateUserRequest>,
) -> ApiResult<Json<UserUpdatedResponse>> {
    payload.validate()?;
    Ok(Json(service.update(id, payload).await?))
}

/// change_password
///
/// [Authenticated Route] Requires the current password.
#[utoipa::path(
    patch,
    path = "/user/password",
    tag = "user",
    security(("bearer" = [])),
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 401, description = "Unauthorized or invalid current password", body = ErrorBody)
    )
)]
pub async fn change_password(
    AuthUser { id }: AuthUser,
    State(service): State<UserService>,
    AppJson(payload): AppJson<ChangePasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    payload.validate()?;
    Ok(Json(service.change_password(id, payload).await?))
}

/// delete_user
///
/// [Authenticated Route] Deletes the account, its pictures (with their files) and posts.
#[utoipa::path(
    delete,
    path = "/user",
    tag = "user",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = ErrorBody)
    )
)]
pub async fn delete_user(
    AuthUser { id }: AuthUser,
    State(service): State<UserService>,
) -> ApiResult<Json<MessageResponse>> {
    Ok(Json(service.delete(id).await?))
}
