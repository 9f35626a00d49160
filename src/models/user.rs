use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// User
///
/// A row of the `users` table. Not `Serialize`: responses go through the projections below
/// so the password hash never leaves the service.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    // bcrypt hash.
    pub password: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for the repository; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub description: Option<String>,
}

/// Partial profile update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub description: Option<String>,
}

// --- Request Payloads ---

/// LoginRequest
///
/// Credentials for `POST /auth`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "email must be an email"))]
    #[schema(example = "email@email.com")]
    pub email: String,
    #[validate(length(
        min = 8,
        max = 16,
        message = "password must be between 8 and 16 characters"
    ))]
    pub password: String,
}

/// CreateUserRequest
///
/// Public account registration (`POST /user`).
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(email(message = "email must be an email"))]
    #[schema(example = "email@email.com")]
    pub email: String,
    #[validate(length(
        min = 2,
        message = "firstName must be longer than or equal to 2 characters"
    ))]
    #[schema(example = "Irineu")]
    pub first_name: String,
    #[validate(length(
        min = 2,
        message = "lastName must be longer than or equal to 2 characters"
    ))]
    #[schema(example = "Silva")]
    pub last_name: String,
    #[validate(length(
        min = 8,
        max = 16,
        message = "password must be between 8 and 16 characters"
    ))]
    #[schema(example = "123456789")]
    pub password: String,
    #[validate(length(
        min = 24,
        message = "description must be longer than or equal to 24 characters"
    ))]
    pub description: Option<String>,
}

/// UpdateUserRequest
///
/// Self-service profile patch (`PATCH /user`). Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(email(message = "email must be an email"))]
    pub email: Option<String>,
    #[validate(length(
        min = 2,
        message = "firstName must be longer than or equal to 2 characters"
    ))]
    pub first_name: Option<String>,
    #[validate(length(
        min = 2,
        message = "lastName must be longer than or equal to 2 characters"
    ))]
    pub last_name: Option<String>,
    #[validate(length(
        min = 24,
        message = "description must be longer than or equal to 24 characters"
    ))]
    pub description: Option<String>,
}

impl From<UpdateUserRequest> for UserChanges {
    fn from(req: UpdateUserRequest) -> Self {
        Self {
            email: req.email,
            first_name: req.first_name,
            last_name: req.last_name,
            description: req.description,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(
        min = 8,
        max = 16,
        message = "currentPassword must be between 8 and 16 characters"
    ))]
    pub current_password: String,
    #[validate(length(
        min = 8,
        max = 16,
        message = "newPassword must be between 8 and 16 characters"
    ))]
    pub new_password: String,
}

// --- Response Projections ---

/// UserSummary
///
/// The safe user projection embedded in the login response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserSummary {
    pub email: String,
    pub description: Option<String>,
    pub first_name: String,
    pub last_name: String,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            email: user.email,
            description: user.description,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: UserSummary,
}

/// UserProfile
///
/// Output of `GET /user` and `PATCH /user`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserProfile {
    pub email: String,
    pub description: Option<String>,
    pub first_name: String,
    pub last_name: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            email: user.email,
            description: user.description,
            first_name: user.first_name,
            last_name: user.last_name,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct UserUpdatedResponse {
    pub message: String,
    pub user: UserProfile,
}
