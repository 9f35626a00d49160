use axum::extract::FromRef;
use uuid::Uuid;

use super::require_user;
use crate::{
    AppState,
    error::{ApiError, ApiResult, EMAIL_TAKEN},
    models::{
        ChangePasswordRequest, CreateUserRequest, MessageResponse, NewUser, UpdateUserRequest,
        UserChanges, UserProfile, UserUpdatedResponse,
    },
    password::{hash_password, verify_password},
    repository::RepositoryState,
    storage::StorageState,
};

/// UserService
///
/// Account registration and self-service profile management.
#[derive(Clone)]
pub struct UserService {
    repo: RepositoryState,
    storage: StorageState,
    bcrypt_cost: u32,
}

impl FromRef<AppState> for UserService {
    fn from_ref(state: &AppState) -> Self {
        Self::new(
            state.repo.clone(),
            state.storage.clone(),
            state.config.bcrypt_cost,
        )
    }
}

impl UserService {
    pub fn new(repo: RepositoryState, storage: StorageState, bcrypt_cost: u32) -> Self {
        Self {
            repo,
            storage,
            bcrypt_cost,
        }
    }

    pub async fn create(&self, req: CreateUserRequest) -> ApiResult<MessageResponse> {
        if self.repo.find_user_by_email(&req.email).await?.is_some() {
            return Err(ApiError::BadRequest(EMAIL_TAKEN.into()));
        }

        let password_hash = hash_password(req.password, self.bcrypt_cost).await?;
        let user = self
            .repo
            .create_user(NewUser {
                email: req.email,
                first_name: req.first_name,
                last_name: req.last_name,
                password_hash,
                description: req.description,
            })
            .await?;

        tracing::info!(user_id = %user.id, "user created");
        Ok(MessageResponse::new("User created successfully"))
    }

    pub async fn profile(&self, user_id: Uuid) -> ApiResult<UserProfile> {
        Ok(require_user(&*self.repo, user_id).await?.into())
    }

    /// update
    ///
    /// Partial profile update. Moving to an email owned by another account is a 400.
    pub async fn update(
        &self,
        user_id: Uuid,
        req: UpdateUserRequest,
    ) -> ApiResult<UserUpdatedResponse> {
        let current = require_user(&*self.repo, user_id).await?;

        if let Some(email) = req.email.as_deref().filter(|e| *e != current.email) {
            if self.repo.find_user_by_email(email).await?.is_some() {
                return Err(ApiError::BadRequest(EMAIL_TAKEN.into()));
            }
        }

        let user = self
            .repo
            .update_user(user_id, UserChanges::from(req))
            .await?
            .ok_or(ApiError::Unauthorized)?;

        tracing::info!(user_id = %user.id, "user updated");
        Ok(UserUpdatedResponse {
            message: "User updated successfully".to_string(),
            user: user.into(),
        })
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        req: ChangePasswordRequest,
    ) -> ApiResult<MessageResponse> {
        let user = require_user(&*self.repo, user_id).await?;

        if !verify_password(req.current_password, user.password).await? {
            tracing::warn!(user_id = %user_id, "password change with wrong current password");
            return Err(ApiError::InvalidPassword);
        }

        let password_hash = hash_password(req.new_password, self.bcrypt_cost).await?;
        if !self.repo.update_user_password(user_id, &password_hash).await? {
            return Err(ApiError::Unauthorized);
        }

        tracing::info!(user_id = %user_id, "password changed");
        Ok(MessageResponse::new("Password has been successfully changed"))
    }

    /// delete
    ///
    /// Removes the account with everything it owns, then the uploaded files.
    pub async fn delete(&self, user_id: Uuid) -> ApiResult<MessageResponse> {
        require_user(&*self.repo, user_id).await?;

        let filenames = self.repo.list_picture_filenames(user_id).await?;
        if !self.repo.delete_user(user_id).await? {
            return Err(ApiError::Unauthorized);
        }

        for filename in &filenames {
            self.storage.remove(filename).await;
        }

        tracing::info!(user_id = %user_id, files = filenames.len(), "user deleted");
        Ok(MessageResponse::new("User deleted successfully"))
    }
}
