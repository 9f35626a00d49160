use axum::extract::FromRef;

use crate::{
    AppState,
    auth::TokenState,
    error::{ApiError, ApiResult},
    models::{LoginRequest, LoginResponse},
    password::verify_password,
    repository::RepositoryState,
};

/// AuthService
///
/// Exchanges credentials for an access token.
#[derive(Clone)]
pub struct AuthService {
    repo: RepositoryState,
    tokens: TokenState,
}

impl FromRef<AppState> for AuthService {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.repo.clone(), state.tokens.clone())
    }
}

impl AuthService {
    pub fn new(repo: RepositoryState, tokens: TokenState) -> Self {
        Self { repo, tokens }
    }

    /// login
    ///
    /// An unknown email and a wrong password fail identically.
    pub async fn login(&self, req: LoginRequest) -> ApiResult<LoginResponse> {
        let Some(user) = self.repo.find_user_by_email(&req.email).await? else {
            tracing::warn!("login attempt for unknown email");
            return Err(ApiError::InvalidCredentials);
        };

        if !verify_password(req.password, user.password.clone()).await? {
            tracing::warn!(user_id = %user.id, "login attempt with wrong password");
            return Err(ApiError::InvalidCredentials);
        }

        let access_token = self.tokens.issue(user.id)?;
        tracing::info!(user_id = %user.id, "user logged in");

        Ok(LoginResponse {
            access_token,
            user: user.into(),
        })
    }
}
