//! Request-scoped business logic.
//!
//! Each service is a cheap bundle of shared handles projected out of `AppState` through
//! `FromRef`, so handlers take `State<PostService>` and never see the whole state.
//! Owner scoping happens here: every owner-bound lookup passes the caller's id down to
//! the repository, and a miss is reported as 404 whether the row is absent or foreign.

use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::User,
    repository::Repository,
};

mod auth;
mod picture;
mod post;
mod search;
mod user;

pub use auth::AuthService;
pub use picture::{PictureService, PictureUpload};
pub use post::PostService;
pub use search::SearchService;
pub use user::UserService;

/// The account behind a verified token. A token that outlived its account is
/// indistinguishable from a forged one.
pub(crate) async fn require_user(repo: &dyn Repository, id: Uuid) -> ApiResult<User> {
    match repo.find_user(id).await? {
        Some(user) => Ok(user),
        None => {
            tracing::warn!(user_id = %id, "token subject no longer exists");
            Err(ApiError::Unauthorized)
        }
    }
}
