use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    NewPicture, NewPost, NewUser, Page, Pagination, Picture, Post, PostChanges, PostDetail,
    PostSummary, User, UserChanges,
};

mod memory;
mod postgres;

pub use memory::InMemoryRepository;
pub use postgres::PostgresRepository;

/// Which unique constraint a write collided with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateKey {
    Email,
    Slug,
    Filename,
}

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("duplicate {0:?}")]
    Duplicate(DuplicateKey),

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                let key = match db.constraint() {
                    Some("users_email_key") => Some(DuplicateKey::Email),
                    Some("posts_slug_key") => Some(DuplicateKey::Slug),
                    Some("pictures_filename_key") => Some(DuplicateKey::Filename),
                    _ => None,
                };
                if let Some(key) = key {
                    return Self::Duplicate(key);
                }
            }
        }
        Self::Database(err)
    }
}

pub type RepoResult<T> = Result<T, RepositoryError>;

/// Repository Trait
///
/// The persistence contract used by every service. Owner-scoped lookups take both the
/// row id and the owner id; a `None`/`false` result covers "does not exist" and
/// "belongs to somebody else" alike.
///
/// `Send + Sync` and `async_trait` make `Arc<dyn Repository>` shareable across Axum
/// handlers.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn find_user(&self, id: Uuid) -> RepoResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    async fn create_user(&self, user: NewUser) -> RepoResult<User>;
    // `None` when the user no longer exists.
    async fn update_user(&self, id: Uuid, changes: UserChanges) -> RepoResult<Option<User>>;
    async fn update_user_password(&self, id: Uuid, password_hash: &str) -> RepoResult<bool>;
    /// Deletes the user together with their pictures, posts and post items.
    async fn delete_user(&self, id: Uuid) -> RepoResult<bool>;

    // --- Pictures ---
    async fn list_pictures(&self, owner_id: Uuid, pagination: Pagination)
    -> RepoResult<Page<Picture>>;
    // Every stored filename of the owner; used to clean the disk on account deletion.
    async fn list_picture_filenames(&self, owner_id: Uuid) -> RepoResult<Vec<String>>;
    async fn find_picture(&self, id: Uuid, owner_id: Uuid) -> RepoResult<Option<Picture>>;
    async fn create_picture(&self, picture: NewPicture) -> RepoResult<Picture>;
    async fn update_picture_description(
        &self,
        id: Uuid,
        owner_id: Uuid,
        description: Option<String>,
    ) -> RepoResult<Option<Picture>>;
    /// Banner and item references to the picture are set to null.
    async fn delete_picture(&self, id: Uuid, owner_id: Uuid) -> RepoResult<bool>;

    // --- Posts ---
    async fn slug_exists(&self, slug: &str) -> RepoResult<bool>;
    async fn list_posts(&self, pagination: Pagination) -> RepoResult<Page<PostSummary>>;
    async fn list_posts_by_owner(
        &self,
        owner_id: Uuid,
        pagination: Pagination,
    ) -> RepoResult<Page<PostSummary>>;
    /// Full-text match of `value` against post titles, newest first.
    async fn search_posts(&self, value: &str, pagination: Pagination)
    -> RepoResult<Page<PostSummary>>;
    async fn find_post_by_slug(&self, slug: &str) -> RepoResult<Option<PostDetail>>;
    async fn find_post_detail(&self, id: Uuid, owner_id: Uuid) -> RepoResult<Option<PostDetail>>;
    /// Writes the post and its items atomically.
    async fn create_post(&self, post: NewPost) -> RepoResult<Post>;
    /// Applies the changes atomically. Item updates only touch items of this post.
    async fn update_post(
        &self,
        id: Uuid,
        owner_id: Uuid,
        changes: PostChanges,
    ) -> RepoResult<Option<Post>>;
    async fn delete_post(&self, id: Uuid, owner_id: Uuid) -> RepoResult<bool>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;
