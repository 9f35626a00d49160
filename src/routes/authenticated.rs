use crate::{AppState, handlers, storage::MAX_UPLOAD_BYTES};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, patch},
};

// Room for the multipart framing and the description part around the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Authenticated Router Module
///
/// Everything scoped to the caller's own account. The layer installed by `create_router`
/// rejects requests without a valid bearer token before they reach these handlers, and
/// the services filter every row by the caller's id.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // --- Account ---
        // GET/PATCH/DELETE /user
        .route(
            "/user",
            get(handlers::user::get_user)
                .patch(handlers::user::update_user)
                .delete(handlers::user::delete_user),
        )
        // PATCH /user/password
        .route("/user/password", patch(handlers::user::change_password))
        // --- Pictures ---
        // GET/POST/PATCH /picture
        // Uploads are multipart and limited to MAX_UPLOAD_BYTES per file.
        .route(
            "/picture",
            get(handlers::picture::list_pictures)
                .post(handlers::picture::upload_picture)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + MULTIPART_OVERHEAD))
                .patch(handlers::picture::change_picture),
        )
        // DELETE /picture/{id}
        // Also removes the file from disk.
        .route("/picture/{id}", delete(handlers::picture::delete_picture))
        // --- Posts ---
        // POST/PATCH /post
        .route(
            "/post",
            axum::routing::post(handlers::post::create_post).patch(handlers::post::update_post),
        )
        // DELETE /post/{id}
        // Shares its segment name with the public `GET /post/{slug}`; the handler parses
        // the value as a post id. Items go with the post.
        .route("/post/{slug}", delete(handlers::post::delete_post))
        // GET /post/check/{slug}
        .route("/post/check/{slug}", get(handlers::post::check_slug))
        // GET /post/user?page=&take=
        .route("/post/user", get(handlers::post::list_my_posts))
        // GET /post/user/{id}
        .route("/post/user/{id}", get(handlers::post::get_my_post))
}
