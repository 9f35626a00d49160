use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Anonymous endpoints: login, registration and read-only access to published posts.
/// Uploaded files are served separately under the static path.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(handlers::health))
        // POST /auth
        // Credentials in, bearer token out.
        .route("/auth", post(handlers::auth::login))
        // POST /user
        // Account registration.
        .route("/user", post(handlers::user::create_user))
        // GET /post?page=&take=
        .route("/post", get(handlers::post::list_posts))
        // GET /post/{slug}
        .route("/post/{slug}", get(handlers::post::get_post))
        // GET /search/posts?value=&page=&take=
        // Title full-text search.
        .route("/search/posts", get(handlers::search::search_posts))
}
