//! HTTP handlers.
//!
//! Handlers parse and validate input, call one service method and shape the status
//! code. Owner identity always comes from the `AuthUser` extractor, never from the body.

pub mod auth;
pub mod picture;
pub mod post;
pub mod search;
pub mod user;

/// GET /health
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "Service is up", body = String))
)]
pub async fn health() -> &'static str {
    "ok"
}
