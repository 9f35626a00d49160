use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
use std::sync::Arc;
use tower_http::services::ServeDir;
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod password;
pub mod repository;
pub mod services;
pub mod storage;

// Routing segregated by access level (public, authenticated).
pub mod routes;
use routes::{authenticated, public};

// --- Public Re-exports ---

pub use auth::{AuthUser, TokenService, TokenState};
pub use config::AppConfig;
pub use error::{ApiError, ApiResult};
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};
pub use storage::{DiskStorage, MockStorageService, StorageState};

/// ApiDoc
///
/// OpenAPI document for every route. Schemas referenced by the paths are collected
/// automatically; the ones listed below are registered explicitly for client generation.
/// Served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::auth::login,
        handlers::user::create_user, handlers::user::get_user, handlers::user::update_user,
        handlers::user::change_password, handlers::user::delete_user,
        handlers::picture::list_pictures, handlers::picture::upload_picture,
        handlers::picture::change_picture, handlers::picture::delete_picture,
        handlers::post::list_posts, handlers::post::get_post, handlers::post::create_post,
        handlers::post::update_post, handlers::post::delete_post, handlers::post::check_slug,
        handlers::post::list_my_posts, handlers::post::get_my_post,
        handlers::search::search_posts,
    ),
    components(
        schemas(
            error::ErrorBody, models::MessageResponse,
            models::LoginRequest, models::LoginResponse, models::UserSummary,
            models::CreateUserRequest, models::UpdateUserRequest, models::ChangePasswordRequest,
            models::UserProfile, models::UserUpdatedResponse,
            models::PictureRef, models::PictureResponse, models::PictureMutationResponse,
            models::ChangePictureRequest, models::UploadPictureForm,
            models::PostItemTag, models::PostItemPayload, models::CreatePostRequest,
            models::ChangePostItemPayload, models::ChangePostRequest,
            models::PostListItem, models::PostResponse, models::OwnedPostListItem,
            models::OwnedPostResponse, models::PostMutationResponse, models::SlugCheckResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "articles-api", description = "Articles, pictures and accounts")
    )
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// AppState
///
/// The single shared container for every long-lived component. Cloning it is cheap;
/// handlers never receive it whole but project services out of it with `FromRef`.
#[derive(Clone)]
pub struct AppState {
    /// Persistence layer (Postgres in production, in-memory in tests).
    pub repo: RepositoryState,
    /// Media store for uploaded pictures.
    pub storage: StorageState,
    /// Token issuing and verification.
    pub tokens: TokenState,
    /// The loaded, immutable configuration.
    pub config: AppConfig,
}

impl AppState {
    pub fn new(repo: RepositoryState, storage: StorageState, config: AppConfig) -> Self {
        Self {
            repo,
            storage,
            tokens: Arc::new(TokenService::from_config(&config)),
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for TokenState {
    fn from_ref(app_state: &AppState) -> TokenState {
        app_state.tokens.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles routing, the static file mount and the middleware stack, and binds the state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let uploads = ServeDir::new(&state.config.uploads_dir);
    let static_path = state.config.static_path.clone();

    // 2. Base Router Assembly
    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        // Public and authenticated routes share paths (e.g. `/post`) with disjoint methods.
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth::auth_middleware,
            )),
        )
        // GET <static_path>/<filename>
        .nest_service(&static_path, uploads)
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS
        .layer(cors)
}

/// trace_span_logger
///
/// Puts the `x-request-id` set by `SetRequestIdLayer` on the request span so every log
/// line of one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
