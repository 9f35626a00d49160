use axum::{Json, extract::State, http::StatusCode};
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::AuthUser,
    error::{ApiResult, ErrorBody},
    extract::{AppJson, AppPath, AppQuery},
    models::{
        ChangePostRequest, CreatePostRequest, MessageResponse, OwnedPostListItem,
        OwnedPostResponse, Paginated, PaginationQuery, PostListItem, PostMutationResponse,
        PostResponse, SlugCheckResponse, SlugParam,
    },
    services::PostService,
};

// --- Public ---

/// list_posts
///
/// [Public Route] Every post, newest first.
#[utoipa::path(
    get,
    path = "/post",
    tag = "post",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Posts", body = Paginated<PostListItem>),
        (status = 400, description = "Invalid paging", body = ErrorBody)
    )
)]
pub async fn list_posts(
    State(service): State<PostService>,
    AppQuery(query): AppQuery<PaginationQuery>,
) -> ApiResult<Json<Paginated<PostListItem>>> {
    query.validate()?;
    Ok(Json(service.list(query.resolve()).await?))
}

/// get_post
///
/// [Public Route] The full article, content blocks ordered by index.
#[utoipa::path(
    get,
    path = "/post/{slug}",
    tag = "post",
    params(("slug" = String, Path, description = "Post slug")),
    responses(
        (status = 200, description = "Post", body = PostResponse),
        (status = 404, description = "Post not found", body = ErrorBody)
    )
)]
pub async fn get_post(
    State(service): State<PostService>,
    AppPath(param): AppPath<SlugParam>,
) -> ApiResult<Json<PostResponse>> {
    param.validate()?;
    Ok(Json(service.get_by_slug(&param.slug).await?))
}

// --- Owner ---

/// create_post
///
/// [Authenticated Route] The slug is normalised before the uniqueness check. Banner and
/// block pictures must belong to the caller.
#[utoipa::path(
    post,
    path = "/post",
    tag = "post",
    security(("bearer" = [])),
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created", body = PostMutationResponse),
        (status = 400, description = "Invalid payload or slug taken", body = ErrorBody),
        (status = 404, description = "Picture not found", body = ErrorBody)
    )
)]
pub async fn create_post(
    AuthUser { id }: AuthUser,
    State(service): State<PostService>,
    AppJson(payload): AppJson<CreatePostRequest>,
) -> ApiResult<(StatusCode, Json<PostMutationResponse>)> {
    payload.validate()?;
    let response = service.create(id, payload).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    patch,
    path = "/post",
    tag = "post",
    security(("bearer" = [])),
    request_body = ChangePostRequest,
    responses(
        (status = 200, description = "Post updated", body = PostMutationResponse),
        (status = 400, description = "Invalid payload or slug taken", body = ErrorBody),
        (status = 404, description = "Post, item or picture not found", body = ErrorBody)
    )
)]
pub async fn update_post(
    AuthUser { id }: AuthUser,
    State(service): State<PostService>,
    AppJson(payload): AppJson<ChangePostRequest>,
) -> ApiResult<Json<PostMutationResponse>> {
    payload.validate()?;
    Ok(Json(service.update(id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/post/{id}",
    tag = "post",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post deleted", body = MessageResponse),
        (status = 404, description = "Post not found", body = ErrorBody)
    )
)]
pub async fn delete_post(
    AuthUser { id: owner_id }: AuthUser,
    State(service): State<PostService>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    Ok(Json(service.delete(owner_id, id).await?))
}

/// check_slug
///
/// [Authenticated Route] Lets an editor test a slug before submitting.
#[utoipa::path(
    get,
    path = "/post/check/{slug}",
    tag = "post",
    security(("bearer" = [])),
    params(("slug" = String, Path, description = "Candidate slug")),
    responses((status = 200, description = "Availability", body = SlugCheckResponse))
)]
pub async fn check_slug(
    AuthUser { id }: AuthUser,
    State(service): State<PostService>,
    AppPath(param): AppPath<SlugParam>,
) -> ApiResult<Json<SlugCheckResponse>> {
    param.validate()?;
    Ok(Json(service.check_slug(id, &param.slug).await?))
}

#[utoipa::path(
    get,
    path = "/post/user",
    tag = "post",
    security(("bearer" = [])),
    params(PaginationQuery),
    responses((status = 200, description = "Caller's posts", body = Paginated<OwnedPostListItem>))
)]
pub async fn list_my_posts(
    AuthUser { id }: AuthUser,
    State(service): State<PostService>,
    AppQuery(query): AppQuery<PaginationQuery>,
) -> ApiResult<Json<Paginated<OwnedPostListItem>>> {
    query.validate()?;
    Ok(Json(service.list_owned(id, query.resolve()).await?))
}

/// get_my_post
///
/// [Authenticated Route] Editor view with block and picture ids.
#[utoipa::path(
    get,
    path = "/post/user/{id}",
    tag = "post",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post", body = OwnedPostResponse),
        (status = 404, description = "Post not found", body = ErrorBody)
    )
)]
pub async fn get_my_post(
    AuthUser { id: owner_id }: AuthUser,
    State(service): State<PostService>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<OwnedPostResponse>> {
    Ok(Json(service.owned_detail(owner_id, id).await?))
}
