use axum::{Json, extract::State};
use validator::Validate;

use crate::{
    error::{ApiResult, ErrorBody},
    extract::AppQuery,
    models::{Paginated, PostListItem, SearchQuery},
    services::SearchService,
};

/// search_posts
///
/// [Public Route] Full-text search over post titles.
#[utoipa::path(
    get,
    path = "/search/posts",
    tag = "search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching posts", body = Paginated<PostListItem>),
        (status = 400, description = "Invalid query", body = ErrorBody)
    )
)]
pub async fn search_posts(
    State(service): State<SearchService>,
    AppQuery(query): AppQuery<SearchQuery>,
) -> ApiResult<Json<Paginated<PostListItem>>> {
    query.validate()?;
    Ok(Json(service.posts(&query).await?))
}
