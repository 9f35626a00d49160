use axum::extract::FromRef;

use crate::{
    AppState,
    error::ApiResult,
    models::{Paginated, PostListItem, SearchQuery},
    repository::RepositoryState,
};

#[derive(Clone)]
pub struct SearchService {
    repo: RepositoryState,
}

impl FromRef<AppState> for SearchService {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.repo.clone())
    }
}

impl SearchService {
    pub fn new(repo: RepositoryState) -> Self {
        Self { repo }
    }

    /// Title search over all posts, in the public listing shape.
    pub async fn posts(&self, query: &SearchQuery) -> ApiResult<Paginated<PostListItem>> {
        let pagination = query.pagination();
        let page = self
            .repo
            .search_posts(query.value.trim(), pagination)
            .await?;
        Ok(Paginated::new(pagination, page.map(PostListItem::from)))
    }
}
