use std::collections::HashSet;

use axum::extract::FromRef;
use uuid::Uuid;

use super::require_user;
use crate::{
    AppState,
    error::{ApiError, ApiResult, SLUG_TAKEN},
    models::{
        ChangePostRequest, CreatePostRequest, MessageResponse, NewPost, NewPostItem,
        OwnedPostListItem, OwnedPostResponse, Paginated, Pagination, PostChanges,
        PostItemChanges, PostListItem, PostMutationResponse, PostResponse, SlugCheckResponse,
        slugify,
    },
    repository::RepositoryState,
};

/// PostService
///
/// Public reading of articles plus owner-scoped authoring.
#[derive(Clone)]
pub struct PostService {
    repo: RepositoryState,
}

impl FromRef<AppState> for PostService {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.repo.clone())
    }
}

fn normalize_slug(raw: &str) -> ApiResult<String> {
    let slug = slugify(raw);
    if slug.is_empty() {
        return Err(ApiError::Validation(vec![
            "slug must contain at least one letter or digit".to_string(),
        ]));
    }
    Ok(slug)
}

impl PostService {
    pub fn new(repo: RepositoryState) -> Self {
        Self { repo }
    }

    /// Every referenced picture must belong to the author.
    async fn ensure_pictures_owned(
        &self,
        owner_id: Uuid,
        ids: impl IntoIterator<Item = Uuid>,
    ) -> ApiResult<()> {
        let unique: HashSet<Uuid> = ids.into_iter().collect();
        for id in unique {
            if self.repo.find_picture(id, owner_id).await?.is_none() {
                return Err(ApiError::NotFound("Picture not found"));
            }
        }
        Ok(())
    }

    // --- Public ---

    pub async fn list(&self, pagination: Pagination) -> ApiResult<Paginated<PostListItem>> {
        let page = self.repo.list_posts(pagination).await?;
        Ok(Paginated::new(pagination, page.map(PostListItem::from)))
    }

    pub async fn get_by_slug(&self, slug: &str) -> ApiResult<PostResponse> {
        self.repo
            .find_post_by_slug(slug)
            .await?
            .map(PostResponse::from)
            .ok_or(ApiError::NotFound("Post not found"))
    }

    // --- Owner ---

    pub async fn create(
        &self,
        owner_id: Uuid,
        req: CreatePostRequest,
    ) -> ApiResult<PostMutationResponse> {
        require_user(&*self.repo, owner_id).await?;

        let slug = normalize_slug(&req.slug)?;
        if self.repo.slug_exists(&slug).await? {
            return Err(ApiError::BadRequest(SLUG_TAKEN.into()));
        }

        let picture_ids = req.data.iter().filter_map(|item| item.picture_id);
        self.ensure_pictures_owned(owner_id, picture_ids.chain([req.banner_id]))
            .await?;

        let post = self
            .repo
            .create_post(NewPost {
                slug,
                title: req.title,
                owner_id,
                banner_id: req.banner_id,
                items: req
                    .data
                    .into_iter()
                    .map(|item| NewPostItem {
                        tag: item.tag,
                        data: item.data,
                        index: item.index,
                        picture_id: item.picture_id,
                    })
                    .collect(),
            })
            .await?;

        tracing::info!(post_id = %post.id, slug = %post.slug, "post created");
        Ok(PostMutationResponse {
            message: "Post created successfully".to_string(),
            slug: post.slug,
        })
    }

    /// update
    ///
    /// Blocks with an `id` must already belong to this post. Blocks without one are
    /// appended and need a `tag` and an `index`.
    pub async fn update(
        &self,
        owner_id: Uuid,
        req: ChangePostRequest,
    ) -> ApiResult<PostMutationResponse> {
        require_user(&*self.repo, owner_id).await?;

        let current = self
            .repo
            .find_post_detail(req.id, owner_id)
            .await?
            .ok_or(ApiError::NotFound("Post not found"))?;

        let slug = match req.slug.as_deref() {
            Some(raw) => {
                let slug = normalize_slug(raw)?;
                if slug != current.summary.post.slug && self.repo.slug_exists(&slug).await? {
                    return Err(ApiError::BadRequest(SLUG_TAKEN.into()));
                }
                Some(slug)
            }
            None => None,
        };

        let items = req.data.unwrap_or_default();
        let picture_ids = items.iter().filter_map(|item| item.picture_id);
        self.ensure_pictures_owned(owner_id, picture_ids.chain(req.banner_id))
            .await?;

        let existing: HashSet<Uuid> = current.items.iter().map(|view| view.item.id).collect();
        let mut changes = PostChanges {
            slug,
            title: req.title,
            banner_id: req.banner_id,
            ..PostChanges::default()
        };
        let mut missing = Vec::new();

        for (position, item) in items.into_iter().enumerate() {
            match item.id {
                Some(id) => {
                    if !existing.contains(&id) {
                        return Err(ApiError::NotFound("Post item not found"));
                    }
                    changes.item_updates.push(PostItemChanges {
                        id,
                        tag: item.tag,
                        data: item.data,
                        index: item.index,
                        picture_id: item.picture_id,
                    });
                }
                None => match (item.tag, item.index) {
                    (Some(tag), Some(index)) => changes.new_items.push(NewPostItem {
                        tag,
                        data: item.data.unwrap_or_default(),
                        index,
                        picture_id: item.picture_id,
                    }),
                    (tag, index) => {
                        if tag.is_none() {
                            missing.push(format!("data.{position}.tag should not be empty"));
                        }
                        if index.is_none() {
                            missing.push(format!("data.{position}.index should not be empty"));
                        }
                    }
                },
            }
        }
        if !missing.is_empty() {
            return Err(ApiError::Validation(missing));
        }

        let post = self
            .repo
            .update_post(req.id, owner_id, changes)
            .await?
            .ok_or(ApiError::NotFound("Post not found"))?;

        tracing::info!(post_id = %post.id, slug = %post.slug, "post updated");
        Ok(PostMutationResponse {
            message: "Post updated successfully".to_string(),
            slug: post.slug,
        })
    }

    pub async fn delete(&self, owner_id: Uuid, id: Uuid) -> ApiResult<MessageResponse> {
        require_user(&*self.repo, owner_id).await?;

        if !self.repo.delete_post(id, owner_id).await? {
            return Err(ApiError::NotFound("Post not found"));
        }

        tracing::info!(post_id = %id, "post deleted");
        Ok(MessageResponse::new("Post deleted successfully"))
    }

    pub async fn check_slug(&self, owner_id: Uuid, slug: &str) -> ApiResult<SlugCheckResponse> {
        require_user(&*self.repo, owner_id).await?;
        Ok(SlugCheckResponse {
            slug_already_exist: self.repo.slug_exists(&slugify(slug)).await?,
        })
    }

    pub async fn list_owned(
        &self,
        owner_id: Uuid,
        pagination: Pagination,
    ) -> ApiResult<Paginated<OwnedPostListItem>> {
        require_user(&*self.repo, owner_id).await?;
        let page = self.repo.list_posts_by_owner(owner_id, pagination).await?;
        Ok(Paginated::new(pagination, page.map(OwnedPostListItem::from)))
    }

    pub async fn owned_detail(&self, owner_id: Uuid, id: Uuid) -> ApiResult<OwnedPostResponse> {
        require_user(&*self.repo, owner_id).await?;
        self.repo
            .find_post_detail(id, owner_id)
            .await?
            .map(OwnedPostResponse::from)
            .ok_or(ApiError::NotFound("Post not found"))
    }
}
