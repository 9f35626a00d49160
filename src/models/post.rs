use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::picture::PictureRef;

/// PostItemTag
///
/// Kind of a content block. Stored as the Postgres enum `post_item_tag`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema, TS)]
#[sqlx(type_name = "post_item_tag", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum PostItemTag {
    Text,
    Code,
    Image,
    Subtitle,
}

/// Post
///
/// A row of the `posts` table.
#[derive(Debug, Clone, FromRow)]
pub struct Post {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub owner_id: Uuid,
    // Nulled when the banner picture is deleted.
    pub banner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// PostItem
///
/// A content block. `index` orders blocks within one post only.
#[derive(Debug, Clone, FromRow)]
pub struct PostItem {
    pub id: Uuid,
    pub post_id: Uuid,
    pub tag: PostItemTag,
    pub data: String,
    // `index` is reserved in SQL.
    #[sqlx(rename = "item_index")]
    pub index: i32,
    pub picture_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The public face of a post's author.
#[derive(Debug, Clone)]
pub struct Author {
    pub first_name: String,
    pub last_name: String,
    pub description: Option<String>,
}

/// PostSummary
///
/// A post joined with its banner and author; what every list query returns.
#[derive(Debug, Clone)]
pub struct PostSummary {
    pub post: Post,
    pub banner: Option<PictureRef>,
    pub owner: Author,
}

#[derive(Debug, Clone)]
pub struct PostItemView {
    pub item: PostItem,
    pub picture: Option<PictureRef>,
}

/// PostDetail
///
/// A summary plus its content blocks, ordered by `index`.
#[derive(Debug, Clone)]
pub struct PostDetail {
    pub summary: PostSummary,
    pub items: Vec<PostItemView>,
}

// --- Repository Payloads ---

#[derive(Debug, Clone)]
pub struct NewPostItem {
    pub tag: PostItemTag,
    pub data: String,
    pub index: i32,
    pub picture_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub slug: String,
    pub title: String,
    pub owner_id: Uuid,
    pub banner_id: Uuid,
    pub items: Vec<NewPostItem>,
}

/// Partial update of an existing block. Only blocks of the patched post are touched.
#[derive(Debug, Clone)]
pub struct PostItemChanges {
    pub id: Uuid,
    pub tag: Option<PostItemTag>,
    pub data: Option<String>,
    pub index: Option<i32>,
    pub picture_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub banner_id: Option<Uuid>,
    pub new_items: Vec<NewPostItem>,
    pub item_updates: Vec<PostItemChanges>,
}

// --- Request Payloads ---

fn validate_lowercase(value: &str) -> Result<(), ValidationError> {
    if value.chars().any(char::is_uppercase) {
        return Err(ValidationError::new("lowercase")
            .with_message(Cow::Borrowed("slug must be a lowercase string")));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostItemPayload {
    pub tag: PostItemTag,
    pub data: String,
    #[validate(range(min = 0, message = "index must not be less than 0"))]
    pub index: i32,
    #[schema(example = "a5f5b305-ae3d-493e-a940-b7a5f27a8373")]
    pub picture_id: Option<Uuid>,
}

/// CreatePostRequest
///
/// `POST /post`. A post needs at least one content block.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    #[validate(
        length(min = 4, max = 200, message = "slug must be between 4 and 200 characters"),
        custom(function = validate_lowercase)
    )]
    #[schema(example = "this-is-the-article-slug")]
    pub slug: String,
    #[validate(length(min = 4, max = 124, message = "title must be between 4 and 124 characters"))]
    #[schema(example = "This is the title of the post")]
    pub title: String,
    #[schema(example = "5629df5e-75c1-4710-a53b-b0f02a4a47b4")]
    pub banner_id: Uuid,
    #[validate(length(min = 1, message = "data must contain at least 1 elements"), nested)]
    pub data: Vec<PostItemPayload>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePostItemPayload {
    /// Existing block to update; omit to append a new block.
    pub id: Option<Uuid>,
    pub tag: Option<PostItemTag>,
    pub data: Option<String>,
    #[validate(range(min = 0, message = "index must not be less than 0"))]
    pub index: Option<i32>,
    pub picture_id: Option<Uuid>,
}

/// ChangePostRequest
///
/// `PATCH /post`. Blocks carrying an `id` are updated in place; blocks without one are
/// appended and must then provide `tag` and `index`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePostRequest {
    #[schema(example = "1d7624c1-a0c8-44a6-b2f3-332d7e63924e")]
    pub id: Uuid,
    #[validate(
        length(min = 4, max = 200, message = "slug must be between 4 and 200 characters"),
        custom(function = validate_lowercase)
    )]
    pub slug: Option<String>,
    #[validate(length(min = 4, max = 124, message = "title must be between 4 and 124 characters"))]
    pub title: Option<String>,
    pub banner_id: Option<Uuid>,
    #[validate(length(min = 1, message = "data must contain at least 1 elements"), nested)]
    pub data: Option<Vec<ChangePostItemPayload>>,
}

/// SlugParam
///
/// Path parameter of `GET /post/{slug}` and `GET /post/check/{slug}`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SlugParam {
    #[validate(
        length(min = 4, max = 200, message = "slug must be between 4 and 200 characters"),
        custom(function = validate_lowercase)
    )]
    pub slug: String,
}

/// Normalises a slug: lowercase ASCII letters and digits are kept, every other run of
/// characters becomes a single `-`, and leading/trailing separators are dropped.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

// --- Response Projections ---

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct BannerSummary {
    pub filename: String,
    pub description: Option<String>,
}

impl From<PictureRef> for BannerSummary {
    fn from(picture: PictureRef) -> Self {
        Self {
            filename: picture.filename,
            description: picture.description,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OwnerSummary {
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OwnerProfile {
    pub first_name: String,
    pub last_name: String,
    pub description: Option<String>,
}

/// PostListItem
///
/// A row of the public listing and of search results.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct PostListItem {
    pub slug: String,
    pub title: String,
    pub banner: Option<BannerSummary>,
    pub owner: OwnerSummary,
}

impl From<PostSummary> for PostListItem {
    fn from(summary: PostSummary) -> Self {
        Self {
            slug: summary.post.slug,
            title: summary.post.title,
            banner: summary.banner.map(BannerSummary::from),
            owner: OwnerSummary {
                first_name: summary.owner.first_name,
                last_name: summary.owner.last_name,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct PostItemResponse {
    pub tag: PostItemTag,
    pub data: String,
    pub index: i32,
    pub picture: Option<BannerSummary>,
}

/// PostResponse
///
/// The public article view served by `GET /post/{slug}`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PostResponse {
    pub slug: String,
    pub title: String,
    pub banner: Option<BannerSummary>,
    pub data: Vec<PostItemResponse>,
    pub owner: OwnerProfile,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl From<PostDetail> for PostResponse {
    fn from(detail: PostDetail) -> Self {
        let PostDetail { summary, items } = detail;
        Self {
            slug: summary.post.slug,
            title: summary.post.title,
            banner: summary.banner.map(BannerSummary::from),
            data: items
                .into_iter()
                .map(|view| PostItemResponse {
                    tag: view.item.tag,
                    data: view.item.data,
                    index: view.item.index,
                    picture: view.picture.map(BannerSummary::from),
                })
                .collect(),
            owner: OwnerProfile {
                first_name: summary.owner.first_name,
                last_name: summary.owner.last_name,
                description: summary.owner.description,
            },
            created_at: summary.post.created_at,
        }
    }
}

/// OwnedPostListItem
///
/// A row of `GET /post/user`; carries ids so the author can edit.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OwnedPostListItem {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub banner: Option<BannerSummary>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl From<PostSummary> for OwnedPostListItem {
    fn from(summary: PostSummary) -> Self {
        Self {
            id: summary.post.id,
            slug: summary.post.slug,
            title: summary.post.title,
            banner: summary.banner.map(BannerSummary::from),
            created_at: summary.post.created_at,
            updated_at: summary.post.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OwnedPostItemResponse {
    pub id: Uuid,
    pub tag: PostItemTag,
    pub data: String,
    pub index: i32,
    pub picture: Option<PictureRef>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// OwnedPostResponse
///
/// The editor view served by `GET /post/user/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OwnedPostResponse {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub banner: Option<PictureRef>,
    pub data: Vec<OwnedPostItemResponse>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl From<PostDetail> for OwnedPostResponse {
    fn from(detail: PostDetail) -> Self {
        let PostDetail { summary, items } = detail;
        Self {
            id: summary.post.id,
            slug: summary.post.slug,
            title: summary.post.title,
            banner: summary.banner,
            data: items
                .into_iter()
                .map(|view| OwnedPostItemResponse {
                    id: view.item.id,
                    tag: view.item.tag,
                    data: view.item.data,
                    index: view.item.index,
                    picture: view.picture,
                    created_at: view.item.created_at,
                    updated_at: view.item.updated_at,
                })
                .collect(),
            created_at: summary.post.created_at,
            updated_at: summary.post.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct PostMutationResponse {
    pub message: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SlugCheckResponse {
    pub slug_already_exist: bool,
}
