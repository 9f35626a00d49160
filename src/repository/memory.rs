use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{DuplicateKey, RepoResult, Repository, RepositoryError};
use crate::models::{
    Author, NewPicture, NewPost, NewPostItem, NewUser, Page, Pagination, Picture, PictureRef,
    Post, PostChanges, PostDetail, PostItem, PostItemView, PostSummary, User, UserChanges,
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    pictures: Vec<Picture>,
    posts: Vec<Post>,
    items: Vec<PostItem>,
}

impl Tables {
    fn picture_ref(&self, id: Option<Uuid>) -> Option<PictureRef> {
        let id = id?;
        self.pictures.iter().find(|p| p.id == id).map(|p| PictureRef {
            id: p.id,
            filename: p.filename.clone(),
            description: p.description.clone(),
        })
    }

    fn summary(&self, post: &Post) -> Option<PostSummary> {
        let owner = self.users.iter().find(|u| u.id == post.owner_id)?;
        Some(PostSummary {
            post: post.clone(),
            banner: self.picture_ref(post.banner_id),
            owner: Author {
                first_name: owner.first_name.clone(),
                last_name: owner.last_name.clone(),
                description: owner.description.clone(),
            },
        })
    }

    fn detail(&self, post: &Post) -> Option<PostDetail> {
        let summary = self.summary(post)?;
        let mut items: Vec<PostItemView> = self
            .items
            .iter()
            .filter(|item| item.post_id == post.id)
            .map(|item| PostItemView {
                item: item.clone(),
                picture: self.picture_ref(item.picture_id),
            })
            .collect();
        items.sort_by(|a, b| {
            (a.item.index, a.item.created_at).cmp(&(b.item.index, b.item.created_at))
        });
        Some(PostDetail { summary, items })
    }

    fn page_posts(
        &self,
        pagination: Pagination,
        keep: impl Fn(&Post) -> bool,
    ) -> Page<PostSummary> {
        let mut matching: Vec<&Post> = self.posts.iter().filter(|p| keep(p)).collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = matching.len() as i64;
        let items = window(matching, pagination)
            .into_iter()
            .filter_map(|post| self.summary(post))
            .collect();
        Page { items, total }
    }

    fn new_item(post_id: Uuid, item: NewPostItem) -> PostItem {
        let now = Utc::now();
        PostItem {
            id: Uuid::new_v4(),
            post_id,
            tag: item.tag,
            data: item.data,
            index: item.index,
            picture_id: item.picture_id,
            created_at: now,
            updated_at: now,
        }
    }
}

fn window<T>(rows: Vec<T>, pagination: Pagination) -> Vec<T> {
    rows.into_iter()
        .skip(pagination.skip().max(0) as usize)
        .take(pagination.take.max(0) as usize)
        .collect()
}

/// Lowercased alphanumeric words, the way the `simple` text-search configuration splits them.
fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// InMemoryRepository
///
/// A `Repository` held entirely in process memory. It mirrors the constraints and
/// cascades of the Postgres schema so services can be exercised without a database.
#[derive(Default)]
pub struct InMemoryRepository {
    tables: RwLock<Tables>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    // --- Users ---

    async fn find_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(RepositoryError::Duplicate(DuplicateKey::Email));
        }
        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            password: user.password_hash,
            description: user.description,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(created.clone());
        Ok(created)
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> RepoResult<Option<User>> {
        let mut tables = self.tables.write().await;
        if let Some(email) = &changes.email {
            if tables.users.iter().any(|u| u.id != id && &u.email == email) {
                return Err(RepositoryError::Duplicate(DuplicateKey::Email));
            }
        }
        let Some(user) = tables.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(first_name) = changes.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = changes.last_name {
            user.last_name = last_name;
        }
        if let Some(description) = changes.description {
            user.description = Some(description);
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn update_user_password(&self, id: Uuid, password_hash: &str) -> RepoResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.password = password_hash.to_string();
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_user(&self, id: Uuid) -> RepoResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.users.len();
        tables.users.retain(|u| u.id != id);
        if tables.users.len() == before {
            return Ok(false);
        }

        let owned_posts: Vec<Uuid> = tables
            .posts
            .iter()
            .filter(|p| p.owner_id == id)
            .map(|p| p.id)
            .collect();
        tables.posts.retain(|p| p.owner_id != id);
        tables.items.retain(|i| !owned_posts.contains(&i.post_id));

        let owned_pictures: Vec<Uuid> = tables
            .pictures
            .iter()
            .filter(|p| p.owner_id == id)
            .map(|p| p.id)
            .collect();
        tables.pictures.retain(|p| p.owner_id != id);
        for post in tables.posts.iter_mut() {
            if post.banner_id.is_some_and(|b| owned_pictures.contains(&b)) {
                post.banner_id = None;
            }
        }
        for item in tables.items.iter_mut() {
            if item.picture_id.is_some_and(|p| owned_pictures.contains(&p)) {
                item.picture_id = None;
            }
        }
        Ok(true)
    }

    // --- Pictures ---

    async fn list_pictures(
        &self,
        owner_id: Uuid,
        pagination: Pagination,
    ) -> RepoResult<Page<Picture>> {
        let tables = self.tables.read().await;
        let mut owned: Vec<Picture> = tables
            .pictures
            .iter()
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = owned.len() as i64;
        Ok(Page {
            items: window(owned, pagination),
            total,
        })
    }

    async fn list_picture_filenames(&self, owner_id: Uuid) -> RepoResult<Vec<String>> {
        let tables = self.tables.read().await;
        Ok(tables
            .pictures
            .iter()
            .filter(|p| p.owner_id == owner_id)
            .map(|p| p.filename.clone())
            .collect())
    }

    async fn find_picture(&self, id: Uuid, owner_id: Uuid) -> RepoResult<Option<Picture>> {
        let tables = self.tables.read().await;
        Ok(tables
            .pictures
            .iter()
            .find(|p| p.id == id && p.owner_id == owner_id)
            .cloned())
    }

    async fn create_picture(&self, picture: NewPicture) -> RepoResult<Picture> {
        let mut tables = self.tables.write().await;
        if tables.pictures.iter().any(|p| p.filename == picture.filename) {
            return Err(RepositoryError::Duplicate(DuplicateKey::Filename));
        }
        let now = Utc::now();
        let created = Picture {
            id: Uuid::new_v4(),
            filename: picture.filename,
            description: picture.description,
            size: picture.size,
            owner_id: picture.owner_id,
            created_at: now,
            updated_at: now,
        };
        tables.pictures.push(created.clone());
        Ok(created)
    }

    async fn update_picture_description(
        &self,
        id: Uuid,
        owner_id: Uuid,
        description: Option<String>,
    ) -> RepoResult<Option<Picture>> {
        let mut tables = self.tables.write().await;
        let Some(picture) = tables
            .pictures
            .iter_mut()
            .find(|p| p.id == id && p.owner_id == owner_id)
        else {
            return Ok(None);
        };
        picture.description = description;
        picture.updated_at = Utc::now();
        Ok(Some(picture.clone()))
    }

    async fn delete_picture(&self, id: Uuid, owner_id: Uuid) -> RepoResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.pictures.len();
        tables
            .pictures
            .retain(|p| !(p.id == id && p.owner_id == owner_id));
        if tables.pictures.len() == before {
            return Ok(false);
        }
        for post in tables.posts.iter_mut() {
            if post.banner_id == Some(id) {
                post.banner_id = None;
            }
        }
        for item in tables.items.iter_mut() {
            if item.picture_id == Some(id) {
                item.picture_id = None;
            }
        }
        Ok(true)
    }

    // --- Posts ---

    async fn slug_exists(&self, slug: &str) -> RepoResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables.posts.iter().any(|p| p.slug == slug))
    }

    async fn list_posts(&self, pagination: Pagination) -> RepoResult<Page<PostSummary>> {
        let tables = self.tables.read().await;
        Ok(tables.page_posts(pagination, |_| true))
    }

    async fn list_posts_by_owner(
        &self,
        owner_id: Uuid,
        pagination: Pagination,
    ) -> RepoResult<Page<PostSummary>> {
        let tables = self.tables.read().await;
        Ok(tables.page_posts(pagination, |p| p.owner_id == owner_id))
    }

    async fn search_posts(
        &self,
        value: &str,
        pagination: Pagination,
    ) -> RepoResult<Page<PostSummary>> {
        let terms = words(value);
        let tables = self.tables.read().await;
        Ok(tables.page_posts(pagination, |p| {
            let title = words(&p.title);
            !terms.is_empty() && terms.iter().all(|t| title.contains(t))
        }))
    }

    async fn find_post_by_slug(&self, slug: &str) -> RepoResult<Option<PostDetail>> {
        let tables = self.tables.read().await;
        Ok(tables
            .posts
            .iter()
            .find(|p| p.slug == slug)
            .and_then(|p| tables.detail(p)))
    }

    async fn find_post_detail(&self, id: Uuid, owner_id: Uuid) -> RepoResult<Option<PostDetail>> {
        let tables = self.tables.read().await;
        Ok(tables
            .posts
            .iter()
            .find(|p| p.id == id && p.owner_id == owner_id)
            .and_then(|p| tables.detail(p)))
    }

    async fn create_post(&self, post: NewPost) -> RepoResult<Post> {
        let mut tables = self.tables.write().await;
        if tables.posts.iter().any(|p| p.slug == post.slug) {
            return Err(RepositoryError::Duplicate(DuplicateKey::Slug));
        }
        let now = Utc::now();
        let created = Post {
            id: Uuid::new_v4(),
            slug: post.slug,
            title: post.title,
            owner_id: post.owner_id,
            banner_id: Some(post.banner_id),
            created_at: now,
            updated_at: now,
        };
        tables.posts.push(created.clone());
        for item in post.items {
            let row = Tables::new_item(created.id, item);
            tables.items.push(row);
        }
        Ok(created)
    }

    async fn update_post(
        &self,
        id: Uuid,
        owner_id: Uuid,
        changes: PostChanges,
    ) -> RepoResult<Option<Post>> {
        let mut tables = self.tables.write().await;
        if let Some(slug) = &changes.slug {
            if tables.posts.iter().any(|p| p.id != id && &p.slug == slug) {
                return Err(RepositoryError::Duplicate(DuplicateKey::Slug));
            }
        }
        let now = Utc::now();
        let Some(post) = tables
            .posts
            .iter_mut()
            .find(|p| p.id == id && p.owner_id == owner_id)
        else {
            return Ok(None);
        };
        if let Some(slug) = changes.slug {
            post.slug = slug;
        }
        if let Some(title) = changes.title {
            post.title = title;
        }
        if let Some(banner_id) = changes.banner_id {
            post.banner_id = Some(banner_id);
        }
        post.updated_at = now;
        let updated = post.clone();

        for change in changes.item_updates {
            let Some(item) = tables
                .items
                .iter_mut()
                .find(|i| i.id == change.id && i.post_id == id)
            else {
                continue;
            };
            if let Some(tag) = change.tag {
                item.tag = tag;
            }
            if let Some(data) = change.data {
                item.data = data;
            }
            if let Some(index) = change.index {
                item.index = index;
            }
            if let Some(picture_id) = change.picture_id {
                item.picture_id = Some(picture_id);
            }
            item.updated_at = now;
        }
        for item in changes.new_items {
            let row = Tables::new_item(id, item);
            tables.items.push(row);
        }

        Ok(Some(updated))
    }

    async fn delete_post(&self, id: Uuid, owner_id: Uuid) -> RepoResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.posts.len();
        tables
            .posts
            .retain(|p| !(p.id == id && p.owner_id == owner_id));
        if tables.posts.len() == before {
            return Ok(false);
        }
        tables.items.retain(|i| i.post_id != id);
        Ok(true)
    }
}
