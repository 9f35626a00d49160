use async_trait::async_trait;
use sqlx::{FromRow, PgConnection, PgPool, Postgres, query_builder::QueryBuilder};
use uuid::Uuid;

use super::{RepoResult, Repository};
use crate::models::{
    Author, NewPicture, NewPost, NewPostItem, NewUser, Page, Pagination, Picture, PictureRef,
    Post, PostChanges, PostDetail, PostItem, PostItemChanges, PostItemView, PostSummary, User,
    UserChanges,
};

const USER_COLUMNS: &str =
    "id, email, first_name, last_name, password, description, created_at, updated_at";
const PICTURE_COLUMNS: &str = "id, filename, description, size, owner_id, created_at, updated_at";
const POST_COLUMNS: &str = "id, slug, title, owner_id, banner_id, created_at, updated_at";

const SUMMARY_SELECT: &str = r#"
    SELECT p.id, p.slug, p.title, p.owner_id, p.banner_id, p.created_at, p.updated_at,
           b.filename AS banner_filename, b.description AS banner_description,
           u.first_name AS owner_first_name, u.last_name AS owner_last_name,
           u.description AS owner_description
    FROM posts p
    JOIN users u ON u.id = p.owner_id
    LEFT JOIN pictures b ON b.id = p.banner_id
"#;

/// Row filters shared by the post listing, search and detail queries.
enum PostFilter<'a> {
    All,
    Owner(Uuid),
    Title(&'a str),
    Slug(&'a str),
    Owned { id: Uuid, owner_id: Uuid },
}

impl PostFilter<'_> {
    fn push(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        match self {
            Self::All => {}
            Self::Owner(owner_id) => {
                builder.push(" WHERE p.owner_id = ").push_bind(*owner_id);
            }
            Self::Title(value) => {
                builder
                    .push(" WHERE to_tsvector('simple', p.title) @@ plainto_tsquery('simple', ")
                    .push_bind(value.to_string())
                    .push(")");
            }
            Self::Slug(slug) => {
                builder.push(" WHERE p.slug = ").push_bind(slug.to_string());
            }
            Self::Owned { id, owner_id } => {
                builder
                    .push(" WHERE p.id = ")
                    .push_bind(*id)
                    .push(" AND p.owner_id = ")
                    .push_bind(*owner_id);
            }
        }
    }
}

#[derive(FromRow)]
struct PostSummaryRow {
    #[sqlx(flatten)]
    post: Post,
    banner_filename: Option<String>,
    banner_description: Option<String>,
    owner_first_name: String,
    owner_last_name: String,
    owner_description: Option<String>,
}

impl From<PostSummaryRow> for PostSummary {
    fn from(row: PostSummaryRow) -> Self {
        let banner = match (row.post.banner_id, row.banner_filename) {
            (Some(id), Some(filename)) => Some(PictureRef {
                id,
                filename,
                description: row.banner_description,
            }),
            _ => None,
        };
        Self {
            post: row.post,
            banner,
            owner: Author {
                first_name: row.owner_first_name,
                last_name: row.owner_last_name,
                description: row.owner_description,
            },
        }
    }
}

#[derive(FromRow)]
struct PostItemRow {
    #[sqlx(flatten)]
    item: PostItem,
    picture_filename: Option<String>,
    picture_description: Option<String>,
}

impl From<PostItemRow> for PostItemView {
    fn from(row: PostItemRow) -> Self {
        let picture = match (row.item.picture_id, row.picture_filename) {
            (Some(id), Some(filename)) => Some(PictureRef {
                id,
                filename,
                description: row.picture_description,
            }),
            _ => None,
        };
        Self {
            item: row.item,
            picture,
        }
    }
}

/// PostgresRepository
///
/// The `Repository` implementation backed by PostgreSQL. All queries are runtime-checked
/// and parameterised; dynamic filters go through `QueryBuilder`.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn page_posts(
        &self,
        filter: PostFilter<'_>,
        pagination: Pagination,
    ) -> RepoResult<Page<PostSummary>> {
        let mut count: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM posts p");
        filter.push(&mut count);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(SUMMARY_SELECT);
        filter.push(&mut builder);
        builder
            .push(" ORDER BY p.created_at DESC, p.id LIMIT ")
            .push_bind(pagination.take)
            .push(" OFFSET ")
            .push_bind(pagination.skip());

        let rows = builder
            .build_query_as::<PostSummaryRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page {
            items: rows.into_iter().map(PostSummary::from).collect(),
            total,
        })
    }

    async fn fetch_detail(&self, filter: PostFilter<'_>) -> RepoResult<Option<PostDetail>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(SUMMARY_SELECT);
        filter.push(&mut builder);

        let Some(row) = builder
            .build_query_as::<PostSummaryRow>()
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, PostItemRow>(
            r#"
            SELECT i.id, i.post_id, i.tag, i.data, i.item_index, i.picture_id,
                   i.created_at, i.updated_at,
                   pic.filename AS picture_filename, pic.description AS picture_description
            FROM post_items i
            LEFT JOIN pictures pic ON pic.id = i.picture_id
            WHERE i.post_id = $1
            ORDER BY i.item_index, i.created_at
            "#,
        )
        .bind(row.post.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(PostDetail {
            summary: row.into(),
            items: items.into_iter().map(PostItemView::from).collect(),
        }))
    }
}

async fn insert_item(
    conn: &mut PgConnection,
    post_id: Uuid,
    item: &NewPostItem,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO post_items (id, post_id, tag, data, item_index, picture_id) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(Uuid::new_v4())
    .bind(post_id)
    .bind(item.tag)
    .bind(&item.data)
    .bind(item.index)
    .bind(item.picture_id)
    .execute(conn)
    .await?;
    Ok(())
}

async fn update_item(
    conn: &mut PgConnection,
    post_id: Uuid,
    changes: &PostItemChanges,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE post_items SET
            tag = COALESCE($3, tag),
            data = COALESCE($4, data),
            item_index = COALESCE($5, item_index),
            picture_id = COALESCE($6, picture_id),
            updated_at = NOW()
        WHERE id = $1 AND post_id = $2
        "#,
    )
    .bind(changes.id)
    .bind(post_id)
    .bind(changes.tag)
    .bind(&changes.data)
    .bind(changes.index)
    .bind(changes.picture_id)
    .execute(conn)
    .await?;
    Ok(())
}

#[async_trait]
impl Repository for PostgresRepository {
    // --- Users ---

    async fn find_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let sql = format!(
            "INSERT INTO users (id, email, first_name, last_name, password, description) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {USER_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(&user.email)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.password_hash)
            .bind(&user.description)
            .fetch_one(&self.pool)
            .await?)
    }

    /// update_user
    ///
    /// Partial update with `COALESCE`, so omitted fields keep their stored value.
    async fn update_user(&self, id: Uuid, changes: UserChanges) -> RepoResult<Option<User>> {
        let sql = format!(
            "UPDATE users SET \
                email = COALESCE($2, email), \
                first_name = COALESCE($3, first_name), \
                last_name = COALESCE($4, last_name), \
                description = COALESCE($5, description), \
                updated_at = NOW() \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(changes.email)
            .bind(changes.first_name)
            .bind(changes.last_name)
            .bind(changes.description)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_user_password(&self, id: Uuid, password_hash: &str) -> RepoResult<bool> {
        let result =
            sqlx::query("UPDATE users SET password = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(password_hash)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_user(&self, id: Uuid) -> RepoResult<bool> {
        // Pictures, posts and items go with it through ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- Pictures ---

    async fn list_pictures(
        &self,
        owner_id: Uuid,
        pagination: Pagination,
    ) -> RepoResult<Page<Picture>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pictures WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            "SELECT {PICTURE_COLUMNS} FROM pictures WHERE owner_id = $1 \
             ORDER BY created_at DESC, id LIMIT $2 OFFSET $3"
        );
        let items = sqlx::query_as::<_, Picture>(&sql)
            .bind(owner_id)
            .bind(pagination.take)
            .bind(pagination.skip())
            .fetch_all(&self.pool)
            .await?;

        Ok(Page { items, total })
    }

    async fn list_picture_filenames(&self, owner_id: Uuid) -> RepoResult<Vec<String>> {
        Ok(
            sqlx::query_scalar("SELECT filename FROM pictures WHERE owner_id = $1")
                .bind(owner_id)
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn find_picture(&self, id: Uuid, owner_id: Uuid) -> RepoResult<Option<Picture>> {
        let sql = format!("SELECT {PICTURE_COLUMNS} FROM pictures WHERE id = $1 AND owner_id = $2");
        Ok(sqlx::query_as::<_, Picture>(&sql)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_picture(&self, picture: NewPicture) -> RepoResult<Picture> {
        let sql = format!(
            "INSERT INTO pictures (id, filename, description, size, owner_id) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {PICTURE_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Picture>(&sql)
            .bind(Uuid::new_v4())
            .bind(&picture.filename)
            .bind(&picture.description)
            .bind(picture.size)
            .bind(picture.owner_id)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_picture_description(
        &self,
        id: Uuid,
        owner_id: Uuid,
        description: Option<String>,
    ) -> RepoResult<Option<Picture>> {
        let sql = format!(
            "UPDATE pictures SET description = $3, updated_at = NOW() \
             WHERE id = $1 AND owner_id = $2 RETURNING {PICTURE_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Picture>(&sql)
            .bind(id)
            .bind(owner_id)
            .bind(description)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_picture(&self, id: Uuid, owner_id: Uuid) -> RepoResult<bool> {
        // Banner and item references are nulled by ON DELETE SET NULL.
        let result = sqlx::query("DELETE FROM pictures WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- Posts ---

    async fn slug_exists(&self, slug: &str) -> RepoResult<bool> {
        Ok(
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM posts WHERE slug = $1)")
                .bind(slug)
                .fetch_one(&self.pool)
                .await?,
        )
    }

    async fn list_posts(&self, pagination: Pagination) -> RepoResult<Page<PostSummary>> {
        self.page_posts(PostFilter::All, pagination).await
    }

    async fn list_posts_by_owner(
        &self,
        owner_id: Uuid,
        pagination: Pagination,
    ) -> RepoResult<Page<PostSummary>> {
        self.page_posts(PostFilter::Owner(owner_id), pagination).await
    }

    /// search_posts
    ///
    /// Backed by the GIN index on `to_tsvector('simple', title)`.
    async fn search_posts(
        &self,
        value: &str,
        pagination: Pagination,
    ) -> RepoResult<Page<PostSummary>> {
        self.page_posts(PostFilter::Title(value), pagination).await
    }

    async fn find_post_by_slug(&self, slug: &str) -> RepoResult<Option<PostDetail>> {
        self.fetch_detail(PostFilter::Slug(slug)).await
    }

    async fn find_post_detail(&self, id: Uuid, owner_id: Uuid) -> RepoResult<Option<PostDetail>> {
        self.fetch_detail(PostFilter::Owned { id, owner_id }).await
    }

    async fn create_post(&self, post: NewPost) -> RepoResult<Post> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "INSERT INTO posts (id, slug, title, owner_id, banner_id) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {POST_COLUMNS}"
        );
        let created = sqlx::query_as::<_, Post>(&sql)
            .bind(Uuid::new_v4())
            .bind(&post.slug)
            .bind(&post.title)
            .bind(post.owner_id)
            .bind(post.banner_id)
            .fetch_one(&mut *tx)
            .await?;

        for item in &post.items {
            insert_item(&mut tx, created.id, item).await?;
        }

        tx.commit().await?;
        Ok(created)
    }

    async fn update_post(
        &self,
        id: Uuid,
        owner_id: Uuid,
        changes: PostChanges,
    ) -> RepoResult<Option<Post>> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "UPDATE posts SET \
                slug = COALESCE($3, slug), \
                title = COALESCE($4, title), \
                banner_id = COALESCE($5, banner_id), \
                updated_at = NOW() \
             WHERE id = $1 AND owner_id = $2 RETURNING {POST_COLUMNS}"
        );
        let Some(updated) = sqlx::query_as::<_, Post>(&sql)
            .bind(id)
            .bind(owner_id)
            .bind(&changes.slug)
            .bind(&changes.title)
            .bind(changes.banner_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            // Dropping the transaction rolls it back.
            return Ok(None);
        };

        for item in &changes.item_updates {
            update_item(&mut tx, updated.id, item).await?;
        }
        for item in &changes.new_items {
            insert_item(&mut tx, updated.id, item).await?;
        }

        tx.commit().await?;
        Ok(Some(updated))
    }

    async fn delete_post(&self, id: Uuid, owner_id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
