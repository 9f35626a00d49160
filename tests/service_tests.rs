use std::sync::Arc;

use articles_api::{
    InMemoryRepository, MockStorageService, TokenService,
    error::{ApiError, EMAIL_TAKEN, SLUG_TAKEN},
    models::{
        ChangePasswordRequest, ChangePictureRequest, ChangePostItemPayload, ChangePostRequest,
        CreatePostRequest, CreateUserRequest, LoginRequest, Pagination, PostItemPayload,
        PostItemTag, SearchQuery, UpdateUserRequest,
    },
    repository::{Repository, RepositoryState},
    services::{AuthService, PictureService, PictureUpload, PostService, SearchService, UserService},
    storage::{MAX_UPLOAD_BYTES, StorageState},
};
use axum::http::StatusCode;
use bytes::Bytes;
use uuid::Uuid;

const PASSWORD: &str = "123456789";

struct Fixture {
    repo: Arc<InMemoryRepository>,
    storage: Arc<MockStorageService>,
    tokens: Arc<TokenService>,
    auth: AuthService,
    users: UserService,
    pictures: PictureService,
    posts: PostService,
    search: SearchService,
}

impl Fixture {
    fn new() -> Self {
        Self::with_storage(MockStorageService::new())
    }

    fn with_storage(storage: MockStorageService) -> Self {
        let repo = Arc::new(InMemoryRepository::new());
        let storage = Arc::new(storage);
        let tokens = Arc::new(TokenService::new("service-test-secret", 3600));

        let repo_state: RepositoryState = repo.clone();
        let storage_state: StorageState = storage.clone();

        Self {
            auth: AuthService::new(repo_state.clone(), tokens.clone()),
            users: UserService::new(repo_state.clone(), storage_state.clone(), 4),
            pictures: PictureService::new(repo_state.clone(), storage_state),
            posts: PostService::new(repo_state.clone()),
            search: SearchService::new(repo_state),
            repo,
            storage,
            tokens,
        }
    }

    async fn register(&self, email: &str) -> Uuid {
        self.users
            .create(CreateUserRequest {
                email: email.to_string(),
                first_name: "Irineu".to_string(),
                last_name: "Silva".to_string(),
                password: PASSWORD.to_string(),
                description: None,
            })
            .await
            .unwrap();
        self.repo
            .find_user_by_email(email)
            .await
            .unwrap()
            .unwrap()
            .id
    }

    async fn upload(&self, owner: Uuid) -> Uuid {
        self.pictures
            .upload(owner, png("banner.png"))
            .await
            .unwrap()
            .picture
            .id
    }

    async fn post_id(&self, owner: Uuid, slug: &str) -> Uuid {
        self.posts
            .list_owned(owner, page(1, 100))
            .await
            .unwrap()
            .data
            .into_iter()
            .find(|post| post.slug == slug)
            .unwrap()
            .id
    }

    async fn create_post(&self, owner: Uuid, slug: &str, title: &str) -> Result<String, ApiError> {
        let banner_id = self.upload(owner).await;
        self.posts
            .create(owner, post_request(slug, title, banner_id))
            .await
            .map(|r| r.slug)
    }
}

fn png(name: &str) -> PictureUpload {
    PictureUpload {
        original_name: name.to_string(),
        content_type: "image/png".to_string(),
        bytes: Bytes::from_static(b"\x89PNG fake"),
        description: Some("a picture".to_string()),
    }
}

fn post_request(slug: &str, title: &str, banner_id: Uuid) -> CreatePostRequest {
    CreatePostRequest {
        slug: slug.to_string(),
        title: title.to_string(),
        banner_id,
        data: vec![
            PostItemPayload {
                tag: PostItemTag::Subtitle,
                data: "Second".to_string(),
                index: 1,
                picture_id: None,
            },
            PostItemPayload {
                tag: PostItemTag::Text,
                data: "First".to_string(),
                index: 0,
                picture_id: None,
            },
        ],
    }
}

fn page(page: i64, take: i64) -> Pagination {
    Pagination { page, take }
}

// --- Accounts ---

#[tokio::test]
async fn test_login_issues_token_for_the_user() {
    let fx = Fixture::new();
    let user_id = fx.register("irineu@example.com").await;

    let response = fx
        .auth
        .login(LoginRequest {
            email: "irineu@example.com".to_string(),
            password: PASSWORD.to_string(),
        })
        .await
        .unwrap();

    assert_eq!(fx.tokens.verify(&response.access_token).unwrap().sub, user_id);
    assert_eq!(response.user.email, "irineu@example.com");
    assert_eq!(response.user.first_name, "Irineu");
}

#[tokio::test]
async fn test_login_failures_look_the_same() {
    let fx = Fixture::new();
    fx.register("irineu@example.com").await;

    let wrong_password = fx
        .auth
        .login(LoginRequest {
            email: "irineu@example.com".to_string(),
            password: "987654321".to_string(),
        })
        .await
        .unwrap_err();
    let unknown_email = fx
        .auth
        .login(LoginRequest {
            email: "nobody@example.com".to_string(),
            password: PASSWORD.to_string(),
        })
        .await
        .unwrap_err();

    assert!(matches!(wrong_password, ApiError::InvalidCredentials));
    assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    assert_eq!(unknown_email.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_duplicate_email_is_rejected() {
    let fx = Fixture::new();
    fx.register("irineu@example.com").await;

    let err = fx
        .users
        .create(CreateUserRequest {
            email: "irineu@example.com".to_string(),
            first_name: "Other".to_string(),
            last_name: "Person".to_string(),
            password: PASSWORD.to_string(),
            description: None,
        })
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(err.to_string(), EMAIL_TAKEN);
}

#[tokio::test]
async fn test_profile_patch_cannot_take_another_email() {
    let fx = Fixture::new();
    let first = fx.register("first@example.com").await;
    fx.register("second@example.com").await;

    let err = fx
        .users
        .update(
            first,
            UpdateUserRequest {
                email: Some("second@example.com".to_string()),
                ..UpdateUserRequest::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), EMAIL_TAKEN);

    let updated = fx
        .users
        .update(
            first,
            UpdateUserRequest {
                email: Some("renamed@example.com".to_string()),
                first_name: Some("Renamed".to_string()),
                ..UpdateUserRequest::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.message, "User updated successfully");
    assert_eq!(updated.user.email, "renamed@example.com");
    assert_eq!(updated.user.first_name, "Renamed");
    assert_eq!(updated.user.last_name, "Silva");
}

#[tokio::test]
async fn test_change_password_checks_the_current_one() {
    let fx = Fixture::new();
    let user_id = fx.register("irineu@example.com").await;

    let err = fx
        .users
        .change_password(
            user_id,
            ChangePasswordRequest {
                current_password: "wrong-pass".to_string(),
                new_password: "new-password".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidPassword));
    assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);

    fx.users
        .change_password(
            user_id,
            ChangePasswordRequest {
                current_password: PASSWORD.to_string(),
                new_password: "new-password".to_string(),
            },
        )
        .await
        .unwrap();

    let login = fx
        .auth
        .login(LoginRequest {
            email: "irineu@example.com".to_string(),
            password: "new-password".to_string(),
        })
        .await;
    assert!(login.is_ok());
}

#[tokio::test]
async fn test_account_deletion_removes_everything() {
    let fx = Fixture::new();
    let user_id = fx.register("irineu@example.com").await;
    fx.create_post(user_id, "my-first-post", "My first post")
        .await
        .unwrap();
    fx.upload(user_id).await;
    assert_eq!(fx.storage.len().await, 2);

    fx.users.delete(user_id).await.unwrap();

    assert!(fx.storage.is_empty().await);
    assert_eq!(fx.posts.list(page(1, 20)).await.unwrap().total, 0);

    // The token outlives the account.
    let err = fx.users.profile(user_id).await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));
    let err = fx.pictures.upload(user_id, png("late.png")).await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));
    assert!(fx.storage.is_empty().await);
}

// --- Pictures ---

#[tokio::test]
async fn test_upload_rejects_non_images() {
    let fx = Fixture::new();
    let user_id = fx.register("irineu@example.com").await;

    let err = fx
        .pictures
        .upload(
            user_id,
            PictureUpload {
                content_type: "application/pdf".to_string(),
                ..png("report.pdf")
            },
        )
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(err.to_string(), "Invalid file type.");
    assert!(fx.storage.is_empty().await);
}

#[tokio::test]
async fn test_upload_rejects_oversized_files() {
    let fx = Fixture::new();
    let user_id = fx.register("irineu@example.com").await;

    let err = fx
        .pictures
        .upload(
            user_id,
            PictureUpload {
                bytes: Bytes::from(vec![0u8; MAX_UPLOAD_BYTES + 1]),
                ..png("huge.png")
            },
        )
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(fx.storage.is_empty().await);
}

#[tokio::test]
async fn test_storage_failure_is_internal() {
    let fx = Fixture::with_storage(MockStorageService::new_failing());
    let user_id = fx.register("irineu@example.com").await;

    let err = fx.pictures.upload(user_id, png("a.png")).await.unwrap_err();
    assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(err.to_string(), "Internal server error");
}

#[tokio::test]
async fn test_pictures_are_owner_scoped() {
    let fx = Fixture::new();
    let alice = fx.register("alice@example.com").await;
    let bob = fx.register("bob@example.com").await;
    let picture_id = fx.upload(alice).await;

    let err = fx.pictures.delete(bob, picture_id).await.unwrap_err();
    assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(err.to_string(), "Picture not found");

    let err = fx
        .pictures
        .change(
            bob,
            ChangePictureRequest {
                id: picture_id,
                description: Some("mine now".to_string()),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

    assert_eq!(fx.pictures.list(bob, page(1, 20)).await.unwrap().total, 0);
    assert_eq!(fx.pictures.list(alice, page(1, 20)).await.unwrap().total, 1);
}

#[tokio::test]
async fn test_picture_description_change_and_delete() {
    let fx = Fixture::new();
    let user_id = fx.register("irineu@example.com").await;
    let picture_id = fx.upload(user_id).await;

    let changed = fx
        .pictures
        .change(
            user_id,
            ChangePictureRequest {
                id: picture_id,
                description: Some("a better description".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(changed.message, "Picture changed successfully");
    assert_eq!(
        changed.picture.description.as_deref(),
        Some("a better description")
    );

    let deleted = fx.pictures.delete(user_id, picture_id).await.unwrap();
    assert_eq!(deleted.message, "Picture deleted successfully");
    assert!(fx.storage.is_empty().await);

    let err = fx.pictures.delete(user_id, picture_id).await.unwrap_err();
    assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
}

// --- Posts ---

#[tokio::test]
async fn test_post_slug_is_normalised_and_unique() {
    let fx = Fixture::new();
    let user_id = fx.register("irineu@example.com").await;

    let slug = fx
        .create_post(user_id, "My First Post!!", "My first post")
        .await
        .unwrap();
    assert_eq!(slug, "my-first-post");

    let err = fx
        .create_post(user_id, "my-first-post", "Again")
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(err.to_string(), SLUG_TAKEN);

    let err = fx.create_post(user_id, "!!!!", "Symbols").await.unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
}

#[tokio::test]
async fn test_post_detail_orders_blocks_by_index() {
    let fx = Fixture::new();
    let user_id = fx.register("irineu@example.com").await;
    fx.create_post(user_id, "ordered-post", "Ordered post")
        .await
        .unwrap();

    let post = fx.posts.get_by_slug("ordered-post").await.unwrap();
    let blocks: Vec<(i32, &str)> = post
        .data
        .iter()
        .map(|item| (item.index, item.data.as_str()))
        .collect();
    assert_eq!(blocks, vec![(0, "First"), (1, "Second")]);
    assert_eq!(post.owner.first_name, "Irineu");
    assert!(post.banner.is_some());

    let err = fx.posts.get_by_slug("missing-post").await.unwrap_err();
    assert_eq!(err.to_string(), "Post not found");
}

#[tokio::test]
async fn test_post_pictures_must_belong_to_the_author() {
    let fx = Fixture::new();
    let alice = fx.register("alice@example.com").await;
    let bob = fx.register("bob@example.com").await;
    let alice_picture = fx.upload(alice).await;

    let err = fx
        .posts
        .create(bob, post_request("bobs-post", "Bob's post", alice_picture))
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(err.to_string(), "Picture not found");
}

#[tokio::test]
async fn test_post_patch_cannot_take_another_slug() {
    let fx = Fixture::new();
    let user_id = fx.register("irineu@example.com").await;
    fx.create_post(user_id, "first-post", "First post").await.unwrap();
    fx.create_post(user_id, "second-post", "Second post").await.unwrap();
    let second = fx.post_id(user_id, "second-post").await;

    let err = fx
        .posts
        .update(
            user_id,
            ChangePostRequest {
                id: second,
                slug: Some("first-post".to_string()),
                title: None,
                banner_id: None,
                data: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), SLUG_TAKEN);

    // Keeping its own slug is not a collision.
    let kept = fx
        .posts
        .update(
            user_id,
            ChangePostRequest {
                id: second,
                slug: Some("second-post".to_string()),
                title: Some("Renamed".to_string()),
                banner_id: None,
                data: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(kept.slug, "second-post");
}

#[tokio::test]
async fn test_post_patch_updates_and_appends_items() {
    let fx = Fixture::new();
    let user_id = fx.register("irineu@example.com").await;
    fx.create_post(user_id, "patched-post", "Patched post")
        .await
        .unwrap();
    let post_id = fx.post_id(user_id, "patched-post").await;
    let detail = fx.posts.owned_detail(user_id, post_id).await.unwrap();
    let first_item = detail.data[0].id;

    let response = fx
        .posts
        .update(
            user_id,
            ChangePostRequest {
                id: post_id,
                slug: None,
                title: None,
                banner_id: None,
                data: Some(vec![
                    ChangePostItemPayload {
                        id: Some(first_item),
                        data: Some("First, edited".to_string()),
                        ..ChangePostItemPayload::default()
                    },
                    ChangePostItemPayload {
                        tag: Some(PostItemTag::Code),
                        data: Some("fn main() {}".to_string()),
                        index: Some(2),
                        ..ChangePostItemPayload::default()
                    },
                ]),
            },
        )
        .await
        .unwrap();
    assert_eq!(response.message, "Post updated successfully");

    let detail = fx.posts.owned_detail(user_id, post_id).await.unwrap();
    let blocks: Vec<(i32, PostItemTag, &str)> = detail
        .data
        .iter()
        .map(|item| (item.index, item.tag, item.data.as_str()))
        .collect();
    assert_eq!(
        blocks,
        vec![
            (0, PostItemTag::Text, "First, edited"),
            (1, PostItemTag::Subtitle, "Second"),
            (2, PostItemTag::Code, "fn main() {}"),
        ]
    );
}

#[tokio::test]
async fn test_post_patch_item_rules() {
    let fx = Fixture::new();
    let user_id = fx.register("irineu@example.com").await;
    fx.create_post(user_id, "first-post", "First post").await.unwrap();
    fx.create_post(user_id, "second-post", "Second post").await.unwrap();
    let first = fx.post_id(user_id, "first-post").await;
    let second = fx.post_id(user_id, "second-post").await;
    let foreign_item = fx.posts.owned_detail(user_id, first).await.unwrap().data[0].id;

    // An item of another post cannot be edited through this one.
    let err = fx
        .posts
        .update(
            user_id,
            ChangePostRequest {
                id: second,
                slug: None,
                title: None,
                banner_id: None,
                data: Some(vec![ChangePostItemPayload {
                    id: Some(foreign_item),
                    data: Some("hijacked".to_string()),
                    ..ChangePostItemPayload::default()
                }]),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

    // New items need a tag and an index.
    let err = fx
        .posts
        .update(
            user_id,
            ChangePostRequest {
                id: second,
                slug: None,
                title: None,
                banner_id: None,
                data: Some(vec![ChangePostItemPayload {
                    data: Some("orphan".to_string()),
                    ..ChangePostItemPayload::default()
                }]),
            },
        )
        .await
        .unwrap_err();
    match err {
        ApiError::Validation(messages) => assert_eq!(
            messages,
            vec![
                "data.0.tag should not be empty",
                "data.0.index should not be empty"
            ]
        ),
        other => panic!("expected a validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_posts_are_owner_scoped() {
    let fx = Fixture::new();
    let alice = fx.register("alice@example.com").await;
    let bob = fx.register("bob@example.com").await;
    fx.create_post(alice, "alices-post", "Alice's post").await.unwrap();
    let post_id = fx.post_id(alice, "alices-post").await;

    let err = fx.posts.delete(bob, post_id).await.unwrap_err();
    assert_eq!(err.to_string(), "Post not found");
    let err = fx.posts.owned_detail(bob, post_id).await.unwrap_err();
    assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(fx.posts.list_owned(bob, page(1, 20)).await.unwrap().total, 0);

    let deleted = fx.posts.delete(alice, post_id).await.unwrap();
    assert_eq!(deleted.message, "Post deleted successfully");
    assert!(!fx.posts.check_slug(alice, "alices-post").await.unwrap().slug_already_exist);
}

#[tokio::test]
async fn test_deleting_a_banner_keeps_the_post() {
    let fx = Fixture::new();
    let user_id = fx.register("irineu@example.com").await;
    let banner_id = fx.upload(user_id).await;
    fx.posts
        .create(user_id, post_request("bannered-post", "Bannered post", banner_id))
        .await
        .unwrap();

    fx.pictures.delete(user_id, banner_id).await.unwrap();

    let post = fx.posts.get_by_slug("bannered-post").await.unwrap();
    assert!(post.banner.is_none());
}

// --- Listing & Search ---

#[tokio::test]
async fn test_listing_pages_and_counts() {
    let fx = Fixture::new();
    let user_id = fx.register("irineu@example.com").await;
    for n in 0..7 {
        fx.create_post(user_id, &format!("post-number-{n}"), &format!("Post number {n}"))
            .await
            .unwrap();
    }

    let second_page = fx.posts.list(page(2, 5)).await.unwrap();
    assert_eq!(second_page.page, 2);
    assert_eq!(second_page.take, 5);
    assert_eq!(second_page.total, 7);
    assert_eq!(second_page.data.len(), 2);

    let beyond = fx.posts.list(page(3, 5)).await.unwrap();
    assert!(beyond.data.is_empty());
    assert_eq!(beyond.total, 7);
}

#[tokio::test]
async fn test_huge_page_number_is_an_empty_page() {
    let fx = Fixture::new();
    let user_id = fx.register("irineu@example.com").await;
    fx.create_post(user_id, "only-post", "The only post")
        .await
        .unwrap();

    let listing = fx.posts.list(page(i64::MAX, 20)).await.unwrap();
    assert_eq!(listing.page, i64::MAX);
    assert!(listing.data.is_empty());
    assert_eq!(listing.total, 1);

    let owned = fx.posts.list_owned(user_id, page(i64::MAX, i64::MAX)).await.unwrap();
    assert!(owned.data.is_empty());
    assert_eq!(owned.total, 1);
}

#[tokio::test]
async fn test_search_matches_title_words() {
    let fx = Fixture::new();
    let user_id = fx.register("irineu@example.com").await;
    fx.create_post(user_id, "rust-ownership", "Understanding Rust ownership")
        .await
        .unwrap();
    fx.create_post(user_id, "async-rust", "Async Rust in practice")
        .await
        .unwrap();
    fx.create_post(user_id, "go-channels", "Go channels explained")
        .await
        .unwrap();

    let query = |value: &str| SearchQuery {
        value: value.to_string(),
        page: None,
        take: None,
    };

    let rust = fx.search.posts(&query("rust")).await.unwrap();
    assert_eq!(rust.total, 2);
    assert_eq!(rust.page, 1);
    assert_eq!(rust.take, 20);

    let both_words = fx.search.posts(&query("rust ownership")).await.unwrap();
    assert_eq!(both_words.total, 1);
    assert_eq!(both_words.data[0].slug, "rust-ownership");

    let none = fx.search.posts(&query("python")).await.unwrap();
    assert_eq!(none.total, 0);
}
