//! In-process fake of the blog backend, served with axum on a random port.

#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use blog_client::{
    AppState, ClientConfig, Locale,
    dto::{
        AuthResponse, ChangePasswordRequest, CreateCommentRequest, CreatePostRequest,
        LoginRequest, RegisterRequest, UpdatePostRequest, UpdateProfileRequest,
    },
    models::{Category, Comment, Post, PostId, Role, Tag, UserProfile},
    storage::Storage,
};
use chrono::{NaiveDate, NaiveDateTime};
use dashmap::DashMap;
use serde_json::json;
use std::{
    sync::{
        Arc,
        atomic::{AtomicI64, Ordering},
    },
    time::Duration,
};
use url::Url;

pub const PAGE_SIZE: usize = 4;

#[derive(Clone)]
pub struct Account {
    pub password: String,
    pub profile: UserProfile,
}

#[derive(Clone)]
pub struct BackendState {
    pub posts: Arc<DashMap<i64, Post>>,
    pub categories: Arc<Vec<Category>>,
    pub tags: Arc<Vec<Tag>>,
    pub accounts: Arc<DashMap<String, Account>>,
    /// Issued bearer tokens and the username they belong to.
    pub sessions: Arc<DashMap<String, String>>,
    /// Artificial latency for `GET /api/posts/{id}`, in milliseconds.
    pub delays: Arc<DashMap<i64, u64>>,
    /// One-shot latency for the next request to a route, in milliseconds.
    pub route_delays: Arc<DashMap<&'static str, u64>>,
    /// Forced failures keyed by route name.
    pub failures: Arc<DashMap<&'static str, (StatusCode, Option<&'static str>)>>,
    /// Last `Authorization` header seen per route name.
    pub authorization_seen: Arc<DashMap<&'static str, Option<String>>>,
    next_id: Arc<AtomicI64>,
}

pub fn at(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(10, 0, 0))
        .unwrap()
}

fn category(id: i64, name: &str) -> Category {
    Category {
        id,
        name: name.into(),
    }
}

fn tag(id: i64, name: &str) -> Tag {
    Tag {
        id,
        name: name.into(),
    }
}

#[allow(clippy::too_many_arguments)]
fn seed_post(
    id: i64,
    title: &str,
    content: &str,
    created_at: NaiveDateTime,
    views: u64,
    category: Category,
    tags: Vec<Tag>,
    published: bool,
) -> Post {
    Post {
        id: PostId(id),
        title: title.into(),
        excerpt: format!("{title}……"),
        content: content.into(),
        created_at,
        published,
        author: "张三".into(),
        cover_image: Some(format!("https://picsum.photos/id/{id}/600/400")),
        views,
        likes: 10,
        category: Some(category),
        tags,
        comments: None,
    }
}

impl BackendState {
    fn seeded() -> Self {
        let frontend = category(1, "前端开发");
        let backend = category(2, "后端开发");
        let life = category(3, "生活随笔");

        let mut vue = seed_post(
            1,
            "如何使用Vue3构建现代化前端应用",
            "Composition API、Teleport、Fragments",
            at(2023, 4, 15),
            1250,
            frontend.clone(),
            vec![tag(1, "Vue3"), tag(2, "JavaScript")],
            true,
        );
        vue.comments = Some(vec![Comment {
            id: 1,
            author: "李四".into(),
            content: "非常实用的教程，感谢分享！".into(),
            created_at: at(2023, 4, 16),
            avatar: None,
        }]);

        let posts = [
            vue,
            seed_post(
                2,
                "Spring Boot最佳实践",
                "Java生态系统中最受欢迎的框架之一",
                at(2023, 4, 10),
                980,
                backend.clone(),
                vec![tag(4, "Spring Boot"), tag(5, "Java")],
                true,
            ),
            seed_post(
                3,
                "我的旅行日记：杭州西湖",
                "西湖，被誉为人间天堂",
                at(2023, 4, 5),
                756,
                life.clone(),
                vec![tag(7, "旅行")],
                true,
            ),
            seed_post(
                4,
                "Docker入门指南",
                "开源的应用容器引擎",
                at(2023, 3, 28),
                1120,
                backend.clone(),
                vec![tag(10, "Docker")],
                true,
            ),
            seed_post(
                5,
                "JavaScript异步编程详解",
                "从回调函数到Promise，再到async/await",
                at(2023, 3, 20),
                892,
                frontend.clone(),
                vec![tag(2, "JavaScript"), tag(14, "Promise")],
                true,
            ),
            seed_post(
                6,
                "数据结构与算法：二叉树遍历",
                "掌握二叉树的遍历方法是学习数据结构的基础",
                at(2023, 3, 15),
                634,
                backend.clone(),
                vec![tag(16, "算法")],
                true,
            ),
            seed_post(
                7,
                "未发布的草稿",
                "草稿内容",
                at(2023, 4, 20),
                9999,
                frontend.clone(),
                vec![tag(2, "JavaScript")],
                false,
            ),
        ];

        let state = Self {
            posts: Arc::new(posts.into_iter().map(|post| (post.id.get(), post)).collect()),
            categories: Arc::new(vec![frontend, backend, life]),
            tags: Arc::new(vec![
                tag(1, "Vue3"),
                tag(2, "JavaScript"),
                tag(4, "Spring Boot"),
                tag(5, "Java"),
                tag(7, "旅行"),
                tag(10, "Docker"),
                tag(14, "Promise"),
                tag(16, "算法"),
            ]),
            accounts: Arc::new(DashMap::new()),
            sessions: Arc::new(DashMap::new()),
            delays: Arc::new(DashMap::new()),
            route_delays: Arc::new(DashMap::new()),
            failures: Arc::new(DashMap::new()),
            authorization_seen: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicI64::new(100)),
        };

        state.add_account("alice", "secret123", "Alice", "Liddell", Role::User);
        state.add_account("root", "rootpass1", "Site", "Admin", Role::Admin);
        state
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    pub fn add_account(&self, username: &str, password: &str, first: &str, last: &str, role: Role) {
        let profile = UserProfile {
            id: self.next_id(),
            username: username.into(),
            email: format!("{username}@example.com"),
            first_name: first.into(),
            last_name: last.into(),
            role,
        };
        self.accounts.insert(
            username.into(),
            Account {
                password: password.into(),
                profile,
            },
        );
    }

    pub fn fail(&self, route: &'static str, status: StatusCode, message: Option<&'static str>) {
        self.failures.insert(route, (status, message));
    }

    pub fn recover(&self, route: &'static str) {
        self.failures.remove(route);
    }

    /// Holds back the response to the next request on `route`.
    pub fn delay_next(&self, route: &'static str, millis: u64) {
        self.route_delays.insert(route, millis);
    }

    fn take_delay(&self, route: &'static str) -> Option<Duration> {
        self.route_delays
            .remove(route)
            .map(|(_, millis)| Duration::from_millis(millis))
    }

    /// Invalidates every issued token, as an expired or revoked session would.
    pub fn revoke_all_sessions(&self) {
        self.sessions.clear();
    }

    pub fn seen_authorization(&self, route: &'static str) -> Option<String> {
        self.authorization_seen
            .get(route)
            .and_then(|entry| entry.value().clone())
    }

    fn forced(&self, route: &'static str) -> Result<(), Response> {
        match self.failures.get(route) {
            Some(entry) => {
                let (status, message) = *entry.value();
                Err(failure(status, message))
            }
            None => Ok(()),
        }
    }

    fn observe(&self, route: &'static str, headers: &HeaderMap) {
        let value = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        self.authorization_seen.insert(route, value);
    }

    fn authorize(&self, route: &'static str, headers: &HeaderMap) -> Result<Account, Response> {
        self.observe(route, headers);
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .and_then(|token| self.sessions.get(token).map(|entry| entry.value().clone()))
            .and_then(|username| self.accounts.get(&username).map(|entry| entry.value().clone()))
            .ok_or_else(|| failure(StatusCode::UNAUTHORIZED, Some("未授权，请先登录")))
    }

    fn issue_token(&self, username: &str) -> String {
        let token = format!("token-{username}-{}", self.next_id());
        self.sessions.insert(token.clone(), username.to_owned());
        token
    }
}

fn failure(status: StatusCode, message: Option<&str>) -> Response {
    match message {
        Some(message) => (status, Json(json!({ "message": message }))).into_response(),
        None => status.into_response(),
    }
}

fn not_found() -> Response {
    failure(StatusCode::NOT_FOUND, Some("文章不存在"))
}

type Reply<T> = Result<Json<T>, Response>;

async fn list_posts(State(state): State<BackendState>, headers: HeaderMap) -> Reply<Vec<Post>> {
    state.observe("list_posts", &headers);
    // The outcome is fixed on arrival; a delay only holds back the reply.
    let delay = state.take_delay("list_posts");
    let outcome = state.forced("list_posts").map(|()| {
        let mut posts: Vec<Post> = state
            .posts
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        posts.sort_by_key(|post| post.id);
        posts
    });
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    Ok(Json(outcome?))
}

async fn get_post(State(state): State<BackendState>, Path(id): Path<i64>) -> Reply<Post> {
    let delay = state.delays.get(&id).map(|entry| *entry.value());
    if let Some(millis) = delay {
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }
    state.forced("get_post")?;
    let post = state.posts.get(&id).ok_or_else(not_found)?;
    Ok(Json(post.value().clone()))
}

async fn create_post(
    State(state): State<BackendState>,
    headers: HeaderMap,
    Json(payload): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<Post>), Response> {
    let account = state.authorize("create_post", &headers)?;
    let id = state.next_id();
    let post = Post {
        id: PostId(id),
        title: payload.title,
        excerpt: payload.excerpt.unwrap_or_default(),
        content: payload.content,
        created_at: at(2024, 1, 1),
        published: payload.published,
        author: account.profile.username,
        cover_image: payload.cover_image,
        views: 0,
        likes: 0,
        category: payload
            .category_id
            .and_then(|id| state.categories.iter().find(|c| c.id == id).cloned()),
        tags: state
            .tags
            .iter()
            .filter(|tag| payload.tag_ids.contains(&tag.id))
            .cloned()
            .collect(),
        comments: Some(Vec::new()),
    };
    state.posts.insert(id, post.clone());
    Ok((StatusCode::CREATED, Json(post)))
}

async fn update_post(
    State(state): State<BackendState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(payload): Json<UpdatePostRequest>,
) -> Reply<Post> {
    state.authorize("update_post", &headers)?;
    let mut entry = state.posts.get_mut(&id).ok_or_else(not_found)?;
    let post = entry.value_mut();
    if let Some(title) = payload.title {
        post.title = title;
    }
    if let Some(excerpt) = payload.excerpt {
        post.excerpt = excerpt;
    }
    if let Some(content) = payload.content {
        post.content = content;
    }
    if let Some(published) = payload.published {
        post.published = published;
    }
    Ok(Json(post.clone()))
}

async fn delete_post(
    State(state): State<BackendState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, Response> {
    state.authorize("delete_post", &headers)?;
    state.posts.remove(&id).ok_or_else(not_found)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn like_post(State(state): State<BackendState>, Path(id): Path<i64>) -> Reply<Post> {
    state.forced("like_post")?;
    let mut entry = state.posts.get_mut(&id).ok_or_else(not_found)?;
    entry.value_mut().likes += 1;
    Ok(Json(entry.value().clone()))
}

async fn unlike_post(State(state): State<BackendState>, Path(id): Path<i64>) -> Reply<Post> {
    let mut entry = state.posts.get_mut(&id).ok_or_else(not_found)?;
    let post = entry.value_mut();
    post.likes = post.likes.saturating_sub(1);
    Ok(Json(post.clone()))
}

async fn add_comment(
    State(state): State<BackendState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(payload): Json<CreateCommentRequest>,
) -> Reply<Comment> {
    let account = state.authorize("add_comment", &headers)?;
    if payload.post_id != PostId(id) {
        return Err(failure(StatusCode::BAD_REQUEST, Some("文章编号不一致")));
    }
    let comment = Comment {
        id: state.next_id(),
        author: account.profile.username,
        content: payload.content,
        created_at: at(2024, 1, 2),
        avatar: None,
    };
    let mut entry = state.posts.get_mut(&id).ok_or_else(not_found)?;
    entry
        .value_mut()
        .comments
        .get_or_insert_with(Vec::new)
        .push(comment.clone());
    Ok(Json(comment))
}

async fn list_categories(State(state): State<BackendState>) -> Reply<Vec<Category>> {
    state.forced("list_categories")?;
    Ok(Json(state.categories.as_ref().clone()))
}

async fn list_tags(State(state): State<BackendState>) -> Reply<Vec<Tag>> {
    state.forced("list_tags")?;
    Ok(Json(state.tags.as_ref().clone()))
}

async fn login(
    State(state): State<BackendState>,
    Json(payload): Json<LoginRequest>,
) -> Reply<AuthResponse> {
    let account = state
        .accounts
        .get(&payload.username)
        .map(|entry| entry.value().clone())
        .filter(|account| account.password == payload.password)
        // Deliberately no message: the client must fall back to its own.
        .ok_or_else(|| StatusCode::UNAUTHORIZED.into_response())?;

    Ok(Json(AuthResponse {
        token: state.issue_token(&payload.username),
        user: account.profile,
    }))
}

async fn register(
    State(state): State<BackendState>,
    Json(payload): Json<RegisterRequest>,
) -> Reply<AuthResponse> {
    if state.accounts.contains_key(&payload.username) {
        return Err(failure(StatusCode::CONFLICT, Some("用户名已存在")));
    }
    state.add_account(
        &payload.username,
        &payload.password,
        payload.first_name.as_deref().unwrap_or_default(),
        payload.last_name.as_deref().unwrap_or_default(),
        Role::User,
    );
    let account = state
        .accounts
        .get(&payload.username)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| StatusCode::INTERNAL_SERVER_ERROR.into_response())?;

    Ok(Json(AuthResponse {
        token: state.issue_token(&payload.username),
        user: account.profile,
    }))
}

async fn me(State(state): State<BackendState>, headers: HeaderMap) -> Reply<UserProfile> {
    if let Some(delay) = state.take_delay("me") {
        tokio::time::sleep(delay).await;
    }
    state.forced("me")?;
    let account = state.authorize("me", &headers)?;
    Ok(Json(account.profile))
}

async fn update_profile(
    State(state): State<BackendState>,
    headers: HeaderMap,
    Json(payload): Json<UpdateProfileRequest>,
) -> Reply<UserProfile> {
    let account = state.authorize("update_profile", &headers)?;
    let mut entry = state
        .accounts
        .get_mut(&account.profile.username)
        .ok_or_else(|| StatusCode::NOT_FOUND.into_response())?;
    let profile = &mut entry.value_mut().profile;
    if let Some(email) = payload.email {
        profile.email = email;
    }
    if let Some(first_name) = payload.first_name {
        profile.first_name = first_name;
    }
    if let Some(last_name) = payload.last_name {
        profile.last_name = last_name;
    }
    Ok(Json(profile.clone()))
}

async fn change_password(
    State(state): State<BackendState>,
    headers: HeaderMap,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<StatusCode, Response> {
    let account = state.authorize("change_password", &headers)?;
    let mut entry = state
        .accounts
        .get_mut(&account.profile.username)
        .ok_or_else(|| StatusCode::NOT_FOUND.into_response())?;
    if entry.value().password != payload.current_password {
        return Err(failure(StatusCode::BAD_REQUEST, Some("原密码错误")));
    }
    entry.value_mut().password = payload.new_password;
    Ok(StatusCode::NO_CONTENT)
}

fn router(state: BackendState) -> Router {
    Router::new()
        .route("/api/posts", get(list_posts).post(create_post))
        .route(
            "/api/posts/{id}",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route("/api/posts/{id}/like", post(like_post))
        .route("/api/posts/{id}/unlike", post(unlike_post))
        .route("/api/posts/{id}/comments", post(add_comment))
        .route("/api/categories", get(list_categories))
        .route("/api/tags", get(list_tags))
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(register))
        .route("/api/auth/me", get(me))
        .route("/api/users/profile", put(update_profile))
        .route("/api/users/password", put(change_password))
        .with_state(state)
}

pub struct FakeBackend {
    pub state: BackendState,
    pub base_url: Url,
}

impl FakeBackend {
    pub async fn start() -> Self {
        let state = BackendState::seeded();
        let app = router(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            state,
            base_url: Url::parse(&format!("http://{addr}")).unwrap(),
        }
    }

    pub fn config(&self, locale: Locale) -> ClientConfig {
        let mut config = ClientConfig::new(self.base_url.clone());
        config.locale = locale;
        config.page_size = PAGE_SIZE;
        config
    }

    pub fn app(&self, storage: Arc<dyn Storage>) -> AppState {
        self.app_with_locale(storage, Locale::ZhCn)
    }

    pub fn app_with_locale(&self, storage: Arc<dyn Storage>, locale: Locale) -> AppState {
        AppState::new(&self.config(locale), storage).unwrap()
    }
}

pub fn ids(posts: &[Post]) -> Vec<i64> {
    posts.iter().map(|post| post.id.get()).collect()
}
