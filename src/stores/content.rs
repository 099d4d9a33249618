use super::view::{self, Page, SearchParams, SearchUpdate};
use crate::{
    api::ApiClient,
    dto::{CreateCommentRequest, CreatePostRequest, UpdatePostRequest},
    errors::{ActionError, ClientError, report},
    messages::{Locale, Operation},
    models::{Category, Comment, Post, PostId, Tag},
    sync,
};
use std::sync::{
    RwLock,
    atomic::{AtomicU64, AtomicUsize, Ordering},
};
use tracing::{debug, info, warn};
use validator::Validate;

#[derive(Debug, Default)]
struct ContentState {
    posts: Vec<Post>,
    current_post: Option<Post>,
    categories: Vec<Category>,
    tags: Vec<Tag>,
    error: Option<String>,
    total_posts: usize,
    search: SearchParams,
}

/// Monotonic request tickets. Only the newest ticket of a kind may apply
/// its response, so a slow stale response cannot overwrite a newer one.
#[derive(Debug, Default)]
struct Generation(AtomicU64);

impl Generation {
    fn issue(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.0.load(Ordering::SeqCst) == ticket
    }
}

/// Counts an in-flight request for as long as it lives.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn start(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Posts, the post being viewed, vocabularies and search state, plus the
/// derived listing views computed from them on every read.
pub struct ContentStore {
    api: ApiClient,
    locale: Locale,
    state: RwLock<ContentState>,
    listing: Generation,
    detail: Generation,
    in_flight: AtomicUsize,
}

impl ContentStore {
    pub fn new(api: ApiClient, locale: Locale, page_size: usize) -> Self {
        Self {
            api,
            locale,
            state: RwLock::new(ContentState {
                search: SearchParams::new(page_size),
                ..ContentState::default()
            }),
            listing: Generation::default(),
            detail: Generation::default(),
            in_flight: AtomicUsize::new(0),
        }
    }

    fn fail(&self, op: Operation, err: &ClientError) -> ActionError {
        report(op.name(), err, op.default_message(self.locale))
    }

    fn record(&self, error: &ActionError) {
        sync::write(&self.state).error = Some(error.message.clone());
    }

    fn clear_error(&self) {
        sync::write(&self.state).error = None;
    }

    // ------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------

    /// Replaces the collection with the backend's full listing and returns
    /// the number of posts now held. A response overtaken by a newer fetch is
    /// dropped, and the count then reflects whatever collection is held. On
    /// failure the held collection is kept and the error recorded.
    pub async fn fetch_posts(&self) -> Result<usize, ActionError> {
        let ticket = self.listing.issue();
        let _loading = InFlight::start(&self.in_flight);
        self.clear_error();

        match self.api.list_posts().await {
            Ok(posts) => {
                let mut state = sync::write(&self.state);
                if !self.listing.is_current(ticket) {
                    debug!(ticket, "discarding stale post listing");
                    return Ok(state.posts.len());
                }
                let count = posts.len();
                state.total_posts = count;
                state.posts = posts;
                info!(count, "post listing loaded");
                Ok(count)
            }
            Err(err) => {
                let error = self.fail(Operation::FetchPosts, &err);
                if self.listing.is_current(ticket) {
                    self.record(&error);
                }
                Err(error)
            }
        }
    }

    /// Loads one post and makes it current. `None` on failure; the error is
    /// recorded and the held collection is left alone.
    pub async fn fetch_post_by_id(&self, id: PostId) -> Option<Post> {
        let ticket = self.detail.issue();
        let _loading = InFlight::start(&self.in_flight);
        self.clear_error();

        match self.api.get_post(id).await {
            Ok(post) => {
                if self.detail.is_current(ticket) {
                    sync::write(&self.state).current_post = Some(post.clone());
                } else {
                    debug!(ticket, %id, "discarding stale post detail");
                }
                Some(post)
            }
            Err(err) => {
                let error = self.fail(Operation::FetchPost, &err);
                if self.detail.is_current(ticket) {
                    self.record(&error);
                }
                None
            }
        }
    }

    /// Failures are logged only; the listing must stay usable without a
    /// vocabulary.
    pub async fn fetch_categories(&self) {
        match self.api.list_categories().await {
            Ok(categories) => sync::write(&self.state).categories = categories,
            Err(err) => warn!(error = %err, "failed to fetch categories"),
        }
    }

    pub async fn fetch_tags(&self) {
        match self.api.list_tags().await {
            Ok(tags) => sync::write(&self.state).tags = tags,
            Err(err) => warn!(error = %err, "failed to fetch tags"),
        }
    }

    /// Appends the backend's canonical copy of the new post.
    pub async fn create_post(&self, payload: CreatePostRequest) -> Result<Post, ActionError> {
        let _loading = InFlight::start(&self.in_flight);
        self.clear_error();

        let created = async {
            payload.validate()?;
            self.api.create_post(&payload).await
        };

        match created.await {
            Ok(post) => {
                info!(id = %post.id, "post created");
                sync::write(&self.state).posts.push(post.clone());
                Ok(post)
            }
            Err(err) => {
                let error = self.fail(Operation::CreatePost, &err);
                self.record(&error);
                Err(error)
            }
        }
    }

    /// Replaces the matching collection entry, and the current post when it
    /// is the one updated.
    pub async fn update_post(
        &self,
        id: PostId,
        payload: UpdatePostRequest,
    ) -> Result<Post, ActionError> {
        let _loading = InFlight::start(&self.in_flight);
        self.clear_error();

        let updated = async {
            payload.validate()?;
            self.api.update_post(id, &payload).await
        };

        match updated.await {
            Ok(post) => {
                let mut state = sync::write(&self.state);
                if let Some(entry) = state.posts.iter_mut().find(|entry| entry.id == id) {
                    *entry = post.clone();
                }
                if let Some(current) = state.current_post.as_mut().filter(|current| current.id == id) {
                    *current = post.clone();
                }
                info!(%id, "post updated");
                Ok(post)
            }
            Err(err) => {
                let error = self.fail(Operation::UpdatePost, &err);
                self.record(&error);
                Err(error)
            }
        }
    }

    /// Removes the entry from the collection. The current post is kept.
    pub async fn delete_post(&self, id: PostId) -> Result<(), ActionError> {
        let _loading = InFlight::start(&self.in_flight);
        self.clear_error();

        match self.api.delete_post(id).await {
            Ok(()) => {
                sync::write(&self.state).posts.retain(|post| post.id != id);
                info!(%id, "post deleted");
                Ok(())
            }
            Err(err) => {
                let error = self.fail(Operation::DeletePost, &err);
                self.record(&error);
                Err(error)
            }
        }
    }

    /// Returns the like count reported by the backend.
    pub async fn like_post(&self, id: PostId) -> Result<u64, ActionError> {
        match self.api.like_post(id).await {
            Ok(response) => {
                self.set_likes(id, response.likes);
                Ok(response.likes)
            }
            Err(err) => Err(self.fail(Operation::LikePost, &err)),
        }
    }

    pub async fn unlike_post(&self, id: PostId) -> Result<u64, ActionError> {
        match self.api.unlike_post(id).await {
            Ok(response) => {
                self.set_likes(id, response.likes);
                Ok(response.likes)
            }
            Err(err) => Err(self.fail(Operation::UnlikePost, &err)),
        }
    }

    fn set_likes(&self, id: PostId, likes: u64) {
        let mut state = sync::write(&self.state);
        if let Some(entry) = state.posts.iter_mut().find(|entry| entry.id == id) {
            entry.likes = likes;
        }
        if let Some(current) = state.current_post.as_mut().filter(|current| current.id == id) {
            current.likes = likes;
        }
    }

    /// Appends the canonical comment to the current post when it is `post_id`.
    pub async fn add_comment(
        &self,
        post_id: PostId,
        content: impl Into<String>,
    ) -> Result<Comment, ActionError> {
        let payload = CreateCommentRequest {
            content: content.into(),
            post_id,
        };

        let created = async {
            payload.validate()?;
            self.api.add_comment(&payload).await
        };

        match created.await {
            Ok(comment) => {
                let mut state = sync::write(&self.state);
                if let Some(current) = state
                    .current_post
                    .as_mut()
                    .filter(|current| current.id == post_id)
                {
                    current
                        .comments
                        .get_or_insert_with(Vec::new)
                        .push(comment.clone());
                }
                info!(%post_id, comment = comment.id, "comment added");
                Ok(comment)
            }
            Err(err) => Err(self.fail(Operation::AddComment, &err)),
        }
    }

    pub fn set_search_params(&self, update: SearchUpdate) {
        sync::write(&self.state).search.apply(update);
    }

    pub fn reset_search_params(&self) {
        sync::write(&self.state).search.reset();
    }

    // ------------------------------------------------------------------
    // State
    // ------------------------------------------------------------------

    /// True while at least one listing, detail or mutation request is in flight.
    pub fn loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub fn error(&self) -> Option<String> {
        sync::read(&self.state).error.clone()
    }

    pub fn posts(&self) -> Vec<Post> {
        sync::read(&self.state).posts.clone()
    }

    pub fn current_post(&self) -> Option<Post> {
        sync::read(&self.state).current_post.clone()
    }

    pub fn categories(&self) -> Vec<Category> {
        sync::read(&self.state).categories.clone()
    }

    pub fn tags(&self) -> Vec<Tag> {
        sync::read(&self.state).tags.clone()
    }

    /// Size of the last full listing.
    pub fn total_posts(&self) -> usize {
        sync::read(&self.state).total_posts
    }

    pub fn search_params(&self) -> SearchParams {
        sync::read(&self.state).search.clone()
    }

    pub fn post_by_id(&self, id: PostId) -> Option<Post> {
        sync::read(&self.state)
            .posts
            .iter()
            .find(|post| post.id == id)
            .cloned()
    }

    // ------------------------------------------------------------------
    // Derived views
    // ------------------------------------------------------------------

    pub fn filtered_posts(&self) -> Vec<Post> {
        let state = sync::read(&self.state);
        view::filtered_posts(&state.posts, &state.search)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn paginated_posts(&self) -> Page<Post> {
        let state = sync::read(&self.state);
        let page = view::paginated_posts(&state.posts, &state.search);
        Page {
            items: page.items.into_iter().cloned().collect(),
            page: page.page,
            page_size: page.page_size,
            total: page.total,
            total_pages: page.total_pages,
        }
    }

    pub fn total_pages(&self) -> usize {
        let state = sync::read(&self.state);
        let count = view::filtered_posts(&state.posts, &state.search).len();
        view::total_pages(count, state.search.page_size)
    }

    pub fn featured_posts(&self) -> Vec<Post> {
        view::featured_posts(&sync::read(&self.state).posts)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn recent_posts(&self) -> Vec<Post> {
        view::recent_posts(&sync::read(&self.state).posts)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Fetched categories, or those referenced by the held posts when the
    /// vocabulary has not been loaded.
    pub fn known_categories(&self) -> Vec<Category> {
        let state = sync::read(&self.state);
        if state.categories.is_empty() {
            view::categories_from_posts(&state.posts)
        } else {
            state.categories.clone()
        }
    }

    pub fn known_tags(&self) -> Vec<Tag> {
        let state = sync::read(&self.state);
        if state.tags.is_empty() {
            view::tags_from_posts(&state.posts)
        } else {
            state.tags.clone()
        }
    }
}
