//! Derived views over the held post collection.
//!
//! Every function here is pure and recomputes from scratch; nothing is
//! cached. Unpublished posts never reach any view.

use crate::models::{Category, Post, Tag};
use serde::Serialize;
use std::{cmp::Reverse, collections::HashSet};

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const FEATURED_LIMIT: usize = 5;
pub const RECENT_LIMIT: usize = 5;

/// Search, filter and pagination state held by the content store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    pub query: String,
    pub category: Option<i64>,
    pub tag: Option<i64>,
    /// 1-based.
    pub page: usize,
    pub page_size: usize,
}

impl SearchParams {
    pub fn new(page_size: usize) -> Self {
        Self {
            query: String::new(),
            category: None,
            tag: None,
            page: 1,
            page_size,
        }
    }

    /// Applies the keys present in `update`. The page is taken verbatim when
    /// supplied and reset to 1 otherwise.
    pub fn apply(&mut self, update: SearchUpdate) {
        if let Some(query) = update.query {
            self.query = query;
        }
        if let Some(category) = update.category {
            self.category = category;
        }
        if let Some(tag) = update.tag {
            self.tag = tag;
        }
        self.page = update.page.unwrap_or(1);
    }

    /// Back to empty query, no category, no tag, page 1. Page size is fixed.
    pub fn reset(&mut self) {
        *self = Self::new(self.page_size);
    }
}

impl Default for SearchParams {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

/// Partial update of [`SearchParams`]; `None` means "key not supplied".
///
/// ```
/// use blog_client::stores::SearchUpdate;
///
/// let update = SearchUpdate::new().query("rust").category(None);
/// assert_eq!(update.query.as_deref(), Some("rust"));
/// assert_eq!(update.category, Some(None));
/// assert_eq!(update.tag, None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchUpdate {
    pub query: Option<String>,
    pub category: Option<Option<i64>>,
    pub tag: Option<Option<i64>>,
    pub page: Option<usize>,
}

impl SearchUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn category(mut self, category: Option<i64>) -> Self {
        self.category = Some(category);
        self
    }

    pub fn tag(mut self, tag: Option<i64>) -> Self {
        self.tag = Some(tag);
        self
    }

    pub fn page(mut self, page: usize) -> Self {
        self.page = Some(page);
        self
    }
}

/// One page of a derived view together with its position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub total_pages: usize,
}

fn published(posts: &[Post]) -> impl Iterator<Item = &Post> {
    posts.iter().filter(|post| post.published)
}

fn matches_query(post: &Post, needle: &str) -> bool {
    [&post.title, &post.excerpt, &post.content]
        .into_iter()
        .any(|field| field.to_lowercase().contains(needle))
}

/// Published posts matching the query, category and tag, in held order.
pub fn filtered_posts<'a>(posts: &'a [Post], params: &SearchParams) -> Vec<&'a Post> {
    let needle = params.query.to_lowercase();

    published(posts)
        .filter(|post| needle.is_empty() || matches_query(post, &needle))
        .filter(|post| {
            params
                .category
                .is_none_or(|category| post.category_id() == Some(category))
        })
        .filter(|post| params.tag.is_none_or(|tag| post.has_tag(tag)))
        .collect()
}

/// `items[(page-1)*page_size .. page*page_size]`, clamped. Page 0 and pages
/// past the end are empty.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Vec<T> {
    let Some(start) = page
        .checked_sub(1)
        .and_then(|index| index.checked_mul(page_size))
    else {
        return Vec::new();
    };

    items
        .iter()
        .skip(start)
        .take(page_size)
        .cloned()
        .collect()
}

/// `ceil(count / page_size)`; zero items means zero pages.
pub fn total_pages(count: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    count.div_ceil(page_size)
}

pub fn paginated_posts<'a>(posts: &'a [Post], params: &SearchParams) -> Page<&'a Post> {
    let filtered = filtered_posts(posts, params);
    Page {
        items: paginate(&filtered, params.page, params.page_size),
        page: params.page,
        page_size: params.page_size,
        total: filtered.len(),
        total_pages: total_pages(filtered.len(), params.page_size),
    }
}

/// Most viewed published posts, independent of the search filters.
pub fn featured_posts(posts: &[Post]) -> Vec<&Post> {
    let mut featured: Vec<&Post> = published(posts).collect();
    featured.sort_by_key(|post| Reverse(post.views));
    featured.truncate(FEATURED_LIMIT);
    featured
}

/// Newest published posts, independent of the search filters.
pub fn recent_posts(posts: &[Post]) -> Vec<&Post> {
    let mut recent: Vec<&Post> = published(posts).collect();
    recent.sort_by_key(|post| Reverse(post.created_at));
    recent.truncate(RECENT_LIMIT);
    recent
}

/// Distinct categories referenced by `posts`, first occurrence first.
pub fn categories_from_posts(posts: &[Post]) -> Vec<Category> {
    let mut seen = HashSet::new();
    posts
        .iter()
        .filter_map(|post| post.category.as_ref())
        .filter(|category| seen.insert(category.id))
        .cloned()
        .collect()
}

/// Distinct tags referenced by `posts`, first occurrence first.
pub fn tags_from_posts(posts: &[Post]) -> Vec<Tag> {
    let mut seen = HashSet::new();
    posts
        .iter()
        .flat_map(|post| post.tags.iter())
        .filter(|tag| seen.insert(tag.id))
        .cloned()
        .collect()
}
