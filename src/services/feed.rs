// src/services/feed.rs

//! Feed assembly: ranged reads over the store, enriched per viewer.
//!
//! Paging is offset based and not snapshot isolated. Posts created or deleted
//! between two page fetches can shift rows, so a client may see a post twice
//! or skip one. This is accepted for a social feed.

use uuid::Uuid;

use crate::{
    error::AppError,
    models::post::{EnrichedPost, FeedResponse},
    services::{engagement, social},
    store::{PostScope, RowRange, Store},
};

/// Posts per page, system wide.
pub const PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedKind {
    /// Every post, newest first ("For You").
    Global,
    /// Posts of the accounts the viewer follows.
    Following,
    /// Posts of a single account (profile page).
    Author(Uuid),
}

/// Position in a feed: which slice of `page_size` rows to read next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedCursor {
    pub page_index: u32,
    pub page_size: u32,
}

impl FeedCursor {
    pub fn first() -> Self {
        Self::at(0)
    }

    pub fn at(page_index: u32) -> Self {
        Self {
            page_index,
            page_size: PAGE_SIZE,
        }
    }

    pub fn next(self) -> Self {
        Self {
            page_index: self.page_index.saturating_add(1),
            ..self
        }
    }

    fn range(self) -> Result<RowRange, AppError> {
        let offset = i64::from(self.page_index)
            .checked_mul(i64::from(self.page_size))
            .ok_or_else(|| AppError::BadRequest("Page index out of range".to_string()))?;
        Ok(RowRange {
            offset,
            limit: i64::from(self.page_size),
        })
    }
}

#[derive(Debug, Clone)]
pub struct FeedPage {
    pub posts: Vec<EnrichedPost>,
    /// True when the page came back full. The last full page of a feed
    /// therefore still reports true; the empty fetch after it ends the feed.
    pub has_more: bool,
    pub next_cursor: Option<FeedCursor>,
}

impl FeedPage {
    fn from_posts(posts: Vec<EnrichedPost>, cursor: FeedCursor) -> Self {
        let has_more = posts.len() as u32 == cursor.page_size;
        Self {
            posts,
            has_more,
            next_cursor: has_more.then(|| cursor.next()),
        }
    }

    fn empty() -> Self {
        Self {
            posts: Vec::new(),
            has_more: false,
            next_cursor: None,
        }
    }
}

impl From<FeedPage> for FeedResponse {
    fn from(page: FeedPage) -> Self {
        FeedResponse {
            posts: page.posts,
            has_more: page.has_more,
            next_page: page.next_cursor.map(|c| c.page_index),
        }
    }
}

/// Reads one page of `feed` for `viewer`.
///
/// The Following feed needs a viewer; with no followed accounts it returns an
/// empty, finished page without reading posts. Any store failure abandons the
/// whole page.
pub async fn get_page(
    store: &dyn Store,
    feed: FeedKind,
    viewer: Option<Uuid>,
    cursor: FeedCursor,
) -> Result<FeedPage, AppError> {
    let range = cursor.range()?;

    let scope = match feed {
        FeedKind::Global => PostScope::All,
        FeedKind::Author(owner) => PostScope::Owners(vec![owner]),
        FeedKind::Following => {
            let viewer = viewer.ok_or_else(|| {
                AppError::AuthError("Sign in to see posts from people you follow".to_string())
            })?;
            let followed = social::followed_ids(store, viewer).await?;
            if followed.is_empty() {
                return Ok(FeedPage::empty());
            }
            PostScope::Owners(followed.into_iter().collect())
        }
    };

    let rows = store.fetch_post_rows(&scope, range).await.map_err(|e| {
        tracing::error!("Failed to fetch {:?} feed page {}: {}", feed, cursor.page_index, e);
        AppError::from(e)
    })?;

    Ok(FeedPage::from_posts(engagement::enrich(rows, viewer), cursor))
}

/// Client-side driver of a feed for in-process consumers of the crate.
///
/// The HTTP handlers serve one stateless page per request; this is the
/// caller loop over them. It keeps requesting until a short page comes back,
/// and a failed fetch forces `has_more` to false so callers do not loop on a
/// broken store.
#[derive(Debug, Clone)]
pub struct FeedPager {
    feed: FeedKind,
    viewer: Option<Uuid>,
    cursor: FeedCursor,
    has_more: bool,
}

impl FeedPager {
    pub fn new(feed: FeedKind, viewer: Option<Uuid>) -> Self {
        Self {
            feed,
            viewer,
            cursor: FeedCursor::first(),
            has_more: true,
        }
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn cursor(&self) -> FeedCursor {
        self.cursor
    }

    pub async fn next_page(&mut self, store: &dyn Store) -> Result<Vec<EnrichedPost>, AppError> {
        if !self.has_more {
            return Ok(Vec::new());
        }

        match get_page(store, self.feed, self.viewer, self.cursor).await {
            Ok(page) => {
                self.has_more = page.has_more;
                if let Some(next) = page.next_cursor {
                    self.cursor = next;
                }
                Ok(page.posts)
            }
            Err(e) => {
                self.has_more = false;
                Err(e)
            }
        }
    }
}
