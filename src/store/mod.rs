// src/store/mod.rs

//! Query interface over the relational store.
//!
//! Everything the core needs from storage goes through [`Store`], so the feed,
//! engagement and insight logic runs the same against Postgres and against
//! the in-process [`MemoryStore`].

pub mod memory;
pub mod postgres;

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    account::{Account, NewAccount, ProfileChanges, ProfileCounts},
    follow::{Follow, FollowEdge},
    like::{Like, LikeEdge},
    post::{NewPost, Post, PostRow},
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A unique constraint rejected the write.
    UniqueViolation(String),
    /// Anything else: connectivity, foreign keys, decoding.
    Backend(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::UniqueViolation(msg) => write!(f, "unique constraint violated: {}", msg),
            StoreError::Backend(msg) => write!(f, "store error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

/// Ownership filter of a ranged post read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostScope {
    /// Every post.
    All,
    /// Only posts whose owner is in the list.
    Owners(Vec<Uuid>),
}

/// Row window of a ranged read: `limit` rows starting at `offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    pub offset: i64,
    pub limit: i64,
}

#[async_trait]
pub trait Store: Send + Sync {
    // --- Accounts ---

    async fn insert_account(&self, account: NewAccount) -> Result<Account, StoreError>;

    async fn find_account(&self, id: Uuid) -> Result<Option<Account>, StoreError>;

    async fn find_account_by_username(&self, username: &str)
    -> Result<Option<Account>, StoreError>;

    /// Applies the changes and returns the updated row, `None` if the account
    /// does not exist.
    async fn update_account(
        &self,
        id: Uuid,
        changes: &ProfileChanges,
    ) -> Result<Option<Account>, StoreError>;

    async fn list_accounts(&self) -> Result<Vec<Account>, StoreError>;

    async fn profile_counts(&self, id: Uuid) -> Result<ProfileCounts, StoreError>;

    // --- Posts ---

    async fn insert_post(&self, post: NewPost) -> Result<Post, StoreError>;

    async fn find_post_owner(&self, post_id: Uuid) -> Result<Option<Uuid>, StoreError>;

    /// Deletes the post and its likes. Returns whether a row was removed.
    async fn delete_post(&self, post_id: Uuid) -> Result<bool, StoreError>;

    /// Ranged read ordered by `created_at DESC, id DESC`, each post joined
    /// with its author and the user ids of its likes.
    async fn fetch_post_rows(
        &self,
        scope: &PostScope,
        range: RowRange,
    ) -> Result<Vec<PostRow>, StoreError>;

    /// Topics of the given posts, only for posts whose topics are not null.
    async fn post_topics(&self, post_ids: &[Uuid])
    -> Result<HashMap<Uuid, Vec<String>>, StoreError>;

    /// Topic lists of every post with non-null topics, oldest post first.
    async fn all_post_topics(&self) -> Result<Vec<Vec<String>>, StoreError>;

    /// Owner id of every post (one entry per post).
    async fn list_post_owners(&self) -> Result<Vec<Uuid>, StoreError>;

    // --- Likes ---

    async fn like_exists(&self, user_id: Uuid, post_id: Uuid) -> Result<bool, StoreError>;

    async fn insert_like(&self, user_id: Uuid, post_id: Uuid) -> Result<Like, StoreError>;

    async fn delete_like(&self, user_id: Uuid, post_id: Uuid) -> Result<bool, StoreError>;

    async fn list_likes(&self) -> Result<Vec<LikeEdge>, StoreError>;

    // --- Follows ---

    async fn followed_ids(&self, follower_id: Uuid) -> Result<Vec<Uuid>, StoreError>;

    async fn follow_exists(&self, follower_id: Uuid, followed_id: Uuid)
    -> Result<bool, StoreError>;

    async fn insert_follow(
        &self,
        follower_id: Uuid,
        followed_id: Uuid,
    ) -> Result<Follow, StoreError>;

    async fn delete_follow(&self, follower_id: Uuid, followed_id: Uuid)
    -> Result<bool, StoreError>;

    async fn list_follows(&self) -> Result<Vec<FollowEdge>, StoreError>;

    // --- Counts ---

    async fn count_accounts(&self) -> Result<i64, StoreError>;

    async fn count_posts(&self) -> Result<i64, StoreError>;

    async fn count_likes(&self) -> Result<i64, StoreError>;
}
