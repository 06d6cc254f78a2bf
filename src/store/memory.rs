// src/store/memory.rs

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{PostScope, RowRange, Store, StoreError};
use crate::models::{
    account::{Account, AuthorSummary, NewAccount, ProfileChanges, ProfileCounts},
    follow::{Follow, FollowEdge},
    like::{Like, LikeEdge},
    post::{NewPost, Post, PostRow},
};

#[derive(Default)]
struct Tables {
    accounts: Vec<Account>,
    posts: Vec<Post>,
    likes: Vec<Like>,
    follows: Vec<Follow>,
    /// Last timestamp handed out; keeps `created_at` strictly increasing.
    clock: Option<DateTime<Utc>>,
}

impl Tables {
    fn now(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let next = match self.clock {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.clock = Some(next);
        next
    }

    fn account(&self, id: Uuid) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id == id)
    }

    fn username_taken(&self, username: &str, except: Option<Uuid>) -> bool {
        self.accounts
            .iter()
            .any(|a| a.username.as_deref() == Some(username) && Some(a.id) != except)
    }
}

/// In-process [`Store`] with the same constraints as the Postgres schema.
///
/// Used by the test suites and for running the service without a database.
/// `set_offline(true)` makes every call fail with a backend error.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    offline: AtomicBool,
    post_reads: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of ranged post reads served so far.
    pub fn post_reads(&self) -> usize {
        self.post_reads.load(Ordering::SeqCst)
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_account(&self, account: NewAccount) -> Result<Account, StoreError> {
        self.check_online()?;
        let mut t = self.tables.lock().await;

        if t.account(account.id).is_some() {
            return Err(StoreError::UniqueViolation("users_pkey".to_string()));
        }
        if let Some(name) = account.username.as_deref() {
            if t.username_taken(name, None) {
                return Err(StoreError::UniqueViolation("users_username_key".to_string()));
            }
        }

        let row = Account {
            id: account.id,
            username: account.username,
            bio: None,
            avatar_url: None,
            created_at: t.now(),
            is_admin: account.is_admin,
        };
        t.accounts.push(row.clone());
        Ok(row)
    }

    async fn find_account(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        self.check_online()?;
        let t = self.tables.lock().await;
        Ok(t.account(id).cloned())
    }

    async fn find_account_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Account>, StoreError> {
        self.check_online()?;
        let t = self.tables.lock().await;
        Ok(t
            .accounts
            .iter()
            .find(|a| a.username.as_deref() == Some(username))
            .cloned())
    }

    async fn update_account(
        &self,
        id: Uuid,
        changes: &ProfileChanges,
    ) -> Result<Option<Account>, StoreError> {
        self.check_online()?;
        let mut t = self.tables.lock().await;

        if let Some(name) = changes.username.as_deref() {
            if t.username_taken(name, Some(id)) {
                return Err(StoreError::UniqueViolation("users_username_key".to_string()));
            }
        }

        let Some(account) = t.accounts.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };
        if let Some(name) = &changes.username {
            account.username = Some(name.clone());
        }
        if let Some(bio) = &changes.bio {
            account.bio = bio.clone();
        }
        if let Some(avatar) = &changes.avatar_url {
            account.avatar_url = avatar.clone();
        }
        Ok(Some(account.clone()))
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, StoreError> {
        self.check_online()?;
        Ok(self.tables.lock().await.accounts.clone())
    }

    async fn profile_counts(&self, id: Uuid) -> Result<ProfileCounts, StoreError> {
        self.check_online()?;
        let t = self.tables.lock().await;
        Ok(ProfileCounts {
            followers_count: t.follows.iter().filter(|f| f.followed_id == id).count() as i64,
            following_count: t.follows.iter().filter(|f| f.follower_id == id).count() as i64,
            posts_count: t.posts.iter().filter(|p| p.user_id == id).count() as i64,
        })
    }

    async fn insert_post(&self, post: NewPost) -> Result<Post, StoreError> {
        self.check_online()?;
        let mut t = self.tables.lock().await;

        if t.account(post.user_id).is_none() {
            return Err(StoreError::Backend("posts_user_id_fkey".to_string()));
        }

        let row = Post {
            id: Uuid::new_v4(),
            user_id: post.user_id,
            content: post.content,
            created_at: t.now(),
            topics: Some(post.topics),
            sentiment: Some(post.sentiment),
            tone: Some(post.tone),
        };
        t.posts.push(row.clone());
        Ok(row)
    }

    async fn find_post_owner(&self, post_id: Uuid) -> Result<Option<Uuid>, StoreError> {
        self.check_online()?;
        let t = self.tables.lock().await;
        Ok(t.posts.iter().find(|p| p.id == post_id).map(|p| p.user_id))
    }

    async fn delete_post(&self, post_id: Uuid) -> Result<bool, StoreError> {
        self.check_online()?;
        let mut t = self.tables.lock().await;
        let before = t.posts.len();
        t.posts.retain(|p| p.id != post_id);
        t.likes.retain(|l| l.post_id != post_id);
        Ok(t.posts.len() != before)
    }

    async fn fetch_post_rows(
        &self,
        scope: &PostScope,
        range: RowRange,
    ) -> Result<Vec<PostRow>, StoreError> {
        self.check_online()?;
        self.post_reads.fetch_add(1, Ordering::SeqCst);
        let t = self.tables.lock().await;

        let mut posts: Vec<&Post> = t
            .posts
            .iter()
            .filter(|p| match scope {
                PostScope::All => true,
                PostScope::Owners(ids) => ids.contains(&p.user_id),
            })
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let offset = usize::try_from(range.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(range.limit).unwrap_or(0);

        let rows = posts
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|p| PostRow {
                post: p.clone(),
                author: t.account(p.user_id).map(AuthorSummary::from),
                like_user_ids: t
                    .likes
                    .iter()
                    .filter(|l| l.post_id == p.id)
                    .map(|l| l.user_id)
                    .collect(),
            })
            .collect();
        Ok(rows)
    }

    async fn post_topics(
        &self,
        post_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<String>>, StoreError> {
        self.check_online()?;
        let t = self.tables.lock().await;
        Ok(t.posts
            .iter()
            .filter(|p| post_ids.contains(&p.id))
            .filter_map(|p| p.topics.clone().map(|topics| (p.id, topics)))
            .collect())
    }

    async fn all_post_topics(&self) -> Result<Vec<Vec<String>>, StoreError> {
        self.check_online()?;
        let t = self.tables.lock().await;
        Ok(t.posts.iter().filter_map(|p| p.topics.clone()).collect())
    }

    async fn list_post_owners(&self) -> Result<Vec<Uuid>, StoreError> {
        self.check_online()?;
        let t = self.tables.lock().await;
        Ok(t.posts.iter().map(|p| p.user_id).collect())
    }

    async fn like_exists(&self, user_id: Uuid, post_id: Uuid) -> Result<bool, StoreError> {
        self.check_online()?;
        let t = self.tables.lock().await;
        Ok(t.likes
            .iter()
            .any(|l| l.user_id == user_id && l.post_id == post_id))
    }

    async fn insert_like(&self, user_id: Uuid, post_id: Uuid) -> Result<Like, StoreError> {
        self.check_online()?;
        let mut t = self.tables.lock().await;

        if t.likes
            .iter()
            .any(|l| l.user_id == user_id && l.post_id == post_id)
        {
            return Err(StoreError::UniqueViolation(
                "likes_user_id_post_id_key".to_string(),
            ));
        }
        if t.account(user_id).is_none() {
            return Err(StoreError::Backend("likes_user_id_fkey".to_string()));
        }
        if !t.posts.iter().any(|p| p.id == post_id) {
            return Err(StoreError::Backend("likes_post_id_fkey".to_string()));
        }

        let row = Like {
            id: Uuid::new_v4(),
            user_id,
            post_id,
            created_at: t.now(),
        };
        t.likes.push(row.clone());
        Ok(row)
    }

    async fn delete_like(&self, user_id: Uuid, post_id: Uuid) -> Result<bool, StoreError> {
        self.check_online()?;
        let mut t = self.tables.lock().await;
        let before = t.likes.len();
        t.likes
            .retain(|l| !(l.user_id == user_id && l.post_id == post_id));
        Ok(t.likes.len() != before)
    }

    async fn list_likes(&self) -> Result<Vec<LikeEdge>, StoreError> {
        self.check_online()?;
        let t = self.tables.lock().await;
        Ok(t.likes
            .iter()
            .map(|l| LikeEdge {
                user_id: l.user_id,
                post_id: l.post_id,
            })
            .collect())
    }

    async fn followed_ids(&self, follower_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        self.check_online()?;
        let t = self.tables.lock().await;
        Ok(t.follows
            .iter()
            .filter(|f| f.follower_id == follower_id)
            .map(|f| f.followed_id)
            .collect())
    }

    async fn follow_exists(
        &self,
        follower_id: Uuid,
        followed_id: Uuid,
    ) -> Result<bool, StoreError> {
        self.check_online()?;
        let t = self.tables.lock().await;
        Ok(t.follows
            .iter()
            .any(|f| f.follower_id == follower_id && f.followed_id == followed_id))
    }

    async fn insert_follow(
        &self,
        follower_id: Uuid,
        followed_id: Uuid,
    ) -> Result<Follow, StoreError> {
        self.check_online()?;
        let mut t = self.tables.lock().await;

        if follower_id == followed_id {
            return Err(StoreError::Backend("follows_check".to_string()));
        }
        if t.account(follower_id).is_none() {
            return Err(StoreError::Backend("follows_follower_id_fkey".to_string()));
        }
        if t.account(followed_id).is_none() {
            return Err(StoreError::Backend("follows_followed_id_fkey".to_string()));
        }
        if t.follows
            .iter()
            .any(|f| f.follower_id == follower_id && f.followed_id == followed_id)
        {
            return Err(StoreError::UniqueViolation(
                "follows_follower_id_followed_id_key".to_string(),
            ));
        }

        let row = Follow {
            id: Uuid::new_v4(),
            follower_id,
            followed_id,
            created_at: t.now(),
        };
        t.follows.push(row.clone());
        Ok(row)
    }

    async fn delete_follow(
        &self,
        follower_id: Uuid,
        followed_id: Uuid,
    ) -> Result<bool, StoreError> {
        self.check_online()?;
        let mut t = self.tables.lock().await;
        let before = t.follows.len();
        t.follows
            .retain(|f| !(f.follower_id == follower_id && f.followed_id == followed_id));
        Ok(t.follows.len() != before)
    }

    async fn list_follows(&self) -> Result<Vec<FollowEdge>, StoreError> {
        self.check_online()?;
        let t = self.tables.lock().await;
        Ok(t.follows
            .iter()
            .map(|f| FollowEdge {
                follower_id: f.follower_id,
                followed_id: f.followed_id,
            })
            .collect())
    }

    async fn count_accounts(&self) -> Result<i64, StoreError> {
        self.check_online()?;
        Ok(self.tables.lock().await.accounts.len() as i64)
    }

    async fn count_posts(&self) -> Result<i64, StoreError> {
        self.check_online()?;
        Ok(self.tables.lock().await.posts.len() as i64)
    }

    async fn count_likes(&self) -> Result<i64, StoreError> {
        self.check_online()?;
        Ok(self.tables.lock().await.likes.len() as i64)
    }
}
