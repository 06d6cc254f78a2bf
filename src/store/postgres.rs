// src/store/postgres.rs

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{PostScope, RowRange, Store, StoreError};
use crate::models::{
    account::{Account, AuthorSummary, NewAccount, ProfileChanges, ProfileCounts},
    follow::{Follow, FollowEdge},
    like::{Like, LikeEdge},
    post::{NewPost, Post, PostRow},
};

const ACCOUNT_COLUMNS: &str = "id, username, bio, avatar_url, created_at, is_admin";

/// Converts `sqlx::Error` into `StoreError`, keeping unique violations
/// (SQLSTATE 23505) distinguishable.
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return StoreError::UniqueViolation(db_err.message().to_string());
            }
        }
        StoreError::Backend(err.to_string())
    }
}

/// Flat row of the feed query before it is reshaped into a [`PostRow`].
#[derive(FromRow)]
struct PostRowRecord {
    id: Uuid,
    user_id: Uuid,
    content: String,
    created_at: DateTime<Utc>,
    topics: Option<Vec<String>>,
    sentiment: Option<String>,
    tone: Option<String>,
    author_id: Option<Uuid>,
    author_username: Option<String>,
    author_avatar_url: Option<String>,
    like_user_ids: Vec<Uuid>,
}

impl From<PostRowRecord> for PostRow {
    fn from(r: PostRowRecord) -> Self {
        let author = r.author_id.map(|id| AuthorSummary {
            id,
            username: r.author_username,
            avatar_url: r.author_avatar_url,
        });
        PostRow {
            post: Post {
                id: r.id,
                user_id: r.user_id,
                content: r.content,
                created_at: r.created_at,
                topics: r.topics,
                sentiment: r.sentiment,
                tone: r.tone,
            },
            author,
            like_user_ids: r.like_user_ids,
        }
    }
}

/// PostgreSQL implementation of [`Store`].
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert_account(&self, account: NewAccount) -> Result<Account, StoreError> {
        let sql = format!(
            "INSERT INTO users (id, username, is_admin) VALUES ($1, $2, $3) RETURNING {}",
            ACCOUNT_COLUMNS
        );
        let row = sqlx::query_as::<_, Account>(&sql)
            .bind(account.id)
            .bind(account.username)
            .bind(account.is_admin)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_account(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", ACCOUNT_COLUMNS);
        let row = sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_account_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Account>, StoreError> {
        let sql = format!("SELECT {} FROM users WHERE username = $1", ACCOUNT_COLUMNS);
        let row = sqlx::query_as::<_, Account>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update_account(
        &self,
        id: Uuid,
        changes: &ProfileChanges,
    ) -> Result<Option<Account>, StoreError> {
        let sql = format!(
            r#"
            UPDATE users SET
                username = COALESCE($2, username),
                bio = CASE WHEN $3 THEN $4 ELSE bio END,
                avatar_url = CASE WHEN $5 THEN $6 ELSE avatar_url END
            WHERE id = $1
            RETURNING {}
            "#,
            ACCOUNT_COLUMNS
        );
        let row = sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .bind(changes.username.as_deref())
            .bind(changes.bio.is_some())
            .bind(changes.bio.clone().flatten())
            .bind(changes.avatar_url.is_some())
            .bind(changes.avatar_url.clone().flatten())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, StoreError> {
        let sql = format!("SELECT {} FROM users ORDER BY created_at, id", ACCOUNT_COLUMNS);
        let rows = sqlx::query_as::<_, Account>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn profile_counts(&self, id: Uuid) -> Result<ProfileCounts, StoreError> {
        let (followers_count, following_count, posts_count) =
            sqlx::query_as::<_, (i64, i64, i64)>(
                r#"
                SELECT
                    (SELECT COUNT(*) FROM follows WHERE followed_id = $1),
                    (SELECT COUNT(*) FROM follows WHERE follower_id = $1),
                    (SELECT COUNT(*) FROM posts WHERE user_id = $1)
                "#,
            )
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(ProfileCounts {
            followers_count,
            following_count,
            posts_count,
        })
    }

    async fn insert_post(&self, post: NewPost) -> Result<Post, StoreError> {
        let row = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (id, user_id, content, topics, sentiment, tone)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, content, created_at, topics, sentiment, tone
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(post.user_id)
        .bind(post.content)
        .bind(post.topics)
        .bind(post.sentiment)
        .bind(post.tone)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_post_owner(&self, post_id: Uuid) -> Result<Option<Uuid>, StoreError> {
        let owner = sqlx::query_scalar::<_, Uuid>("SELECT user_id FROM posts WHERE id = $1")
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(owner)
    }

    async fn delete_post(&self, post_id: Uuid) -> Result<bool, StoreError> {
        // likes go with the post via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(post_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn fetch_post_rows(
        &self,
        scope: &PostScope,
        range: RowRange,
    ) -> Result<Vec<PostRow>, StoreError> {
        let owners: Option<Vec<Uuid>> = match scope {
            PostScope::All => None,
            PostScope::Owners(ids) => Some(ids.clone()),
        };

        let rows = sqlx::query_as::<_, PostRowRecord>(
            r#"
            SELECT
                p.id, p.user_id, p.content, p.created_at,
                p.topics, p.sentiment, p.tone,
                u.id AS author_id,
                u.username AS author_username,
                u.avatar_url AS author_avatar_url,
                COALESCE(
                    ARRAY_AGG(l.user_id) FILTER (WHERE l.user_id IS NOT NULL),
                    '{}'::UUID[]
                ) AS like_user_ids
            FROM posts p
            LEFT JOIN users u ON u.id = p.user_id
            LEFT JOIN likes l ON l.post_id = p.id
            WHERE ($1::UUID[] IS NULL OR p.user_id = ANY($1))
            GROUP BY p.id, u.id
            ORDER BY p.created_at DESC, p.id DESC
            OFFSET $2
            LIMIT $3
            "#,
        )
        .bind(owners)
        .bind(range.offset)
        .bind(range.limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch feed rows: {:?}", e);
            StoreError::from(e)
        })?;

        Ok(rows.into_iter().map(PostRow::from).collect())
    }

    async fn post_topics(
        &self,
        post_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<String>>, StoreError> {
        let rows = sqlx::query_as::<_, (Uuid, Vec<String>)>(
            "SELECT id, topics FROM posts WHERE id = ANY($1) AND topics IS NOT NULL",
        )
        .bind(post_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().collect())
    }

    async fn all_post_topics(&self) -> Result<Vec<Vec<String>>, StoreError> {
        let rows = sqlx::query_scalar::<_, Vec<String>>(
            "SELECT topics FROM posts WHERE topics IS NOT NULL ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_post_owners(&self) -> Result<Vec<Uuid>, StoreError> {
        let rows = sqlx::query_scalar::<_, Uuid>("SELECT user_id FROM posts")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn like_exists(&self, user_id: Uuid, post_id: Uuid) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM likes WHERE user_id = $1 AND post_id = $2)",
        )
        .bind(user_id)
        .bind(post_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn insert_like(&self, user_id: Uuid, post_id: Uuid) -> Result<Like, StoreError> {
        let row = sqlx::query_as::<_, Like>(
            r#"
            INSERT INTO likes (id, user_id, post_id)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, post_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(post_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_like(&self, user_id: Uuid, post_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM likes WHERE user_id = $1 AND post_id = $2")
            .bind(user_id)
            .bind(post_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_likes(&self) -> Result<Vec<LikeEdge>, StoreError> {
        let rows = sqlx::query_as::<_, LikeEdge>(
            "SELECT user_id, post_id FROM likes ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn followed_ids(&self, follower_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        let rows =
            sqlx::query_scalar::<_, Uuid>("SELECT followed_id FROM follows WHERE follower_id = $1")
                .bind(follower_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows)
    }

    async fn follow_exists(
        &self,
        follower_id: Uuid,
        followed_id: Uuid,
    ) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM follows WHERE follower_id = $1 AND followed_id = $2)",
        )
        .bind(follower_id)
        .bind(followed_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn insert_follow(
        &self,
        follower_id: Uuid,
        followed_id: Uuid,
    ) -> Result<Follow, StoreError> {
        let row = sqlx::query_as::<_, Follow>(
            r#"
            INSERT INTO follows (id, follower_id, followed_id)
            VALUES ($1, $2, $3)
            RETURNING id, follower_id, followed_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(follower_id)
        .bind(followed_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_follow(
        &self,
        follower_id: Uuid,
        followed_id: Uuid,
    ) -> Result<bool, StoreError> {
        let result =
            sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND followed_id = $2")
                .bind(follower_id)
                .bind(followed_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_follows(&self) -> Result<Vec<FollowEdge>, StoreError> {
        let rows = sqlx::query_as::<_, FollowEdge>("SELECT follower_id, followed_id FROM follows")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn count_accounts(&self) -> Result<i64, StoreError> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    async fn count_posts(&self) -> Result<i64, StoreError> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    async fn count_likes(&self) -> Result<i64, StoreError> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM likes")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }
}
