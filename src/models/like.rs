use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Represents the 'likes' table. Unique per (user_id, post_id).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Like {
    pub id: Uuid,
    pub user_id: Uuid,
    pub post_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Like edge as loaded for aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct LikeEdge {
    pub user_id: Uuid,
    pub post_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToggleLikeResponse {
    pub liked: bool,
}
