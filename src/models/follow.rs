use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Represents the 'follows' table: `follower_id` sees posts of `followed_id`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Follow {
    pub id: Uuid,
    pub follower_id: Uuid,
    pub followed_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct FollowEdge {
    pub follower_id: Uuid,
    pub followed_id: Uuid,
}
