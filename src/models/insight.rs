use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-account row of the admin insights dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountInsight {
    pub id: Uuid,
    pub username: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub posts_count: i64,
    pub followers_count: i64,
    pub following_count: i64,
    pub liked_posts_count: i64,
    /// Distinct topics of the posts this account liked, first-seen order.
    pub derived_topics: Vec<String>,
    pub fyp_strategy: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicCount {
    pub topic: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightsReport {
    pub accounts: Vec<AccountInsight>,
    pub trending: Vec<TopicCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemOverview {
    pub total_users: i64,
    pub total_posts: i64,
    pub total_likes: i64,
    pub top_topics: Vec<TopicCount>,
}
