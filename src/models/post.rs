use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::account::AuthorSummary;

/// Represents the 'posts' table in the database.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,

    // Assigned by the content annotator when the post is created.
    pub topics: Option<Vec<String>>,
    pub sentiment: Option<String>,
    pub tone: Option<String>,
}

/// Insert payload for a post, already annotated.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub user_id: Uuid,
    pub content: String,
    pub topics: Vec<String>,
    pub sentiment: String,
    pub tone: String,
}

/// One post as read for a feed: the post, its author and the ids of every
/// account that liked it, all from the same read.
#[derive(Debug, Clone)]
pub struct PostRow {
    pub post: Post,
    pub author: Option<AuthorSummary>,
    pub like_user_ids: Vec<Uuid>,
}

/// A post as shown to a particular viewer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedPost {
    #[serde(flatten)]
    pub post: Post,
    pub author: Option<AuthorSummary>,
    pub like_count: i64,
    pub liked_by_viewer: bool,
}

/// DTO for creating a new post.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(
        length(
            min = 1,
            max = 280,
            message = "Content length must be between 1 and 280 characters"
        ),
        custom(function = validate_not_blank)
    )]
    pub content: String,
}

fn validate_not_blank(content: &str) -> Result<(), validator::ValidationError> {
    if content.trim().is_empty() {
        return Err(validator::ValidationError::new("blank_content")
            .with_message("Content cannot be empty.".into()));
    }
    Ok(())
}

/// Query parameters for feed endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    /// Zero-based page index (default: 0).
    pub page: Option<u32>,
}

/// Body returned by the feed endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct FeedResponse {
    pub posts: Vec<EnrichedPost>,
    pub has_more: bool,
    /// Page index to request next, absent once the feed is exhausted.
    pub next_page: Option<u32>,
}
