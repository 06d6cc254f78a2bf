// src/models/account.rs

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use url::Url;
use uuid::Uuid;
use validator::Validate;

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]{3,20}$").expect("username pattern is valid"));

/// Represents the 'users' table in the database.
/// The id is assigned by the identity provider, not by this service.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,

    /// Unique display name; may be unset right after sign-up.
    pub username: Option<String>,

    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_admin: bool,
}

/// Public author fields joined onto every feed post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorSummary {
    pub id: Uuid,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<&Account> for AuthorSummary {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            username: account.username.clone(),
            avatar_url: account.avatar_url.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub id: Uuid,
    pub username: Option<String>,
    pub is_admin: bool,
}

/// Column updates for a profile edit. `None` leaves the column untouched,
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileChanges {
    pub username: Option<String>,
    pub bio: Option<Option<String>>,
    pub avatar_url: Option<Option<String>>,
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.bio.is_none() && self.avatar_url.is_none()
    }
}

/// Follower / following / post counters shown on a profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileCounts {
    pub followers_count: i64,
    pub following_count: i64,
    pub posts_count: i64,
}

/// Profile as seen by a viewer.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub account: Account,
    #[serde(flatten)]
    pub counts: ProfileCounts,
    pub is_followed_by_viewer: bool,
}

/// DTO for provisioning the profile of a freshly signed-up identity.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAccountRequest {
    #[validate(custom(function = validate_username))]
    pub username: String,
}

/// DTO for editing the caller's own profile.
/// Empty strings mean "leave unchanged" for the username and "clear" for
/// bio and avatar.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(custom(function = validate_optional_username))]
    pub username: Option<String>,

    #[validate(length(max = 160, message = "Bio cannot exceed 160 characters."))]
    pub bio: Option<String>,

    #[validate(custom(function = validate_optional_url))]
    pub avatar_url: Option<String>,
}

pub fn validate_username(username: &str) -> Result<(), validator::ValidationError> {
    if !USERNAME_RE.is_match(username) {
        return Err(validator::ValidationError::new("invalid_username").with_message(
            "Username must be 3-20 letters, numbers, or underscores.".into(),
        ));
    }
    Ok(())
}

fn validate_optional_username(username: &str) -> Result<(), validator::ValidationError> {
    if username.is_empty() {
        return Ok(());
    }
    validate_username(username)
}

/// Validates that a string is a correctly formatted URL (empty allowed).
fn validate_optional_url(url: &str) -> Result<(), validator::ValidationError> {
    if url.is_empty() {
        return Ok(());
    }
    if url.len() > 500 {
        return Err(validator::ValidationError::new("url_too_long"));
    }
    if Url::parse(url).is_err() {
        return Err(validator::ValidationError::new("invalid_url"));
    }
    Ok(())
}
