// src/services/profiles.rs

use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    models::account::{
        Account, CreateAccountRequest, NewAccount, ProfileChanges, ProfileResponse,
        UpdateProfileRequest,
    },
    store::{Store, StoreError},
    utils::html::clean_html,
};

fn username_conflict(e: StoreError) -> AppError {
    match e {
        StoreError::UniqueViolation(_) => AppError::Conflict("Username is already taken.".to_string()),
        other => AppError::from(other),
    }
}

/// Provisions the profile row of an identity that just signed up.
pub async fn create_account(
    store: &dyn Store,
    viewer: Uuid,
    request: CreateAccountRequest,
) -> Result<Account, AppError> {
    request.validate()?;

    if store.find_account(viewer).await?.is_some() {
        return Err(AppError::Conflict("Profile already exists.".to_string()));
    }

    let account = store
        .insert_account(NewAccount {
            id: viewer,
            username: Some(request.username),
            is_admin: false,
        })
        .await
        .map_err(username_conflict)?;

    tracing::info!("Profile created for {}", account.id);
    Ok(account)
}

pub async fn get_profile(
    store: &dyn Store,
    username: &str,
    viewer: Option<Uuid>,
) -> Result<ProfileResponse, AppError> {
    let account = store
        .find_account_by_username(username)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    let counts = store.profile_counts(account.id).await?;

    let is_followed_by_viewer = match viewer {
        Some(v) if v != account.id => store.follow_exists(v, account.id).await?,
        _ => false,
    };

    Ok(ProfileResponse {
        account,
        counts,
        is_followed_by_viewer,
    })
}

/// Edits the viewer's own profile. An empty username keeps the current one;
/// an empty bio or avatar clears the field.
pub async fn update_profile(
    store: &dyn Store,
    viewer: Uuid,
    request: UpdateProfileRequest,
) -> Result<Account, AppError> {
    request.validate()?;

    let changes = ProfileChanges {
        username: request.username.filter(|u| !u.is_empty()),
        bio: request
            .bio
            .map(|b| Some(clean_html(&b)).filter(|b| !b.is_empty())),
        avatar_url: request.avatar_url.map(|u| Some(u).filter(|u| !u.is_empty())),
    };

    if changes.is_empty() {
        return Err(AppError::BadRequest("No changes submitted.".to_string()));
    }

    if let Some(name) = changes.username.as_deref() {
        if let Some(existing) = store.find_account_by_username(name).await? {
            if existing.id != viewer {
                return Err(AppError::Conflict("Username is already taken.".to_string()));
            }
        }
    }

    store
        .update_account(viewer, &changes)
        .await
        .map_err(username_conflict)?
        .ok_or(AppError::NotFound("User not found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{social::follow, test_support::{seed_account, seed_post}};
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn profile_reports_counts_and_follow_state() {
        let store = MemoryStore::new();
        let a = seed_account(&store, "alice").await;
        let b = seed_account(&store, "bob").await;
        follow(&store, a, b).await.unwrap();
        seed_post(&store, b, "one", &[]).await;
        seed_post(&store, b, "two", &[]).await;

        let seen_by_a = get_profile(&store, "bob", Some(a)).await.unwrap();
        assert_eq!(seen_by_a.counts.followers_count, 1);
        assert_eq!(seen_by_a.counts.following_count, 0);
        assert_eq!(seen_by_a.counts.posts_count, 2);
        assert!(seen_by_a.is_followed_by_viewer);

        let anonymous = get_profile(&store, "bob", None).await.unwrap();
        assert!(!anonymous.is_followed_by_viewer);
    }

    #[tokio::test]
    async fn unknown_profile_is_not_found() {
        let store = MemoryStore::new();
        let err = get_profile(&store, "ghost", None).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn creating_a_profile_twice_conflicts() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        let req = || CreateAccountRequest {
            username: "newbie".to_string(),
        };

        create_account(&store, id, req()).await.unwrap();
        let err = create_account(&store, id, req()).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let err = create_account(&store, Uuid::new_v4(), req()).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(msg) if msg.contains("taken")));
    }

    #[tokio::test]
    async fn update_rejects_taken_username_and_empty_requests() {
        let store = MemoryStore::new();
        let a = seed_account(&store, "alice").await;
        seed_account(&store, "bob").await;

        let err = update_profile(
            &store,
            a,
            UpdateProfileRequest {
                username: Some("bob".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let err = update_profile(&store, a, UpdateProfileRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn update_sanitizes_bio_and_clears_avatar() {
        let store = MemoryStore::new();
        let a = seed_account(&store, "alice").await;

        update_profile(
            &store,
            a,
            UpdateProfileRequest {
                avatar_url: Some("https://cdn.example.com/a.png".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let updated = update_profile(
            &store,
            a,
            UpdateProfileRequest {
                username: Some(String::new()),
                bio: Some("hi<script>alert(1)</script>".to_string()),
                avatar_url: Some(String::new()),
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.username.as_deref(), Some("alice"));
        assert_eq!(updated.bio.as_deref(), Some("hi"));
        assert_eq!(updated.avatar_url, None);
    }
}
