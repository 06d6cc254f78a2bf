// src/services/social.rs

use std::collections::HashSet;

use uuid::Uuid;

use crate::{
    error::AppError,
    models::follow::Follow,
    store::{Store, StoreError},
};

/// Accounts the viewer follows. Following nobody yields an empty set.
pub async fn followed_ids(store: &dyn Store, viewer: Uuid) -> Result<HashSet<Uuid>, AppError> {
    let ids = store.followed_ids(viewer).await.map_err(|e| {
        tracing::error!("Failed to resolve followed accounts for {}: {}", viewer, e);
        AppError::from(e)
    })?;
    Ok(ids.into_iter().collect())
}

pub async fn follow(store: &dyn Store, follower: Uuid, followed: Uuid) -> Result<Follow, AppError> {
    if follower == followed {
        return Err(AppError::Conflict("You cannot follow yourself.".to_string()));
    }

    if store.find_account(follower).await?.is_none() {
        return Err(AppError::NotFound(
            "Create your profile before following others".to_string(),
        ));
    }

    if store.find_account(followed).await?.is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    store
        .insert_follow(follower, followed)
        .await
        .map_err(|e| match e {
            StoreError::UniqueViolation(_) => {
                AppError::Conflict("Already following this user.".to_string())
            }
            other => {
                tracing::error!("Failed to follow user: {}", other);
                AppError::from(other)
            }
        })
}

/// Removes the edge if present; unfollowing someone not followed is a no-op.
pub async fn unfollow(store: &dyn Store, follower: Uuid, followed: Uuid) -> Result<(), AppError> {
    store.delete_follow(follower, followed).await?;
    Ok(())
}
