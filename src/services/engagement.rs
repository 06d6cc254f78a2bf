// src/services/engagement.rs

use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        like::ToggleLikeResponse,
        post::{EnrichedPost, PostRow},
    },
    store::{Store, StoreError},
};

/// Attaches like count and liked-by-viewer to each row, using the like edges
/// read together with the post. Anonymous viewers never have liked anything.
pub fn enrich(rows: Vec<PostRow>, viewer: Option<Uuid>) -> Vec<EnrichedPost> {
    rows.into_iter()
        .map(|row| {
            let liked_by_viewer = viewer
                .map(|v| row.like_user_ids.iter().any(|id| *id == v))
                .unwrap_or(false);

            EnrichedPost {
                like_count: row.like_user_ids.len() as i64,
                liked_by_viewer,
                post: row.post,
                author: row.author,
            }
        })
        .collect()
}

/// Likes the post if the viewer has not liked it yet, otherwise removes the
/// like. A concurrent toggle that loses the race on the unique constraint
/// surfaces as a conflict.
pub async fn toggle_like(
    store: &dyn Store,
    post_id: Uuid,
    viewer: Uuid,
) -> Result<ToggleLikeResponse, AppError> {
    if store.find_account(viewer).await?.is_none() {
        return Err(AppError::NotFound(
            "Create your profile before liking posts".to_string(),
        ));
    }

    if store.find_post_owner(post_id).await?.is_none() {
        return Err(AppError::NotFound("Post not found".to_string()));
    }

    if store.like_exists(viewer, post_id).await? {
        store.delete_like(viewer, post_id).await.map_err(|e| {
            tracing::error!("Failed to unlike post {}: {}", post_id, e);
            AppError::from(e)
        })?;
        return Ok(ToggleLikeResponse { liked: false });
    }

    store
        .insert_like(viewer, post_id)
        .await
        .map_err(|e| match e {
            StoreError::UniqueViolation(_) => AppError::Conflict("Already liked".to_string()),
            other => {
                tracing::error!("Failed to like post {}: {}", post_id, other);
                AppError::from(other)
            }
        })?;

    Ok(ToggleLikeResponse { liked: true })
}
