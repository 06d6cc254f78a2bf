// src/services/posts.rs

use uuid::Uuid;
use validator::Validate;

use crate::{
    annotator::Annotator,
    error::AppError,
    models::post::{CreatePostRequest, NewPost, Post},
    store::Store,
};

/// Validates, annotates and stores a new post.
/// Nothing is written when the annotator fails.
pub async fn create_post(
    store: &dyn Store,
    annotator: &dyn Annotator,
    viewer: Uuid,
    request: CreatePostRequest,
) -> Result<Post, AppError> {
    request.validate()?;

    if store.find_account(viewer).await?.is_none() {
        return Err(AppError::NotFound(
            "Create your profile before posting".to_string(),
        ));
    }

    let analysis = annotator.analyze(&request.content).await.map_err(|e| {
        tracing::error!("Post annotation failed: {}", e);
        AppError::from(e)
    })?;

    let post = store
        .insert_post(NewPost {
            user_id: viewer,
            content: request.content,
            topics: analysis.topics,
            sentiment: analysis.sentiment,
            tone: analysis.tone,
        })
        .await
        .map_err(|e| {
            tracing::error!("Failed to create post: {}", e);
            AppError::from(e)
        })?;

    tracing::info!("Post {} created by {}", post.id, viewer);
    Ok(post)
}

/// Deletes a post owned by the viewer.
pub async fn delete_post(store: &dyn Store, post_id: Uuid, viewer: Uuid) -> Result<(), AppError> {
    let owner = store
        .find_post_owner(post_id)
        .await?
        .ok_or(AppError::NotFound("Post not found".to_string()))?;

    if owner != viewer {
        return Err(AppError::Forbidden(
            "You are not authorized to delete this post.".to_string(),
        ));
    }

    store.delete_post(post_id).await.map_err(|e| {
        tracing::error!("Failed to delete post: {}", e);
        AppError::from(e)
    })?;

    Ok(())
}
