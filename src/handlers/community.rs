use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::post::CreatePostRequest,
    services::posts,
    state::AppState,
    utils::jwt::Viewer,
};

/// Create a new post.
/// Requires: Login + existing profile. The post is annotated before it is stored.
pub async fn create_post(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Json(payload): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, AppError> {
    let viewer = viewer.require()?;
    let post = posts::create_post(
        state.store.as_ref(),
        state.annotator.as_ref(),
        viewer,
        payload,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(post)))
}

/// Delete a post.
/// Requires: Login + Author.
pub async fn delete_post(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let viewer = viewer.require()?;
    posts::delete_post(state.store.as_ref(), id, viewer).await?;

    Ok(StatusCode::NO_CONTENT)
}
