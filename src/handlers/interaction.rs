use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    error::AppError,
    services::{engagement, social},
    state::DynStore,
    utils::jwt::Viewer,
};

/// Toggle Like on a post.
pub async fn toggle_like(
    State(store): State<DynStore>,
    Extension(viewer): Extension<Viewer>,
    Path(post_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let viewer = viewer.require()?;
    let result = engagement::toggle_like(store.as_ref(), post_id, viewer).await?;
    Ok(Json(result))
}

/// Follow another account.
pub async fn follow_user(
    State(store): State<DynStore>,
    Extension(viewer): Extension<Viewer>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let viewer = viewer.require()?;
    let edge = social::follow(store.as_ref(), viewer, user_id).await?;
    Ok((StatusCode::CREATED, Json(edge)))
}

/// Stop following an account.
pub async fn unfollow_user(
    State(store): State<DynStore>,
    Extension(viewer): Extension<Viewer>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let viewer = viewer.require()?;
    social::unfollow(store.as_ref(), viewer, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
