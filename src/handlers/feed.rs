// src/handlers/feed.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::post::{FeedQuery, FeedResponse},
    services::feed::{FeedCursor, FeedKind, get_page},
    state::DynStore,
    utils::jwt::Viewer,
};

/// "For You": every post, newest first.
pub async fn for_you(
    State(store): State<DynStore>,
    Extension(viewer): Extension<Viewer>,
    Query(params): Query<FeedQuery>,
) -> Result<impl IntoResponse, AppError> {
    let cursor = FeedCursor::at(params.page.unwrap_or(0));
    let page = get_page(store.as_ref(), FeedKind::Global, viewer.id(), cursor).await?;
    Ok(Json(FeedResponse::from(page)))
}

/// Posts of the accounts the caller follows.
pub async fn following(
    State(store): State<DynStore>,
    Extension(viewer): Extension<Viewer>,
    Query(params): Query<FeedQuery>,
) -> Result<impl IntoResponse, AppError> {
    let viewer = viewer.require()?;
    let cursor = FeedCursor::at(params.page.unwrap_or(0));
    let page = get_page(store.as_ref(), FeedKind::Following, Some(viewer), cursor).await?;
    Ok(Json(FeedResponse::from(page)))
}

/// Posts of one account, for its profile page.
pub async fn profile_posts(
    State(store): State<DynStore>,
    Extension(viewer): Extension<Viewer>,
    Path(username): Path<String>,
    Query(params): Query<FeedQuery>,
) -> Result<impl IntoResponse, AppError> {
    let author = store
        .find_account_by_username(&username)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    let cursor = FeedCursor::at(params.page.unwrap_or(0));
    let page = get_page(store.as_ref(), FeedKind::Author(author.id), viewer.id(), cursor).await?;
    Ok(Json(FeedResponse::from(page)))
}
