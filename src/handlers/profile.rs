use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::account::UpdateProfileRequest,
    services::profiles,
    state::DynStore,
    utils::jwt::Viewer,
};

/// Public profile with follower / following / post counts.
pub async fn get_profile(
    State(store): State<DynStore>,
    Extension(viewer): Extension<Viewer>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let profile = profiles::get_profile(store.as_ref(), &username, viewer.id()).await?;
    Ok(Json(profile))
}

/// Edit the caller's own profile.
pub async fn update_me(
    State(store): State<DynStore>,
    Extension(viewer): Extension<Viewer>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    let viewer = viewer.require()?;
    let account = profiles::update_profile(store.as_ref(), viewer, payload).await?;
    Ok(Json(account))
}
