// src/handlers/auth.rs

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};

use crate::{
    error::AppError,
    models::account::CreateAccountRequest,
    services::profiles,
    state::DynStore,
    utils::jwt::Viewer,
};

/// Registers the profile of an identity that signed up with the provider.
///
/// The token proves who the caller is; this only claims a username.
/// Returns 201 Created and the account.
pub async fn register(
    State(store): State<DynStore>,
    Extension(viewer): Extension<Viewer>,
    Json(payload): Json<CreateAccountRequest>,
) -> Result<impl IntoResponse, AppError> {
    let viewer = viewer.require()?;
    let account = profiles::create_account(store.as_ref(), viewer, payload).await?;

    Ok((StatusCode::CREATED, Json(account)))
}
