// src/handlers/admin.rs

use axum::{Json, extract::State, response::IntoResponse};

use crate::{error::AppError, services::insights, state::DynStore};

/// Per-account interest signals plus trending topics.
/// Admin only.
pub async fn get_insights(State(store): State<DynStore>) -> Result<impl IntoResponse, AppError> {
    let report = insights::compute_insights(store.as_ref()).await?;
    Ok(Json(report))
}

/// Platform totals and top topics.
/// Admin only.
pub async fn get_overview(State(store): State<DynStore>) -> Result<impl IntoResponse, AppError> {
    let overview = insights::system_overview(store.as_ref()).await?;
    Ok(Json(overview))
}
