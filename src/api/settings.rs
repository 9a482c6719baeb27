//! Preference endpoints

use crate::api::AppState;
use crate::core::error::AppError;
use crate::core::settings::{Settings, SettingsPatch};
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_settings).patch(update_settings))
}

async fn get_settings(State(context): State<AppState>) -> Result<Json<Settings>, AppError> {
    Ok(Json(context.settings.load().await?))
}

async fn update_settings(
    State(context): State<AppState>,
    Json(patch): Json<SettingsPatch>,
) -> Result<Json<Settings>, AppError> {
    Ok(Json(context.settings.update(patch).await?))
}
