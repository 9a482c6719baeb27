use crate::context::AppContext;
use crate::core::error::AppError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use log::warn;
use serde::Serialize;
use std::sync::Arc;

pub mod conversations;
pub mod events;
pub mod schedules;
pub mod settings;

pub type AppState = Arc<AppContext>;

pub fn router(context: AppState) -> Router {
    Router::new()
        .nest("/conversations", conversations::router())
        .nest("/schedules", schedules::router())
        .nest("/settings", settings::router())
        .nest("/events", events::router())
        .with_state(context)
}

#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Storage => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::SchedulerUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        };
        if status.is_server_error() {
            warn!("request failed: {self}");
        }

        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
