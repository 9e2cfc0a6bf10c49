//! Axum Handlers for the Operator Panel API
//!
//! This module contains the logic for the panel's JSON endpoints: reading and
//! writing the persona prompt, applying presets, and viewing the log sink.
//! It uses `utoipa` doc comments to generate OpenAPI documentation.

use axum::{
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{
        IntoResponse, Json, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use phone_teacher_core::prompt_store::{self, PromptStoreError};
use std::{convert::Infallible, sync::Arc};
use tokio_stream::{Stream, StreamExt};
use tracing::{error, info};

use crate::{
    logs,
    models::{
        DEFAULT_LOG_LINES, ErrorResponse, LogsQuery, LogsResponse, PromptResponse, PromptUpdated,
        SetPromptPayload,
    },
    state::AppState,
};

pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    InternalServerError(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { message })).into_response()
            }
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(ErrorResponse { message })).into_response()
            }
            ApiError::InternalServerError(err) => {
                error!("Internal Server Error: {:?}", err);
                let message = "An internal server error occurred.".to_string();
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse { message }),
                )
                    .into_response()
            }
        }
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::InternalServerError(err.into())
    }
}

/// Get the current persona prompt.
#[utoipa::path(
    get,
    path = "/dashboard/api/prompt",
    responses(
        (status = 200, description = "Current persona prompt (empty if never set)", body = PromptResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn get_prompt(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PromptResponse>, ApiError> {
    let prompt = state.prompt_store.get().await?;
    Ok(Json(PromptResponse { prompt }))
}

/// Replace the persona prompt.
#[utoipa::path(
    post,
    path = "/dashboard/api/prompt",
    request_body = SetPromptPayload,
    responses(
        (status = 200, description = "Prompt stored", body = PromptUpdated),
        (status = 400, description = "Missing prompt field or malformed body", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn set_prompt(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SetPromptPayload>, JsonRejection>,
) -> Result<Json<PromptUpdated>, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let prompt = payload
        .prompt
        .ok_or_else(|| ApiError::BadRequest("missing prompt".to_string()))?;

    state.prompt_store.set(prompt.clone()).await?;
    info!("Prompt updated via dashboard");
    Ok(Json(PromptUpdated { ok: true, prompt }))
}

/// Apply one of the named persona presets.
#[utoipa::path(
    post,
    path = "/dashboard/api/preset/{name}",
    responses(
        (status = 200, description = "Preset applied", body = PromptUpdated),
        (status = 404, description = "Unknown preset", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("name" = String, Path, description = "Preset name, e.g. `math` or `math_assistant`")
    )
)]
pub async fn apply_preset(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<PromptUpdated>, ApiError> {
    match prompt_store::apply_preset(state.prompt_store.as_ref(), &name).await {
        Ok(prompt) => Ok(Json(PromptUpdated {
            ok: true,
            prompt: prompt.to_string(),
        })),
        Err(e @ PromptStoreError::UnknownPreset(_)) => Err(ApiError::NotFound(e.to_string())),
        Err(e) => Err(e.into()),
    }
}

/// Read the last lines of the service log.
#[utoipa::path(
    get,
    path = "/dashboard/api/logs",
    params(LogsQuery),
    responses(
        (status = 200, description = "Trailing log lines", body = LogsResponse),
        (status = 400, description = "Invalid line count", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn get_logs(
    State(state): State<Arc<AppState>>,
    query: Result<Query<LogsQuery>, QueryRejection>,
) -> Result<Json<LogsResponse>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let lines = query.lines.unwrap_or(DEFAULT_LOG_LINES);
    let logs = logs::tail(&state.log_path, lines).await?;
    Ok(Json(LogsResponse {
        logs,
        path: state.log_path.display().to_string(),
    }))
}

/// Stream log lines as server-sent events as they are written.
pub async fn stream_logs(
    State(state): State<Arc<AppState>>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let lines = logs::follow(state.log_path.clone(), state.log_poll_interval).await?;
    let events = lines.map(|line| Ok::<_, Infallible>(Event::default().data(line)));
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
