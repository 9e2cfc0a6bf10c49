//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the application: the
//! telephony webhooks, the operator panel page and API, and the OpenAPI
//! document.

use crate::{
    handlers,
    panel,
    models::{ErrorResponse, LogsResponse, PromptResponse, PromptUpdated, SetPromptPayload},
    state::AppState,
    webhook,
};

use axum::{
    Json, Router,
    routing::{get, post},
};
use std::sync::Arc;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::get_prompt,
        handlers::set_prompt,
        handlers::apply_preset,
        handlers::get_logs,
    ),
    components(
        schemas(SetPromptPayload, PromptResponse, PromptUpdated, LogsResponse, ErrorResponse)
    ),
    tags(
        (name = "Phone Teacher Panel", description = "Persona and log management for the phone teacher")
    )
)]
pub struct ApiDoc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let webhook_router = Router::new()
        .route(
            "/",
            get(webhook::inbound_call).post(webhook::inbound_call),
        )
        .route("/gather_response", post(webhook::gather_response))
        .route("/gather_followup", post(webhook::gather_followup));

    let panel_router = Router::new()
        .route(
            "/prompt",
            get(handlers::get_prompt).post(handlers::set_prompt),
        )
        .route("/preset/{name}", post(handlers::apply_preset))
        .route("/logs", get(handlers::get_logs))
        .route("/stream", get(handlers::stream_logs));

    let stateful = Router::new()
        .merge(webhook_router)
        .nest("/dashboard/api", panel_router)
        .with_state(app_state);

    Router::new()
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .route("/dashboard", get(panel::index))
        .route("/dashboard/", get(panel::index))
        .route("/dashboard/static/dashboard.js", get(panel::script))
        .merge(stateful)
}
