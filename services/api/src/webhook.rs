//! Telephony Webhook Handlers
//!
//! The provider calls these endpoints once per turn and executes the TwiML we
//! return. They never fail: a malformed form body is treated as silence, and
//! the controller already turns completion failures into spoken apologies.

use axum::{
    Form,
    extract::{State, rejection::FormRejection},
    http::header,
    response::{IntoResponse, Response},
};
use phone_teacher_core::voice::VoiceResponse;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::{models::SpeechForm, state::AppState};

fn twiml(state: &AppState, response: &VoiceResponse) -> Response {
    (
        [(header::CONTENT_TYPE, "application/xml")],
        response.to_twiml(&state.voice),
    )
        .into_response()
}

fn speech_from(form: Result<Form<SpeechForm>, FormRejection>) -> SpeechForm {
    match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            warn!(error = %rejection, "Unreadable webhook body, treating as silence");
            SpeechForm::default()
        }
    }
}

/// Entry point for a new inbound call.
pub async fn inbound_call(State(state): State<Arc<AppState>>) -> Response {
    info!("Inbound call");
    let outcome = state.controller.entry();
    twiml(&state, &outcome.response)
}

/// Receives the caller's first question.
#[instrument(name = "gather_response", skip_all, fields(call_sid))]
pub async fn gather_response(
    State(state): State<Arc<AppState>>,
    form: Result<Form<SpeechForm>, FormRejection>,
) -> Response {
    let form = speech_from(form);
    record_call_sid(&form);
    let speech = form.speech_result.unwrap_or_default();

    let outcome = state.controller.first_response(&speech).await;
    info!(state = ?outcome.state, "Turn complete");
    twiml(&state, &outcome.response)
}

/// Receives the caller's reply to the follow-up offer.
#[instrument(name = "gather_followup", skip_all, fields(call_sid))]
pub async fn gather_followup(
    State(state): State<Arc<AppState>>,
    form: Result<Form<SpeechForm>, FormRejection>,
) -> Response {
    let form = speech_from(form);
    record_call_sid(&form);
    let speech = form.speech_result.unwrap_or_default();

    let outcome = state.controller.follow_up(&speech).await;
    info!(state = ?outcome.state, "Turn complete");
    twiml(&state, &outcome.response)
}

fn record_call_sid(form: &SpeechForm) {
    if let Some(sid) = &form.call_sid {
        tracing::Span::current().record("call_sid", sid.as_str());
    }
}
