//! API Models
//!
//! Request and response bodies for the operator panel and the telephony
//! webhooks. Panel types derive `ToSchema` for the OpenAPI document.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Number of log lines returned when the caller does not ask for a count.
pub const DEFAULT_LOG_LINES: usize = 200;

/// Body of a persona update. `prompt` is optional here so that a missing
/// field can be reported as a 400 rather than a deserialization rejection.
#[derive(Deserialize, ToSchema, Debug)]
pub struct SetPromptPayload {
    #[schema(example = "You are a patient science teacher.")]
    pub prompt: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct PromptResponse {
    pub prompt: String,
}

/// Acknowledges a persona write and echoes the stored text.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct PromptUpdated {
    pub ok: bool,
    pub prompt: String,
}

#[derive(Deserialize, IntoParams, Debug)]
#[into_params(parameter_in = Query)]
pub struct LogsQuery {
    /// How many trailing lines to return (default 200).
    pub lines: Option<usize>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct LogsResponse {
    pub logs: String,
    pub path: String,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}

/// The subset of the provider's webhook form this service reads.
///
/// The provider posts many more fields; they are ignored.
#[derive(Deserialize, Debug, Default)]
pub struct SpeechForm {
    #[serde(rename = "SpeechResult", default)]
    pub speech_result: Option<String>,
    #[serde(rename = "CallSid", default)]
    pub call_sid: Option<String>,
}
