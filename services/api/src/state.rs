//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds all shared,
//! clonable resources like the dialogue controller and the prompt store.

use phone_teacher_core::{
    dialogue::DialogueController, prompt_store::PromptStore, voice::VoiceSettings,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<DialogueController>,
    pub prompt_store: Arc<dyn PromptStore>,
    pub voice: Arc<VoiceSettings>,
    /// The log sink the panel tails and streams.
    pub log_path: PathBuf,
    pub log_poll_interval: Duration,
}
