//! Dialogue Controller
//!
//! Decides, for each telephony webhook turn, what to say and where the
//! provider should post the caller's next utterance. A call moves through
//! `AwaitingFirstQuestion` → `AwaitingFollowUp` → `Terminated`; the state is
//! carried entirely by which endpoint the provider invokes, so the controller
//! holds no per-call state.
//!
//! Completion failures are absorbed here and turned into spoken apologies.
//! Every operation returns a well-formed document so the provider never sees
//! a server error mid-call.

use crate::{
    llm_client::CompletionClient,
    persona::{self, FOLLOW_UP_INSTRUCTION},
    prompt_store::PromptStore,
    speech,
    voice::{Gather, VoiceResponse},
};
use std::sync::Arc;
use tracing::{info, warn};

/// Caller replies that end the call when heard in a follow-up turn.
pub const NEGATIVE_REPLIES: [&str; 4] = ["no", "nope", "nothing", "bye"];

const GREETING: &str = "Hello again! I'm your learning assistant teacher. Ask your question now";
const NO_QUESTION_HEARD: &str = "I didn't hear a question. Goodbye!";
const NOT_CAUGHT: &str = "Sorry, I didn't catch that.";
const FIRST_ANSWER_INTRO: &str = "Here's what I found:";
const FIRST_ANSWER_APOLOGY: &str = "Sorry, I'm having trouble getting the answer right now.";
const FOLLOW_UP_INTRO: &str = "Here's another explanation:";
const FOLLOW_UP_APOLOGY: &str = "Sorry, I can't reach the teacher service right now.";
const FOLLOW_UP_OFFER: &str = "Would you like to ask another question?";
const FOLLOW_UP_TIMEOUT_FAREWELL: &str = "Goodbye for now!";
const DECLINED_FAREWELL: &str = "Okay! Goodbye and keep learning!";
const SILENT_FAREWELL: &str = "I didn't catch that. Let's stop here for now. Goodbye!";

/// Where the call stands after a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogueState {
    AwaitingFirstQuestion,
    AwaitingFollowUp,
    Terminated,
}

/// The webhook endpoints a listen window can route to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    FirstResponse,
    FollowUp,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::FirstResponse => "/gather_response",
            Route::FollowUp => "/gather_followup",
        }
    }
}

/// Which kind of question turn is being answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnKind {
    Initial,
    FollowUp,
}

/// The result of one webhook turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub state: DialogueState,
    pub response: VoiceResponse,
}

#[derive(Debug, Clone)]
pub struct DialogueSettings {
    /// Seconds the provider listens for speech before falling through.
    pub gather_timeout_secs: u32,
}

impl Default for DialogueSettings {
    fn default() -> Self {
        Self {
            gather_timeout_secs: 5,
        }
    }
}

pub struct DialogueController {
    completion: Arc<dyn CompletionClient>,
    prompts: Arc<dyn PromptStore>,
    settings: DialogueSettings,
}

impl DialogueController {
    pub fn new(
        completion: Arc<dyn CompletionClient>,
        prompts: Arc<dyn PromptStore>,
        settings: DialogueSettings,
    ) -> Self {
        Self {
            completion,
            prompts,
            settings,
        }
    }

    /// The first turn of every call: invite a question and listen for it.
    ///
    /// Silence at this point ends the call; there is nothing yet to follow up on.
    pub fn entry(&self) -> TurnOutcome {
        let response = VoiceResponse::new()
            .gather(self.listen(Route::FirstResponse, GREETING))
            .say(NO_QUESTION_HEARD)
            .hangup();
        TurnOutcome {
            state: DialogueState::AwaitingFirstQuestion,
            response,
        }
    }

    /// Answers the caller's first question.
    pub async fn first_response(&self, speech_text: &str) -> TurnOutcome {
        let question = speech_text.trim();
        if question.is_empty() {
            return self.offer_follow_up(VoiceResponse::new().say(NOT_CAUGHT));
        }

        info!(question = %question, "Student asked");
        self.answer(question, TurnKind::Initial).await
    }

    /// Handles the reply to "Would you like to ask another question?".
    pub async fn follow_up(&self, speech_text: &str) -> TurnOutcome {
        let reply = speech_text.trim().to_lowercase();

        if is_negative_reply(&reply) {
            return terminate(DECLINED_FAREWELL);
        }
        if reply.is_empty() {
            return terminate(SILENT_FAREWELL);
        }

        let question = speech_text.trim();
        info!(question = %question, "Follow-up question");
        self.answer(question, TurnKind::FollowUp).await
    }

    async fn answer(&self, question: &str, kind: TurnKind) -> TurnOutcome {
        let (intro, apology) = match kind {
            TurnKind::Initial => (FIRST_ANSWER_INTRO, FIRST_ANSWER_APOLOGY),
            TurnKind::FollowUp => (FOLLOW_UP_INTRO, FOLLOW_UP_APOLOGY),
        };

        let prompt = self.compose_prompt(question, kind).await;
        let response = match self.completion.complete(&prompt).await {
            Ok(answer) if !answer.trim().is_empty() => VoiceResponse::new()
                .say(intro)
                .pause(speech::SENTENCE_PAUSE_SECS)
                .extend(speech::render(&answer)),
            Ok(_) => {
                warn!("Completion service returned an empty answer");
                VoiceResponse::new().say(apology)
            }
            Err(e) => {
                warn!(error = %e, "Completion request failed");
                VoiceResponse::new().say(apology)
            }
        };
        self.offer_follow_up(response)
    }

    async fn compose_prompt(&self, question: &str, kind: TurnKind) -> String {
        let configured = match self.prompts.get().await {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!(error = %e, "Failed to read persona, using default");
                String::new()
            }
        };
        let persona = persona::resolve(&configured);

        match kind {
            TurnKind::Initial => format!("{persona} Student asked: \"{question}\""),
            TurnKind::FollowUp => {
                format!("{persona} {FOLLOW_UP_INSTRUCTION} Student asked: \"{question}\"")
            }
        }
    }

    fn offer_follow_up(&self, response: VoiceResponse) -> TurnOutcome {
        let response = response
            .gather(self.listen(Route::FollowUp, FOLLOW_UP_OFFER))
            .say(FOLLOW_UP_TIMEOUT_FAREWELL)
            .hangup();
        TurnOutcome {
            state: DialogueState::AwaitingFollowUp,
            response,
        }
    }

    fn listen(&self, route: Route, prompt: &str) -> Gather {
        Gather {
            action: route.path().to_string(),
            timeout_secs: self.settings.gather_timeout_secs,
            prompt: prompt.to_string(),
        }
    }
}

/// Substring match against `NEGATIVE_REPLIES` on already-lowercased text.
fn is_negative_reply(reply: &str) -> bool {
    NEGATIVE_REPLIES.iter().any(|word| reply.contains(word))
}

fn terminate(farewell: &str) -> TurnOutcome {
    TurnOutcome {
        state: DialogueState::Terminated,
        response: VoiceResponse::new().say(farewell).hangup(),
    }
}
