//! Voice Response Documents
//!
//! A `VoiceResponse` is the ordered list of directives returned to the
//! telephony provider for a single webhook turn. It is built fresh per turn and
//! rendered to TwiML, the XML dialect the provider executes.

use std::fmt::Write as _;

/// How the provider should synthesize `Say` directives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceSettings {
    pub voice: String,
    pub language: String,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            voice: "alice".to_string(),
            language: "en-US".to_string(),
        }
    }
}

/// A bounded speech-capture window.
///
/// When the caller speaks, the provider posts the transcription to `action`.
/// When the window expires in silence, the provider falls through to the
/// directives that follow the gather in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gather {
    pub action: String,
    pub timeout_secs: u32,
    pub prompt: String,
}

/// A single instruction for the telephony provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Say(String),
    Pause { seconds: u32 },
    Gather(Gather),
    Hangup,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoiceResponse {
    directives: Vec<Directive>,
}

impl VoiceResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn say(mut self, text: impl Into<String>) -> Self {
        self.directives.push(Directive::Say(text.into()));
        self
    }

    pub fn pause(mut self, seconds: u32) -> Self {
        self.directives.push(Directive::Pause { seconds });
        self
    }

    pub fn gather(mut self, gather: Gather) -> Self {
        self.directives.push(Directive::Gather(gather));
        self
    }

    pub fn hangup(mut self) -> Self {
        self.directives.push(Directive::Hangup);
        self
    }

    pub fn extend(mut self, directives: impl IntoIterator<Item = Directive>) -> Self {
        self.directives.extend(directives);
        self
    }

    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    /// All listen windows in the document, in order.
    pub fn gathers(&self) -> impl Iterator<Item = &Gather> {
        self.directives.iter().filter_map(|d| match d {
            Directive::Gather(g) => Some(g),
            _ => None,
        })
    }

    /// A document ends the call when it offers no further listen window.
    pub fn is_terminal(&self) -> bool {
        self.gathers().next().is_none()
    }

    /// Texts of the top-level `Say` directives, excluding gather prompts.
    pub fn spoken(&self) -> Vec<&str> {
        self.directives
            .iter()
            .filter_map(|d| match d {
                Directive::Say(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Renders the document as a TwiML string.
    pub fn to_twiml(&self, settings: &VoiceSettings) -> String {
        let mut out = String::from(r#"<?xml version="1.0" encoding="UTF-8"?><Response>"#);
        for directive in &self.directives {
            match directive {
                Directive::Say(text) => write_say(&mut out, text, settings),
                Directive::Pause { seconds } => {
                    let _ = write!(out, r#"<Pause length="{seconds}"/>"#);
                }
                Directive::Gather(gather) => {
                    let _ = write!(
                        out,
                        r#"<Gather input="speech" action="{}" method="POST" timeout="{}" speechTimeout="auto">"#,
                        escape_xml(&gather.action),
                        gather.timeout_secs
                    );
                    write_say(&mut out, &gather.prompt, settings);
                    out.push_str("</Gather>");
                }
                Directive::Hangup => out.push_str("<Hangup/>"),
            }
        }
        out.push_str("</Response>");
        out
    }
}

fn write_say(out: &mut String, text: &str, settings: &VoiceSettings) {
    let _ = write!(
        out,
        r#"<Say voice="{}" language="{}">{}</Say>"#,
        escape_xml(&settings.voice),
        escape_xml(&settings.language),
        escape_xml(text)
    );
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
