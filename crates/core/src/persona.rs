//! Persona instructions prefixed to every completion request.

use std::{fmt, str::FromStr};

/// Used whenever the operator has not configured a persona.
pub const DEFAULT_PERSONA: &str = "You are a kind, encouraging teacher speaking to a young student over the phone. \
Explain concepts clearly and slowly in one or two short sentences. \
Avoid long words. End with a gentle encouragement like 'Good job!' or 'Keep learning!'.";

/// Appended to the persona for follow-up questions to keep answers short.
pub const FOLLOW_UP_INSTRUCTION: &str = "Continue acting as a friendly teacher. \
Give a short, clear spoken answer, two sentences maximum.";

/// The fixed persona presets an operator can apply from the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preset {
    English,
    SocialStudies,
    Science,
    Math,
}

impl Preset {
    pub const ALL: [Preset; 4] = [
        Preset::English,
        Preset::SocialStudies,
        Preset::Science,
        Preset::Math,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Preset::English => "english",
            Preset::SocialStudies => "social_studies",
            Preset::Science => "science",
            Preset::Math => "math",
        }
    }

    pub fn instruction(self) -> &'static str {
        match self {
            Preset::English => {
                "You are a kind, encouraging English teacher speaking to a young student over the phone. \
Help the student with grammar, vocabulary, and pronunciation in a simple way. \
Explain clearly and slowly in one or two short sentences. Avoid long words. \
End with a gentle encouragement like 'Good job!' or 'Keep learning!'."
            }
            Preset::SocialStudies => {
                "You are a kind, encouraging social studies teacher speaking to a young student over the phone. \
Explain history, geography, and civic ideas clearly and simply in one or two short sentences. \
Avoid long words. End with a gentle encouragement like 'Good job!' or 'Keep learning!'."
            }
            Preset::Science => {
                "You are a kind, encouraging science teacher speaking to a young student over the phone. \
Explain science ideas clearly and slowly in one or two short sentences. Avoid long words. \
End with a gentle encouragement like 'Good job!' or 'Keep learning!'."
            }
            Preset::Math => {
                "You are a kind, encouraging math teacher speaking to a young student over the phone. \
Explain math concepts clearly and simply in one or two short sentences. \
End with a gentle encouragement like 'Good job!' or 'Keep learning!'."
            }
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown preset '{0}'")]
pub struct UnknownPreset(pub String);

impl FromStr for Preset {
    type Err = UnknownPreset;

    /// Accepts both the bare name (`math`) and the panel's `math_assistant` form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bare = s.strip_suffix("_assistant").unwrap_or(s);
        Preset::ALL
            .into_iter()
            .find(|preset| preset.name() == bare)
            .ok_or_else(|| UnknownPreset(s.to_string()))
    }
}

/// Picks the configured persona if it has any content, else the default.
pub fn resolve(configured: &str) -> &str {
    if configured.trim().is_empty() {
        DEFAULT_PERSONA
    } else {
        configured
    }
}
