//! Speech Renderer
//!
//! Turns a block of free-form answer text into paced spoken output: one
//! `Say` per sentence, each followed by a short pause. Synthesized voices read
//! long blocks too quickly for young callers; sentence-level pacing keeps the
//! answer understandable over a phone line.

use crate::voice::Directive;

/// Pause inserted after each spoken sentence, in seconds.
pub const SENTENCE_PAUSE_SECS: u32 = 1;

/// Splits `text` into trimmed, non-empty sentences.
///
/// Whitespace runs are collapsed to a single space first. A sentence ends at
/// `.`, `!` or `?` when the next character is whitespace (or the text ends);
/// the terminal punctuation stays attached to its sentence.
pub fn split_sentences(text: &str) -> Vec<String> {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = normalized.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        let terminal = matches!(c, '.' | '!' | '?');
        if terminal && chars.peek().is_none_or(|next| next.is_whitespace()) {
            push_trimmed(&mut sentences, &current);
            current.clear();
        }
    }
    push_trimmed(&mut sentences, &current);

    sentences
}

fn push_trimmed(sentences: &mut Vec<String>, fragment: &str) {
    let fragment = fragment.trim();
    if !fragment.is_empty() {
        sentences.push(fragment.to_string());
    }
}

/// Renders answer text as an ordered `Say`/`Pause` sequence.
pub fn render(text: &str) -> Vec<Directive> {
    split_sentences(text)
        .into_iter()
        .flat_map(|sentence| {
            [
                Directive::Say(sentence),
                Directive::Pause {
                    seconds: SENTENCE_PAUSE_SECS,
                },
            ]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_on_terminal_punctuation() {
        let sentences = split_sentences("Hello there. How are you?  Good!");
        assert_eq!(sentences, vec!["Hello there.", "How are you?", "Good!"]);
    }

    #[test]
    fn test_render_pauses_after_every_sentence() {
        let directives = render("Hello there. How are you?  Good!");
        assert_eq!(
            directives,
            vec![
                Directive::Say("Hello there.".to_string()),
                Directive::Pause { seconds: 1 },
                Directive::Say("How are you?".to_string()),
                Directive::Pause { seconds: 1 },
                Directive::Say("Good!".to_string()),
                Directive::Pause { seconds: 1 },
            ]
        );
    }

    #[test]
    fn test_whitespace_is_normalized() {
        let sentences = split_sentences("  Plants\n\tmake   food.\r\n\nThey use   light!  ");
        assert_eq!(sentences, vec!["Plants make food.", "They use light!"]);
    }

    #[test]
    fn test_punctuation_inside_words_does_not_split() {
        let sentences = split_sentences("Pi is about 3.14 in value. Neat");
        assert_eq!(sentences, vec!["Pi is about 3.14 in value.", "Neat"]);
    }

    #[test]
    fn test_repeated_punctuation_stays_together() {
        let sentences = split_sentences("Wow!! Really?! Yes...");
        assert_eq!(sentences, vec!["Wow!!", "Really?!", "Yes..."]);
    }

    #[test]
    fn test_empty_and_blank_text_render_nothing() {
        assert!(render("").is_empty());
        assert!(render("   \n\t ").is_empty());
    }

    #[test]
    fn test_text_without_punctuation_is_one_sentence() {
        assert_eq!(
            split_sentences("keep learning every day"),
            vec!["keep learning every day"]
        );
    }
}
