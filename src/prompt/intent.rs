// src/prompt/intent.rs

//! Lexical intent detection and memory-folding signals.
//!
//! Classification is a closed set over cheap heuristics—no model call, no
//! allocation-heavy parsing. Ties break toward the more specific tag, so a
//! message that both greets and asks is a question, not smalltalk. Unknown
//! input maps to `Unknown`; nothing here returns an error.

use serde::{Deserialize, Serialize};

use crate::memory::types::Turn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentTag {
    Question,
    Command,
    Correction,
    Smalltalk,
    Unknown,
}

const INTERROGATIVES: &[&str] = &[
    "what", "how", "why", "when", "where", "who", "which", "can", "could", "should", "would",
    "is", "are", "do", "does", "did", "will",
];

const COMMAND_VERBS: &[&str] = &[
    "create", "make", "build", "write", "implement", "fix", "add", "remove", "delete", "show",
    "list", "run", "generate", "refactor", "deploy", "open", "start", "stop", "remember",
    "explain", "summarize",
];

const CORRECTION_MARKERS: &[&str] = &[
    "that's wrong",
    "that is wrong",
    "that's not right",
    "not what i meant",
    "not what i asked",
    "you're wrong",
    "incorrect",
];

const SMALLTALK_MARKERS: &[&str] = &[
    "hello", "hi", "hey", "good morning", "good afternoon", "good evening", "thanks",
    "thank you", "bye", "goodbye",
];

/// Classify the latest user message against the short-term window.
pub fn detect_intent(message: &str, recent_turns: &[Turn]) -> IntentTag {
    let msg = message.trim().to_lowercase();
    if msg.is_empty() {
        return IntentTag::Unknown;
    }

    // A correction only makes sense after the assistant has said something.
    let has_prior_reply = recent_turns.iter().any(|t| t.assistant.is_some());
    if has_prior_reply
        && (CORRECTION_MARKERS.iter().any(|m| msg.contains(m))
            || msg.starts_with("no,")
            || msg.starts_with("actually"))
    {
        return IntentTag::Correction;
    }

    let first_word = first_word(&msg);
    if COMMAND_VERBS.contains(&first_word)
        || COMMAND_VERBS.iter().any(|v| msg.starts_with(&format!("please {}", v)))
    {
        return IntentTag::Command;
    }

    if msg.ends_with('?') || INTERROGATIVES.contains(&first_word) {
        return IntentTag::Question;
    }

    if SMALLTALK_MARKERS.iter().any(|m| msg.starts_with(m)) {
        return IntentTag::Smalltalk;
    }

    IntentTag::Unknown
}

fn first_word(msg: &str) -> &str {
    msg.split(|c: char| !c.is_ascii_alphanumeric())
        .find(|w| !w.is_empty())
        .unwrap_or("")
}

/// A message flagged as project-relevant: key plus a one-line summary delta
/// for `upsert_project_context`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectSignal {
    pub key: String,
    pub summary: String,
}

/// A message carrying a learnable fact for `reinforce_fact`.
#[derive(Debug, Clone, PartialEq)]
pub struct FactSignal {
    pub key: String,
    pub value: String,
}

const PROJECT_MARKERS: &[&str] = &["working on ", "my project ", "the project ", "project "];

/// Detect "the user is talking about a project" and derive a stable key from
/// the first few words after the marker.
pub fn extract_project_signal(message: &str) -> Option<ProjectSignal> {
    let msg = message.trim().to_lowercase();
    for marker in PROJECT_MARKERS {
        if let Some(idx) = msg.find(marker) {
            let rest = &msg[idx + marker.len()..];
            let words: Vec<&str> = rest
                .split(|c: char| !c.is_ascii_alphanumeric())
                .filter(|w| !w.is_empty())
                .take(3)
                .collect();
            if words.is_empty() {
                continue;
            }
            let summary = rest
                .split(['.', '!', '?', '\n'])
                .next()
                .unwrap_or(rest)
                .trim()
                .to_string();
            return Some(ProjectSignal {
                key: words.join("_"),
                summary,
            });
        }
    }
    None
}

/// High-precision fact patterns only; anything fuzzier goes through an
/// explicit `reinforce_fact` call instead of autonomous extraction.
pub fn extract_fact_signal(message: &str) -> Option<FactSignal> {
    let msg = message.trim().to_lowercase();

    // "my favorite color is blue"
    if let Some(idx) = msg.find("my favorite ") {
        let rest = &msg[idx + "my favorite ".len()..];
        if let Some(is_idx) = rest.find(" is ") {
            let subject = slug(&rest[..is_idx]);
            let value = clean_value(&rest[is_idx + " is ".len()..]);
            if !subject.is_empty() && !value.is_empty() {
                return Some(FactSignal {
                    key: format!("favorite_{}", subject),
                    value,
                });
            }
        }
    }

    // "remember that my editor is helix" / "remember my editor is helix"
    for marker in ["remember that ", "remember "] {
        if let Some(idx) = msg.find(marker) {
            let rest = &msg[idx + marker.len()..];
            if let Some(is_idx) = rest.find(" is ") {
                let subject = slug(rest[..is_idx].trim_start_matches("my "));
                let value = clean_value(&rest[is_idx + " is ".len()..]);
                if !subject.is_empty() && !value.is_empty() {
                    return Some(FactSignal { key: subject, value });
                }
            }
        }
    }

    // "i prefer tabs"
    if let Some(idx) = msg.find("i prefer ") {
        let value = clean_value(&msg[idx + "i prefer ".len()..]);
        if !value.is_empty() {
            return Some(FactSignal {
                key: "preference".into(),
                value,
            });
        }
    }

    None
}

fn slug(text: &str) -> String {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

fn clean_value(text: &str) -> String {
    text.split(['.', '!', '?', ',', '\n'])
        .next()
        .unwrap_or(text)
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn questions_are_detected() {
        assert_eq!(detect_intent("What's the weather?", &[]), IntentTag::Question);
        assert_eq!(detect_intent("how does this work", &[]), IntentTag::Question);
    }

    #[test]
    fn commands_are_detected() {
        assert_eq!(detect_intent("fix the login bug", &[]), IntentTag::Command);
        assert_eq!(detect_intent("please write a test", &[]), IntentTag::Command);
    }

    #[test]
    fn corrections_require_a_prior_reply() {
        let history = vec![Turn::completed("q", "a")];
        assert_eq!(detect_intent("no, that's wrong", &history), IntentTag::Correction);
        // Without history the same words are not a correction.
        assert_ne!(detect_intent("no, that's wrong", &[]), IntentTag::Correction);
    }

    #[test]
    fn specific_tags_beat_smalltalk() {
        assert_eq!(detect_intent("hi, can you fix this?", &[]), IntentTag::Question);
        assert_eq!(detect_intent("hey there", &[]), IntentTag::Smalltalk);
    }

    #[test]
    fn empty_and_noise_map_to_unknown() {
        assert_eq!(detect_intent("", &[]), IntentTag::Unknown);
        assert_eq!(detect_intent("   ", &[]), IntentTag::Unknown);
        assert_eq!(detect_intent("zzz qqq", &[]), IntentTag::Unknown);
    }

    #[test]
    fn project_signal_derives_key_and_summary() {
        let signal = extract_project_signal("I'm working on the orion memory engine today.").unwrap();
        assert_eq!(signal.key, "the_orion_memory");
        assert!(signal.summary.starts_with("the orion memory engine"));
        assert!(extract_project_signal("nothing relevant here").is_none());
    }

    #[test]
    fn favorite_pattern_yields_a_fact() {
        let signal = extract_fact_signal("my favorite color is blue").unwrap();
        assert_eq!(signal.key, "favorite_color");
        assert_eq!(signal.value, "blue");
    }

    #[test]
    fn remember_pattern_yields_a_fact() {
        let signal = extract_fact_signal("Remember that my editor is helix, please").unwrap();
        assert_eq!(signal.key, "editor");
        assert_eq!(signal.value, "helix");
    }

    #[test]
    fn preference_pattern_yields_a_fact() {
        let signal = extract_fact_signal("I prefer tabs over spaces.").unwrap();
        assert_eq!(signal.key, "preference");
        assert_eq!(signal.value, "tabs over spaces");
    }
}
