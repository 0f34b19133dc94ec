// src/prompt/actions.rs

//! Suggested next actions: a pure lookup keyed by intent and mode, enriched
//! with the most recently touched project. An empty list is a valid result,
//! not an error.

use crate::context::ConversationContext;
use crate::persona::Mode;

use super::intent::IntentTag;

/// Cap on suggestions surfaced per turn.
const MAX_SUGGESTIONS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionSuggestion {
    pub label: String,
}

impl ActionSuggestion {
    fn new(label: impl Into<String>) -> Self {
        Self { label: label.into() }
    }
}

pub fn suggest_next_actions(
    intent: IntentTag,
    mode: Mode,
    context: &ConversationContext,
) -> Vec<ActionSuggestion> {
    let mut suggestions = Vec::new();

    if intent == IntentTag::Correction {
        suggestions.push(ActionSuggestion::new(
            "Re-check the previous answer against the correction",
        ));
    }

    let base: &[&str] = match mode {
        Mode::Assistant => &["Summarize where we left off", "Plan the next steps"],
        // Focus mode deliberately suggests nothing; suggestions are noise there.
        Mode::Focus => &[],
        Mode::Creative => &["Brainstorm three alternatives", "Push the strongest idea further"],
        Mode::Technical => &[
            "Review the latest change for code smells",
            "Add a test covering the new behavior",
        ],
    };
    suggestions.extend(base.iter().map(|s| ActionSuggestion::new(*s)));

    // Most recently touched project, when one is in scope.
    if let Some((key, _)) = context.relevant_medium.first() {
        suggestions.push(ActionSuggestion::new(format!("Continue work on '{}'", key)));
    }

    suggestions.truncate(MAX_SUGGESTIONS);
    suggestions
}
