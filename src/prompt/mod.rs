// src/prompt/mod.rs
// Prompt engine: pure transformation from conversation context to a system
// prompt plus derived signals. No I/O and no randomness anywhere in this
// module—the same context always yields the same output.

pub mod actions;
pub mod builder;
pub mod intent;

pub use actions::{ActionSuggestion, suggest_next_actions};
pub use builder::{build_conversation_digest, build_system_prompt};
pub use intent::{FactSignal, IntentTag, ProjectSignal, detect_intent};

use crate::context::ConversationContext;

/// Everything the prompt engine derives for one turn.
#[derive(Debug, Clone)]
pub struct PromptOutput {
    pub system_prompt: String,
    pub intent: IntentTag,
    pub suggested_actions: Vec<ActionSuggestion>,
    pub project_signal: Option<ProjectSignal>,
    pub fact_signal: Option<FactSignal>,
}

/// Run the full engine for one user message.
pub fn evaluate_turn(context: &ConversationContext, user_message: &str) -> PromptOutput {
    let intent = detect_intent(user_message, &context.short_term);
    PromptOutput {
        system_prompt: build_system_prompt(context),
        suggested_actions: suggest_next_actions(intent, context.mode, context),
        project_signal: intent::extract_project_signal(user_message),
        fact_signal: intent::extract_fact_signal(user_message),
        intent,
    }
}
