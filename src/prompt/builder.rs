// src/prompt/builder.rs

use std::fmt::Write as _;

use crate::context::{Connectivity, ConversationContext};
use crate::persona::Personality;

/// How many recent-topic words the context section carries.
const DIGEST_TOPIC_LIMIT: usize = 5;

/// Builds the complete system prompt: identity, active mode, communication
/// style, current context, memory digest, and (for a proactive personality)
/// the proactive guidance block. Deterministic for a given context; empty
/// tiers still yield a well-formed prompt.
pub fn build_system_prompt(context: &ConversationContext) -> String {
    let mut prompt = String::new();
    let personality = &context.personality;
    let mode = context.mode.config();

    // 1. Core identity
    let _ = writeln!(prompt, "You are {}, {}.", personality.name, personality.role);
    prompt.push('\n');

    // 2. Active mode
    let _ = writeln!(prompt, "Active mode: {}", mode.name);
    prompt.push_str(mode.system_prompt_template);
    prompt.push_str("\n\n");

    // 3. Communication style
    prompt.push_str("Communication style:\n");
    let _ = writeln!(prompt, "- Tone: {}", personality.tone.guideline());
    let _ = writeln!(prompt, "- {}", personality.verbosity.guideline());
    if !personality.traits.is_empty() {
        let traits: Vec<String> = personality
            .traits
            .iter()
            .map(|(name, weight)| format!("{} ({:.1})", name, weight))
            .collect();
        let _ = writeln!(prompt, "- Traits: {}", traits.join(", "));
    }
    prompt.push('\n');

    // 4. Current context
    prompt.push_str("Current context:\n");
    let _ = writeln!(
        prompt,
        "- It is {} on a {:?} device ({}).",
        context.environment.time_of_day.label(),
        context.environment.device,
        match context.environment.connectivity {
            Connectivity::Online => "online",
            Connectivity::Offline => "offline",
        }
    );
    let topics = build_conversation_digest(context, DIGEST_TOPIC_LIMIT);
    if topics.is_empty() {
        prompt.push_str("- This is the start of the conversation.\n");
    } else {
        let _ = writeln!(prompt, "- Recent topics: {}", topics.join(", "));
    }
    prompt.push('\n');

    // 5. Memory digest (most recent projects first, highest-confidence facts first)
    if !context.relevant_medium.is_empty() || !context.relevant_long.is_empty() {
        prompt.push_str("Working memory:\n");
        for (key, project) in &context.relevant_medium {
            let _ = writeln!(prompt, "- Project '{}': {}", key, project.summary);
        }
        for (key, fact) in &context.relevant_long {
            let _ = writeln!(
                prompt,
                "- Known: {} = {} (confidence {:.1})",
                key, fact.value, fact.confidence
            );
        }
        prompt.push_str(
            "Use these naturally when relevant; never recite them like a log.\n\n",
        );
    }

    // 6. Proactive guidance
    if personality.is_proactive() {
        prompt.push_str(proactive_block());
    }

    prompt.trim_end().to_string()
}

fn proactive_block() -> &'static str {
    "Proactive behavior:\n\
     - Point out problems you notice before being asked\n\
     - Anticipate the next step from the current context\n\
     - Recommend better approaches when one exists\n"
}

/// Condensed view of the short-term window: distinctive words from the most
/// recent completed turns, oldest first, deduplicated. Used for the context
/// section and cheap enough to rebuild every turn.
pub fn build_conversation_digest(context: &ConversationContext, limit: usize) -> Vec<String> {
    let mut topics: Vec<String> = Vec::new();
    for turn in context.short_term.iter().rev().take(10) {
        if turn.failed {
            continue;
        }
        for word in turn.user.to_lowercase().split(|c: char| !c.is_ascii_alphanumeric()) {
            if word.len() >= 5 && !topics.iter().any(|t| t == word) {
                topics.push(word.to_string());
            }
        }
    }
    topics.truncate(limit);
    topics
}

/// Serialize a personality trait summary for display surfaces outside the
/// prompt itself (status commands, diagnostics).
pub fn personality_summary(personality: &Personality) -> String {
    format!(
        "{} — {} ({:?}/{:?}, proactivity {:.1})",
        personality.name, personality.role, personality.tone, personality.verbosity, personality.proactivity
    )
}
