// src/persona/modes.rs

//! Assistant modes: a closed enumeration, each mapping to a fixed
//! configuration bundle. Exactly one mode is active at a time and switching
//! modes never touches memory.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Assistant,
    Focus,
    Creative,
    Technical,
}

/// Configuration bundle for one mode.
pub struct ModeConfig {
    pub name: &'static str,
    pub description: &'static str,
    pub system_prompt_template: &'static str,
    pub temperature: f32,
    pub allowed_tools: &'static [&'static str],
}

pub static MODE_CONFIGS: [(Mode, ModeConfig); 4] = [
    (
        Mode::Assistant,
        ModeConfig {
            name: "Assistant",
            description: "versatile day-to-day helper",
            system_prompt_template:
                "Act as a personal technical assistant. Be direct, useful, and proactive.",
            temperature: 0.7,
            allowed_tools: &["search", "calendar", "notes"],
        },
    ),
    (
        Mode::Focus,
        ModeConfig {
            name: "Focus",
            description: "short answers, no tangents",
            system_prompt_template:
                "Act as a focus companion. Answer in as few words as the question allows and never introduce side topics.",
            temperature: 0.4,
            allowed_tools: &["notes"],
        },
    ),
    (
        Mode::Creative,
        ModeConfig {
            name: "Creative",
            description: "brainstorming and open-ended exploration",
            system_prompt_template:
                "Act as a creative partner. Offer unexpected angles, alternatives, and follow-on ideas.",
            temperature: 0.9,
            allowed_tools: &["search", "notes", "images"],
        },
    ),
    (
        Mode::Technical,
        ModeConfig {
            name: "Technical",
            description: "code and systems work",
            system_prompt_template:
                "Act as a senior software engineer. Provide clean, well-architected code and justify significant technical decisions.",
            temperature: 0.2,
            allowed_tools: &["search", "code", "notes"],
        },
    ),
];

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::Assistant, Mode::Focus, Mode::Creative, Mode::Technical];

    pub fn config(&self) -> &'static ModeConfig {
        // MODE_CONFIGS covers every variant; the fallback is unreachable but
        // keeps the lookup total.
        MODE_CONFIGS
            .iter()
            .find(|(mode, _)| mode == self)
            .map(|(_, config)| config)
            .unwrap_or(&MODE_CONFIGS[0].1)
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Mode::Assistant => "assistant",
                Mode::Focus => "focus",
                Mode::Creative => "creative",
                Mode::Technical => "technical",
            }
        )
    }
}

impl std::str::FromStr for Mode {
    type Err = ();

    /// Parse a mode name from user input, e.g. the `/mode [name]` command.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "assistant" => Ok(Mode::Assistant),
            "focus" => Ok(Mode::Focus),
            "creative" => Ok(Mode::Creative),
            "technical" => Ok(Mode::Technical),
            _ => Err(()),
        }
    }
}
