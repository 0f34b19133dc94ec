// src/persona/mod.rs
// Personality and mode configuration for the assistant.
// Both are always defined: missing or corrupt persisted state falls back to
// DEFAULT_PERSONALITY / Mode::default() before the prompt engine sees them.

mod modes;

pub use modes::{Mode, ModeConfig, MODE_CONFIGS};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Technical,
    Casual,
    Formal,
    Friendly,
}

impl Tone {
    /// One-line guideline interpolated into the communication-style section.
    pub fn guideline(&self) -> &'static str {
        match self {
            Tone::Technical => "precise, objective, and to the point",
            Tone::Casual => "relaxed but professional",
            Tone::Formal => "formal and structured",
            Tone::Friendly => "warm and approachable",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Concise,
    Balanced,
    Detailed,
}

impl Verbosity {
    pub fn guideline(&self) -> &'static str {
        match self {
            Verbosity::Concise => "Keep answers short; only the essentials.",
            Verbosity::Balanced => "Complete but focused answers; detail where it earns its place.",
            Verbosity::Detailed => "Thorough answers with deep explanations and examples.",
        }
    }
}

/// Fixed-shape personality configuration. Trait weights use a BTreeMap so
/// prompt rendering stays deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Personality {
    pub name: String,
    pub role: String,
    pub tone: Tone,
    pub verbosity: Verbosity,
    /// 0..1; above `PROACTIVITY_THRESHOLD` the prompt carries the proactive
    /// guidance block.
    pub proactivity: f32,
    /// Named traits with numeric weights in 0..1.
    pub traits: BTreeMap<String, f32>,
}

/// Proactivity level at which the assistant starts volunteering suggestions.
pub const PROACTIVITY_THRESHOLD: f32 = 0.6;

impl Personality {
    /// Clamp loaded values into their documented ranges and drop trait
    /// weights that are not finite. Applied on every load from storage.
    pub fn validated(mut self) -> Self {
        self.proactivity = if self.proactivity.is_finite() {
            self.proactivity.clamp(0.0, 1.0)
        } else {
            default_personality().proactivity
        };
        self.traits
            .retain(|_, weight| weight.is_finite() && (0.0..=1.0).contains(weight));
        if self.name.trim().is_empty() {
            self.name = default_personality().name;
        }
        self
    }

    pub fn is_proactive(&self) -> bool {
        self.proactivity > PROACTIVITY_THRESHOLD
    }
}

impl Default for Personality {
    fn default() -> Self {
        default_personality()
    }
}

/// Process-wide default used when no persisted personality exists.
pub fn default_personality() -> Personality {
    let mut traits = BTreeMap::new();
    traits.insert("anticipates problems".to_string(), 0.7);
    traits.insert("explains tradeoffs".to_string(), 0.8);
    traits.insert("pragmatic".to_string(), 0.9);
    Personality {
        name: "O.R.I.O.N".to_string(),
        role: "senior software engineer and systems architect".to_string(),
        tone: Tone::Technical,
        verbosity: Verbosity::Balanced,
        proactivity: 0.8,
        traits,
    }
}
