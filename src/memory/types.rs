// src/memory/types.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One user-message/assistant-reply exchange in the short-term window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub user: String,
    /// Absent on a failed turn; a fabricated reply is never recorded.
    pub assistant: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub failed: bool,
}

impl Turn {
    pub fn completed(user: impl Into<String>, assistant: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            assistant: Some(assistant.into()),
            timestamp: Utc::now(),
            failed: false,
        }
    }

    /// Failure marker: kept for UI display, excluded from prompt history.
    pub fn failed(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            assistant: None,
            timestamp: Utc::now(),
            failed: true,
        }
    }
}

/// An active project the user is working on across sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectContext {
    pub summary: String,
    pub last_touched: DateTime<Utc>,
    pub related_decisions: Vec<String>,
}

impl ProjectContext {
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            last_touched: Utc::now(),
            related_decisions: Vec::new(),
        }
    }
}

/// Medium-term tier: project/topic key to context record. Keys are unique by
/// construction; capacity is enforced by the manager, oldest `last_touched`
/// evicted first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediumTermMemory {
    pub projects: BTreeMap<String, ProjectContext>,
}

/// A learned fact. Reinforcement raises confidence (clamped to [0,1], never
/// decreasing) and bumps the count instead of duplicating the entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    pub value: String,
    pub confidence: f32,
    pub first_observed: DateTime<Utc>,
    pub reinforced_count: u32,
}

/// Long-term tier: unbounded by design; eviction is deliberately absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LongTermMemory {
    pub facts: BTreeMap<String, Fact>,
}
