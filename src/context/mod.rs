// src/context/mod.rs
//! Request-scoped context assembly.
//!
//! `ConversationContext` is rebuilt from the memory tiers before every
//! completion call and discarded afterwards; nothing here is persisted.
//! `EnvironmentContext` comes from a read-only collaborator polled per turn.

use chrono::Timelike;

use crate::identity::DeviceKind;
use crate::memory::types::{Fact, ProjectContext, Turn};
use crate::persona::{Mode, Personality};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => TimeOfDay::Morning,
            12..=17 => TimeOfDay::Afternoon,
            18..=21 => TimeOfDay::Evening,
            _ => TimeOfDay::Night,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "morning",
            TimeOfDay::Afternoon => "afternoon",
            TimeOfDay::Evening => "evening",
            TimeOfDay::Night => "night",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    Online,
    Offline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvironmentContext {
    pub time_of_day: TimeOfDay,
    pub device: DeviceKind,
    pub connectivity: Connectivity,
}

/// Environment collaborator: read-only, polled once per turn.
pub trait EnvironmentProvider: Send + Sync {
    fn current(&self) -> EnvironmentContext;
}

/// Wall-clock environment for the host machine.
pub struct SystemEnvironment {
    device: DeviceKind,
    online: bool,
}

impl SystemEnvironment {
    pub fn new(device: DeviceKind, online: bool) -> Self {
        Self { device, online }
    }
}

impl EnvironmentProvider for SystemEnvironment {
    fn current(&self) -> EnvironmentContext {
        EnvironmentContext {
            time_of_day: TimeOfDay::from_hour(chrono::Local::now().hour()),
            device: self.device,
            connectivity: if self.online {
                Connectivity::Online
            } else {
                Connectivity::Offline
            },
        }
    }
}

/// Everything the prompt engine consumes for one turn. Mode and personality
/// are always defined here; defaulting happened at load time.
#[derive(Debug, Clone)]
pub struct ConversationContext {
    pub mode: Mode,
    pub personality: Personality,
    pub short_term: Vec<Turn>,
    pub relevant_medium: Vec<(String, ProjectContext)>,
    pub relevant_long: Vec<(String, Fact)>,
    pub environment: EnvironmentContext,
}

impl ConversationContext {
    /// A bare context over empty tiers; the prompt engine must still produce
    /// a well-formed prompt from this.
    pub fn empty(environment: EnvironmentContext) -> Self {
        Self {
            mode: Mode::default(),
            personality: Personality::default(),
            short_term: Vec::new(),
            relevant_medium: Vec::new(),
            relevant_long: Vec::new(),
            environment,
        }
    }
}
