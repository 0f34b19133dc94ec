// src/storage/mod.rs

//! Durable persistence for the memory tiers and assistant settings.
//!
//! All reads and writes go through the `KeyValueStore` trait—no direct file
//! access in business logic. The `MemoryStore` façade on top of it fails
//! soft in both directions: a corrupt record loads as the tier default, a
//! failed write is reported through the return value and logged, never
//! raised. Memory persistence must not block conversation flow.

mod file;

pub use file::FileStore;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::OrionError;
use crate::memory::types::{LongTermMemory, MediumTermMemory};
use crate::persona::{Mode, Personality};

/// Key prefix shared by every persisted record.
const KEY_PREFIX: &str = "orion";

/// The persistence collaborator contract: namespaced string key/value,
/// where any operation may fail (quota, I/O, serialization on the far side).
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
    fn delete(&self, key: &str) -> anyhow::Result<()>;
}

/// Which persisted state a `clear` call removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearScope {
    Medium,
    Long,
    All,
}

/// Durable store for the memory tiers, personality, and mode, namespaced by
/// device id. Short-term memory is session-owned and never persisted here.
pub struct MemoryStore {
    kv: Box<dyn KeyValueStore>,
    namespace: String,
}

impl MemoryStore {
    pub fn new(kv: Box<dyn KeyValueStore>, device_id: &str) -> Self {
        Self {
            kv,
            namespace: device_id.to_string(),
        }
    }

    fn key(&self, suffix: &str) -> String {
        format!("{}_{}_{}", KEY_PREFIX, self.namespace, suffix)
    }

    pub fn load_medium(&self) -> MediumTermMemory {
        self.load_json("memory_medium")
    }

    pub fn save_medium(&self, memory: &MediumTermMemory) -> bool {
        self.save_json("memory_medium", memory)
    }

    pub fn load_long(&self) -> LongTermMemory {
        self.load_json("memory_long")
    }

    pub fn save_long(&self, memory: &LongTermMemory) -> bool {
        self.save_json("memory_long", memory)
    }

    /// Load the persisted personality, falling back to the process default
    /// on a missing or corrupt record. Loaded values are re-validated so a
    /// hand-edited file cannot smuggle in out-of-range weights.
    pub fn load_personality(&self) -> Personality {
        let personality: Personality = self.load_json("personality");
        personality.validated()
    }

    pub fn save_personality(&self, personality: &Personality) -> bool {
        self.save_json("personality", personality)
    }

    pub fn load_mode(&self) -> Mode {
        self.load_json("mode")
    }

    pub fn save_mode(&self, mode: Mode) -> bool {
        self.save_json("mode", &mode)
    }

    /// Remove persisted state. The device identity is never cleared here;
    /// it outlives every user-initiated reset.
    pub fn clear(&self, scope: ClearScope) {
        let suffixes: &[&str] = match scope {
            ClearScope::Medium => &["memory_medium"],
            ClearScope::Long => &["memory_long"],
            ClearScope::All => &["memory_medium", "memory_long", "personality", "mode", "last_sync"],
        };
        for suffix in suffixes {
            if let Err(e) = self.kv.delete(&self.key(suffix)) {
                warn!("failed to clear {}: {}", suffix, e);
            }
        }
    }

    /// Record the last successful persistence time. Used for the UI
    /// "last synced" indicator; failure to write it is itself soft.
    pub fn touch_sync_timestamp(&self) {
        let now = Utc::now().to_rfc3339();
        if let Err(e) = self.kv.set(&self.key("last_sync"), &now) {
            warn!("failed to record sync timestamp: {}", e);
        }
    }

    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        match self.kv.get(&self.key("last_sync")) {
            Ok(Some(raw)) => DateTime::parse_from_rfc3339(raw.trim())
                .map(|t| t.with_timezone(&Utc))
                .ok(),
            _ => None,
        }
    }

    /// Direct access to the underlying collaborator, for records that live
    /// outside the per-device namespace (the device identity itself).
    pub fn raw(&self) -> &dyn KeyValueStore {
        self.kv.as_ref()
    }

    fn load_json<T: DeserializeOwned + Default>(&self, suffix: &str) -> T {
        let key = self.key(suffix);
        match self.kv.get(&key) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => value,
                Err(e) => {
                    let err = OrionError::Validation(format!("{}: {}", key, e));
                    warn!("{}; substituting default", err);
                    T::default()
                }
            },
            Ok(None) => T::default(),
            Err(e) => {
                let err = OrionError::Persistence(format!("{}: {}", key, e));
                warn!("{}; substituting default", err);
                T::default()
            }
        }
    }

    fn save_json<T: Serialize>(&self, suffix: &str, value: &T) -> bool {
        let key = self.key(suffix);
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("failed to serialize {}: {}", key, e);
                return false;
            }
        };
        match self.kv.set(&key, &raw) {
            Ok(()) => {
                debug!("persisted {}", key);
                true
            }
            Err(e) => {
                warn!("failed to persist {}: {}", key, e);
                false
            }
        }
    }
}
