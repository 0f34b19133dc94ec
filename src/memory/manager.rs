// src/memory/manager.rs

//! Memory manager: tier policy on top of the raw store.
//!
//! Mutations always succeed against the in-memory view (optimistic
//! write-through); a failed persistence write marks the tier dirty and is
//! retried on the next mutation or at `flush`. Nothing here ever returns an
//! error to the caller—a storage hiccup must not abort a conversation turn.

use chrono::Utc;
use tracing::debug;

use crate::persona::{Mode, Personality};
use crate::storage::{ClearScope, MemoryStore};

use super::types::{Fact, LongTermMemory, MediumTermMemory, ProjectContext, Turn};
use super::window::{self, BoundedLog};

/// Capacity settings for the bounded tiers.
#[derive(Debug, Clone, Copy)]
pub struct MemoryPolicy {
    pub short_term_cap: usize,
    pub medium_capacity: usize,
    pub decisions_cap: usize,
}

impl Default for MemoryPolicy {
    fn default() -> Self {
        Self {
            short_term_cap: 50,
            medium_capacity: 24,
            decisions_cap: 20,
        }
    }
}

/// Which memory a `clear` call targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierClear {
    Short,
    Medium,
    Long,
    All,
}

pub struct MemoryManager {
    store: MemoryStore,
    policy: MemoryPolicy,
    short: BoundedLog<Turn>,
    medium: MediumTermMemory,
    long: LongTermMemory,
    personality: Personality,
    mode: Mode,
    dirty_medium: bool,
    dirty_long: bool,
    dirty_settings: bool,
}

impl MemoryManager {
    /// Initialize from persisted state; every tier falls back to its empty
    /// default and settings to the process defaults.
    pub fn new(store: MemoryStore, policy: MemoryPolicy) -> Self {
        let medium = store.load_medium();
        let long = store.load_long();
        let personality = store.load_personality();
        let mode = store.load_mode();
        Self {
            store,
            policy,
            short: BoundedLog::new(policy.short_term_cap),
            medium,
            long,
            personality,
            mode,
            dirty_medium: false,
            dirty_long: false,
            dirty_settings: false,
        }
    }

    // ── Short term

    /// Append a completed turn to the sliding window.
    pub fn record_turn(&mut self, user: &str, assistant: &str) {
        self.short.push(Turn::completed(user, assistant));
        self.flush();
    }

    /// Record a failure marker so a UI can show the attempt. Not durable and
    /// never serialized into prompt history.
    pub fn record_failed_turn(&mut self, user: &str) {
        self.short.push(Turn::failed(user));
    }

    /// The current window, oldest first.
    pub fn short_term(&self) -> Vec<Turn> {
        self.short.to_vec()
    }

    // ── Medium term

    /// Create or merge a project context. Merging refreshes `last_touched`
    /// and appends the delta to the decision list (oldest evicted past the
    /// cap). Inserting a new key at capacity evicts the entry with the
    /// oldest `last_touched` first.
    pub fn upsert_project_context(&mut self, key: &str, summary_delta: &str) {
        if let Some(existing) = self.medium.projects.get_mut(key) {
            existing.last_touched = Utc::now();
            if !summary_delta.trim().is_empty() {
                existing.summary = summary_delta.trim().to_string();
                window::push_capped(
                    &mut existing.related_decisions,
                    summary_delta.trim().to_string(),
                    self.policy.decisions_cap,
                );
            }
        } else {
            if self.medium.projects.len() >= self.policy.medium_capacity {
                if let Some(evicted) =
                    window::evict_oldest_by(&mut self.medium.projects, |p| p.last_touched)
                {
                    debug!("medium-term at capacity; evicted '{}'", evicted);
                }
            }
            self.medium
                .projects
                .insert(key.to_string(), ProjectContext::new(summary_delta.trim()));
        }
        self.dirty_medium = true;
        self.flush();
    }

    /// Recency-ranked retrieval for prompt construction. When the topic hint
    /// matches any entries, those are preferred; otherwise all entries rank.
    pub fn select_relevant_medium(
        &self,
        topic_hint: &str,
        limit: usize,
    ) -> Vec<(String, ProjectContext)> {
        let tokens = hint_tokens(topic_hint);
        let mut entries: Vec<(&String, &ProjectContext)> = self
            .medium
            .projects
            .iter()
            .filter(|(key, project)| {
                tokens.is_empty()
                    || tokens
                        .iter()
                        .any(|t| key.contains(t) || project.summary.to_lowercase().contains(t))
            })
            .collect();
        if entries.is_empty() {
            entries = self.medium.projects.iter().collect();
        }
        entries.sort_by(|a, b| b.1.last_touched.cmp(&a.1.last_touched));
        entries
            .into_iter()
            .take(limit)
            .map(|(k, p)| (k.clone(), p.clone()))
            .collect()
    }

    // ── Long term

    /// Reinforce a fact, creating it when absent. Confidence accumulates
    /// commutatively and is clamped to [0,1]; it never decreases.
    pub fn reinforce_fact(&mut self, key: &str, value: &str, confidence_delta: f32) {
        let delta = confidence_delta.clamp(0.0, 1.0);
        match self.long.facts.get_mut(key) {
            Some(fact) => {
                fact.confidence = (fact.confidence + delta).clamp(0.0, 1.0);
                fact.reinforced_count += 1;
                fact.value = value.to_string();
            }
            None => {
                self.long.facts.insert(
                    key.to_string(),
                    Fact {
                        value: value.to_string(),
                        confidence: delta,
                        first_observed: Utc::now(),
                        reinforced_count: 1,
                    },
                );
            }
        }
        self.dirty_long = true;
        self.flush();
    }

    /// Confidence-ranked retrieval (then reinforcement count) for prompt
    /// construction, with the same hint prefilter as the medium tier.
    pub fn select_relevant_long(&self, topic_hint: &str, limit: usize) -> Vec<(String, Fact)> {
        let tokens = hint_tokens(topic_hint);
        let mut entries: Vec<(&String, &Fact)> = self
            .long
            .facts
            .iter()
            .filter(|(key, fact)| {
                tokens.is_empty()
                    || tokens
                        .iter()
                        .any(|t| key.contains(t) || fact.value.to_lowercase().contains(t))
            })
            .collect();
        if entries.is_empty() {
            entries = self.long.facts.iter().collect();
        }
        entries.sort_by(|a, b| {
            b.1.confidence
                .partial_cmp(&a.1.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.1.reinforced_count.cmp(&a.1.reinforced_count))
                .then(a.0.cmp(b.0))
        });
        entries
            .into_iter()
            .take(limit)
            .map(|(k, f)| (k.clone(), f.clone()))
            .collect()
    }

    // ── Settings

    pub fn personality(&self) -> &Personality {
        &self.personality
    }

    pub fn set_personality(&mut self, personality: Personality) {
        self.personality = personality.validated();
        self.dirty_settings = true;
        self.flush();
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Switching modes never clears memory.
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        self.dirty_settings = true;
        self.flush();
    }

    // ── Lifecycle

    pub fn clear(&mut self, tier: TierClear) {
        match tier {
            TierClear::Short => self.short.clear(),
            TierClear::Medium => {
                self.medium = MediumTermMemory::default();
                self.store.clear(ClearScope::Medium);
                self.dirty_medium = false;
            }
            TierClear::Long => {
                self.long = LongTermMemory::default();
                self.store.clear(ClearScope::Long);
                self.dirty_long = false;
            }
            TierClear::All => {
                self.short.clear();
                self.medium = MediumTermMemory::default();
                self.long = LongTermMemory::default();
                self.personality = Personality::default();
                self.mode = Mode::default();
                self.store.clear(ClearScope::All);
                self.dirty_medium = false;
                self.dirty_long = false;
                self.dirty_settings = false;
            }
        }
    }

    /// Persist every dirty tier, recording the sync timestamp once the store
    /// is fully caught up. Safe to call at any point; also the teardown hook.
    pub fn flush(&mut self) {
        let mut wrote = false;
        if self.dirty_medium && self.store.save_medium(&self.medium) {
            self.dirty_medium = false;
            wrote = true;
        }
        if self.dirty_long && self.store.save_long(&self.long) {
            self.dirty_long = false;
            wrote = true;
        }
        if self.dirty_settings
            && self.store.save_personality(&self.personality)
            && self.store.save_mode(self.mode)
        {
            self.dirty_settings = false;
            wrote = true;
        }
        if wrote && !self.dirty_medium && !self.dirty_long && !self.dirty_settings {
            self.store.touch_sync_timestamp();
        }
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }
}

fn hint_tokens(hint: &str) -> Vec<String> {
    hint.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| w.len() > 2)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::KeyValueStore;
    use chrono::Duration;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct FakeKv {
        entries: Mutex<HashMap<String, String>>,
        fail_writes: AtomicBool,
    }

    impl FakeKv {
        fn new() -> Self {
            Self {
                entries: Mutex::new(HashMap::new()),
                fail_writes: AtomicBool::new(false),
            }
        }
    }

    impl KeyValueStore for FakeKv {
        fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }
        fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                anyhow::bail!("disk full");
            }
            self.entries.lock().unwrap().insert(key.into(), value.into());
            Ok(())
        }
        fn delete(&self, key: &str) -> anyhow::Result<()> {
            self.entries.lock().unwrap().remove(key);
            Ok(())
        }
    }

    fn manager_with(policy: MemoryPolicy) -> MemoryManager {
        let store = MemoryStore::new(Box::new(FakeKv::new()), "dev_test");
        MemoryManager::new(store, policy)
    }

    fn manager() -> MemoryManager {
        manager_with(MemoryPolicy::default())
    }

    #[test]
    fn short_term_window_never_exceeds_cap() {
        let mut m = manager_with(MemoryPolicy {
            short_term_cap: 3,
            ..MemoryPolicy::default()
        });
        for i in 0..10 {
            m.record_turn(&format!("q{}", i), &format!("a{}", i));
        }
        let turns = m.short_term();
        assert_eq!(turns.len(), 3);
        // Exactly the most recent, in arrival order.
        assert_eq!(turns[0].user, "q7");
        assert_eq!(turns[2].user, "q9");
    }

    #[test]
    fn upsert_existing_key_never_duplicates() {
        let mut m = manager();
        m.upsert_project_context("orion", "memory engine");
        m.upsert_project_context("orion", "prompt builder");
        assert_eq!(m.select_relevant_medium("", 10).len(), 1);
        let (_, project) = &m.select_relevant_medium("orion", 1)[0];
        assert_eq!(project.summary, "prompt builder");
    }

    #[test]
    fn decision_list_respects_its_cap() {
        let mut m = manager_with(MemoryPolicy {
            decisions_cap: 2,
            ..MemoryPolicy::default()
        });
        m.upsert_project_context("orion", "first");
        m.upsert_project_context("orion", "second");
        m.upsert_project_context("orion", "third");
        let (_, project) = &m.select_relevant_medium("orion", 1)[0];
        assert_eq!(project.related_decisions, vec!["second", "third"]);
    }

    #[test]
    fn medium_at_capacity_evicts_oldest_touched() {
        let mut m = manager_with(MemoryPolicy {
            medium_capacity: 2,
            ..MemoryPolicy::default()
        });
        m.upsert_project_context("alpha", "a");
        m.upsert_project_context("beta", "b");
        // Make alpha clearly the older entry.
        if let Some(p) = m.medium.projects.get_mut("alpha") {
            p.last_touched = Utc::now() - Duration::hours(1);
        }
        m.upsert_project_context("gamma", "c");
        assert_eq!(m.medium.projects.len(), 2);
        assert!(!m.medium.projects.contains_key("alpha"));
        assert!(m.medium.projects.contains_key("beta"));
        assert!(m.medium.projects.contains_key("gamma"));
    }

    #[test]
    fn reinforce_accumulates_commutatively_and_clamps() {
        let mut a = manager();
        a.reinforce_fact("favorite_color", "blue", 0.3);
        a.reinforce_fact("favorite_color", "blue", 0.5);

        let mut b = manager();
        b.reinforce_fact("favorite_color", "blue", 0.5);
        b.reinforce_fact("favorite_color", "blue", 0.3);

        let fa = &a.long.facts["favorite_color"];
        let fb = &b.long.facts["favorite_color"];
        assert!((fa.confidence - fb.confidence).abs() < 1e-6);
        assert_eq!(fa.reinforced_count, 2);

        a.reinforce_fact("favorite_color", "blue", 0.9);
        assert_eq!(a.long.facts["favorite_color"].confidence, 1.0);
    }

    #[test]
    fn reinforce_twice_with_point_four_reaches_point_eight() {
        let mut m = manager();
        m.reinforce_fact("favorite_color", "blue", 0.4);
        m.reinforce_fact("favorite_color", "blue", 0.4);
        let fact = &m.long.facts["favorite_color"];
        assert!((fact.confidence - 0.8).abs() < 1e-6);
        assert_eq!(fact.reinforced_count, 2);
    }

    #[test]
    fn long_term_ranks_by_confidence_then_count() {
        let mut m = manager();
        m.reinforce_fact("low", "x", 0.2);
        m.reinforce_fact("high", "y", 0.9);
        m.reinforce_fact("mid", "z", 0.5);
        let ranked = m.select_relevant_long("", 2);
        assert_eq!(ranked[0].0, "high");
        assert_eq!(ranked[1].0, "mid");
    }

    #[test]
    fn negative_delta_never_lowers_confidence() {
        let mut m = manager();
        m.reinforce_fact("fact", "v", 0.6);
        m.reinforce_fact("fact", "v", -5.0);
        assert!(m.long.facts["fact"].confidence >= 0.6);
    }

    #[test]
    fn failed_write_keeps_in_memory_view_and_retries() {
        let kv = FakeKv::new();
        kv.fail_writes.store(true, Ordering::SeqCst);
        // Keep a handle to flip the failure off later.
        let kv = std::sync::Arc::new(kv);

        struct SharedKv(std::sync::Arc<FakeKv>);
        impl KeyValueStore for SharedKv {
            fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
                self.0.get(key)
            }
            fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
                self.0.set(key, value)
            }
            fn delete(&self, key: &str) -> anyhow::Result<()> {
                self.0.delete(key)
            }
        }

        let store = MemoryStore::new(Box::new(SharedKv(kv.clone())), "dev_test");
        let mut m = MemoryManager::new(store, MemoryPolicy::default());

        m.reinforce_fact("sticky", "value", 0.5);
        // Write failed, but the session still sees the mutation.
        assert!(m.long.facts.contains_key("sticky"));
        assert!(m.dirty_long);

        kv.fail_writes.store(false, Ordering::SeqCst);
        m.record_turn("next", "mutation retries persistence");
        assert!(!m.dirty_long);
        assert!(m.store.last_sync().is_some());
    }

    #[test]
    fn clear_all_resets_tiers_and_settings_to_defaults() {
        let mut m = manager();
        m.record_turn("q", "a");
        m.upsert_project_context("p", "s");
        m.reinforce_fact("f", "v", 0.5);
        m.set_mode(Mode::Technical);

        m.clear(TierClear::All);
        assert!(m.short_term().is_empty());
        assert!(m.medium.projects.is_empty());
        assert!(m.long.facts.is_empty());
        assert_eq!(m.mode(), Mode::Assistant);
    }
}
