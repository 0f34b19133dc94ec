// src/memory/window.rs

//! The sliding-window / capacity-eviction pattern, implemented once.
//!
//! `BoundedLog` keeps the N most recent items in arrival order (short-term
//! turns, per-project decision lists). `evict_oldest_by` removes the map
//! entry with the smallest eviction stamp (medium-term projects, keyed by
//! `last_touched`). Long-term memory is unbounded and uses neither.

use std::collections::{BTreeMap, VecDeque};

/// Insertion-ordered sequence capped at `cap` items; pushing beyond the cap
/// evicts the oldest entries first.
#[derive(Debug, Clone)]
pub struct BoundedLog<T> {
    items: VecDeque<T>,
    cap: usize,
}

impl<T> BoundedLog<T> {
    pub fn new(cap: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(cap.min(64)),
            cap,
        }
    }

    pub fn push(&mut self, item: T) {
        self.items.push_back(item);
        while self.items.len() > self.cap {
            self.items.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Oldest-first iteration.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn last(&self) -> Option<&T> {
        self.items.back()
    }
}

impl<T: Clone> BoundedLog<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}

/// Append to a plain vector under the same oldest-first eviction rule.
pub fn push_capped<T>(items: &mut Vec<T>, item: T, cap: usize) {
    items.push(item);
    if items.len() > cap {
        let excess = items.len() - cap;
        items.drain(..excess);
    }
}

/// Remove the entry whose eviction stamp is smallest, returning its key.
/// Ties break toward the smaller key so eviction stays deterministic.
pub fn evict_oldest_by<K, V, S, F>(map: &mut BTreeMap<K, V>, stamp: F) -> Option<K>
where
    K: Ord + Clone,
    S: Ord,
    F: Fn(&V) -> S,
{
    let oldest = map
        .iter()
        .min_by_key(|(_, value)| stamp(value))
        .map(|(key, _)| key.clone())?;
    map.remove(&oldest);
    Some(oldest)
}
