//! Tiered memory: types, the shared bounded-window utility, and the manager
//! that enforces tier policy.
//!
//! Three tiers, distinguished by retention rule:
//! - Short term: the current session's turns, sliding window, never persisted
//! - Medium term: active projects, capacity-bounded, oldest-touched evicted
//! - Long term: learned facts, append-mostly and unbounded, reinforced
//!   rather than duplicated
//!
//! The manager is the only component permitted to mutate memory. All
//! mutations are applied in memory first; persistence is write-through and
//! fails soft, with dirty tiers retried on the next mutation or at teardown.

pub mod manager;
pub mod types;
pub mod window;

pub use manager::{MemoryManager, MemoryPolicy, TierClear};
pub use types::{Fact, LongTermMemory, MediumTermMemory, ProjectContext, Turn};
pub use window::BoundedLog;
