//! Mapping Store
//!
//! Owns the model index, its inverse and the published record table, runs
//! the refresh cycle and serves reads.

pub mod events;
pub mod mapping;
pub mod refresh;

pub use events::MappingEvent;
pub use mapping::{MappingStore, RecordSnapshot, RefreshOutcome};
pub use refresh::RefreshHandle;

use std::fmt;

/// Lifecycle of a store. `Refreshing` is reported while any refresh cycle
/// is in flight on a ready store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    Uninitialized,
    Building,
    Ready,
    Refreshing,
}

impl StoreState {
    pub fn as_str(self) -> &'static str {
        match self {
            StoreState::Uninitialized => "uninitialized",
            StoreState::Building => "building",
            StoreState::Ready => "ready",
            StoreState::Refreshing => "refreshing",
        }
    }
}

impl fmt::Display for StoreState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
