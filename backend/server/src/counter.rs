//! # Counters
//!
//! Durable name -> integer mapping with a single operation: atomic
//! increment-and-fetch that creates the counter on first use.
//!
//! - First call for an unseen name returns 1, there is no observable zero state
//! - The read, increment and write are indivisible per name
//! - Counters are never deleted and never written directly
use async_trait::async_trait;
use dashmap::{DashMap, mapref::entry::Entry};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::database::StoreError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    pub name: String,
    pub value: i64,
}

#[async_trait]
pub trait CounterStore: Send + Sync + 'static {
    /// Increments the counter named `name`, creating it if absent, and returns
    /// the post-increment document.
    ///
    /// `Ok(None)` means the store completed the operation without handing back
    /// a document. Callers must not treat that as any particular value.
    async fn increment_and_get(&self, name: &str) -> Result<Option<Counter>, StoreError>;
}

/// In-process counters. The shard write lock held by the map entry makes the
/// increment atomic per name.
#[derive(Default)]
pub struct MemoryCounterStore {
    counters: DashMap<String, i64>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn increment_and_get(&self, name: &str) -> Result<Option<Counter>, StoreError> {
        let mut value = match self.counters.entry(name.to_string()) {
            Entry::Occupied(entry) => entry.into_ref(),
            Entry::Vacant(entry) => {
                debug!("Creating counter {name:?}");
                entry.insert(0)
            }
        };

        *value = value
            .checked_add(1)
            .ok_or_else(|| StoreError::CounterOverflow(name.to_string()))?;

        Ok(Some(Counter {
            name: name.to_string(),
            value: *value,
        }))
    }
}
