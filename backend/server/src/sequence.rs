//! # Sequences
//!
//! Hands out strictly increasing, unique integers per sequence name.
//!
//! Every call is one round trip to the counter store. Nothing is cached or
//! batched in process, so any number of server instances can share a store.
//! A call abandoned after the store incremented still consumes its number,
//! which is never reissued.
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, warn};

use crate::{counter::CounterStore, database::StoreError};

pub const RECIPE_SEQUENCE: &str = "recipes";

#[derive(Error, Debug)]
pub enum SequenceError {
    #[error("Counter store unavailable: {0}")]
    StoreUnavailable(#[source] StoreError),

    #[error("Counter store returned no document for sequence {name:?}")]
    UnexpectedEmptyResult { name: String },
}

#[derive(Clone)]
pub struct SequenceAllocator {
    store: Arc<dyn CounterStore>,
}

impl SequenceAllocator {
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self { store }
    }

    pub async fn next(&self, counter_name: &str) -> Result<i64, SequenceError> {
        let counter = self
            .store
            .increment_and_get(counter_name)
            .await
            .map_err(|e| {
                warn!("Sequence {counter_name:?} allocation failed: {e}");
                SequenceError::StoreUnavailable(e)
            })?
            .ok_or_else(|| {
                error!("Counter store returned nothing for sequence {counter_name:?}");
                SequenceError::UnexpectedEmptyResult {
                    name: counter_name.to_string(),
                }
            })?;

        debug!("Allocated {} from sequence {counter_name:?}", counter.value);

        Ok(counter.value)
    }
}
