//! The hand-off point between fetch tasks and the tick.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use geo_types::MultiPolygon;

use crate::fragment::FragmentKey;

/// Result of one fetch task.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Geometry for every requested key. Empty geometry means the fragment has no data.
    Received(HashMap<FragmentKey, MultiPolygon<f64>>),
    /// The request failed as a whole.
    Failed(Vec<FragmentKey>),
}

/// Stores the outcomes of finished fetch tasks until the tick drains them. This is the only
/// state which is shared between threads.
#[derive(Clone, Default)]
pub struct FragmentInbox {
    outcomes: Arc<Mutex<Vec<FetchOutcome>>>,
}

impl FragmentInbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, outcome: FetchOutcome) {
        match self.outcomes.lock() {
            Ok(mut outcomes) => outcomes.push(outcome),
            Err(poisoned) => {
                log::error!("fragment inbox lock is poisoned, recovering");
                poisoned.into_inner().push(outcome)
            }
        }
    }

    /// Takes all outcomes which arrived since the last drain. The lock is only held for the
    /// swap.
    pub fn drain(&self) -> Vec<FetchOutcome> {
        match self.outcomes.lock() {
            Ok(mut outcomes) => std::mem::take(&mut *outcomes),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}
