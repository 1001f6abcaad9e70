// src/state_machine.rs - Serialized alarm state transitions

use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::Result;
use crate::model::{Alarm, AlarmState};
use crate::store::AlarmStore;

/// Applies state transitions to persisted alarms.
///
/// Transitions on a single alarm are serialized through a per-alarm mutex
/// so `last_state_change_time` is never stamped from a stale read: the
/// stamp always corresponds to an actual change relative to the state
/// immediately prior to the write. Different alarms never contend.
pub struct AlarmStateMachine {
    store: Arc<dyn AlarmStore>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl AlarmStateMachine {
    /// State machine over the given store.
    pub fn new(store: Arc<dyn AlarmStore>) -> Self {
        Self {
            store,
            locks: DashMap::new(),
        }
    }

    /// The store transitions are applied against.
    pub fn store(&self) -> Arc<dyn AlarmStore> {
        self.store.clone()
    }

    /// Apply a transition requested by the external rule evaluator.
    ///
    /// Loads the alarm, applies the state, and persists it only when the
    /// state actually changed. Returns the resulting alarm record either
    /// way.
    pub async fn request_transition(&self, id: &str, new_state: AlarmState) -> Result<Alarm> {
        let lock = {
            let entry = self
                .locks
                .entry(id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())));
            Arc::clone(entry.value())
        };
        let _guard = lock.lock().await;

        let mut alarm = self.store.load(id).await?;
        if alarm.apply_state(new_state, Utc::now().timestamp_millis()) {
            self.store.save(&alarm).await?;
            debug!(
                "alarm '{}' -> {:?} at {}",
                alarm.name, alarm.state, alarm.last_state_change_time
            );
        }
        Ok(alarm)
    }
}
