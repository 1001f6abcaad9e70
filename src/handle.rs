// src/handle.rs - Live view over an alarm during one action execution

use std::sync::Arc;

use crate::model::{Alarm, AlarmState};
use crate::store::AlarmStore;

/// Ephemeral read view over a live alarm, owned by the dispatch flow for
/// the lifetime of one action execution.
///
/// Dispatch is asynchronous and can outlive state changes, so the stopped
/// guard always reads the *current* persisted state, never a snapshot
/// taken when the handle was created. The snapshot kept here is only used
/// for event payloads.
pub struct RunningAlarmHandle {
    alarm: Alarm,
    armed_state: AlarmState,
    store: Arc<dyn AlarmStore>,
}

impl RunningAlarmHandle {
    /// Arm a handle for the alarm's current state.
    pub fn new(alarm: Alarm, store: Arc<dyn AlarmStore>) -> Self {
        let armed_state = alarm.state;
        Self {
            alarm,
            armed_state,
            store,
        }
    }

    /// The alarm snapshot taken when the handle was armed.
    pub fn alarm(&self) -> &Alarm {
        &self.alarm
    }

    /// JSON snapshot for event payloads.
    pub fn model(&self) -> serde_json::Value {
        serde_json::to_value(&self.alarm).unwrap_or(serde_json::Value::Null)
    }

    /// Whether the alarm has moved on since the handle was armed.
    ///
    /// True once the persisted state differs from the state the action
    /// was dispatched in, or the record can no longer be loaded; in-flight
    /// notifications use this to self-cancel instead of reporting against
    /// a dead alarm.
    pub async fn is_stopped(&self) -> bool {
        match self.store.load(&self.alarm.id).await {
            Ok(current) => current.state != self.armed_state,
            Err(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryAlarmStore;

    #[tokio::test]
    async fn reflects_current_persisted_state() {
        let store = Arc::new(MemoryAlarmStore::new());
        let mut alarm = Alarm::new("a1", "Tank level");
        alarm.apply_state(AlarmState::Active, 1_000);
        store.insert(alarm.clone());

        let handle = RunningAlarmHandle::new(alarm.clone(), store.clone());
        assert!(!handle.is_stopped().await);

        // Flip the persisted state after the handle exists.
        alarm.apply_state(AlarmState::Stopped, 2_000);
        store.insert(alarm);
        assert!(handle.is_stopped().await);
    }

    #[tokio::test]
    async fn missing_record_counts_as_stopped() {
        let store = Arc::new(MemoryAlarmStore::new());
        let mut alarm = Alarm::new("a1", "Tank level");
        alarm.apply_state(AlarmState::Active, 1_000);
        store.insert(alarm.clone());

        let handle = RunningAlarmHandle::new(alarm, store.clone());
        store.remove("a1");
        assert!(handle.is_stopped().await);
    }

    #[tokio::test]
    async fn snapshot_serializes_document_format() {
        let store = Arc::new(MemoryAlarmStore::new());
        let alarm = Alarm::new("a1", "Tank level");
        store.insert(alarm.clone());

        let handle = RunningAlarmHandle::new(alarm, store);
        let model = handle.model();
        assert_eq!(model["_id"], "a1");
        assert_eq!(model["state"], "stopped");
        assert_eq!(model["lastStateChangeTime"], 0);
    }
}
