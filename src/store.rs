// src/store.rs - Alarm persistence seam

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

use crate::error::{AlarmError, Result};
use crate::model::Alarm;

/// Persistence contract for alarm records.
///
/// Load and save are assumed atomic at the single-record level; the core
/// never performs multi-record transactions.
#[async_trait]
pub trait AlarmStore: Send + Sync {
    /// Load one alarm record by id.
    async fn load(&self, id: &str) -> Result<Alarm>;
    /// Persist one alarm record.
    ///
    /// Implementations should reject records that fail [`Alarm::validate`]
    /// rather than persist an alarm whose actions can never run.
    async fn save(&self, alarm: &Alarm) -> Result<()>;
}

/// In-memory store backed by a concurrent map.
///
/// Used by tests and by embedders that keep alarm configuration in
/// process; production deployments wire in their document store instead.
#[derive(Debug, Clone, Default)]
pub struct MemoryAlarmStore {
    alarms: Arc<DashMap<String, Alarm>>,
}

impl MemoryAlarmStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an alarm directly, bypassing the trait.
    pub fn insert(&self, alarm: Alarm) {
        self.alarms.insert(alarm.id.clone(), alarm);
    }

    /// Remove an alarm, returning it if it existed.
    pub fn remove(&self, id: &str) -> Option<Alarm> {
        self.alarms.remove(id).map(|(_, alarm)| alarm)
    }

    /// Number of stored alarms.
    pub fn len(&self) -> usize {
        self.alarms.len()
    }

    /// Whether the store holds no alarms.
    pub fn is_empty(&self) -> bool {
        self.alarms.is_empty()
    }
}

#[async_trait]
impl AlarmStore for MemoryAlarmStore {
    async fn load(&self, id: &str) -> Result<Alarm> {
        self.alarms
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AlarmError::AlarmNotFound(id.to_string()))
    }

    async fn save(&self, alarm: &Alarm) -> Result<()> {
        alarm.validate()?;
        self.alarms.insert(alarm.id.clone(), alarm.clone());
        Ok(())
    }
}
