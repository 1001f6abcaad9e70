//! AQUILA - Alarm QUeueing, Integration and Lifecycle Automation
//!
//! The alarm lifecycle and timed escalation/notification core for an
//! industrial water-treatment monitoring service. The crate owns:
//!
//! - the alarm state machine ([`AlarmStateMachine`]) with serialized
//!   per-alarm transitions and change-time stamping,
//! - the escalation timeline ([`timeline`]): which configured step is
//!   current after a given elapsed time, and when a step executes,
//! - on-call recipient filtering ([`oncall`]) with midnight wraparound,
//! - user resolution against the directory ([`directory`]),
//! - the cancellation-safe notification dispatcher ([`ActionDispatcher`])
//!   fanning out to SMS, mail and telephony channels, and
//! - the bounded single-consumer SMS gateway queue
//!   ([`channels::QueuedSmsGateway`]).
//!
//! Persistence, transports, the event bus and the user directory are
//! trait seams ([`AlarmStore`], [`channels`], [`EventSink`],
//! [`directory::UserDirectory`]) the surrounding service implements.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use aquila::{
//!     Alarm, AlarmState, AlarmStateMachine, MemoryAlarmStore, RunningAlarmHandle,
//! };
//!
//! # async fn demo() -> aquila::Result<()> {
//! let store = Arc::new(MemoryAlarmStore::new());
//! store.insert(Alarm::new("a1", "Chlorine high"));
//!
//! let machine = AlarmStateMachine::new(store.clone());
//! let alarm = machine.request_transition("a1", AlarmState::Active).await?;
//! let handle = RunningAlarmHandle::new(alarm, store);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

/// Comprehensive error handling with structured error types
pub mod error;

/// Alarm, action and severity data model with state predicates
pub mod model;

/// Alarm persistence seam and the in-memory store
pub mod store;

/// Serialized alarm state transitions
pub mod state_machine;

/// Pure escalation timeline computation
pub mod timeline;

/// Time-of-day on-call windows for mobile recipients
pub mod oncall;

/// User directory lookup and id resolution
pub mod directory;

/// Live cancellation view over a dispatched alarm
pub mod handle;

/// Outbound audit events and the event bus seam
pub mod event;

/// Notification channel contracts and the SMS gateway queue
pub mod channels;

/// Notification dispatch for escalation actions
pub mod dispatch;

/// Dispatcher configuration
pub mod config;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

pub use config::Config;
pub use dispatch::ActionDispatcher;
pub use error::{AlarmError, Result};
pub use event::{ActionEvent, EventSink};
pub use handle::RunningAlarmHandle;
pub use model::{Action, ActionKind, Alarm, AlarmState, Severity, StopConditionMode};
pub use state_machine::AlarmStateMachine;
pub use store::{AlarmStore, MemoryAlarmStore};
