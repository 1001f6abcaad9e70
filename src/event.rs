// src/event.rs - Outbound audit events for dispatched actions

use serde::Serialize;
use serde_json::Value;

/// Identifies an action within its alarm for reporting purposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionRef {
    /// 1-based position in the action list
    pub no: u32,
    /// Action kind name: "sms", "email" or "call"
    #[serde(rename = "type")]
    pub kind: &'static str,
}

/// Recipient identity attached to per-recipient outcomes (sms/call).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipientInfo {
    /// Directory id of the recipient
    #[serde(rename = "_id")]
    pub id: String,
    /// Directory login of the recipient
    pub login: String,
    /// The single narrowed mobile number delivery was attempted on
    pub mobile: String,
}

/// One dispatch outcome, published fire-and-forget on the event bus.
///
/// Every variant carries the alarm snapshot (`model`) and the `{no, type}`
/// of the action. SMS and call report per recipient; e-mail batches all
/// addresses into one send and one event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
#[allow(missing_docs)] // field meanings are uniform across variants
pub enum ActionEvent {
    /// SMS delivered to one recipient
    SmsSent {
        model: Value,
        action: ActionRef,
        recipient: RecipientInfo,
    },
    /// SMS delivery to one recipient failed
    SmsFailed {
        model: Value,
        action: ActionRef,
        recipient: RecipientInfo,
        error: String,
    },
    /// Batched e-mail delivered
    EmailSent {
        model: Value,
        action: ActionRef,
        recipients: Vec<String>,
    },
    /// Batched e-mail failed for the whole address list
    EmailFailed {
        model: Value,
        action: ActionRef,
        recipients: Vec<String>,
        error: String,
    },
    /// Voice call placed to one recipient
    CallSent {
        model: Value,
        action: ActionRef,
        recipient: RecipientInfo,
    },
    /// Voice call to one recipient failed
    CallFailed {
        model: Value,
        action: ActionRef,
        recipient: RecipientInfo,
        error: String,
    },
    /// Directory lookup failed before any delivery was attempted
    FindUsersFailed {
        model: Value,
        action: ActionRef,
        error: String,
    },
}

impl ActionEvent {
    /// Event bus topic the outcome is published on.
    pub fn topic(&self) -> &'static str {
        match self {
            ActionEvent::SmsSent { .. } => "alarms.actions.smsSent",
            ActionEvent::SmsFailed { .. } => "alarms.actions.smsFailed",
            ActionEvent::EmailSent { .. } => "alarms.actions.emailSent",
            ActionEvent::EmailFailed { .. } => "alarms.actions.emailFailed",
            ActionEvent::CallSent { .. } => "alarms.actions.callSent",
            ActionEvent::CallFailed { .. } => "alarms.actions.callFailed",
            ActionEvent::FindUsersFailed { .. } => "alarms.actions.findUsersFailed",
        }
    }
}

/// Outbound event bus seam.
///
/// Publication is at-most-once from the core's perspective; the sink
/// decides how to fan events out (browsers, audit log, ...).
pub trait EventSink: Send + Sync {
    /// Publish one dispatch outcome. Best effort, never retried.
    fn publish(&self, event: ActionEvent);
}

/// Sink that remembers everything it saw. Test helper.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: std::sync::Mutex<Vec<ActionEvent>>,
}

impl RecordingSink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything published so far, in publication order.
    pub fn events(&self) -> Vec<ActionEvent> {
        self.events.lock().expect("sink poisoned").clone()
    }

    /// Topics of everything published so far.
    pub fn topics(&self) -> Vec<&'static str> {
        self.events().iter().map(|e| e.topic()).collect()
    }
}

impl EventSink for RecordingSink {
    fn publish(&self, event: ActionEvent) {
        self.events.lock().expect("sink poisoned").push(event);
    }
}
