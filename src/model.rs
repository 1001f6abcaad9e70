// src/model.rs - Alarm data model and state predicates

use serde::{Deserialize, Serialize};

/// Maximum relative delay of a single escalation step, in seconds.
pub const MAX_ACTION_DELAY_SECS: u32 = 86_400;

// ============================================================================
// ENUMS
// ============================================================================

/// Lifecycle state of an alarm.
///
/// `Stopped` is the initial state. An alarm is driven through
/// `Running` -> `Active` -> `Running`/`Stopped` exclusively by the external
/// rule evaluator calling into [`crate::AlarmStateMachine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlarmState {
    /// Not armed; conditions are not evaluated
    Stopped,
    /// Armed, waiting for the start condition
    Running,
    /// Start condition met; escalation timeline is playing out
    Active,
}

/// How an active alarm returns to `Running`/`Stopped`.
///
/// Decided by the external evaluator; the core only exposes predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopConditionMode {
    /// Operator stops the alarm by hand
    Manual,
    /// Stop when the negated start condition holds
    Negated,
    /// Stop when a separately configured condition holds
    Specified,
}

/// Operator-visible severity of an escalation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Active but no escalation step reached yet
    Debug,
    /// Informational
    Info,
    /// Condition resolved
    Success,
    /// Default step severity
    #[default]
    Warning,
    /// Requires immediate operator attention
    Error,
}

// ============================================================================
// ACTIONS
// ============================================================================

/// Reference to a user inside an action's parameters.
///
/// The id is kept lenient on deserialize; validation happens at resolution
/// time where malformed ids are silently dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    /// Opaque directory id, possibly malformed
    #[serde(default)]
    pub id: String,
}

/// Type-dependent payload shared by the sms/email/call action kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NotifyParams {
    /// Message text delivered to recipients
    #[serde(default)]
    pub text: String,
    /// Users to notify, resolved through the directory at dispatch time
    #[serde(default)]
    pub users: Vec<UserRef>,
}

/// Notification kind of an escalation step.
///
/// A tagged union so an unknown action type is a deserialization error,
/// not a silent no-op at dispatch time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "parameters", rename_all = "lowercase")]
pub enum ActionKind {
    /// Text message to on-call mobile numbers
    Sms(NotifyParams),
    /// E-mail to all recipients with an address, no on-call filtering
    Email(NotifyParams),
    /// Voice call to on-call mobile numbers
    Call(NotifyParams),
    /// No delivery; only changes the displayed severity
    Severity,
}

impl ActionKind {
    /// Stable lowercase name used in event payloads and logs.
    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::Sms(_) => "sms",
            ActionKind::Email(_) => "email",
            ActionKind::Call(_) => "call",
            ActionKind::Severity => "severity",
        }
    }
}

/// One step of an alarm's escalation sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// 1-based position in the action list, used for reporting only
    pub no: u32,

    /// What the step does and its type-dependent payload
    #[serde(flatten)]
    pub kind: ActionKind,

    /// Seconds relative to the previous action's cumulative delay.
    /// Cumulative offsets form the escalation timeline.
    #[serde(default)]
    pub delay: u32,

    /// Severity the alarm displays once this step becomes current
    #[serde(default)]
    pub severity: Severity,
}

impl Action {
    /// Validate the step against configuration limits.
    pub fn validate(&self) -> crate::Result<()> {
        if self.delay > MAX_ACTION_DELAY_SECS {
            return Err(crate::AlarmError::Config(format!(
                "action {} delay {}s exceeds maximum of {}s",
                self.no, self.delay, MAX_ACTION_DELAY_SECS
            )));
        }
        Ok(())
    }
}

// ============================================================================
// ALARM
// ============================================================================

/// A configured alarm with its escalation sequences.
///
/// Field names follow the externally stored document format (camelCase),
/// so snapshots on the event bus stay byte-compatible with the admin UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alarm {
    /// Opaque identifier assigned by the store
    #[serde(rename = "_id")]
    pub id: String,

    /// Display label
    pub name: String,

    /// Current lifecycle state; `Stopped` until armed
    #[serde(default = "default_state")]
    pub state: AlarmState,

    /// Epoch-millisecond timestamp of the most recent state change;
    /// 0 until the first change
    #[serde(default)]
    pub last_state_change_time: i64,

    /// Start condition expression, opaque to this core
    #[serde(default)]
    pub start_condition: Option<String>,

    /// Tag names referenced by the start condition
    #[serde(default)]
    pub start_condition_tags: Vec<String>,

    /// Escalation sequence executed once the alarm becomes active.
    /// Order is significant: it is the escalation order.
    #[serde(default)]
    pub start_actions: Vec<Action>,

    /// How the alarm returns to `Running`/`Stopped`
    #[serde(default)]
    pub stop_condition_mode: Option<StopConditionMode>,

    /// Stop condition expression, opaque to this core
    #[serde(default)]
    pub stop_condition: Option<String>,

    /// Tag names referenced by the stop condition
    #[serde(default)]
    pub stop_condition_tags: Vec<String>,

    /// Actions executed when the alarm deactivates
    #[serde(default)]
    pub stop_actions: Vec<Action>,
}

fn default_state() -> AlarmState {
    AlarmState::Stopped
}

impl Alarm {
    /// Create a new alarm in the initial `Stopped` state.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            state: AlarmState::Stopped,
            last_state_change_time: 0,
            start_condition: None,
            start_condition_tags: Vec::new(),
            start_actions: Vec::new(),
            stop_condition_mode: None,
            stop_condition: None,
            stop_condition_tags: Vec::new(),
            stop_actions: Vec::new(),
        }
    }

    /// Pure read of `state == Stopped`.
    pub fn is_stopped(&self) -> bool {
        self.state == AlarmState::Stopped
    }

    /// Pure read of `state == Running`.
    pub fn is_running(&self) -> bool {
        self.state == AlarmState::Running
    }

    /// Pure read of `state == Active`.
    pub fn is_active(&self) -> bool {
        self.state == AlarmState::Active
    }

    /// True when the stop mode is `Manual`; false when no mode is set.
    pub fn is_manual_stop(&self) -> bool {
        self.stop_condition_mode == Some(StopConditionMode::Manual)
    }

    /// True when the stop mode is `Negated`; false when no mode is set.
    pub fn is_negated_stop(&self) -> bool {
        self.stop_condition_mode == Some(StopConditionMode::Negated)
    }

    /// True when the stop mode is `Specified`; false when no mode is set.
    pub fn is_specified_stop(&self) -> bool {
        self.stop_condition_mode == Some(StopConditionMode::Specified)
    }

    /// Apply a state transition.
    ///
    /// Stamps `last_state_change_time` with `now_ms` if and only if the
    /// state actually changes. Returns whether it changed, so callers can
    /// skip persisting no-op transitions.
    pub fn apply_state(&mut self, new_state: AlarmState, now_ms: i64) -> bool {
        if self.state == new_state {
            return false;
        }
        self.state = new_state;
        self.last_state_change_time = now_ms;
        true
    }

    /// Validate the alarm's escalation sequences against configuration limits.
    pub fn validate(&self) -> crate::Result<()> {
        for action in self.start_actions.iter().chain(self.stop_actions.iter()) {
            action.validate()?;
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
