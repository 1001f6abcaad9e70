// src/dispatch.rs - Notification dispatch for escalation actions
//
// One entry point, `ActionDispatcher::execute`, invoked by the supervisor
// once the timeline says an action is due. Each execution independently
// resolves recipients, filters them by on-call window, fans out to the
// channel, and publishes one audit event per outcome. The stopped guard
// is checked at every suspension point so in-flight notifications
// self-cancel instead of reporting against a dead alarm.

use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::channels::{transliterate, CallChannel, MailChannel, SmsChannel};
use crate::config::Config;
use crate::directory::{resolve_users, User, UserDirectory};
use crate::error::Result;
use crate::event::{ActionEvent, ActionRef, EventSink, RecipientInfo};
use crate::handle::RunningAlarmHandle;
use crate::model::{Action, ActionKind, NotifyParams};
use crate::oncall::{now_clock_value, select_mobile};

/// Executes notification actions against explicitly injected channels.
///
/// Channels are optional: a deployment without a telephony gateway simply
/// leaves `call` unset, and call actions become a logged configuration
/// warning instead of a failure.
pub struct ActionDispatcher {
    sms: Option<Arc<dyn SmsChannel>>,
    mail: Option<Arc<dyn MailChannel>>,
    call: Option<Arc<dyn CallChannel>>,
    directory: Arc<dyn UserDirectory>,
    events: Arc<dyn EventSink>,
    config: Config,
}

impl ActionDispatcher {
    /// Build a dispatcher from explicitly injected collaborators.
    pub fn new(
        sms: Option<Arc<dyn SmsChannel>>,
        mail: Option<Arc<dyn MailChannel>>,
        call: Option<Arc<dyn CallChannel>>,
        directory: Arc<dyn UserDirectory>,
        events: Arc<dyn EventSink>,
        config: Config,
    ) -> Self {
        Self {
            sms,
            mail,
            call,
            directory,
            events,
            config,
        }
    }

    /// Execute one escalation action for the alarm behind `handle`.
    ///
    /// Severity actions carry no dispatch work. All failures are terminal
    /// for this one action only; nothing propagates to sibling alarms or
    /// into the state machine.
    pub async fn execute(&self, handle: &RunningAlarmHandle, action: &Action) -> Result<()> {
        match &action.kind {
            ActionKind::Sms(params) => self.execute_sms(handle, action, params).await,
            ActionKind::Email(params) => self.execute_email(handle, action, params).await,
            ActionKind::Call(params) => self.execute_call(handle, action, params).await,
            ActionKind::Severity => Ok(()),
        }
    }

    /// Resolve recipients for an action, publishing `findUsersFailed` on
    /// directory errors and honoring the stopped guard on both sides of
    /// the lookup. `Ok(None)` means "stop silently".
    async fn resolve_recipients(
        &self,
        handle: &RunningAlarmHandle,
        action: &Action,
        params: &NotifyParams,
    ) -> Result<Option<Vec<User>>> {
        if handle.is_stopped().await {
            return Ok(None);
        }
        let users = match resolve_users(self.directory.as_ref(), &params.users).await {
            Ok(users) => users,
            Err(e) => {
                error!(
                    "user resolution failed for alarm '{}' action {}: {}",
                    handle.alarm().name,
                    action.no,
                    e
                );
                self.events.publish(ActionEvent::FindUsersFailed {
                    model: handle.model(),
                    action: ActionRef {
                        no: action.no,
                        kind: action.kind.name(),
                    },
                    error: e.to_string(),
                });
                return Err(e);
            }
        };
        // The alarm may have moved on while the lookup was in flight.
        if handle.is_stopped().await {
            return Ok(None);
        }
        Ok(Some(users))
    }

    async fn execute_sms(
        &self,
        handle: &RunningAlarmHandle,
        action: &Action,
        params: &NotifyParams,
    ) -> Result<()> {
        let Some(channel) = self.sms.as_ref() else {
            warn!("no SMS gateway configured, skipping action {}", action.no);
            return Ok(());
        };
        let Some(users) = self.resolve_recipients(handle, action, params).await? else {
            return Ok(());
        };

        let now = now_clock_value();
        let recipients: Vec<(User, String)> = users
            .into_iter()
            .filter_map(|user| {
                let number = select_mobile(&user, now).map(|entry| entry.number.clone());
                number.map(|n| (user, n))
            })
            .collect();
        if recipients.is_empty() {
            warn!(
                "no on-call SMS recipients for action {} of alarm '{}'",
                action.no,
                handle.alarm().name
            );
            return Ok(());
        }

        let text = if self.config.sms_transliterate {
            transliterate(&params.text)
        } else {
            params.text.clone()
        };
        let action_ref = ActionRef {
            no: action.no,
            kind: action.kind.name(),
        };

        // Fan-out: recipients are independent; one failure never blocks
        // or cancels a sibling's delivery attempt.
        join_all(recipients.into_iter().map(|(user, number)| {
            let text = text.clone();
            let action_ref = action_ref.clone();
            async move {
                if handle.is_stopped().await {
                    return;
                }
                let outcome = channel.send(&number, &text).await;
                if handle.is_stopped().await {
                    return;
                }
                let recipient = RecipientInfo {
                    id: user.id,
                    login: user.login,
                    mobile: number,
                };
                match outcome {
                    Ok(()) => {
                        debug!("sms delivered to {} ({})", recipient.login, recipient.mobile);
                        self.events.publish(ActionEvent::SmsSent {
                            model: handle.model(),
                            action: action_ref,
                            recipient,
                        });
                    }
                    Err(e) => {
                        error!(
                            "sms to {} ({}) failed: {}",
                            recipient.login, recipient.mobile, e
                        );
                        self.events.publish(ActionEvent::SmsFailed {
                            model: handle.model(),
                            action: action_ref,
                            recipient,
                            error: e.to_string(),
                        });
                    }
                }
            }
        }))
        .await;
        Ok(())
    }

    async fn execute_email(
        &self,
        handle: &RunningAlarmHandle,
        action: &Action,
        params: &NotifyParams,
    ) -> Result<()> {
        let Some(channel) = self.mail.as_ref() else {
            warn!("no mail sender configured, skipping action {}", action.no);
            return Ok(());
        };
        let Some(users) = self.resolve_recipients(handle, action, params).await? else {
            return Ok(());
        };

        // E-mail has no on-call window filter.
        let addresses: Vec<String> = users
            .into_iter()
            .filter_map(|u| u.email.filter(|e| !e.is_empty()))
            .collect();
        if addresses.is_empty() {
            warn!(
                "no e-mail recipients for action {} of alarm '{}'",
                action.no,
                handle.alarm().name
            );
            return Ok(());
        }

        if handle.is_stopped().await {
            return Ok(());
        }
        let outcome = channel
            .send(&addresses, &self.config.mail_subject, &params.text)
            .await;
        if handle.is_stopped().await {
            return Ok(());
        }

        let action_ref = ActionRef {
            no: action.no,
            kind: action.kind.name(),
        };
        match outcome {
            Ok(()) => {
                debug!("e-mail sent to {} recipients", addresses.len());
                self.events.publish(ActionEvent::EmailSent {
                    model: handle.model(),
                    action: action_ref,
                    recipients: addresses,
                });
            }
            Err(e) => {
                error!("e-mail to {:?} failed: {}", addresses, e);
                self.events.publish(ActionEvent::EmailFailed {
                    model: handle.model(),
                    action: action_ref,
                    recipients: addresses,
                    error: e.to_string(),
                });
            }
        }
        Ok(())
    }

    async fn execute_call(
        &self,
        handle: &RunningAlarmHandle,
        action: &Action,
        params: &NotifyParams,
    ) -> Result<()> {
        let Some(channel) = self.call.as_ref() else {
            warn!(
                "no telephony gateway configured, skipping action {}",
                action.no
            );
            return Ok(());
        };
        let Some(users) = self.resolve_recipients(handle, action, params).await? else {
            return Ok(());
        };

        let now = now_clock_value();
        let recipients: Vec<(User, String)> = users
            .into_iter()
            .filter_map(|user| {
                let number = select_mobile(&user, now).map(|entry| entry.number.clone());
                number.map(|n| (user, n))
            })
            .collect();
        if recipients.is_empty() {
            warn!(
                "no on-call voice recipients for action {} of alarm '{}'",
                action.no,
                handle.alarm().name
            );
            return Ok(());
        }

        let action_ref = ActionRef {
            no: action.no,
            kind: action.kind.name(),
        };
        join_all(recipients.into_iter().map(|(user, number)| {
            let action_ref = action_ref.clone();
            async move {
                if handle.is_stopped().await {
                    return;
                }
                let outcome = channel.say(&number, &params.text).await;
                if handle.is_stopped().await {
                    return;
                }
                let recipient = RecipientInfo {
                    id: user.id,
                    login: user.login,
                    mobile: number,
                };
                match outcome {
                    Ok(()) => {
                        debug!("call placed to {} ({})", recipient.login, recipient.mobile);
                        self.events.publish(ActionEvent::CallSent {
                            model: handle.model(),
                            action: action_ref,
                            recipient,
                        });
                    }
                    Err(e) => {
                        error!(
                            "call to {} ({}) failed: {}",
                            recipient.login, recipient.mobile, e
                        );
                        self.events.publish(ActionEvent::CallFailed {
                            model: handle.model(),
                            action: action_ref,
                            recipient,
                            error: e.to_string(),
                        });
                    }
                }
            }
        }))
        .await;
        Ok(())
    }
}
