//! Nudge dispatch to a push channel.
//!
//! The dispatcher converts a [`Nudge`] into a [`PushPayload`], hands it to
//! the configured [`PushChannel`] and publishes the result on an in-process
//! broadcast bus. Delivery failures are reported, never raised.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::PushError;
use crate::nudge::{Nudge, NudgePriority, NudgeType};

/// Push payloads carry at most this many action buttons.
pub const MAX_PUSH_ACTIONS: usize = 2;

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushAction {
    pub action: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushData {
    #[serde(rename = "type")]
    pub nudge_type: NudgeType,
    pub nudge_id: String,
    #[serde(default)]
    pub related_data: serde_json::Value,
}

/// What a push backend receives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushPayload {
    pub title: String,
    pub body: String,
    /// `<type>-<id>`, lets the platform replace a stale notification.
    pub tag: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<PushAction>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub require_interaction: bool,
    pub data: PushData,
}

impl PushPayload {
    pub fn from_nudge(nudge: &Nudge) -> Self {
        let title = if nudge.emoji.is_empty() {
            nudge.title.clone()
        } else {
            format!("{} {}", nudge.emoji, nudge.title)
        };
        Self {
            title,
            body: nudge.body.clone(),
            tag: format!("{}-{}", nudge.nudge_type, nudge.id),
            actions: nudge
                .actions
                .iter()
                .take(MAX_PUSH_ACTIONS)
                .map(|a| PushAction {
                    action: a.action_id.clone(),
                    title: a.label.clone(),
                })
                .collect(),
            require_interaction: nudge.priority == NudgePriority::High,
            data: PushData {
                nudge_type: nudge.nudge_type,
                nudge_id: nudge.id.clone(),
                related_data: nudge.related_data.clone(),
            },
        }
    }
}

/// A notification backend.
///
/// `send` is called synchronously from the tick. Asynchronous backends should
/// spawn their own work and return immediately.
pub trait PushChannel: Send + Sync {
    fn send(&self, payload: &PushPayload) -> Result<(), PushError>;
}

/// Result of handing a nudge to the push channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Displayed,
    NotDisplayed { reason: PushError },
}

impl DispatchOutcome {
    pub fn is_displayed(&self) -> bool {
        matches!(self, DispatchOutcome::Displayed)
    }
}

/// Published for every dispatched nudge, displayed or not.
#[derive(Debug, Clone)]
pub struct NudgeEvent {
    pub nudge: Nudge,
    pub outcome: DispatchOutcome,
}

/// Sends nudges and fans the results out to subscribers.
pub struct Dispatcher {
    channel: Arc<dyn PushChannel>,
    events: broadcast::Sender<NudgeEvent>,
}

impl Dispatcher {
    pub fn new(channel: Arc<dyn PushChannel>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { channel, events }
    }

    /// Receive every dispatched nudge from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<NudgeEvent> {
        self.events.subscribe()
    }

    pub fn dispatch(&self, nudge: &Nudge) -> DispatchOutcome {
        let payload = PushPayload::from_nudge(nudge);
        let outcome = match self.channel.send(&payload) {
            Ok(()) => DispatchOutcome::Displayed,
            Err(reason) => {
                tracing::warn!(
                    nudge_id = %nudge.id,
                    nudge_type = %nudge.nudge_type,
                    error = %reason,
                    "nudge not displayed"
                );
                DispatchOutcome::NotDisplayed { reason }
            }
        };

        // No subscribers is fine.
        let _ = self.events.send(NudgeEvent {
            nudge: nudge.clone(),
            outcome: outcome.clone(),
        });
        outcome
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("subscribers", &self.events.receiver_count())
            .finish_non_exhaustive()
    }
}

/// Channel that keeps payloads in memory, for in-app surfaces and tests.
///
/// Can be told to fail every send with a fixed error.
#[derive(Debug, Default)]
pub struct MemoryChannel {
    sent: Mutex<Vec<PushPayload>>,
    fail_with: Mutex<Option<PushError>>,
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(error: PushError) -> Self {
        let channel = Self::default();
        channel.fail_with(Some(error));
        channel
    }

    pub fn fail_with(&self, error: Option<PushError>) {
        *self.fail_with.lock().unwrap_or_else(|e| e.into_inner()) = error;
    }

    /// Payloads accepted so far.
    pub fn sent(&self) -> Vec<PushPayload> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl PushChannel for MemoryChannel {
    fn send(&self, payload: &PushPayload) -> Result<(), PushError> {
        if let Some(err) = self.fail_with.lock().unwrap_or_else(|e| e.into_inner()).clone() {
            return Err(err);
        }
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(payload.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::nudge::{NudgeAction, Tone};

    fn nudge(priority: NudgePriority) -> Nudge {
        Nudge {
            id: "abc".into(),
            nudge_type: NudgeType::MeetingReminder,
            priority,
            title: "Standup in 5 min".into(),
            body: "Get ready.".into(),
            emoji: "📅".into(),
            tone: Tone::Neutral,
            actions: vec![
                NudgeAction::new("Join", "join_meeting"),
                NudgeAction::new("Snooze", "snooze"),
                NudgeAction::new("Dismiss", "dismiss"),
            ],
            related_data: serde_json::json!({"eventId": "e1"}),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn payload_shape() {
        let payload = PushPayload::from_nudge(&nudge(NudgePriority::High));
        assert_eq!(payload.title, "📅 Standup in 5 min");
        assert_eq!(payload.tag, "meeting_reminder-abc");
        assert_eq!(payload.actions.len(), MAX_PUSH_ACTIONS);
        assert_eq!(payload.actions[0].action, "join_meeting");
        assert!(payload.require_interaction);

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["requireInteraction"], true);
        assert_eq!(json["data"]["type"], "meeting_reminder");
        assert_eq!(json["data"]["nudgeId"], "abc");
        assert_eq!(json["data"]["relatedData"]["eventId"], "e1");
    }

    #[test]
    fn normal_priority_omits_require_interaction() {
        let payload = PushPayload::from_nudge(&nudge(NudgePriority::Normal));
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("requireInteraction").is_none());
    }

    #[test]
    fn failures_become_not_displayed() {
        let channel = Arc::new(MemoryChannel::failing(PushError::PermissionDenied));
        let dispatcher = Dispatcher::new(channel.clone());
        let outcome = dispatcher.dispatch(&nudge(NudgePriority::Normal));
        assert_eq!(
            outcome,
            DispatchOutcome::NotDisplayed {
                reason: PushError::PermissionDenied
            }
        );
        assert!(channel.sent().is_empty());
    }

    #[test]
    fn subscribers_see_every_dispatch() {
        let channel = Arc::new(MemoryChannel::new());
        let dispatcher = Dispatcher::new(channel.clone());
        let mut rx = dispatcher.subscribe();

        assert!(dispatcher.dispatch(&nudge(NudgePriority::Low)).is_displayed());
        channel.fail_with(Some(PushError::Unavailable));
        assert!(!dispatcher.dispatch(&nudge(NudgePriority::Low)).is_displayed());

        assert!(rx.try_recv().unwrap().outcome.is_displayed());
        assert!(!rx.try_recv().unwrap().outcome.is_displayed());
        assert_eq!(channel.sent().len(), 1);
    }
}
