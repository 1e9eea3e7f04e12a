//! Meeting reminder: the next event starts within a lead window.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::json;
use url::Url;

use super::{minutes_until, Trigger, TriggerResult};
use crate::context::{ContextEvent, TriggerContext};
use crate::error::TriggerError;
use crate::nudge::{Candidate, NudgePriority, NudgeType};

/// Known conferencing URL shapes: Zoom, Google Meet, Teams, Webex.
static MEETING_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"https?://(?:[\w-]+\.)*(?:zoom\.us/(?:j|my|w|s)/|meet\.google\.com/|teams\.microsoft\.com/l/meetup-join/|teams\.live\.com/meet/|webex\.com/)[^\s<>"')\]]+"#,
    )
    .expect("valid meeting URL regex")
});

/// Reminds the user of the soonest upcoming event, once per lead window.
///
/// Each `(event, lead)` pair carries its own dedupe key, so with leads 15
/// and 5 an event gets one reminder on entering the 15 minute window and a
/// second, high-priority one on entering the 5 minute window.
#[derive(Debug, Clone)]
pub struct MeetingReminderTrigger {
    /// Lead windows in minutes, ascending.
    leads: Vec<u32>,
}

impl MeetingReminderTrigger {
    pub fn new(mut leads: Vec<u32>) -> Self {
        leads.retain(|l| *l > 0);
        leads.sort_unstable();
        leads.dedup();
        Self { leads }
    }

    /// Smallest lead window that still covers `minutes` out.
    fn bucket(&self, minutes: i64) -> Option<u32> {
        self.leads.iter().copied().find(|l| i64::from(*l) >= minutes)
    }
}

impl Trigger for MeetingReminderTrigger {
    fn kind(&self) -> NudgeType {
        NudgeType::MeetingReminder
    }

    fn evaluate(&self, ctx: &TriggerContext) -> TriggerResult {
        let Some(event) = ctx.upcoming_events().into_iter().next() else {
            return Ok(None);
        };
        if event.end < event.start {
            return Err(TriggerError::MalformedContext {
                kind: self.kind(),
                message: format!("event '{}' ends before it starts", event.id),
            });
        }

        let minutes = minutes_until(ctx.now, event.start);
        let Some(lead) = self.bucket(minutes) else {
            return Ok(None);
        };
        let key = format!("meeting:{}:{lead}", event.id);
        if ctx.already_fired(&key) {
            return Ok(None);
        }

        let priority = if minutes <= 5 {
            NudgePriority::High
        } else {
            NudgePriority::Normal
        };
        let link = meeting_link(event);

        let mut candidate = Candidate::new(NudgeType::MeetingReminder, priority)
            .var("title", &event.title)
            .var("minutes", minutes)
            .ordered_by(event.start)
            .dedupe(key)
            .related(json!({
                "eventId": event.id,
                "leadMinutes": lead,
                "minutesUntil": minutes,
                "meetingUrl": link,
            }));
        if link.is_some() {
            candidate = candidate.action("Join", "join_meeting");
        }
        Ok(Some(candidate.action("Snooze", "snooze")))
    }
}

fn meeting_link(event: &ContextEvent) -> Option<String> {
    event
        .description
        .as_deref()
        .and_then(extract_meeting_link)
        .or_else(|| event.location.as_deref().and_then(extract_meeting_link))
}

/// Find the first joinable conferencing link in free text.
pub fn extract_meeting_link(text: &str) -> Option<String> {
    MEETING_URL.find_iter(text).find_map(|m| {
        let candidate = m.as_str().trim_end_matches(['.', ',', ';', ':']);
        Url::parse(candidate).ok().map(|u| u.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triggers::test_support::{at, ctx, event};

    fn trigger() -> MeetingReminderTrigger {
        MeetingReminderTrigger::new(vec![5, 15])
    }

    #[test]
    fn fires_inside_largest_lead() {
        let mut c = ctx(at(9, 46));
        c.events = vec![event("standup", at(10, 0), 15)];
        let candidate = trigger().evaluate(&c).unwrap().unwrap();
        assert_eq!(candidate.nudge_type, NudgeType::MeetingReminder);
        assert_eq!(candidate.priority, NudgePriority::Normal);
        assert_eq!(candidate.vars["minutes"], "14");
        assert_eq!(candidate.related_data["leadMinutes"], 15);
        assert_eq!(candidate.actions.len(), 1);
    }

    #[test]
    fn picks_smallest_covering_bucket_and_raises_priority() {
        let mut c = ctx(at(9, 56));
        c.events = vec![event("standup", at(10, 0), 15)];
        let candidate = trigger().evaluate(&c).unwrap().unwrap();
        assert_eq!(candidate.related_data["leadMinutes"], 5);
        assert_eq!(candidate.priority, NudgePriority::High);
    }

    #[test]
    fn each_lead_window_fires_once() {
        let mut c = ctx(at(9, 50));
        c.events = vec![event("standup", at(10, 0), 15)];
        let first = trigger().evaluate(&c).unwrap().unwrap();
        assert_eq!(first.dedupe_key.as_deref(), Some("meeting:standup:15"));

        c.fired_today.insert("meeting:standup:15".to_string());
        assert!(trigger().evaluate(&c).unwrap().is_none());

        c.now = at(9, 55);
        let second = trigger().evaluate(&c).unwrap().unwrap();
        assert_eq!(second.dedupe_key.as_deref(), Some("meeting:standup:5"));
        assert_eq!(second.priority, NudgePriority::High);
    }

    #[test]
    fn silent_outside_lead_or_after_start() {
        let mut c = ctx(at(9, 30));
        c.events = vec![event("standup", at(10, 0), 15)];
        assert!(trigger().evaluate(&c).unwrap().is_none());

        let mut started = ctx(at(10, 1));
        started.events = vec![event("standup", at(10, 0), 15)];
        assert!(trigger().evaluate(&started).unwrap().is_none());
    }

    #[test]
    fn offers_join_action_when_link_present() {
        let mut e = event("sync", at(10, 0), 30);
        e.description = Some("Agenda below.\nJoin: https://us02web.zoom.us/j/8812345678?pwd=abc.".into());
        let mut c = ctx(at(9, 50));
        c.events = vec![e];
        let candidate = trigger().evaluate(&c).unwrap().unwrap();
        assert_eq!(candidate.actions[0].action_id, "join_meeting");
        assert_eq!(
            candidate.related_data["meetingUrl"],
            "https://us02web.zoom.us/j/8812345678?pwd=abc"
        );
    }

    #[test]
    fn malformed_event_is_an_error() {
        let mut e = event("broken", at(10, 0), 30);
        e.end = at(9, 0);
        let mut c = ctx(at(9, 50));
        c.events = vec![e];
        assert!(trigger().evaluate(&c).is_err());
    }

    #[test]
    fn extracts_known_conferencing_links() {
        assert_eq!(
            extract_meeting_link("see https://meet.google.com/abc-defg-hij for details").as_deref(),
            Some("https://meet.google.com/abc-defg-hij")
        );
        assert!(extract_meeting_link(
            "https://teams.microsoft.com/l/meetup-join/19%3ameeting_xyz/0"
        )
        .is_some());
        assert!(extract_meeting_link("https://acme.webex.com/meet/jdoe").is_some());
        assert!(extract_meeting_link("https://example.com/j/123").is_none());
        assert!(extract_meeting_link("no links here").is_none());
    }
}
