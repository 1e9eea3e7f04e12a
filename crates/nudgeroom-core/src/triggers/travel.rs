//! Travel-aware triggers for location-bound events.
//!
//! ```text
//!            leave_at          leave_at + tolerance        start
//! ──────────────┼────────────────────┼──────────────────────┼──
//!               │<─ departure alert ─>│                      │
//!                                    (now + travel > start) => late warning
//! ```

use chrono::Duration;
use serde_json::json;

use super::{minutes_until, Trigger, TriggerResult};
use crate::context::{ContextEvent, TriggerContext};
use crate::nudge::{Candidate, NudgePriority, NudgeType};

/// Warns when travel time from now would miss an event's start.
#[derive(Debug, Clone)]
pub struct LateWarningTrigger {
    default_travel_minutes: u32,
}

impl LateWarningTrigger {
    pub fn new(default_travel_minutes: u32) -> Self {
        Self {
            default_travel_minutes,
        }
    }
}

impl Trigger for LateWarningTrigger {
    fn kind(&self) -> NudgeType {
        NudgeType::LateWarning
    }

    fn evaluate(&self, ctx: &TriggerContext) -> TriggerResult {
        let late = ctx
            .upcoming_events()
            .into_iter()
            .filter(|e| e.is_location_bound())
            .find(|e| ctx.now + e.travel_time(self.default_travel_minutes) > e.start);

        let Some(event) = late else {
            return Ok(None);
        };
        let arrival = ctx.now + event.travel_time(self.default_travel_minutes);
        let minutes_late = minutes_until(event.start, arrival);

        Ok(Some(
            Candidate::new(NudgeType::LateWarning, NudgePriority::High)
                .var("title", &event.title)
                .var("minutes", minutes_late)
                .var("location", location(event))
                .action("Open map", "open_map")
                .action("Let them know", "notify_attendees")
                .ordered_by(event.start)
                .related(json!({
                    "eventId": event.id,
                    "minutesLate": minutes_late,
                })),
        ))
    }
}

/// Fires at the leave-now instant for a location-bound event.
#[derive(Debug, Clone)]
pub struct DepartureAlertTrigger {
    default_travel_minutes: u32,
    buffer: Duration,
    tolerance: Duration,
}

impl DepartureAlertTrigger {
    pub fn new(default_travel_minutes: u32, buffer: Duration, tolerance: Duration) -> Self {
        Self {
            default_travel_minutes,
            buffer,
            tolerance,
        }
    }
}

impl Trigger for DepartureAlertTrigger {
    fn kind(&self) -> NudgeType {
        NudgeType::DepartureAlert
    }

    fn evaluate(&self, ctx: &TriggerContext) -> TriggerResult {
        let due = ctx
            .upcoming_events()
            .into_iter()
            .filter(|e| e.is_location_bound())
            .find(|e| {
                let travel = e.travel_time(self.default_travel_minutes);
                let leave_at = e.start - travel - self.buffer;
                ctx.now >= leave_at
                    && ctx.now < leave_at + self.tolerance
                    && ctx.now + travel <= e.start
            });

        let Some(event) = due else {
            return Ok(None);
        };
        let travel = event.travel_time(self.default_travel_minutes);

        Ok(Some(
            Candidate::new(NudgeType::DepartureAlert, NudgePriority::High)
                .var("title", &event.title)
                .var("location", location(event))
                .var("travel", travel.num_minutes())
                .action("Open map", "open_map")
                .action("Snooze 5 min", "snooze")
                .ordered_by(event.start)
                .related(json!({
                    "eventId": event.id,
                    "travelMinutes": travel.num_minutes(),
                })),
        ))
    }
}

fn location(event: &ContextEvent) -> &str {
    event.location.as_deref().unwrap_or("").trim()
}
