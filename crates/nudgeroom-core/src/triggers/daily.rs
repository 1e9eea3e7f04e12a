//! Start-of-day and end-of-day summaries.

use serde_json::json;

use super::{TimeWindow, Trigger, TriggerResult};
use crate::context::TriggerContext;
use crate::nudge::{Candidate, NudgePriority, NudgeType};

/// Morning overview of today's events and open tasks.
#[derive(Debug, Clone)]
pub struct MorningBriefingTrigger {
    window: TimeWindow,
}

impl MorningBriefingTrigger {
    pub fn new(window: TimeWindow) -> Self {
        Self { window }
    }
}

impl Trigger for MorningBriefingTrigger {
    fn kind(&self) -> NudgeType {
        NudgeType::MorningBriefing
    }

    fn evaluate(&self, ctx: &TriggerContext) -> TriggerResult {
        if !self.window.contains(ctx.local_time()) {
            return Ok(None);
        }
        let events = ctx.events_today().count();
        let tasks = ctx.pending_tasks().count();
        let first = ctx.upcoming_events().first().map(|e| e.id.clone());

        Ok(Some(
            Candidate::new(NudgeType::MorningBriefing, NudgePriority::Low)
                .var("events", events)
                .var("tasks", tasks)
                .action("Plan my day", "open_today")
                .related(json!({
                    "date": ctx.local_date().to_string(),
                    "firstEventId": first,
                })),
        ))
    }
}

/// Evening recap of what got done.
#[derive(Debug, Clone)]
pub struct EveningWrapupTrigger {
    window: TimeWindow,
}

impl EveningWrapupTrigger {
    pub fn new(window: TimeWindow) -> Self {
        Self { window }
    }
}

impl Trigger for EveningWrapupTrigger {
    fn kind(&self) -> NudgeType {
        NudgeType::EveningWrapup
    }

    fn evaluate(&self, ctx: &TriggerContext) -> TriggerResult {
        if !self.window.contains(ctx.local_time()) {
            return Ok(None);
        }
        let left = ctx.pending_tasks().count();

        Ok(Some(
            Candidate::new(NudgeType::EveningWrapup, NudgePriority::Low)
                .var("done", ctx.completed_today)
                .var("left", left)
                .action("Review day", "open_review")
                .related(json!({ "date": ctx.local_date().to_string() })),
        ))
    }
}
