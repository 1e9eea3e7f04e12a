//! Overload warning when the calendar is too dense.

use chrono::Duration;
use serde_json::json;

use super::{Trigger, TriggerResult};
use crate::context::TriggerContext;
use crate::nudge::{Candidate, NudgePriority, NudgeType};

/// Warns when `threshold` or more events overlap the next `span`.
#[derive(Debug, Clone)]
pub struct OverloadTrigger {
    span: Duration,
    threshold: usize,
}

impl OverloadTrigger {
    pub fn new(span: Duration, threshold: usize) -> Self {
        Self {
            span,
            threshold: threshold.max(1),
        }
    }
}

impl Trigger for OverloadTrigger {
    fn kind(&self) -> NudgeType {
        NudgeType::OverloadWarn
    }

    fn evaluate(&self, ctx: &TriggerContext) -> TriggerResult {
        let horizon = ctx.now + self.span;
        let busy: Vec<&str> = ctx
            .events
            .iter()
            .filter(|e| e.start < horizon && e.end > ctx.now)
            .map(|e| e.id.as_str())
            .collect();

        if busy.len() < self.threshold {
            return Ok(None);
        }

        Ok(Some(
            Candidate::new(NudgeType::OverloadWarn, NudgePriority::Normal)
                .var("count", busy.len())
                .var("hours", self.span.num_hours())
                .action("Review schedule", "open_calendar")
                .action("Dismiss", "dismiss")
                .related(json!({ "eventIds": busy })),
        ))
    }
}
