//! Rest suggestion after a long focus session.

use chrono::Duration;
use serde_json::json;

use super::{Trigger, TriggerResult};
use crate::context::TriggerContext;
use crate::error::TriggerError;
use crate::nudge::{Candidate, NudgePriority, NudgeType};

#[derive(Debug, Clone)]
pub struct RestTrigger {
    threshold: Duration,
}

impl RestTrigger {
    pub fn new(threshold: Duration) -> Self {
        Self { threshold }
    }
}

impl Trigger for RestTrigger {
    fn kind(&self) -> NudgeType {
        NudgeType::RestSuggest
    }

    fn evaluate(&self, ctx: &TriggerContext) -> TriggerResult {
        let Some(session) = &ctx.focus else {
            return Ok(None);
        };
        let elapsed = ctx.now - session.started_at;
        if elapsed < Duration::zero() {
            return Err(TriggerError::MalformedContext {
                kind: self.kind(),
                message: "focus session starts in the future".to_string(),
            });
        }
        if elapsed < self.threshold {
            return Ok(None);
        }

        Ok(Some(
            Candidate::new(NudgeType::RestSuggest, NudgePriority::Normal)
                .var("minutes", elapsed.num_minutes())
                .action("Take a break", "start_break")
                .action("Keep going", "dismiss")
                .related(json!({
                    "taskId": session.task_id,
                    "elapsedMinutes": elapsed.num_minutes(),
                })),
        ))
    }
}
