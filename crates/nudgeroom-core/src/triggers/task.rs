//! Neglected task nudge.

use chrono::Duration;
use serde_json::json;

use super::{Trigger, TriggerResult};
use crate::context::TriggerContext;
use crate::nudge::{Candidate, NudgePriority, NudgeType};

/// Nudges about an incomplete task nobody has touched for a while.
///
/// A task is nudged at most once per day, so repeated ticks rotate through
/// the neglected tasks.
#[derive(Debug, Clone)]
pub struct NeglectedTaskTrigger {
    threshold: Duration,
}

impl NeglectedTaskTrigger {
    pub fn new(threshold: Duration) -> Self {
        Self { threshold }
    }
}

impl Trigger for NeglectedTaskTrigger {
    fn kind(&self) -> NudgeType {
        NudgeType::TaskNudge
    }

    fn evaluate(&self, ctx: &TriggerContext) -> TriggerResult {
        // Soonest deadline first, then the longest untouched.
        let neglected = ctx
            .pending_tasks()
            .filter(|t| ctx.now - t.last_touched_at >= self.threshold)
            .filter(|t| !ctx.already_fired(&dedupe_key(&t.id)))
            .min_by_key(|t| (t.deadline.is_none(), t.deadline, t.last_touched_at));

        let Some(task) = neglected else {
            return Ok(None);
        };
        let idle_hours = (ctx.now - task.last_touched_at).num_hours();

        let mut candidate = Candidate::new(NudgeType::TaskNudge, NudgePriority::Normal)
            .dedupe(dedupe_key(&task.id))
            .var("title", &task.title)
            .var("hours", idle_hours)
            .action("Open task", "open_task")
            .action("Snooze", "snooze")
            .related(json!({
                "taskId": task.id,
                "idleHours": idle_hours,
            }));
        if let Some(deadline) = task.deadline {
            candidate = candidate.ordered_by(deadline);
        }
        Ok(Some(candidate))
    }
}

fn dedupe_key(task_id: &str) -> String {
    format!("task:{task_id}")
}
