//! Focus suggestion during peak hours.

use chrono::Duration;
use serde_json::json;

use super::{TimeWindow, Trigger, TriggerResult};
use crate::context::{ContextTask, TriggerContext};
use crate::nudge::{Candidate, NudgePriority, NudgeType};

/// A focus block shorter than this is not worth suggesting.
const MIN_FREE_MINUTES: i64 = 25;

/// Suggests starting a focus session inside a peak-energy window.
#[derive(Debug, Clone)]
pub struct FocusSuggestTrigger {
    peak_windows: Vec<TimeWindow>,
}

impl FocusSuggestTrigger {
    pub fn new(peak_windows: Vec<TimeWindow>) -> Self {
        Self { peak_windows }
    }
}

impl Trigger for FocusSuggestTrigger {
    fn kind(&self) -> NudgeType {
        NudgeType::FocusSuggest
    }

    fn evaluate(&self, ctx: &TriggerContext) -> TriggerResult {
        let time = ctx.local_time();
        if !self.peak_windows.iter().any(|w| w.contains(time)) {
            return Ok(None);
        }
        if ctx.focus.is_some() || ctx.event_in_progress().is_some() {
            return Ok(None);
        }
        let free_until = ctx.upcoming_events().first().map(|e| e.start);
        if free_until.is_some_and(|start| start - ctx.now < Duration::minutes(MIN_FREE_MINUTES)) {
            return Ok(None);
        }
        let Some(task) = best_task(ctx) else {
            return Ok(None);
        };

        Ok(Some(
            Candidate::new(NudgeType::FocusSuggest, NudgePriority::Low)
                .var("task", &task.title)
                .action("Start focus", "start_focus")
                .action("Not now", "dismiss")
                .related(json!({ "taskId": task.id })),
        ))
    }
}

/// Most important pending task; deadlines break ties.
fn best_task(ctx: &TriggerContext) -> Option<&ContextTask> {
    ctx.pending_tasks().min_by_key(|t| {
        (
            t.priority.unwrap_or(i32::MAX),
            t.deadline.is_none(),
            t.deadline,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::FocusSession;
    use crate::triggers::test_support::{at, ctx, event, task};

    fn trigger() -> FocusSuggestTrigger {
        FocusSuggestTrigger::new(vec![TimeWindow::parse("k", "09:00-11:30").unwrap()])
    }

    #[test]
    fn suggests_most_important_task_in_peak_window() {
        let mut c = ctx(at(9, 30));
        let mut urgent = task("b", at(8, 0));
        urgent.priority = Some(1);
        c.tasks = vec![task("a", at(8, 0)), urgent];
        let candidate = trigger().evaluate(&c).unwrap().unwrap();
        assert_eq!(candidate.vars["task"], "Task b");
        assert_eq!(candidate.priority, NudgePriority::Low);
    }

    #[test]
    fn silent_outside_peak_window() {
        let mut c = ctx(at(13, 0));
        c.tasks = vec![task("a", at(8, 0))];
        assert!(trigger().evaluate(&c).unwrap().is_none());
    }

    #[test]
    fn silent_when_already_focusing() {
        let mut c = ctx(at(9, 30));
        c.tasks = vec![task("a", at(8, 0))];
        c.focus = Some(FocusSession {
            started_at: at(9, 0),
            task_id: None,
            task_title: None,
        });
        assert!(trigger().evaluate(&c).unwrap().is_none());
    }

    #[test]
    fn silent_when_meeting_is_near_or_no_tasks() {
        let mut c = ctx(at(9, 30));
        c.tasks = vec![task("a", at(8, 0))];
        c.events = vec![event("m", at(9, 45), 30)];
        assert!(trigger().evaluate(&c).unwrap().is_none());

        let empty = ctx(at(9, 30));
        assert!(trigger().evaluate(&empty).unwrap().is_none());
    }
}
