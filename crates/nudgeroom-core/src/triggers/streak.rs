//! Streak milestone celebration.

use serde_json::json;

use super::{Trigger, TriggerResult};
use crate::context::TriggerContext;
use crate::nudge::{Candidate, NudgePriority, NudgeType};

#[derive(Debug, Clone)]
pub struct StreakTrigger {
    milestones: Vec<u32>,
}

impl StreakTrigger {
    pub fn new(mut milestones: Vec<u32>) -> Self {
        milestones.retain(|&m| m > 0);
        milestones.sort_unstable();
        milestones.dedup();
        Self { milestones }
    }
}

impl Trigger for StreakTrigger {
    fn kind(&self) -> NudgeType {
        NudgeType::StreakCelebrate
    }

    fn evaluate(&self, ctx: &TriggerContext) -> TriggerResult {
        let days = ctx.streak_days;
        if self.milestones.binary_search(&days).is_err() {
            return Ok(None);
        }
        let next = self.milestones.iter().copied().find(|&m| m > days);

        Ok(Some(
            Candidate::new(NudgeType::StreakCelebrate, NudgePriority::Low)
                .var("days", days)
                .action("Nice!", "dismiss")
                .related(json!({
                    "streakDays": days,
                    "nextMilestone": next,
                })),
        ))
    }
}
