//! Trigger evaluators.
//!
//! Each trigger inspects a [`TriggerContext`] and proposes at most one
//! [`Candidate`] per tick. Triggers hold only their thresholds; they never
//! read the wall clock or share mutable state, so each one can be tested
//! with a hand-built context.

mod daily;
mod focus;
mod meeting;
mod overload;
mod rest;
mod streak;
mod task;
mod travel;

pub use daily::{EveningWrapupTrigger, MorningBriefingTrigger};
pub use focus::FocusSuggestTrigger;
pub use meeting::{extract_meeting_link, MeetingReminderTrigger};
pub use overload::OverloadTrigger;
pub use rest::RestTrigger;
pub use streak::StreakTrigger;
pub use task::NeglectedTaskTrigger;
pub use travel::{DepartureAlertTrigger, LateWarningTrigger};

use chrono::{DateTime, Duration, NaiveTime, Utc};

use crate::context::TriggerContext;
use crate::error::{ConfigError, TriggerError};
use crate::guard::parse_hhmm;
use crate::nudge::{Candidate, NudgeType};
use crate::storage::TriggersConfig;

/// Outcome of one trigger evaluation.
pub type TriggerResult = Result<Option<Candidate>, TriggerError>;

/// A context-evaluation rule that proposes at most one nudge per tick.
pub trait Trigger: Send + Sync {
    /// The nudge type this trigger produces.
    fn kind(&self) -> NudgeType;

    fn evaluate(&self, ctx: &TriggerContext) -> TriggerResult;
}

/// Non-wrapping time-of-day window, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Parse `HH:MM-HH:MM`.
    pub fn parse(key: &str, value: &str) -> Result<Self, ConfigError> {
        let (start, end) = value.split_once('-').ok_or_else(|| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected HH:MM-HH:MM, got '{value}'"),
        })?;
        let window = Self::new(parse_hhmm(key, start)?, parse_hhmm(key, end)?);
        if window.start >= window.end {
            return Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("window '{value}' must end after it starts"),
            });
        }
        Ok(window)
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        time >= self.start && time < self.end
    }
}

/// Build the enabled triggers from configuration.
///
/// # Errors
///
/// Returns an error if a configured time window cannot be parsed.
pub fn build_triggers(cfg: &TriggersConfig) -> Result<Vec<Box<dyn Trigger>>, ConfigError> {
    let mut triggers: Vec<Box<dyn Trigger>> = Vec::new();

    if cfg.morning_briefing {
        triggers.push(Box::new(MorningBriefingTrigger::new(TimeWindow::parse(
            "triggers.briefing_window",
            &cfg.briefing_window,
        )?)));
    }
    if cfg.evening_wrapup {
        triggers.push(Box::new(EveningWrapupTrigger::new(TimeWindow::parse(
            "triggers.wrapup_window",
            &cfg.wrapup_window,
        )?)));
    }
    if cfg.meeting_reminder {
        triggers.push(Box::new(MeetingReminderTrigger::new(
            cfg.meeting_lead_minutes.clone(),
        )));
    }
    if cfg.focus_suggest {
        let windows = cfg
            .peak_windows
            .iter()
            .map(|w| TimeWindow::parse("triggers.peak_windows", w))
            .collect::<Result<Vec<_>, _>>()?;
        triggers.push(Box::new(FocusSuggestTrigger::new(windows)));
    }
    if cfg.task_nudge {
        triggers.push(Box::new(NeglectedTaskTrigger::new(Duration::hours(
            i64::from(cfg.task_neglect_hours),
        ))));
    }
    if cfg.overload_warn {
        triggers.push(Box::new(OverloadTrigger::new(
            Duration::hours(i64::from(cfg.overload_span_hours)),
            cfg.overload_threshold as usize,
        )));
    }
    if cfg.rest_suggest {
        triggers.push(Box::new(RestTrigger::new(Duration::minutes(i64::from(
            cfg.rest_after_minutes,
        )))));
    }
    if cfg.late_warning {
        triggers.push(Box::new(LateWarningTrigger::new(cfg.default_travel_minutes)));
    }
    if cfg.departure_alert {
        triggers.push(Box::new(DepartureAlertTrigger::new(
            cfg.default_travel_minutes,
            Duration::minutes(i64::from(cfg.departure_buffer_minutes)),
            Duration::minutes(i64::from(cfg.departure_tolerance_minutes)),
        )));
    }
    if cfg.streak_celebrate {
        triggers.push(Box::new(StreakTrigger::new(cfg.streak_milestones.clone())));
    }

    Ok(triggers)
}

/// Whole minutes from `from` to `to`, rounded up.
pub(crate) fn minutes_until(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    let secs = (to - from).num_seconds();
    if secs <= 0 {
        return 0;
    }
    (secs + 59) / 60
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use crate::context::{ContextEvent, ContextTask, TriggerContext};

    pub fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 12, h, m, 0).unwrap()
    }

    pub fn ctx(now: DateTime<Utc>) -> TriggerContext {
        TriggerContext::empty(now)
    }

    pub fn event(id: &str, start: DateTime<Utc>, minutes: i64) -> ContextEvent {
        ContextEvent {
            id: id.to_string(),
            title: format!("Event {id}"),
            start,
            end: start + Duration::minutes(minutes),
            description: None,
            location: None,
            travel_minutes: None,
        }
    }

    pub fn task(id: &str, touched: DateTime<Utc>) -> ContextTask {
        ContextTask {
            id: id.to_string(),
            title: format!("Task {id}"),
            completed: false,
            last_touched_at: touched,
            deadline: None,
            priority: None,
        }
    }
}
