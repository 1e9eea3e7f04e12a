//! Trigger context: the read-only snapshot every trigger evaluates.
//!
//! Tasks, calendar events and the focus session come from a
//! [`ContextSource`]; the engine stamps the snapshot with the tick's instant
//! and the local UTC offset to build a [`TriggerContext`].

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A task as seen by the nudge engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextTask {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    /// Last time the user edited or worked on the task.
    pub last_touched_at: DateTime<Utc>,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    /// Lower value = more important.
    #[serde(default)]
    pub priority: Option<i32>,
}

/// A calendar event for today.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextEvent {
    pub id: String,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    /// Estimated travel time to the location, if known.
    #[serde(default)]
    pub travel_minutes: Option<u32>,
}

impl ContextEvent {
    /// Location-bound events are the ones the user has to travel to.
    pub fn is_location_bound(&self) -> bool {
        self.location
            .as_deref()
            .map(|l| !l.trim().is_empty() && !l.trim_start().starts_with("http"))
            .unwrap_or(false)
    }

    pub fn is_in_progress(&self, now: DateTime<Utc>) -> bool {
        self.start <= now && now < self.end
    }

    /// Travel time for this event, falling back to `default_minutes`.
    pub fn travel_time(&self, default_minutes: u32) -> Duration {
        Duration::minutes(i64::from(self.travel_minutes.unwrap_or(default_minutes)))
    }
}

/// The focus session currently running, if any.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusSession {
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub task_title: Option<String>,
}

/// Raw context data pulled from the providers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextSnapshot {
    #[serde(default)]
    pub tasks: Vec<ContextTask>,
    #[serde(default)]
    pub events: Vec<ContextEvent>,
    #[serde(default)]
    pub focus: Option<FocusSession>,
    /// Consecutive days with at least one completed focus session.
    #[serde(default)]
    pub streak_days: u32,
    #[serde(default)]
    pub completed_today: u32,
}

/// Snapshot plus the tick's clock reading.
#[derive(Debug, Clone)]
pub struct TriggerContext {
    pub now: DateTime<Utc>,
    pub offset: FixedOffset,
    pub tasks: Vec<ContextTask>,
    pub events: Vec<ContextEvent>,
    pub focus: Option<FocusSession>,
    pub streak_days: u32,
    pub completed_today: u32,
    /// Dedupe keys of nudges already fired today.
    pub fired_today: BTreeSet<String>,
}

impl TriggerContext {
    pub fn new(now: DateTime<Utc>, offset: FixedOffset, snapshot: ContextSnapshot) -> Self {
        Self {
            now,
            offset,
            tasks: snapshot.tasks,
            events: snapshot.events,
            focus: snapshot.focus,
            streak_days: snapshot.streak_days,
            completed_today: snapshot.completed_today,
            fired_today: BTreeSet::new(),
        }
    }

    /// Empty context at `now` in UTC, mostly for tests.
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self::new(now, utc_offset(), ContextSnapshot::default())
    }

    pub fn already_fired(&self, key: &str) -> bool {
        self.fired_today.contains(key)
    }

    pub fn local_now(&self) -> DateTime<FixedOffset> {
        self.now.with_timezone(&self.offset)
    }

    pub fn local_time(&self) -> NaiveTime {
        self.local_now().time()
    }

    pub fn local_date(&self) -> NaiveDate {
        self.local_now().date_naive()
    }

    pub fn pending_tasks(&self) -> impl Iterator<Item = &ContextTask> {
        self.tasks.iter().filter(|t| !t.completed)
    }

    /// Events that have not started yet, soonest first.
    pub fn upcoming_events(&self) -> Vec<&ContextEvent> {
        let mut upcoming: Vec<&ContextEvent> =
            self.events.iter().filter(|e| e.start > self.now).collect();
        upcoming.sort_by_key(|e| e.start);
        upcoming
    }

    pub fn event_in_progress(&self) -> Option<&ContextEvent> {
        self.events.iter().find(|e| e.is_in_progress(self.now))
    }

    /// Events that start today in local time.
    pub fn events_today(&self) -> impl Iterator<Item = &ContextEvent> {
        let today = self.local_date();
        let offset = self.offset;
        self.events
            .iter()
            .filter(move |e| e.start.with_timezone(&offset).date_naive() == today)
    }
}

pub(crate) fn utc_offset() -> FixedOffset {
    Utc.fix()
}

/// Supplies context snapshots to the engine on each tick.
pub trait ContextSource: Send + Sync {
    fn snapshot(&self, now: DateTime<Utc>) -> Result<ContextSnapshot>;
}

/// In-memory context that callers update between ticks.
#[derive(Debug, Clone, Default)]
pub struct SharedContext {
    inner: Arc<Mutex<ContextSnapshot>>,
}

impl SharedContext {
    pub fn new(snapshot: ContextSnapshot) -> Self {
        Self {
            inner: Arc::new(Mutex::new(snapshot)),
        }
    }

    /// Replace the whole snapshot.
    pub fn set(&self, snapshot: ContextSnapshot) {
        *self.inner.lock().unwrap_or_else(|e| e.into_inner()) = snapshot;
    }

    /// Mutate the snapshot in place.
    pub fn update<F: FnOnce(&mut ContextSnapshot)>(&self, f: F) {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard);
    }
}

impl ContextSource for SharedContext {
    fn snapshot(&self, _now: DateTime<Utc>) -> Result<ContextSnapshot> {
        Ok(self.inner.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }
}

/// Context read from a JSON file on every tick.
///
/// A missing file is an empty context; a malformed one is an error, and the
/// engine skips that tick.
#[derive(Debug, Clone)]
pub struct JsonFileContext {
    path: PathBuf,
}

impl JsonFileContext {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl ContextSource for JsonFileContext {
    fn snapshot(&self, _now: DateTime<Utc>) -> Result<ContextSnapshot> {
        if !self.path.exists() {
            return Ok(ContextSnapshot::default());
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, h, m, 0).unwrap()
    }

    fn event(id: &str, start: DateTime<Utc>, mins: i64) -> ContextEvent {
        ContextEvent {
            id: id.into(),
            title: id.into(),
            start,
            end: start + Duration::minutes(mins),
            description: None,
            location: None,
            travel_minutes: None,
        }
    }

    #[test]
    fn upcoming_events_are_sorted_and_future_only() {
        let mut ctx = TriggerContext::empty(at(10, 0));
        ctx.events = vec![
            event("late", at(15, 0), 30),
            event("past", at(9, 0), 30),
            event("soon", at(11, 0), 30),
        ];
        let ids: Vec<&str> = ctx.upcoming_events().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["soon", "late"]);
        assert!(ctx.event_in_progress().is_none());
    }

    #[test]
    fn local_date_uses_offset() {
        let offset = FixedOffset::east_opt(9 * 3600).unwrap();
        let ctx = TriggerContext::new(at(20, 0), offset, ContextSnapshot::default());
        assert_eq!(ctx.local_date(), NaiveDate::from_ymd_opt(2026, 3, 11).unwrap());
        assert_eq!(ctx.local_time(), NaiveTime::from_hms_opt(5, 0, 0).unwrap());
    }

    #[test]
    fn location_bound_excludes_links() {
        let mut e = event("e", at(12, 0), 30);
        assert!(!e.is_location_bound());
        e.location = Some("https://zoom.us/j/123".into());
        assert!(!e.is_location_bound());
        e.location = Some("Cafe Central".into());
        assert!(e.is_location_bound());
        assert_eq!(e.travel_time(20), Duration::minutes(20));
    }

    #[test]
    fn json_file_context_missing_file_is_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let source = JsonFileContext::new(dir.path().join("context.json"));
        let snapshot = source.snapshot(at(8, 0)).unwrap();
        assert!(snapshot.tasks.is_empty());
    }

    #[test]
    fn json_file_context_reads_snapshot() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("context.json");
        std::fs::write(
            &path,
            r#"{"tasks":[{"id":"t1","title":"Write report","last_touched_at":"2026-03-09T08:00:00Z"}],"streak_days":3}"#,
        )
        .unwrap();
        let snapshot = JsonFileContext::new(&path).snapshot(at(8, 0)).unwrap();
        assert_eq!(snapshot.tasks.len(), 1);
        assert_eq!(snapshot.streak_days, 3);
        assert!(!snapshot.tasks[0].completed);
    }

    #[test]
    fn shared_context_updates_are_visible() {
        let ctx = SharedContext::default();
        ctx.update(|s| s.streak_days = 7);
        assert_eq!(ctx.snapshot(at(8, 0)).unwrap().streak_days, 7);
    }
}
