//! Append-only nudge history.
//!
//! The whole history lives under one key as a JSON array, oldest first.
//! Missing or corrupt data reads as empty. Write failures are logged and
//! swallowed so a broken store never stops a tick.

use std::sync::Arc;

use chrono::{FixedOffset, NaiveDate};

use crate::nudge::NudgeHistoryItem;
use crate::storage::{read_json, write_json, KvStore, HISTORY_KEY};

/// Default retention cap.
pub const DEFAULT_HISTORY_LIMIT: usize = 200;

/// History of fired nudges backed by a [`KvStore`].
#[derive(Clone)]
pub struct HistoryStore {
    store: Arc<dyn KvStore>,
    limit: usize,
}

impl HistoryStore {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self::with_limit(store, DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_limit(store: Arc<dyn KvStore>, limit: usize) -> Self {
        Self {
            store,
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    fn load(&self) -> Vec<NudgeHistoryItem> {
        read_json(self.store.as_ref(), HISTORY_KEY).unwrap_or_default()
    }

    fn save(&self, items: &[NudgeHistoryItem]) {
        if let Err(e) = write_json(self.store.as_ref(), HISTORY_KEY, &items) {
            tracing::warn!(error = %e, "failed to persist nudge history");
        }
    }

    /// Append an entry, evicting the oldest beyond the cap.
    pub fn append(&self, item: NudgeHistoryItem) {
        let mut items = self.load();
        items.push(item);
        if items.len() > self.limit {
            let excess = items.len() - self.limit;
            items.drain(..excess);
        }
        self.save(&items);
    }

    /// Mark an entry read. Returns `false` if it was unknown or already read.
    pub fn mark_read(&self, id: &str) -> bool {
        self.update(id, |item| {
            if item.read {
                return false;
            }
            item.read = true;
            true
        })
    }

    /// Record the action taken on an entry. Set at most once; also marks
    /// the entry read.
    pub fn mark_action(&self, id: &str, action_id: &str) -> bool {
        self.update(id, |item| {
            if item.action_taken.is_some() {
                return false;
            }
            item.action_taken = Some(action_id.to_string());
            item.read = true;
            true
        })
    }

    fn update<F>(&self, id: &str, f: F) -> bool
    where
        F: FnOnce(&mut NudgeHistoryItem) -> bool,
    {
        let mut items = self.load();
        let Some(item) = items.iter_mut().find(|i| i.id() == id) else {
            return false;
        };
        let changed = f(item);
        if changed {
            self.save(&items);
        }
        changed
    }

    pub fn get(&self, id: &str) -> Option<NudgeHistoryItem> {
        self.load().into_iter().find(|i| i.id() == id)
    }

    /// Up to `limit` entries, newest first.
    pub fn recent(&self, limit: usize) -> Vec<NudgeHistoryItem> {
        let mut items = self.load();
        items.reverse();
        items.truncate(limit);
        items
    }

    /// Every entry, oldest first.
    pub fn all(&self) -> Vec<NudgeHistoryItem> {
        self.load()
    }

    pub fn unread_count(&self) -> usize {
        self.load().iter().filter(|i| !i.read).count()
    }

    /// Entries fired on a local calendar date, oldest first.
    pub fn fired_on(&self, date: NaiveDate, offset: FixedOffset) -> Vec<NudgeHistoryItem> {
        self.load()
            .into_iter()
            .filter(|i| i.fired_at.with_timezone(&offset).date_naive() == date)
            .collect()
    }

    pub fn clear(&self) {
        if let Err(e) = self.store.remove(HISTORY_KEY) {
            tracing::warn!(error = %e, "failed to clear nudge history");
        }
    }
}

impl std::fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryStore")
            .field("limit", &self.limit)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use super::*;
    use crate::nudge::{Nudge, NudgePriority, NudgeType, Tone};
    use crate::storage::MemoryStore;

    fn item(id: &str, fired_at: DateTime<Utc>) -> NudgeHistoryItem {
        let nudge = Nudge {
            id: id.to_string(),
            nudge_type: NudgeType::TaskNudge,
            priority: NudgePriority::Normal,
            title: "t".into(),
            body: "b".into(),
            emoji: "📝".into(),
            tone: Tone::Neutral,
            actions: vec![],
            related_data: serde_json::Value::Null,
            created_at: fired_at,
        };
        NudgeHistoryItem::new(nudge, fired_at)
    }

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 12, 9, 0, 0).unwrap()
    }

    fn store() -> HistoryStore {
        HistoryStore::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn recent_is_newest_first() {
        let history = store();
        for i in 0..5 {
            history.append(item(&format!("n{i}"), base() + Duration::minutes(i)));
        }
        let ids: Vec<String> = history.recent(3).iter().map(|i| i.id().to_string()).collect();
        assert_eq!(ids, ["n4", "n3", "n2"]);
        assert_eq!(history.all().len(), 5);
    }

    #[test]
    fn append_evicts_oldest_beyond_cap() {
        let history = HistoryStore::with_limit(Arc::new(MemoryStore::new()), 3);
        for i in 0..5 {
            history.append(item(&format!("n{i}"), base() + Duration::minutes(i)));
        }
        let all = history.all();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].id(), "n2");
    }

    #[test]
    fn read_and_action_are_set_once() {
        let history = store();
        history.append(item("a", base()));
        assert_eq!(history.unread_count(), 1);
        assert!(history.mark_read("a"));
        assert!(!history.mark_read("a"));
        assert!(!history.mark_read("missing"));
        assert_eq!(history.unread_count(), 0);

        assert!(history.mark_action("a", "snooze"));
        assert!(!history.mark_action("a", "open_task"));
        assert_eq!(history.get("a").unwrap().action_taken.as_deref(), Some("snooze"));
    }

    #[test]
    fn action_marks_read() {
        let history = store();
        history.append(item("a", base()));
        assert!(history.mark_action("a", "dismiss"));
        assert!(history.get("a").unwrap().read);
    }

    #[test]
    fn fired_on_uses_local_date() {
        let history = store();
        history.append(item("late", Utc.with_ymd_and_hms(2026, 5, 12, 23, 30, 0).unwrap()));
        history.append(item("noon", Utc.with_ymd_and_hms(2026, 5, 12, 12, 0, 0).unwrap()));
        let utc = FixedOffset::east_opt(0).unwrap();
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let may12 = NaiveDate::from_ymd_opt(2026, 5, 12).unwrap();
        let may13 = NaiveDate::from_ymd_opt(2026, 5, 13).unwrap();
        assert_eq!(history.fired_on(may12, utc).len(), 2);
        let ids: Vec<_> = history
            .fired_on(may13, tokyo)
            .into_iter()
            .map(|i| i.id().to_string())
            .collect();
        assert_eq!(ids, ["late"]);
    }

    #[test]
    fn corrupt_history_reads_empty_and_clear_empties() {
        let kv = Arc::new(MemoryStore::new());
        kv.set(HISTORY_KEY, "[{\"broken\":").unwrap();
        let history = HistoryStore::new(kv);
        assert!(history.all().is_empty());

        history.append(item("a", base()));
        assert_eq!(history.all().len(), 1);
        history.clear();
        assert!(history.recent(10).is_empty());
    }
}
