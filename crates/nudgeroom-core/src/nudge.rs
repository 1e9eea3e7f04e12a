//! Nudge data model.
//!
//! A [`Candidate`] is what a trigger proposes on a tick. Once the guard admits
//! it, the composer turns it into a [`Nudge`], which is recorded as a
//! [`NudgeHistoryItem`] and handed to the dispatcher.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of actions a nudge carries.
pub const MAX_ACTIONS: usize = 3;

/// Closed set of nudge kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NudgeType {
    MorningBriefing,
    EveningWrapup,
    MeetingReminder,
    FocusSuggest,
    TaskNudge,
    OverloadWarn,
    RestSuggest,
    LateWarning,
    StreakCelebrate,
    DepartureAlert,
}

impl NudgeType {
    pub const ALL: [NudgeType; 10] = [
        NudgeType::MorningBriefing,
        NudgeType::EveningWrapup,
        NudgeType::MeetingReminder,
        NudgeType::FocusSuggest,
        NudgeType::TaskNudge,
        NudgeType::OverloadWarn,
        NudgeType::RestSuggest,
        NudgeType::LateWarning,
        NudgeType::StreakCelebrate,
        NudgeType::DepartureAlert,
    ];

    /// Wire name, e.g. `meeting_reminder`.
    pub fn as_str(self) -> &'static str {
        match self {
            NudgeType::MorningBriefing => "morning_briefing",
            NudgeType::EveningWrapup => "evening_wrapup",
            NudgeType::MeetingReminder => "meeting_reminder",
            NudgeType::FocusSuggest => "focus_suggest",
            NudgeType::TaskNudge => "task_nudge",
            NudgeType::OverloadWarn => "overload_warn",
            NudgeType::RestSuggest => "rest_suggest",
            NudgeType::LateWarning => "late_warning",
            NudgeType::StreakCelebrate => "streak_celebrate",
            NudgeType::DepartureAlert => "departure_alert",
        }
    }

    /// Presentation glyph shown in front of the title.
    pub fn emoji(self) -> &'static str {
        match self {
            NudgeType::MorningBriefing => "☀️",
            NudgeType::EveningWrapup => "🌙",
            NudgeType::MeetingReminder => "📅",
            NudgeType::FocusSuggest => "🎯",
            NudgeType::TaskNudge => "📝",
            NudgeType::OverloadWarn => "⚠️",
            NudgeType::RestSuggest => "☕",
            NudgeType::LateWarning => "🏃",
            NudgeType::StreakCelebrate => "🔥",
            NudgeType::DepartureAlert => "🚪",
        }
    }
}

impl fmt::Display for NudgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NudgeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NudgeType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown nudge type: {s}"))
    }
}

/// Ordinal priority. `High` bypasses quiet hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NudgePriority {
    Low,
    Normal,
    High,
}

/// Voice of a message template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Apologetic,
    Encouraging,
    Neutral,
}

/// A button offered with a nudge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NudgeAction {
    pub label: String,
    pub action_id: String,
}

impl NudgeAction {
    pub fn new(label: impl Into<String>, action_id: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action_id: action_id.into(),
        }
    }
}

/// Template variables keyed by placeholder name.
pub type TemplateVars = BTreeMap<&'static str, String>;

/// A trigger's proposal for this tick, before guard and composition.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub nudge_type: NudgeType,
    pub priority: NudgePriority,
    pub vars: TemplateVars,
    pub actions: Vec<NudgeAction>,
    /// Link back to the triggering entity. Never interpreted by the engine.
    pub related_data: serde_json::Value,
    /// Natural order among equal priorities (soonest first).
    pub order_key: Option<DateTime<Utc>>,
    /// Fires at most once per local day under this key.
    pub dedupe_key: Option<String>,
}

impl Candidate {
    pub fn new(nudge_type: NudgeType, priority: NudgePriority) -> Self {
        Self {
            nudge_type,
            priority,
            vars: TemplateVars::new(),
            actions: Vec::new(),
            related_data: serde_json::Value::Null,
            order_key: None,
            dedupe_key: None,
        }
    }

    pub fn var(mut self, name: &'static str, value: impl ToString) -> Self {
        self.vars.insert(name, value.to_string());
        self
    }

    pub fn action(mut self, label: impl Into<String>, action_id: impl Into<String>) -> Self {
        if self.actions.len() < MAX_ACTIONS {
            self.actions.push(NudgeAction::new(label, action_id));
        }
        self
    }

    pub fn related(mut self, data: serde_json::Value) -> Self {
        self.related_data = data;
        self
    }

    pub fn ordered_by(mut self, key: DateTime<Utc>) -> Self {
        self.order_key = Some(key);
        self
    }

    pub fn dedupe(mut self, key: impl Into<String>) -> Self {
        self.dedupe_key = Some(key.into());
        self
    }
}

/// A decided, ready-to-show notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nudge {
    pub id: String,
    #[serde(rename = "type")]
    pub nudge_type: NudgeType,
    pub priority: NudgePriority,
    pub title: String,
    pub body: String,
    pub emoji: String,
    pub tone: Tone,
    pub actions: Vec<NudgeAction>,
    #[serde(default)]
    pub related_data: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// A fired nudge plus its lifecycle fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NudgeHistoryItem {
    #[serde(flatten)]
    pub nudge: Nudge,
    pub fired_at: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub action_taken: Option<String>,
    /// Whether the push channel accepted the nudge, set when the entry is appended.
    #[serde(default)]
    pub displayed: bool,
}

impl NudgeHistoryItem {
    pub fn new(nudge: Nudge, fired_at: DateTime<Utc>) -> Self {
        Self {
            nudge,
            fired_at,
            read: false,
            action_taken: None,
            displayed: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.nudge.id
    }

    pub fn nudge_type(&self) -> NudgeType {
        self.nudge.nudge_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nudge_type_wire_names_round_trip() {
        for t in NudgeType::ALL {
            let json = serde_json::to_string(&t).unwrap();
            assert_eq!(json, format!("\"{}\"", t.as_str()));
            assert_eq!(t.as_str().parse::<NudgeType>().unwrap(), t);
        }
        assert!("bogus".parse::<NudgeType>().is_err());
    }

    #[test]
    fn priority_is_ordinal() {
        assert!(NudgePriority::High > NudgePriority::Normal);
        assert!(NudgePriority::Normal > NudgePriority::Low);
    }

    #[test]
    fn candidate_caps_actions() {
        let c = Candidate::new(NudgeType::TaskNudge, NudgePriority::Normal)
            .action("a", "a")
            .action("b", "b")
            .action("c", "c")
            .action("d", "d");
        assert_eq!(c.actions.len(), MAX_ACTIONS);
    }

    #[test]
    fn history_item_serializes_flat_camel_case() {
        let nudge = Nudge {
            id: "n-1".into(),
            nudge_type: NudgeType::RestSuggest,
            priority: NudgePriority::Normal,
            title: "Break".into(),
            body: "Stand up".into(),
            emoji: "☕".into(),
            tone: Tone::Encouraging,
            actions: vec![NudgeAction::new("OK", "ack")],
            related_data: serde_json::json!({"elapsedMinutes": 95}),
            created_at: Utc::now(),
        };
        let item = NudgeHistoryItem::new(nudge, Utc::now());
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["type"], "rest_suggest");
        assert_eq!(value["actionTaken"], serde_json::Value::Null);
        assert_eq!(value["actions"][0]["actionId"], "ack");
        assert!(value.get("firedAt").is_some());

        let back: NudgeHistoryItem = serde_json::from_value(value).unwrap();
        assert_eq!(back, item);
    }
}
