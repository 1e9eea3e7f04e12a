//! Cooldown rules, daily limits and the intensity presets that bundle them.

use std::collections::HashMap;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::nudge::NudgeType;

/// Minimum spacing between two fired nudges of the same type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CooldownRules {
    by_type: HashMap<NudgeType, Duration>,
}

impl CooldownRules {
    pub fn from_minutes(entries: &[(NudgeType, i64)]) -> Self {
        Self {
            by_type: entries
                .iter()
                .map(|(t, m)| (*t, Duration::minutes(*m)))
                .collect(),
        }
    }

    /// Cooldown for a type. Types without a rule have none.
    pub fn get(&self, nudge_type: NudgeType) -> Duration {
        self.by_type
            .get(&nudge_type)
            .copied()
            .unwrap_or_else(Duration::zero)
    }

    pub fn set(&mut self, nudge_type: NudgeType, cooldown: Duration) {
        self.by_type.insert(nudge_type, cooldown);
    }
}

/// Daily caps: one global, plus optional per-type caps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NudgeLimits {
    pub global: u32,
    per_type: HashMap<NudgeType, u32>,
}

impl NudgeLimits {
    pub fn new(global: u32, per_type: &[(NudgeType, u32)]) -> Self {
        Self {
            global,
            per_type: per_type.iter().copied().collect(),
        }
    }

    /// Per-type cap, `None` when only the global cap applies.
    pub fn per_type(&self, nudge_type: NudgeType) -> Option<u32> {
        self.per_type.get(&nudge_type).copied()
    }

    pub fn set_per_type(&mut self, nudge_type: NudgeType, cap: u32) {
        self.per_type.insert(nudge_type, cap);
    }
}

/// Named bundle of cooldowns and limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Minimal,
    #[default]
    Normal,
    Frequent,
}

impl Intensity {
    pub const ALL: [Intensity; 3] = [Intensity::Minimal, Intensity::Normal, Intensity::Frequent];

    pub fn as_str(self) -> &'static str {
        match self {
            Intensity::Minimal => "minimal",
            Intensity::Normal => "normal",
            Intensity::Frequent => "frequent",
        }
    }

    pub fn cooldowns(self) -> CooldownRules {
        use NudgeType::*;
        // Minutes. Once-a-day types share a 20h cooldown in every preset.
        let (meeting, focus, task, overload, rest, late, departure) = match self {
            Intensity::Minimal => (8, 240, 240, 480, 90, 15, 20),
            Intensity::Normal => (8, 120, 120, 240, 45, 10, 15),
            Intensity::Frequent => (4, 60, 60, 120, 30, 5, 10),
        };
        CooldownRules::from_minutes(&[
            (MorningBriefing, 20 * 60),
            (EveningWrapup, 20 * 60),
            (StreakCelebrate, 20 * 60),
            (MeetingReminder, meeting),
            (FocusSuggest, focus),
            (TaskNudge, task),
            (OverloadWarn, overload),
            (RestSuggest, rest),
            (LateWarning, late),
            (DepartureAlert, departure),
        ])
    }

    pub fn limits(self) -> NudgeLimits {
        use NudgeType::*;
        let (global, meeting, focus, task, overload, rest, travel) = match self {
            Intensity::Minimal => (6, 6, 1, 1, 1, 2, 3),
            Intensity::Normal => (15, 10, 3, 3, 2, 4, 4),
            Intensity::Frequent => (30, 16, 6, 6, 3, 6, 6),
        };
        NudgeLimits::new(
            global,
            &[
                (MorningBriefing, 1),
                (EveningWrapup, 1),
                (StreakCelebrate, 1),
                (MeetingReminder, meeting),
                (FocusSuggest, focus),
                (TaskNudge, task),
                (OverloadWarn, overload),
                (RestSuggest, rest),
                (LateWarning, travel),
                (DepartureAlert, travel),
            ],
        )
    }
}

impl std::str::FromStr for Intensity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Intensity::ALL
            .iter()
            .copied()
            .find(|i| i.as_str() == s)
            .ok_or_else(|| format!("unknown intensity: {s}"))
    }
}
