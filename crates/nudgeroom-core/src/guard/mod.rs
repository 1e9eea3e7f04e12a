//! Cooldown & limit guard.
//!
//! Filters candidates against per-type cooldowns, daily caps and quiet hours.
//! All mutable bookkeeping lives in an explicit [`GuardState`] owned by one
//! engine; the guard itself only holds configuration.
//!
//! ## Checks, in order
//!
//! 1. Same type already admitted in this tick, or same dedupe key today
//! 2. Cooldown since the last fired nudge of the type
//! 3. Per-type daily cap
//! 4. Global daily cap
//! 5. Quiet hours (skipped for high priority)

mod preset;
mod quiet_hours;

pub use preset::{CooldownRules, Intensity, NudgeLimits};
pub use quiet_hours::{parse_hhmm, QuietHours};

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::nudge::{Candidate, NudgePriority, NudgeType};

/// Why the guard turned a candidate away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    AlreadyFiredThisTick,
    AlreadyFiredToday,
    Cooldown { remaining: Duration },
    TypeLimit { cap: u32 },
    GlobalLimit { cap: u32 },
    QuietHours,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::AlreadyFiredThisTick => write!(f, "already fired this tick"),
            Rejection::AlreadyFiredToday => write!(f, "already fired today"),
            Rejection::Cooldown { remaining } => {
                write!(f, "cooldown ({}s remaining)", remaining.num_seconds())
            }
            Rejection::TypeLimit { cap } => write!(f, "daily cap for type reached ({cap})"),
            Rejection::GlobalLimit { cap } => write!(f, "global daily cap reached ({cap})"),
            Rejection::QuietHours => write!(f, "quiet hours"),
        }
    }
}

/// Outcome of [`Guard::admit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    Rejected(Rejection),
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted)
    }
}

/// Fired counts for one local calendar day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCounters {
    pub day: Option<NaiveDate>,
    #[serde(default)]
    pub per_type: HashMap<NudgeType, u32>,
    #[serde(default)]
    pub total: u32,
    /// Dedupe keys admitted today.
    #[serde(default)]
    pub keys: BTreeSet<String>,
}

/// Guard bookkeeping: last-fired timestamps and today's counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuardState {
    #[serde(default)]
    last_fired: HashMap<NudgeType, DateTime<Utc>>,
    #[serde(default)]
    counters: DailyCounters,
    #[serde(skip)]
    admitted_this_tick: HashSet<NudgeType>,
}

impl GuardState {
    /// Start a new tick. Clears the per-tick admission set.
    pub fn begin_tick(&mut self) {
        self.admitted_this_tick.clear();
    }

    /// Reset counters when the local date changes.
    pub fn roll_over(&mut self, today: NaiveDate) {
        if self.counters.day != Some(today) {
            self.counters = DailyCounters {
                day: Some(today),
                ..DailyCounters::default()
            };
        }
    }

    pub fn last_fired(&self, nudge_type: NudgeType) -> Option<DateTime<Utc>> {
        self.last_fired.get(&nudge_type).copied()
    }

    pub fn count_today(&self, nudge_type: NudgeType) -> u32 {
        self.counters.per_type.get(&nudge_type).copied().unwrap_or(0)
    }

    pub fn total_today(&self) -> u32 {
        self.counters.total
    }

    pub fn counters(&self) -> &DailyCounters {
        &self.counters
    }

    /// Dedupe keys admitted today.
    pub fn fired_keys(&self) -> &BTreeSet<String> {
        &self.counters.keys
    }

    fn record(&mut self, candidate: &Candidate, at: DateTime<Utc>) {
        let nudge_type = candidate.nudge_type;
        if let Some(key) = &candidate.dedupe_key {
            self.counters.keys.insert(key.clone());
        }
        self.last_fired.insert(nudge_type, at);
        *self.counters.per_type.entry(nudge_type).or_insert(0) += 1;
        self.counters.total += 1;
        self.admitted_this_tick.insert(nudge_type);
    }
}

/// Cooldown, cap and quiet-hours policy.
#[derive(Debug, Clone)]
pub struct Guard {
    cooldowns: CooldownRules,
    limits: NudgeLimits,
    quiet_hours: QuietHours,
}

impl Guard {
    pub fn new(cooldowns: CooldownRules, limits: NudgeLimits, quiet_hours: QuietHours) -> Self {
        Self {
            cooldowns,
            limits,
            quiet_hours,
        }
    }

    /// Guard built from an intensity preset.
    pub fn from_preset(intensity: Intensity, quiet_hours: QuietHours) -> Self {
        Self::new(intensity.cooldowns(), intensity.limits(), quiet_hours)
    }

    pub fn cooldowns(&self) -> &CooldownRules {
        &self.cooldowns
    }

    pub fn limits(&self) -> &NudgeLimits {
        &self.limits
    }

    pub fn quiet_hours(&self) -> &QuietHours {
        &self.quiet_hours
    }

    /// Decide whether `candidate` may fire at local time `now`.
    ///
    /// On admission the state is updated in the same call, so a second
    /// candidate of the same type in the same tick is always rejected.
    pub fn admit(
        &self,
        candidate: &Candidate,
        state: &mut GuardState,
        now: DateTime<FixedOffset>,
    ) -> Admission {
        state.roll_over(now.date_naive());
        match self.check(candidate, state, now) {
            Ok(()) => {
                state.record(candidate, now.with_timezone(&Utc));
                Admission::Admitted
            }
            Err(rejection) => Admission::Rejected(rejection),
        }
    }

    fn check(
        &self,
        candidate: &Candidate,
        state: &GuardState,
        now: DateTime<FixedOffset>,
    ) -> Result<(), Rejection> {
        let nudge_type = candidate.nudge_type;
        if state.admitted_this_tick.contains(&nudge_type) {
            return Err(Rejection::AlreadyFiredThisTick);
        }
        if let Some(key) = &candidate.dedupe_key {
            if state.counters.keys.contains(key) {
                return Err(Rejection::AlreadyFiredToday);
            }
        }

        if let Some(last) = state.last_fired(nudge_type) {
            let cooldown = self.cooldowns.get(nudge_type);
            let elapsed = now.with_timezone(&Utc) - last;
            if elapsed < cooldown {
                return Err(Rejection::Cooldown {
                    remaining: cooldown - elapsed,
                });
            }
        }

        if let Some(cap) = self.limits.per_type(nudge_type) {
            if state.count_today(nudge_type) >= cap {
                return Err(Rejection::TypeLimit { cap });
            }
        }

        if state.total_today() >= self.limits.global {
            return Err(Rejection::GlobalLimit {
                cap: self.limits.global,
            });
        }

        if candidate.priority < NudgePriority::High && self.quiet_hours.contains(now.time()) {
            return Err(Rejection::QuietHours);
        }

        Ok(())
    }
}
