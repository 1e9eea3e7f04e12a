//! The nudge engine: one synchronous tick at a time.
//!
//! ## Tick pipeline
//!
//! ```text
//! ContextSource ─> TriggerContext ─> triggers ─> candidates (sorted)
//!                                                    │
//!                                Guard::admit <──────┘
//!                                    │ admitted
//!                                    ▼
//!                 MessageComposer ─> Dispatcher ─> History
//! ```
//!
//! A failing or panicking trigger is logged and skipped. Storage problems
//! are logged and never abort the tick.

use std::cmp::Ordering;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use tokio::sync::broadcast;

use crate::compose::MessageComposer;
use crate::context::{ContextSource, TriggerContext};
use crate::dispatch::{DispatchOutcome, Dispatcher, NudgeEvent, PushChannel};
use crate::error::{ConfigError, TriggerError};
use crate::guard::{Admission, Guard, GuardState, Rejection};
use crate::history::HistoryStore;
use crate::nudge::{Candidate, Nudge, NudgeHistoryItem, NudgeType};
use crate::storage::{read_json, write_json, Config, KvStore, GUARD_STATE_KEY};
use crate::triggers::{build_triggers, Trigger};

/// A nudge that made it through the guard this tick.
#[derive(Debug, Clone)]
pub struct FiredNudge {
    pub nudge: Nudge,
    pub outcome: DispatchOutcome,
}

/// What happened during one tick.
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub fired: Vec<FiredNudge>,
    pub rejected: Vec<(NudgeType, Rejection)>,
    pub failed: Vec<TriggerError>,
    /// Set when the context could not be read; no trigger ran.
    pub context_error: Option<String>,
}

impl TickReport {
    pub fn is_quiet(&self) -> bool {
        self.fired.is_empty()
    }
}

/// Owns the triggers, guard state, composer, history and dispatcher.
pub struct NudgeEngine {
    triggers: Vec<Box<dyn Trigger>>,
    guard: Guard,
    state: GuardState,
    composer: MessageComposer,
    history: HistoryStore,
    dispatcher: Dispatcher,
    context: Arc<dyn ContextSource>,
    store: Arc<dyn KvStore>,
    ticks: u64,
}

impl NudgeEngine {
    /// Build an engine from configuration. Guard state is restored from
    /// `store`; missing or corrupt state starts fresh.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(
        config: &Config,
        store: Arc<dyn KvStore>,
        context: Arc<dyn ContextSource>,
        channel: Arc<dyn PushChannel>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let state: GuardState = read_json(store.as_ref(), GUARD_STATE_KEY).unwrap_or_default();
        Ok(Self {
            triggers: build_triggers(&config.triggers)?,
            guard: config.guard()?,
            state,
            composer: MessageComposer::new(config.locale),
            history: HistoryStore::with_limit(store.clone(), config.scheduler.history_limit),
            dispatcher: Dispatcher::new(channel),
            context,
            store,
            ticks: 0,
        })
    }

    /// Replace the composer, e.g. with a seeded one.
    pub fn with_composer(mut self, composer: MessageComposer) -> Self {
        self.composer = composer;
        self
    }

    /// Replace the trigger set.
    pub fn with_triggers(mut self, triggers: Vec<Box<dyn Trigger>>) -> Self {
        self.triggers = triggers;
        self
    }

    pub fn with_guard(mut self, guard: Guard) -> Self {
        self.guard = guard;
        self
    }

    /// Apply changed settings without losing guard state or history.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid; the engine is left
    /// unchanged.
    pub fn apply_config(&mut self, config: &Config) -> Result<(), ConfigError> {
        config.validate()?;
        let triggers = build_triggers(&config.triggers)?;
        let guard = config.guard()?;
        self.triggers = triggers;
        self.guard = guard;
        self.composer.set_locale(config.locale);
        self.history =
            HistoryStore::with_limit(self.store.clone(), config.scheduler.history_limit);
        Ok(())
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn guard_state(&self) -> &GuardState {
        &self.state
    }

    pub fn guard(&self) -> &Guard {
        &self.guard
    }

    /// Number of ticks run so far.
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NudgeEvent> {
        self.dispatcher.subscribe()
    }

    /// Run one tick at `now`, using `offset` for local-time rules.
    pub fn tick(&mut self, now: DateTime<Utc>, offset: FixedOffset) -> TickReport {
        self.ticks += 1;
        self.state.begin_tick();
        let mut report = TickReport::default();

        let snapshot = match self.context.snapshot(now) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(error = %e, "context unavailable, skipping tick");
                report.context_error = Some(e.to_string());
                return report;
            }
        };
        let local_now = now.with_timezone(&offset);
        self.state.roll_over(local_now.date_naive());
        let mut ctx = TriggerContext::new(now, offset, snapshot);
        ctx.fired_today = self.state.fired_keys().clone();

        let mut candidates = self.evaluate(&ctx, &mut report.failed);
        candidates.sort_by(rank);

        for candidate in candidates {
            match self.guard.admit(&candidate, &mut self.state, local_now) {
                Admission::Admitted => {
                    report.fired.push(self.fire(&candidate, now));
                }
                Admission::Rejected(rejection) => {
                    tracing::debug!(
                        nudge_type = %candidate.nudge_type,
                        reason = %rejection,
                        "candidate rejected"
                    );
                    report.rejected.push((candidate.nudge_type, rejection));
                }
            }
        }

        if let Err(e) = write_json(self.store.as_ref(), GUARD_STATE_KEY, &self.state) {
            tracing::warn!(error = %e, "failed to persist guard state");
        }
        report
    }

    fn evaluate(&self, ctx: &TriggerContext, failed: &mut Vec<TriggerError>) -> Vec<Candidate> {
        let mut candidates = Vec::new();
        for trigger in &self.triggers {
            let kind = trigger.kind();
            let result = panic::catch_unwind(AssertUnwindSafe(|| trigger.evaluate(ctx)))
                .unwrap_or_else(|payload| {
                    Err(TriggerError::Panicked {
                        kind,
                        message: panic_message(payload.as_ref()),
                    })
                });
            match result {
                Ok(Some(candidate)) => candidates.push(candidate),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(trigger = %kind, error = %e, "trigger failed");
                    failed.push(e);
                }
            }
        }
        candidates
    }

    fn fire(&mut self, candidate: &Candidate, now: DateTime<Utc>) -> FiredNudge {
        let nudge = self.composer.compose(candidate, now);
        let outcome = self.dispatcher.dispatch(&nudge);

        let mut item = NudgeHistoryItem::new(nudge.clone(), now);
        item.displayed = outcome.is_displayed();
        self.history.append(item);
        tracing::info!(
            nudge_id = %nudge.id,
            nudge_type = %nudge.nudge_type,
            displayed = outcome.is_displayed(),
            "nudge fired"
        );
        FiredNudge { nudge, outcome }
    }
}

impl std::fmt::Debug for NudgeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NudgeEngine")
            .field("triggers", &self.triggers.len())
            .field("guard", &self.guard)
            .field("ticks", &self.ticks)
            .finish_non_exhaustive()
    }
}

/// Priority high to low, then soonest natural order, then type.
fn rank(a: &Candidate, b: &Candidate) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then_with(|| {
            (a.order_key.is_none(), a.order_key).cmp(&(b.order_key.is_none(), b.order_key))
        })
        .then_with(|| a.nudge_type.cmp(&b.nudge_type))
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
