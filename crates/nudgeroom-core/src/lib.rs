//! # Nudgeroom Core Library
//!
//! This library provides the rule-driven nudge engine of a personal
//! productivity assistant. It implements a CLI-first philosophy where all
//! operations are available via a standalone CLI binary; any GUI is a thin
//! layer over the same core library.
//!
//! ## Architecture
//!
//! - **Triggers**: Independent rules that inspect the user's context (tasks,
//!   calendar, focus session, time of day) and propose nudges
//! - **Guard**: Cooldowns, daily caps and quiet hours, with explicit state
//! - **Composer**: Localized message templates with an injectable RNG
//! - **Engine**: A synchronous `tick()` that wires the above together
//! - **Scheduler**: A tokio interval loop with explicit start/stop
//! - **Storage**: Key-value persistence (SQLite or memory) and TOML configuration
//!
//! ## Key Components
//!
//! - [`NudgeEngine`]: One tick at a time
//! - [`NudgeScheduler`]: Periodic driver
//! - [`Guard`]: Admission policy
//! - [`HistoryStore`]: Fired nudge history
//! - [`Config`]: Engine configuration management

pub mod clock;
pub mod compose;
pub mod context;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod guard;
pub mod history;
pub mod nudge;
pub mod scheduler;
pub mod storage;
pub mod triggers;

pub use clock::{Clock, ManualClock, SystemClock};
pub use compose::{Locale, MessageComposer};
pub use context::{
    ContextEvent, ContextSnapshot, ContextSource, ContextTask, FocusSession, JsonFileContext,
    SharedContext, TriggerContext,
};
pub use dispatch::{
    DispatchOutcome, Dispatcher, MemoryChannel, NudgeEvent, PushChannel, PushPayload,
};
pub use engine::{FiredNudge, NudgeEngine, TickReport};
pub use error::{ConfigError, CoreError, PushError, StorageError, TriggerError};
pub use guard::{
    Admission, CooldownRules, Guard, GuardState, Intensity, NudgeLimits, QuietHours, Rejection,
};
pub use history::HistoryStore;
pub use nudge::{Candidate, Nudge, NudgeAction, NudgeHistoryItem, NudgePriority, NudgeType, Tone};
pub use scheduler::{NudgeScheduler, SchedulerState};
pub use storage::{Config, KvStore, MemoryStore, SqliteStore};
pub use triggers::{build_triggers, Trigger};
