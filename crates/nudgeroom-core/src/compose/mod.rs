//! Message composition.
//!
//! Turns an admitted [`Candidate`] into a user-facing [`Nudge`] by picking one
//! of the type's templates and substituting `{variable}` placeholders.

mod catalog;

pub use catalog::{templates, Template};

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use rand::prelude::*;
use rand_pcg::Mcg128Xsl64;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::nudge::{Candidate, Nudge, NudgeType, TemplateVars};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid placeholder regex"));

/// Message catalog language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ja,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::En, Locale::Ja];

    pub fn as_str(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Ja => "ja",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "en" => Ok(Locale::En),
            "ja" => Ok(Locale::Ja),
            other => Err(format!("unknown locale: {other}")),
        }
    }
}

/// Picks templates and fills them in.
pub struct MessageComposer {
    locale: Locale,
    rng: Box<dyn RngCore + Send>,
}

impl MessageComposer {
    /// Composer with an entropy-seeded generator.
    pub fn new(locale: Locale) -> Self {
        Self::with_rng(locale, Mcg128Xsl64::from_entropy())
    }

    /// Deterministic composer for tests and replays.
    pub fn seeded(locale: Locale, seed: u64) -> Self {
        Self::with_rng(locale, Mcg128Xsl64::seed_from_u64(seed))
    }

    pub fn with_rng(locale: Locale, rng: impl RngCore + Send + 'static) -> Self {
        Self {
            locale,
            rng: Box::new(rng),
        }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn set_locale(&mut self, locale: Locale) {
        self.locale = locale;
    }

    /// Build the nudge for `candidate`, decided at `now`.
    pub fn compose(&mut self, candidate: &Candidate, now: DateTime<Utc>) -> Nudge {
        let choices = templates(self.locale, candidate.nudge_type);
        let template = choices[self.rng.gen_range(0..choices.len())];
        let nudge_type = candidate.nudge_type;

        Nudge {
            id: Uuid::new_v4().to_string(),
            nudge_type,
            priority: candidate.priority,
            title: fill(template.title, &candidate.vars, nudge_type),
            body: fill(template.body, &candidate.vars, nudge_type),
            emoji: nudge_type.emoji().to_string(),
            tone: template.tone,
            actions: candidate.actions.clone(),
            related_data: candidate.related_data.clone(),
            created_at: now,
        }
    }
}

impl fmt::Debug for MessageComposer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageComposer")
            .field("locale", &self.locale)
            .finish_non_exhaustive()
    }
}

/// Substitute `{name}` placeholders. Unknown names are dropped.
pub fn fill(template: &str, vars: &TemplateVars, nudge_type: NudgeType) -> String {
    let mut missing = false;
    let filled = PLACEHOLDER.replace_all(template, |caps: &Captures| {
        match vars.get(&caps[1]) {
            Some(value) => value.clone(),
            None => {
                tracing::warn!(nudge_type = %nudge_type, placeholder = &caps[1], "missing template variable");
                missing = true;
                String::new()
            }
        }
    });
    if missing {
        // Stripping can leave doubled or dangling spaces.
        filled.split_whitespace().collect::<Vec<_>>().join(" ")
    } else {
        filled.into_owned()
    }
}
