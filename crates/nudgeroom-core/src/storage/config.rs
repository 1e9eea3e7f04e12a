//! TOML-based engine configuration.
//!
//! Stores user preferences including:
//! - Intensity preset and message locale
//! - Scheduler tick interval and history retention
//! - Quiet hours
//! - Per-trigger toggles and thresholds
//! - Cooldown and daily-cap overrides on top of the preset
//!
//! Configuration is stored at `~/.config/nudgeroom/config.toml`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::{data_dir, read_json, write_json, KvStore, SETTINGS_KEY};
use crate::compose::Locale;
use crate::error::{ConfigError, StorageError};
use crate::guard::{Guard, Intensity, QuietHours};
use crate::nudge::NudgeType;
use crate::triggers::build_triggers;

/// Map-valued sections that accept keys not present in the defaults.
const OPEN_MAPS: [&str; 2] = ["cooldowns", "limits.per_type"];

/// Scheduler configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_tick_interval")]
    pub tick_interval_secs: u64,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

/// Quiet hours configuration. Times are local `HH:MM`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuietHoursConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_quiet_start")]
    pub start: String,
    #[serde(default = "default_quiet_end")]
    pub end: String,
}

/// Trigger toggles and thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggersConfig {
    pub morning_briefing: bool,
    /// `HH:MM-HH:MM`
    pub briefing_window: String,
    pub evening_wrapup: bool,
    pub wrapup_window: String,
    pub meeting_reminder: bool,
    pub meeting_lead_minutes: Vec<u32>,
    pub focus_suggest: bool,
    pub peak_windows: Vec<String>,
    pub task_nudge: bool,
    pub task_neglect_hours: u32,
    pub overload_warn: bool,
    pub overload_span_hours: u32,
    pub overload_threshold: u32,
    pub rest_suggest: bool,
    pub rest_after_minutes: u32,
    pub late_warning: bool,
    pub departure_alert: bool,
    pub default_travel_minutes: u32,
    pub departure_buffer_minutes: u32,
    pub departure_tolerance_minutes: u32,
    pub streak_celebrate: bool,
    pub streak_milestones: Vec<u32>,
}

/// Daily cap overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Replaces the preset's global cap when set.
    #[serde(default)]
    pub global: Option<u32>,
    /// Per-type caps keyed by wire name, e.g. `task_nudge = 3`.
    #[serde(default)]
    pub per_type: BTreeMap<String, u32>,
}

/// Engine configuration.
///
/// Serialized to/from TOML at `~/.config/nudgeroom/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub intensity: Intensity,
    #[serde(default)]
    pub locale: Locale,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub quiet_hours: QuietHoursConfig,
    #[serde(default)]
    pub triggers: TriggersConfig,
    /// Cooldown overrides in minutes keyed by wire name.
    #[serde(default)]
    pub cooldowns: BTreeMap<String, u32>,
    #[serde(default)]
    pub limits: LimitsConfig,
}

// Default functions
fn default_tick_interval() -> u64 {
    60
}
fn default_history_limit() -> usize {
    200
}
fn default_true() -> bool {
    true
}
fn default_quiet_start() -> String {
    "22:00".into()
}
fn default_quiet_end() -> String {
    "08:00".into()
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: default_tick_interval(),
            history_limit: default_history_limit(),
        }
    }
}

impl Default for QuietHoursConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            start: default_quiet_start(),
            end: default_quiet_end(),
        }
    }
}

impl Default for TriggersConfig {
    fn default() -> Self {
        Self {
            morning_briefing: true,
            briefing_window: "07:30-10:00".into(),
            evening_wrapup: true,
            wrapup_window: "18:00-21:00".into(),
            meeting_reminder: true,
            meeting_lead_minutes: vec![15, 5],
            focus_suggest: true,
            peak_windows: vec!["09:00-11:30".into(), "14:00-16:00".into()],
            task_nudge: true,
            task_neglect_hours: 24,
            overload_warn: true,
            overload_span_hours: 8,
            overload_threshold: 5,
            rest_suggest: true,
            rest_after_minutes: 90,
            late_warning: true,
            departure_alert: true,
            default_travel_minutes: 20,
            departure_buffer_minutes: 5,
            departure_tolerance_minutes: 10,
            streak_celebrate: true,
            streak_milestones: vec![3, 7, 14, 30, 50, 100],
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            intensity: Intensity::default(),
            locale: Locale::default(),
            scheduler: SchedulerConfig::default(),
            quiet_hours: QuietHoursConfig::default(),
            triggers: TriggersConfig::default(),
            cooldowns: BTreeMap::new(),
            limits: LimitsConfig::default(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let (parent_path, leaf) = match key.rsplit_once('.') {
            Some((parent, leaf)) => (Some(parent), leaf),
            None => (None, key),
        };
        if leaf.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        if let Some(parent_path) = parent_path {
            for part in parent_path.split('.') {
                current = current.get_mut(part).ok_or_else(unknown)?;
            }
        }
        let open_map = parent_path.is_some_and(|p| OPEN_MAPS.contains(&p));
        let obj = current.as_object_mut().ok_or_else(unknown)?;

        let new_value = match obj.get(leaf) {
            Some(serde_json::Value::Bool(_)) => serde_json::Value::Bool(
                value
                    .parse::<bool>()
                    .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
            ),
            Some(serde_json::Value::Number(_)) => parse_number(value)
                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?,
            Some(serde_json::Value::Object(_)) | Some(serde_json::Value::Array(_)) => {
                serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
            }
            // Optional fields currently unset.
            Some(serde_json::Value::Null) => match value {
                "" | "none" => serde_json::Value::Null,
                _ => parse_number(value)
                    .unwrap_or_else(|| serde_json::Value::String(value.into())),
            },
            Some(serde_json::Value::String(_)) => serde_json::Value::String(value.into()),
            None if open_map => parse_number(value)
                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?,
            None => return Err(unknown()),
        };

        obj.insert(leaf.to_string(), new_value);
        Ok(())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("config.toml"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from the default location, writing defaults on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// defaults cannot be written.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Settings stored in the key-value store. Missing or corrupt data
    /// yields defaults.
    pub fn load_from_store(store: &dyn KvStore) -> Self {
        read_json(store, SETTINGS_KEY).unwrap_or_default()
    }

    /// # Errors
    /// Returns an error if the store write fails.
    pub fn save_to_store(&self, store: &dyn KvStore) -> Result<(), StorageError> {
        write_json(store, SETTINGS_KEY, self)
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// All leaf values as `(dot.path, value)` pairs, sorted by key.
    pub fn entries(&self) -> Vec<(String, String)> {
        fn walk(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
            match value {
                serde_json::Value::Object(map) => {
                    for (k, v) in map {
                        let path = if prefix.is_empty() {
                            k.clone()
                        } else {
                            format!("{prefix}.{k}")
                        };
                        walk(&path, v, out);
                    }
                }
                serde_json::Value::String(s) => out.push((prefix.to_string(), s.clone())),
                other => out.push((prefix.to_string(), other.to_string())),
            }
        }

        let mut out = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            walk("", &json, &mut out);
        }
        out.sort();
        out
    }

    /// Set a value by dot-separated key and validate the result.
    ///
    /// The change is not persisted; call [`Config::save`].
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the resulting configuration is invalid. `self` is left unchanged
    /// on error.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Check every value the engine will parse.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for the first bad value found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scheduler.tick_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "scheduler.tick_interval_secs".into(),
                message: "must be greater than zero".into(),
            });
        }
        if self.scheduler.history_limit == 0 {
            return Err(ConfigError::InvalidValue {
                key: "scheduler.history_limit".into(),
                message: "must be greater than zero".into(),
            });
        }
        self.quiet_hours()?;
        build_triggers(&self.triggers)?;
        for key in self.cooldowns.keys() {
            parse_type("cooldowns", key)?;
        }
        for key in self.limits.per_type.keys() {
            parse_type("limits.per_type", key)?;
        }
        Ok(())
    }

    /// # Errors
    /// Returns an error if either bound is not `HH:MM`.
    pub fn quiet_hours(&self) -> Result<QuietHours, ConfigError> {
        QuietHours::parse(
            self.quiet_hours.enabled,
            &self.quiet_hours.start,
            &self.quiet_hours.end,
        )
    }

    /// Guard for the configured preset with overrides applied.
    ///
    /// # Errors
    /// Returns an error if quiet hours or an override key is invalid.
    pub fn guard(&self) -> Result<Guard, ConfigError> {
        let mut cooldowns = self.intensity.cooldowns();
        for (key, minutes) in &self.cooldowns {
            cooldowns.set(
                parse_type("cooldowns", key)?,
                Duration::minutes(i64::from(*minutes)),
            );
        }
        let mut limits = self.intensity.limits();
        if let Some(global) = self.limits.global {
            limits.global = global;
        }
        for (key, cap) in &self.limits.per_type {
            limits.set_per_type(parse_type("limits.per_type", key)?, *cap);
        }
        Ok(Guard::new(cooldowns, limits, self.quiet_hours()?))
    }

    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.scheduler.tick_interval_secs)
    }
}

fn parse_number(value: &str) -> Option<serde_json::Value> {
    if let Ok(n) = value.parse::<u64>() {
        Some(serde_json::Value::Number(n.into()))
    } else {
        value
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(serde_json::Value::Number)
    }
}

fn parse_type(section: &str, key: &str) -> Result<NudgeType, ConfigError> {
    key.parse::<NudgeType>().map_err(|message| ConfigError::InvalidValue {
        key: format!("{section}.{key}"),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
        assert_eq!(parsed.scheduler.tick_interval_secs, 60);
        assert_eq!(parsed.quiet_hours.start, "22:00");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str(
            "intensity = \"minimal\"\n[triggers]\nrest_after_minutes = 60\n",
        )
        .unwrap();
        assert_eq!(parsed.intensity, Intensity::Minimal);
        assert_eq!(parsed.triggers.rest_after_minutes, 60);
        assert!(parsed.triggers.meeting_reminder);
        assert_eq!(parsed.scheduler.history_limit, 200);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("quiet_hours.enabled").as_deref(), Some("true"));
        assert_eq!(cfg.get("scheduler.tick_interval_secs").as_deref(), Some("60"));
        assert_eq!(cfg.get("intensity").as_deref(), Some("normal"));
        assert!(cfg.get("quiet_hours.missing_key").is_none());
    }

    #[test]
    fn set_updates_typed_values() {
        let mut cfg = Config::default();
        cfg.set("quiet_hours.enabled", "false").unwrap();
        cfg.set("triggers.rest_after_minutes", "45").unwrap();
        cfg.set("quiet_hours.start", "23:30").unwrap();
        cfg.set("intensity", "frequent").unwrap();
        cfg.set("triggers.meeting_lead_minutes", "[10, 2]").unwrap();
        assert!(!cfg.quiet_hours.enabled);
        assert_eq!(cfg.triggers.rest_after_minutes, 45);
        assert_eq!(cfg.quiet_hours.start, "23:30");
        assert_eq!(cfg.intensity, Intensity::Frequent);
        assert_eq!(cfg.triggers.meeting_lead_minutes, vec![10, 2]);
    }

    #[test]
    fn set_accepts_override_keys() {
        let mut cfg = Config::default();
        cfg.set("cooldowns.task_nudge", "30").unwrap();
        cfg.set("limits.per_type.task_nudge", "1").unwrap();
        cfg.set("limits.global", "5").unwrap();
        assert_eq!(cfg.cooldowns["task_nudge"], 30);

        let guard = cfg.guard().unwrap();
        assert_eq!(guard.cooldowns().get(NudgeType::TaskNudge), Duration::minutes(30));
        assert_eq!(guard.limits().per_type(NudgeType::TaskNudge), Some(1));
        assert_eq!(guard.limits().global, 5);
    }

    #[test]
    fn set_rejects_bad_input_and_leaves_config_untouched() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("quiet_hours.nonexistent", "x"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(cfg.set("quiet_hours.enabled", "not_a_bool").is_err());
        assert!(matches!(
            cfg.set("quiet_hours.start", "25:00"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(cfg.set("scheduler.tick_interval_secs", "0").is_err());
        assert!(cfg.set("cooldowns.bogus_type", "5").is_err());
        assert!(cfg.set("intensity", "extreme").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn load_from_writes_defaults_then_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());

        let mut changed = cfg.clone();
        changed.set("locale", "ja").unwrap();
        changed.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().locale, Locale::Ja);
    }

    #[test]
    fn load_from_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "intensity = [").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }

    #[test]
    fn store_settings_fall_back_to_defaults() {
        let store = MemoryStore::new();
        assert_eq!(Config::load_from_store(&store), Config::default());
        store.set(SETTINGS_KEY, "garbage").unwrap();
        assert_eq!(Config::load_from_store(&store), Config::default());

        let mut cfg = Config::default();
        cfg.intensity = Intensity::Minimal;
        cfg.save_to_store(&store).unwrap();
        assert_eq!(Config::load_from_store(&store).intensity, Intensity::Minimal);
    }

    #[test]
    fn entries_lists_leaf_paths() {
        let entries = Config::default().entries();
        assert!(entries
            .iter()
            .any(|(k, v)| k == "quiet_hours.end" && v == "08:00"));
        assert!(entries.iter().any(|(k, _)| k == "triggers.task_neglect_hours"));
    }
}
