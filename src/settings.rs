use anyhow::{bail, Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// User preferences persisted as `settings.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    pub eye_rest_interval_min: u32,
    pub eye_rest_duration_sec: u32,
    pub posture_interval_min: u32,
    pub posture_duration_sec: u32,
    /// 0 disables work breaks.
    pub work_interval_min: u32,
    pub work_break_min_sec: u32,
    pub work_break_max_sec: u32,
    pub sound_enabled: bool,
    /// Added once to the first posture countdown so it does not line up with eye rest.
    pub posture_stagger_sec: u32,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            eye_rest_interval_min: 60,
            eye_rest_duration_sec: 30,
            posture_interval_min: 10,
            posture_duration_sec: 10,
            work_interval_min: 0,
            work_break_min_sec: 30,
            work_break_max_sec: 300,
            sound_enabled: true,
            posture_stagger_sec: 0,
        }
    }
}

impl Configuration {
    pub fn validate(&self) -> Result<()> {
        if self.eye_rest_interval_min == 0 {
            bail!("eye rest interval must be at least one minute");
        }
        if self.eye_rest_duration_sec == 0 {
            bail!("eye rest duration must be at least one second");
        }
        if self.posture_interval_min == 0 {
            bail!("posture interval must be at least one minute");
        }
        if self.posture_duration_sec == 0 {
            bail!("posture duration must be at least one second");
        }
        if self.work_break_min_sec == 0 {
            bail!("work break minimum must be at least one second");
        }
        if self.work_break_min_sec > self.work_break_max_sec {
            bail!(
                "work break minimum ({}s) exceeds maximum ({}s)",
                self.work_break_min_sec,
                self.work_break_max_sec
            );
        }
        Ok(())
    }

    /// Applies `patch` on top of `self` and validates the result without touching `self`.
    pub fn merged(&self, patch: &ConfigurationPatch) -> Result<Configuration> {
        let mut next = self.clone();
        if let Some(value) = patch.eye_rest_interval_min {
            next.eye_rest_interval_min = value;
        }
        if let Some(value) = patch.eye_rest_duration_sec {
            next.eye_rest_duration_sec = value;
        }
        if let Some(value) = patch.posture_interval_min {
            next.posture_interval_min = value;
        }
        if let Some(value) = patch.posture_duration_sec {
            next.posture_duration_sec = value;
        }
        if let Some(value) = patch.work_interval_min {
            next.work_interval_min = value;
        }
        if let Some(value) = patch.work_break_min_sec {
            next.work_break_min_sec = value;
        }
        if let Some(value) = patch.work_break_max_sec {
            next.work_break_max_sec = value;
        }
        if let Some(value) = patch.sound_enabled {
            next.sound_enabled = value;
        }
        if let Some(value) = patch.posture_stagger_sec {
            next.posture_stagger_sec = value;
        }
        next.validate()?;
        Ok(next)
    }

    /// Replaces every invalid field with its default. The work-break range is
    /// treated as a pair so a reversed range never survives.
    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if self.eye_rest_interval_min == 0 {
            self.eye_rest_interval_min = defaults.eye_rest_interval_min;
        }
        if self.eye_rest_duration_sec == 0 {
            self.eye_rest_duration_sec = defaults.eye_rest_duration_sec;
        }
        if self.posture_interval_min == 0 {
            self.posture_interval_min = defaults.posture_interval_min;
        }
        if self.posture_duration_sec == 0 {
            self.posture_duration_sec = defaults.posture_duration_sec;
        }
        if self.work_break_min_sec == 0 || self.work_break_min_sec > self.work_break_max_sec {
            warn!(
                "Invalid work break range {}..={}s in settings; using defaults",
                self.work_break_min_sec, self.work_break_max_sec
            );
            self.work_break_min_sec = defaults.work_break_min_sec;
            self.work_break_max_sec = defaults.work_break_max_sec;
        }
        self
    }
}

/// Partial update sent by the settings surface. Absent fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigurationPatch {
    pub eye_rest_interval_min: Option<u32>,
    pub eye_rest_duration_sec: Option<u32>,
    pub posture_interval_min: Option<u32>,
    pub posture_duration_sec: Option<u32>,
    pub work_interval_min: Option<u32>,
    pub work_break_min_sec: Option<u32>,
    pub work_break_max_sec: Option<u32>,
    pub sound_enabled: Option<bool>,
    pub posture_stagger_sec: Option<u32>,
}

pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Never fails: a missing or unreadable file yields defaults and is left on disk
    /// untouched until the next [`SettingsStore::save`].
    pub fn load(&self) -> Configuration {
        if !self.path.exists() {
            info!(
                "No settings at {}; starting with defaults",
                self.path.display()
            );
            return Configuration::default();
        }

        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) => {
                warn!(
                    "Failed to read settings from {}: {err}; using defaults",
                    self.path.display()
                );
                return Configuration::default();
            }
        };

        match serde_json::from_str::<Value>(&contents) {
            Ok(value) => merge_over_defaults(value),
            Err(err) => {
                warn!(
                    "Settings at {} are not valid JSON ({err}); using defaults",
                    self.path.display()
                );
                Configuration::default()
            }
        }
    }

    /// Writes a sibling temp file and renames it over the target.
    pub fn save(&self, config: &Configuration) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let serialized = serde_json::to_string_pretty(config)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, serialized)
            .with_context(|| format!("Failed to write settings to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path).with_context(|| {
            format!(
                "Failed to move {} into place at {}",
                tmp_path.display(),
                self.path.display()
            )
        })
    }
}

fn merge_over_defaults(value: Value) -> Configuration {
    let defaults = Configuration::default();
    let Value::Object(persisted) = value else {
        warn!("Settings document is not an object; using defaults");
        return defaults;
    };

    let mut merged = match serde_json::to_value(&defaults) {
        Ok(Value::Object(map)) => map,
        _ => return defaults,
    };

    for (key, candidate) in persisted {
        if !merged.contains_key(&key) {
            warn!("Ignoring unknown settings key '{key}'");
            continue;
        }
        let previous = merged.insert(key.clone(), candidate);
        if !deserializes(&merged) {
            warn!("Ignoring ill-typed settings value for '{key}'");
            if let Some(previous) = previous {
                merged.insert(key, previous);
            }
        }
    }

    serde_json::from_value::<Configuration>(Value::Object(merged))
        .unwrap_or_default()
        .sanitized()
}

fn deserializes(map: &Map<String, Value>) -> bool {
    serde_json::from_value::<Configuration>(Value::Object(map.clone())).is_ok()
}
