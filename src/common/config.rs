use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::snap_engine::Alignment;

pub fn config_file() -> Option<PathBuf> { dirs::home_dir().map(|home| home.join(".palette-dock.toml")) }

/// Shape of an animation's progress curve over normalized time.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, Default, Hash, Display, EnumString)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum AnimationEasing {
    #[serde(alias = "linear")]
    Linear,
    #[serde(alias = "ease_in")]
    EaseIn,
    #[serde(alias = "ease_out")]
    EaseOut,
    #[default]
    #[serde(alias = "ease_in_out")]
    EaseInOut,
}

impl AnimationEasing {
    /// Maps normalized time to progress. `t` is clamped to `[0, 1]` first.
    pub fn apply(self, t: f64) -> f64 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            AnimationEasing::Linear => t,
            AnimationEasing::EaseIn => t * t,
            AnimationEasing::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            AnimationEasing::EaseInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - f64::powi(-2.0 * t + 2.0, 3) / 2.0
                }
            }
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub animation: AnimationSettings,
    #[serde(default)]
    pub snap: SnapSettings,
    #[serde(default)]
    pub input: InputSettings,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct AnimationSettings {
    /// Interval between animation frames while anything is animating.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Easing used when an animate request does not name one.
    #[serde(default)]
    pub default_easing: AnimationEasing,
    /// Duration used when an animate request does not give one.
    #[serde(default = "default_duration_ms")]
    pub default_duration_ms: f64,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct SnapSettings {
    /// Gap (logical pixels) for bindings created by dropping a dragged window
    /// near a target.
    #[serde(default = "default_gap")]
    pub default_gap: f64,
    /// Alignment for bindings created by dropping a dragged window near a
    /// target.
    #[serde(default)]
    pub default_alignment: Alignment,
    /// Proximity threshold (logical pixels) for auto-snap configs that do not
    /// specify one.
    #[serde(default = "default_proximity_threshold")]
    pub default_proximity_threshold: f64,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct InputSettings {
    /// Maximum number of pending cross-thread input events.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            default_easing: AnimationEasing::default(),
            default_duration_ms: default_duration_ms(),
        }
    }
}

impl Default for SnapSettings {
    fn default() -> Self {
        Self {
            default_gap: default_gap(),
            default_alignment: Alignment::default(),
            default_proximity_threshold: default_proximity_threshold(),
        }
    }
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl AnimationSettings {
    pub fn tick_interval(&self) -> Duration { Duration::from_millis(self.tick_interval_ms.max(1)) }

    pub fn default_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.default_duration_ms / 1000.0).unwrap_or_default()
    }

    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.tick_interval_ms == 0 {
            issues.push("animation.tick_interval_ms must be positive".to_string());
        }

        if !(self.default_duration_ms >= 0.0) {
            issues.push(format!(
                "animation.default_duration_ms must be non-negative, got {}",
                self.default_duration_ms
            ));
        }

        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = 0;

        if self.tick_interval_ms == 0 {
            self.tick_interval_ms = default_tick_interval_ms();
            fixes += 1;
        }

        if !(self.default_duration_ms >= 0.0) {
            self.default_duration_ms = default_duration_ms();
            fixes += 1;
        }

        fixes
    }
}

impl SnapSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !self.default_gap.is_finite() {
            issues.push(format!("snap.default_gap must be finite, got {}", self.default_gap));
        }

        if !(self.default_proximity_threshold > 0.0) {
            issues.push(format!(
                "snap.default_proximity_threshold must be positive, got {}",
                self.default_proximity_threshold
            ));
        }

        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = 0;

        if !self.default_gap.is_finite() {
            self.default_gap = default_gap();
            fixes += 1;
        }

        if !(self.default_proximity_threshold > 0.0) {
            self.default_proximity_threshold = default_proximity_threshold();
            fixes += 1;
        }

        fixes
    }
}

impl InputSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.queue_capacity == 0 {
            issues.push("input.queue_capacity must be at least 1".to_string());
        }
        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        if self.queue_capacity == 0 {
            self.queue_capacity = default_queue_capacity();
            return 1;
        }
        0
    }
}

fn default_tick_interval_ms() -> u64 { 16 }

fn default_duration_ms() -> f64 { 200.0 }

fn default_gap() -> f64 { 4.0 }

fn default_proximity_threshold() -> f64 { 50.0 }

fn default_queue_capacity() -> usize { 256 }

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Config> {
        let buf = std::fs::read_to_string(path)?;
        Self::parse(&buf)
    }

    /// Reads the user config if it exists, otherwise the built-in defaults.
    pub fn load() -> anyhow::Result<Config> {
        match config_file() {
            Some(path) if path.exists() => Self::read(&path),
            _ => Ok(Self::builtin()),
        }
    }

    pub fn builtin() -> Config {
        Self::parse(include_str!("../../palette.default.toml"))
            .expect("embedded default config must parse")
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let toml_string = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, toml_string.as_bytes())?;
        Ok(())
    }

    /// Validates the entire configuration and returns a list of issues found.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        issues.extend(self.animation.validate());
        issues.extend(self.snap.validate());
        issues.extend(self.input.validate());
        issues
    }

    /// Attempts to fix configuration values automatically.
    /// Returns the number of fixes applied.
    pub fn auto_fix_values(&mut self) -> usize {
        self.animation.auto_fix_values() + self.snap.auto_fix_values() + self.input.auto_fix_values()
    }

    fn parse(buf: &str) -> anyhow::Result<Config> {
        let config: Config = toml::from_str(buf)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn builtin_config_parses() {
        let config = Config::builtin();
        assert_eq!(config, Config::default());
        assert!(config.validate().is_empty());
    }

    #[test]
    fn empty_file_uses_defaults() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::parse("[snap]\nsnap_everything = true\n").is_err());
    }

    #[test]
    fn easing_accepts_both_spellings() {
        let config = Config::parse("[animation]\ndefault_easing = \"ease_out\"\n").unwrap();
        assert_eq!(config.animation.default_easing, AnimationEasing::EaseOut);
        let config = Config::parse("[animation]\ndefault_easing = \"easeIn\"\n").unwrap();
        assert_eq!(config.animation.default_easing, AnimationEasing::EaseIn);
        assert_eq!("easeInOut".parse::<AnimationEasing>().unwrap(), AnimationEasing::EaseInOut);
    }

    #[test]
    fn auto_fix_repairs_invalid_values() {
        let mut config = Config::default();
        config.animation.tick_interval_ms = 0;
        config.snap.default_proximity_threshold = -3.0;
        config.input.queue_capacity = 0;
        assert_eq!(config.validate().len(), 3);
        assert_eq!(config.auto_fix_values(), 3);
        assert!(config.validate().is_empty());
        assert_eq!(config.animation.tick_interval_ms, 16);
    }

    #[test]
    fn save_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("palette.toml");
        let mut config = Config::default();
        config.snap.default_gap = 8.0;
        config.snap.default_alignment = Alignment::Leading;
        config.save(&path).unwrap();
        assert_eq!(Config::read(&path).unwrap(), config);
    }

    #[test]
    fn easing_boundaries() {
        for easing in [
            AnimationEasing::Linear,
            AnimationEasing::EaseIn,
            AnimationEasing::EaseOut,
            AnimationEasing::EaseInOut,
        ] {
            assert_eq!(easing.apply(0.0), 0.0, "{easing}");
            assert_eq!(easing.apply(1.0), 1.0, "{easing}");
            assert_eq!(easing.apply(-1.0), 0.0, "{easing}");
            assert_eq!(easing.apply(2.0), 1.0, "{easing}");
        }
        assert_eq!(AnimationEasing::EaseInOut.apply(0.5), 0.5);
        assert_eq!(AnimationEasing::EaseIn.apply(0.5), 0.25);
        assert_eq!(AnimationEasing::EaseOut.apply(0.5), 0.75);
    }

    #[test]
    fn easings_are_monotonic() {
        for easing in [
            AnimationEasing::Linear,
            AnimationEasing::EaseIn,
            AnimationEasing::EaseOut,
            AnimationEasing::EaseInOut,
        ] {
            let mut prev = 0.0;
            for i in 0..=100 {
                let v = easing.apply(i as f64 / 100.0);
                assert!(v >= prev, "{easing} not monotonic at {i}");
                prev = v;
            }
        }
    }
}
