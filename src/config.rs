//! Persistent driver profile
//!
//! One TOML file holds thresholds, every tracker's bindings, light color,
//! polling cadence, the controller layout and all macros.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use pla_input::{ActionList, MacroEngine, ThresholdModel, TrackerSet, TrackerSettings};
use pla_transport::{color_bytes, Rgb};

use crate::layout::ControllerLayout;

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid profile {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize profile: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Light color as stored in the profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorSettings {
    #[serde(default = "default_channel")]
    pub red: u8,
    #[serde(default = "default_channel")]
    pub green: u8,
    #[serde(default = "default_channel")]
    pub blue: u8,
    /// Percent, 0-100
    #[serde(default = "default_brightness")]
    pub brightness: u8,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_channel() -> u8 {
    255
}
fn default_brightness() -> u8 {
    20
}
fn default_true() -> bool {
    true
}

impl Default for ColorSettings {
    fn default() -> Self {
        Self {
            red: default_channel(),
            green: default_channel(),
            blue: default_channel(),
            brightness: default_brightness(),
            enabled: true,
        }
    }
}

impl ColorSettings {
    pub fn rgb(&self) -> Rgb {
        Rgb::new(self.red, self.green, self.blue)
    }

    pub fn set_rgb(&mut self, color: Rgb) {
        self.red = color.r;
        self.green = color.g;
        self.blue = color.b;
    }

    /// Color to send to the controller
    pub fn wire_color(&self) -> Rgb {
        color_bytes(self.rgb(), self.brightness, self.enabled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollingSettings {
    #[serde(default = "default_input_update")]
    pub input_update_ms: u64,
    #[serde(default = "default_connection_check")]
    pub connection_check_ms: u64,
}

fn default_input_update() -> u64 {
    10
}
fn default_connection_check() -> u64 {
    1000
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            input_update_ms: default_input_update(),
            connection_check_ms: default_connection_check(),
        }
    }
}

impl PollingSettings {
    pub fn input_update(&self) -> Duration {
        Duration::from_millis(self.input_update_ms.max(1))
    }

    pub fn connection_check(&self) -> Duration {
        Duration::from_millis(self.connection_check_ms.max(1))
    }
}

/// Complete driver profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Thresholds for joysticks without a `thresholds` table of their own
    #[serde(default)]
    pub thresholds: ThresholdModel,
    #[serde(default)]
    pub keys: TrackerSettings,
    #[serde(default)]
    pub color: ColorSettings,
    #[serde(default)]
    pub polling: PollingSettings,
    #[serde(default)]
    pub layout: ControllerLayout,
    #[serde(default)]
    pub macros: BTreeMap<String, ActionList>,
}

impl Default for Profile {
    fn default() -> Self {
        let thresholds = ThresholdModel::default();
        Self {
            thresholds,
            keys: TrackerSettings::with_thresholds(thresholds),
            color: ColorSettings::default(),
            polling: PollingSettings::default(),
            layout: ControllerLayout::default(),
            macros: BTreeMap::new(),
        }
    }
}

impl Profile {
    /// Get the default profile path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pla")
            .join("profile.toml")
    }

    /// Load a profile from a file, or return the default if not found
    pub fn load(path: &Path) -> Result<Self, ProfileError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ProfileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ProfileError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save the profile, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), ProfileError> {
        let write_err = |source| ProfileError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(write_err)
    }

    /// Tracker settings with `thresholds` filled in where a joystick has
    /// none of its own
    pub fn tracker_settings(&self) -> TrackerSettings {
        self.keys.clone().or_thresholds(self.thresholds)
    }

    pub fn trackers(&self) -> TrackerSet {
        TrackerSet::from_settings(&self.tracker_settings())
    }

    pub fn macro_engine(&self) -> MacroEngine {
        MacroEngine::from_map(self.macros.clone())
    }

    /// Take over the live tracker and macro state
    pub fn capture(&mut self, trackers: &TrackerSet, macros: &MacroEngine) {
        self.keys = trackers.settings();
        self.macros = macros.snapshot();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pla_input::{Action, DelayType, Key, Modifiers, TrackerId};

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("pla-profile-does-not-exist/profile.toml");
        let profile = Profile::load(&path).unwrap();
        assert_eq!(profile, Profile::default());
        assert_eq!(profile.polling.input_update(), Duration::from_millis(10));
        assert_eq!(profile.polling.connection_check(), Duration::from_secs(1));
    }

    #[test]
    fn test_wire_color() {
        let mut color = ColorSettings::default();
        assert_eq!(color.wire_color(), Rgb::new(51, 51, 51));

        color.set_rgb(Rgb::new(200, 0, 100));
        color.brightness = 50;
        assert_eq!(color.wire_color(), Rgb::new(100, 0, 50));

        color.enabled = false;
        assert_eq!(color.wire_color(), Rgb::default());
    }

    #[test]
    fn test_sections_written() {
        let mut profile = Profile::default();
        let mut trackers = profile.trackers();
        trackers.set_binding(TrackerId::Left, 0, Key::new(17, Modifiers::SHIFT));
        let macros = MacroEngine::new();
        macros.replace(
            "greet",
            ActionList::new(
                vec![Action::new(Key::new(35, Modifiers::empty()), true, Duration::ZERO)],
                DelayType::None,
            ),
        );
        profile.capture(&trackers, &macros);

        let text = toml::to_string_pretty(&profile).unwrap();
        assert!(text.contains("[keys.leftaux"));
        assert!(text.contains("[keys.primary.pg7"));
        assert!(text.contains("[color]"));
        assert!(text.contains("[polling]"));
        assert!(text.contains("[macros.greet]"));
    }

    #[test]
    fn test_partial_profile() {
        let profile: Profile = toml::from_str(
            r#"
[color]
red = 10
enabled = false
"#,
        )
        .unwrap();
        assert_eq!(profile.color.red, 10);
        assert_eq!(profile.color.green, 255);
        assert!(!profile.color.enabled);
        assert_eq!(profile.polling, PollingSettings::default());
        assert_eq!(profile.keys, TrackerSettings::default());
    }
}
