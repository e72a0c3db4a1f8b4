//! All trackers of one controller, fed together from a polled frame

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::joystick::{JoystickSettings, JoystickTracker};
use crate::key::Key;
use crate::primary::{PrimaryJoystickTracker, PG_COUNT};
use crate::runtime::InputRuntime;
use crate::steering::{SteeringSettings, SteeringTracker};
use crate::threshold::ThresholdModel;
use crate::Bindable;

/// One joystick sample
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StickSample {
    pub x: i32,
    pub y: i32,
    pub button: bool,
}

/// Everything the trackers need from one poll of the controller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputFrame {
    pub primary: StickSample,
    pub left: StickSample,
    pub right: StickSample,
    pub steering: i32,
    /// PG select buttons, PG 0 first
    pub pg_buttons: [bool; PG_COUNT],
}

/// Plain-data copy of every tracker's editable state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerSettings {
    #[serde(rename = "leftaux", default)]
    pub left: JoystickSettings,
    #[serde(rename = "rightaux", default)]
    pub right: JoystickSettings,
    #[serde(default = "default_primary", with = "pg_map")]
    pub primary: Vec<JoystickSettings>,
    #[serde(default)]
    pub steering: SteeringSettings,
}

fn default_primary() -> Vec<JoystickSettings> {
    vec![JoystickSettings::default(); PG_COUNT]
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self::with_thresholds(ThresholdModel::default())
    }
}

impl TrackerSettings {
    /// Nothing bound, every joystick on `thresholds`
    pub fn with_thresholds(thresholds: ThresholdModel) -> Self {
        let joystick = JoystickSettings::with_thresholds(thresholds);
        Self {
            left: joystick.clone(),
            right: joystick.clone(),
            primary: vec![joystick; PG_COUNT],
            steering: SteeringSettings::default(),
        }
    }

    /// Give `thresholds` to every joystick that has none of its own
    pub fn or_thresholds(self, thresholds: ThresholdModel) -> Self {
        Self {
            left: self.left.or_thresholds(thresholds),
            right: self.right.or_thresholds(thresholds),
            primary: self
                .primary
                .into_iter()
                .map(|pg| pg.or_thresholds(thresholds))
                .collect(),
            steering: self.steering,
        }
    }
}

/// Primary PGs as a table keyed `pg0` .. `pg7`
mod pg_map {
    use super::*;

    pub fn serialize<S: Serializer>(
        groups: &[JoystickSettings],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let map: BTreeMap<String, &JoystickSettings> = groups
            .iter()
            .enumerate()
            .map(|(pg, settings)| (format!("pg{pg}"), settings))
            .collect();
        map.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<JoystickSettings>, D::Error> {
        let mut map = BTreeMap::<String, JoystickSettings>::deserialize(deserializer)?;
        Ok((0..PG_COUNT)
            .map(|pg| map.remove(&format!("pg{pg}")).unwrap_or_default())
            .collect())
    }
}

/// Which tracker a binding or threshold edit targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerId {
    Left,
    Right,
    /// A primary PG, or the live one for `None`
    Primary(Option<usize>),
    Steering,
}

impl fmt::Display for TrackerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackerId::Left => write!(f, "left"),
            TrackerId::Right => write!(f, "right"),
            TrackerId::Primary(None) => write!(f, "primary"),
            TrackerId::Primary(Some(pg)) => write!(f, "primary (PG {})", pg + 1),
            TrackerId::Steering => write!(f, "steering"),
        }
    }
}

impl FromStr for TrackerId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" | "leftaux" => Ok(TrackerId::Left),
            "right" | "rightaux" => Ok(TrackerId::Right),
            "primary" => Ok(TrackerId::Primary(None)),
            "steering" | "wheel" => Ok(TrackerId::Steering),
            other => Err(format!("unknown tracker: {other}")),
        }
    }
}

/// Left and right auxiliary sticks, the primary stick and the wheel
#[derive(Debug, Clone, Default)]
pub struct TrackerSet {
    pub left: JoystickTracker,
    pub right: JoystickTracker,
    pub primary: PrimaryJoystickTracker,
    pub steering: SteeringTracker,
}

impl TrackerSet {
    pub fn from_settings(settings: &TrackerSettings) -> Self {
        Self {
            left: JoystickTracker::from_settings(&settings.left),
            right: JoystickTracker::from_settings(&settings.right),
            primary: PrimaryJoystickTracker::from_settings(&settings.primary),
            steering: SteeringTracker::from_settings(&settings.steering),
        }
    }

    pub fn settings(&self) -> TrackerSettings {
        TrackerSettings {
            left: self.left.settings(),
            right: self.right.settings(),
            primary: self.primary.groups().map(|g| g.settings()).collect(),
            steering: self.steering.settings(),
        }
    }

    /// Replace every tracker's editable state, releasing held keys first
    pub fn apply_settings(&mut self, settings: &TrackerSettings, runtime: &InputRuntime) {
        self.release_all(runtime);
        self.left.apply_settings(&settings.left);
        self.right.apply_settings(&settings.right);
        for pg in 0..PG_COUNT {
            if let (Some(group), Some(s)) = (self.primary.pg_mut(Some(pg)), settings.primary.get(pg)) {
                group.apply_settings(s);
            }
        }
        self.steering.apply_settings(&settings.steering);
    }

    /// Feed one polled frame.
    ///
    /// A pressed PG button switches PGs before the sticks are updated; the
    /// lowest pressed button wins.
    pub fn feed(&mut self, frame: &InputFrame, runtime: &InputRuntime) {
        if let Some(pg) = frame.pg_buttons.iter().position(|pressed| *pressed) {
            self.primary.select_pg(pg, runtime);
        }

        self.left
            .update(frame.left.x, frame.left.y, frame.left.button, runtime);
        self.right
            .update(frame.right.x, frame.right.y, frame.right.button, runtime);
        self.primary.update(
            frame.primary.x,
            frame.primary.y,
            frame.primary.button,
            runtime,
        );
        self.steering.update(frame.steering, runtime);
    }

    pub fn select_pg(&mut self, pg: usize, runtime: &InputRuntime) {
        self.primary.select_pg(pg, runtime);
    }

    pub fn release_all(&mut self, runtime: &InputRuntime) {
        self.left.release_all(runtime);
        self.right.release_all(runtime);
        self.primary.release_all(runtime);
        self.steering.release_all(runtime);
    }

    /// Binding of `slot` on `target`
    pub fn binding(&self, target: TrackerId, slot: usize) -> Option<Key> {
        match target {
            TrackerId::Left => self.left.binding(slot).cloned(),
            TrackerId::Right => self.right.binding(slot).cloned(),
            TrackerId::Primary(pg) => self.primary.pg(pg)?.binding(slot).cloned(),
            TrackerId::Steering => self.steering.binding(slot).cloned(),
        }
    }

    /// Bind `key` to `slot` on `target`. Returns false when the target or
    /// slot does not exist.
    pub fn set_binding(&mut self, target: TrackerId, slot: usize, key: Key) -> bool {
        fn bind<B: Bindable>(tracker: &mut B, slot: usize, key: Key) -> bool {
            if slot >= tracker.slot_count() {
                return false;
            }
            tracker.set_binding(slot, key);
            true
        }

        match target {
            TrackerId::Left => bind(&mut self.left, slot, key),
            TrackerId::Right => bind(&mut self.right, slot, key),
            TrackerId::Primary(pg) => match self.primary.pg_mut(pg) {
                Some(group) => bind(group, slot, key),
                None => false,
            },
            TrackerId::Steering => bind(&mut self.steering, slot, key),
        }
    }

    /// Joystick tracker behind `target`, `None` for the wheel
    pub fn joystick_mut(&mut self, target: TrackerId) -> Option<&mut JoystickTracker> {
        match target {
            TrackerId::Left => Some(&mut self.left),
            TrackerId::Right => Some(&mut self.right),
            TrackerId::Primary(pg) => self.primary.pg_mut(pg),
            TrackerId::Steering => None,
        }
    }

    /// Every slot binding bound to macro `from` now fires macro `to`
    pub fn rename_macro(&mut self, from: &str, to: &str) {
        fn rename<B: Bindable>(tracker: &mut B, from: &str, to: &str) {
            for slot in 0..tracker.slot_count() {
                let renamed = tracker
                    .binding(slot)
                    .and_then(|key| key.renamed_macro(from, to));
                if let Some(key) = renamed {
                    tracker.set_binding(slot, key);
                }
            }
        }

        rename(&mut self.left, from, to);
        rename(&mut self.right, from, to);
        for pg in 0..PG_COUNT {
            if let Some(group) = self.primary.pg_mut(Some(pg)) {
                rename(group, from, to);
            }
        }
        rename(&mut self.steering, from, to);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::injector::RecordingInjector;
    use crate::key::Modifiers;
    use std::sync::Arc;

    #[test]
    fn test_pg_button_selects_pg() {
        let rt = InputRuntime::new(Arc::new(RecordingInjector::new()));
        let mut set = TrackerSet::default();
        let mut frame = InputFrame::default();
        frame.pg_buttons[4] = true;
        frame.pg_buttons[6] = true;
        set.feed(&frame, &rt);
        assert_eq!(set.primary.current(), 4);
    }

    #[test]
    fn test_bindings_by_target() {
        let mut set = TrackerSet::default();
        let key = Key::new(30, Modifiers::empty());

        assert!(set.set_binding(TrackerId::Primary(Some(2)), 16, key.clone()));
        assert!(!set.set_binding(TrackerId::Primary(Some(8)), 0, key.clone()));
        assert!(!set.set_binding(TrackerId::Steering, 2, key.clone()));
        assert!(set.set_binding(TrackerId::Steering, 1, key.clone()));

        assert_eq!(set.binding(TrackerId::Primary(Some(2)), 16), Some(key.clone()));
        assert_eq!(set.binding(TrackerId::Primary(None), 16), Some(Key::unset()));
        assert_eq!(set.binding(TrackerId::Steering, 1), Some(key));
    }

    #[test]
    fn test_rename_macro_in_bindings() {
        let mut set = TrackerSet::default();
        set.set_binding(TrackerId::Left, 3, Key::from_macro("old"));
        set.set_binding(TrackerId::Primary(Some(7)), 0, Key::from_macro("old"));
        set.rename_macro("old", "new");
        assert_eq!(set.binding(TrackerId::Left, 3), Some(Key::from_macro("new")));
        assert_eq!(
            set.binding(TrackerId::Primary(Some(7)), 0),
            Some(Key::from_macro("new"))
        );
    }

    #[test]
    fn test_settings_roundtrip_through_toml() {
        let mut set = TrackerSet::default();
        set.set_binding(TrackerId::Right, 0, Key::new(17, Modifiers::SHIFT));
        set.primary.pg_mut(Some(5)).unwrap().set_diagonals(true);

        let settings = set.settings();
        let text = toml::to_string(&settings).unwrap();
        assert!(text.contains("[primary.pg5]"));
        let parsed: TrackerSettings = toml::from_str(&text).unwrap();
        assert_eq!(TrackerSet::from_settings(&parsed).settings(), settings);
    }

    #[test]
    fn test_missing_thresholds_take_fallback() {
        let parsed: TrackerSettings = toml::from_str(
            r#"
[leftaux]
sequencer = true

[primary.pg2.thresholds]
short = 15000
far = 20000
"#,
        )
        .unwrap();
        assert_eq!(parsed.left.thresholds, None);

        let fallback = ThresholdModel::new(8000, 25000);
        let set = TrackerSet::from_settings(&parsed.or_thresholds(fallback));
        assert_eq!(*set.left.thresholds(), fallback);
        assert_eq!(*set.right.thresholds(), fallback);
        assert_eq!(*set.primary.pg(Some(0)).unwrap().thresholds(), fallback);
        assert_eq!(
            *set.primary.pg(Some(2)).unwrap().thresholds(),
            ThresholdModel::new(15000, 20000)
        );
    }

    #[test]
    fn test_target_parse() {
        assert_eq!("LeftAux".parse::<TrackerId>(), Ok(TrackerId::Left));
        assert_eq!("wheel".parse::<TrackerId>(), Ok(TrackerId::Steering));
        assert!("middle".parse::<TrackerId>().is_err());
    }
}
