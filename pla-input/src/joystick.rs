//! Joystick tracker: turns (x, y, button) samples into slot presses
//!
//! Slots 0-15 are directions (see [`crate::mapper`]), slot 16 is the stick
//! button.

use serde::{Deserialize, Serialize};

use crate::key::Key;
use crate::mapper::{ActionMapper, ActionSelection, DIRECTION_SLOTS};
use crate::runtime::InputRuntime;
use crate::sender::KeySender;
use crate::threshold::ThresholdModel;
use crate::{Bindable, AXIS_MAX, SPEED_THRESHOLD};

/// Directional slots plus the button
pub const JOYSTICK_SLOTS: usize = 17;

/// Slot fired by the stick button
pub const BUTTON_SLOT: usize = 16;

/// Everything a user can edit on one joystick, as plain data
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoystickSettings {
    /// `None` falls back to the profile-wide thresholds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<ThresholdModel>,
    /// Vector sequencing
    #[serde(default)]
    pub sequencer: bool,
    #[serde(default)]
    pub diagonals: bool,
    /// Button toggles on each press instead of following the button
    #[serde(default)]
    pub sticky: bool,
    #[serde(default, with = "slot_map")]
    pub slots: Vec<Key>,
}

impl JoystickSettings {
    /// Settings with the given thresholds and nothing bound
    pub fn with_thresholds(thresholds: ThresholdModel) -> Self {
        Self {
            thresholds: Some(thresholds),
            ..Default::default()
        }
    }

    /// Fill in missing thresholds with `thresholds`
    pub fn or_thresholds(mut self, thresholds: ThresholdModel) -> Self {
        self.thresholds.get_or_insert(thresholds);
        self
    }
}

#[derive(Debug, Clone)]
pub struct JoystickTracker {
    enabled: bool,
    last_x: i32,
    last_y: i32,
    thresholds: ThresholdModel,
    mapper: ActionMapper,
    sticky: bool,
    sticky_state: bool,
    last_button: bool,
    keys: KeySender<JOYSTICK_SLOTS>,
}

impl Default for JoystickTracker {
    fn default() -> Self {
        Self::new(ThresholdModel::default())
    }
}

impl JoystickTracker {
    pub fn new(thresholds: ThresholdModel) -> Self {
        Self {
            enabled: true,
            last_x: 0,
            last_y: 0,
            thresholds,
            mapper: ActionMapper::default(),
            sticky: false,
            sticky_state: false,
            last_button: false,
            keys: KeySender::new(),
        }
    }

    pub fn from_settings(settings: &JoystickSettings) -> Self {
        let mut tracker = Self::new(settings.thresholds.unwrap_or_default());
        tracker.apply_settings(settings);
        tracker
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable firing. Disabling releases held slots.
    pub fn set_enabled(&mut self, enabled: bool, runtime: &InputRuntime) {
        if !enabled {
            self.keys.release_all(runtime);
        }
        self.enabled = enabled;
    }

    pub fn thresholds(&self) -> &ThresholdModel {
        &self.thresholds
    }

    pub fn thresholds_mut(&mut self) -> &mut ThresholdModel {
        &mut self.thresholds
    }

    pub fn sequencing(&self) -> bool {
        self.mapper.sequencing
    }

    pub fn set_sequencing(&mut self, enable: bool) {
        self.mapper.sequencing = enable;
    }

    pub fn diagonals(&self) -> bool {
        self.mapper.diagonal
    }

    pub fn set_diagonals(&mut self, enable: bool) {
        self.mapper.diagonal = enable;
    }

    pub fn sticky(&self) -> bool {
        self.sticky
    }

    pub fn set_sticky(&mut self, enable: bool) {
        self.sticky = enable;
        self.sticky_state = false;
    }

    pub fn is_pressed(&self, slot: usize) -> bool {
        self.keys.is_pressed(slot)
    }

    /// Feed one sample.
    ///
    /// Samples that jumped more than [`SPEED_THRESHOLD`] from the previous
    /// one are only remembered, so fast sweeps across the ring fire nothing.
    pub fn update(&mut self, x: i32, y: i32, button: bool, runtime: &InputRuntime) {
        let dx = f64::from(x) - f64::from(self.last_x);
        let dy = f64::from(y) - f64::from(self.last_y);
        self.last_x = x;
        self.last_y = y;

        // last_button stays put, so a dropped edge fires on the next sample
        if !self.enabled || dx.hypot(dy) > SPEED_THRESHOLD {
            return;
        }

        let (hstate, vstate) = self.axis_states(x, y);
        self.fire_selection(self.mapper.map(hstate, vstate), runtime);

        if button != self.last_button {
            if !self.sticky {
                self.keys.send(BUTTON_SLOT, button, runtime);
            } else if button {
                self.sticky_state = !self.sticky_state;
                self.keys.send(BUTTON_SLOT, self.sticky_state, runtime);
            }
            self.last_button = button;
        }
    }

    /// Horizontal and vertical states of a position, taken from its
    /// distance and angle
    pub fn axis_states(&self, x: i32, y: i32) -> (i8, i8) {
        let (x, y) = (f64::from(x), f64::from(y));
        let distance = x.hypot(y).min(f64::from(AXIS_MAX));
        let multiplier = self.thresholds.state(distance as i32);
        if multiplier == 0 {
            return (0, 0);
        }

        let angle = y.atan2(x);
        let h = multiplier * angle.cos().round() as i8;
        let v = multiplier * angle.sin().round() as i8;
        (h, v)
    }

    fn fire_selection(&mut self, selection: ActionSelection, runtime: &InputRuntime) {
        match selection {
            ActionSelection::Bits(bits) => {
                for slot in 0..DIRECTION_SLOTS {
                    if bits & (1 << slot) == 0 {
                        self.keys.send(slot, false, runtime);
                    }
                }
                for slot in 0..DIRECTION_SLOTS {
                    if bits & (1 << slot) != 0 {
                        self.keys.send(slot, true, runtime);
                    }
                }
            }
            ActionSelection::Index(index) => {
                for slot in 0..DIRECTION_SLOTS {
                    if Some(slot) != index {
                        self.keys.send(slot, false, runtime);
                    }
                }
                if let Some(slot) = index {
                    self.keys.send(slot, true, runtime);
                }
            }
        }
    }

    /// Release every held slot, including a latched sticky button
    pub fn release_all(&mut self, runtime: &InputRuntime) {
        self.keys.release_all(runtime);
        self.sticky_state = false;
    }
}

impl Bindable for JoystickTracker {
    type Settings = JoystickSettings;

    fn slot_count(&self) -> usize {
        JOYSTICK_SLOTS
    }

    fn binding(&self, slot: usize) -> Option<&Key> {
        self.keys.key(slot)
    }

    fn set_binding(&mut self, slot: usize, key: Key) {
        self.keys.set_key(slot, key);
    }

    fn short_threshold(&self) -> i32 {
        self.thresholds.short()
    }

    fn set_short_threshold(&mut self, value: i32) {
        self.thresholds.set_short(value);
    }

    fn settings(&self) -> JoystickSettings {
        JoystickSettings {
            thresholds: Some(self.thresholds),
            sequencer: self.mapper.sequencing,
            diagonals: self.mapper.diagonal,
            sticky: self.sticky,
            slots: self.keys.bound_keys(),
        }
    }

    fn apply_settings(&mut self, settings: &JoystickSettings) {
        self.thresholds = settings.thresholds.unwrap_or_default();
        self.mapper = ActionMapper::new(settings.sequencer, settings.diagonals);
        if self.sticky != settings.sticky {
            self.set_sticky(settings.sticky);
        }
        for slot in 0..JOYSTICK_SLOTS {
            let key = settings.slots.get(slot).cloned().unwrap_or_default();
            self.keys.set_key(slot, key);
        }
    }
}

/// Serialize slot bindings as a table keyed by slot number (`"0"`, `"1"`,
/// ...), skipping unbound slots.
pub(crate) mod slot_map {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::key::Key;

    pub fn serialize<S: Serializer>(slots: &[Key], serializer: S) -> Result<S::Ok, S::Error> {
        let map: BTreeMap<String, &Key> = slots
            .iter()
            .enumerate()
            .filter(|(_, key)| key.is_valid())
            .map(|(slot, key)| (slot.to_string(), key))
            .collect();
        map.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Key>, D::Error> {
        let map = BTreeMap::<String, Key>::deserialize(deserializer)?;
        let mut entries: Vec<(usize, Key)> = map
            .into_iter()
            .filter_map(|(slot, key)| slot.trim().parse::<usize>().ok().map(|s| (s, key)))
            .filter(|(slot, _)| *slot < 64)
            .collect();
        entries.sort_by_key(|(slot, _)| *slot);

        let len = entries.last().map(|(slot, _)| slot + 1).unwrap_or(0);
        let mut slots = vec![Key::unset(); len];
        for (slot, key) in entries {
            slots[slot] = key;
        }
        Ok(slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::injector::RecordingInjector;
    use crate::key::Modifiers;
    use std::sync::Arc;

    fn runtime() -> (Arc<RecordingInjector>, InputRuntime) {
        let injector = Arc::new(RecordingInjector::new());
        let runtime = InputRuntime::new(injector.clone());
        (injector, runtime)
    }

    /// Slot `n` bound to code `100 + n`
    fn bound_tracker() -> JoystickTracker {
        let mut tracker = JoystickTracker::default();
        for slot in 0..JOYSTICK_SLOTS {
            tracker.set_binding(slot, Key::new(100 + slot as i32, Modifiers::empty()));
        }
        tracker
    }

    /// Settle on a position: the first sample is a jump and only remembered
    fn settle(tracker: &mut JoystickTracker, x: i32, y: i32, button: bool, rt: &InputRuntime) {
        tracker.update(x, y, button, rt);
        tracker.update(x, y, button, rt);
    }

    #[test]
    fn test_axis_states_from_angle() {
        let tracker = JoystickTracker::default();
        assert_eq!(tracker.axis_states(0, 30000), (0, 1));
        assert_eq!(tracker.axis_states(0, 5000), (0, 0));
        assert_eq!(tracker.axis_states(20000, 20000), (1, 1));
        assert_eq!(tracker.axis_states(-31000, -31000), (-2, -2));
        assert_eq!(tracker.axis_states(32767, 0), (2, 0));
    }

    #[test]
    fn test_jump_is_ignored() {
        let (injector, rt) = runtime();
        let mut tracker = bound_tracker();
        tracker.update(0, 30000, false, &rt);
        assert!(injector.events().is_empty());

        tracker.update(0, 30000, false, &rt);
        assert_eq!(injector.held_codes(), vec![100]);
    }

    #[test]
    fn test_index_mode_moves_between_slots() {
        let (injector, rt) = runtime();
        let mut tracker = bound_tracker();
        settle(&mut tracker, 0, 30000, false, &rt);
        settle(&mut tracker, 30000, 0, false, &rt);
        assert_eq!(injector.held_codes(), vec![102]);

        settle(&mut tracker, 0, 0, false, &rt);
        assert!(injector.held_codes().is_empty());
    }

    #[test]
    fn test_sequenced_diagonal_far_corner() {
        let (injector, rt) = runtime();
        let mut tracker = bound_tracker();
        tracker.set_sequencing(true);
        tracker.set_diagonals(true);

        settle(&mut tracker, 31000, 31000, false, &rt);
        let mut held = injector.held_codes();
        held.sort();
        assert_eq!(held, vec![108, 110]);
        assert!(tracker.is_pressed(8) && tracker.is_pressed(10));
    }

    #[test]
    fn test_bitmask_releases_before_presses() {
        let (injector, rt) = runtime();
        let mut tracker = bound_tracker();
        tracker.set_diagonals(true);

        settle(&mut tracker, 20000, 0, false, &rt);
        injector.take();
        settle(&mut tracker, -20000, 0, false, &rt);

        let events = injector.events();
        let release_right = events.iter().position(|e| e.code == 102 && !e.pressed);
        let press_left = events.iter().position(|e| e.code == 106 && e.pressed);
        assert!(release_right.unwrap() < press_left.unwrap());
    }

    #[test]
    fn test_button_and_sticky() {
        let (injector, rt) = runtime();
        let mut tracker = bound_tracker();

        settle(&mut tracker, 0, 0, true, &rt);
        assert!(tracker.is_pressed(BUTTON_SLOT));
        settle(&mut tracker, 0, 0, false, &rt);
        assert!(!tracker.is_pressed(BUTTON_SLOT));

        tracker.set_sticky(true);
        settle(&mut tracker, 0, 0, true, &rt);
        settle(&mut tracker, 0, 0, false, &rt);
        assert!(tracker.is_pressed(BUTTON_SLOT));
        settle(&mut tracker, 0, 0, true, &rt);
        assert!(!tracker.is_pressed(BUTTON_SLOT));
        assert_eq!(injector.count(116, true), 2);
    }

    #[test]
    fn test_button_edge_in_jump_fires_next_sample() {
        let (injector, rt) = runtime();
        let mut tracker = bound_tracker();

        tracker.update(0, 30000, true, &rt);
        assert!(injector.events().is_empty());
        tracker.update(0, 30000, true, &rt);
        assert!(tracker.is_pressed(BUTTON_SLOT));
        assert_eq!(injector.count(116, true), 1);
    }

    #[test]
    fn test_disabled_tracks_position_only() {
        let (injector, rt) = runtime();
        let mut tracker = bound_tracker();
        tracker.set_enabled(false, &rt);
        settle(&mut tracker, 0, 30000, false, &rt);
        assert!(injector.events().is_empty());

        // position was kept, so the next sample is not a jump
        tracker.set_enabled(true, &rt);
        tracker.update(0, 30000, false, &rt);
        assert_eq!(injector.held_codes(), vec![100]);
    }

    #[test]
    fn test_settings_roundtrip() {
        let mut tracker = bound_tracker();
        tracker.set_sequencing(true);
        tracker.set_short_threshold(12000);

        let settings = tracker.settings();
        assert_eq!(settings.slots.len(), JOYSTICK_SLOTS);
        let copy = JoystickTracker::from_settings(&settings);
        assert_eq!(copy.settings(), settings);
        assert_eq!(copy.short_threshold(), 12000);
    }

    #[test]
    fn test_or_thresholds_keeps_own() {
        let fallback = ThresholdModel::new(8000, 25000);
        let own = ThresholdModel::new(12000, 28000);

        let empty = JoystickSettings::default().or_thresholds(fallback);
        assert_eq!(empty.thresholds, Some(fallback));
        let set = JoystickSettings::with_thresholds(own).or_thresholds(fallback);
        assert_eq!(set.thresholds, Some(own));
        assert_eq!(*JoystickTracker::from_settings(&set).thresholds(), own);
    }

    #[test]
    fn test_slot_map_toml() {
        let mut settings = JoystickSettings::default();
        settings.slots = vec![Key::unset(), Key::new(30, Modifiers::CTRL)];

        let text = toml::to_string(&settings).unwrap();
        assert!(text.contains("[slots.1]"));
        assert!(!text.contains("[slots.0]"));

        let parsed: JoystickSettings = toml::from_str(&text).unwrap();
        assert_eq!(parsed.slots, settings.slots);
    }
}
