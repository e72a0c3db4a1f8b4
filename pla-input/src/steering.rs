//! Steering wheel tracker
//!
//! In digital mode the wheel acts as two keys (slot 0 left, slot 1 right)
//! with a small hysteresis band around the threshold so a wheel resting on
//! the threshold does not chatter.

use serde::{Deserialize, Serialize};

use crate::joystick::slot_map;
use crate::key::Key;
use crate::runtime::InputRuntime;
use crate::sender::KeySender;
use crate::threshold::{clamp_steering_threshold, DEFAULT_SHORT_THRESHOLD};
use crate::{Bindable, AXIS_MAX};

pub const STEERING_SLOTS: usize = 2;
pub const LEFT_SLOT: usize = 0;
pub const RIGHT_SLOT: usize = 1;

/// Press above `threshold * PRESS_FACTOR`
const PRESS_FACTOR: f64 = 1.025;
/// Release below `threshold * RELEASE_FACTOR`
const RELEASE_FACTOR: f64 = 0.975;

/// Reading of a wheel with a loose wire
pub const LOOSE_WIRE_POSITION: i32 = AXIS_MAX;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SteeringSettings {
    #[serde(default)]
    pub digital: bool,
    #[serde(default = "default_threshold")]
    pub threshold: i32,
    #[serde(default, with = "slot_map")]
    pub slots: Vec<Key>,
}

fn default_threshold() -> i32 {
    DEFAULT_SHORT_THRESHOLD
}

impl Default for SteeringSettings {
    fn default() -> Self {
        Self {
            digital: false,
            threshold: DEFAULT_SHORT_THRESHOLD,
            slots: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SteeringTracker {
    digital: bool,
    threshold: i32,
    last_position: i32,
    keys: KeySender<STEERING_SLOTS>,
}

impl Default for SteeringTracker {
    fn default() -> Self {
        Self::from_settings(&SteeringSettings::default())
    }
}

impl SteeringTracker {
    pub fn from_settings(settings: &SteeringSettings) -> Self {
        let mut tracker = Self {
            digital: false,
            threshold: DEFAULT_SHORT_THRESHOLD,
            last_position: 0,
            keys: KeySender::new(),
        };
        tracker.apply_settings(settings);
        tracker
    }

    pub fn digital(&self) -> bool {
        self.digital
    }

    /// Switch modes. Leaving digital mode releases both keys.
    pub fn set_digital(&mut self, digital: bool, runtime: &InputRuntime) {
        if !digital {
            self.keys.release_all(runtime);
        }
        self.digital = digital;
    }

    pub fn threshold(&self) -> i32 {
        self.threshold
    }

    pub fn last_position(&self) -> i32 {
        self.last_position
    }

    pub fn is_pressed(&self, slot: usize) -> bool {
        self.keys.is_pressed(slot)
    }

    /// Feed one wheel position
    pub fn update(&mut self, position: i32, runtime: &InputRuntime) {
        self.last_position = position;
        if !self.digital {
            return;
        }

        let press_at = f64::from(self.threshold) * PRESS_FACTOR;
        let release_at = f64::from(self.threshold) * RELEASE_FACTOR;
        let p = f64::from(position);

        if position == LOOSE_WIRE_POSITION || p.abs() < release_at {
            self.keys.send(LEFT_SLOT, false, runtime);
            self.keys.send(RIGHT_SLOT, false, runtime);
        } else if p > press_at {
            self.keys.send(LEFT_SLOT, false, runtime);
            self.keys.send(RIGHT_SLOT, true, runtime);
        } else if p < -press_at {
            self.keys.send(RIGHT_SLOT, false, runtime);
            self.keys.send(LEFT_SLOT, true, runtime);
        }
    }

    pub fn release_all(&mut self, runtime: &InputRuntime) {
        self.keys.release_all(runtime);
    }
}

impl Bindable for SteeringTracker {
    type Settings = SteeringSettings;

    fn slot_count(&self) -> usize {
        STEERING_SLOTS
    }

    fn binding(&self, slot: usize) -> Option<&Key> {
        self.keys.key(slot)
    }

    fn set_binding(&mut self, slot: usize, key: Key) {
        self.keys.set_key(slot, key);
    }

    fn short_threshold(&self) -> i32 {
        self.threshold
    }

    fn set_short_threshold(&mut self, value: i32) {
        self.threshold = clamp_steering_threshold(value);
    }

    fn settings(&self) -> SteeringSettings {
        SteeringSettings {
            digital: self.digital,
            threshold: self.threshold,
            slots: self.keys.bound_keys(),
        }
    }

    fn apply_settings(&mut self, settings: &SteeringSettings) {
        self.digital = settings.digital;
        self.threshold = clamp_steering_threshold(settings.threshold);
        for slot in 0..STEERING_SLOTS {
            let key = settings.slots.get(slot).cloned().unwrap_or_default();
            self.keys.set_key(slot, key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::injector::RecordingInjector;
    use crate::key::Modifiers;
    use std::sync::Arc;

    const LEFT: i32 = 105;
    const RIGHT: i32 = 106;

    fn setup(threshold: i32) -> (Arc<RecordingInjector>, InputRuntime, SteeringTracker) {
        let injector = Arc::new(RecordingInjector::new());
        let runtime = InputRuntime::new(injector.clone());
        let tracker = SteeringTracker::from_settings(&SteeringSettings {
            digital: true,
            threshold,
            slots: vec![
                Key::new(LEFT, Modifiers::empty()),
                Key::new(RIGHT, Modifiers::empty()),
            ],
        });
        (injector, runtime, tracker)
    }

    #[test]
    fn test_hysteresis_band() {
        let (injector, rt, mut wheel) = setup(20000);

        wheel.update(20600, &rt);
        assert_eq!(injector.held_codes(), vec![RIGHT]);

        wheel.update(19600, &rt);
        assert_eq!(injector.held_codes(), vec![RIGHT]);

        wheel.update(19000, &rt);
        assert!(injector.held_codes().is_empty());
    }

    #[test]
    fn test_band_does_not_press_from_rest() {
        let (injector, rt, mut wheel) = setup(20000);
        wheel.update(20400, &rt);
        assert!(injector.events().is_empty());
    }

    #[test]
    fn test_direct_swap_releases_first() {
        let (injector, rt, mut wheel) = setup(20000);
        wheel.update(-25000, &rt);
        wheel.update(25000, &rt);

        let events = injector.events();
        let release_left = events.iter().position(|e| e.code == LEFT && !e.pressed);
        let press_right = events.iter().position(|e| e.code == RIGHT && e.pressed);
        assert!(release_left.unwrap() < press_right.unwrap());
        assert_eq!(injector.held_codes(), vec![RIGHT]);
    }

    #[test]
    fn test_loose_wire_releases() {
        let (injector, rt, mut wheel) = setup(20000);
        wheel.update(30000, &rt);
        wheel.update(LOOSE_WIRE_POSITION, &rt);
        assert!(injector.held_codes().is_empty());
    }

    #[test]
    fn test_analog_mode_never_fires() {
        let (injector, rt, mut wheel) = setup(20000);
        wheel.set_digital(false, &rt);
        wheel.update(30000, &rt);
        assert!(injector.events().is_empty());
        assert_eq!(wheel.last_position(), 30000);
    }

    #[test]
    fn test_threshold_is_clamped() {
        let (_, _, mut wheel) = setup(20000);
        wheel.set_short_threshold(500);
        assert_eq!(wheel.short_threshold(), 3000);
    }
}
