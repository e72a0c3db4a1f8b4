//! Two-stage axis thresholds
//!
//! Converts a signed axis magnitude into a discrete state:
//!
//! ```text
//!  -2   |  -1   |   0   |   1   |   2
//! -far   -short    0    +short   +far
//! ```
//!
//! The model itself never corrects a misconfigured pair (`far <= short`);
//! the editing setters are where the minimum gap is enforced.

use serde::{Deserialize, Serialize};

use crate::AXIS_MAX;

/// Default "Vector 1" threshold
pub const DEFAULT_SHORT_THRESHOLD: i32 = 10000;
/// Default "Vector 2" threshold
pub const DEFAULT_FAR_THRESHOLD: i32 = 30000;

/// Smallest distance editors keep between the short and far thresholds
pub const MINIMUM_THRESHOLD_GAP: i32 = 1000;

/// Editable range for joystick thresholds
pub const JOYSTICK_THRESHOLD_RANGE: (i32, i32) = (4000, 31000);
/// Editable range for the steering wheel threshold
pub const STEERING_THRESHOLD_RANGE: (i32, i32) = (3000, 30000);

/// Discrete axis state: `-2..=2`
pub type AxisState = i8;

/// Compute the state of `value` against the given thresholds.
///
/// Returns 0 when `|value| <= short`, ±1 when `short < |value| <= far`
/// and ±2 beyond `far`, with the sign of `value`.
pub fn axis_state(value: i32, short: i32, far: i32) -> AxisState {
    let magnitude = value.unsigned_abs();
    let stage = if magnitude <= short.max(0) as u32 {
        0
    } else if magnitude <= far.max(0) as u32 {
        1
    } else {
        2
    };

    if value < 0 {
        -stage
    } else {
        stage
    }
}

/// Short/far threshold pair owned by each tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdModel {
    #[serde(default = "default_short")]
    short: i32,
    #[serde(default = "default_far")]
    far: i32,
}

fn default_short() -> i32 {
    DEFAULT_SHORT_THRESHOLD
}
fn default_far() -> i32 {
    DEFAULT_FAR_THRESHOLD
}

impl Default for ThresholdModel {
    fn default() -> Self {
        Self {
            short: DEFAULT_SHORT_THRESHOLD,
            far: DEFAULT_FAR_THRESHOLD,
        }
    }
}

impl ThresholdModel {
    /// Create a model with exactly the given values (no clamping)
    pub fn new(short: i32, far: i32) -> Self {
        Self { short, far }
    }

    pub fn short(&self) -> i32 {
        self.short
    }

    pub fn far(&self) -> i32 {
        self.far
    }

    /// State of `value` against this pair
    pub fn state(&self, value: i32) -> AxisState {
        axis_state(value, self.short, self.far)
    }

    /// Set the short threshold, clamped to the joystick range.
    ///
    /// Pushes `far` outward when the minimum gap would be violated.
    pub fn set_short(&mut self, value: i32) {
        let (min, max) = JOYSTICK_THRESHOLD_RANGE;
        self.short = value.clamp(min, max);
        self.enforce_gap();
    }

    /// Set the far threshold, clamped to the joystick range.
    pub fn set_far(&mut self, value: i32) {
        let (min, max) = JOYSTICK_THRESHOLD_RANGE;
        self.far = value.clamp(min, max);
        self.enforce_gap();
    }

    /// Set both thresholds through the clamping setters
    pub fn set(&mut self, short: i32, far: i32) {
        self.short = short.clamp(JOYSTICK_THRESHOLD_RANGE.0, JOYSTICK_THRESHOLD_RANGE.1);
        self.set_far(far);
    }

    /// Whether `far` sits at least the minimum gap above `short`
    pub fn is_consistent(&self) -> bool {
        self.far - self.short >= MINIMUM_THRESHOLD_GAP
    }

    fn enforce_gap(&mut self) {
        if self.far - self.short < MINIMUM_THRESHOLD_GAP {
            // far may exceed the slider range here; the axis tops out at AXIS_MAX
            self.far = (self.short + MINIMUM_THRESHOLD_GAP).min(AXIS_MAX);
        }
    }
}

/// Clamp a steering threshold into its editable range
pub fn clamp_steering_threshold(value: i32) -> i32 {
    let (min, max) = STEERING_THRESHOLD_RANGE;
    value.clamp(min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_zero_inside_short() {
        assert_eq!(axis_state(0, 10000, 30000), 0);
        assert_eq!(axis_state(10000, 10000, 30000), 0);
        assert_eq!(axis_state(-10000, 10000, 30000), 0);
    }

    #[test]
    fn test_state_stages_and_sign() {
        assert_eq!(axis_state(10001, 10000, 30000), 1);
        assert_eq!(axis_state(30000, 10000, 30000), 1);
        assert_eq!(axis_state(30001, 10000, 30000), 2);
        assert_eq!(axis_state(-20000, 10000, 30000), -1);
        assert_eq!(axis_state(-32767, 10000, 30000), -2);
        assert_eq!(axis_state(i32::MIN, 10000, 30000), -2);
    }

    #[test]
    fn test_state_monotonic_in_magnitude() {
        let mut previous = 0;
        for v in (0..=32767).step_by(97) {
            let s = axis_state(v, 12000, 25000);
            assert!(s >= previous, "state dropped at {v}");
            assert_eq!(axis_state(-v, 12000, 25000), -s);
            previous = s;
        }
    }

    #[test]
    fn test_model_does_not_correct_inverted_pair() {
        let model = ThresholdModel::new(20000, 15000);
        assert!(!model.is_consistent());
        assert_eq!(model.state(18000), 1);
        assert_eq!(model.state(21000), 2);
    }

    #[test]
    fn test_set_short_pushes_far() {
        let mut model = ThresholdModel::default();
        model.set_short(29500);
        assert_eq!(model.short(), 29500);
        assert_eq!(model.far(), 30500);
        assert!(model.is_consistent());
    }

    #[test]
    fn test_set_far_below_short_is_raised() {
        let mut model = ThresholdModel::default();
        model.set_far(5000);
        assert_eq!(model.far(), DEFAULT_SHORT_THRESHOLD + MINIMUM_THRESHOLD_GAP);
    }

    #[test]
    fn test_setters_clamp_to_range() {
        let mut model = ThresholdModel::default();
        model.set(100, 40000);
        assert_eq!(model.short(), 4000);
        assert_eq!(model.far(), 31000);
    }

    #[test]
    fn test_steering_clamp() {
        assert_eq!(clamp_steering_threshold(1000), 3000);
        assert_eq!(clamp_steering_threshold(20000), 20000);
        assert_eq!(clamp_steering_threshold(31000), 30000);
    }
}
