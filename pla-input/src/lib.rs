//! Analog-to-key translation core for the PLA controller
//!
//! This crate turns joystick, steering wheel and button samples into key
//! events and macros:
//! - Two-stage axis thresholds ([`threshold`])
//! - Direction mapping with vector sequencing and diagonals ([`mapper`])
//! - Debounced key slots sharing one pressed-key registry ([`sender`], [`registry`])
//! - Joystick, steering and programmable-group trackers
//! - Named macros with recording and delay policies ([`macros`])
//! - Edit snapshots with revert ([`editing`])
//!
//! Key events leave the crate through the [`KeyInjector`] capability; the
//! [`InputRuntime`] bundles it with the registry and macro engine.

pub mod editing;
pub mod error;
pub mod injector;
pub mod joystick;
pub mod key;
pub mod keycode;
pub mod macros;
pub mod mapper;
pub mod primary;
pub mod registry;
pub mod runtime;
pub mod sender;
pub mod steering;
pub mod threshold;
pub mod trackers;

pub use editing::Editing;
pub use error::InputError;
pub use injector::{InjectedEvent, KeyInjector, LogInjector, RecordingInjector, UinputKeyboard};
pub use joystick::{JoystickSettings, JoystickTracker, JOYSTICK_SLOTS};
pub use key::{Key, Modifiers, ParseKeyError};
pub use macros::{Action, ActionList, DelayType, MacroEngine, MacroRecorder};
pub use mapper::{ActionMapper, ActionSelection};
pub use primary::{PrimaryJoystickTracker, PG_COUNT};
pub use registry::{KeyComponent, PressedKeyRegistry};
pub use runtime::InputRuntime;
pub use sender::KeySender;
pub use steering::{SteeringSettings, SteeringTracker, STEERING_SLOTS};
pub use threshold::{AxisState, ThresholdModel};
pub use trackers::{InputFrame, StickSample, TrackerId, TrackerSet, TrackerSettings};

/// Axis value range after normalization
pub const AXIS_MIN: i32 = -32767;
pub const AXIS_MAX: i32 = 32767;

/// Displacement between two samples above which a sample is treated as a jump
pub const SPEED_THRESHOLD: f64 = 100.0;

/// Something a user can bind keys to and tune thresholds on
pub trait Bindable {
    type Settings: Clone + PartialEq;

    /// Number of binding slots
    fn slot_count(&self) -> usize;

    /// Binding in `slot`, `None` when out of range
    fn binding(&self, slot: usize) -> Option<&Key>;

    /// Replace the binding in `slot`; out-of-range slots are ignored
    fn set_binding(&mut self, slot: usize, key: Key);

    fn short_threshold(&self) -> i32;

    fn set_short_threshold(&mut self, value: i32);

    /// Plain-data copy of everything a user can edit
    fn settings(&self) -> Self::Settings;

    /// Overwrite the editable state from a snapshot
    fn apply_settings(&mut self, settings: &Self::Settings);
}
