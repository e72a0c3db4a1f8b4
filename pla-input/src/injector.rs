//! OS key injection
//!
//! [`KeyInjector`] is the only way key events leave this crate. The uinput
//! implementation creates a virtual keyboard that the rest of the desktop
//! sees as a normal input device.

use evdev::{
    uinput::{VirtualDevice, VirtualDeviceBuilder},
    AttributeSet, EventType, InputEvent, Key as EvKey,
};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::error::InputError;
use crate::key::Modifiers;
use crate::keycode::KEY_MAX_INJECTABLE;

/// Name of the virtual keyboard as shown by `evtest`
pub const VIRTUAL_KEYBOARD_NAME: &str = "PLA Virtual Keyboard";

/// Send one key transition to the operating system.
///
/// `modifiers` are pressed before and released after `code`. Implementations
/// must be callable from the input loop and foreground threads alike.
pub trait KeyInjector: Send + Sync {
    fn inject(&self, code: i32, modifiers: Modifiers, pressed: bool) -> Result<(), InputError>;
}

/// Virtual keyboard device using evdev/uinput
pub struct UinputKeyboard {
    device: Mutex<VirtualDevice>,
}

impl UinputKeyboard {
    /// Create the virtual keyboard with every code up to [`KEY_MAX_INJECTABLE`]
    pub fn new(name: &str) -> Result<Self, InputError> {
        let mut keys = AttributeSet::<EvKey>::new();
        for code in 1..=KEY_MAX_INJECTABLE as u16 {
            keys.insert(EvKey::new(code));
        }

        let device = VirtualDeviceBuilder::new()
            .map_err(InputError::CreateDevice)?
            .name(name)
            .with_keys(&keys)
            .map_err(InputError::CreateDevice)?
            .build()
            .map_err(InputError::CreateDevice)?;

        info!("Created virtual keyboard \"{}\"", name);
        Ok(Self {
            device: Mutex::new(device),
        })
    }
}

fn key_event(code: i32, pressed: bool) -> InputEvent {
    InputEvent::new(EventType::KEY, code as u16, i32::from(pressed))
}

impl KeyInjector for UinputKeyboard {
    fn inject(&self, code: i32, modifiers: Modifiers, pressed: bool) -> Result<(), InputError> {
        if !(1..=KEY_MAX_INJECTABLE).contains(&code) {
            return Err(InputError::UnsupportedCode(code));
        }

        let mut events: Vec<InputEvent> = Vec::with_capacity(5);
        if pressed {
            events.extend(modifiers.press_codes().map(|m| key_event(m, true)));
            events.push(key_event(code, true));
        } else {
            events.push(key_event(code, false));
            events.extend(modifiers.press_codes().rev().map(|m| key_event(m, false)));
        }

        // emit() terminates the batch with SYN_REPORT
        self.device
            .lock()
            .emit(&events)
            .map_err(InputError::EmitEvent)
    }
}

/// Injector for dry runs: logs every transition and touches nothing
#[derive(Debug, Default)]
pub struct LogInjector;

impl KeyInjector for LogInjector {
    fn inject(&self, code: i32, modifiers: Modifiers, pressed: bool) -> Result<(), InputError> {
        info!(
            "{} code={} modifiers={:?}",
            if pressed { "press" } else { "release" },
            code,
            modifiers
        );
        Ok(())
    }
}

/// One transition seen by a [`RecordingInjector`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InjectedEvent {
    pub code: i32,
    pub modifiers: Modifiers,
    pub pressed: bool,
}

/// Injector that stores every transition, for tests and diagnostics
#[derive(Debug, Default)]
pub struct RecordingInjector {
    events: Mutex<Vec<InjectedEvent>>,
}

impl RecordingInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all transitions so far
    pub fn events(&self) -> Vec<InjectedEvent> {
        self.events.lock().clone()
    }

    /// Remove and return all transitions so far
    pub fn take(&self) -> Vec<InjectedEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Number of transitions of `code` in the given direction
    pub fn count(&self, code: i32, pressed: bool) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| e.code == code && e.pressed == pressed)
            .count()
    }

    /// Codes currently down according to the recorded transitions
    pub fn held_codes(&self) -> Vec<i32> {
        let mut held: Vec<i32> = Vec::new();
        for event in self.events.lock().iter() {
            if event.pressed {
                if !held.contains(&event.code) {
                    held.push(event.code);
                }
            } else {
                held.retain(|c| *c != event.code);
            }
        }
        held
    }
}

impl KeyInjector for RecordingInjector {
    fn inject(&self, code: i32, modifiers: Modifiers, pressed: bool) -> Result<(), InputError> {
        debug!("recorded code={} pressed={}", code, pressed);
        self.events.lock().push(InjectedEvent {
            code,
            modifiers,
            pressed,
        });
        Ok(())
    }
}
