//! Shared context for everything that fires keys

use std::sync::Arc;

use tracing::warn;

use crate::injector::KeyInjector;
use crate::key::Key;
use crate::macros::MacroEngine;
use crate::registry::PressedKeyRegistry;

/// Injector, pressed-key registry and macro store shared by all trackers.
///
/// Create one per process and pass it by reference to every update.
pub struct InputRuntime {
    injector: Arc<dyn KeyInjector>,
    registry: PressedKeyRegistry,
    macros: MacroEngine,
}

impl InputRuntime {
    pub fn new(injector: Arc<dyn KeyInjector>) -> Self {
        Self::with_macros(injector, MacroEngine::new())
    }

    pub fn with_macros(injector: Arc<dyn KeyInjector>, macros: MacroEngine) -> Self {
        Self {
            injector,
            registry: PressedKeyRegistry::new(),
            macros,
        }
    }

    pub fn injector(&self) -> &dyn KeyInjector {
        self.injector.as_ref()
    }

    pub fn registry(&self) -> &PressedKeyRegistry {
        &self.registry
    }

    pub fn macros(&self) -> &MacroEngine {
        &self.macros
    }

    /// Fire `key` directly, bypassing the registry.
    ///
    /// Key codes go to the injector with their modifiers; macros are
    /// replayed on press. Invalid keys do nothing.
    pub fn fire(&self, key: &Key, pressed: bool) {
        self.fire_at_depth(key, pressed, 0);
    }

    pub(crate) fn fire_at_depth(&self, key: &Key, pressed: bool, depth: usize) {
        if !key.is_valid() {
            return;
        }

        if let Some(name) = key.macro_name() {
            if pressed {
                self.macros.fire_at_depth(name, self, depth);
            }
            return;
        }

        if let Err(e) = self.injector.inject(key.code(), key.modifiers(), pressed) {
            warn!("Failed to inject {}: {}", key, e);
        }
    }

    /// Press `key` through the registry
    pub fn press(&self, key: &Key) {
        if let Some(name) = self.registry.press(key, self.injector.as_ref()) {
            self.macros.fire(&name, self);
        }
    }

    /// Release `key` through the registry
    pub fn release(&self, key: &Key) {
        self.registry.release(key, self.injector.as_ref());
    }

    /// Release everything the registry still holds
    pub fn drain(&self) {
        self.registry.drain(self.injector.as_ref());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::injector::RecordingInjector;
    use crate::key::Modifiers;
    use crate::keycode::KEY_LEFTCTRL;
    use crate::macros::{Action, ActionList, DelayType};
    use std::time::{Duration, Instant};

    fn runtime() -> (Arc<RecordingInjector>, InputRuntime) {
        let injector = Arc::new(RecordingInjector::new());
        let runtime = InputRuntime::new(injector.clone());
        (injector, runtime)
    }

    #[test]
    fn test_direct_fire_passes_modifiers() {
        let (injector, runtime) = runtime();
        runtime.fire(&Key::new(30, Modifiers::CTRL), true);
        let events = injector.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].modifiers, Modifiers::CTRL);
        assert!(runtime.registry().is_empty());
    }

    #[test]
    fn test_invalid_key_fires_nothing() {
        let (injector, runtime) = runtime();
        runtime.fire(&Key::unset(), true);
        runtime.press(&Key::unset());
        assert!(injector.events().is_empty());
    }

    #[test]
    fn test_press_fires_macro_once() {
        let (injector, runtime) = runtime();
        runtime.macros().replace(
            "tap",
            ActionList::new(
                vec![
                    Action::new(Key::new(30, Modifiers::empty()), true, Duration::ZERO),
                    Action::new(Key::new(30, Modifiers::empty()), false, Duration::ZERO),
                ],
                DelayType::None,
            ),
        );

        let key = Key::from_macro("tap");
        let start = Instant::now();
        runtime.press(&key);
        runtime.press(&key);
        // two actions, each followed by the minimum pause
        assert!(start.elapsed() >= Duration::from_millis(10));
        assert_eq!(injector.count(30, true), 1);
        assert_eq!(injector.count(30, false), 1);

        runtime.release(&key);
        runtime.release(&key);
        assert!(runtime.registry().is_empty());
    }

    #[test]
    fn test_self_referencing_macro_terminates() {
        let (injector, runtime) = runtime();
        runtime.macros().replace(
            "loop",
            ActionList::new(
                vec![
                    Action::new(Key::new(30, Modifiers::empty()), true, Duration::ZERO),
                    Action::new(Key::from_macro("loop"), true, Duration::ZERO),
                ],
                DelayType::None,
            ),
        );

        runtime.fire(&Key::from_macro("loop"), true);
        assert_eq!(injector.count(30, true), crate::macros::MAX_MACRO_DEPTH);
    }

    #[test]
    fn test_drain_releases_held_keys() {
        let (injector, runtime) = runtime();
        runtime.press(&Key::new(30, Modifiers::CTRL));
        runtime.drain();
        assert!(injector.held_codes().is_empty());
        assert_eq!(injector.count(KEY_LEFTCTRL, false), 1);
        assert!(runtime.registry().is_empty());
    }
}
