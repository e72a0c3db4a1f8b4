//! Process-wide reference counts of pressed key components
//!
//! Several slots can hold the same key or share a modifier. A component is
//! injected down when its count leaves zero and up when it returns to zero,
//! so the OS sees exactly one press per component no matter how many
//! slots hold it.

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::{trace, warn};

use crate::injector::KeyInjector;
use crate::key::{Key, Modifiers};
use crate::keycode::is_modifier_code;

/// Smallest unit the registry counts
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyComponent {
    Code(i32),
    Macro(String),
}

/// Components of `key` in press order: Shift, Ctrl, Alt, Meta, then the
/// base code or macro. Empty for invalid keys.
pub fn components(key: &Key) -> Vec<KeyComponent> {
    if !key.is_valid() {
        return Vec::new();
    }

    let mut parts: Vec<KeyComponent> = key
        .modifiers()
        .press_codes()
        .map(KeyComponent::Code)
        .collect();
    match key.macro_name() {
        Some(name) => parts.push(KeyComponent::Macro(name.to_string())),
        None => parts.push(KeyComponent::Code(key.code())),
    }
    parts
}

#[derive(Debug, Default)]
pub struct PressedKeyRegistry {
    counts: Mutex<HashMap<KeyComponent, u32>>,
}

impl PressedKeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more holder of every component of `key`.
    ///
    /// Codes whose count leaves zero are injected down while the lock is
    /// held. Returns the macro to fire when the macro component left zero;
    /// the caller fires it after this returns, outside the lock.
    pub fn press(&self, key: &Key, injector: &dyn KeyInjector) -> Option<String> {
        let mut counts = self.counts.lock();
        let mut fire = None;

        for component in components(key) {
            let count = counts.entry(component.clone()).or_insert(0);
            *count += 1;
            if *count != 1 {
                continue;
            }

            match component {
                KeyComponent::Code(code) => {
                    trace!("key down {}", code);
                    if let Err(e) = injector.inject(code, Modifiers::empty(), true) {
                        warn!("Failed to inject key down {}: {}", code, e);
                    }
                }
                KeyComponent::Macro(name) => fire = Some(name),
            }
        }

        fire
    }

    /// Drop one holder of every component of `key`, in reverse press order.
    ///
    /// Codes whose count returns to zero are injected up. Macros do nothing
    /// on release.
    pub fn release(&self, key: &Key, injector: &dyn KeyInjector) {
        let mut counts = self.counts.lock();

        for component in components(key).into_iter().rev() {
            let Some(count) = counts.get_mut(&component) else {
                continue;
            };
            *count = count.saturating_sub(1);
            if *count != 0 {
                continue;
            }
            counts.remove(&component);

            if let KeyComponent::Code(code) = component {
                trace!("key up {}", code);
                if let Err(e) = injector.inject(code, Modifiers::empty(), false) {
                    warn!("Failed to inject key up {}: {}", code, e);
                }
            }
        }
    }

    /// Current holder count of `component`
    pub fn count(&self, component: &KeyComponent) -> u32 {
        self.counts.lock().get(component).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.counts.lock().is_empty()
    }

    /// Release every held code regardless of its count and forget all
    /// components. Base keys go up before modifiers.
    pub fn drain(&self, injector: &dyn KeyInjector) {
        let mut counts = self.counts.lock();

        let mut codes: Vec<i32> = counts
            .keys()
            .filter_map(|c| match c {
                KeyComponent::Code(code) => Some(*code),
                KeyComponent::Macro(_) => None,
            })
            .collect();
        codes.sort_by_key(|code| (is_modifier_code(*code), *code));

        for code in codes {
            if let Err(e) = injector.inject(code, Modifiers::empty(), false) {
                warn!("Failed to release key {} while draining: {}", code, e);
            }
        }
        counts.clear();
    }
}
