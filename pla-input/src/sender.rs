//! Debounced key slots

use std::array;

use crate::key::Key;
use crate::runtime::InputRuntime;

#[derive(Debug, Clone, Default)]
struct Slot {
    key: Key,
    /// Key actually pressed, kept so a rebinding never strands a key down
    held: Option<Key>,
}

/// Fixed set of `N` bindable slots, each pressed or released at most once
/// per transition.
#[derive(Debug, Clone)]
pub struct KeySender<const N: usize> {
    slots: [Slot; N],
}

impl<const N: usize> Default for KeySender<N> {
    fn default() -> Self {
        Self {
            slots: array::from_fn(|_| Slot::default()),
        }
    }
}

impl<const N: usize> KeySender<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn len(&self) -> usize {
        N
    }

    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    pub fn key(&self, slot: usize) -> Option<&Key> {
        self.slots.get(slot).map(|s| &s.key)
    }

    /// Bind `key` to `slot`. A held slot keeps the old key until released.
    pub fn set_key(&mut self, slot: usize, key: Key) {
        if let Some(s) = self.slots.get_mut(slot) {
            s.key = key;
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.slots.iter().map(|s| &s.key)
    }

    /// Bindings in the form settings store them: invalid keys become
    /// unset and trailing unset slots are dropped
    pub fn bound_keys(&self) -> Vec<Key> {
        let mut keys: Vec<Key> = self
            .keys()
            .map(|key| if key.is_valid() { key.clone() } else { Key::unset() })
            .collect();
        while keys.last().is_some_and(|key| !key.is_valid()) {
            keys.pop();
        }
        keys
    }

    pub fn is_pressed(&self, slot: usize) -> bool {
        self.slots.get(slot).is_some_and(|s| s.held.is_some())
    }

    /// Press or release `slot`. No-op when out of range or already in the
    /// requested state.
    pub fn send(&mut self, slot: usize, press: bool, runtime: &InputRuntime) {
        let Some(s) = self.slots.get_mut(slot) else {
            return;
        };

        match (press, s.held.take()) {
            (true, None) => {
                runtime.press(&s.key);
                s.held = Some(s.key.clone());
            }
            (false, Some(held)) => runtime.release(&held),
            (_, held) => s.held = held,
        }
    }

    /// Release every held slot
    pub fn release_all(&mut self, runtime: &InputRuntime) {
        for slot in 0..N {
            self.send(slot, false, runtime);
        }
    }
}
