//! Named macros: ordered key actions with delays
//!
//! A macro is an [`ActionList`] stored in the [`MacroEngine`] under a unique
//! name. Firing replays each action through the runtime and waits at least
//! [`MINIMUM_MACRO_DELAY`] between actions. Macros may bind other macros;
//! nesting stops at [`MAX_MACRO_DEPTH`].

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::InputError;
use crate::key::{Key, Modifiers};
use crate::keycode::is_modifier_code;
use crate::runtime::InputRuntime;

/// Shortest pause between two macro actions
pub const MINIMUM_MACRO_DELAY: Duration = Duration::from_millis(5);

/// Deepest chain of macros firing macros that is still replayed
pub const MAX_MACRO_DEPTH: usize = 8;

/// How the delays of a macro were produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum DelayType {
    /// Every delay is zero (the minimum pause still applies)
    #[default]
    None = 0,
    /// Every delay is the same user-entered value
    Fixed = 1,
    /// Delays are the recorded cadence
    Recorded = 2,
}

impl TryFrom<u8> for DelayType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(DelayType::None),
            1 => Ok(DelayType::Fixed),
            2 => Ok(DelayType::Recorded),
            other => Err(format!("invalid delay type {other}")),
        }
    }
}

impl From<DelayType> for u8 {
    fn from(value: DelayType) -> Self {
        value as u8
    }
}

impl fmt::Display for DelayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DelayType::None => write!(f, "none"),
            DelayType::Fixed => write!(f, "fixed"),
            DelayType::Recorded => write!(f, "recorded"),
        }
    }
}

/// One step of a macro: press or release `key`, then wait `delay`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ActionRepr", into = "ActionRepr")]
pub struct Action {
    pub key: Key,
    pub pressed: bool,
    pub delay: Duration,
}

impl Action {
    pub fn new(key: Key, pressed: bool, delay: Duration) -> Self {
        Self {
            key,
            pressed,
            delay,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({}ms)",
            if self.pressed { "Press" } else { "Release" },
            self.key,
            self.delay.as_millis()
        )
    }
}

/// On-disk form: `key`, `mod`, `macro`, `press`, `delay` (ms)
#[derive(Serialize, Deserialize)]
struct ActionRepr {
    #[serde(default = "unset_code")]
    key: i32,
    #[serde(rename = "mod", default)]
    modifiers: u8,
    #[serde(rename = "macro", default, skip_serializing_if = "String::is_empty")]
    macro_name: String,
    #[serde(default)]
    press: bool,
    #[serde(default)]
    delay: u64,
}

fn unset_code() -> i32 {
    crate::key::UNSET_CODE
}

impl From<ActionRepr> for Action {
    fn from(repr: ActionRepr) -> Self {
        let key = if repr.macro_name.is_empty() {
            Key::new(repr.key, Modifiers::from_bits_truncate(repr.modifiers))
        } else {
            Key::from_macro(repr.macro_name)
        };
        Action::new(key, repr.press, Duration::from_millis(repr.delay))
    }
}

impl From<Action> for ActionRepr {
    fn from(action: Action) -> Self {
        ActionRepr {
            key: action.key.code(),
            modifiers: action.key.modifiers().bits(),
            macro_name: action.key.macro_name().unwrap_or_default().to_string(),
            press: action.pressed,
            delay: action.delay.as_millis() as u64,
        }
    }
}

/// Ordered actions of one macro plus how their delays were produced
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionList {
    #[serde(rename = "delayType", default)]
    pub delay_type: DelayType,
    #[serde(rename = "keys", default)]
    pub actions: Vec<Action>,
}

impl ActionList {
    pub fn new(actions: Vec<Action>, delay_type: DelayType) -> Self {
        Self {
            delay_type,
            actions,
        }
    }

    /// Switch delay policy and rewrite the delays accordingly.
    ///
    /// `None` zeroes every delay, `Fixed` sets every delay to `fixed`
    /// (at least [`MINIMUM_MACRO_DELAY`]), `Recorded` keeps the current ones.
    pub fn apply_delay(&mut self, delay_type: DelayType, fixed: Duration) -> Result<(), InputError> {
        let delay = match delay_type {
            DelayType::None => Duration::ZERO,
            DelayType::Fixed => {
                if fixed < MINIMUM_MACRO_DELAY {
                    return Err(InputError::InvalidDelay(
                        fixed.as_millis() as u64,
                        MINIMUM_MACRO_DELAY.as_millis() as u64,
                    ));
                }
                fixed
            }
            DelayType::Recorded => {
                self.delay_type = delay_type;
                return Ok(());
            }
        };

        for action in &mut self.actions {
            action.delay = delay;
        }
        self.delay_type = delay_type;
        Ok(())
    }

    /// The fixed delay in effect, read from the first action
    pub fn fixed_delay(&self) -> Option<Duration> {
        match self.delay_type {
            DelayType::Fixed => self.actions.first().map(|a| a.delay),
            _ => None,
        }
    }

    /// Rewrite bindings of macro `from` to macro `to`
    pub fn rename_macro_refs(&mut self, from: &str, to: &str) {
        for action in &mut self.actions {
            if let Some(key) = action.key.renamed_macro(from, to) {
                action.key = key;
            }
        }
    }
}

/// Pause actually taken after an action
pub fn effective_delay(delay: Duration) -> Duration {
    delay.max(MINIMUM_MACRO_DELAY)
}

/// Store of named macros
#[derive(Debug, Default)]
pub struct MacroEngine {
    macros: RwLock<BTreeMap<String, ActionList>>,
}

impl MacroEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(macros: BTreeMap<String, ActionList>) -> Self {
        Self {
            macros: RwLock::new(macros),
        }
    }

    /// Copy of every macro, sorted by name
    pub fn snapshot(&self) -> BTreeMap<String, ActionList> {
        self.macros.read().clone()
    }

    /// Replay macro `name`. Unknown names do nothing.
    ///
    /// The list is copied before replaying so editing it concurrently does
    /// not affect a running macro. Blocks for the whole replay.
    pub fn fire(&self, name: &str, runtime: &InputRuntime) {
        self.fire_at_depth(name, runtime, 0);
    }

    pub(crate) fn fire_at_depth(&self, name: &str, runtime: &InputRuntime, depth: usize) {
        if depth >= MAX_MACRO_DEPTH {
            warn!("Macro \"{}\" nested too deeply, skipping", name);
            return;
        }

        let Some(list) = self.get(name) else {
            return;
        };

        debug!("Firing macro \"{}\" ({} actions)", name, list.actions.len());
        for action in &list.actions {
            runtime.fire_at_depth(&action.key, action.pressed, depth + 1);
            std::thread::sleep(effective_delay(action.delay));
        }
    }

    /// Names of all macros, sorted
    pub fn names(&self) -> Vec<String> {
        self.macros.read().keys().cloned().collect()
    }

    pub fn exists(&self, name: &str) -> bool {
        self.macros.read().contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<ActionList> {
        self.macros.read().get(name).cloned()
    }

    /// Insert or overwrite macro `name`
    pub fn replace(&self, name: &str, list: ActionList) {
        self.macros.write().insert(name.to_string(), list);
    }

    /// Rename a macro. No-op when `old` is unknown or `new` is taken.
    ///
    /// Returns whether the rename happened. Macros that fire `old` are
    /// rewritten to fire `new`.
    pub fn rename(&self, old: &str, new: &str) -> bool {
        let mut macros = self.macros.write();
        if new.is_empty() || macros.contains_key(new) {
            return false;
        }
        let Some(list) = macros.remove(old) else {
            return false;
        };
        macros.insert(new.to_string(), list);
        for list in macros.values_mut() {
            list.rename_macro_refs(old, new);
        }
        true
    }

    /// Delete a macro, returning it when it existed
    pub fn remove(&self, name: &str) -> Option<ActionList> {
        self.macros.write().remove(name)
    }

    pub fn delay_type(&self, name: &str) -> Option<DelayType> {
        self.macros.read().get(name).map(|list| list.delay_type)
    }

    /// Change the recorded delay type. Unknown names do nothing.
    pub fn set_delay_type(&self, name: &str, delay_type: DelayType) {
        if let Some(list) = self.macros.write().get_mut(name) {
            list.delay_type = delay_type;
        }
    }

    /// Apply a delay policy to macro `name`
    pub fn apply_delay(
        &self,
        name: &str,
        delay_type: DelayType,
        fixed: Duration,
    ) -> Result<(), InputError> {
        let mut macros = self.macros.write();
        let list = macros
            .get_mut(name)
            .ok_or_else(|| InputError::MacroNotFound(name.to_string()))?;
        list.apply_delay(delay_type, fixed)
    }
}

/// Captures key transitions with their timing into an [`ActionList`]
#[derive(Debug, Default)]
pub struct MacroRecorder {
    actions: Vec<Action>,
    last: Option<Instant>,
    down: HashSet<i32>,
}

impl MacroRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a transition happening now
    pub fn record(&mut self, code: i32, modifiers: Modifiers, pressed: bool) {
        self.record_at(code, modifiers, pressed, Instant::now());
    }

    /// Record a transition at `at`.
    ///
    /// A press of a key that is already down is auto-repeat and ignored.
    /// Modifier keys are stored without modifiers.
    pub fn record_at(&mut self, code: i32, modifiers: Modifiers, pressed: bool, at: Instant) {
        if pressed {
            if !self.down.insert(code) {
                return;
            }
        } else {
            self.down.remove(&code);
        }

        let modifiers = if is_modifier_code(code) {
            Modifiers::empty()
        } else {
            modifiers
        };

        let delay = self
            .last
            .map(|last| at.saturating_duration_since(last))
            .unwrap_or(Duration::ZERO);
        self.last = Some(at);

        self.actions
            .push(Action::new(Key::new(code, modifiers), pressed, delay));
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Finish recording.
    ///
    /// Each delay so far measures the wait before its action; replay waits
    /// after an action, so delays move back one position and the last
    /// becomes zero.
    pub fn finish(self) -> ActionList {
        let mut actions = self.actions;
        let count = actions.len();
        for i in 0..count {
            actions[i].delay = if i + 1 < count {
                actions[i + 1].delay
            } else {
                Duration::ZERO
            };
        }
        ActionList::new(actions, DelayType::Recorded)
    }
}
