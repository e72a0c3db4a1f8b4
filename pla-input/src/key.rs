//! Bindable key: either a key code with modifiers or a macro name
//!
//! # Parsing syntax
//!
//! ```text
//! K              → Key(KEY_K)
//! F5             → Key(KEY_F5)
//! Ctrl+Shift+K   → Key(KEY_K, Ctrl|Shift)
//! 240            → Key(240)          (raw code)
//! macro:Reload   → Macro("Reload")
//! none           → unset
//! ```
//!
//! The display form (`Key: Ctrl + Shift + K`, `Macro: Reload`) parses back
//! to the same key.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::keycode;

/// Code of a key with no binding
pub const UNSET_CODE: i32 = -1;

bitflags! {
    /// Modifier keys held together with a bound key
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const CTRL = 0x01;
        const ALT = 0x02;
        const SHIFT = 0x04;
        const META = 0x08;
    }
}

impl Modifiers {
    /// Key codes of the set modifiers, in press order (Shift, Ctrl, Alt, Meta)
    pub fn press_codes(self) -> impl DoubleEndedIterator<Item = i32> {
        [
            (Modifiers::SHIFT, keycode::KEY_LEFTSHIFT),
            (Modifiers::CTRL, keycode::KEY_LEFTCTRL),
            (Modifiers::ALT, keycode::KEY_LEFTALT),
            (Modifiers::META, keycode::KEY_LEFTMETA),
        ]
        .into_iter()
        .filter(move |(flag, _)| self.contains(*flag))
        .map(|(_, code)| code)
    }
}

/// Parse a modifier name to its flag
pub fn parse_modifier(name: &str) -> Option<Modifiers> {
    match name.trim().to_ascii_lowercase().as_str() {
        "ctrl" | "control" => Some(Modifiers::CTRL),
        "alt" | "option" => Some(Modifiers::ALT),
        "shift" => Some(Modifiers::SHIFT),
        "meta" | "super" | "win" | "gui" | "cmd" => Some(Modifiers::META),
        _ => None,
    }
}

/// A binding target. Immutable; compare structurally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "KeyRepr", into = "KeyRepr")]
pub struct Key {
    code: i32,
    modifiers: Modifiers,
    macro_name: Option<String>,
}

impl Default for Key {
    fn default() -> Self {
        Self::unset()
    }
}

impl Key {
    /// Key code with modifiers
    pub fn new(code: i32, modifiers: Modifiers) -> Self {
        Self {
            code,
            modifiers,
            macro_name: None,
        }
    }

    /// Key that fires the named macro
    pub fn from_macro(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            code: UNSET_CODE,
            modifiers: Modifiers::empty(),
            macro_name: (!name.is_empty()).then_some(name),
        }
    }

    /// Key with no binding
    pub fn unset() -> Self {
        Self {
            code: UNSET_CODE,
            modifiers: Modifiers::empty(),
            macro_name: None,
        }
    }

    pub fn code(&self) -> i32 {
        self.code
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn macro_name(&self) -> Option<&str> {
        self.macro_name.as_deref()
    }

    pub fn is_macro(&self) -> bool {
        self.macro_name.is_some()
    }

    /// Exactly one of a key code or a macro name is set
    pub fn is_valid(&self) -> bool {
        (self.code != UNSET_CODE) ^ self.macro_name.is_some()
    }

    /// Same key with another macro name, if it is bound to `from`
    pub fn renamed_macro(&self, from: &str, to: &str) -> Option<Key> {
        (self.macro_name() == Some(from)).then(|| Key::from_macro(to))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_valid() {
            return write!(f, "No binding");
        }

        if let Some(name) = &self.macro_name {
            return write!(f, "Macro: {name}");
        }

        write!(f, "Key: ")?;
        for (flag, name) in [
            (Modifiers::CTRL, "Ctrl"),
            (Modifiers::ALT, "Alt"),
            (Modifiers::SHIFT, "Shift"),
            (Modifiers::META, "Meta"),
        ] {
            if self.modifiers.contains(flag) {
                write!(f, "{name} + ")?;
            }
        }
        match keycode::key_name(self.code) {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "{}", self.code),
        }
    }
}

/// Error type for parsing a [`Key`] from a string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseKeyError {
    #[error("unknown key: \"{0}\"")]
    UnknownKey(String),
    #[error("unknown modifier: \"{0}\"")]
    UnknownModifier(String),
    #[error("empty macro name")]
    EmptyMacroName,
}

impl FromStr for Key {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        match s.to_ascii_lowercase().as_str() {
            "" | "none" | "unset" | "no binding" => return Ok(Key::unset()),
            _ => {}
        }

        // Macro: "macro:Name", "Macro: Name"
        if let Some((prefix, rest)) = s.split_once(':') {
            match prefix.trim().to_ascii_lowercase().as_str() {
                "macro" => {
                    let name = rest.trim();
                    if name.is_empty() {
                        return Err(ParseKeyError::EmptyMacroName);
                    }
                    return Ok(Key::from_macro(name));
                }
                "key" => return rest.parse(),
                _ => {}
            }
        }

        // "Ctrl+Shift+K"; a lone "+" stays a key name
        let parts: Vec<&str> = if s.len() > 1 {
            s.split('+').collect()
        } else {
            vec![s]
        };
        let (key_part, modifier_parts) = match parts.split_last() {
            Some((last, rest)) => (last.trim(), rest),
            None => return Err(ParseKeyError::UnknownKey(s.to_string())),
        };

        let mut modifiers = Modifiers::empty();
        for part in modifier_parts {
            modifiers |= parse_modifier(part)
                .ok_or_else(|| ParseKeyError::UnknownModifier(part.trim().to_string()))?;
        }

        let code = keycode::code_from_name(key_part)
            .ok_or_else(|| ParseKeyError::UnknownKey(key_part.to_string()))?;
        Ok(Key::new(code, modifiers))
    }
}

/// On-disk form: `key`, `mod`, `macro`
#[derive(Serialize, Deserialize)]
struct KeyRepr {
    #[serde(default = "unset_code")]
    key: i32,
    #[serde(rename = "mod", default)]
    modifiers: u8,
    #[serde(rename = "macro", default, skip_serializing_if = "String::is_empty")]
    macro_name: String,
}

fn unset_code() -> i32 {
    UNSET_CODE
}

impl From<KeyRepr> for Key {
    fn from(repr: KeyRepr) -> Self {
        if repr.macro_name.is_empty() {
            Key::new(repr.key, Modifiers::from_bits_truncate(repr.modifiers))
        } else {
            Key::from_macro(repr.macro_name)
        }
    }
}

impl From<Key> for KeyRepr {
    fn from(key: Key) -> Self {
        KeyRepr {
            key: key.code,
            modifiers: key.modifiers.bits(),
            macro_name: key.macro_name.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_and_combo() {
        assert_eq!("K".parse::<Key>().unwrap(), Key::new(37, Modifiers::empty()));
        assert_eq!("F5".parse::<Key>().unwrap(), Key::new(63, Modifiers::empty()));
        assert_eq!(
            "Ctrl+Shift+K".parse::<Key>().unwrap(),
            Key::new(37, Modifiers::CTRL | Modifiers::SHIFT)
        );
        assert_eq!(
            "alt + f4".parse::<Key>().unwrap(),
            Key::new(62, Modifiers::ALT)
        );
    }

    #[test]
    fn test_parse_macro_and_unset() {
        assert_eq!(
            "macro:Reload".parse::<Key>().unwrap(),
            Key::from_macro("Reload")
        );
        assert_eq!("none".parse::<Key>().unwrap(), Key::unset());
        assert_eq!(
            "macro:".parse::<Key>(),
            Err(ParseKeyError::EmptyMacroName)
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            "Hyper+K".parse::<Key>(),
            Err(ParseKeyError::UnknownModifier("Hyper".into()))
        );
        assert_eq!(
            "Ctrl+Nope".parse::<Key>(),
            Err(ParseKeyError::UnknownKey("Nope".into()))
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Key::unset().to_string(), "No binding");
        assert_eq!(
            Key::new(37, Modifiers::CTRL | Modifiers::SHIFT).to_string(),
            "Key: Ctrl + Shift + K"
        );
        assert_eq!(Key::from_macro("Reload").to_string(), "Macro: Reload");
        assert_eq!(Key::new(240, Modifiers::empty()).to_string(), "Key: 240");
    }

    #[test]
    fn test_display_parses_back() {
        for key in [
            Key::new(37, Modifiers::CTRL | Modifiers::SHIFT),
            Key::new(28, Modifiers::META),
            Key::from_macro("Reload"),
            Key::unset(),
        ] {
            assert_eq!(key.to_string().parse::<Key>().unwrap(), key);
        }
    }

    #[test]
    fn test_validity() {
        assert!(!Key::unset().is_valid());
        assert!(Key::new(30, Modifiers::empty()).is_valid());
        assert!(Key::from_macro("m").is_valid());
        assert!(!Key::from_macro("").is_valid());
    }

    #[test]
    fn test_press_order() {
        let codes: Vec<i32> = Modifiers::all().press_codes().collect();
        assert_eq!(
            codes,
            vec![
                keycode::KEY_LEFTSHIFT,
                keycode::KEY_LEFTCTRL,
                keycode::KEY_LEFTALT,
                keycode::KEY_LEFTMETA
            ]
        );
    }

    #[test]
    fn test_toml_form() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            slot: Key,
        }

        let text = toml::to_string(&Wrapper {
            slot: Key::new(37, Modifiers::CTRL),
        })
        .unwrap();
        assert!(text.contains("key = 37"));
        assert!(text.contains("mod = 1"));

        let parsed: Wrapper = toml::from_str("[slot]\nkey = 5\nmacro = \"Reload\"\n").unwrap();
        assert_eq!(parsed.slot, Key::from_macro("Reload"));
        assert_eq!(parsed.slot.code(), UNSET_CODE);
    }
}
