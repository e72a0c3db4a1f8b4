//! Linux input event key codes and their names
//!
//! Only the subset a keyboard binding can reasonably target is named here.
//! Anything else can still be bound by its numeric code.

/// Modifier key codes used when a bound key carries modifiers
pub const KEY_LEFTCTRL: i32 = 29;
pub const KEY_LEFTSHIFT: i32 = 42;
pub const KEY_LEFTALT: i32 = 56;
pub const KEY_LEFTMETA: i32 = 125;
pub const KEY_RIGHTCTRL: i32 = 97;
pub const KEY_RIGHTSHIFT: i32 = 54;
pub const KEY_RIGHTALT: i32 = 100;
pub const KEY_RIGHTMETA: i32 = 126;

pub const KEY_ESC: i32 = 1;

/// Highest code the virtual keyboard registers
pub const KEY_MAX_INJECTABLE: i32 = 248;

/// Canonical display names, indexed by code
const NAMES: &[(i32, &str)] = &[
    (1, "Esc"),
    (2, "1"),
    (3, "2"),
    (4, "3"),
    (5, "4"),
    (6, "5"),
    (7, "6"),
    (8, "7"),
    (9, "8"),
    (10, "9"),
    (11, "0"),
    (12, "-"),
    (13, "="),
    (14, "Backspace"),
    (15, "Tab"),
    (16, "Q"),
    (17, "W"),
    (18, "E"),
    (19, "R"),
    (20, "T"),
    (21, "Y"),
    (22, "U"),
    (23, "I"),
    (24, "O"),
    (25, "P"),
    (26, "["),
    (27, "]"),
    (28, "Enter"),
    (29, "L Ctrl"),
    (30, "A"),
    (31, "S"),
    (32, "D"),
    (33, "F"),
    (34, "G"),
    (35, "H"),
    (36, "J"),
    (37, "K"),
    (38, "L"),
    (39, ";"),
    (40, "'"),
    (41, "`"),
    (42, "L Shift"),
    (43, "\\"),
    (44, "Z"),
    (45, "X"),
    (46, "C"),
    (47, "V"),
    (48, "B"),
    (49, "N"),
    (50, "M"),
    (51, ","),
    (52, "."),
    (53, "/"),
    (54, "R Shift"),
    (55, "Num *"),
    (56, "Alt"),
    (57, "Space"),
    (58, "CapsLock"),
    (59, "F1"),
    (60, "F2"),
    (61, "F3"),
    (62, "F4"),
    (63, "F5"),
    (64, "F6"),
    (65, "F7"),
    (66, "F8"),
    (67, "F9"),
    (68, "F10"),
    (69, "NumLock"),
    (70, "ScrollLock"),
    (71, "Num 7"),
    (72, "Num 8"),
    (73, "Num 9"),
    (74, "Num -"),
    (75, "Num 4"),
    (76, "Num 5"),
    (77, "Num 6"),
    (78, "Num +"),
    (79, "Num 1"),
    (80, "Num 2"),
    (81, "Num 3"),
    (82, "Num 0"),
    (83, "Num ."),
    (87, "F11"),
    (88, "F12"),
    (96, "Num Enter"),
    (97, "R Ctrl"),
    (98, "Num /"),
    (99, "PrintScreen"),
    (100, "AltGr"),
    (102, "Home"),
    (103, "Up"),
    (104, "PageUp"),
    (105, "Left"),
    (106, "Right"),
    (107, "End"),
    (108, "Down"),
    (109, "PageDown"),
    (110, "Insert"),
    (111, "Delete"),
    (113, "Mute"),
    (114, "VolumeDown"),
    (115, "VolumeUp"),
    (119, "Pause"),
    (125, "Meta"),
    (126, "R Meta"),
    (127, "Menu"),
    (183, "F13"),
    (184, "F14"),
    (185, "F15"),
    (186, "F16"),
    (187, "F17"),
    (188, "F18"),
    (189, "F19"),
    (190, "F20"),
    (191, "F21"),
    (192, "F22"),
    (193, "F23"),
    (194, "F24"),
];

/// Display name for `code`, `None` for codes without a name
pub fn key_name(code: i32) -> Option<&'static str> {
    NAMES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

/// Look up a key code by name (case-insensitive, spaces ignored).
///
/// Accepts the display names above, common aliases and `KEY_*` constant
/// names. Numeric strings are taken as raw codes.
pub fn code_from_name(name: &str) -> Option<i32> {
    let normalized: String = name
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();
    let normalized = normalized.strip_prefix("KEY_").unwrap_or(&normalized);

    if let Some(code) = alias(normalized) {
        return Some(code);
    }

    if let Some((code, _)) = NAMES
        .iter()
        .find(|(_, n)| n.replace(' ', "").to_uppercase() == normalized)
    {
        return Some(*code);
    }

    // Single digits matched their key above, longer numbers are raw codes
    normalized.parse::<i32>().ok().filter(|code| *code > 0)
}

fn alias(name: &str) -> Option<i32> {
    Some(match name {
        "ESCAPE" => 1,
        "MINUS" => 12,
        "EQUAL" | "EQUALS" => 13,
        "BKSP" => 14,
        "LEFTBRACE" | "LBRACKET" => 26,
        "RIGHTBRACE" | "RBRACKET" => 27,
        "RETURN" => 28,
        "CTRL" | "CONTROL" | "LCTRL" | "LEFTCTRL" => KEY_LEFTCTRL,
        "SEMICOLON" => 39,
        "APOSTROPHE" | "QUOTE" => 40,
        "GRAVE" | "BACKTICK" => 41,
        "SHIFT" | "LSHIFT" | "LEFTSHIFT" => KEY_LEFTSHIFT,
        "BACKSLASH" => 43,
        "COMMA" => 51,
        "DOT" | "PERIOD" => 52,
        "SLASH" => 53,
        "RSHIFT" | "RIGHTSHIFT" => KEY_RIGHTSHIFT,
        "ALT" | "LALT" | "LEFTALT" => KEY_LEFTALT,
        "CAPS" => 58,
        "PRTSC" | "SYSRQ" => 99,
        "RCTRL" | "RIGHTCTRL" => KEY_RIGHTCTRL,
        "RALT" | "RIGHTALT" => KEY_RIGHTALT,
        "PGUP" => 104,
        "PGDN" => 109,
        "INS" => 110,
        "DEL" => 111,
        "META" | "SUPER" | "WIN" | "LMETA" | "LEFTMETA" => KEY_LEFTMETA,
        "RMETA" | "RIGHTMETA" => KEY_RIGHTMETA,
        "COMPOSE" => 127,
        _ => return None,
    })
}

/// Whether `code` is one of the eight modifier keys
pub fn is_modifier_code(code: i32) -> bool {
    matches!(
        code,
        KEY_LEFTCTRL
            | KEY_LEFTSHIFT
            | KEY_LEFTALT
            | KEY_LEFTMETA
            | KEY_RIGHTCTRL
            | KEY_RIGHTSHIFT
            | KEY_RIGHTALT
            | KEY_RIGHTMETA
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_resolve() {
        assert_eq!(code_from_name("A"), Some(30));
        assert_eq!(code_from_name("a"), Some(30));
        assert_eq!(code_from_name("F5"), Some(63));
        assert_eq!(code_from_name("F24"), Some(194));
        assert_eq!(code_from_name("Enter"), Some(28));
        assert_eq!(code_from_name("Escape"), Some(1));
        assert_eq!(code_from_name("KEY_SPACE"), Some(57));
        assert_eq!(code_from_name("Num 7"), Some(71));
        assert_eq!(code_from_name("pageup"), Some(104));
    }

    #[test]
    fn test_digits_are_keys_numbers_are_codes() {
        assert_eq!(code_from_name("1"), Some(2));
        assert_eq!(code_from_name("0"), Some(11));
        assert_eq!(code_from_name("30"), Some(30));
    }

    #[test]
    fn test_unknown_name() {
        assert_eq!(code_from_name("NotAKey"), None);
        assert_eq!(code_from_name(""), None);
    }

    #[test]
    fn test_key_name_roundtrip() {
        for (code, _) in NAMES {
            let name = key_name(*code).unwrap();
            assert_eq!(code_from_name(name), Some(*code), "name {name}");
        }
    }

    #[test]
    fn test_modifier_codes() {
        assert!(is_modifier_code(KEY_LEFTCTRL));
        assert!(is_modifier_code(KEY_RIGHTMETA));
        assert!(!is_modifier_code(30));
    }
}
