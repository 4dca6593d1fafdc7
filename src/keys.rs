use crate::error::ConfigError;
use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Key the engine toggle falls back to when the configured name is unusable.
pub const DEFAULT_TOGGLE_KEY: Key = Key::Letter('N');

/// Keyboard key delivered with key-release events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Uppercase ASCII letter.
    Letter(char),
    /// Top-row digit 0-9.
    Digit(u8),
    /// F1-F24.
    Function(u8),
    /// Numpad digit 0-9.
    Numpad(u8),
    Space,
    Enter,
    Tab,
    Escape,
    Back,
    Insert,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,
}

const NAMED_KEYS: [(&str, Key); 13] = [
    ("space", Key::Space),
    ("enter", Key::Enter),
    ("return", Key::Enter),
    ("tab", Key::Tab),
    ("escape", Key::Escape),
    ("back", Key::Back),
    ("insert", Key::Insert),
    ("delete", Key::Delete),
    ("home", Key::Home),
    ("end", Key::End),
    ("pageup", Key::PageUp),
    ("prior", Key::PageUp),
    ("pagedown", Key::PageDown),
];

impl Key {
    /// Parses a key name, falling back to [`DEFAULT_TOGGLE_KEY`].
    pub fn parse_or_default(name: &str) -> Key {
        name.parse().unwrap_or(DEFAULT_TOGGLE_KEY)
    }
}

fn parse_index(digits: &str, max: u8) -> Option<u8> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<u8>().ok().filter(|n| *n <= max)
}

impl FromStr for Key {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let lower = trimmed.to_ascii_lowercase();
        let unknown = || ConfigError::UnknownKey(trimmed.to_string());

        let mut chars = lower.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if c.is_ascii_alphabetic() {
                return Ok(Key::Letter(c.to_ascii_uppercase()));
            }
            if let Some(d) = c.to_digit(10) {
                return Ok(Key::Digit(d as u8));
            }
            return Err(unknown());
        }

        if let Some((_, key)) = NAMED_KEYS.iter().find(|(name, _)| *name == lower) {
            return Ok(*key);
        }

        if let Some(rest) = lower.strip_prefix("numpad") {
            return parse_index(rest, 9).map(Key::Numpad).ok_or_else(unknown);
        }

        if let Some(rest) = lower.strip_prefix('f') {
            return parse_index(rest, 24)
                .filter(|n| *n >= 1)
                .map(Key::Function)
                .ok_or_else(unknown);
        }

        // "D0".."D9" is how the host spells top-row digits.
        if let Some(rest) = lower.strip_prefix('d') {
            return parse_index(rest, 9).map(Key::Digit).ok_or_else(unknown);
        }

        Err(unknown())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Letter(c) => write!(f, "{c}"),
            Key::Digit(d) => write!(f, "D{d}"),
            Key::Function(n) => write!(f, "F{n}"),
            Key::Numpad(n) => write!(f, "NumPad{n}"),
            Key::Space => f.write_str("Space"),
            Key::Enter => f.write_str("Enter"),
            Key::Tab => f.write_str("Tab"),
            Key::Escape => f.write_str("Escape"),
            Key::Back => f.write_str("Back"),
            Key::Insert => f.write_str("Insert"),
            Key::Delete => f.write_str("Delete"),
            Key::Home => f.write_str("Home"),
            Key::End => f.write_str("End"),
            Key::PageUp => f.write_str("PageUp"),
            Key::PageDown => f.write_str("PageDown"),
        }
    }
}

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// Unknown names never fail a config load; they resolve to the default key.
impl<'de> Deserialize<'de> for Key {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Key::parse_or_default(&name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letters_are_case_insensitive() {
        assert_eq!("n".parse::<Key>().unwrap(), Key::Letter('N'));
        assert_eq!("K".parse::<Key>().unwrap(), Key::Letter('K'));
    }

    #[test]
    fn test_function_and_digit_keys() {
        assert_eq!("f5".parse::<Key>().unwrap(), Key::Function(5));
        assert_eq!("F24".parse::<Key>().unwrap(), Key::Function(24));
        assert!("F0".parse::<Key>().is_err());
        assert!("F25".parse::<Key>().is_err());
        assert_eq!("D1".parse::<Key>().unwrap(), Key::Digit(1));
        assert_eq!("7".parse::<Key>().unwrap(), Key::Digit(7));
        assert_eq!("NumPad3".parse::<Key>().unwrap(), Key::Numpad(3));
    }

    #[test]
    fn test_named_keys() {
        assert_eq!("space".parse::<Key>().unwrap(), Key::Space);
        assert_eq!(" PageDown ".parse::<Key>().unwrap(), Key::PageDown);
        assert_eq!("Return".parse::<Key>().unwrap(), Key::Enter);
    }

    #[test]
    fn test_unknown_key_falls_back() {
        assert!("definitely-not-a-key".parse::<Key>().is_err());
        assert_eq!(Key::parse_or_default("definitely-not-a-key"), DEFAULT_TOGGLE_KEY);
        assert_eq!(Key::parse_or_default(""), DEFAULT_TOGGLE_KEY);
        assert_eq!(Key::parse_or_default("Dx"), DEFAULT_TOGGLE_KEY);
    }

    #[test]
    fn test_display_parses_back() {
        for key in [Key::Letter('Q'), Key::Digit(4), Key::Function(11), Key::Numpad(0), Key::PageUp] {
            assert_eq!(key.to_string().parse::<Key>().unwrap(), key);
        }
    }
}
