//! The [`Directive`] type produced by resolving one script line.

use crate::keys::Key;
use crate::layout::Layout;
use crate::status::Rgb;

/// Most keys a single combo line may hold at once.
pub const MAX_COMBO_KEYS: usize = 8;

/// An ordered set of keys pressed together, stored inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyCombo {
    keys: [Key; MAX_COMBO_KEYS],
    len: usize,
}

impl KeyCombo {
    pub fn new() -> Self {
        Self {
            keys: [Key(0); MAX_COMBO_KEYS],
            len: 0,
        }
    }

    /// Append `key`, ignoring duplicates. Returns `false` if the combo is full.
    pub fn push(&mut self, key: Key) -> bool {
        if self.keys().contains(&key) {
            return true;
        }
        if self.len == MAX_COMBO_KEYS {
            return false;
        }
        self.keys[self.len] = key;
        self.len += 1;
        true
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for KeyCombo {
    fn default() -> Self {
        Self::new()
    }
}

/// One resolved script instruction.
///
/// Borrowed payloads point into the source line, so resolving a line never
/// copies its text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive<'a> {
    /// A single key, pressed and released.
    KeyPress(Key),
    /// Several keys pressed in order, then released in reverse order.
    KeyCombo(KeyCombo),
    /// Type each character of the text.
    TypeString(&'a str),
    /// One-shot pause in milliseconds before the next line.
    Delay(u32),
    /// Run the previous keystroke line this many more times.
    Repeat(u32),
    /// New automatic pause in milliseconds after every following line.
    DefaultDelay(u32),
    /// Switch the character layout.
    Locale(Layout),
    /// Set the status indicator colour.
    Led(Rgb),
    Comment,
    /// Unrecognised or malformed line; carries the keyword.
    Unknown(&'a str),
}

impl Directive<'_> {
    /// Whether this directive only changes runtime state without emitting keys.
    pub fn is_control(&self) -> bool {
        !matches!(
            self,
            Directive::KeyPress(_) | Directive::KeyCombo(_) | Directive::TypeString(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combo_push_and_dedup() {
        let mut combo = KeyCombo::new();
        assert!(combo.push(Key::LEFT_CTRL));
        assert!(combo.push(Key::LEFT_ALT));
        assert!(combo.push(Key::LEFT_CTRL));
        assert_eq!(combo.keys(), &[Key::LEFT_CTRL, Key::LEFT_ALT]);
    }

    #[test]
    fn test_combo_capacity() {
        let mut combo = KeyCombo::new();
        for usage in 0..MAX_COMBO_KEYS as u8 {
            assert!(combo.push(Key(0x04 + usage)));
        }
        assert!(!combo.push(Key::ENTER));
        assert_eq!(combo.len(), MAX_COMBO_KEYS);
    }

    #[test]
    fn test_is_control() {
        assert!(Directive::Delay(10).is_control());
        assert!(Directive::Comment.is_control());
        assert!(Directive::Unknown("FOO").is_control());
        assert!(!Directive::KeyPress(Key::ENTER).is_control());
        assert!(!Directive::TypeString("x").is_control());
    }
}
