//! Keyboard key identifiers.
//!
//! A [`Key`] is a HID usage ID from the keyboard/keypad usage page (0x07).
//! Modifier keys live in the `0xE0..=0xE7` range and map onto the bits of the
//! boot-protocol modifier byte.

use std::fmt;

/// A single keyboard key, identified by its HID usage ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key(pub u8);

impl Key {
    /// `a`; the letters run contiguously through `z` (0x1D).
    pub const A: Key = Key(0x04);
    /// `1`; the digits run contiguously through `9` (0x26), then `0` (0x27).
    pub const DIGIT_1: Key = Key(0x1E);
    pub const DIGIT_0: Key = Key(0x27);
    pub const ENTER: Key = Key(0x28);
    pub const ESCAPE: Key = Key(0x29);
    pub const BACKSPACE: Key = Key(0x2A);
    pub const TAB: Key = Key(0x2B);
    pub const SPACE: Key = Key(0x2C);
    pub const CAPS_LOCK: Key = Key(0x39);
    pub const F1: Key = Key(0x3A);
    pub const F2: Key = Key(0x3B);
    pub const F3: Key = Key(0x3C);
    pub const F4: Key = Key(0x3D);
    pub const F5: Key = Key(0x3E);
    pub const F6: Key = Key(0x3F);
    pub const F7: Key = Key(0x40);
    pub const F8: Key = Key(0x41);
    pub const F9: Key = Key(0x42);
    pub const F10: Key = Key(0x43);
    pub const F11: Key = Key(0x44);
    pub const F12: Key = Key(0x45);
    pub const PRINT_SCREEN: Key = Key(0x46);
    pub const SCROLL_LOCK: Key = Key(0x47);
    pub const PAUSE: Key = Key(0x48);
    pub const INSERT: Key = Key(0x49);
    pub const HOME: Key = Key(0x4A);
    pub const PAGE_UP: Key = Key(0x4B);
    pub const DELETE: Key = Key(0x4C);
    pub const END: Key = Key(0x4D);
    pub const PAGE_DOWN: Key = Key(0x4E);
    pub const RIGHT: Key = Key(0x4F);
    pub const LEFT: Key = Key(0x50);
    pub const DOWN: Key = Key(0x51);
    pub const UP: Key = Key(0x52);
    pub const NUM_LOCK: Key = Key(0x53);
    pub const MENU: Key = Key(0x65);
    pub const LEFT_CTRL: Key = Key(0xE0);
    pub const LEFT_SHIFT: Key = Key(0xE1);
    pub const LEFT_ALT: Key = Key(0xE2);
    pub const LEFT_GUI: Key = Key(0xE3);
    pub const RIGHT_CTRL: Key = Key(0xE4);
    pub const RIGHT_SHIFT: Key = Key(0xE5);
    pub const RIGHT_ALT: Key = Key(0xE6);
    pub const RIGHT_GUI: Key = Key(0xE7);

    /// Look up a key by its script name (`ENTER`, `CTRL`, `F5`, ...).
    ///
    /// Names are case-sensitive.
    pub fn from_name(name: &str) -> Option<Key> {
        NAMED_KEYS
            .iter()
            .find(|(key_name, _)| *key_name == name)
            .map(|(_, key)| *key)
    }

    /// The canonical script name of this key, if it has one.
    pub fn name(self) -> Option<&'static str> {
        NAMED_KEYS
            .iter()
            .find(|(_, key)| *key == self)
            .map(|(name, _)| *name)
    }

    pub fn is_modifier(self) -> bool {
        (0xE0..=0xE7).contains(&self.0)
    }

    /// The bit this key occupies in the boot-report modifier byte.
    pub fn modifier_bit(self) -> Option<u8> {
        self.is_modifier().then(|| 1 << (self.0 - 0xE0))
    }

    /// The modifier keys whose bits are set in `mask`, lowest bit first.
    pub fn modifiers_in(mask: u8) -> impl Iterator<Item = Key> {
        (0..8u8)
            .filter(move |bit| mask & (1 << *bit) != 0)
            .map(|bit| Key(0xE0 + bit))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "0x{:02X}", self.0),
        }
    }
}

// The first entry for a key is its canonical name.
static NAMED_KEYS: &[(&str, Key)] = &[
    ("ENTER", Key::ENTER),
    ("TAB", Key::TAB),
    ("SPACE", Key::SPACE),
    ("ESC", Key::ESCAPE),
    ("ESCAPE", Key::ESCAPE),
    ("BACKSPACE", Key::BACKSPACE),
    ("DELETE", Key::DELETE),
    ("DEL", Key::DELETE),
    ("INSERT", Key::INSERT),
    ("HOME", Key::HOME),
    ("END", Key::END),
    ("PAGEUP", Key::PAGE_UP),
    ("PAGEDOWN", Key::PAGE_DOWN),
    ("UP", Key::UP),
    ("UPARROW", Key::UP),
    ("DOWN", Key::DOWN),
    ("DOWNARROW", Key::DOWN),
    ("LEFT", Key::LEFT),
    ("LEFTARROW", Key::LEFT),
    ("RIGHT", Key::RIGHT),
    ("RIGHTARROW", Key::RIGHT),
    ("CAPSLOCK", Key::CAPS_LOCK),
    ("NUMLOCK", Key::NUM_LOCK),
    ("SCROLLLOCK", Key::SCROLL_LOCK),
    ("PRINTSCREEN", Key::PRINT_SCREEN),
    ("PAUSE", Key::PAUSE),
    ("BREAK", Key::PAUSE),
    ("MENU", Key::MENU),
    ("APP", Key::MENU),
    ("CTRL", Key::LEFT_CTRL),
    ("CONTROL", Key::LEFT_CTRL),
    ("SHIFT", Key::LEFT_SHIFT),
    ("ALT", Key::LEFT_ALT),
    ("GUI", Key::LEFT_GUI),
    ("WINDOWS", Key::LEFT_GUI),
    ("COMMAND", Key::LEFT_GUI),
    ("RCTRL", Key::RIGHT_CTRL),
    ("RSHIFT", Key::RIGHT_SHIFT),
    ("RALT", Key::RIGHT_ALT),
    ("RGUI", Key::RIGHT_GUI),
    ("F1", Key::F1),
    ("F2", Key::F2),
    ("F3", Key::F3),
    ("F4", Key::F4),
    ("F5", Key::F5),
    ("F6", Key::F6),
    ("F7", Key::F7),
    ("F8", Key::F8),
    ("F9", Key::F9),
    ("F10", Key::F10),
    ("F11", Key::F11),
    ("F12", Key::F12),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(Key::from_name("ENTER"), Some(Key::ENTER));
        assert_eq!(Key::from_name("WINDOWS"), Some(Key::LEFT_GUI));
        assert_eq!(Key::from_name("F12"), Some(Key::F12));
        assert_eq!(Key::from_name("enter"), None);
        assert_eq!(Key::from_name("F13"), None);
    }

    #[test]
    fn test_canonical_name() {
        assert_eq!(Key::ESCAPE.name(), Some("ESC"));
        assert_eq!(Key::LEFT_GUI.to_string(), "GUI");
        assert_eq!(Key(0x04).to_string(), "0x04");
    }

    #[test]
    fn test_modifier_bits() {
        assert_eq!(Key::LEFT_CTRL.modifier_bit(), Some(0x01));
        assert_eq!(Key::LEFT_SHIFT.modifier_bit(), Some(0x02));
        assert_eq!(Key::RIGHT_GUI.modifier_bit(), Some(0x80));
        assert_eq!(Key::ENTER.modifier_bit(), None);
        assert!(!Key::ENTER.is_modifier());
    }

    #[test]
    fn test_modifiers_in_mask() {
        let keys: Vec<Key> = Key::modifiers_in(0x05).collect();
        assert_eq!(keys, vec![Key::LEFT_CTRL, Key::LEFT_ALT]);
        assert_eq!(Key::modifiers_in(0).count(), 0);
    }
}
