//! Character-to-key layout tables.
//!
//! `STRING` payloads and single-character combo keys are typed by looking up
//! which physical key (and whether `SHIFT`) produces each character on the
//! target machine's keyboard layout.

use crate::keys::Key;

/// One physical keystroke that produces a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stroke {
    pub key: Key,
    pub shift: bool,
}

impl Stroke {
    const fn plain(usage: u8) -> Self {
        Self {
            key: Key(usage),
            shift: false,
        }
    }

    const fn shifted(usage: u8) -> Self {
        Self {
            key: Key(usage),
            shift: true,
        }
    }
}

/// Keyboard layout of the machine receiving the keystrokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    #[default]
    Us,
    Gb,
}

impl Layout {
    /// Resolve a `LOCALE` argument.
    pub fn from_name(name: &str) -> Option<Layout> {
        match name {
            "US" => Some(Layout::Us),
            "GB" | "UK" => Some(Layout::Gb),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Layout::Us => "US",
            Layout::Gb => "GB",
        }
    }

    /// The keystroke that types `c`, or `None` if the layout cannot produce it.
    pub fn stroke(self, c: char) -> Option<Stroke> {
        match c {
            'a'..='z' => Some(Stroke::plain(Key::A.0 + (c as u8 - b'a'))),
            'A'..='Z' => Some(Stroke::shifted(Key::A.0 + (c as u8 - b'A'))),
            '1'..='9' => Some(Stroke::plain(Key::DIGIT_1.0 + (c as u8 - b'1'))),
            '0' => Some(Stroke::plain(Key::DIGIT_0.0)),
            ' ' => Some(Stroke::plain(Key::SPACE.0)),
            '\t' => Some(Stroke::plain(Key::TAB.0)),
            '\n' => Some(Stroke::plain(Key::ENTER.0)),
            _ => self
                .symbols()
                .iter()
                .find(|(symbol, _)| *symbol == c)
                .map(|(_, stroke)| *stroke),
        }
    }

    /// The character produced by `key` (with or without `SHIFT`), if printable.
    pub fn character(self, key: Key, shift: bool) -> Option<char> {
        let usage = key.0;
        match usage {
            0x04..=0x1D => {
                let c = (b'a' + (usage - 0x04)) as char;
                Some(if shift { c.to_ascii_uppercase() } else { c })
            }
            0x1E..=0x27 if !shift => Some(if usage == 0x27 {
                '0'
            } else {
                (b'1' + (usage - 0x1E)) as char
            }),
            0x2C => Some(' '),
            _ => self
                .symbols()
                .iter()
                .find(|(_, stroke)| stroke.key == key && stroke.shift == shift)
                .map(|(symbol, _)| *symbol),
        }
    }

    fn symbols(self) -> &'static [(char, Stroke)] {
        match self {
            Layout::Us => US_SYMBOLS,
            Layout::Gb => GB_SYMBOLS,
        }
    }
}

static US_SYMBOLS: &[(char, Stroke)] = &[
    ('!', Stroke::shifted(0x1E)),
    ('@', Stroke::shifted(0x1F)),
    ('#', Stroke::shifted(0x20)),
    ('$', Stroke::shifted(0x21)),
    ('%', Stroke::shifted(0x22)),
    ('^', Stroke::shifted(0x23)),
    ('&', Stroke::shifted(0x24)),
    ('*', Stroke::shifted(0x25)),
    ('(', Stroke::shifted(0x26)),
    (')', Stroke::shifted(0x27)),
    ('-', Stroke::plain(0x2D)),
    ('_', Stroke::shifted(0x2D)),
    ('=', Stroke::plain(0x2E)),
    ('+', Stroke::shifted(0x2E)),
    ('[', Stroke::plain(0x2F)),
    ('{', Stroke::shifted(0x2F)),
    (']', Stroke::plain(0x30)),
    ('}', Stroke::shifted(0x30)),
    ('\\', Stroke::plain(0x31)),
    ('|', Stroke::shifted(0x31)),
    (';', Stroke::plain(0x33)),
    (':', Stroke::shifted(0x33)),
    ('\'', Stroke::plain(0x34)),
    ('"', Stroke::shifted(0x34)),
    ('`', Stroke::plain(0x35)),
    ('~', Stroke::shifted(0x35)),
    (',', Stroke::plain(0x36)),
    ('<', Stroke::shifted(0x36)),
    ('.', Stroke::plain(0x37)),
    ('>', Stroke::shifted(0x37)),
    ('/', Stroke::plain(0x38)),
    ('?', Stroke::shifted(0x38)),
];

static GB_SYMBOLS: &[(char, Stroke)] = &[
    ('!', Stroke::shifted(0x1E)),
    ('"', Stroke::shifted(0x1F)),
    ('£', Stroke::shifted(0x20)),
    ('$', Stroke::shifted(0x21)),
    ('%', Stroke::shifted(0x22)),
    ('^', Stroke::shifted(0x23)),
    ('&', Stroke::shifted(0x24)),
    ('*', Stroke::shifted(0x25)),
    ('(', Stroke::shifted(0x26)),
    (')', Stroke::shifted(0x27)),
    ('-', Stroke::plain(0x2D)),
    ('_', Stroke::shifted(0x2D)),
    ('=', Stroke::plain(0x2E)),
    ('+', Stroke::shifted(0x2E)),
    ('[', Stroke::plain(0x2F)),
    ('{', Stroke::shifted(0x2F)),
    (']', Stroke::plain(0x30)),
    ('}', Stroke::shifted(0x30)),
    ('#', Stroke::plain(0x32)),
    ('~', Stroke::shifted(0x32)),
    (';', Stroke::plain(0x33)),
    (':', Stroke::shifted(0x33)),
    ('\'', Stroke::plain(0x34)),
    ('@', Stroke::shifted(0x34)),
    ('`', Stroke::plain(0x35)),
    ('¬', Stroke::shifted(0x35)),
    (',', Stroke::plain(0x36)),
    ('<', Stroke::shifted(0x36)),
    ('.', Stroke::plain(0x37)),
    ('>', Stroke::shifted(0x37)),
    ('/', Stroke::plain(0x38)),
    ('?', Stroke::shifted(0x38)),
    ('\\', Stroke::plain(0x64)),
    ('|', Stroke::shifted(0x64)),
];
