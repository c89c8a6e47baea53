//! Line resolver for the duckscript language.
//!
//! The entry points are [`parse_line`], which turns one line into a
//! [`Directive`] without touching any runtime state, and [`parse_str`], which
//! resolves a whole script while following its `LOCALE` changes.

use crate::directive::{Directive, KeyCombo};
use crate::keys::Key;
use crate::layout::Layout;
use crate::status::Rgb;

/// Resolve one script line.
///
/// The line is trimmed and split at the first whitespace into a keyword and
/// its argument text. Keywords are case-sensitive. A line that is not a
/// keyword is read as a key combo (`CTRL ALT DEL`, `GUI r`); if any token is
/// not a key the line resolves to [`Directive::Unknown`].
///
/// Resolution never fails: malformed arguments also yield `Unknown`, which the
/// runtime treats as a no-op.
///
/// # Example
///
/// ```
/// use duckscript::{Directive, Layout, parse_line};
///
/// assert_eq!(parse_line("DELAY 250", Layout::Us), Directive::Delay(250));
/// assert_eq!(parse_line("STRING hi there", Layout::Us), Directive::TypeString("hi there"));
/// ```
pub fn parse_line(line: &str, layout: Layout) -> Directive<'_> {
    let line = line.trim();
    if line.is_empty() {
        return Directive::Comment;
    }
    let (keyword, args) = line.split_once(char::is_whitespace).unwrap_or((line, ""));

    let resolved = match REGISTRY.iter().find(|(name, _)| *name == keyword) {
        Some((_, parse)) => parse(args),
        None => parse_combo(line, layout),
    };
    resolved.unwrap_or(Directive::Unknown(keyword))
}

/// Resolve every line of `content`, one directive per line.
///
/// `LOCALE` lines change the layout used for the lines after them.
pub fn parse_str(content: &str, layout: Layout) -> Vec<Directive<'_>> {
    let mut layout = layout;
    content
        .lines()
        .map(|line| {
            let directive = parse_line(line, layout);
            if let Directive::Locale(next) = directive {
                layout = next;
            }
            directive
        })
        .collect()
}

type ParseFn = fn(&str) -> Option<Directive<'_>>;

static REGISTRY: &[(&str, ParseFn)] = &[
    ("STRING", parse_string),
    ("DELAY", parse_delay),
    ("DEFAULTDELAY", parse_default_delay),
    ("DEFAULT_DELAY", parse_default_delay),
    ("REPEAT", parse_repeat),
    ("REPLAY", parse_repeat),
    ("REM", parse_comment),
    ("LOCALE", parse_locale),
    ("LED", parse_led),
    ("KEYCODE", parse_keycode),
];

fn parse_string(args: &str) -> Option<Directive<'_>> {
    Some(Directive::TypeString(args))
}

fn parse_delay(args: &str) -> Option<Directive<'_>> {
    parse_millis(args).map(Directive::Delay)
}

fn parse_default_delay(args: &str) -> Option<Directive<'_>> {
    parse_millis(args).map(Directive::DefaultDelay)
}

fn parse_repeat(args: &str) -> Option<Directive<'_>> {
    if args.trim().is_empty() {
        return Some(Directive::Repeat(1));
    }
    parse_millis(args).map(Directive::Repeat)
}

fn parse_comment(_args: &str) -> Option<Directive<'_>> {
    Some(Directive::Comment)
}

fn parse_locale(args: &str) -> Option<Directive<'_>> {
    Layout::from_name(args.trim()).map(Directive::Locale)
}

fn parse_led(args: &str) -> Option<Directive<'_>> {
    let mut parts = args.split_whitespace().map(parse_byte);
    let rgb = Rgb {
        r: parts.next()??,
        g: parts.next()??,
        b: parts.next()??,
    };
    parts.next().is_none().then_some(Directive::Led(rgb))
}

/// `KEYCODE <modifiers> <usage>...`: a raw modifier bitmask followed by HID usage IDs.
fn parse_keycode(args: &str) -> Option<Directive<'_>> {
    let mut bytes = args.split_whitespace().map(parse_byte);
    let mask = bytes.next()??;
    let mut combo = KeyCombo::new();
    for key in Key::modifiers_in(mask) {
        combo.push(key);
    }
    for usage in bytes {
        if !combo.push(Key(usage?)) {
            return None;
        }
    }
    if combo.is_empty() {
        return None;
    }
    Some(Directive::KeyCombo(combo))
}

fn parse_combo(line: &str, layout: Layout) -> Option<Directive<'_>> {
    let mut combo = KeyCombo::new();
    for token in line.split_whitespace() {
        let fits = match Key::from_name(token) {
            Some(key) => combo.push(key),
            None => {
                let stroke = single_char(token).and_then(|c| layout.stroke(c))?;
                (!stroke.shift || combo.push(Key::LEFT_SHIFT)) && combo.push(stroke.key)
            }
        };
        if !fits {
            return None;
        }
    }
    match combo.keys() {
        [] => None,
        [key] => Some(Directive::KeyPress(*key)),
        _ => Some(Directive::KeyCombo(combo)),
    }
}

fn single_char(token: &str) -> Option<char> {
    let mut chars = token.chars();
    let c = chars.next()?;
    chars.next().is_none().then_some(c)
}

fn parse_millis(s: &str) -> Option<u32> {
    s.trim().parse().ok()
}

/// Parse `0x1F` or `31`.
fn parse_byte(s: &str) -> Option<u8> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}
