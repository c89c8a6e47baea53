use super::{HidTransport, TransportError};
use crate::keys::Key;
use crate::layout::Layout;
use anyhow::Context;
use async_trait::async_trait;
use portable_pty::{Child, CommandBuilder, MasterPty, PtySize};
use std::io::{Read, Write};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use tracing::{debug, trace};

type OutputHandler = Box<dyn Fn(&[u8]) + Send>;

/// Transport that types into a program running inside a PTY.
///
/// Key transitions are translated into the bytes a terminal would send:
/// printable keys through the layout, `CTRL`+letter as a control character,
/// `ALT` as an `ESC` prefix and navigation keys as escape sequences. Useful
/// for trying scripts on a host without USB hardware.
pub struct PtyTransport {
    session: Mutex<PtySession>,
    layout: Layout,
}

struct PtySession {
    _master: Box<dyn MasterPty + Send>,
    child: Box<dyn Child + Send + Sync>,
    writer: Box<dyn Write + Send>,
    modifiers: u8,
}

impl PtyTransport {
    /// Spawn `command` in a PTY, echoing its output to stdout.
    pub fn spawn(command: &str, args: &[String], layout: Layout) -> Result<Self, TransportError> {
        Self::spawn_with_handler(command, args, layout, |data| {
            let mut stdout = std::io::stdout();
            let _ = stdout.write_all(data);
            let _ = stdout.flush();
        })
    }

    /// Spawn `command` in a PTY, passing its output to `handler`.
    pub fn spawn_with_handler(
        command: &str,
        args: &[String],
        layout: Layout,
        handler: impl Fn(&[u8]) + Send + 'static,
    ) -> Result<Self, TransportError> {
        let pty_system = portable_pty::native_pty_system();
        let pair = pty_system
            .openpty(PtySize {
                rows: 24,
                cols: 80,
                pixel_width: 0,
                pixel_height: 0,
            })
            .context("Failed to open PTY")
            .map_err(TransportError::Pty)?;

        let mut cmd = CommandBuilder::new(command);
        for arg in args {
            cmd.arg(arg);
        }
        let child = pair
            .slave
            .spawn_command(cmd)
            .context("Failed to spawn command")
            .map_err(TransportError::Pty)?;

        let writer = pair
            .master
            .take_writer()
            .context("Failed to get PTY writer")
            .map_err(TransportError::Pty)?;
        let reader = pair
            .master
            .try_clone_reader()
            .context("Failed to get PTY reader")
            .map_err(TransportError::Pty)?;
        spawn_reader(reader, Box::new(handler));
        debug!(command, "spawned PTY transport");

        Ok(Self {
            session: Mutex::new(PtySession {
                _master: pair.master,
                child,
                writer,
                modifiers: 0,
            }),
            layout,
        })
    }

    /// Wait for the program in the PTY to exit.
    pub fn wait(&self) -> Result<(), TransportError> {
        self.lock().child.wait()?;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, PtySession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl HidTransport for PtyTransport {
    async fn press_key(&self, key: Key) -> Result<(), TransportError> {
        let mut session = self.lock();
        if let Some(bit) = key.modifier_bit() {
            session.modifiers |= bit;
            return Ok(());
        }
        let bytes = encode(self.layout, key, session.modifiers)
            .ok_or(TransportError::Unsupported(key))?;
        trace!(?bytes, "pty input");
        session.writer.write_all(&bytes)?;
        session.writer.flush()?;
        Ok(())
    }

    async fn release_key(&self, key: Key) -> Result<(), TransportError> {
        if let Some(bit) = key.modifier_bit() {
            self.lock().modifiers &= !bit;
        }
        Ok(())
    }
}

const CTRL: u8 = 0x11;
const SHIFT: u8 = 0x22;
const ALT: u8 = 0x44;
const GUI: u8 = 0x88;

/// Terminal bytes for pressing `key` while `modifiers` are held.
fn encode(layout: Layout, key: Key, modifiers: u8) -> Option<Vec<u8>> {
    if modifiers & GUI != 0 {
        return None;
    }
    let mut bytes = Vec::new();
    if modifiers & ALT != 0 {
        bytes.push(0x1b);
    }
    if let Some(sequence) = escape_sequence(key) {
        bytes.extend_from_slice(sequence);
        return Some(bytes);
    }

    let c = layout.character(key, modifiers & SHIFT != 0)?;
    if modifiers & CTRL != 0 {
        let lower = c.to_ascii_lowercase();
        if !lower.is_ascii_lowercase() {
            return None;
        }
        // Ctrl-letter maps to ASCII 1-26
        bytes.push(lower as u8 - b'a' + 1);
    } else {
        let mut buf = [0u8; 4];
        bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
    }
    Some(bytes)
}

fn escape_sequence(key: Key) -> Option<&'static [u8]> {
    let sequence: &[u8] = match key {
        Key::ENTER => b"\r",
        Key::TAB => b"\t",
        Key::ESCAPE => b"\x1b",
        Key::BACKSPACE => b"\x7f",
        Key::UP => b"\x1b[A",
        Key::DOWN => b"\x1b[B",
        Key::RIGHT => b"\x1b[C",
        Key::LEFT => b"\x1b[D",
        Key::HOME => b"\x1b[H",
        Key::END => b"\x1b[F",
        Key::PAGE_UP => b"\x1b[5~",
        Key::PAGE_DOWN => b"\x1b[6~",
        Key::INSERT => b"\x1b[2~",
        Key::DELETE => b"\x1b[3~",
        Key::F1 => b"\x1bOP",
        Key::F2 => b"\x1bOQ",
        Key::F3 => b"\x1bOR",
        Key::F4 => b"\x1bOS",
        Key::F5 => b"\x1b[15~",
        Key::F6 => b"\x1b[17~",
        Key::F7 => b"\x1b[18~",
        Key::F8 => b"\x1b[19~",
        Key::F9 => b"\x1b[20~",
        Key::F10 => b"\x1b[21~",
        Key::F11 => b"\x1b[23~",
        Key::F12 => b"\x1b[24~",
        _ => return None,
    };
    Some(sequence)
}

/// Forward PTY output to `handler` from a background thread until EOF.
fn spawn_reader(mut reader: Box<dyn Read + Send>, handler: OutputHandler) {
    thread::spawn(move || {
        let mut buffer = [0u8; 4096];
        loop {
            match reader.read(&mut buffer) {
                Ok(0) | Err(_) => break,
                Ok(n) => handler(&buffer[..n]),
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_printable() {
        assert_eq!(encode(Layout::Us, Key::A, 0), Some(b"a".to_vec()));
        assert_eq!(encode(Layout::Us, Key::A, 0x02), Some(b"A".to_vec()));
        assert_eq!(encode(Layout::Us, Key(0x1F), 0x20), Some(b"@".to_vec()));
    }

    #[test]
    fn test_encode_ctrl_letter() {
        assert_eq!(encode(Layout::Us, Key(0x06), 0x01), Some(vec![0x03]));
        assert_eq!(encode(Layout::Us, Key(0x06), 0x11), Some(vec![0x03]));
    }

    #[test]
    fn test_encode_alt_prefixes_escape() {
        assert_eq!(encode(Layout::Us, Key(0x1B), 0x04), Some(b"\x1bx".to_vec()));
        assert_eq!(encode(Layout::Us, Key::ENTER, 0x04), Some(b"\x1b\r".to_vec()));
    }

    #[test]
    fn test_encode_navigation() {
        assert_eq!(encode(Layout::Us, Key::UP, 0), Some(b"\x1b[A".to_vec()));
        assert_eq!(encode(Layout::Us, Key::F5, 0), Some(b"\x1b[15~".to_vec()));
    }

    #[test]
    fn test_encode_unsupported() {
        assert_eq!(encode(Layout::Us, Key::A, 0x08), None);
        assert_eq!(encode(Layout::Us, Key::CAPS_LOCK, 0), None);
        assert_eq!(encode(Layout::Us, Key::DIGIT_1, 0x01), None);
    }
}
