use super::{HidTransport, TransportError};
use crate::keys::Key;
use async_trait::async_trait;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::trace;

/// Key slots in a boot-protocol keyboard report.
const ROLLOVER: usize = 6;

/// Transport that writes 8-byte boot-protocol keyboard reports.
///
/// Every press or release writes the full current state: modifier bitmask,
/// a reserved byte, then up to six held key usages. On Linux the writer is
/// typically a USB gadget HID function such as `/dev/hidg0`.
pub struct ReportTransport<W> {
    state: Mutex<ReportState<W>>,
}

struct ReportState<W> {
    writer: W,
    modifiers: u8,
    keys: [u8; ROLLOVER],
}

impl<W> ReportState<W> {
    fn report(&self) -> [u8; 8] {
        let mut report = [0u8; 8];
        report[0] = self.modifiers;
        report[2..].copy_from_slice(&self.keys);
        report
    }

    fn hold(&mut self, key: Key) -> Result<(), TransportError> {
        if let Some(bit) = key.modifier_bit() {
            self.modifiers |= bit;
            return Ok(());
        }
        if self.keys.contains(&key.0) {
            return Ok(());
        }
        let slot = self
            .keys
            .iter_mut()
            .find(|slot| **slot == 0)
            .ok_or(TransportError::Rollover(key))?;
        *slot = key.0;
        Ok(())
    }

    fn lift(&mut self, key: Key) {
        if let Some(bit) = key.modifier_bit() {
            self.modifiers &= !bit;
        } else if let Some(slot) = self.keys.iter_mut().find(|slot| **slot == key.0) {
            *slot = 0;
        }
    }
}

impl<W: Write> ReportTransport<W> {
    pub fn new(writer: W) -> Self {
        Self {
            state: Mutex::new(ReportState {
                writer,
                modifiers: 0,
                keys: [0; ROLLOVER],
            }),
        }
    }

    pub fn into_inner(self) -> W {
        self.state
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .writer
    }

    fn lock(&self) -> MutexGuard<'_, ReportState<W>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn send(state: &mut ReportState<W>) -> Result<(), TransportError> {
        let report = state.report();
        trace!(?report, "hid report");
        state.writer.write_all(&report)?;
        state.writer.flush()?;
        Ok(())
    }
}

impl ReportTransport<File> {
    /// Open a HID gadget device for writing.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new().write(true).open(path)?;
        Ok(Self::new(file))
    }
}

#[async_trait]
impl<W: Write + Send> HidTransport for ReportTransport<W> {
    async fn press_key(&self, key: Key) -> Result<(), TransportError> {
        let mut state = self.lock();
        state.hold(key)?;
        Self::send(&mut state)
    }

    async fn release_key(&self, key: Key) -> Result<(), TransportError> {
        let mut state = self.lock();
        state.lift(key);
        Self::send(&mut state)
    }
}
