use super::{HidTransport, KeyEvent, Phase, TransportError};
use crate::keys::Key;
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::time::Instant;
use tracing::debug;

/// Transport that records every key transition instead of sending it.
///
/// Used for dry runs and as the observable end of the runtime in tests.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    events: Mutex<Vec<(Instant, KeyEvent)>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded events, oldest first.
    pub fn events(&self) -> Vec<KeyEvent> {
        self.log().iter().map(|(_, event)| *event).collect()
    }

    /// Recorded events with the instant each was received.
    pub fn timeline(&self) -> Vec<(Instant, KeyEvent)> {
        self.log().clone()
    }

    /// Keys pressed, in order, leaving out modifiers.
    pub fn pressed_keys(&self) -> Vec<Key> {
        self.log()
            .iter()
            .filter(|(_, event)| event.phase == Phase::Press && !event.key.is_modifier())
            .map(|(_, event)| event.key)
            .collect()
    }

    pub fn clear(&self) {
        self.log().clear();
    }

    fn log(&self) -> MutexGuard<'_, Vec<(Instant, KeyEvent)>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, event: KeyEvent) {
        debug!(key = %event.key, phase = ?event.phase, "key event");
        self.log().push((Instant::now(), event));
    }
}

#[async_trait]
impl HidTransport for RecordingTransport {
    async fn press_key(&self, key: Key) -> Result<(), TransportError> {
        self.record(KeyEvent::press(key));
        Ok(())
    }

    async fn release_key(&self, key: Key) -> Result<(), TransportError> {
        self.record(KeyEvent::release(key));
        Ok(())
    }
}
