//! Turns resolved keys into ordered press/release requests.

use crate::keys::Key;
use crate::layout::Stroke;
use crate::transport::{HidTransport, KeyEvent, Phase, TransportError};
use std::sync::Arc;
use tracing::warn;

/// Forwards key transitions to a [`HidTransport`].
///
/// Combos are pressed in the order given and released in reverse. A failed
/// transition does not stop the rest of the combo, so keys that did go down
/// are still released; the first failure is returned once all transitions
/// have been attempted.
#[derive(Clone)]
pub struct Emitter {
    transport: Arc<dyn HidTransport>,
}

impl Emitter {
    pub fn new(transport: Arc<dyn HidTransport>) -> Self {
        Self { transport }
    }

    /// Send a single transition.
    pub async fn emit(&self, event: KeyEvent) -> Result<(), TransportError> {
        match event.phase {
            Phase::Press => self.transport.press_key(event.key).await,
            Phase::Release => self.transport.release_key(event.key).await,
        }
    }

    /// Press then release one key.
    pub async fn tap(&self, key: Key) -> Result<(), TransportError> {
        self.combo(&[key]).await
    }

    /// Press `keys` in order, then release them in reverse order.
    pub async fn combo(&self, keys: &[Key]) -> Result<(), TransportError> {
        let mut first_error = None;
        let presses = keys.iter().map(|key| KeyEvent::press(*key));
        let releases = keys.iter().rev().map(|key| KeyEvent::release(*key));
        for event in presses.chain(releases) {
            if let Err(err) = self.emit(event).await {
                warn!(key = %event.key, phase = ?event.phase, error = %err, "key event failed");
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Type one character's keystroke, holding `SHIFT` if it needs it.
    pub async fn stroke(&self, stroke: Stroke) -> Result<(), TransportError> {
        if stroke.shift {
            self.combo(&[Key::LEFT_SHIFT, stroke.key]).await
        } else {
            self.tap(stroke.key).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::RecordingTransport;
    use async_trait::async_trait;

    #[tokio::test]
    async fn test_combo_releases_in_reverse() {
        let transport = Arc::new(RecordingTransport::new());
        let emitter = Emitter::new(transport.clone());
        emitter
            .combo(&[Key::LEFT_CTRL, Key::LEFT_ALT, Key::DELETE])
            .await
            .unwrap();

        assert_eq!(
            transport.events(),
            vec![
                KeyEvent::press(Key::LEFT_CTRL),
                KeyEvent::press(Key::LEFT_ALT),
                KeyEvent::press(Key::DELETE),
                KeyEvent::release(Key::DELETE),
                KeyEvent::release(Key::LEFT_ALT),
                KeyEvent::release(Key::LEFT_CTRL),
            ]
        );
    }

    #[tokio::test]
    async fn test_stroke_holds_shift() {
        let transport = Arc::new(RecordingTransport::new());
        let emitter = Emitter::new(transport.clone());
        emitter
            .stroke(Stroke {
                key: Key::A,
                shift: true,
            })
            .await
            .unwrap();

        assert_eq!(transport.events().len(), 4);
        assert_eq!(transport.events()[0], KeyEvent::press(Key::LEFT_SHIFT));
        assert_eq!(transport.pressed_keys(), vec![Key::A]);
    }

    struct FailingPress {
        inner: RecordingTransport,
        fails: Key,
    }

    #[async_trait]
    impl HidTransport for FailingPress {
        async fn press_key(&self, key: Key) -> Result<(), TransportError> {
            if key == self.fails {
                return Err(TransportError::Unsupported(key));
            }
            self.inner.press_key(key).await
        }

        async fn release_key(&self, key: Key) -> Result<(), TransportError> {
            self.inner.release_key(key).await
        }
    }

    #[tokio::test]
    async fn test_failure_still_releases_everything() {
        let transport = Arc::new(FailingPress {
            inner: RecordingTransport::new(),
            fails: Key::LEFT_ALT,
        });
        let emitter = Emitter::new(transport.clone());
        let err = emitter
            .combo(&[Key::LEFT_CTRL, Key::LEFT_ALT, Key::DELETE])
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::Unsupported(Key::LEFT_ALT)));
        assert_eq!(
            transport.inner.events(),
            vec![
                KeyEvent::press(Key::LEFT_CTRL),
                KeyEvent::press(Key::DELETE),
                KeyEvent::release(Key::DELETE),
                KeyEvent::release(Key::LEFT_ALT),
                KeyEvent::release(Key::LEFT_CTRL),
            ]
        );
    }
}
