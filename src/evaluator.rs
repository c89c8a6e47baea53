//! Single-line evaluation: resolve a line, act on it, and report what the
//! caller should do next.

use crate::directive::Directive;
use crate::emitter::Emitter;
use crate::error::LineFault;
use crate::parser::parse_line;
use crate::settings::Settings;
use crate::status::StatusIndicator;
use crate::transport::HidTransport;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// What kind of line was evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// The line emitted keystrokes and can be the target of `REPEAT`.
    Keys,
    /// A `REPEAT`/`REPLAY` request.
    Repeat,
    /// Anything else: delays, comments, settings, unknown lines.
    Control,
}

/// Result of evaluating one line.
///
/// The repeat count and the pause are returned rather than stored, so the
/// caller decides how to schedule them.
#[derive(Debug)]
pub struct LineOutcome {
    pub kind: LineKind,
    /// Additional executions of the previous keystroke line requested.
    pub repeats: u32,
    /// Pause to apply before the next line.
    pub delay: Duration,
    /// Recovered problems, in the order they happened.
    pub faults: Vec<LineFault>,
}

impl LineOutcome {
    fn new(kind: LineKind) -> Self {
        Self {
            kind,
            repeats: 0,
            delay: Duration::ZERO,
            faults: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.faults.is_empty()
    }
}

/// Evaluates lines against a transport, owning the mutable timing and layout
/// state a script changes as it runs.
pub struct Evaluator {
    emitter: Emitter,
    indicator: Arc<dyn StatusIndicator>,
    base: Settings,
    active: Settings,
}

impl Evaluator {
    pub fn new(
        transport: Arc<dyn HidTransport>,
        indicator: Arc<dyn StatusIndicator>,
        settings: Settings,
    ) -> Self {
        Self {
            emitter: Emitter::new(transport),
            indicator,
            active: settings.clone(),
            base: settings,
        }
    }

    /// Settings currently in effect, including changes made by evaluated lines.
    pub fn settings(&self) -> &Settings {
        &self.active
    }

    /// Drop changes made by evaluated lines.
    pub fn reset(&mut self) {
        self.active = self.base.clone();
    }

    pub async fn evaluate(&mut self, line: &str) -> LineOutcome {
        let directive = parse_line(line, self.active.layout);
        debug!(?directive, "evaluating line");
        self.execute(directive).await
    }

    pub async fn execute(&mut self, directive: Directive<'_>) -> LineOutcome {
        match directive {
            Directive::KeyPress(key) => {
                let result = self.emitter.tap(key).await;
                self.keys_outcome(result.err().map(LineFault::from))
            }
            Directive::KeyCombo(combo) => {
                let result = self.emitter.combo(combo.keys()).await;
                self.keys_outcome(result.err().map(LineFault::from))
            }
            Directive::TypeString(text) => self.type_string(text).await,
            Directive::Delay(ms) => {
                let mut outcome = LineOutcome::new(LineKind::Control);
                outcome.delay = Duration::from_millis(ms.into());
                outcome
            }
            Directive::Repeat(count) => {
                let mut outcome = LineOutcome::new(LineKind::Repeat);
                outcome.repeats = count;
                outcome
            }
            Directive::DefaultDelay(ms) => {
                self.active.default_delay = Duration::from_millis(ms.into());
                LineOutcome::new(LineKind::Control)
            }
            Directive::Locale(layout) => {
                self.active.layout = layout;
                LineOutcome::new(LineKind::Control)
            }
            Directive::Led(color) => {
                self.indicator.set_color(color);
                LineOutcome::new(LineKind::Control)
            }
            Directive::Comment => LineOutcome::new(LineKind::Control),
            Directive::Unknown(keyword) => {
                debug!(keyword, "ignoring unknown directive");
                LineOutcome::new(LineKind::Control)
            }
        }
    }

    async fn type_string(&mut self, text: &str) -> LineOutcome {
        let mut faults = Vec::new();
        for c in text.chars() {
            match self.active.layout.stroke(c) {
                Some(stroke) => {
                    if let Err(err) = self.emitter.stroke(stroke).await {
                        faults.push(LineFault::from(err));
                    }
                }
                None => {
                    warn!(character = ?c, layout = self.active.layout.name(), "no key mapping");
                    faults.push(LineFault::UnknownCharacter(c));
                }
            }
        }
        let mut outcome = self.keys_outcome(None);
        outcome.faults = faults;
        outcome
    }

    fn keys_outcome(&self, fault: Option<LineFault>) -> LineOutcome {
        let mut outcome = LineOutcome::new(LineKind::Keys);
        outcome.delay = self.line_delay();
        outcome.faults.extend(fault);
        outcome
    }

    /// The automatic pause after a keystroke line, with jitter applied.
    fn line_delay(&self) -> Duration {
        let jitter_ms = self.active.jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return self.active.default_delay;
        }
        let extra = rand::thread_rng().gen_range(0..=jitter_ms);
        self.active.default_delay + Duration::from_millis(extra)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::Key;
    use crate::layout::Layout;
    use crate::status::{Rgb, Status};
    use crate::transport::{KeyEvent, RecordingTransport, TransportError};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Colors(Mutex<Vec<Rgb>>);

    impl StatusIndicator for Colors {
        fn notify(&self, _status: Status) {}

        fn set_color(&self, color: Rgb) {
            self.0.lock().unwrap().push(color);
        }
    }

    fn evaluator() -> (Evaluator, Arc<RecordingTransport>, Arc<Colors>) {
        let transport = Arc::new(RecordingTransport::new());
        let colors = Arc::new(Colors::default());
        let evaluator = Evaluator::new(transport.clone(), colors.clone(), Settings::default());
        (evaluator, transport, colors)
    }

    #[tokio::test]
    async fn test_control_lines_emit_nothing() {
        let (mut evaluator, transport, _) = evaluator();
        for line in [
            "",
            "REM hello",
            "DELAY 100",
            "DEFAULTDELAY 20",
            "DEFAULT_DELAY 20",
            "REPEAT 4",
            "REPLAY",
            "LOCALE GB",
            "LED 1 2 3",
            "NOT_A_THING",
        ] {
            evaluator.evaluate(line).await;
        }
        assert!(transport.events().is_empty());
    }

    #[tokio::test]
    async fn test_string_hello() {
        let (mut evaluator, transport, _) = evaluator();
        let outcome = evaluator.evaluate("STRING Hello").await;

        assert_eq!(outcome.kind, LineKind::Keys);
        assert!(outcome.is_clean());
        assert_eq!(
            transport.pressed_keys(),
            vec![Key(0x0B), Key(0x08), Key(0x0F), Key(0x0F), Key(0x12)]
        );
        let events = transport.events();
        assert_eq!(events[0], KeyEvent::press(Key::LEFT_SHIFT));
        assert_eq!(events[1], KeyEvent::press(Key(0x0B)));
        assert_eq!(events[2], KeyEvent::release(Key(0x0B)));
        assert_eq!(events[3], KeyEvent::release(Key::LEFT_SHIFT));
        assert_eq!(events.len(), 4 + 4 * 2);
    }

    #[tokio::test]
    async fn test_unknown_character_does_not_abort() {
        let (mut evaluator, transport, _) = evaluator();
        let outcome = evaluator.evaluate("STRING aéb").await;

        assert_eq!(outcome.faults.len(), 1);
        assert!(matches!(outcome.faults[0], LineFault::UnknownCharacter('é')));
        assert_eq!(transport.pressed_keys(), vec![Key(0x04), Key(0x05)]);
    }

    #[tokio::test]
    async fn test_delay_and_default_delay() {
        let (mut evaluator, _, _) = evaluator();

        let outcome = evaluator.evaluate("DELAY 250").await;
        assert_eq!(outcome.delay, Duration::from_millis(250));
        assert_eq!(evaluator.settings().default_delay, Duration::from_millis(5));

        let outcome = evaluator.evaluate("DEFAULTDELAY 500").await;
        assert_eq!(outcome.delay, Duration::ZERO);

        let outcome = evaluator.evaluate("ENTER").await;
        assert_eq!(outcome.delay, Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_repeat_is_returned_not_executed() {
        let (mut evaluator, transport, _) = evaluator();
        let outcome = evaluator.evaluate("REPEAT 3").await;
        assert_eq!(outcome.kind, LineKind::Repeat);
        assert_eq!(outcome.repeats, 3);
        assert!(transport.events().is_empty());
    }

    #[tokio::test]
    async fn test_locale_and_reset() {
        let (mut evaluator, transport, _) = evaluator();
        evaluator.evaluate("LOCALE GB").await;
        evaluator.evaluate("DEFAULTDELAY 40").await;
        evaluator.evaluate("STRING @").await;
        assert_eq!(evaluator.settings().layout, Layout::Gb);
        assert_eq!(transport.pressed_keys(), vec![Key(0x34)]);

        evaluator.reset();
        assert_eq!(evaluator.settings(), &Settings::default());
    }

    #[tokio::test]
    async fn test_led_sets_color() {
        let (mut evaluator, _, colors) = evaluator();
        evaluator.evaluate("LED 0 255 0").await;
        assert_eq!(*colors.0.lock().unwrap(), vec![Rgb { r: 0, g: 255, b: 0 }]);
    }

    #[tokio::test]
    async fn test_jitter_stays_in_bounds() {
        let transport = Arc::new(RecordingTransport::new());
        let settings = Settings {
            default_delay: Duration::from_millis(10),
            jitter: Duration::from_millis(5),
            ..Settings::default()
        };
        let mut evaluator = Evaluator::new(transport, Arc::new(Colors::default()), settings);
        for _ in 0..20 {
            let outcome = evaluator.evaluate("TAB").await;
            assert!(outcome.delay >= Duration::from_millis(10));
            assert!(outcome.delay <= Duration::from_millis(15));
        }
    }

    struct RejectShift(RecordingTransport);

    #[async_trait]
    impl HidTransport for RejectShift {
        async fn press_key(&self, key: Key) -> Result<(), TransportError> {
            if key == Key::LEFT_SHIFT {
                return Err(TransportError::Unsupported(key));
            }
            self.0.press_key(key).await
        }

        async fn release_key(&self, key: Key) -> Result<(), TransportError> {
            self.0.release_key(key).await
        }
    }

    #[tokio::test]
    async fn test_transport_failure_is_a_fault() {
        let transport = Arc::new(RejectShift(RecordingTransport::new()));
        let mut evaluator =
            Evaluator::new(transport.clone(), Arc::new(Colors::default()), Settings::default());

        let outcome = evaluator.evaluate("STRING aBc").await;

        assert_eq!(outcome.kind, LineKind::Keys);
        assert_eq!(outcome.faults.len(), 1);
        assert!(matches!(
            outcome.faults[0],
            LineFault::Transport(TransportError::Unsupported(Key::LEFT_SHIFT))
        ));
        assert_eq!(
            transport.0.pressed_keys(),
            vec![Key(0x04), Key(0x05), Key(0x06)]
        );
    }
}
