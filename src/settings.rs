use crate::layout::Layout;
use std::time::Duration;

/// Timing and layout configuration for script execution.
///
/// The runtime starts every script from these values; `DEFAULTDELAY` and
/// `LOCALE` lines only change the copy owned by the running script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Pause applied after every keystroke line without an explicit `DELAY`.
    pub default_delay: Duration,
    /// Upper bound of the random extra pause added to `default_delay`.
    pub jitter: Duration,
    pub layout: Layout,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_delay: Duration::from_millis(5),
            jitter: Duration::ZERO,
            layout: Layout::Us,
        }
    }
}
