//! Status indicator collaborator (typically a status LED).

use tracing::info;

/// Lifecycle transitions reported to the indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Running,
    Stopped,
    Error,
}

/// An RGB colour requested by an `LED` directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Receives runtime status notifications.
///
/// Calls are fire-and-forget: implementations must return promptly and never
/// block the runtime.
pub trait StatusIndicator: Send + Sync {
    fn notify(&self, status: Status);

    /// Set the indicator colour. Indicators without colour support ignore it.
    fn set_color(&self, _color: Rgb) {}
}

/// Indicator that reports transitions through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingIndicator;

impl StatusIndicator for TracingIndicator {
    fn notify(&self, status: Status) {
        info!(?status, "status changed");
    }

    fn set_color(&self, color: Rgb) {
        info!(r = color.r, g = color.g, b = color.b, "led colour");
    }
}
