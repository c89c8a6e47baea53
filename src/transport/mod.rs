//! The [`HidTransport`] trait and the transports shipped with the crate.
//!
//! A transport receives individual key press and release requests and is
//! responsible for getting them to the target machine. The runtime never
//! retries a failed request; it reports the failure and moves on.

mod pty;
mod recording;
mod report;

pub use pty::PtyTransport;
pub use recording::RecordingTransport;
pub use report::ReportTransport;

use crate::keys::Key;
use async_trait::async_trait;
use std::io;
use thiserror::Error;

/// Whether a key goes down or comes up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Press,
    Release,
}

/// A single key transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub phase: Phase,
}

impl KeyEvent {
    pub fn press(key: Key) -> Self {
        Self {
            key,
            phase: Phase::Press,
        }
    }

    pub fn release(key: Key) -> Self {
        Self {
            key,
            phase: Phase::Release,
        }
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("more keys held than the report can carry (pressing {0})")]
    Rollover(Key),

    #[error("key {0} has no encoding on this transport")]
    Unsupported(Key),

    #[error("PTY setup failed: {0:#}")]
    Pty(anyhow::Error),
}

/// Delivers key transitions to the target machine.
///
/// Implementations are shared between the task driving a script and the tasks
/// that may stop it, so they take `&self` and synchronise internally.
#[async_trait]
pub trait HidTransport: Send + Sync {
    async fn press_key(&self, key: Key) -> Result<(), TransportError>;

    async fn release_key(&self, key: Key) -> Result<(), TransportError>;
}
