use crate::source::SourceError;
use crate::transport::TransportError;
use std::io;
use thiserror::Error;

/// Errors returned by [`Runtime`](crate::Runtime) operations.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("script not found: {0}")]
    FileNotFound(String),

    #[error("failed to read script {name}: {source}")]
    Source {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("no script is running")]
    NotRunning,
}

impl From<SourceError> for RuntimeError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::NotFound(name) => RuntimeError::FileNotFound(name),
            SourceError::Io { name, source } => RuntimeError::Source { name, source },
        }
    }
}

/// A recoverable problem while executing one line.
///
/// Faults never stop a script; they are logged and returned with the line's
/// outcome.
#[derive(Debug, Error)]
pub enum LineFault {
    #[error("no key mapping for character {0:?}")]
    UnknownCharacter(char),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
