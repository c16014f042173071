//! Error types for terminal-driver adaptation and modification bookkeeping.

use std::fmt;

use crate::model::StreamSelector;

/// Errors raised by a [`crate::adapter::PlatformAdapter`] or surfaced through it.
///
/// `DuplicateMod` is deliberately absent from this enum: spec-level it is a
/// control-flow signal consumed entirely inside `ModItem::instance`, never a
/// fault a caller observes (see `DESIGN.md`).
#[derive(Debug)]
pub enum EnvError {
    /// The driver rejected a query/set because the stream is not a
    /// TTY/console (POSIX errno 25 `ENOTTY`, Windows error 6
    /// `ERROR_INVALID_HANDLE`-adjacent "not a console" condition).
    NotATerminal { source: Option<std::io::Error> },
    /// `GetStdHandle`/descriptor lookup returned no valid handle.
    InvalidHandle { selector: StreamSelector },
    /// The driver accepted the query but rejected the write.
    ApplyFailed { source: std::io::Error },
    /// Windows build is older than the feature's required threshold.
    BuildTooOld { required: u32, actual: u32 },
    /// The operation is meaningful only on the other platform.
    NotSupportedOnPlatform { operation: &'static str },
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvError::NotATerminal { source } => match source {
                Some(e) => write!(f, "stream is not a terminal: {e}"),
                None => write!(f, "stream is not a terminal"),
            },
            EnvError::InvalidHandle { selector } => {
                write!(f, "no valid handle for stream {selector:?}")
            }
            EnvError::ApplyFailed { source } => {
                write!(f, "driver rejected the modification: {source}")
            }
            EnvError::BuildTooOld { required, actual } => write!(
                f,
                "platform build {actual} is older than the required build {required}"
            ),
            EnvError::NotSupportedOnPlatform { operation } => {
                write!(f, "'{operation}' is not supported on this platform")
            }
        }
    }
}

impl std::error::Error for EnvError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EnvError::NotATerminal { source } => {
                source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
            }
            EnvError::ApplyFailed { source } => Some(source),
            _ => None,
        }
    }
}

impl EnvError {
    /// True for the "inappropriate device" error class the Device-Error
    /// Guard treats specially.
    pub fn is_inappropriate_device(&self) -> bool {
        matches!(self, EnvError::NotATerminal { .. })
    }
}

/// Result type threaded through the adapter and modification layers.
pub type EnvResult<T> = Result<T, EnvError>;
