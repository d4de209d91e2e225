use anyhow::Error as AnyhowError;
use thiserror::Error;

use crate::span::Span;

/// Result alias for errors emitted by move-inspect internals.
pub type InspectResult<T> = Result<T, InspectError>;

/// Structured error type for the parsing and resolving layers.
///
/// The printers themselves never fail; every variant here describes a
/// precondition that did not hold before a printer was invoked.
#[derive(Debug, Error)]
pub enum InspectError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The source text contains an ERROR or MISSING node.
    #[error("syntax error at {span}")]
    Syntax { span: Span },

    #[error("parse failure: {0}")]
    Parse(String),

    #[error("invalid scope dump: {0}")]
    Dump(String),

    #[error("{0}")]
    Other(String),
}

impl InspectError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn dump(msg: impl Into<String>) -> Self {
        Self::Dump(msg.into())
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

impl From<AnyhowError> for InspectError {
    fn from(err: AnyhowError) -> Self {
        InspectError::other(format!("{err:#}"))
    }
}

/// Convenience macro mirroring `anyhow::bail!` but returning InspectError.
#[macro_export]
macro_rules! inspect_bail {
    ($($arg:tt)*) => {
        return Err($crate::error::InspectError::other(format!($($arg)*)));
    };
}
