//! Error types shared by the parser, the window engine and the run loop.

use std::path::PathBuf;
use thiserror::Error;

/// A single input record could not be turned into an [`Event`](crate::input::Event).
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid JSON record: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid timestamp '{value}'")]
    InvalidTimestamp { value: String },
    #[error("timestamp '{value}' is out of range in the {zone} time zone")]
    OutOfRange { value: String, zone: String },
    #[error("record is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("invalid duration {value}: must be a non-negative number")]
    InvalidDuration { value: String },
}

/// The window engine was driven out of order.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("window has already been flushed")]
    Finished,
    #[error("window has not been anchored by an event yet")]
    Uninitialized,
    #[error("event at minute {event_minute} arrived after minute {last_minute}")]
    OutOfOrder { event_minute: i64, last_minute: i64 },
}

/// Errors surfaced by a moving-average run.
#[derive(Debug, Error)]
pub enum SmaError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: ParseError,
    },
    #[error("cannot open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("window error: {0}")]
    Window(#[from] WindowError),
}

pub type Result<T> = std::result::Result<T, SmaError>;
