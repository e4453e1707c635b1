//! Error types produced by handlers, sources and the dispatch engine.

use std::{error::Error as StdError, fmt, io};

use thiserror::Error;

use crate::{Kind, SourceError};

/// Boxed error used wherever a collaborator's failure is carried opaquely.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// A failure raised by a handler operation.
///
/// Handlers build these from a message, or wrap their own error type with
/// [`HandlerError::from_source`] so callers can still downcast it.
///
/// # Examples
///
/// ```
/// use mapflow_core::HandlerError;
///
/// let err = HandlerError::new("tag budget exceeded");
/// assert_eq!(err.to_string(), "tag budget exceeded");
/// ```
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl HandlerError {
    /// Construct an error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Construct an error with an explicit message and underlying cause.
    pub fn with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Wrap an error, reusing its display text as the message.
    pub fn from_source<E>(source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// The handler's description of the failure.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Where in pipeline execution a handler failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// The opening `init()` call.
    Init,
    /// A `before(kind)` call.
    Before(Kind),
    /// A `handle(record)` call for a record of this kind.
    Handle(Kind),
    /// An `after(kind)` call.
    After(Kind),
    /// The closing `done()` call.
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => f.write_str("init"),
            Self::Before(kind) => write!(f, "before({kind})"),
            Self::Handle(kind) => write!(f, "handle({kind})"),
            Self::After(kind) => write!(f, "after({kind})"),
            Self::Done => f.write_str("done"),
        }
    }
}

/// Why an opaque handler could not be classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UnsupportedReason {
    /// Neither `handle` nor any transition hook is exposed.
    #[error("it exposes neither handle nor transition hooks")]
    NoCapabilities,
    /// Transition hooks are exposed without `handle`.
    #[error("it exposes transition hooks but no handle")]
    MissingHandle,
    /// Only some of `init`, `before`, `after` and `done` are exposed.
    #[error("it exposes only part of the transition hooks")]
    PartialLifecycle,
}

/// Broad origin of a [`DispatchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// The caller's arguments or handler set were unusable.
    Argument,
    /// The source could not produce the next record.
    Input,
    /// A handler operation failed.
    Handler,
}

/// Terminal error of a dispatch run.
///
/// Every variant aborts the run; the first one raised is returned verbatim.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DispatchError {
    /// The call itself was malformed, e.g. no source was supplied.
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// Description of the problem.
        reason: &'static str,
    },
    /// A registered object satisfies neither handler capability.
    #[error("handler {handler} at position {position} is unsupported: {reason}")]
    UnsupportedHandler {
        /// Registration position of the rejected object.
        position: usize,
        /// Name reported by the object.
        handler: String,
        /// Why classification failed.
        reason: UnsupportedReason,
    },
    /// A sequential reader was already at end of input before the run.
    #[error("entity reader has already reached end of input")]
    AlreadyExhausted,
    /// The source failed to frame or decode a record.
    #[error("malformed record at position {position}: {source}")]
    MalformedRecord {
        /// Zero-based index of the record that could not be produced.
        position: u64,
        /// Decoder failure.
        source: BoxError,
    },
    /// The source failed to read input.
    #[error("failed to read from entity source: {source}")]
    Read {
        /// Underlying I/O failure.
        source: io::Error,
    },
    /// A handler operation failed during pipeline execution.
    #[error("pipeline execution failed in {handler} (position {position}) during {stage}: {source}")]
    HandlerFailure {
        /// Registration position of the failing handler.
        position: usize,
        /// Name reported by the failing handler.
        handler: String,
        /// Operation that failed.
        stage: Stage,
        /// The handler's error.
        source: HandlerError,
    },
}

impl DispatchError {
    /// Classify the error by origin.
    ///
    /// # Examples
    ///
    /// ```
    /// use mapflow_core::{DispatchError, ErrorClass};
    ///
    /// assert_eq!(DispatchError::AlreadyExhausted.class(), ErrorClass::Argument);
    /// ```
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidArgument { .. }
            | Self::UnsupportedHandler { .. }
            | Self::AlreadyExhausted => ErrorClass::Argument,
            Self::MalformedRecord { .. } | Self::Read { .. } => ErrorClass::Input,
            Self::HandlerFailure { .. } => ErrorClass::Handler,
        }
    }
}

impl From<SourceError> for DispatchError {
    fn from(error: SourceError) -> Self {
        match error {
            SourceError::Malformed { position, source } => Self::MalformedRecord { position, source },
            SourceError::Read { source } => Self::Read { source },
        }
    }
}
