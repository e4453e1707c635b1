//! Entity stream sources.
//!
//! Both source shapes expose the same lending `next_entity` operation: the
//! returned record borrows the source until the next call, so the engine can
//! never hold a record past the step that produced it and sources are free to
//! reuse their storage.

use std::io;

use thiserror::Error;

use crate::{BoxError, DispatchError, Entity};

/// Failures raised while producing the next record.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SourceError {
    /// The record at `position` could not be framed or decoded.
    #[error("malformed record at position {position}: {source}")]
    Malformed {
        /// Zero-based index of the record that could not be produced.
        position: u64,
        /// Decoder failure.
        source: BoxError,
    },
    /// Reading the underlying input failed.
    #[error("failed to read from entity source: {source}")]
    Read {
        /// Underlying I/O failure.
        source: io::Error,
    },
}

/// A lazy, forward-only, finite sequence of records.
///
/// Sources are single use: once `next_entity` has returned `Ok(None)` it
/// keeps doing so.
pub trait EntitySource {
    /// Check that the source can start a run.
    ///
    /// Called once at the start of every run, before any handler.
    ///
    /// # Errors
    ///
    /// Sources that may only be consumed once return
    /// [`DispatchError::AlreadyExhausted`] when they have been used up.
    fn begin(&mut self) -> Result<(), DispatchError> {
        Ok(())
    }

    /// Produce the next record, or `None` once the sequence is exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the next record cannot be read or decoded.
    fn next_entity(&mut self) -> Result<Option<&Entity>, SourceError>;
}

impl<S: EntitySource + ?Sized> EntitySource for &mut S {
    fn begin(&mut self) -> Result<(), DispatchError> {
        (**self).begin()
    }

    fn next_entity(&mut self) -> Result<Option<&Entity>, SourceError> {
        (**self).next_entity()
    }
}

impl<S: EntitySource + ?Sized> EntitySource for Box<S> {
    fn begin(&mut self) -> Result<(), DispatchError> {
        (**self).begin()
    }

    fn next_entity(&mut self) -> Result<Option<&Entity>, SourceError> {
        (**self).next_entity()
    }
}

/// A stateful, pull-based reader backed by external input.
///
/// Implementations report end of input through [`EntityReader::is_exhausted`]
/// so a spent reader can be rejected before a run starts.
pub trait EntityReader {
    /// Returns `true` once the reader has signalled end of input.
    fn is_exhausted(&self) -> bool;

    /// Read the next record, or `None` at end of input.
    fn read_entity(&mut self) -> Result<Option<Entity>, SourceError>;
}

/// [`EntitySource`] over a sequential [`EntityReader`].
///
/// The source keeps a single slot for the current record and overwrites it on
/// every step.
///
/// # Examples
///
/// ```
/// use mapflow_core::{DispatchError, Entity, EntityReader, SequentialSource, SourceError};
///
/// struct Spent;
///
/// impl EntityReader for Spent {
///     fn is_exhausted(&self) -> bool {
///         true
///     }
///
///     fn read_entity(&mut self) -> Result<Option<Entity>, SourceError> {
///         Ok(None)
///     }
/// }
///
/// let outcome = SequentialSource::new(Spent);
/// assert!(matches!(outcome, Err(DispatchError::AlreadyExhausted)));
/// ```
#[derive(Debug)]
pub struct SequentialSource<R> {
    reader: R,
    current: Option<Entity>,
}

impl<R: EntityReader> SequentialSource<R> {
    /// Wrap `reader`, rejecting it if it already reached end of input.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::AlreadyExhausted`] when
    /// [`EntityReader::is_exhausted`] is already `true`.
    pub fn new(reader: R) -> Result<Self, DispatchError> {
        if reader.is_exhausted() {
            return Err(DispatchError::AlreadyExhausted);
        }
        Ok(Self {
            reader,
            current: None,
        })
    }

    /// Borrow the wrapped reader.
    pub const fn get_ref(&self) -> &R {
        &self.reader
    }

    /// Release the wrapped reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: EntityReader> EntitySource for SequentialSource<R> {
    fn begin(&mut self) -> Result<(), DispatchError> {
        if self.reader.is_exhausted() {
            return Err(DispatchError::AlreadyExhausted);
        }
        Ok(())
    }

    fn next_entity(&mut self) -> Result<Option<&Entity>, SourceError> {
        self.current = None;
        if self.reader.is_exhausted() {
            return Ok(None);
        }
        self.current = self.reader.read_entity()?;
        Ok(self.current.as_ref())
    }
}
