//! Pre-loaded record buffers.
//!
//! A buffer is a block of newline-delimited JSON, one serialized [`Entity`]
//! per line. [`RecordBuffer`] writes the framing and [`BufferSource`] reads it
//! back lazily, so a bad frame only surfaces when the engine reaches it.

use crate::{Entity, EntitySource, SourceError};

/// Owned block of framed records.
///
/// # Examples
///
/// ```
/// use mapflow_core::{Entity, EntitySource, Node, RecordBuffer};
///
/// # fn main() -> Result<(), serde_json::Error> {
/// let mut buffer = RecordBuffer::new();
/// buffer.push(&Entity::from(Node::new(1, None)))?;
/// let mut source = buffer.source();
/// let first = source.next_entity().expect("framed record");
/// assert_eq!(first.map(Entity::id), Some(1));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordBuffer {
    bytes: Vec<u8>,
    records: usize,
}

impl RecordBuffer {
    /// Create an empty buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bytes: Vec::new(),
            records: 0,
        }
    }

    /// Frame every entity yielded by `entities`.
    ///
    /// # Errors
    ///
    /// Returns the serializer error for the first entity that fails to
    /// encode.
    pub fn from_entities<'a, I>(entities: I) -> Result<Self, serde_json::Error>
    where
        I: IntoIterator<Item = &'a Entity>,
    {
        let mut buffer = Self::new();
        for entity in entities {
            buffer.push(entity)?;
        }
        Ok(buffer)
    }

    /// Append one framed record.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if `entity` fails to encode; the buffer
    /// is left unchanged in that case.
    pub fn push(&mut self, entity: &Entity) -> Result<(), serde_json::Error> {
        let mut frame = serde_json::to_vec(entity)?;
        frame.push(b'\n');
        self.bytes.extend_from_slice(&frame);
        self.records += 1;
        Ok(())
    }

    /// Number of framed records.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.records
    }

    /// Returns `true` when no record has been framed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.records == 0
    }

    /// The framed bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the buffer, returning the framed bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// A source reading this buffer from the start.
    #[must_use]
    pub fn source(&self) -> BufferSource<'_> {
        BufferSource::new(&self.bytes)
    }
}

/// [`EntitySource`] over a fixed block of framed records.
///
/// Whitespace-only lines are skipped. The block is never copied; each step
/// decodes one line into a reusable slot.
#[derive(Debug)]
pub struct BufferSource<'a> {
    remaining: &'a [u8],
    produced: u64,
    current: Option<Entity>,
}

impl<'a> BufferSource<'a> {
    /// Read records from `bytes`.
    #[must_use]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self {
            remaining: bytes,
            produced: 0,
            current: None,
        }
    }

    /// Number of frames consumed so far, including a malformed one.
    #[must_use]
    pub const fn position(&self) -> u64 {
        self.produced
    }
}

impl EntitySource for BufferSource<'_> {
    fn next_entity(&mut self) -> Result<Option<&Entity>, SourceError> {
        self.current = None;
        while let Some((line, rest)) = split_frame(self.remaining) {
            self.remaining = rest;
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            let position = self.produced;
            self.produced += 1;
            let entity = serde_json::from_slice::<Entity>(line).map_err(|source| {
                SourceError::Malformed {
                    position,
                    source: Box::new(source),
                }
            })?;
            self.current = Some(entity);
            break;
        }
        Ok(self.current.as_ref())
    }
}

fn split_frame(bytes: &[u8]) -> Option<(&[u8], &[u8])> {
    if bytes.is_empty() {
        return None;
    }
    let frame = match bytes.iter().position(|byte| *byte == b'\n') {
        Some(end) => {
            let (line, rest) = bytes.split_at(end);
            (line, rest.get(1..).unwrap_or_default())
        }
        None => (bytes, &[][..]),
    };
    Some(frame)
}
