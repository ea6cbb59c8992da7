//! Bounded-memory processing of large top-level arrays.
//!
//! Splits the root array into contiguous chunks, flattens each chunk
//! independently and yields records lazily in source order. Chunking never
//! changes output content versus flattening the whole array at once; it only
//! bounds how much of the input is flattened at a time.

use crate::flatten::engine::FlatteningEngine;
use crate::flatten::types::{ChunkError, FlatRecord, FlattenError};
use serde_json::Value;

#[derive(Debug)]
pub struct ChunkedProcessor<'a> {
    engine: FlatteningEngine,
    chunks: std::slice::Chunks<'a, Value>,
    pending: std::vec::IntoIter<FlatRecord>,
    poisoned: bool,
}

impl<'a> ChunkedProcessor<'a> {
    /// Create a processor over the elements of a top-level array.
    ///
    /// `chunk_size` of `None` treats the whole array as a single chunk; an
    /// explicit zero is rejected with [`ChunkError::InvalidChunkSize`].
    pub fn new(
        elements: &'a [Value],
        chunk_size: Option<usize>,
        engine: FlatteningEngine,
    ) -> Result<Self, ChunkError> {
        let size = match chunk_size {
            Some(0) => return Err(ChunkError::InvalidChunkSize),
            Some(n) => n,
            None => elements.len().max(1),
        };

        Ok(ChunkedProcessor {
            engine,
            chunks: elements.chunks(size),
            pending: Vec::new().into_iter(),
            poisoned: false,
        })
    }
}

impl Iterator for ChunkedProcessor<'_> {
    type Item = Result<FlatRecord, FlattenError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.poisoned {
            return None;
        }

        loop {
            if let Some(record) = self.pending.next() {
                return Some(Ok(record));
            }

            let chunk = self.chunks.next()?;
            match self.engine.flatten_slice(chunk) {
                Ok(records) => self.pending = records.into_iter(),
                Err(err) => {
                    // Fail fast: the first error aborts the whole sequence
                    self.poisoned = true;
                    return Some(Err(err));
                }
            }
        }
    }
}
