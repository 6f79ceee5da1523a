// ============================================================
// Layer 4: Batch Stream
// ============================================================
// Groups consecutive chunks into batches of `batch_size`.
//
//   chunks:  c1 c2 c3 c4 c5 ...
//   batches: [c1 c2] [c3 c4] [c5 ...
//
// A batch is emitted the moment it is full, so the trainer
// never waits on more than one batch. Order is preserved and
// nothing is dropped or repeated.
//
// When the chunk source runs dry, whatever has accumulated is
// emitted one last time, even if that is an empty batch. The
// trainer treats an empty batch as end of data.

use crate::domain::chunk::Chunk;

pub struct BatchStream<I> {
    chunks:     I,
    batch_size: usize,
    finished:   bool,
}

impl<I: Iterator<Item = Chunk>> BatchStream<I> {
    /// # Panics
    /// Panics if batch_size is zero.
    pub fn new(chunks: I, batch_size: usize) -> Self {
        assert!(batch_size > 0, "batch_size must be positive");
        Self { chunks, batch_size, finished: false }
    }
}

impl<I: Iterator<Item = Chunk>> Iterator for BatchStream<I> {
    type Item = Vec<Chunk>;

    fn next(&mut self) -> Option<Vec<Chunk>> {
        if self.finished {
            return None;
        }

        let mut batch = Vec::with_capacity(self.batch_size);
        while batch.len() < self.batch_size {
            match self.chunks.next() {
                Some(chunk) => batch.push(chunk),
                None => {
                    // Flush the remainder exactly once
                    self.finished = true;
                    return Some(batch);
                }
            }
        }
        Some(batch)
    }
}

/// `chunks.batches(n)` as shorthand for `BatchStream::new(chunks, n)`.
pub trait BatchStreamExt: Iterator<Item = Chunk> + Sized {
    fn batches(self, batch_size: usize) -> BatchStream<Self> {
        BatchStream::new(self, batch_size)
    }
}

impl<I: Iterator<Item = Chunk>> BatchStreamExt for I {}
