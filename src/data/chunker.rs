// ============================================================
// Layer 4: Windowed Chunker
// ============================================================
// Turns the corpus into an endless stream of fixed-length
// training windows.
//
// Every epoch:
//   1. shuffle the order of all lines
//   2. walk the lines in that order
//   3. cut each encoded line into windows of `window` indices,
//      starting at 0, stride, 2*stride, ... while start < len
//   4. pad the trailing short window with -1
// then reshuffle and go again. The epoch counter makes the
// reshuffle an observable event instead of a hidden restart.
//
// Example with window=4, overlap=2 (stride 2), line [0,1,2,0,1]:
//   start 0 → [0, 1, 2,  0]
//   start 2 → [2, 0, 1, -1]
//   start 4 → [1, -1, -1, -1]
//
// The stride (step between windows) = window - overlap

use rand::{seq::SliceRandom, Rng};

use crate::domain::{chunk::Chunk, vocabulary::Vocabulary};

pub struct WindowedChunker<R: Rng> {
    /// Every corpus line, already encoded
    lines: Vec<Vec<i32>>,
    /// Indices per emitted chunk
    window: usize,
    /// Distance between consecutive window starts in a line
    stride: usize,
    rng: R,
    /// Line visiting order for the current epoch
    order: Vec<usize>,
    /// Position in `order` of the line being cut
    cursor: usize,
    /// Start of the next window within that line
    offset: usize,
    epoch: usize,
    emitted_this_epoch: bool,
}

impl<R: Rng> WindowedChunker<R> {
    /// Create a new chunker over `lines`.
    ///
    /// # Panics
    /// Panics if overlap >= window, because the stride would be
    /// zero and the same window would repeat forever.
    pub fn new(lines: &[String], vocab: &Vocabulary, window: usize, overlap: usize, rng: R) -> Self {
        assert!(
            overlap < window,
            "overlap ({}) must be less than window ({})",
            overlap,
            window
        );

        let lines: Vec<Vec<i32>> = lines.iter().map(|l| vocab.encode(l)).collect();
        let order = (0..lines.len()).collect();

        Self {
            lines,
            window,
            stride: window - overlap,
            rng,
            order,
            // Start "past the end" so the first call shuffles
            cursor: usize::MAX,
            offset: 0,
            epoch: 0,
            emitted_this_epoch: false,
        }
    }

    /// How many times the line order has been shuffled so far.
    /// Zero until the first chunk is requested.
    pub fn epoch(&self) -> usize {
        self.epoch
    }

    fn start_epoch(&mut self) {
        self.order.shuffle(&mut self.rng);
        self.cursor = 0;
        self.offset = 0;
        self.epoch += 1;
        self.emitted_this_epoch = false;
        tracing::debug!("Chunker epoch {} ({} lines)", self.epoch, self.order.len());
    }
}

impl<R: Rng> Iterator for WindowedChunker<R> {
    type Item = Chunk;

    /// Next window in the stream. Only returns None when a whole
    /// epoch produced nothing, i.e. no line has a single
    /// in-vocabulary character; otherwise the stream is endless.
    fn next(&mut self) -> Option<Chunk> {
        loop {
            if self.cursor >= self.order.len() {
                if self.epoch > 0 && !self.emitted_this_epoch {
                    tracing::warn!("Corpus yields no windows, ending chunk stream");
                    return None;
                }
                self.start_epoch();
                continue;
            }

            let line = &self.lines[self.order[self.cursor]];
            if self.offset < line.len() {
                let end   = (self.offset + self.window).min(line.len());
                let chunk = Chunk::padded(&line[self.offset..end], self.window);
                self.offset += self.stride;
                self.emitted_this_epoch = true;
                return Some(chunk);
            }

            // Line exhausted, move to the next one
            self.cursor += 1;
            self.offset = 0;
        }
    }
}
