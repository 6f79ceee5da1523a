// ============================================================
// Layer 4: One-Hot Batcher
// ============================================================
// Converts a batch of chunks into the tensor the model reads.
//
// How batching works here:
//   Input:  N chunks, each of W character indices
//   Output: one-hot tensor of shape [N, W, V]
//           where V is the vocabulary size
//
// We fill one flat Vec<f32> row by row, then reshape:
//   [c1_t1_v1 .. c1_t1_vV, c1_t2_v1, ..., cN_tW_vV] → [N, W, V]
//
// A padding index (-1) becomes an all-zero row. The loss uses
// these all-zero rows as "no target here", which is how padded
// positions drop out of training.

use burn::{prelude::*, tensor::TensorData};

use crate::domain::chunk::Chunk;

// ─── CharBatch ────────────────────────────────────────────────────────────────
/// A batch of chunks ready for the model forward pass.
#[derive(Debug, Clone)]
pub struct CharBatch<B: Backend> {
    /// One-hot inputs, shape [batch_size, window, vocab_size]
    pub inputs: Tensor<B, 3>,
}

// ─── CharBatcher ──────────────────────────────────────────────────────────────
/// Holds the target device so tensors are created on the
/// correct GPU/CPU, and the one-hot width.
#[derive(Clone, Debug)]
pub struct CharBatcher<B: Backend> {
    device:     B::Device,
    vocab_size: usize,
}

impl<B: Backend> CharBatcher<B> {
    pub fn new(device: B::Device, vocab_size: usize) -> Self {
        Self { device, vocab_size }
    }

    /// Stack equally long chunks into a CharBatch.
    pub fn batch(&self, chunks: &[Chunk]) -> CharBatch<B> {
        let rows: Vec<&[i32]> = chunks.iter().map(Chunk::as_slice).collect();
        CharBatch { inputs: self.one_hot(&rows) }
    }

    /// One-hot encode rows of indices into [rows, steps, vocab].
    /// Negative or out-of-range indices give all-zero vectors.
    ///
    /// # Panics
    /// Panics if the rows differ in length.
    pub fn one_hot(&self, rows: &[&[i32]]) -> Tensor<B, 3> {
        let batch_size = rows.len();
        let steps      = rows.first().map_or(0, |r| r.len());
        assert!(
            rows.iter().all(|r| r.len() == steps),
            "all rows in a batch must have the same length"
        );

        let mut flat = vec![0.0f32; batch_size * steps * self.vocab_size];
        for (b, row) in rows.iter().enumerate() {
            for (t, &index) in row.iter().enumerate() {
                if let Ok(index) = usize::try_from(index) {
                    if index < self.vocab_size {
                        flat[(b * steps + t) * self.vocab_size + index] = 1.0;
                    }
                }
            }
        }

        Tensor::from_data(
            TensorData::new(flat, [batch_size, steps, self.vocab_size]),
            &self.device,
        )
    }
}
