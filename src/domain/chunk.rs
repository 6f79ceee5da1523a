// ============================================================
// Layer 3: Chunk
// ============================================================
// One training example: a window of exactly `W` character
// indices cut from an encoded line. A window that runs past
// the end of its line is right-padded with PAD_INDEX.
//
// Example with W = 4:
//   window [2, 0, 1] → Chunk [2, 0, 1, -1]

/// Sentinel index for positions past the end of a line.
pub const PAD_INDEX: i32 = -1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk(Vec<i32>);

impl Chunk {
    /// Copy `window` and pad it with PAD_INDEX up to `width`.
    ///
    /// # Panics
    /// Panics if `window` is longer than `width`.
    pub fn padded(window: &[i32], width: usize) -> Self {
        assert!(
            window.len() <= width,
            "window of {} indices does not fit in a chunk of {}",
            window.len(),
            width
        );
        let mut indices = Vec::with_capacity(width);
        indices.extend_from_slice(window);
        indices.resize(width, PAD_INDEX);
        Self(indices)
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of real (non-padding) positions.
    pub fn valid_len(&self) -> usize {
        self.0.iter().take_while(|&&i| i != PAD_INDEX).count()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_window_is_padded() {
        let c = Chunk::padded(&[2, 0, 1], 4);
        assert_eq!(c.as_slice(), &[2, 0, 1, PAD_INDEX]);
        assert_eq!(c.len(), 4);
        assert_eq!(c.valid_len(), 3);
    }

    #[test]
    fn test_full_window_is_unchanged() {
        let c = Chunk::padded(&[0, 1, 2, 0], 4);
        assert_eq!(c.as_slice(), &[0, 1, 2, 0]);
        assert_eq!(c.valid_len(), 4);
    }

    #[test]
    fn test_valid_len_counts_only_real_positions() {
        assert_eq!(Chunk::padded(&[1], 4).valid_len(), 1);
        assert_eq!(Chunk::padded(&[], 4).valid_len(), 0);
    }

    #[test]
    #[should_panic]
    fn test_oversized_window_panics() {
        let _ = Chunk::padded(&[0, 1, 2], 2);
    }
}
