// ============================================================
// Layer 3: Vocabulary
// ============================================================
// The fixed, ordered alphabet the model reads and writes.
// A character's index is its position in the alphabet.
//
// Encoding and decoding are deliberately asymmetric:
//   encode: characters outside the alphabet are dropped
//   decode: indices outside the alphabet render as "PAD"
//
// Example with alphabet "ABC":
//   encode("AxB")     → [0, 1]
//   decode([0, 1, -1]) → "ABPAD"

use std::collections::HashMap;

/// What an out-of-range index decodes to.
pub const PAD_TEXT: &str = "PAD";

/// Ordered set of unique characters with O(1) lookup both ways.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    chars: Vec<char>,
    index: HashMap<char, usize>,
}

impl Vocabulary {
    /// Build a vocabulary from an alphabet string.
    ///
    /// A character that appears more than once keeps its first
    /// position; later repeats are skipped so every index maps
    /// back to exactly one character.
    pub fn new(alphabet: &str) -> Self {
        let mut chars = Vec::new();
        let mut index = HashMap::new();

        for c in alphabet.chars() {
            if !index.contains_key(&c) {
                index.insert(c, chars.len());
                chars.push(c);
            }
        }

        Self { chars, index }
    }

    /// Number of distinct characters (the one-hot width).
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Index of `c`, or None when it is not part of the alphabet.
    pub fn index_of(&self, c: char) -> Option<usize> {
        self.index.get(&c).copied()
    }

    /// The alphabet in index order.
    pub fn as_string(&self) -> String {
        self.chars.iter().collect()
    }

    /// Map text to indices, silently omitting unknown characters.
    pub fn encode(&self, text: &str) -> Vec<i32> {
        text.chars()
            .filter_map(|c| self.index_of(c))
            .map(|i| i as i32)
            .collect()
    }

    /// Map indices back to text. Negative (padding) and
    /// out-of-range indices each become the literal "PAD".
    pub fn decode(&self, indices: &[i32]) -> String {
        let mut out = String::with_capacity(indices.len());
        for &i in indices {
            match usize::try_from(i).ok().and_then(|i| self.chars.get(i)) {
                Some(&c) => out.push(c),
                None     => out.push_str(PAD_TEXT),
            }
        }
        out
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_uses_positions() {
        let v = Vocabulary::new("ABC");
        assert_eq!(v.encode("ABCAB"), vec![0, 1, 2, 0, 1]);
    }

    #[test]
    fn test_encode_drops_unknown_chars() {
        let v = Vocabulary::new("ABC");
        assert_eq!(v.encode("AxB?C"), vec![0, 1, 2]);
        assert!(v.encode("xyz").is_empty());
    }

    #[test]
    fn test_decode_renders_padding_as_pad() {
        let v = Vocabulary::new("ABC");
        assert_eq!(v.decode(&[0, 1, -1]), "ABPAD");
    }

    #[test]
    fn test_decode_out_of_range_is_pad() {
        let v = Vocabulary::new("ABC");
        assert_eq!(v.decode(&[2, 3]), "CPAD");
    }

    #[test]
    fn test_round_trip_in_vocabulary_text() {
        let v = Vocabulary::new(crate::application::train_use_case::DEFAULT_VOCABULARY);
        let s = "Make America Great Again! @user #tag ➡📈";
        // '!' is not in the alphabet, everything else is
        let kept: String = s.chars().filter(|&c| c != '!').collect();
        assert_eq!(v.decode(&v.encode(&kept)), kept);
    }

    #[test]
    fn test_repeated_chars_keep_first_index() {
        let v = Vocabulary::new("a'b'c");
        assert_eq!(v.len(), 4);
        assert_eq!(v.index_of('\''), Some(1));
        assert_eq!(v.as_string(), "a'bc");
    }
}
