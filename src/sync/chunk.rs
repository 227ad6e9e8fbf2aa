//! Splitting track lists into request-sized batches.

use crate::config::DEFAULT_BATCH_SIZE;

/// Splits slices into contiguous batches of bounded size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchChunker {
    default_size: usize,
}

impl Default for BatchChunker {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

impl BatchChunker {
    /// Creates a chunker. A zero `default_size` falls back to 100.
    #[must_use]
    pub const fn new(default_size: usize) -> Self {
        Self {
            default_size: if default_size == 0 {
                DEFAULT_BATCH_SIZE
            } else {
                default_size
            },
        }
    }

    /// The size used when a call passes `0`.
    #[must_use]
    pub const fn default_size(&self) -> usize {
        self.default_size
    }

    /// Splits `items` into chunks of at most `max_size` (or the default size
    /// when `max_size` is 0).
    ///
    /// Chunks are contiguous and in input order; all but the last have
    /// exactly `max_size` items. Empty input yields no chunks.
    ///
    /// ```
    /// use randomness::BatchChunker;
    ///
    /// let items: Vec<u32> = (0..250).collect();
    /// let sizes: Vec<usize> = BatchChunker::default()
    ///     .chunk(&items, 100)
    ///     .iter()
    ///     .map(|c| c.len())
    ///     .collect();
    /// assert_eq!(sizes, vec![100, 100, 50]);
    /// ```
    #[must_use]
    pub fn chunk<'a, T>(&self, items: &'a [T], max_size: usize) -> Vec<&'a [T]> {
        let size = if max_size == 0 {
            self.default_size
        } else {
            max_size
        };
        items.chunks(size).collect()
    }
}

/// Splits `items` with the default chunker.
#[must_use]
pub fn chunk<T>(items: &[T], max_size: usize) -> Vec<&[T]> {
    BatchChunker::default().chunk(items, max_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0, 100, 0 ; "empty input")]
    #[test_case(1, 100, 1 ; "single item")]
    #[test_case(100, 100, 1 ; "exactly one batch")]
    #[test_case(101, 100, 2 ; "one over")]
    #[test_case(250, 100, 3 ; "partial tail")]
    #[test_case(7, 3, 3 ; "small batches")]
    fn test_chunk_count(len: usize, max_size: usize, expected: usize) {
        let items: Vec<usize> = (0..len).collect();
        assert_eq!(chunk(&items, max_size).len(), expected);
    }

    #[test]
    fn test_zero_max_size_uses_default() {
        let items: Vec<usize> = (0..201).collect();
        let chunks = chunk(&items, 0);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 100);
        assert_eq!(chunks[2].len(), 1);
    }

    #[test]
    fn test_custom_default_size() {
        let chunker = BatchChunker::new(2);
        assert_eq!(chunker.default_size(), 2);
        assert_eq!(chunker.chunk(&[1, 2, 3], 0), vec![&[1, 2][..], &[3][..]]);
        assert_eq!(BatchChunker::new(0).default_size(), DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn test_chunks_preserve_order() {
        let items = ["a", "b", "c", "d", "e"];
        let rejoined: Vec<&str> = chunk(&items, 2).concat();
        assert_eq!(rejoined, items);
    }
}
