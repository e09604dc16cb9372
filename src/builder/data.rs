use crate::errors::{Result, UtrieError};
use crate::layout::DATA_BLOCK_LENGTH;

use std::ops::{Index, IndexMut, Range};

/// Start with allocation of 16k data entries.
pub(crate) const INITIAL_DATA_LENGTH: usize = 1 << 14;

/// Grow about 8x each time.
pub(crate) const MEDIUM_DATA_LENGTH: usize = 1 << 17;

/// Maximum length of the build-time data array. One entry per 0x110000 code points,
/// plus the illegal-UTF-8 block and the null block, plus values for the 0x400
/// surrogate code units.
pub(crate) const MAX_DATA_LENGTH_BUILDTIME: usize = 0x110000 + 0x40 + 0x40 + 0x400;

/// Build-time data array with a fixed sequence of capacity tiers.
///
/// Entries in `[len, capacity)` are addressable so that compaction can pad the
/// compacted tail in place.
pub(crate) struct DataArray {
    buf: Vec<u32>,
    len: usize,
}

impl DataArray {
    pub fn new(len: usize) -> Self {
        debug_assert!(len <= INITIAL_DATA_LENGTH);
        Self {
            buf: vec![0; INITIAL_DATA_LENGTH],
            len,
        }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Takes a new block from the high end, growing the capacity if needed.
    pub fn alloc_block(&mut self) -> Result<usize> {
        let new_block = self.len;
        let new_top = new_block + DATA_BLOCK_LENGTH;
        if new_top > self.capacity() {
            self.grow()?;
        }
        self.len = new_top;
        Ok(new_block)
    }

    fn grow(&mut self) -> Result<()> {
        let capacity = if self.capacity() < MEDIUM_DATA_LENGTH {
            MEDIUM_DATA_LENGTH
        } else if self.capacity() < MAX_DATA_LENGTH_BUILDTIME {
            MAX_DATA_LENGTH_BUILDTIME
        } else {
            return Err(UtrieError::scale(
                "build-time data length",
                MAX_DATA_LENGTH_BUILDTIME as u32,
            ));
        };
        tracing::debug!(from = self.capacity(), to = capacity, "growing data array");
        self.buf.resize(capacity, 0);
        Ok(())
    }

    /// Appends a value after the compacted data.
    pub fn push(&mut self, value: u32) {
        if self.len == self.buf.len() {
            self.buf.push(value);
        } else {
            self.buf[self.len] = value;
        }
        self.len += 1;
    }

    /// Sets the used length after compaction moved the blocks down.
    pub fn truncate(&mut self, len: usize) {
        debug_assert!(len <= self.capacity());
        self.len = len;
    }

    #[inline(always)]
    pub fn copy_block(&mut self, src: usize, dst: usize) {
        self.buf.copy_within(src..src + DATA_BLOCK_LENGTH, dst);
    }

    /// Moves `src` down to `dst`, as compaction does with each surviving block.
    #[inline(always)]
    pub fn copy_within(&mut self, src: Range<usize>, dst: usize) {
        debug_assert!(dst <= src.start);
        self.buf.copy_within(src, dst);
    }

    #[inline(always)]
    pub fn fill(&mut self, range: Range<usize>, value: u32) {
        self.buf[range].fill(value);
    }

    /// Checks whether the `len` entries at `s` and `t` are identical.
    #[inline(always)]
    pub fn equal(&self, s: usize, t: usize, len: usize) -> bool {
        self.buf[s..s + len] == self.buf[t..t + len]
    }

    #[inline(always)]
    pub fn as_slice(&self) -> &[u32] {
        &self.buf[..self.len]
    }
}

impl Index<usize> for DataArray {
    type Output = u32;

    #[inline(always)]
    fn index(&self, i: usize) -> &u32 {
        &self.buf[i]
    }
}

impl IndexMut<usize> for DataArray {
    #[inline(always)]
    fn index_mut(&mut self, i: usize) -> &mut u32 {
        &mut self.buf[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_tiers() {
        let mut data = DataArray::new(INITIAL_DATA_LENGTH);
        assert_eq!(data.capacity(), INITIAL_DATA_LENGTH);

        assert_eq!(data.alloc_block().unwrap(), INITIAL_DATA_LENGTH);
        assert_eq!(data.capacity(), MEDIUM_DATA_LENGTH);

        data.truncate(MEDIUM_DATA_LENGTH);
        data.alloc_block().unwrap();
        assert_eq!(data.capacity(), MAX_DATA_LENGTH_BUILDTIME);
        assert_eq!(data.len(), MEDIUM_DATA_LENGTH + DATA_BLOCK_LENGTH);
    }

    #[test]
    fn test_ceiling() {
        let mut data = DataArray::new(0);
        data.truncate(INITIAL_DATA_LENGTH);
        data.alloc_block().unwrap();
        data.truncate(MEDIUM_DATA_LENGTH);
        data.alloc_block().unwrap();
        data.truncate(MAX_DATA_LENGTH_BUILDTIME - DATA_BLOCK_LENGTH);
        data.alloc_block().unwrap();
        assert!(matches!(
            data.alloc_block(),
            Err(UtrieError::Scale(_))
        ));
    }

    #[test]
    fn test_push_past_capacity() {
        let mut data = DataArray::new(INITIAL_DATA_LENGTH);
        data.push(7);
        assert_eq!(data.len(), INITIAL_DATA_LENGTH + 1);
        assert_eq!(data[INITIAL_DATA_LENGTH], 7);
    }

    #[test]
    fn test_copy_and_equal() {
        let mut data = DataArray::new(3 * DATA_BLOCK_LENGTH);
        data.fill(0..DATA_BLOCK_LENGTH, 5);
        data.copy_block(0, 2 * DATA_BLOCK_LENGTH);
        assert!(data.equal(0, 2 * DATA_BLOCK_LENGTH, DATA_BLOCK_LENGTH));
        assert!(!data.equal(0, DATA_BLOCK_LENGTH, DATA_BLOCK_LENGTH));
    }
}
