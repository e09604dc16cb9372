//! Mutable builder of a two-stage trie.
mod compact;
mod data;

use crate::errors::{Result, UtrieError};
use crate::layout::*;
use crate::values::{Value, ValueTable};
use crate::Trie;

use data::{DataArray, MAX_DATA_LENGTH_BUILDTIME};

/// The illegal-UTF-8 data block follows the ASCII block, at offset 128=0x80.
/// Length 64=0x40, not DATA_BLOCK_LENGTH.
const BAD_UTF8_DATA_OFFSET: usize = 0x80;

/// The start of non-linear-ASCII data blocks, at offset 192=0xc0.
const DATA_START_OFFSET: usize = 0xc0;

/// The null data block.
/// Length 64=0x40 even if DATA_BLOCK_LENGTH is smaller,
/// to work with 6-bit trail bytes from 2-byte UTF-8.
const DATA_NULL_OFFSET: usize = DATA_START_OFFSET;

/// The start of allocated data blocks.
const NEW_DATA_START_OFFSET: usize = DATA_NULL_OFFSET + 0x40;

/// Below, compaction uses a block length of 64 for 2-byte UTF-8.
/// From here on, compaction uses DATA_BLOCK_LENGTH.
/// Data values for 0x780 code points beyond ASCII.
const DATA_0800_OFFSET: usize = NEW_DATA_START_OFFSET + 0x780;

/// Length of the build-time index-1 table, covering all code points.
const INDEX_1_LENGTH: usize = (CODE_POINT_LIMIT >> SHIFT_1) as usize;

/// At build time, leave a gap in the index-2 table, at least as long as the maximum
/// lengths of the 2-byte UTF-8 index-2 table and the supplementary index-1 table.
/// Round up to INDEX_2_BLOCK_LENGTH for proper compacting.
const INDEX_GAP_OFFSET: usize = INDEX_2_BMP_LENGTH;
const INDEX_GAP_LENGTH: usize =
    (UTF8_2B_INDEX_2_LENGTH + MAX_INDEX_1_LENGTH + INDEX_2_MASK as usize) & !(INDEX_2_MASK as usize);

/// Maximum length of the build-time index-2 array: one entry per data block of all
/// code points, plus the lead surrogate code points, the gap and the null index-2
/// block.
const MAX_INDEX_2_LENGTH: usize = (CODE_POINT_LIMIT >> SHIFT_2) as usize
    + LSCP_INDEX_2_LENGTH
    + INDEX_GAP_LENGTH
    + INDEX_2_BLOCK_LENGTH;

/// The null index-2 block, following the gap in the index-2 table.
const INDEX_2_NULL_OFFSET: usize = INDEX_GAP_OFFSET + INDEX_GAP_LENGTH;

/// The start of allocated index-2 blocks.
const INDEX_2_START_OFFSET: usize = INDEX_2_NULL_OFFSET + INDEX_2_BLOCK_LENGTH;

/// Impossible index-2 value filling the gap, so that compaction never overlaps
/// other index-2 blocks with it.
const INDEX_GAP_VALUE: u32 = u32::MAX;

/// Builder of a two-stage trie.
///
/// Values are assigned with [`Builder::set()`] and [`Builder::set_range()`], and
/// [`Builder::freeze()`] compacts the structure into an immutable [`Trie`].
/// Once frozen, the builder can still be queried but no longer modified.
///
/// # Examples
///
/// ```
/// use utrie::Builder;
///
/// let mut builder = Builder::new(10, 666);
/// builder.set(0x4567, 99)?.set_range(0x20000, 0x2fffd, "ID", true)?;
///
/// assert_eq!(builder.get(0x4566), 10);
/// assert_eq!(builder.get(0x4567), 99);
///
/// let trie = builder.freeze()?;
/// assert_eq!(trie.get(0x4567), 99);
/// assert_eq!(trie.get_value(0x20000), utrie::Value::Label("ID"));
/// assert_eq!(trie.get(0x110000), 666);
/// # Ok::<(), utrie::errors::UtrieError>(())
/// ```
pub struct Builder {
    values: ValueTable,
    initial_value: u32,
    error_value: u32,
    index1: Vec<u32>,
    index2: Vec<u32>,
    data: DataArray,
    // Multi-purpose per-data-block table.
    //
    // Before compacting, a per-data-block reference counter or free-block list:
    //   0: unused
    //  >0: reference counter (number of index-2 entries pointing here)
    //  <0: negated offset of the next free data block in the free-block list
    //
    // While compacting, the map from original block offsets to new ones.
    map: Vec<i32>,
    data_null_offset: usize,
    index2_null_offset: usize,
    index2_length: usize,
    first_free_block: usize,
    high_start: u32,
    is_compacted: bool,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl Builder {
    /// Creates a new builder.
    ///
    /// # Arguments
    ///
    /// - `initial`: Value of every code point that is not assigned otherwise.
    /// - `error`: Value returned for out-of-range inputs.
    pub fn new<'a, 'b>(initial: impl Into<Value<'a>>, error: impl Into<Value<'b>>) -> Self {
        Self::with_values(vec![], initial, error)
    }

    /// Creates a new builder whose value table is seeded with `labels`, so that
    /// `labels[i]` is stored as `i`.
    pub fn with_values<'a, 'b>(
        labels: Vec<String>,
        initial: impl Into<Value<'a>>,
        error: impl Into<Value<'b>>,
    ) -> Self {
        let mut values = ValueTable::new(labels);
        let initial_value = values.intern(initial.into());
        let error_value = values.intern(error.into());

        let mut builder = Self {
            values,
            initial_value,
            error_value,
            index1: vec![0; INDEX_1_LENGTH],
            index2: vec![0; MAX_INDEX_2_LENGTH],
            data: DataArray::new(NEW_DATA_START_OFFSET),
            map: vec![0; MAX_DATA_LENGTH_BUILDTIME >> SHIFT_2],
            data_null_offset: DATA_NULL_OFFSET,
            index2_null_offset: INDEX_2_NULL_OFFSET,
            index2_length: INDEX_2_START_OFFSET,
            first_free_block: 0,
            high_start: CODE_POINT_LIMIT,
            is_compacted: false,
        };
        builder.init_blocks();
        builder
    }

    fn init_blocks(&mut self) {
        self.data.fill(0..0x80, self.initial_value);
        self.data.fill(0x80..DATA_NULL_OFFSET, self.error_value);
        self.data
            .fill(DATA_NULL_OFFSET..NEW_DATA_START_OFFSET, self.initial_value);

        // Linear ASCII blocks, each referenced once.
        for (i, block) in (0..0x80).step_by(DATA_BLOCK_LENGTH).enumerate() {
            self.index2[i] = block as u32;
            self.map[i] = 1;
        }

        // The null data block is referenced by all blocks except for the ASCII
        // blocks, plus once more so that it is never dropped during compaction,
        // plus the lead surrogate code points.
        self.map[DATA_NULL_OFFSET >> SHIFT_2] = ((CODE_POINT_LIMIT >> SHIFT_2) as i32
            - (0x80 >> SHIFT_2))
            + 1
            + LSCP_INDEX_2_LENGTH as i32;

        for i in (0x80 >> SHIFT_2)..INDEX_2_BMP_LENGTH {
            self.index2[i] = DATA_NULL_OFFSET as u32;
        }
        self.index2[INDEX_GAP_OFFSET..INDEX_2_NULL_OFFSET].fill(INDEX_GAP_VALUE);
        self.index2[INDEX_2_NULL_OFFSET..INDEX_2_START_OFFSET].fill(DATA_NULL_OFFSET as u32);

        // Index-1 entries for the linear BMP index-2 blocks, then the null index-2 block.
        for i in 0..OMITTED_BMP_INDEX_1_LENGTH {
            self.index1[i] = (i * INDEX_2_BLOCK_LENGTH) as u32;
        }
        self.index1[OMITTED_BMP_INDEX_1_LENGTH..].fill(INDEX_2_NULL_OFFSET as u32);

        // Preallocate U+0080..U+07FF for 2-byte UTF-8, which is compacted in
        // 64-blocks even though DATA_BLOCK_LENGTH is smaller.
        let mut block = NEW_DATA_START_OFFSET;
        for i2 in (0x80 >> SHIFT_2)..(0x800 >> SHIFT_2) {
            self.data
                .fill(block..block + DATA_BLOCK_LENGTH, self.initial_value);
            self.set_index2_entry(i2, block);
            block += DATA_BLOCK_LENGTH;
        }
        debug_assert_eq!(block, DATA_0800_OFFSET);
        self.data.truncate(DATA_0800_OFFSET);
    }

    /// Sets the value of a code point.
    ///
    /// # Errors
    ///
    /// [`UtrieError`] will be returned when
    ///
    /// - `c` is greater than U+10FFFF, or
    /// - the builder is already frozen, or
    /// - the data array exceeds its maximum capacity.
    pub fn set<'a>(&mut self, c: u32, value: impl Into<Value<'a>>) -> Result<&mut Self> {
        if c > MAX_CODE_POINT {
            return Err(UtrieError::input("code point must be no greater than U+10FFFF", c));
        }
        self.check_mutable()?;

        let value = self.values.intern(value.into());
        let block = self.get_data_block(c, true)?;
        self.data[block + (c & DATA_MASK) as usize] = value;
        Ok(self)
    }

    /// Sets the value of a lead surrogate as a UTF-16 code unit, which is kept apart
    /// from the value of the code point with the same number.
    ///
    /// # Errors
    ///
    /// [`UtrieError`] will be returned when `unit` is not in U+D800..U+DBFF or the
    /// builder is already frozen.
    pub fn set_lead_unit<'a>(&mut self, unit: u32, value: impl Into<Value<'a>>) -> Result<&mut Self> {
        if !is_lead_surrogate(unit) {
            return Err(UtrieError::input("lead surrogate must be in U+D800..U+DBFF", unit));
        }
        self.check_mutable()?;

        let value = self.values.intern(value.into());
        let block = self.get_data_block(unit, false)?;
        self.data[block + (unit & DATA_MASK) as usize] = value;
        Ok(self)
    }

    /// Sets a value for the code points in `start..=end`.
    ///
    /// If `overwrite` is false, only code points that still hold the initial value
    /// are changed.
    ///
    /// # Errors
    ///
    /// [`UtrieError`] will be returned when
    ///
    /// - `end` is greater than U+10FFFF or `start` is greater than `end`, or
    /// - the builder is already frozen, or
    /// - the data array exceeds its maximum capacity.
    pub fn set_range<'a>(
        &mut self,
        start: u32,
        end: u32,
        value: impl Into<Value<'a>>,
        overwrite: bool,
    ) -> Result<&mut Self> {
        if start > MAX_CODE_POINT {
            return Err(UtrieError::input("range start must be no greater than U+10FFFF", start));
        }
        if end > MAX_CODE_POINT {
            return Err(UtrieError::input("range end must be no greater than U+10FFFF", end));
        }
        if start > end {
            return Err(UtrieError::input("range start must be no greater than its end", start));
        }
        self.check_mutable()?;

        let value = self.values.intern(value.into());
        if !overwrite && value == self.initial_value {
            // Nothing to do
            return Ok(self);
        }
        self.fill_range(start, end, value, overwrite)?;
        Ok(self)
    }

    /// Returns the value of a code point, or the error value if `c` is out of range.
    #[inline]
    pub fn get(&self, c: u32) -> u32 {
        self.get_with(c, true)
    }

    /// Returns the value of `c`. Lead surrogates are looked up as code points if
    /// `from_lscp` is true, and as UTF-16 code units otherwise.
    pub fn get_with(&self, c: u32, from_lscp: bool) -> u32 {
        if c > MAX_CODE_POINT {
            return self.error_value;
        }
        if c >= self.high_start && !is_lead_surrogate(c) {
            return self.data[self.data.len() - DATA_GRANULARITY];
        }
        let i2 = if is_lead_surrogate(c) && from_lscp {
            LSCP_INDEX_2_OFFSET - (0xd800 >> SHIFT_2) + (c >> SHIFT_2) as usize
        } else {
            self.index1[(c >> SHIFT_1) as usize] as usize + ((c >> SHIFT_2) & INDEX_2_MASK) as usize
        };
        let block = self.index2[i2] as usize;
        self.data[block + (c & DATA_MASK) as usize]
    }

    /// Returns the value of a code point, mapped back to its label if it has one.
    pub fn get_value(&self, c: u32) -> Value {
        self.values.resolve(self.get(c))
    }

    /// Returns the value stored for `label`, if interned.
    pub fn value_id(&self, label: &str) -> Option<u32> {
        self.values.id(label)
    }

    /// Returns the interned labels, where the index of each label is its value.
    pub fn values(&self) -> &[String] {
        self.values.labels()
    }

    /// Returns the value of code points that are not assigned otherwise.
    pub const fn initial_value(&self) -> u32 {
        self.initial_value
    }

    /// Returns the value of out-of-range inputs.
    pub const fn error_value(&self) -> u32 {
        self.error_value
    }

    /// Checks if the builder has been frozen.
    pub const fn is_frozen(&self) -> bool {
        self.is_compacted
    }

    /// Compacts the storage and creates an immutable [`Trie`] for fast lookups.
    ///
    /// The compaction happens once; later calls only rebuild the [`Trie`].
    ///
    /// # Errors
    ///
    /// [`UtrieError`] will be returned when the compacted trie does not fit
    /// 16-bit index values.
    pub fn freeze(&mut self) -> Result<Trie> {
        if !self.is_compacted {
            self.compact()?;
        }
        self.build_trie()
    }

    /// Freezes the builder and serializes the resulting trie.
    ///
    /// See [`Trie::serialize_to_vec()`] for the format.
    ///
    /// # Errors
    ///
    /// [`UtrieError`] will be returned when freezing or compression fails.
    #[cfg(feature = "codec")]
    pub fn serialize_to_vec(&mut self) -> Result<Vec<u8>> {
        self.freeze()?.serialize_to_vec()
    }

    #[inline(always)]
    fn check_mutable(&self) -> Result<()> {
        if self.is_compacted {
            Err(UtrieError::state("the builder is already frozen."))
        } else {
            Ok(())
        }
    }

    fn fill_range(&mut self, mut start: u32, end: u32, value: u32, overwrite: bool) -> Result<()> {
        let mut limit = end + 1;
        if start & DATA_MASK != 0 {
            // Set partial block at [start..following block boundary
            let block = self.get_data_block(start, true)?;
            let next_start = (start + DATA_BLOCK_LENGTH as u32) & !DATA_MASK;
            if next_start <= limit {
                self.fill_block(block, start & DATA_MASK, DATA_BLOCK_LENGTH as u32, value, overwrite);
                start = next_start;
            } else {
                self.fill_block(block, start & DATA_MASK, limit & DATA_MASK, value, overwrite);
                return Ok(());
            }
        }

        // Number of positions in the last, partial block
        let rest = limit & DATA_MASK;
        limit &= !DATA_MASK;

        let mut repeat_block = if value == self.initial_value {
            Some(self.data_null_offset)
        } else {
            None
        };

        while start < limit {
            if value == self.initial_value && self.is_in_null_block(start, true) {
                start += DATA_BLOCK_LENGTH as u32;
                continue;
            }

            let i2 = self.get_index2_block(start, true)? + ((start >> SHIFT_2) & INDEX_2_MASK) as usize;
            let block = self.index2[i2] as usize;
            let mut set_repeat_block = false;
            if self.is_writable_block(block) {
                if overwrite && block >= DATA_0800_OFFSET {
                    // Not a protected (ASCII-linear or 2-byte UTF-8) block, and every
                    // value is replaced: share the repeat block instead.
                    set_repeat_block = true;
                } else {
                    self.fill_block(block, 0, DATA_BLOCK_LENGTH as u32, value, overwrite);
                }
            } else if self.data[block] != value && (overwrite || block == self.data_null_offset) {
                // A non-writable block is either the null block or a repeat block of
                // an earlier range, so all of its entries have the same value.
                set_repeat_block = true;
            }

            if set_repeat_block {
                match repeat_block {
                    Some(repeat_block) => self.set_index2_entry(i2, repeat_block),
                    None => {
                        let block = self.get_data_block(start, true)?;
                        self.data.fill(block..block + DATA_BLOCK_LENGTH, value);
                        repeat_block = Some(block);
                    }
                }
            }

            start += DATA_BLOCK_LENGTH as u32;
        }

        if rest > 0 {
            // Set partial block at [last block boundary..limit
            let block = self.get_data_block(start, true)?;
            self.fill_block(block, 0, rest, value, overwrite);
        }

        Ok(())
    }

    #[inline(always)]
    fn fill_block(&mut self, block: usize, start: u32, limit: u32, value: u32, overwrite: bool) {
        let range = block + start as usize..block + limit as usize;
        if overwrite {
            self.data.fill(range, value);
        } else {
            for i in range {
                if self.data[i] == self.initial_value {
                    self.data[i] = value;
                }
            }
        }
    }

    fn is_in_null_block(&self, c: u32, for_lscp: bool) -> bool {
        let i2 = if is_lead_surrogate(c) && for_lscp {
            LSCP_INDEX_2_OFFSET - (0xd800 >> SHIFT_2) + (c >> SHIFT_2) as usize
        } else {
            self.index1[(c >> SHIFT_1) as usize] as usize + ((c >> SHIFT_2) & INDEX_2_MASK) as usize
        };
        self.index2[i2] as usize == self.data_null_offset
    }

    fn alloc_index2_block(&mut self) -> Result<usize> {
        let new_block = self.index2_length;
        let new_top = new_block + INDEX_2_BLOCK_LENGTH;
        if new_top > self.index2.len() {
            return Err(UtrieError::scale("build-time index-2 length", MAX_INDEX_2_LENGTH as u32));
        }
        self.index2_length = new_top;
        self.index2.copy_within(
            self.index2_null_offset..self.index2_null_offset + INDEX_2_BLOCK_LENGTH,
            new_block,
        );
        Ok(new_block)
    }

    fn get_index2_block(&mut self, c: u32, for_lscp: bool) -> Result<usize> {
        if is_lead_surrogate(c) && for_lscp {
            return Ok(LSCP_INDEX_2_OFFSET);
        }
        let i1 = (c >> SHIFT_1) as usize;
        let mut i2 = self.index1[i1] as usize;
        if i2 == self.index2_null_offset {
            i2 = self.alloc_index2_block()?;
            self.index1[i1] = i2 as u32;
        }
        Ok(i2)
    }

    #[inline(always)]
    fn is_writable_block(&self, block: usize) -> bool {
        block != self.data_null_offset && self.map[block >> SHIFT_2] == 1
    }

    fn alloc_data_block(&mut self, copy_block: usize) -> Result<usize> {
        let new_block = if self.first_free_block == 0 {
            self.data.alloc_block()?
        } else {
            let block = self.first_free_block;
            self.first_free_block = -self.map[block >> SHIFT_2] as usize;
            block
        };
        self.data.copy_block(copy_block, new_block);
        self.map[new_block >> SHIFT_2] = 0;
        Ok(new_block)
    }

    #[inline(always)]
    fn release_data_block(&mut self, block: usize) {
        // Put this block at the front of the free-block chain
        self.map[block >> SHIFT_2] = -(self.first_free_block as i32);
        self.first_free_block = block;
    }

    fn set_index2_entry(&mut self, i2: usize, block: usize) {
        // Increment first, in case block == old_block!
        self.map[block >> SHIFT_2] += 1;
        let old_block = self.index2[i2] as usize;
        self.map[old_block >> SHIFT_2] -= 1;
        if self.map[old_block >> SHIFT_2] == 0 {
            self.release_data_block(old_block);
        }
        self.index2[i2] = block as u32;
    }

    /// Returns a writable data block for `c`, copying a shared one first.
    fn get_data_block(&mut self, c: u32, for_lscp: bool) -> Result<usize> {
        let i2 = self.get_index2_block(c, for_lscp)? + ((c >> SHIFT_2) & INDEX_2_MASK) as usize;
        let old_block = self.index2[i2] as usize;
        if self.is_writable_block(old_block) {
            return Ok(old_block);
        }
        let new_block = self.alloc_data_block(old_block)?;
        self.set_index2_entry(i2, new_block);
        Ok(new_block)
    }
}
