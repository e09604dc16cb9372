//! Compaction of the build-time arrays and the layout of the flat runtime array.
use super::*;

/// Maximum length of the runtime index array, addressed by 16-bit values.
const MAX_INDEX_LENGTH: usize = 0xffff;

/// Maximum length of the runtime data array, addressed by 16-bit values
/// shifted left by [`INDEX_SHIFT`].
const MAX_DATA_LENGTH_RUNTIME: usize = 0xffff << INDEX_SHIFT;

/// Padding of the compacted index-2 table, impossible for real data.
const INDEX_2_PADDING_VALUE: u32 = 0xffff << INDEX_SHIFT;

/// Checks that a compacted trie is addressable by 16-bit index values.
///
/// `index_length` is the length of all the indexes, which is also the offset by
/// which the data array is moved in the flat array.
pub(crate) fn check_runtime_limits(
    index_length: usize,
    data_null_offset: usize,
    data_length: usize,
) -> Result<()> {
    if index_length > MAX_INDEX_LENGTH {
        return Err(UtrieError::scale("index length", MAX_INDEX_LENGTH as u32));
    }
    if index_length + data_null_offset > 0xffff {
        return Err(UtrieError::scale("offset of the null data block", 0xffff));
    }
    if index_length + DATA_0800_OFFSET > 0xffff {
        return Err(UtrieError::scale("offset of the 2-byte UTF-8 data blocks", 0xffff));
    }
    if index_length + data_length > MAX_DATA_LENGTH_RUNTIME {
        return Err(UtrieError::scale(
            "total length of the trie",
            MAX_DATA_LENGTH_RUNTIME as u32,
        ));
    }
    Ok(())
}

impl Builder {
    /// Finds the start of the last range of code points that all hold `high_value`.
    pub(super) fn find_high_start(&self, high_value: u32) -> u32 {
        // Blocks known to be filled with high_value
        let (mut prev_i2_block, mut prev_block) = if high_value == self.initial_value {
            (Some(self.index2_null_offset), Some(self.data_null_offset))
        } else {
            (None, None)
        };

        let mut c = CODE_POINT_LIMIT;
        for i1 in (0..INDEX_1_LENGTH).rev() {
            let i2_block = self.index1[i1] as usize;
            if Some(i2_block) == prev_i2_block {
                c -= CP_PER_INDEX_1_ENTRY;
                continue;
            }
            prev_i2_block = Some(i2_block);

            if i2_block == self.index2_null_offset {
                if high_value != self.initial_value {
                    return c;
                }
                c -= CP_PER_INDEX_1_ENTRY;
                continue;
            }

            for i2 in (0..INDEX_2_BLOCK_LENGTH).rev() {
                let block = self.index2[i2_block + i2] as usize;
                if Some(block) == prev_block {
                    c -= DATA_BLOCK_LENGTH as u32;
                    continue;
                }
                prev_block = Some(block);

                if block == self.data_null_offset {
                    if high_value != self.initial_value {
                        return c;
                    }
                    c -= DATA_BLOCK_LENGTH as u32;
                } else {
                    for j in (0..DATA_BLOCK_LENGTH).rev() {
                        if self.data[block + j] != high_value {
                            return c;
                        }
                        c -= 1;
                    }
                }
            }
        }
        0
    }

    fn find_same_data_block(&self, data_length: usize, other_block: usize, block_length: usize) -> Option<usize> {
        // Do not even partially get past data_length
        let last = data_length.checked_sub(block_length)?;
        (0..=last)
            .step_by(DATA_GRANULARITY)
            .find(|&block| self.data.equal(block, other_block, block_length))
    }

    fn find_same_index2_block(&self, index2_length: usize, other_block: usize) -> Option<usize> {
        let last = index2_length.checked_sub(INDEX_2_BLOCK_LENGTH)?;
        let other = &self.index2[other_block..other_block + INDEX_2_BLOCK_LENGTH];
        (0..=last).find(|&block| &self.index2[block..block + INDEX_2_BLOCK_LENGTH] == other)
    }

    #[inline(always)]
    fn map_data_blocks(&mut self, start: usize, moved_start: usize, block_count: usize) {
        let first = start >> SHIFT_2;
        for (k, m) in self.map[first..first + block_count].iter_mut().enumerate() {
            *m = (moved_start + k * DATA_BLOCK_LENGTH) as i32;
        }
    }

    /// Removes unused data blocks, merges identical ones, and overlaps adjacent
    /// blocks where their ends match.
    fn compact_data(&mut self) {
        // Linear ASCII data stays in place
        let mut new_start = DATA_START_OFFSET;
        for (i, start) in (0..new_start).step_by(DATA_BLOCK_LENGTH).enumerate() {
            self.map[i] = start as i32;
        }

        // 64-blocks for 2-byte UTF-8, then DATA_BLOCK_LENGTH
        let mut block_length = 64;
        let mut block_count = block_length >> SHIFT_2;
        let mut start = new_start;
        while start < self.data.len() {
            if start == DATA_0800_OFFSET {
                block_length = DATA_BLOCK_LENGTH;
                block_count = 1;
            }

            // Unused
            if self.map[start >> SHIFT_2] <= 0 {
                start += block_length;
                continue;
            }

            if let Some(moved_start) = self.find_same_data_block(new_start, start, block_length) {
                self.map_data_blocks(start, moved_start, block_count);
                start += block_length;
                continue;
            }

            // Maximum overlap, modulo granularity, with the previous adjacent block
            let mut overlap = block_length - DATA_GRANULARITY;
            while overlap > 0 && !self.data.equal(new_start - overlap, start, overlap) {
                overlap -= DATA_GRANULARITY;
            }

            if overlap > 0 || new_start < start {
                self.map_data_blocks(start, new_start - overlap, block_count);
                start += overlap;
                let rest = block_length - overlap;
                self.data.copy_within(start..start + rest, new_start);
                new_start += rest;
                start += rest;
            } else {
                self.map_data_blocks(start, start, block_count);
                start += block_length;
                new_start = start;
            }
        }

        let mut i = 0;
        while i < self.index2_length {
            if i == INDEX_GAP_OFFSET {
                i += INDEX_GAP_LENGTH;
            }
            self.index2[i] = self.map[self.index2[i] as usize >> SHIFT_2] as u32;
            i += 1;
        }
        self.data_null_offset = self.map[self.data_null_offset >> SHIFT_2] as usize;

        self.data.truncate(new_start);
        while self.data.len() & (DATA_GRANULARITY - 1) != 0 {
            self.data.push(self.initial_value);
        }
    }

    /// Same as [`Builder::compact_data()`] for the supplementary index-2 blocks.
    fn compact_index2(&mut self) {
        // Linear BMP index-2 blocks stay in place
        let mut new_start = INDEX_2_BMP_LENGTH;
        for (i, start) in (0..new_start).step_by(INDEX_2_BLOCK_LENGTH).enumerate() {
            self.map[i] = start as i32;
        }

        // Reduce the gap to what the runtime needs
        new_start += UTF8_2B_INDEX_2_LENGTH + ((self.high_start - 0x10000) >> SHIFT_1) as usize;
        let mut start = INDEX_2_NULL_OFFSET;
        while start < self.index2_length {
            if let Some(moved_start) = self.find_same_index2_block(new_start, start) {
                self.map[start >> SHIFT_1_2] = moved_start as i32;
                start += INDEX_2_BLOCK_LENGTH;
                continue;
            }

            let mut overlap = INDEX_2_BLOCK_LENGTH - 1;
            while overlap > 0
                && self.index2[new_start - overlap..new_start] != self.index2[start..start + overlap]
            {
                overlap -= 1;
            }

            if overlap > 0 || new_start < start {
                self.map[start >> SHIFT_1_2] = (new_start - overlap) as i32;
                start += overlap;
                let rest = INDEX_2_BLOCK_LENGTH - overlap;
                self.index2.copy_within(start..start + rest, new_start);
                new_start += rest;
                start += rest;
            } else {
                self.map[start >> SHIFT_1_2] = start as i32;
                start += INDEX_2_BLOCK_LENGTH;
                new_start = start;
            }
        }

        for i1 in self.index1.iter_mut() {
            *i1 = self.map[*i1 as usize >> SHIFT_1_2] as u32;
        }
        self.index2_null_offset = self.map[self.index2_null_offset >> SHIFT_1_2] as usize;

        // Granularity-aligned and 2-aligned
        while new_start & ((DATA_GRANULARITY - 1) | 1) != 0 {
            self.index2[new_start] = INDEX_2_PADDING_VALUE;
            new_start += 1;
        }
        self.index2_length = new_start;
    }

    pub(super) fn compact(&mut self) -> Result<()> {
        let mut high_value = self.get(MAX_CODE_POINT);
        let mut high_start = self.find_high_start(high_value);
        high_start = (high_start + CP_PER_INDEX_1_ENTRY - 1) & !(CP_PER_INDEX_1_ENTRY - 1);
        if high_start == CODE_POINT_LIMIT {
            high_value = self.error_value;
        }

        // Set only after get(MAX_CODE_POINT), which would read the high value otherwise.
        self.high_start = high_start;
        if high_start < CODE_POINT_LIMIT {
            // Blank out [high_start..10FFFF] to release the associated data blocks.
            let supp_high_start = high_start.max(0x10000);
            self.fill_range(supp_high_start, MAX_CODE_POINT, self.initial_value, true)?;
        }

        let build_length = self.data.len();
        self.compact_data();
        if high_start > 0x10000 {
            self.compact_index2();
        }

        // Only after compact_data(), which assumes a multiple of DATA_BLOCK_LENGTH.
        self.data.push(high_value);
        while self.data.len() & (DATA_GRANULARITY - 1) != 0 {
            self.data.push(self.initial_value);
        }
        self.is_compacted = true;

        tracing::debug!(
            high_start = format_args!("{:#x}", high_start),
            high_value,
            build_length,
            data_length = self.data.len(),
            index2_length = self.index2_length,
            "compacted trie"
        );
        Ok(())
    }

    /// Lays out the compacted indexes and data in one flat array.
    pub(super) fn build_trie(&self) -> Result<Trie> {
        let index_length = if self.high_start <= 0x10000 {
            INDEX_1_OFFSET
        } else {
            self.index2_length
        };
        check_runtime_limits(index_length, self.data_null_offset, self.data.len())?;

        // Data offsets move up past the indexes
        let data_move = index_length as u32;
        let mut flat = Vec::with_capacity(index_length + self.data.len());

        // Index-2 values for the BMP, shifted right by INDEX_SHIFT
        flat.extend(
            self.index2[..INDEX_2_BMP_LENGTH]
                .iter()
                .map(|&i2| (i2 + data_move) >> INDEX_SHIFT),
        );

        // Index-2 values for 2-byte UTF-8, not shifted.
        // C0..C1 are illegal lead bytes.
        flat.extend([data_move + BAD_UTF8_DATA_OFFSET as u32; 2]);
        flat.extend((0x2..0x20).map(|i| data_move + self.index2[i << (6 - SHIFT_2)]));

        if self.high_start > 0x10000 {
            let index1_length = ((self.high_start - 0x10000) >> SHIFT_1) as usize;
            let index2_offset = INDEX_2_BMP_LENGTH + UTF8_2B_INDEX_2_LENGTH + index1_length;

            // Index-1 values for supplementary code points
            flat.extend_from_slice(
                &self.index1[OMITTED_BMP_INDEX_1_LENGTH..OMITTED_BMP_INDEX_1_LENGTH + index1_length],
            );
            flat.extend(
                self.index2[index2_offset..self.index2_length]
                    .iter()
                    .map(|&i2| (i2 + data_move) >> INDEX_SHIFT),
            );
        }
        debug_assert_eq!(flat.len(), index_length);

        flat.extend_from_slice(self.data.as_slice());
        tracing::debug!(index_length, length = flat.len(), "laid out flat array");
        Ok(Trie::from_parts(
            flat,
            self.high_start,
            self.error_value,
            self.values.clone(),
        ))
    }
}
