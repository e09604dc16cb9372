//! Bit layout of the two-stage index shared by the builder and the frozen trie.

/// Shift size for getting the index-1 table offset.
pub(crate) const SHIFT_1: u32 = 6 + 5;

/// Shift size for getting the index-2 table offset.
pub(crate) const SHIFT_2: u32 = 5;

/// Difference between the two shift sizes, for getting an index-1 offset from an
/// index-2 offset. 6=11-5
pub(crate) const SHIFT_1_2: u32 = SHIFT_1 - SHIFT_2;

/// Number of index-1 entries for the BMP. 32=0x20
/// This part of the index-1 table is omitted from the frozen form.
pub(crate) const OMITTED_BMP_INDEX_1_LENGTH: usize = 0x10000 >> SHIFT_1;

/// Number of entries in an index-2 block. 64=0x40
pub(crate) const INDEX_2_BLOCK_LENGTH: usize = 1 << SHIFT_1_2;

/// Mask for getting the lower bits for the in-index-2-block offset.
pub(crate) const INDEX_2_MASK: u32 = INDEX_2_BLOCK_LENGTH as u32 - 1;

/// Shift size for shifting left the index array values.
/// Data blocks must therefore be aligned by [`DATA_GRANULARITY`].
pub(crate) const INDEX_SHIFT: u32 = 2;

/// Number of entries in a data block. 32=0x20
pub(crate) const DATA_BLOCK_LENGTH: usize = 1 << SHIFT_2;

/// Mask for getting the lower bits for the in-data-block offset.
pub(crate) const DATA_MASK: u32 = DATA_BLOCK_LENGTH as u32 - 1;

/// The part of the index-2 table for U+D800..U+DBFF stores values for lead
/// surrogate code units, not code points. Values for lead surrogate code points
/// are indexed with this portion of the table.
pub(crate) const LSCP_INDEX_2_OFFSET: usize = 0x10000 >> SHIFT_2;
pub(crate) const LSCP_INDEX_2_LENGTH: usize = 0x400 >> SHIFT_2;

/// Count the lengths of both BMP pieces. 2080=0x820
pub(crate) const INDEX_2_BMP_LENGTH: usize = LSCP_INDEX_2_OFFSET + LSCP_INDEX_2_LENGTH;

/// The 2-byte UTF-8 version of the index-2 table follows at offset 2080=0x820.
/// Length 32=0x20 for lead bytes C0..DF, regardless of SHIFT_2.
pub(crate) const UTF8_2B_INDEX_2_OFFSET: usize = INDEX_2_BMP_LENGTH;
pub(crate) const UTF8_2B_INDEX_2_LENGTH: usize = 0x800 >> 6;

/// The index-1 table, only used for supplementary code points, at offset 2112=0x840.
/// Its length depends on `high_start`, at most 512=0x200 entries.
///
/// The index-1 table and the supplementary part of the index-2 table are omitted
/// completely if there is only BMP data.
pub(crate) const INDEX_1_OFFSET: usize = UTF8_2B_INDEX_2_OFFSET + UTF8_2B_INDEX_2_LENGTH;
pub(crate) const MAX_INDEX_1_LENGTH: usize = 0x100000 >> SHIFT_1;

/// The alignment size of a data block. Also the granularity for compaction.
pub(crate) const DATA_GRANULARITY: usize = 1 << INDEX_SHIFT;

/// Number of code points covered by one index-1 entry. 2048=0x800
pub(crate) const CP_PER_INDEX_1_ENTRY: u32 = 1 << SHIFT_1;

/// Largest valid code point.
pub(crate) const MAX_CODE_POINT: u32 = 0x10ffff;

/// Number of code points, i.e., the `high_start` of a trie without a uniform tail.
pub(crate) const CODE_POINT_LIMIT: u32 = 0x110000;

#[inline(always)]
pub(crate) const fn is_lead_surrogate(c: u32) -> bool {
    c & 0xffff_fc00 == 0xd800
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry() {
        assert_eq!(INDEX_2_BLOCK_LENGTH, 0x40);
        assert_eq!(DATA_BLOCK_LENGTH, 0x20);
        assert_eq!(INDEX_2_BMP_LENGTH, 0x820);
        assert_eq!(INDEX_1_OFFSET, 0x840);
        assert_eq!(OMITTED_BMP_INDEX_1_LENGTH, 0x20);
        assert_eq!(MAX_INDEX_1_LENGTH, 0x200);
        assert_eq!(CP_PER_INDEX_1_ENTRY as usize, DATA_BLOCK_LENGTH * INDEX_2_BLOCK_LENGTH);
    }

    #[test]
    fn test_is_lead_surrogate() {
        assert!(!is_lead_surrogate(0xd7ff));
        assert!(is_lead_surrogate(0xd800));
        assert!(is_lead_surrogate(0xdbff));
        assert!(!is_lead_surrogate(0xdc00));
        assert!(!is_lead_surrogate(0x1d800));
    }
}
