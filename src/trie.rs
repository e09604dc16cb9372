//! The frozen form of a trie, built by [`Builder::freeze()`](crate::Builder::freeze).
use crate::errors::{Result, UtrieError};
use crate::layout::*;
use crate::values::{Value, ValueTable};
use crate::Statistics;

/// An immutable two-stage trie for fast lookups of code point values.
///
/// The indexes and the data live in a single flat array:
///
/// - index-2 entries for the BMP, shifted right by 2, at `0x0..0x800`,
/// - index-2 entries for lead surrogate code points at `0x800..0x820`,
/// - index-2 entries for 2-byte UTF-8 at `0x820..0x840`,
/// - index-1 entries for supplementary code points below `high_start`,
/// - compacted supplementary index-2 blocks,
/// - the data blocks, where the value of every code point at or above
///   `high_start` is the fourth entry from the end.
///
/// # Examples
///
/// ```
/// use utrie::{Builder, Value};
///
/// let mut builder = Builder::new("XX", "ER");
/// builder.set_range(13, 6666, "ZZ", true)?;
/// let trie = builder.freeze()?;
///
/// assert_eq!(trie.get_value(12), Value::Label("XX"));
/// assert_eq!(trie.get_value(13), Value::Label("ZZ"));
/// assert_eq!(trie.get_value(0x110000), Value::Label("ER"));
/// # Ok::<(), utrie::errors::UtrieError>(())
/// ```
pub struct Trie {
    pub(crate) data: Vec<u32>,
    pub(crate) high_start: u32,
    pub(crate) error_value: u32,
    pub(crate) values: ValueTable,
}

impl Trie {
    pub(crate) fn from_parts(
        data: Vec<u32>,
        high_start: u32,
        error_value: u32,
        values: ValueTable,
    ) -> Self {
        debug_assert!(validate(&data, high_start).is_ok());
        Self {
            data,
            high_start,
            error_value,
            values,
        }
    }

    /// Creates a [`Trie`] from the flat array produced by [`Trie::data()`].
    ///
    /// # Arguments
    ///
    /// - `data`: Flat array of the indexes followed by the data blocks.
    /// - `high_start`: Start of the range of code points with a common value.
    /// - `error_value`: Value of out-of-range inputs.
    /// - `values`: Labels, where `values[i]` is reported for the stored value `i`.
    ///
    /// # Errors
    ///
    /// [`UtrieError`] will be returned when `high_start` is not a multiple of
    /// 0x800 up to 0x110000, or some index entry reachable by a lookup points
    /// outside `data`.
    pub fn from_raw_parts(
        data: Vec<u32>,
        high_start: u32,
        error_value: u32,
        values: Vec<String>,
    ) -> Result<Self> {
        validate(&data, high_start)?;
        Ok(Self {
            data,
            high_start,
            error_value,
            values: ValueTable::new(values),
        })
    }

    /// Returns the value of a code point, or the error value if `c` is greater
    /// than U+10FFFF.
    ///
    /// Lead surrogates are looked up as code points; use
    /// [`Trie::get_lead_unit()`] for the values of UTF-16 code units.
    #[inline(always)]
    pub fn get(&self, c: u32) -> u32 {
        if c < 0xd800 || (0xdc00..=0xffff).contains(&c) {
            // BMP, one index lookup
            let block = self.data[(c >> SHIFT_2) as usize] << INDEX_SHIFT;
            self.data[(block + (c & DATA_MASK)) as usize]
        } else if c <= 0xffff {
            // Lead surrogate code point, with its own index section
            let i2 = LSCP_INDEX_2_OFFSET + ((c - 0xd800) >> SHIFT_2) as usize;
            let block = self.data[i2] << INDEX_SHIFT;
            self.data[(block + (c & DATA_MASK)) as usize]
        } else if c < self.high_start {
            // Supplementary, two index lookups
            let i1 = self.data[INDEX_1_OFFSET - OMITTED_BMP_INDEX_1_LENGTH + (c >> SHIFT_1) as usize];
            let block = self.data[(i1 + ((c >> SHIFT_2) & INDEX_2_MASK)) as usize] << INDEX_SHIFT;
            self.data[(block + (c & DATA_MASK)) as usize]
        } else if c <= MAX_CODE_POINT {
            self.high_value()
        } else {
            self.error_value
        }
    }

    /// Returns the value of a lead surrogate as a UTF-16 code unit, or the error
    /// value if `unit` is not in U+D800..U+DBFF.
    ///
    /// # Examples
    ///
    /// ```
    /// use utrie::Builder;
    ///
    /// let mut builder = Builder::new(0, 9);
    /// builder.set(0xd800, 1)?.set_lead_unit(0xd800, 2)?;
    /// let trie = builder.freeze()?;
    ///
    /// assert_eq!(trie.get(0xd800), 1);
    /// assert_eq!(trie.get_lead_unit(0xd800), 2);
    /// assert_eq!(trie.get_lead_unit(0xdc00), 9);
    /// # Ok::<(), utrie::errors::UtrieError>(())
    /// ```
    #[inline(always)]
    pub fn get_lead_unit(&self, unit: u32) -> u32 {
        if !is_lead_surrogate(unit) {
            return self.error_value;
        }
        let block = self.data[(unit >> SHIFT_2) as usize] << INDEX_SHIFT;
        self.data[(block + (unit & DATA_MASK)) as usize]
    }

    /// Returns the value of a code point, mapped back to its label if it has one.
    #[inline]
    pub fn get_value(&self, c: u32) -> Value {
        self.values.resolve(self.get(c))
    }

    /// Returns the value stored for `label`, if any.
    #[inline]
    pub fn value_id(&self, label: &str) -> Option<u32> {
        self.values.id(label)
    }

    /// Returns the labels, where the index of each label is its value.
    #[inline]
    pub fn values(&self) -> &[String] {
        self.values.labels()
    }

    /// Returns the flat array of indexes and data.
    #[inline]
    pub fn data(&self) -> &[u32] {
        &self.data
    }

    /// Returns the start of the range of code points that share the last value.
    #[inline]
    pub const fn high_start(&self) -> u32 {
        self.high_start
    }

    /// Returns the value of out-of-range inputs.
    #[inline]
    pub const fn error_value(&self) -> u32 {
        self.error_value
    }

    /// Returns the value of every code point at or above [`Trie::high_start()`].
    #[inline(always)]
    pub fn high_value(&self) -> u32 {
        self.data[self.data.len() - DATA_GRANULARITY]
    }
}

impl Statistics for Trie {
    fn heap_bytes(&self) -> usize {
        self.data.len() * std::mem::size_of::<u32>() + self.values.heap_bytes()
    }

    fn num_elems(&self) -> usize {
        self.data.len()
    }
}

/// Checks that every entry reachable by a lookup stays inside `data`.
pub(crate) fn validate(data: &[u32], high_start: u32) -> Result<()> {
    if high_start > CODE_POINT_LIMIT || high_start % CP_PER_INDEX_1_ENTRY != 0 {
        return Err(UtrieError::format(format!(
            "high start {:#x} is not a multiple of {:#x} up to 0x110000",
            high_start, CP_PER_INDEX_1_ENTRY
        )));
    }
    if data.len() < INDEX_1_OFFSET + DATA_GRANULARITY {
        return Err(UtrieError::format(format!(
            "{} entries are too few to hold the BMP indexes",
            data.len()
        )));
    }

    let len = data.len();
    let check_block = |i2: usize| -> Result<()> {
        let block = (data[i2] as usize) << INDEX_SHIFT;
        if block + DATA_BLOCK_LENGTH > len {
            return Err(UtrieError::format(format!(
                "index-2 entry {:#x} points past the end of the data",
                i2
            )));
        }
        Ok(())
    };

    // BMP code points and code units, then lead surrogate code points
    (0..INDEX_2_BMP_LENGTH).try_for_each(check_block)?;

    for c in (0x10000..high_start).step_by(CP_PER_INDEX_1_ENTRY as usize) {
        let i1 = INDEX_1_OFFSET - OMITTED_BMP_INDEX_1_LENGTH + (c >> SHIFT_1) as usize;
        if i1 >= len {
            return Err(UtrieError::format("index-1 table is truncated"));
        }
        let i2_block = data[i1] as usize;
        if i2_block + INDEX_2_BLOCK_LENGTH > len {
            return Err(UtrieError::format(format!(
                "index-1 entry {:#x} points past the end of the data",
                i1
            )));
        }
        (i2_block..i2_block + INDEX_2_BLOCK_LENGTH).try_for_each(check_block)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::Builder;

    #[test]
    fn test_get() {
        let mut builder = Builder::new(10, 666);
        builder.set(0x4567, 99).unwrap();
        let trie = builder.freeze().unwrap();
        assert_eq!(trie.get(0x4566), 10);
        assert_eq!(trie.get(0x4567), 99);
        assert_eq!(trie.get(0x110000), 666);
        assert_eq!(trie.get(u32::MAX), 666);
        assert_eq!(trie.high_start(), 0x4800);
        assert_eq!(trie.high_value(), 10);
    }

    #[test]
    fn test_get_supplementary() {
        let mut builder = Builder::new(0, 0xbad);
        builder
            .set_range(0x1f300, 0x1f5ff, 3, true)
            .unwrap()
            .set(0x1f400, 4)
            .unwrap()
            .set_range(0xe0000, 0x10ffff, 5, true)
            .unwrap();
        let trie = builder.freeze().unwrap();
        assert_eq!(trie.high_start(), 0xe0000);
        assert_eq!(trie.get(0x1f2ff), 0);
        assert_eq!(trie.get(0x1f300), 3);
        assert_eq!(trie.get(0x1f400), 4);
        assert_eq!(trie.get(0x1f5ff), 3);
        assert_eq!(trie.get(0x1f600), 0);
        assert_eq!(trie.get(0xdffff), 0);
        assert_eq!(trie.get(0xe0000), 5);
        assert_eq!(trie.get(0x10ffff), 5);
        assert_eq!(trie.get(0x110000), 0xbad);
    }

    #[test]
    fn test_get_lead_unit() {
        let mut builder = Builder::new(0, 0xbad);
        builder.set_lead_unit(0xdbff, 3).unwrap();
        let trie = builder.freeze().unwrap();
        assert_eq!(trie.get_lead_unit(0xdbff), 3);
        assert_eq!(trie.get(0xdbff), 0);
        assert_eq!(trie.get_lead_unit(0xd7ff), 0xbad);
    }

    #[test]
    fn test_labels() {
        let mut builder = Builder::new("XX", "YY");
        builder.set_range(13, 6666, "ZZ", true).unwrap();
        let trie = builder.freeze().unwrap();
        assert_eq!(trie.get_value(12), Value::Label("XX"));
        assert_eq!(trie.get_value(13), Value::Label("ZZ"));
        assert_eq!(trie.get_value(0x110000), Value::Label("YY"));
        assert_eq!(trie.value_id("ZZ"), Some(2));
        assert_eq!(trie.values(), &["XX", "YY", "ZZ"]);
    }

    #[test]
    fn test_unlabelled_values() {
        let mut builder = Builder::new("XX", "YY");
        builder.set(0x41, 7).unwrap();
        let trie = builder.freeze().unwrap();
        assert_eq!(trie.get_value(0x41), Value::Int(7));
        assert_eq!(trie.get_value(0x40), Value::Label("XX"));
    }

    #[test]
    fn test_from_raw_parts() {
        let mut builder = Builder::new(1, 2);
        builder.set_range(0x10000, 0x1ffff, 3, true).unwrap();
        let trie = builder.freeze().unwrap();

        let other = Trie::from_raw_parts(
            trie.data().to_vec(),
            trie.high_start(),
            trie.error_value(),
            vec![],
        )
        .unwrap();
        for c in (0..0x110000).step_by(0x101) {
            assert_eq!(trie.get(c), other.get(c));
        }
    }

    #[test]
    fn test_from_raw_parts_errors() {
        let trie = Builder::new(1, 2).freeze().unwrap();
        let data = trie.data().to_vec();

        assert!(matches!(
            Trie::from_raw_parts(data.clone(), 0x801, 2, vec![]),
            Err(UtrieError::Format(_))
        ));
        assert!(matches!(
            Trie::from_raw_parts(data.clone(), 0x110800, 2, vec![]),
            Err(UtrieError::Format(_))
        ));
        assert!(matches!(
            Trie::from_raw_parts(data[..0x800].to_vec(), 0, 2, vec![]),
            Err(UtrieError::Format(_))
        ));

        // The supplementary index-1 table is not there.
        assert!(matches!(
            Trie::from_raw_parts(data.clone(), 0x110000, 2, vec![]),
            Err(UtrieError::Format(_))
        ));

        let mut broken = data;
        broken[0x100] = 0xffff;
        assert!(matches!(
            Trie::from_raw_parts(broken, 0, 2, vec![]),
            Err(UtrieError::Format(_))
        ));
    }

    #[test]
    fn test_statistics() {
        let trie = Builder::new(0, 0).freeze().unwrap();
        assert_eq!(trie.num_elems(), trie.data().len());
        assert!(trie.heap_bytes() >= trie.num_elems() * 4);
    }
}
