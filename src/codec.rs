//! Compressed binary and base64 forms of a frozen trie.
//!
//! A serialized trie starts with a 16-byte prefix of little-endian `u32`s:
//!
//! | offset | field                                   |
//! |--------|-----------------------------------------|
//! | 0      | `high_start`                            |
//! | 4      | `error_value`                           |
//! | 8      | format version, always `0xFFFF_FFFF`    |
//! | 12     | length of the compressed flat array     |
//!
//! The gzip-compressed flat array, in little-endian `u32`s, follows the prefix.
//! The gzip-compressed JSON array of value labels takes the rest of the input,
//! and an empty rest means no labels.
//!
//! The version field sits where the older 12-byte prefix kept the compressed
//! length, which can never be `0xFFFF_FFFF`, so older inputs are detected.
use std::io::{Read, Write};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use flate2::{read::GzDecoder, write::GzEncoder, Compression};

use crate::errors::{Result, UtrieError};
use crate::trie::{validate, Trie};
use crate::utils::{le_bytes_to_u32s, pack_u32, u32s_to_le_bytes, unpack_u32};
use crate::values::ValueTable;

/// Version marker of the current format.
pub(crate) const CURRENT_VERSION: u32 = 0xffff_ffff;

/// Length of the fixed prefix.
pub(crate) const PREFIX_LENGTH: usize = 16;

fn compress(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(bytes)?;
    Ok(encoder.finish()?)
}

fn decompress(bytes: &[u8], what: &str) -> Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(bytes);
    let mut raw = vec![];
    decoder
        .read_to_end(&mut raw)
        .map_err(|e| UtrieError::format(format!("corrupt {}: {}", what, e)))?;
    Ok(raw)
}

impl Trie {
    /// Serializes the data structure into a compressed [`Vec`].
    ///
    /// # Errors
    ///
    /// [`UtrieError`] will be returned when the compressor fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use utrie::{Builder, Trie};
    ///
    /// let mut builder = Builder::new("XX", "YY");
    /// builder.set_range(0x3000, 0x30ff, "W", true)?;
    /// let trie = builder.freeze()?;
    ///
    /// let bytes = trie.serialize_to_vec()?;
    /// let other = Trie::deserialize_from_slice(&bytes)?;
    ///
    /// assert_eq!(trie.data(), other.data());
    /// assert_eq!(other.get_value(0x3000), utrie::Value::Label("W"));
    /// # Ok::<(), utrie::errors::UtrieError>(())
    /// ```
    pub fn serialize_to_vec(&self) -> Result<Vec<u8>> {
        let data = compress(&u32s_to_le_bytes(&self.data))?;
        let labels = serde_json::to_vec(self.values.labels()).map_err(std::io::Error::from)?;
        let values = compress(&labels)?;

        let mut bytes = Vec::with_capacity(PREFIX_LENGTH + data.len() + values.len());
        pack_u32(&mut bytes, self.high_start)?;
        pack_u32(&mut bytes, self.error_value)?;
        pack_u32(&mut bytes, CURRENT_VERSION)?;
        pack_u32(&mut bytes, data.len() as u32)?;
        bytes.extend_from_slice(&data);
        bytes.extend_from_slice(&values);

        tracing::trace!(
            entries = self.data.len(),
            data_bytes = data.len(),
            values_bytes = values.len(),
            "serialized trie"
        );
        Ok(bytes)
    }

    /// Deserializes the data structure from a slice produced by
    /// [`Trie::serialize_to_vec()`].
    ///
    /// # Errors
    ///
    /// [`UtrieError`] will be returned when
    ///
    /// - the input was written in an older format, or
    /// - the input is truncated or corrupt.
    pub fn deserialize_from_slice(source: &[u8]) -> Result<Self> {
        let header = |pos| {
            unpack_u32(source, pos).ok_or_else(|| {
                UtrieError::format(format!(
                    "Invalid input length: {} bytes, shorter than the {}-byte prefix",
                    source.len(),
                    PREFIX_LENGTH
                ))
            })
        };
        let high_start = header(0)?;
        let error_value = header(4)?;
        let version = header(8)?;
        if version != CURRENT_VERSION {
            return Err(UtrieError::version(version, CURRENT_VERSION));
        }
        let data_length = header(12)? as usize;

        let body = &source[PREFIX_LENGTH..];
        if data_length > body.len() {
            return Err(UtrieError::format(format!(
                "Invalid input length: {} bytes of compressed data declared, {} available",
                data_length,
                body.len()
            )));
        }
        let (data, values) = body.split_at(data_length);

        let data = le_bytes_to_u32s(&decompress(data, "trie data")?)
            .ok_or_else(|| UtrieError::format("trie data is not a sequence of 32-bit values"))?;
        let values: Vec<String> = if values.is_empty() {
            vec![]
        } else {
            serde_json::from_slice(&decompress(values, "value table")?)
                .map_err(|e| UtrieError::format(format!("invalid value table: {}", e)))?
        };
        validate(&data, high_start)?;

        tracing::trace!(
            entries = data.len(),
            values = values.len(),
            high_start = format_args!("{:#x}", high_start),
            "deserialized trie"
        );
        Ok(Self {
            data,
            high_start,
            error_value,
            values: ValueTable::new(values),
        })
    }

    /// Serializes the data structure into standard base64 text.
    ///
    /// # Errors
    ///
    /// [`UtrieError`] will be returned when the compressor fails.
    pub fn to_base64(&self) -> Result<String> {
        Ok(STANDARD.encode(self.serialize_to_vec()?))
    }

    /// Deserializes the data structure from base64 text. ASCII whitespace is
    /// ignored, so line-wrapped text is accepted.
    ///
    /// # Errors
    ///
    /// [`UtrieError`] will be returned when the text is not base64 or
    /// [`Trie::deserialize_from_slice()`] fails.
    pub fn from_base64(text: &str) -> Result<Self> {
        let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        let bytes = STANDARD
            .decode(compact)
            .map_err(|e| UtrieError::format(format!("invalid base64: {}", e)))?;
        Self::deserialize_from_slice(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{Builder, Value};

    // East Asian Width of Unicode 15.1, with N=0 and Y=1 for wide characters.
    const EAST_ASIAN_WIDTH: &str = r"AAAEAAAAAAD/////tQIAAB+LCAAC0uhlAgPtmj9IHzEUx8+fbam1FLoUCh1aaCl0cSoODgou
iougOAgu4iRO4iQiiDgoCoK4OYi66aabo5M4KKiToC7ioIPoIgjiN5qTeNz9LucvL8l57wcf
ksu/l7x7SV4uv+VSEKyCdbAJwucihUwy+wqsj2JwZLCtY3CWkHdRYdtX4FbG70F1dRB8AF/A
N/AD/Ab/QB0Q5f4jbJBxGzRLWW2WZHZATjhfu5V4lF7k7cp4P+KDsuxApM4wnkeVtHElPoW4
qCvis2VkMQxjlrj9mWEYhmEYhmHyxrw8Ry5YPKPrskLQJ37nDMMw9ih5uLcwDOP3/Wcl32mp
WJP3OBsIN2PWtfBeR0Xc2WyBHQ/Wwc+1T0x/ckNTkJ3Fj0EwV/XEKeI/a17mt+J5MpIWZRv5
NZAftuOCVg/kF3ptKfid6aHHfRP344//hSi4r3iiaaPnKHcJbjLa9EEOdHCXYAPBu/j095H0
WjyLcX5F+D2mjtDDL6SL8C/C8H8bdYjXy3SxZzfKuEqTTGtB2A66wLXS5x6lTqeUHT734Xkg
YQwhtxr2vweG0M6fmP5FfaARlBkDE2AGzKfIfws+YJ4RdrVUqnqGf/wr8k/MAJfo9tGVXkyX
NfGOknTjajWjHH/Wtinsj1JvVPVMjq9cW7pyytWn0IHar7iyWeZNUn0K+6G2yTSdpOnN9Hrm
Ul+25z+FzaTZti/7P5UsX/ydPPhbPvXBlU5MyjPRlm3btS3D5VzPy3nIRf9tjL/S9tLOPjb0
RpGvq2+dfIpx2/RpXM/71+g8qawPfn+S7Zn41kCxXvjwrYdC9mv8LVf7lYv57fM7dXmeoZRt
eu2n8hfz9C58PleZ3vts7tUuv/ln9Zd19l/dOWja93J5XnPh31Ptf76t8VTrsmn/3PSa8QCh
pJTR4EkAAB+LCAAC0uhlAgOLVvJT0lGKVIoFANHfAiwJAAAA";

    // The same table in the older format with a 12-byte prefix.
    const EAST_ASIAN_WIDTH_OLD: &str = r"AAAEAAAAAABQAgAAG99JMB6Jsa2CPeYryr2sfj99GygBKkJSf6IyVUDkyleXutZFVhEqYAoA
mJtrCtRv0ZrqSbitMeeLQiLoCh3hSuDeR5eMedj/slD10Y0R5iZ4+1ElV2MAzTz7ie96VxgM
BoNCIFAIDAKBQiFQGMxQI8EMpKCeSXI0syhuvoVSwY4LVLCPs8kIN7NFeMQnCP+GjwxUoAMj
WMEBrmOpccOHwuuBEDTEyKsphJvIPvu382JWAW5AzGWi59pyqq/JBkL7AAd6X0lutmWoXTK8
jsjwhoAZJtQw4MSUXienlP8GngeVYoXLhKPpn04ds0TKLcS+/L9zzLE4iZ7Sb4+w85UVDsyg
8c3APOBwzY6Po64NSwzM3jzeUfk3MNAepfJMo6KX2/yfptV2McXQ0c6pKaP7H0DHF9wCL2LA
VpoRrvPjw+JMsFaoUXSrAnX1xaZnLg2yNZtBrnpYAUeAA4EeR5pISE8+6yfznmtTJd4rBUSh
Ldz0MwSs1VWmteyH40rrGprQhSGL0EL41q07Vp3scFtX1QxMl6kCS6s6iRLFngIY4zQBuAm3
iesqIJrwHuAuIdQEG3mAAXfFAnIa/rPEfFOMA1xncd81oA89/JMZ3XP+FLBSKg3FUOLPLpUA
u53UYL1UHlPJOKMn20b8A2OVN5LoVDAfwnL8t/KhRIdlBmjyhnoCxO2HJTDqLN2BuIRqOWjz
3FoN8fSiXC6+0EnqSiK028ZajciD2V3UhLc0/o1FsII8qw3w1DgGjoNkBjrNMoxlu/GnvnVL
yNjUsU0v3smU+gsEgFsiTiIsIlkiXQM=";

    fn header(high_start: u32, error_value: u32, version: u32, length: u32) -> Vec<u8> {
        let mut bytes = vec![];
        for n in [high_start, error_value, version, length] {
            pack_u32(&mut bytes, n).unwrap();
        }
        bytes
    }

    #[test]
    fn test_prefix() {
        let mut builder = Builder::default();
        builder.set(0x4567, 99).unwrap();
        let bytes = builder.serialize_to_vec().unwrap();
        assert_eq!(
            &bytes[..12],
            &[0, 0x48, 0, 0, 0, 0, 0, 0, 0xff, 0xff, 0xff, 0xff]
        );
        assert_eq!(&bytes[16..18], &[0x1f, 0x8b]);
    }

    #[test]
    fn test_serialize_and_deserialize() {
        let mut builder = Builder::new("XX", "YY");
        builder
            .set_range(13, 6666, "ZZ", true)
            .unwrap()
            .set_range(0x20000, 0x2a6df, "WW", true)
            .unwrap()
            .set_lead_unit(0xd800, 7)
            .unwrap();
        let trie = builder.freeze().unwrap();

        let bytes = trie.serialize_to_vec().unwrap();
        let other = Trie::deserialize_from_slice(&bytes).unwrap();
        assert_eq!(trie.data(), other.data());
        assert_eq!(other.high_start(), trie.high_start());
        assert_eq!(other.error_value(), trie.error_value());
        assert_eq!(other.values(), &["XX", "YY", "ZZ", "WW"]);
        assert_eq!(other.get_value(12), Value::Label("XX"));
        assert_eq!(other.get_value(13), Value::Label("ZZ"));
        assert_eq!(other.get_value(0x2a6df), Value::Label("WW"));
        assert_eq!(other.get_value(0x110000), Value::Label("YY"));
        assert_eq!(other.get_lead_unit(0xd800), 7);
        assert_eq!(other.value_id("WW"), Some(3));
    }

    #[test]
    fn test_base64() {
        let mut builder = Builder::new(1, 0);
        builder.set_range(0x1100, 0x115f, 2, true).unwrap();
        let trie = builder.freeze().unwrap();

        let text = trie.to_base64().unwrap();
        let wrapped: String = text
            .as_bytes()
            .chunks(72)
            .map(|line| format!("{}\n", std::str::from_utf8(line).unwrap()))
            .collect();
        let other = Trie::from_base64(&wrapped).unwrap();
        assert_eq!(trie.data(), other.data());
        assert_eq!(other.get(0x1100), 2);
    }

    #[test]
    fn test_read_current_format() {
        let trie = Trie::from_base64(EAST_ASIAN_WIDTH).unwrap();
        assert_eq!(trie.high_start(), 0x40000);
        assert_eq!(trie.values(), &["N", "Y"]);
        assert_eq!(trie.get(0x3000), 1);
        assert_eq!(trie.get_value(0x3000), Value::Label("Y"));
        assert_eq!(trie.get(0x41), 0);
        assert_eq!(trie.get(0x20000), 1);
        assert_eq!(trie.get(0x10ffff), 0);
    }

    #[test]
    fn test_reject_old_format() {
        assert!(matches!(
            Trie::from_base64(EAST_ASIAN_WIDTH_OLD),
            Err(UtrieError::Version(_))
        ));
    }

    #[test]
    fn test_reject_overrun() {
        let bytes = header(0x4800, 0, CURRENT_VERSION, 0xffff_ffff);
        assert_eq!(
            bytes,
            [0, 72, 0, 0, 0, 0, 0, 0, 255, 255, 255, 255, 255, 255, 255, 255]
        );
        let e = Trie::deserialize_from_slice(&bytes).err().unwrap();
        assert!(matches!(e, UtrieError::Format(_)));
        assert!(e.to_string().contains("Invalid input length"));
    }

    #[test]
    fn test_reject_truncated_prefix() {
        let bytes = header(0x4800, 0, CURRENT_VERSION, 0);
        assert!(matches!(
            Trie::deserialize_from_slice(&bytes[..15]),
            Err(UtrieError::Format(_))
        ));
        assert!(matches!(
            Trie::deserialize_from_slice(&[]),
            Err(UtrieError::Format(_))
        ));
    }

    #[test]
    fn test_missing_values() {
        let trie = Builder::new(3, 4).freeze().unwrap();
        let bytes = trie.serialize_to_vec().unwrap();
        let length = unpack_u32(&bytes, 12).unwrap() as usize;
        let other = Trie::deserialize_from_slice(&bytes[..PREFIX_LENGTH + length]).unwrap();
        assert!(other.values().is_empty());
        assert_eq!(other.get(0x41), 3);
        assert_eq!(other.get(0x110000), 4);
    }

    #[test]
    fn test_reject_unaligned_data() {
        let payload = compress(&[0, 0, 0, 0, 0]).unwrap();
        let mut bytes = header(0, 0, CURRENT_VERSION, payload.len() as u32);
        bytes.extend_from_slice(&payload);
        assert!(matches!(
            Trie::deserialize_from_slice(&bytes),
            Err(UtrieError::Format(_))
        ));
    }

    #[test]
    fn test_reject_inconsistent_data() {
        let payload = compress(&u32s_to_le_bytes(&[0; 0x100])).unwrap();
        let mut bytes = header(0, 0, CURRENT_VERSION, payload.len() as u32);
        bytes.extend_from_slice(&payload);
        assert!(matches!(
            Trie::deserialize_from_slice(&bytes),
            Err(UtrieError::Format(_))
        ));
    }

    #[test]
    fn test_reject_corrupt_streams() {
        let mut bytes = header(0, 0, CURRENT_VERSION, 4);
        bytes.extend_from_slice(b"junk");
        assert!(matches!(
            Trie::deserialize_from_slice(&bytes),
            Err(UtrieError::Format(_))
        ));

        let trie = Builder::new(3, 4).freeze().unwrap();
        let mut bytes = trie.serialize_to_vec().unwrap();
        bytes.truncate(bytes.len() - 4);
        bytes.extend_from_slice(b"junk");
        assert!(matches!(
            Trie::deserialize_from_slice(&bytes),
            Err(UtrieError::Format(_))
        ));

        assert!(matches!(
            Trie::from_base64("not base64!"),
            Err(UtrieError::Format(_))
        ));
    }
}
