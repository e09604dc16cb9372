use std::io;

/// Writes `n` in little-endian order.
#[inline]
pub fn pack_u32<W: io::Write>(mut wtr: W, n: u32) -> io::Result<()> {
    wtr.write_all(&n.to_le_bytes())
}

/// Reads a little-endian `u32` at `pos`, if `slice` is long enough.
#[inline]
pub fn unpack_u32(slice: &[u8], pos: usize) -> Option<u32> {
    let bytes = slice.get(pos..pos + 4)?;
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    Some(u32::from_le_bytes(buf))
}

/// Flattens `values` into little-endian bytes.
pub fn u32s_to_le_bytes(values: &[u32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(values.len() * 4);
    for &v in values {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Reads little-endian `u32`s, or returns `None` if the length is not a multiple of 4.
pub fn le_bytes_to_u32s(bytes: &[u8]) -> Option<Vec<u32>> {
    if bytes.len() % 4 != 0 {
        return None;
    }
    Some(
        bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_unpack() {
        let mut buf = vec![];
        pack_u32(&mut buf, 0x4800).unwrap();
        pack_u32(&mut buf, 0xffff_ffff).unwrap();
        assert_eq!(buf, [0, 0x48, 0, 0, 0xff, 0xff, 0xff, 0xff]);
        assert_eq!(unpack_u32(&buf, 0), Some(0x4800));
        assert_eq!(unpack_u32(&buf, 4), Some(0xffff_ffff));
        assert_eq!(unpack_u32(&buf, 5), None);
    }

    #[test]
    fn test_le_bytes() {
        let bytes = u32s_to_le_bytes(&[1, 0x0102_0304]);
        assert_eq!(bytes, [1, 0, 0, 0, 4, 3, 2, 1]);
        assert_eq!(le_bytes_to_u32s(&bytes), Some(vec![1, 0x0102_0304]));
        assert_eq!(le_bytes_to_u32s(&bytes[..7]), None);
    }
}
