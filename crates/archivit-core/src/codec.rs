//! Primitive encoding shared by every container structure.
//!
//! All integers are big-endian. Booleans occupy one byte, `1` meaning true.
//! Variable-length values carry a signed length prefix whose width is chosen
//! by the caller, see [`LengthPrefix`].
//!
//! Every function works on a caller-provided reader or writer and keeps its
//! buffers local to the call.

use std::io::Read;
use std::io::Write;

use crate::ArchiveError;
use crate::Result;

/// Width of a length prefix in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LengthPrefix {
    /// Signed 16-bit prefix, used for names, paths and integrity metadata.
    Short,
    /// Signed 32-bit prefix.
    Int,
    /// Signed 64-bit prefix, used for metadata frames and ciphertext chunks.
    Long,
}

impl LengthPrefix {
    /// Number of bytes the prefix occupies.
    #[must_use]
    pub const fn width(self) -> usize {
        match self {
            Self::Short => 2,
            Self::Int => 4,
            Self::Long => 8,
        }
    }

    /// Largest length the prefix can declare.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub const fn max_len(self) -> u64 {
        match self {
            Self::Short => i16::MAX as u64,
            Self::Int => i32::MAX as u64,
            Self::Long => i64::MAX as u64,
        }
    }
}

/// Writes a single-byte boolean.
pub fn write_bool<W: Write>(writer: &mut W, value: bool) -> Result<()> {
    writer.write_all(&[u8::from(value)])?;
    Ok(())
}

/// Reads a single-byte boolean. Only `1` decodes as `true`.
pub fn read_bool<R: Read>(reader: &mut R) -> Result<bool> {
    Ok(read_u8(reader)? == 1)
}

/// Writes one raw byte.
pub fn write_u8<W: Write>(writer: &mut W, value: u8) -> Result<()> {
    writer.write_all(&[value])?;
    Ok(())
}

/// Reads one raw byte.
pub fn read_u8<R: Read>(reader: &mut R) -> Result<u8> {
    let [byte] = read_array::<_, 1>(reader)?;
    Ok(byte)
}

/// Writes a big-endian `i64`.
pub fn write_i64<W: Write>(writer: &mut W, value: i64) -> Result<()> {
    writer.write_all(&value.to_be_bytes())?;
    Ok(())
}

/// Reads a big-endian `i64`.
pub fn read_i64<R: Read>(reader: &mut R) -> Result<i64> {
    Ok(i64::from_be_bytes(read_array(reader)?))
}

/// Reads exactly `N` bytes.
///
/// Hitting end of input first is reported as a format error.
pub fn read_array<R: Read, const N: usize>(reader: &mut R) -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    reader.read_exact(&mut buf).map_err(ArchiveError::from_read)?;
    Ok(buf)
}

/// Writes a length prefix of the given width.
///
/// # Errors
///
/// Returns [`ArchiveError::SegmentTooLarge`] if `len` exceeds the prefix's
/// positive range.
pub fn write_len<W: Write>(writer: &mut W, prefix: LengthPrefix, len: usize) -> Result<()> {
    let len = len as u64;
    if len > prefix.max_len() {
        return Err(ArchiveError::SegmentTooLarge {
            len,
            max: prefix.max_len(),
        });
    }

    // Within the positive range the low bytes equal the signed encoding.
    let bytes = len.to_be_bytes();
    writer.write_all(&bytes[bytes.len() - prefix.width()..])?;
    Ok(())
}

/// Reads a length prefix of the given width.
///
/// # Errors
///
/// A negative declared length is a format error.
pub fn read_len<R: Read>(reader: &mut R, prefix: LengthPrefix) -> Result<u64> {
    let raw = match prefix {
        LengthPrefix::Short => i64::from(i16::from_be_bytes(read_array(reader)?)),
        LengthPrefix::Int => i64::from(i32::from_be_bytes(read_array(reader)?)),
        LengthPrefix::Long => i64::from_be_bytes(read_array(reader)?),
    };

    u64::try_from(raw)
        .map_err(|_| ArchiveError::InvalidArchive(format!("negative segment length: {raw}")))
}

/// Writes a length-prefixed byte block.
pub fn write_bytes<W: Write>(writer: &mut W, prefix: LengthPrefix, data: &[u8]) -> Result<()> {
    write_len(writer, prefix, data.len())?;
    writer.write_all(data)?;
    Ok(())
}

/// Reads a length-prefixed byte block of at most `limit` bytes.
///
/// # Errors
///
/// Returns a format error if the prefix is negative, declares more than
/// `limit` bytes, or the input ends early.
pub fn read_bytes<R: Read>(reader: &mut R, prefix: LengthPrefix, limit: u64) -> Result<Vec<u8>> {
    let len = read_len(reader, prefix)?;
    if len > limit {
        return Err(ArchiveError::InvalidArchive(format!(
            "segment length {len} exceeds limit {limit}"
        )));
    }

    let len = usize::try_from(len)
        .map_err(|_| ArchiveError::InvalidArchive(format!("segment length {len} too large")))?;
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).map_err(ArchiveError::from_read)?;
    Ok(buf)
}

/// Writes a length-prefixed UTF-8 string.
pub fn write_string<W: Write>(writer: &mut W, prefix: LengthPrefix, value: &str) -> Result<()> {
    write_bytes(writer, prefix, value.as_bytes())
}

/// Reads a length-prefixed UTF-8 string.
pub fn read_string<R: Read>(reader: &mut R, prefix: LengthPrefix, limit: u64) -> Result<String> {
    let bytes = read_bytes(reader, prefix, limit)?;
    String::from_utf8(bytes)
        .map_err(|e| ArchiveError::InvalidArchive(format!("string is not valid UTF-8: {e}")))
}

/// Discards exactly `count` bytes from `reader`.
///
/// # Errors
///
/// Returns a format error if the input ends before `count` bytes were
/// consumed.
pub fn skip_exact<R: Read>(reader: &mut R, count: u64) -> Result<()> {
    let skipped = std::io::copy(&mut reader.take(count), &mut std::io::sink())?;
    if skipped != count {
        return Err(ArchiveError::InvalidArchive(
            "unexpected end of archive".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_bool_encoding() {
        let mut buf = Vec::new();
        write_bool(&mut buf, true).unwrap();
        write_bool(&mut buf, false).unwrap();
        assert_eq!(buf, [1, 0]);

        let mut cursor = Cursor::new(vec![1, 0, 7]);
        assert!(read_bool(&mut cursor).unwrap());
        assert!(!read_bool(&mut cursor).unwrap());
        assert!(!read_bool(&mut cursor).unwrap(), "only 1 is true");
    }

    #[test]
    fn test_i64_big_endian() {
        let mut buf = Vec::new();
        write_i64(&mut buf, 0x0102_0304_0506_0708).unwrap();
        assert_eq!(buf, [1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(
            read_i64(&mut Cursor::new(buf)).unwrap(),
            0x0102_0304_0506_0708
        );
    }

    #[test]
    fn test_prefix_widths() {
        for (prefix, width) in [
            (LengthPrefix::Short, 2),
            (LengthPrefix::Int, 4),
            (LengthPrefix::Long, 8),
        ] {
            let mut buf = Vec::new();
            write_string(&mut buf, prefix, "abc").unwrap();
            assert_eq!(buf.len(), width + 3);
            assert_eq!(prefix.width(), width);
        }
    }

    #[test]
    fn test_short_prefix_layout() {
        let mut buf = Vec::new();
        write_string(&mut buf, LengthPrefix::Short, "hi").unwrap();
        assert_eq!(buf, [0, 2, b'h', b'i']);
    }

    #[test]
    fn test_write_len_rejects_overflow() {
        let mut buf = Vec::new();
        let result = write_len(&mut buf, LengthPrefix::Short, 40_000);
        assert!(matches!(
            result,
            Err(ArchiveError::SegmentTooLarge {
                len: 40_000,
                max: 32_767
            })
        ));
        assert!(buf.is_empty(), "nothing is written on overflow");
    }

    #[test]
    fn test_negative_length_is_format_error() {
        let mut cursor = Cursor::new((-1i16).to_be_bytes().to_vec());
        let result = read_bytes(&mut cursor, LengthPrefix::Short, 100);
        assert!(matches!(result, Err(ArchiveError::InvalidArchive(_))));

        let mut cursor = Cursor::new((-5i64).to_be_bytes().to_vec());
        let result = read_len(&mut cursor, LengthPrefix::Long);
        assert!(matches!(result, Err(ArchiveError::InvalidArchive(_))));
    }

    #[test]
    fn test_length_above_limit_rejected() {
        let mut buf = Vec::new();
        write_bytes(&mut buf, LengthPrefix::Long, &[0u8; 64]).unwrap();
        let result = read_bytes(&mut Cursor::new(buf), LengthPrefix::Long, 32);
        assert!(matches!(result, Err(ArchiveError::InvalidArchive(_))));
    }

    #[test]
    fn test_truncated_value_is_format_error() {
        let mut buf = Vec::new();
        write_bytes(&mut buf, LengthPrefix::Int, b"hello").unwrap();
        buf.truncate(6);
        let result = read_bytes(&mut Cursor::new(buf), LengthPrefix::Int, 100);
        assert!(matches!(result, Err(ArchiveError::InvalidArchive(_))));
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        let mut buf = Vec::new();
        write_bytes(&mut buf, LengthPrefix::Short, &[0xff, 0xfe]).unwrap();
        let result = read_string(&mut Cursor::new(buf), LengthPrefix::Short, 100);
        assert!(matches!(result, Err(ArchiveError::InvalidArchive(_))));
    }

    #[test]
    fn test_skip_exact() {
        let mut cursor = Cursor::new(vec![1, 2, 3, 4, 5]);
        skip_exact(&mut cursor, 3).unwrap();
        assert_eq!(read_u8(&mut cursor).unwrap(), 4);

        let result = skip_exact(&mut cursor, 10);
        assert!(matches!(result, Err(ArchiveError::InvalidArchive(_))));
    }
}
