//! Writer that counts and optionally hashes what passes through it.

use std::io::Write;

use crate::integrity::IntegrityDigest;
use crate::integrity::IntegrityHasher;

/// Wraps a writer, counting bytes and optionally feeding an
/// [`IntegrityHasher`].
///
/// Only bytes the inner writer accepted are counted and hashed, so a short
/// write never skews the digest.
///
/// # Examples
///
/// ```
/// use archivit_core::io::DigestWriter;
/// use std::io::Write;
///
/// let mut writer = DigestWriter::hashing(Vec::new());
/// writer.write_all(b"Hello, ")?;
/// writer.write_all(b"World!")?;
/// assert_eq!(writer.total_bytes(), 13);
///
/// let (buffer, digest) = writer.into_parts();
/// assert_eq!(buffer, b"Hello, World!");
/// assert_eq!(digest.map(|d| d.len), Some(13));
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct DigestWriter<W> {
    inner: W,
    hasher: Option<IntegrityHasher>,
    bytes_written: u64,
    limit: Option<u64>,
}

impl<W> DigestWriter<W> {
    /// Creates a writer that only counts.
    #[must_use]
    pub const fn counting(inner: W) -> Self {
        Self {
            inner,
            hasher: None,
            bytes_written: 0,
            limit: None,
        }
    }

    /// Creates a writer that counts and hashes.
    #[must_use]
    pub fn hashing(inner: W) -> Self {
        Self {
            inner,
            hasher: Some(IntegrityHasher::new()),
            bytes_written: 0,
            limit: None,
        }
    }

    /// Fails any write that would take the total past `limit` bytes.
    ///
    /// Used to stop a decompressor that inflates beyond the declared size.
    #[must_use]
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Bytes accepted by the inner writer so far.
    #[must_use]
    pub const fn total_bytes(&self) -> u64 {
        self.bytes_written
    }

    /// Returns the inner writer and the digest, if hashing.
    #[must_use]
    pub fn into_parts(self) -> (W, Option<IntegrityDigest>) {
        (self.inner, self.hasher.map(IntegrityHasher::finalize))
    }
}

impl<W: Write> Write for DigestWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Some(limit) = self.limit
            && self.bytes_written + buf.len() as u64 > limit
        {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("output exceeds the declared {limit} bytes"),
            ));
        }
        let written = self.inner.write(buf)?;
        if let Some(hasher) = self.hasher.as_mut() {
            hasher.update(&buf[..written]);
        }
        self.bytes_written += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::integrity;

    #[test]
    fn test_counting_only() {
        let mut writer = DigestWriter::counting(Vec::new());
        writer.write_all(b"Hello").unwrap();
        write!(writer, ", {}!", "World").unwrap();
        assert_eq!(writer.total_bytes(), 13);

        let (buffer, digest) = writer.into_parts();
        assert_eq!(buffer, b"Hello, World!");
        assert!(digest.is_none());
    }

    #[test]
    fn test_hashing_matches_one_shot() {
        let data = vec![42u8; 10_000];
        let mut writer = DigestWriter::hashing(std::io::sink());
        for chunk in data.chunks(333) {
            writer.write_all(chunk).unwrap();
        }

        let (_, digest) = writer.into_parts();
        let digest = digest.unwrap();
        assert_eq!(digest.hash, integrity::hash(&data));
        assert_eq!(digest.checksum, integrity::checksum(&data));
        assert_eq!(digest.len, 10_000);
    }

    #[test]
    fn test_partial_write_hashes_accepted_bytes_only() {
        struct LimitedWriter {
            inner: Vec<u8>,
            max_write: usize,
        }

        impl Write for LimitedWriter {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                let n = buf.len().min(self.max_write);
                self.inner.extend_from_slice(&buf[..n]);
                Ok(n)
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut writer = DigestWriter::hashing(LimitedWriter {
            inner: Vec::new(),
            max_write: 3,
        });
        assert_eq!(writer.write(b"hello").unwrap(), 3);
        assert_eq!(writer.total_bytes(), 3);

        let (inner, digest) = writer.into_parts();
        assert_eq!(inner.inner, b"hel");
        assert_eq!(digest.unwrap().hash, integrity::hash(b"hel"));
    }

    #[test]
    fn test_limit_rejects_overflow() {
        let mut writer = DigestWriter::counting(Vec::new()).with_limit(8);
        writer.write_all(b"12345678").unwrap();

        let err = writer.write_all(b"9").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
        assert_eq!(writer.total_bytes(), 8);
    }
}
