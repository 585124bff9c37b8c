//! Hashing, checksums and DEFLATE compression for entry payloads.
//!
//! Integrity metadata is always computed over the *stored* bytes: the
//! payload after optional compression and before optional encryption.

use std::io::Read;
use std::io::Write;

use crc32fast::Hasher as Crc32;
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use sha2::Digest;
use sha2::Sha256;

use crate::ArchiveError;
use crate::Result;

/// Length of a SHA-256 digest.
pub const HASH_LEN: usize = 32;

/// Encoded size of [`IntegrityMetadata`].
pub const INTEGRITY_METADATA_LEN: usize = HASH_LEN + 4 + 1 + 4 + 4;

/// Bytes sampled by [`should_compress`].
const SAMPLE_LEN: usize = 100;

/// Computes the SHA-256 digest of `data`.
#[must_use]
pub fn hash(data: &[u8]) -> [u8; HASH_LEN] {
    Sha256::digest(data).into()
}

/// Computes the CRC-32 (IEEE) checksum of `data`.
#[must_use]
pub fn checksum(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

/// Cheap guess at whether `data` is worth compressing.
///
/// Inputs under 100 bytes are never compressed. Otherwise the first 100
/// bytes are sampled and compression is attempted only when more than half
/// of them equal the first byte.
///
/// # Examples
///
/// ```
/// use archivit_core::integrity::should_compress;
///
/// assert!(should_compress(&[b'a'; 10_000]));
/// assert!(!should_compress(&[b'a'; 99]));
/// ```
#[must_use]
pub fn should_compress(data: &[u8]) -> bool {
    if data.len() < SAMPLE_LEN {
        return false;
    }

    let first = data[0];
    let same = data[..SAMPLE_LEN].iter().filter(|&&b| b == first).count();
    same > SAMPLE_LEN / 2
}

/// Compresses `data` with zlib-framed DEFLATE.
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Compresses `data` if the heuristic agrees and the result is worth keeping.
///
/// Returns `None` when the entry should be stored as-is, which happens when
/// [`should_compress`] declines or the compressed form is not smaller than
/// 90% of the original.
pub fn compress_if_smaller(data: &[u8]) -> Result<Option<Vec<u8>>> {
    if !should_compress(data) {
        return Ok(None);
    }

    let compressed = compress(data)?;
    // compressed < 0.9 * original, kept in integer arithmetic
    if (compressed.len() as u128) * 10 < (data.len() as u128) * 9 {
        Ok(Some(compressed))
    } else {
        Ok(None)
    }
}

/// Inflates zlib-framed DEFLATE data.
///
/// # Errors
///
/// Returns a format error if the stream is corrupt or does not inflate to
/// exactly `expected_len` bytes.
pub fn decompress(data: &[u8], expected_len: u64) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    ZlibDecoder::new(data)
        .take(expected_len.saturating_add(1))
        .read_to_end(&mut out)
        .map_err(|e| ArchiveError::InvalidArchive(format!("corrupt compressed data: {e}")))?;

    if out.len() as u64 != expected_len {
        return Err(ArchiveError::InvalidArchive(format!(
            "decompressed {} bytes, expected {expected_len}",
            out.len()
        )));
    }
    Ok(out)
}

/// Result of hashing a byte stream with [`IntegrityHasher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegrityDigest {
    /// SHA-256 of the stream.
    pub hash: [u8; HASH_LEN],
    /// CRC-32 of the stream.
    pub checksum: u32,
    /// Number of bytes hashed.
    pub len: u64,
}

/// Incremental SHA-256 + CRC-32 over a byte stream.
#[derive(Clone, Default)]
pub struct IntegrityHasher {
    sha: Sha256,
    crc: Crc32,
    len: u64,
}

impl IntegrityHasher {
    /// Creates an empty hasher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds `data` into both digests.
    pub fn update(&mut self, data: &[u8]) {
        self.sha.update(data);
        self.crc.update(data);
        self.len += data.len() as u64;
    }

    /// Finishes hashing.
    #[must_use]
    pub fn finalize(self) -> IntegrityDigest {
        IntegrityDigest {
            hash: self.sha.finalize().into(),
            checksum: self.crc.finalize(),
            len: self.len,
        }
    }
}

/// Per-entry integrity record.
///
/// Encoded as `hash[32] ‖ crc32:u32 ‖ compressed:u8 ‖ original:i32 ‖
/// stored:i32`, all big-endian, 45 bytes in total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegrityMetadata {
    /// SHA-256 of the stored bytes.
    pub hash: [u8; HASH_LEN],
    /// CRC-32 of the stored bytes.
    pub checksum: u32,
    /// Whether the stored bytes are compressed.
    pub compressed: bool,
    /// Length of the original content.
    pub original_size: u64,
    /// Length of the stored bytes.
    pub stored_size: u64,
}

impl IntegrityMetadata {
    /// Computes metadata for `stored` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::SegmentTooLarge`] if either size does not fit
    /// the 32-bit size fields.
    pub fn compute(stored: &[u8], original_size: u64, compressed: bool) -> Result<Self> {
        let mut hasher = IntegrityHasher::new();
        hasher.update(stored);
        Self::from_digest(&hasher.finalize(), original_size, compressed)
    }

    /// Builds metadata from an already computed digest.
    pub fn from_digest(
        digest: &IntegrityDigest,
        original_size: u64,
        compressed: bool,
    ) -> Result<Self> {
        let max = i32::MAX as u64;
        for len in [original_size, digest.len] {
            if len > max {
                return Err(ArchiveError::SegmentTooLarge { len, max });
            }
        }

        Ok(Self {
            hash: digest.hash,
            checksum: digest.checksum,
            compressed,
            original_size,
            stored_size: digest.len,
        })
    }

    /// Length the stored payload must have.
    #[must_use]
    pub const fn expected_len(&self) -> u64 {
        if self.compressed {
            self.stored_size
        } else {
            self.original_size
        }
    }

    /// Checks `data` against the recorded length, hash and checksum.
    #[must_use]
    pub fn verify(&self, data: &[u8]) -> bool {
        let mut hasher = IntegrityHasher::new();
        hasher.update(data);
        self.matches(&hasher.finalize())
    }

    /// Checks a streamed digest against the recorded length, hash and
    /// checksum.
    #[must_use]
    pub fn matches(&self, digest: &IntegrityDigest) -> bool {
        digest.len == self.expected_len()
            && digest.hash == self.hash
            && digest.checksum == self.checksum
    }

    /// Encodes the 45-byte record.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::SegmentTooLarge`] if a size was changed to
    /// a value the 32-bit size fields cannot hold.
    pub fn encode(&self) -> Result<[u8; INTEGRITY_METADATA_LEN]> {
        let size_field = |len: u64| {
            i32::try_from(len).map_err(|_| ArchiveError::SegmentTooLarge {
                len,
                max: i32::MAX as u64,
            })
        };

        let mut out = [0u8; INTEGRITY_METADATA_LEN];
        out[..HASH_LEN].copy_from_slice(&self.hash);
        out[32..36].copy_from_slice(&self.checksum.to_be_bytes());
        out[36] = u8::from(self.compressed);
        out[37..41].copy_from_slice(&size_field(self.original_size)?.to_be_bytes());
        out[41..45].copy_from_slice(&size_field(self.stored_size)?.to_be_bytes());
        Ok(out)
    }

    /// Decodes a record. Trailing bytes beyond the first 45 are ignored.
    ///
    /// # Errors
    ///
    /// Returns a format error for short input or negative sizes.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < INTEGRITY_METADATA_LEN {
            return Err(ArchiveError::InvalidArchive(format!(
                "integrity metadata is {} bytes, expected {INTEGRITY_METADATA_LEN}",
                bytes.len()
            )));
        }

        let mut hash = [0u8; HASH_LEN];
        hash.copy_from_slice(&bytes[..HASH_LEN]);
        let checksum = u32::from_be_bytes([bytes[32], bytes[33], bytes[34], bytes[35]]);
        let compressed = bytes[36] == 1;
        let original = i32::from_be_bytes([bytes[37], bytes[38], bytes[39], bytes[40]]);
        let stored = i32::from_be_bytes([bytes[41], bytes[42], bytes[43], bytes[44]]);

        let to_size = |value: i32| {
            u64::try_from(value).map_err(|_| {
                ArchiveError::InvalidArchive(format!("negative size in integrity metadata: {value}"))
            })
        };

        Ok(Self {
            hash,
            checksum,
            compressed,
            original_size: to_size(original)?,
            stored_size: to_size(stored)?,
        })
    }
}
