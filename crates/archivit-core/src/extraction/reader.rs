//! Streaming archive reader.

use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::io::ErrorKind;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use tracing::debug;

use crate::ArchiveError;
use crate::Result;
use crate::codec;
use crate::crypto::CipherKit;
use crate::crypto::Nonce;
use crate::crypto::Password;
use crate::crypto::TAG_LEN;
use crate::crypto::chunk_nonce;
use crate::format::CHUNK_PREFIX;
use crate::format::ChunkFraming;
use crate::format::EntryMetadata;
use crate::format::Header;
use crate::format::INTEGRITY_PREFIX;
use crate::format::MAX_CHUNK_FRAME;
use crate::format::NonceSchedule;
use crate::format::PayloadLayout;
use crate::integrity::IntegrityDigest;
use crate::integrity::IntegrityMetadata;
use crate::io::DigestWriter;
use crate::io::Inflate;

const READ_BUFFER: usize = 64 * 1024;

/// Everything that precedes an entry's payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryHeader {
    /// File metadata.
    pub metadata: EntryMetadata,
    /// Integrity record, present when the container carries them.
    pub integrity: Option<IntegrityMetadata>,
    /// Whether the payload is DEFLATE-compressed.
    pub compressed: bool,
}

impl EntryHeader {
    /// Length of the stored payload before encryption.
    ///
    /// Without an integrity record this is the original size, which is
    /// exact for every entry a reader can frame without chunk markers.
    #[must_use]
    pub fn stored_len(&self) -> u64 {
        self.integrity
            .as_ref()
            .map_or(self.metadata.size, IntegrityMetadata::expected_len)
    }

    /// Checks a decoded payload against the integrity record and the
    /// declared size.
    ///
    /// # Errors
    ///
    /// - [`ArchiveError::IntegrityMismatch`] if the stored bytes do not
    ///   match the record
    /// - [`ArchiveError::InvalidArchive`] if the content length differs
    ///   from the declared size
    pub fn check_decoded(&self, written: u64, digest: Option<&IntegrityDigest>) -> Result<()> {
        if let (Some(record), Some(digest)) = (&self.integrity, digest)
            && !record.matches(digest)
        {
            return Err(ArchiveError::IntegrityMismatch {
                path: PathBuf::from(&self.metadata.path),
            });
        }
        if written != self.metadata.size {
            return Err(ArchiveError::InvalidArchive(format!(
                "entry {} produced {written} bytes, expected {}",
                self.metadata.path, self.metadata.size
            )));
        }
        Ok(())
    }
}

/// An entry's original content written to a sink.
#[derive(Debug)]
pub struct DecodedPayload<W> {
    /// The sink, flushed.
    pub sink: W,
    /// Original bytes written to the sink.
    pub written: u64,
    /// Digest of the stored bytes, if requested.
    pub digest: Option<IntegrityDigest>,
}

/// Reads entries from a container one at a time.
///
/// The payload of each entry must be consumed with
/// [`read_payload`](Self::read_payload) or
/// [`skip_payload`](Self::skip_payload) before the next call to
/// [`next_entry`](Self::next_entry).
pub struct ArchiveReader<R> {
    input: R,
    header: Header,
    layout: PayloadLayout,
    cipher: Option<CipherKit>,
    next_chunk: u64,
}

impl ArchiveReader<BufReader<File>> {
    /// Opens the container at `path` and parses its header.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::new(BufReader::with_capacity(READ_BUFFER, file))
    }
}

impl<R: BufRead> ArchiveReader<R> {
    /// Parses the header from `input`.
    pub fn new(mut input: R) -> Result<Self> {
        let header = Header::read_from(&mut input)?;
        let layout = header.version.layout();
        debug!(
            version = %header.version,
            flags = header.flags.bits(),
            "header parsed"
        );

        Ok(Self {
            input,
            header,
            layout,
            cipher: None,
            next_chunk: 0,
        })
    }

    /// The parsed header.
    #[must_use]
    pub const fn header(&self) -> &Header {
        &self.header
    }

    /// Whether payloads are encrypted.
    #[must_use]
    pub const fn is_protected(&self) -> bool {
        self.header.flags.password()
    }

    /// Derives the key for a protected container.
    ///
    /// A password given for an unprotected container is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::PasswordRequired`] if the container is
    /// protected and `password` is `None`. A wrong password is only
    /// detected when the first chunk is decrypted.
    pub fn unlock(&mut self, password: Option<&Password>) -> Result<()> {
        let Some(nonce) = self.header.nonce else {
            if password.is_some() {
                debug!("container is not protected, password ignored");
            }
            return Ok(());
        };
        let password = password.ok_or(ArchiveError::PasswordRequired)?;
        self.cipher = Some(CipherKit::new(password, nonce, self.layout.kdf)?);
        Ok(())
    }

    /// Reads the next entry header, or `None` at a clean end of input.
    pub fn next_entry(&mut self) -> Result<Option<EntryHeader>> {
        if self
            .input
            .fill_buf()
            .map_err(ArchiveError::from_read)?
            .is_empty()
        {
            return Ok(None);
        }

        let metadata = EntryMetadata::read_from(&mut self.input)?;
        let integrity = if self.header.flags.integrity() {
            let frame =
                codec::read_bytes(&mut self.input, INTEGRITY_PREFIX, INTEGRITY_PREFIX.max_len())?;
            Some(IntegrityMetadata::decode(&frame)?)
        } else {
            None
        };
        let compressed = if self.layout.compression_flag {
            codec::read_bool(&mut self.input)?
        } else {
            false
        };

        let entry = EntryHeader {
            metadata,
            integrity,
            compressed,
        };
        self.check_consistent(&entry)?;
        Ok(Some(entry))
    }

    fn check_consistent(&self, entry: &EntryHeader) -> Result<()> {
        let path = &entry.metadata.path;
        if entry.compressed && !self.header.flags.compression() {
            return Err(ArchiveError::InvalidArchive(format!(
                "entry {path} is compressed but the container disables compression"
            )));
        }
        match &entry.integrity {
            Some(record) => {
                if record.compressed != entry.compressed {
                    return Err(ArchiveError::InvalidArchive(format!(
                        "entry {path} disagrees with its integrity record about compression"
                    )));
                }
                if record.original_size != entry.metadata.size {
                    return Err(ArchiveError::InvalidArchive(format!(
                        "entry {path} declares {} bytes but its integrity record {}",
                        entry.metadata.size, record.original_size
                    )));
                }
            }
            None if entry.compressed && !self.is_protected() => {
                return Err(ArchiveError::InvalidArchive(format!(
                    "compressed entry {path} has no stored length"
                )));
            }
            None => {}
        }
        Ok(())
    }

    /// Decrypts the current entry's payload into `sink`.
    ///
    /// Returns the number of stored bytes written, which are still
    /// compressed if the entry is.
    ///
    /// # Errors
    ///
    /// - [`ArchiveError::PasswordRequired`] if the container is protected
    ///   and [`unlock`](Self::unlock) was not called with a password
    /// - [`ArchiveError::PasswordMismatch`] if a chunk fails to authenticate
    /// - [`ArchiveError::InvalidArchive`] for truncated or malformed framing
    pub fn read_payload<W: Write + ?Sized>(&mut self, entry: &EntryHeader, sink: &mut W) -> Result<u64> {
        if !self.is_protected() {
            return copy_exact(&mut self.input, sink, entry.stored_len());
        }

        let Self {
            input,
            layout,
            cipher,
            next_chunk,
            ..
        } = self;
        let kit = cipher.as_ref().ok_or(ArchiveError::PasswordRequired)?;
        let mut opener = ChunkOpener {
            kit,
            layout: *layout,
            next_chunk,
        };

        let mut total = 0u64;
        match layout.framing {
            ChunkFraming::FlagAfterChunk => {
                if entry.stored_len() == 0 {
                    return expect_end(input).map(|()| 0);
                }
                loop {
                    let sealed = codec::read_bytes(input, CHUNK_PREFIX, MAX_CHUNK_FRAME)?;
                    let flag = codec::read_u8(input)?;
                    let plain = opener.open(&sealed, flag)?;
                    sink.write_all(&plain)?;
                    total += plain.len() as u64;
                    if !continues(flag)? {
                        break;
                    }
                }
            }
            ChunkFraming::FlagBeforeChunk => {
                while continues(codec::read_u8(input)?)? {
                    let sealed = codec::read_bytes(input, CHUNK_PREFIX, MAX_CHUNK_FRAME)?;
                    let plain = opener.open(&sealed, 1)?;
                    sink.write_all(&plain)?;
                    total += plain.len() as u64;
                }
            }
        }
        Ok(total)
    }

    /// Moves past the current entry's payload without decrypting it.
    ///
    /// Works without a password. Returns the number of stored bytes,
    /// excluding authentication tags.
    pub fn skip_payload(&mut self, entry: &EntryHeader) -> Result<u64> {
        if !self.is_protected() {
            let len = entry.stored_len();
            codec::skip_exact(&mut self.input, len)?;
            return Ok(len);
        }

        let mut total = 0u64;
        match self.layout.framing {
            ChunkFraming::FlagAfterChunk => {
                if entry.stored_len() == 0 {
                    return expect_end(&mut self.input).map(|()| 0);
                }
                loop {
                    total += self.skip_chunk()?;
                    if !continues(codec::read_u8(&mut self.input)?)? {
                        break;
                    }
                }
            }
            ChunkFraming::FlagBeforeChunk => {
                while continues(codec::read_u8(&mut self.input)?)? {
                    total += self.skip_chunk()?;
                }
            }
        }
        Ok(total)
    }

    /// Decrypts and inflates the current entry's payload into `sink`.
    ///
    /// At most `metadata.size` bytes reach the sink. With `hash_stored`
    /// the stored bytes are digested for
    /// [`EntryHeader::check_decoded`]; the caller runs that check.
    ///
    /// # Errors
    ///
    /// As [`read_payload`](Self::read_payload), plus
    /// [`ArchiveError::InvalidArchive`] for data that does not inflate or
    /// inflates past the declared size.
    pub fn decode_payload<W: Write>(
        &mut self,
        entry: &EntryHeader,
        sink: W,
        hash_stored: bool,
    ) -> Result<DecodedPayload<W>> {
        let sized = DigestWriter::counting(sink).with_limit(entry.metadata.size);
        let inflate = Inflate::new(sized, entry.compressed);
        let mut stored = if hash_stored {
            DigestWriter::hashing(inflate)
        } else {
            DigestWriter::counting(inflate)
        };

        self.read_payload(entry, &mut stored)
            .map_err(corrupt_payload)?;
        let (inflate, digest) = stored.into_parts();
        let sized = inflate
            .finish()
            .map_err(|e| corrupt_payload(ArchiveError::Io(e)))?;
        let written = sized.total_bytes();
        let (sink, _) = sized.into_parts();

        Ok(DecodedPayload {
            sink,
            written,
            digest,
        })
    }

    fn skip_chunk(&mut self) -> Result<u64> {
        let len = codec::read_len(&mut self.input, CHUNK_PREFIX)?;
        check_chunk_len(len)?;
        codec::skip_exact(&mut self.input, len)?;
        self.next_chunk += 1;
        Ok(len - TAG_LEN as u64)
    }
}

/// Decrypts chunks in archive order.
struct ChunkOpener<'a> {
    kit: &'a CipherKit,
    layout: PayloadLayout,
    next_chunk: &'a mut u64,
}

impl ChunkOpener<'_> {
    fn open(&mut self, sealed: &[u8], flag: u8) -> Result<Vec<u8>> {
        check_chunk_len(sealed.len() as u64)?;
        let nonce: Nonce = match self.layout.nonces {
            NonceSchedule::Fixed => *self.kit.nonce(),
            NonceSchedule::PerChunk => chunk_nonce(self.kit.nonce(), *self.next_chunk),
        };
        *self.next_chunk += 1;

        let flag = [flag];
        let aad: &[u8] = if self.layout.authenticate_flags {
            &flag
        } else {
            &[]
        };
        Ok(self.kit.decrypt(&nonce, sealed, aad)?)
    }
}

/// Reports undecodable or oversized entry data as a format error.
fn corrupt_payload(err: ArchiveError) -> ArchiveError {
    match err {
        ArchiveError::Io(e)
            if matches!(
                e.kind(),
                ErrorKind::InvalidData | ErrorKind::InvalidInput | ErrorKind::WriteZero
            ) =>
        {
            ArchiveError::InvalidArchive(format!("corrupt entry data: {e}"))
        }
        other => other,
    }
}

fn check_chunk_len(len: u64) -> Result<()> {
    if len > MAX_CHUNK_FRAME {
        return Err(ArchiveError::SegmentTooLarge {
            len,
            max: MAX_CHUNK_FRAME,
        });
    }
    if len < TAG_LEN as u64 {
        return Err(ArchiveError::InvalidArchive(format!(
            "encrypted chunk of {len} bytes is shorter than its tag"
        )));
    }
    Ok(())
}

fn continues(flag: u8) -> Result<bool> {
    match flag {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(ArchiveError::InvalidArchive(format!(
            "invalid chunk continuation flag: {other:#04x}"
        ))),
    }
}

fn expect_end<R: Read>(input: &mut R) -> Result<()> {
    if continues(codec::read_u8(input)?)? {
        return Err(ArchiveError::InvalidArchive(
            "empty payload followed by a chunk".to_string(),
        ));
    }
    Ok(())
}

fn copy_exact<R: Read, W: Write + ?Sized>(input: &mut R, sink: &mut W, len: u64) -> Result<u64> {
    let copied = std::io::copy(&mut input.take(len), sink)?;
    if copied != len {
        return Err(ArchiveError::InvalidArchive(
            "unexpected end of archive".to_string(),
        ));
    }
    Ok(copied)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::creation::ArchiveWriter;
    use crate::creation::CreationConfig;
    use crate::crypto::KeyDerivation;
    use crate::format::FeatureFlags;
    use crate::format::FormatVersion;
    use crate::format::header::LEGACY_SIGNATURE;
    use std::io::Cursor;

    fn entry(name: &str) -> EntryMetadata {
        EntryMetadata {
            name: name.to_string(),
            path: format!("dir/{name}"),
            readable: true,
            executable: false,
            writable: true,
            modified_millis: 1_700_000_000_000,
            size: 0,
        }
    }

    fn password() -> Password {
        Password::new("secret1").unwrap()
    }

    fn build(config: &CreationConfig, files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ArchiveWriter::new(Vec::new(), config).unwrap();
        for (name, content) in files {
            writer.add_entry(entry(name), content).unwrap();
        }
        writer.finish().unwrap()
    }

    fn read_all(bytes: Vec<u8>, password: Option<&Password>) -> Result<Vec<(String, Vec<u8>)>> {
        let mut reader = ArchiveReader::new(Cursor::new(bytes))?;
        reader.unlock(password)?;
        let mut out = Vec::new();
        while let Some(entry) = reader.next_entry()? {
            let decoded = reader.decode_payload(&entry, Vec::new(), true)?;
            entry.check_decoded(decoded.written, decoded.digest.as_ref())?;
            out.push((entry.metadata.path, decoded.sink));
        }
        Ok(out)
    }

    #[test]
    fn test_plain_entries_in_order() {
        let config = CreationConfig::default()
            .with_compression(false)
            .with_integrity(false);
        let bytes = build(&config, &[("a", b"alpha"), ("b", b""), ("c", b"gamma")]);

        let entries = read_all(bytes, None).unwrap();
        assert_eq!(
            entries,
            vec![
                ("dir/a".to_string(), b"alpha".to_vec()),
                ("dir/b".to_string(), Vec::new()),
                ("dir/c".to_string(), b"gamma".to_vec()),
            ]
        );
    }

    #[test]
    fn test_encrypted_multi_chunk_entries() {
        let config = CreationConfig::default()
            .with_password(Some(password()))
            .with_chunk_size(4);
        let long: Vec<u8> = (0..=255u8).collect();
        let bytes = build(&config, &[("long", &long), ("empty", b""), ("eight", b"abcdefgh")]);

        let entries = read_all(bytes, Some(&password())).unwrap();
        assert_eq!(entries[0].1, long);
        assert!(entries[1].1.is_empty());
        assert_eq!(entries[2].1, b"abcdefgh");
    }

    #[test]
    fn test_password_required_before_payload() {
        let config = CreationConfig::default().with_password(Some(password()));
        let bytes = build(&config, &[("a", b"alpha")]);

        let mut reader = ArchiveReader::new(Cursor::new(bytes.clone())).unwrap();
        assert!(matches!(
            reader.unlock(None),
            Err(ArchiveError::PasswordRequired)
        ));

        let mut reader = ArchiveReader::new(Cursor::new(bytes)).unwrap();
        let entry = reader.next_entry().unwrap().unwrap();
        assert!(matches!(
            reader.read_payload(&entry, &mut Vec::new()),
            Err(ArchiveError::PasswordRequired)
        ));
    }

    #[test]
    fn test_wrong_password() {
        let config = CreationConfig::default().with_password(Some(password()));
        let bytes = build(&config, &[("a", b"alpha")]);

        let wrong = Password::new("secret2").unwrap();
        assert!(matches!(
            read_all(bytes, Some(&wrong)),
            Err(ArchiveError::PasswordMismatch)
        ));
    }

    #[test]
    fn test_password_ignored_for_plain_container() {
        let bytes = build(&CreationConfig::default(), &[("a", b"alpha")]);
        let entries = read_all(bytes, Some(&password())).unwrap();
        assert_eq!(entries[0].1, b"alpha");
    }

    #[test]
    fn test_skip_without_password_keeps_position() {
        let config = CreationConfig::default()
            .with_password(Some(password()))
            .with_compression(false)
            .with_chunk_size(3);
        let bytes = build(&config, &[("a", b"0123456789"), ("b", b""), ("c", b"xyz")]);

        let mut reader = ArchiveReader::new(Cursor::new(bytes)).unwrap();
        let mut stored = Vec::new();
        while let Some(entry) = reader.next_entry().unwrap() {
            stored.push((entry.metadata.name.clone(), reader.skip_payload(&entry).unwrap()));
        }
        assert_eq!(
            stored,
            vec![("a".to_string(), 10), ("b".to_string(), 0), ("c".to_string(), 3)]
        );
        assert_eq!(reader.next_chunk, 5);
    }

    #[test]
    fn test_truncated_payload() {
        let config = CreationConfig::default()
            .with_compression(false)
            .with_integrity(false);
        let mut bytes = build(&config, &[("a", b"alpha")]);
        bytes.truncate(bytes.len() - 2);

        assert!(matches!(
            read_all(bytes, None),
            Err(ArchiveError::InvalidArchive(_))
        ));
    }

    #[test]
    fn test_tampered_flag_fails_authentication() {
        let config = CreationConfig::default()
            .with_password(Some(password()))
            .with_compression(false)
            .with_integrity(false)
            .with_chunk_size(4);
        let mut bytes = build(&config, &[("a", b"abcdefgh")]);

        // Ending the stream after the first chunk is caught by its tag.
        let last = bytes.len() - 1;
        let first_flag = last - (1 + 8 + 4 + TAG_LEN);
        assert_eq!(bytes[first_flag], 1);
        bytes[first_flag] = 0;

        assert!(matches!(
            read_all(bytes, Some(&password())),
            Err(ArchiveError::PasswordMismatch)
        ));
    }

    /// Builds an entry stream the way older writers did.
    fn legacy_entry(out: &mut Vec<u8>, kit: &CipherKit, metadata: &EntryMetadata, content: &[u8]) {
        metadata.write_to(out).unwrap();
        for chunk in content.chunks(4) {
            codec::write_bool(out, true).unwrap();
            let sealed = kit.encrypt(kit.nonce(), chunk, &[]).unwrap();
            codec::write_bytes(out, CHUNK_PREFIX, &sealed).unwrap();
        }
        codec::write_bool(out, false).unwrap();
    }

    #[test]
    fn test_reads_legacy_container() {
        let nonce = [7u8; 12];
        let kit = CipherKit::new(&password(), nonce, KeyDerivation::Pbkdf2Sha1).unwrap();

        let mut bytes = LEGACY_SIGNATURE.to_vec();
        bytes.push(b'/');
        codec::write_bool(&mut bytes, true).unwrap();
        bytes.extend_from_slice(&nonce);

        let mut first = entry("one");
        first.size = 10;
        legacy_entry(&mut bytes, &kit, &first, b"0123456789");
        legacy_entry(&mut bytes, &kit, &entry("none"), b"");

        let entries = read_all(bytes, Some(&password())).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].1, b"0123456789");
        assert!(entries[1].1.is_empty());
    }

    #[test]
    fn test_reads_enhanced_container() {
        let nonce = [9u8; 12];
        let kit = CipherKit::new(&password(), nonce, KeyDerivation::Pbkdf2Sha1).unwrap();
        let header = Header {
            version: FormatVersion::Enhanced,
            separator: b'/',
            flags: FeatureFlags::new(true, false, false),
            nonce: Some(nonce),
        };

        let mut bytes = Vec::new();
        header.write_to(&mut bytes).unwrap();
        let mut metadata = entry("v2");
        metadata.size = 6;
        metadata.write_to(&mut bytes).unwrap();
        codec::write_bool(&mut bytes, false).unwrap();
        for (chunk, more) in [(&b"abcd"[..], true), (&b"ef"[..], false)] {
            let sealed = kit.encrypt(&nonce, chunk, &[]).unwrap();
            codec::write_bytes(&mut bytes, CHUNK_PREFIX, &sealed).unwrap();
            codec::write_bool(&mut bytes, more).unwrap();
        }

        let entries = read_all(bytes, Some(&password())).unwrap();
        assert_eq!(entries, vec![("dir/v2".to_string(), b"abcdef".to_vec())]);
    }

    #[test]
    fn test_compressed_entry_without_length_rejected() {
        let header = Header::new(true, false, None);
        let mut bytes = Vec::new();
        header.write_to(&mut bytes).unwrap();
        entry("z").write_to(&mut bytes).unwrap();
        codec::write_bool(&mut bytes, true).unwrap();

        let mut reader = ArchiveReader::new(Cursor::new(bytes)).unwrap();
        assert!(matches!(
            reader.next_entry(),
            Err(ArchiveError::InvalidArchive(_))
        ));
    }

    #[test]
    fn test_check_decoded() {
        let content = b"checked content";
        let mut metadata = entry("c");
        metadata.size = content.len() as u64;
        let header = EntryHeader {
            metadata,
            integrity: Some(IntegrityMetadata::compute(content, content.len() as u64, false).unwrap()),
            compressed: false,
        };

        let mut hasher = crate::integrity::IntegrityHasher::new();
        hasher.update(content);
        let good = hasher.finalize();
        header.check_decoded(good.len, Some(&good)).unwrap();
        header.check_decoded(good.len, None).unwrap();

        let mut hasher = crate::integrity::IntegrityHasher::new();
        hasher.update(b"checked c0ntent");
        let bad = hasher.finalize();
        assert!(matches!(
            header.check_decoded(bad.len, Some(&bad)),
            Err(ArchiveError::IntegrityMismatch { .. })
        ));
        assert!(matches!(
            header.check_decoded(3, None),
            Err(ArchiveError::InvalidArchive(_))
        ));
    }

    #[test]
    fn test_inflated_past_declared_size() {
        let mut bytes = Vec::new();
        Header::new(true, true, None).write_to(&mut bytes).unwrap();
        let packed = crate::integrity::compress(&[0u8; 1000]).unwrap();
        let mut metadata = entry("bomb");
        metadata.size = 10;
        metadata.write_to(&mut bytes).unwrap();
        let record = IntegrityMetadata::compute(&packed, 10, true).unwrap();
        codec::write_bytes(&mut bytes, INTEGRITY_PREFIX, &record.encode().unwrap()).unwrap();
        codec::write_bool(&mut bytes, true).unwrap();
        bytes.extend_from_slice(&packed);

        let mut reader = ArchiveReader::new(Cursor::new(bytes)).unwrap();
        let entry = reader.next_entry().unwrap().unwrap();
        assert!(matches!(
            reader.decode_payload(&entry, Vec::new(), false),
            Err(ArchiveError::InvalidArchive(_))
        ));
    }
}
