//! Streaming archive writer.

use std::borrow::Cow;
use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::io::Write;
use std::path::Path;

use tracing::debug;

use crate::ArchiveError;
use crate::ProgressCallback;
use crate::Result;
use crate::codec;
use crate::creation::config::CreationConfig;
use crate::creation::report::CreationReport;
use crate::creation::walker::EntryKind;
use crate::creation::walker::WalkEntry;
use crate::crypto::CipherKit;
use crate::crypto::chunk_nonce;
use crate::crypto::generate_nonce;
use crate::format::CHUNK_PREFIX;
use crate::format::EntryMetadata;
use crate::format::FormatVersion;
use crate::format::Header;
use crate::format::INTEGRITY_PREFIX;
use crate::integrity;
use crate::integrity::IntegrityMetadata;
use crate::report::ProgressTracker;

/// What happened to one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryOutcome {
    /// Original content length.
    pub original_size: u64,
    /// Stored payload length, excluding chunk framing and tags.
    pub stored_size: u64,
    /// Whether the stored payload is compressed.
    pub compressed: bool,
}

/// Writes a container in the current format to any [`Write`].
///
/// The header is written by [`ArchiveWriter::new`]; entries follow one by
/// one. An entry is held in memory only when compression or its integrity
/// record needs the stored bytes before the payload; otherwise files are
/// streamed one chunk at a time.
///
/// # Examples
///
/// ```
/// use archivit_core::creation::CreationConfig;
/// use archivit_core::creation::writer::ArchiveWriter;
/// use archivit_core::format::EntryMetadata;
///
/// let mut writer = ArchiveWriter::new(Vec::new(), &CreationConfig::default())?;
/// let entry = EntryMetadata {
///     name: "hello.txt".into(),
///     path: "hello.txt".into(),
///     readable: true,
///     executable: false,
///     writable: true,
///     modified_millis: 0,
///     size: 0,
/// };
/// writer.add_entry(entry, b"hello")?;
/// let bytes = writer.finish()?;
/// assert!(bytes.starts_with(b"archivitv2"));
/// # Ok::<(), archivit_core::ArchiveError>(())
/// ```
pub struct ArchiveWriter<W: Write> {
    out: W,
    header: Header,
    cipher: Option<CipherKit>,
    chunk_size: usize,
    next_chunk: u64,
}

impl<W: Write> ArchiveWriter<W> {
    /// Validates `config`, derives the key if a password is set and writes
    /// the header.
    pub fn new(mut out: W, config: &CreationConfig) -> Result<Self> {
        config.validate()?;

        let cipher = match &config.password {
            Some(password) => Some(CipherKit::new(
                password,
                generate_nonce(),
                FormatVersion::CURRENT.layout().kdf,
            )?),
            None => None,
        };

        let header = Header::new(
            config.compression,
            config.integrity,
            cipher.as_ref().map(|kit| *kit.nonce()),
        );
        header.write_to(&mut out)?;

        Ok(Self {
            out,
            header,
            cipher,
            chunk_size: config.chunk_size,
            next_chunk: 0,
        })
    }

    /// The header this writer emitted.
    #[must_use]
    pub const fn header(&self) -> &Header {
        &self.header
    }

    /// Archives every file of a walk, in the order the walk yields them.
    ///
    /// `entries` is consumed lazily. Paths are stored relative to `root`.
    /// Directories are counted, symlinks and excluded paths are skipped and
    /// recorded. The first walk or write error stops the walk.
    ///
    /// `total_files` sizes progress; pass `0` when it is unknown. The
    /// returned report leaves `archive_path`, `archive_size` and `duration`
    /// to the caller.
    pub fn add_walk<I>(
        &mut self,
        entries: I,
        root: &Path,
        progress: &mut dyn ProgressCallback,
        total_files: usize,
    ) -> Result<CreationReport>
    where
        I: IntoIterator<Item = Result<WalkEntry>>,
    {
        let mut report = CreationReport::default();
        let mut tracker = ProgressTracker::new(progress, total_files);

        for entry in entries {
            let entry = entry?;
            let relative = entry.path.strip_prefix(root).unwrap_or(&entry.path);
            match entry.kind {
                EntryKind::File => {
                    tracker.on_entry_start(relative);
                    let outcome = self.add_file(&entry.path, root)?;
                    report.files_added += 1;
                    report.bytes_read += outcome.original_size;
                    report.bytes_stored += outcome.stored_size;
                    if outcome.compressed {
                        report.files_compressed += 1;
                    }
                    tracker.on_bytes_written(outcome.original_size);
                    tracker.on_entry_complete(relative);
                }
                EntryKind::Directory => report.directories_seen += 1,
                EntryKind::Symlink => {
                    report.symlinks_skipped += 1;
                    report.add_warning(format!("skipped symlink: {}", relative.display()));
                }
                EntryKind::Excluded => {
                    debug!(path = %relative.display(), "excluded");
                    report.files_excluded += 1;
                }
            }
        }

        tracker.on_complete();
        Ok(report)
    }

    /// Reads the regular file at `path` and adds it, stored relative to
    /// `root`.
    ///
    /// Files are streamed straight into the payload unless compression or
    /// an integrity record needs the stored bytes up front.
    pub fn add_file(&mut self, path: &Path, root: &Path) -> Result<EntryOutcome> {
        let metadata = EntryMetadata::from_path(path, root, self.header.separator_char())?;
        if self.needs_stored_bytes() {
            let content = std::fs::read(path)?;
            return self.add_entry(metadata, &content);
        }

        let reader = BufReader::new(File::open(path)?);
        self.stream_entry(metadata, reader).map_err(|err| match err {
            ArchiveError::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                ArchiveError::Io(std::io::Error::new(
                    e.kind(),
                    format!("{} shrank while being archived", path.display()),
                ))
            }
            other => other,
        })
    }

    /// Adds one entry with the given content.
    ///
    /// `metadata.size` is replaced by the content length, so a file that
    /// changed after its metadata was read is still recorded consistently.
    pub fn add_entry(&mut self, mut metadata: EntryMetadata, content: &[u8]) -> Result<EntryOutcome> {
        let flags = self.header.flags;
        metadata.size = content.len() as u64;

        let packed = if self.may_compress() {
            integrity::compress_if_smaller(content)?
        } else {
            None
        };
        let compressed = packed.is_some();
        let stored: Cow<'_, [u8]> = packed.map_or(Cow::Borrowed(content), Cow::Owned);

        metadata.write_to(&mut self.out)?;
        if flags.integrity() {
            let record = IntegrityMetadata::compute(&stored, metadata.size, compressed)?;
            codec::write_bytes(&mut self.out, INTEGRITY_PREFIX, &record.encode()?)?;
        }
        codec::write_bool(&mut self.out, compressed)?;

        match &self.cipher {
            Some(kit) => write_chunks(
                &mut self.out,
                kit,
                &mut self.next_chunk,
                self.chunk_size,
                &stored,
            )?,
            None => self.out.write_all(&stored)?,
        }

        debug!(
            path = %metadata.path,
            size = metadata.size,
            stored = stored.len(),
            compressed,
            "entry written"
        );

        Ok(EntryOutcome {
            original_size: metadata.size,
            stored_size: stored.len() as u64,
            compressed,
        })
    }

    /// Writes an uncompressed entry without an integrity record, reading
    /// exactly `metadata.size` bytes from `reader`.
    ///
    /// Only one chunk is held at a time. A reader that ends early fails
    /// with [`std::io::ErrorKind::UnexpectedEof`].
    fn stream_entry<R: Read>(&mut self, metadata: EntryMetadata, reader: R) -> Result<EntryOutcome> {
        let size = metadata.size;
        metadata.write_to(&mut self.out)?;
        codec::write_bool(&mut self.out, false)?;

        let mut source = reader.take(size);
        match &self.cipher {
            Some(kit) => {
                if size == 0 {
                    codec::write_bool(&mut self.out, false)?;
                }
                let mut buf = vec![0u8; chunk_len(self.chunk_size, size)];
                let mut remaining = size;
                while remaining > 0 {
                    let chunk = &mut buf[..chunk_len(self.chunk_size, remaining)];
                    source.read_exact(chunk)?;
                    remaining -= chunk.len() as u64;
                    seal_chunk(&mut self.out, kit, &mut self.next_chunk, chunk, remaining > 0)?;
                }
            }
            None => {
                let copied = std::io::copy(&mut source, &mut self.out)?;
                if copied != size {
                    return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
                }
            }
        }

        debug!(path = %metadata.path, size, stored = size, compressed = false, "entry streamed");

        Ok(EntryOutcome {
            original_size: size,
            stored_size: size,
            compressed: false,
        })
    }

    /// Without integrity metadata or chunk framing a reader could not find
    /// the end of a compressed payload.
    fn may_compress(&self) -> bool {
        let flags = self.header.flags;
        flags.compression() && (flags.integrity() || flags.password())
    }

    fn needs_stored_bytes(&self) -> bool {
        self.header.flags.integrity() || self.may_compress()
    }

    /// Flushes and returns the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

/// Emits `stored` as `chunk, flag, chunk, flag, …` with a terminal `false`.
///
/// Each chunk takes the next archive-wide nonce and authenticates the flag
/// that follows it.
fn write_chunks<W: Write>(
    out: &mut W,
    kit: &CipherKit,
    next_chunk: &mut u64,
    chunk_size: usize,
    stored: &[u8],
) -> Result<()> {
    if stored.is_empty() {
        return codec::write_bool(out, false);
    }

    let mut chunks = stored.chunks(chunk_size).peekable();
    while let Some(chunk) = chunks.next() {
        seal_chunk(out, kit, next_chunk, chunk, chunks.peek().is_some())?;
    }
    Ok(())
}

/// Seals one chunk under the next archive-wide nonce and writes it with
/// its continuation flag.
fn seal_chunk<W: Write>(
    out: &mut W,
    kit: &CipherKit,
    next_chunk: &mut u64,
    chunk: &[u8],
    more: bool,
) -> Result<()> {
    let nonce = chunk_nonce(kit.nonce(), *next_chunk);
    *next_chunk += 1;

    let sealed = kit.encrypt(&nonce, chunk, &[u8::from(more)])?;
    codec::write_bytes(out, CHUNK_PREFIX, &sealed)?;
    codec::write_bool(out, more)
}

fn chunk_len(chunk_size: usize, remaining: u64) -> usize {
    usize::try_from(remaining).map_or(chunk_size, |r| r.min(chunk_size))
}
