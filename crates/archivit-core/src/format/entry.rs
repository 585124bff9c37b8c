//! Per-entry metadata record.

use std::fs;
use std::io::Cursor;
use std::io::Read;
use std::io::Write;
use std::path::Component;
use std::path::Path;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use crate::ArchiveError;
use crate::Result;
use crate::codec;
use crate::codec::LengthPrefix;

/// Largest metadata frame a reader accepts: two maximal short strings, three
/// flags and two 8-byte integers.
pub const METADATA_FRAME_LIMIT: u64 = 2 * (2 + LengthPrefix::Short.max_len()) + 3 + 8 + 8;

const STRING_PREFIX: LengthPrefix = LengthPrefix::Short;

/// Descriptor of one archived file.
///
/// `size` is always the original content length, whatever compression or
/// encryption the payload went through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryMetadata {
    /// Base name of the file.
    pub name: String,
    /// Path relative to the archived root, joined with the archive separator.
    pub path: String,
    /// Owner may read.
    pub readable: bool,
    /// Owner may execute.
    pub executable: bool,
    /// Owner may write.
    pub writable: bool,
    /// Modification time in milliseconds since the Unix epoch.
    pub modified_millis: i64,
    /// Original content length in bytes.
    pub size: u64,
}

impl EntryMetadata {
    /// Describes the regular file `path`, stored relative to `root`.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::InvalidPath`] if `path` does not exist, is a
    /// directory, lies outside `root`, or is not valid UTF-8.
    pub fn from_path(path: &Path, root: &Path, separator: char) -> Result<Self> {
        let invalid = |reason: &str| ArchiveError::InvalidPath {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        };

        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(invalid("does not exist"));
            }
            Err(e) => return Err(e.into()),
        };
        if metadata.is_dir() {
            return Err(invalid("is a directory"));
        }

        let relative = path
            .strip_prefix(root)
            .map_err(|_| invalid("is outside the source directory"))?;
        let mut parts = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => {
                    parts.push(part.to_str().ok_or_else(|| invalid("is not valid UTF-8"))?);
                }
                Component::CurDir => {}
                _ => return Err(invalid("is not a plain relative path")),
            }
        }
        let Some(name) = parts.last().map(|s| (*s).to_string()) else {
            return Err(invalid("has no file name"));
        };

        let (readable, executable, writable) = owner_permissions(&metadata);

        Ok(Self {
            name,
            path: parts.join(&separator.to_string()),
            readable,
            executable,
            writable,
            modified_millis: metadata.modified().map_or(0, to_millis),
            size: metadata.len(),
        })
    }

    /// Exact encoded length in bytes, excluding the outer frame.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        STRING_PREFIX.width() + self.name.len() + STRING_PREFIX.width() + self.path.len() + 3 + 8 + 8
    }

    /// Encodes the record without its outer frame.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let size = i64::try_from(self.size).map_err(|_| ArchiveError::SegmentTooLarge {
            len: self.size,
            max: LengthPrefix::Long.max_len(),
        })?;

        let mut buf = Vec::with_capacity(self.encoded_len());
        codec::write_string(&mut buf, STRING_PREFIX, &self.name)?;
        codec::write_string(&mut buf, STRING_PREFIX, &self.path)?;
        codec::write_bool(&mut buf, self.readable)?;
        codec::write_bool(&mut buf, self.executable)?;
        codec::write_bool(&mut buf, self.writable)?;
        codec::write_i64(&mut buf, self.modified_millis)?;
        codec::write_i64(&mut buf, size)?;
        Ok(buf)
    }

    /// Decodes a record from the contents of a metadata frame.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(bytes);
        let limit = STRING_PREFIX.max_len();

        let name = codec::read_string(&mut cursor, STRING_PREFIX, limit)?;
        let path = codec::read_string(&mut cursor, STRING_PREFIX, limit)?;
        let readable = codec::read_bool(&mut cursor)?;
        let executable = codec::read_bool(&mut cursor)?;
        let writable = codec::read_bool(&mut cursor)?;
        let modified_millis = codec::read_i64(&mut cursor)?;
        let raw_size = codec::read_i64(&mut cursor)?;

        if cursor.position() != bytes.len() as u64 {
            return Err(ArchiveError::InvalidArchive(
                "trailing bytes in entry metadata".to_string(),
            ));
        }
        let size = u64::try_from(raw_size)
            .map_err(|_| ArchiveError::InvalidArchive(format!("negative entry size: {raw_size}")))?;

        Ok(Self {
            name,
            path,
            readable,
            executable,
            writable,
            modified_millis,
            size,
        })
    }

    /// Writes the record inside its 8-byte length frame.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        codec::write_bytes(writer, LengthPrefix::Long, &self.encode()?)
    }

    /// Reads one framed record.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let frame = codec::read_bytes(reader, LengthPrefix::Long, METADATA_FRAME_LIMIT)?;
        Self::decode(&frame)
    }

    /// Modification time, if representable on this platform.
    #[must_use]
    pub fn modified(&self) -> Option<SystemTime> {
        let offset = Duration::from_millis(self.modified_millis.unsigned_abs());
        if self.modified_millis >= 0 {
            UNIX_EPOCH.checked_add(offset)
        } else {
            UNIX_EPOCH.checked_sub(offset)
        }
    }

    /// Restores modification time and owner permissions on `path`.
    ///
    /// Must run after the content is written, since the restored
    /// permissions may forbid writing.
    pub fn apply_to(&self, path: &Path) -> Result<()> {
        if let Some(modified) = self.modified() {
            let file = fs::OpenOptions::new().write(true).open(path)?;
            file.set_modified(modified)?;
        }

        let mut permissions = fs::metadata(path)?.permissions();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let mut mode = permissions.mode() & !0o700;
            if self.readable {
                mode |= 0o400;
            }
            if self.writable {
                mode |= 0o200;
            }
            if self.executable {
                mode |= 0o100;
            }
            permissions.set_mode(mode);
        }
        #[cfg(not(unix))]
        permissions.set_readonly(!self.writable);

        fs::set_permissions(path, permissions)?;
        Ok(())
    }
}

#[cfg(unix)]
fn owner_permissions(metadata: &fs::Metadata) -> (bool, bool, bool) {
    use std::os::unix::fs::PermissionsExt;

    let mode = metadata.permissions().mode();
    (mode & 0o400 != 0, mode & 0o100 != 0, mode & 0o200 != 0)
}

#[cfg(not(unix))]
fn owner_permissions(metadata: &fs::Metadata) -> (bool, bool, bool) {
    (true, false, !metadata.permissions().readonly())
}

fn to_millis(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => i64::try_from(after.as_millis()).unwrap_or(i64::MAX),
        Err(before) => i64::try_from(before.duration().as_millis()).map_or(i64::MIN, |ms| -ms),
    }
}
