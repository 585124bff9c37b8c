//! Container header and format versions.

use std::io::Read;
use std::io::Write;

use crate::ArchiveError;
use crate::Result;
use crate::codec;
use crate::crypto::KeyDerivation;
use crate::crypto::NONCE_LEN;
use crate::crypto::Nonce;

/// Signature of enhanced containers, followed by a version byte.
pub const SIGNATURE: &[u8; 10] = b"archivitv2";

/// Signature of legacy containers, which carry no version byte.
pub const LEGACY_SIGNATURE: &[u8; 12] = b"archivitfile";

/// Conventional file extension for archivit containers.
pub const EXTENSION: &str = "archivit";

/// Container format versions this crate understands.
///
/// Only [`FormatVersion::Hardened`] is produced by the writer. The older
/// variants are recognised so existing archives stay readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatVersion {
    /// `archivitfile` containers: password flag only, continuation flag
    /// before each chunk.
    Legacy,
    /// `archivitv2` version 2: compression and integrity flags, one nonce
    /// shared by every chunk.
    Enhanced,
    /// `archivitv2` version 3: per-chunk nonces, SHA-256 key derivation and
    /// authenticated continuation flags.
    Hardened,
}

impl FormatVersion {
    /// Version written by this crate.
    pub const CURRENT: Self = Self::Hardened;

    /// Numeric version. Legacy containers do not store it.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Legacy => 1,
            Self::Enhanced => 2,
            Self::Hardened => 3,
        }
    }

    /// Parses the version byte that follows [`SIGNATURE`].
    pub const fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            2 => Ok(Self::Enhanced),
            3 => Ok(Self::Hardened),
            version => Err(ArchiveError::UnsupportedVersion { version }),
        }
    }

    /// How entry payloads are laid out in this version.
    #[must_use]
    pub const fn layout(self) -> PayloadLayout {
        match self {
            Self::Legacy => PayloadLayout {
                compression_flag: false,
                framing: ChunkFraming::FlagBeforeChunk,
                nonces: NonceSchedule::Fixed,
                kdf: KeyDerivation::Pbkdf2Sha1,
                authenticate_flags: false,
            },
            Self::Enhanced => PayloadLayout {
                compression_flag: true,
                framing: ChunkFraming::FlagAfterChunk,
                nonces: NonceSchedule::Fixed,
                kdf: KeyDerivation::Pbkdf2Sha1,
                authenticate_flags: false,
            },
            Self::Hardened => PayloadLayout {
                compression_flag: true,
                framing: ChunkFraming::FlagAfterChunk,
                nonces: NonceSchedule::PerChunk,
                kdf: KeyDerivation::Pbkdf2Sha256,
                authenticate_flags: true,
            },
        }
    }
}

impl std::fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Legacy => write!(f, "v1 (legacy)"),
            Self::Enhanced => write!(f, "v2"),
            Self::Hardened => write!(f, "v3"),
        }
    }
}

/// Where the continuation flag sits relative to an encrypted chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkFraming {
    /// `true, chunk, true, chunk, …, false`
    FlagBeforeChunk,
    /// `chunk, true, chunk, …, chunk, false`, or a lone `false` when empty.
    FlagAfterChunk,
}

/// Which nonce each encrypted chunk uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonceSchedule {
    /// Every chunk reuses the archive nonce.
    Fixed,
    /// Chunk `i` of the archive uses `chunk_nonce(archive_nonce, i)`.
    PerChunk,
}

/// Decoding strategy selected once from the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadLayout {
    /// Each entry carries an "is compressed" byte before its payload.
    pub compression_flag: bool,
    /// Position of continuation flags in encrypted payloads.
    pub framing: ChunkFraming,
    /// Nonce used for each chunk.
    pub nonces: NonceSchedule,
    /// Key derivation function.
    pub kdf: KeyDerivation,
    /// Continuation flags are bound to their chunk as associated data.
    pub authenticate_flags: bool,
}

/// Feature flags fixed for the whole container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FeatureFlags(u8);

impl FeatureFlags {
    const PASSWORD: u8 = 0x01;
    const COMPRESSION: u8 = 0x02;
    const INTEGRITY: u8 = 0x04;
    const ALL: u8 = Self::PASSWORD | Self::COMPRESSION | Self::INTEGRITY;

    /// Builds flags from individual features.
    #[must_use]
    pub const fn new(password: bool, compression: bool, integrity: bool) -> Self {
        let mut bits = 0;
        if password {
            bits |= Self::PASSWORD;
        }
        if compression {
            bits |= Self::COMPRESSION;
        }
        if integrity {
            bits |= Self::INTEGRITY;
        }
        Self(bits)
    }

    /// Parses a flag byte, rejecting unknown bits.
    pub fn from_byte(byte: u8) -> Result<Self> {
        if byte & !Self::ALL != 0 {
            return Err(ArchiveError::InvalidArchive(format!(
                "unknown feature flags: {byte:#04x}"
            )));
        }
        Ok(Self(byte))
    }

    /// Raw flag byte.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Entries are encrypted.
    #[must_use]
    pub const fn password(self) -> bool {
        self.0 & Self::PASSWORD != 0
    }

    /// Entries may be compressed.
    #[must_use]
    pub const fn compression(self) -> bool {
        self.0 & Self::COMPRESSION != 0
    }

    /// Entries carry integrity metadata.
    #[must_use]
    pub const fn integrity(self) -> bool {
        self.0 & Self::INTEGRITY != 0
    }
}

/// Parsed container header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Format version.
    pub version: FormatVersion,
    /// Separator byte used in stored paths.
    pub separator: u8,
    /// Container-wide feature flags.
    pub flags: FeatureFlags,
    /// Archive nonce, present exactly when the password flag is set.
    pub nonce: Option<Nonce>,
}

impl Header {
    /// Header for a new container in the current format.
    ///
    /// The password flag is derived from the presence of `nonce`.
    #[must_use]
    pub fn new(compression: bool, integrity: bool, nonce: Option<Nonce>) -> Self {
        Self {
            version: FormatVersion::CURRENT,
            separator: host_separator(),
            flags: FeatureFlags::new(nonce.is_some(), compression, integrity),
            nonce,
        }
    }

    /// Separator as a character.
    #[must_use]
    pub fn separator_char(&self) -> char {
        char::from(self.separator)
    }

    /// Writes the header.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        if self.flags.password() != self.nonce.is_some() {
            return Err(ArchiveError::InvalidConfiguration {
                reason: "password flag and nonce presence disagree".to_string(),
            });
        }

        match self.version {
            FormatVersion::Legacy => {
                writer.write_all(LEGACY_SIGNATURE)?;
                codec::write_u8(writer, self.separator)?;
                codec::write_bool(writer, self.flags.password())?;
            }
            FormatVersion::Enhanced | FormatVersion::Hardened => {
                writer.write_all(SIGNATURE)?;
                codec::write_u8(writer, self.version.number())?;
                codec::write_u8(writer, self.separator)?;
                codec::write_u8(writer, self.flags.bits())?;
            }
        }

        if let Some(nonce) = &self.nonce {
            writer.write_all(nonce)?;
        }
        Ok(())
    }

    /// Reads and validates a header.
    ///
    /// # Errors
    ///
    /// - [`ArchiveError::SignatureMismatch`] if the input does not start
    ///   with a known signature (including input shorter than one)
    /// - [`ArchiveError::UnsupportedVersion`] for an unknown version byte
    /// - [`ArchiveError::InvalidArchive`] for unknown flags or truncation
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut magic = [0u8; SIGNATURE.len()];
        read_signature(reader, &mut magic)?;

        let version = if &magic == SIGNATURE {
            FormatVersion::from_byte(codec::read_u8(reader)?)?
        } else if magic == LEGACY_SIGNATURE[..SIGNATURE.len()] {
            let mut rest = [0u8; LEGACY_SIGNATURE.len() - SIGNATURE.len()];
            read_signature(reader, &mut rest)?;
            if rest != LEGACY_SIGNATURE[SIGNATURE.len()..] {
                return Err(ArchiveError::SignatureMismatch);
            }
            FormatVersion::Legacy
        } else {
            return Err(ArchiveError::SignatureMismatch);
        };

        let separator = codec::read_u8(reader)?;
        if !separator.is_ascii() || separator.is_ascii_alphanumeric() {
            return Err(ArchiveError::InvalidArchive(format!(
                "invalid path separator byte: {separator:#04x}"
            )));
        }

        let flags = match version {
            FormatVersion::Legacy => FeatureFlags::new(codec::read_bool(reader)?, false, false),
            FormatVersion::Enhanced | FormatVersion::Hardened => {
                FeatureFlags::from_byte(codec::read_u8(reader)?)?
            }
        };

        let nonce = if flags.password() {
            Some(codec::read_array::<_, NONCE_LEN>(reader)?)
        } else {
            None
        };

        Ok(Self {
            version,
            separator,
            flags,
            nonce,
        })
    }
}

/// The platform path separator as a byte.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn host_separator() -> u8 {
    // Both '/' and '\\' are ASCII.
    std::path::MAIN_SEPARATOR as u8
}

fn read_signature<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            ArchiveError::SignatureMismatch
        } else {
            ArchiveError::Io(e)
        }
    })
}
