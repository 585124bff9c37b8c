//! Container framing: header, format versions and entry records.
//!
//! A container is a header followed by entries, each laid out as
//!
//! ```text
//! metadata frame (i64 length + EntryMetadata)
//! integrity frame (i16 length + 45 bytes)   if the integrity flag is set
//! compressed flag (1 byte)                   except in legacy containers
//! payload                                    raw, or a chunk stream when encrypted
//! ```

pub mod entry;
pub mod header;

pub use entry::EntryMetadata;
pub use header::ChunkFraming;
pub use header::EXTENSION;
pub use header::FeatureFlags;
pub use header::FormatVersion;
pub use header::Header;
pub use header::NonceSchedule;
pub use header::PayloadLayout;

use crate::codec::LengthPrefix;

/// Prefix of the integrity metadata frame.
pub const INTEGRITY_PREFIX: LengthPrefix = LengthPrefix::Short;

/// Prefix of each ciphertext chunk frame.
pub const CHUNK_PREFIX: LengthPrefix = LengthPrefix::Long;

/// Default amount of stored bytes encrypted per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Largest ciphertext chunk a reader accepts.
pub const MAX_CHUNK_FRAME: u64 = 64 * 1024 * 1024;
