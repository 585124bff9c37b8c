//! Archive extraction.
//!
//! [`reader`] walks a container entry by entry and decrypts payloads;
//! the extract step writes them below a destination directory.

pub mod config;
pub(crate) mod extract;
pub mod reader;

pub use config::ExtractionConfig;
pub use reader::ArchiveReader;
pub use reader::DecodedPayload;
pub use reader::EntryHeader;
