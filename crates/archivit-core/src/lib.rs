//! Single-file archive container with chunked encryption, compression and
//! integrity metadata.
//!
//! `archivit-core` packs a directory tree into one `.archivit` file. Each
//! entry can be DEFLATE-compressed, carry a SHA-256/CRC-32 integrity record,
//! and be encrypted with AES-128-GCM in fixed-size chunks so files of any
//! size stream through without being buffered whole.
//!
//! # Examples
//!
//! ```no_run
//! use archivit_core::create_archive;
//! use archivit_core::creation::CreationConfig;
//! use archivit_core::crypto::Password;
//! use archivit_core::extract_archive;
//! use archivit_core::extraction::ExtractionConfig;
//!
//! let password = Password::new("secret1")?;
//!
//! let config = CreationConfig::default().with_password(Some(password.clone()));
//! create_archive("photos/", "photos.archivit", &config)?;
//!
//! let config = ExtractionConfig::default().with_password(Some(password));
//! let report = extract_archive("photos.archivit", "restored/", &config)?;
//! println!("Extracted {} files", report.files_extracted);
//! # Ok::<(), archivit_core::ArchiveError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod codec;
pub mod creation;
pub mod crypto;
pub mod error;
pub mod extraction;
pub mod format;
pub mod inspection;
pub mod integrity;
pub mod io;
pub mod report;
pub mod types;

// Re-export main API types
pub use api::create_archive;
pub use api::create_archive_with_progress;
pub use api::extract_archive;
pub use api::extract_archive_with_progress;
pub use error::ArchiveError;
pub use error::ErrorCategory;
pub use error::Result;
pub use inspection::list_archive;
pub use inspection::verify_archive;
pub use report::ExtractionReport;
pub use report::NoopProgress;
pub use report::ProgressCallback;

// Re-export types module for easier access
pub use types::DestDir;
pub use types::SafePath;
