//! Archive inspection without extraction.
//!
//! Listing skips payloads and needs no password. Verification decodes every
//! payload into a sink and checks it, writing nothing to disk.
//!
//! # Examples
//!
//! ```no_run
//! use archivit_core::list_archive;
//! use archivit_core::verify_archive;
//!
//! let manifest = list_archive("photos.archivit")?;
//! println!("Archive contains {} files", manifest.total_entries);
//!
//! let report = verify_archive("photos.archivit", None)?;
//! if report.is_ok() {
//!     println!("Archive is intact");
//! }
//! # Ok::<(), archivit_core::ArchiveError>(())
//! ```

pub mod list;
pub mod manifest;
pub mod report;
pub mod verify;

pub use list::list_archive;
pub use manifest::ArchiveEntry;
pub use manifest::ArchiveManifest;
pub use report::IssueKind;
pub use report::VerificationIssue;
pub use report::VerificationReport;
pub use report::VerificationStatus;
pub use verify::verify_archive;
