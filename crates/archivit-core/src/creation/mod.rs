//! Archive creation.
//!
//! [`walker`] classifies the source tree, [`writer`] turns files into
//! entries and [`creator`] ties both to a destination file.

pub mod config;
pub mod creator;
pub mod filters;
pub mod report;
pub mod walker;
pub mod writer;

pub use config::CreationConfig;
pub use creator::ArchiveCreator;
pub use report::CreationReport;
pub use walker::EntryKind;
pub use walker::FilteredWalker;
pub use walker::WalkEntry;
pub use writer::ArchiveWriter;
pub use writer::EntryOutcome;
