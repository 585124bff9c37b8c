//! Validated path types used during extraction.
//!
//! Both types are checked on construction and have no conversions from raw
//! paths, so an unchecked path cannot reach the filesystem by accident.

pub mod dest_dir;
pub mod safe_path;

pub use dest_dir::DestDir;
pub use safe_path::SafePath;
