//! I/O adapters shared by creation and extraction.

pub mod digest;
pub(crate) mod inflate;
pub(crate) mod partial;

pub use digest::DigestWriter;
pub(crate) use inflate::Inflate;
pub(crate) use partial::PartialFileGuard;
