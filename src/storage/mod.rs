//! Storage Module
//!
//! Offset-based access to the persistent medium.
//!
//! ## Responsibilities
//! - Read `len` bytes at an offset
//! - Overwrite bytes in place (update)
//! - Append bytes at the end of the medium
//! - Verify every write by reading it back
//!
//! ## Medium Layout
//! ```text
//! ┌────────────────────────────────────────┐
//! │ Directory record (fixed size)          │
//! │ ┌──────────┬──────────┬──────────────┐ │
//! │ │Count (1) │ Total (4)│ Entries (60) │ │
//! │ └──────────┴──────────┴──────────────┘ │
//! ├────────────────────────────────────────┤
//! │ Payload region                         │
//! │ ┌────────┬────────┬─────┬───────────┐ │
//! │ │ Attr 1 │ Attr 2 │ ... │  Attr N   │ │
//! │ └────────┴────────┴─────┴───────────┘ │
//! │ (packed in insertion order, no gaps)  │
//! └────────────────────────────────────────┘
//! ```
//!
//! The medium knows nothing about the layout above: it only moves bytes.
//! Directory and store logic live in [`crate::directory`] and
//! [`crate::store`].

mod file;
mod io;
mod memory;

pub use file::FileMedium;
pub use memory::MemoryMedium;

use crate::error::Result;

/// A byte-addressable persistent medium
///
/// Every successful `update` or `append` has already been read back and
/// compared against the input. A `VerificationFailed` error means the bytes
/// were written but did not read back correctly; the write may or may not
/// have landed.
pub trait Medium {
    /// Read exactly `len` bytes starting at `offset`
    ///
    /// Fails with `Seek` if `offset` lies past the end of the medium and
    /// with `ShortRead` if fewer than `len` bytes are available.
    fn read(&self, offset: u32, len: usize) -> Result<Vec<u8>>;

    /// Overwrite `bytes.len()` bytes at `offset`, then verify them
    fn update(&mut self, offset: u32, bytes: &[u8]) -> Result<()>;

    /// Append `bytes` at the end of the medium, then verify them at `offset`
    ///
    /// `offset` is the caller's logical end of the medium. Bytes past it
    /// (left behind by an insert that was rolled back) are discarded before
    /// writing, so the data lands at `offset`. If the medium is shorter than
    /// `offset`, the bytes land at the physical end and verification fails.
    fn append(&mut self, offset: u32, bytes: &[u8]) -> Result<()>;
}

impl<M: Medium + ?Sized> Medium for Box<M> {
    fn read(&self, offset: u32, len: usize) -> Result<Vec<u8>> {
        (**self).read(offset, len)
    }

    fn update(&mut self, offset: u32, bytes: &[u8]) -> Result<()> {
        (**self).update(offset, bytes)
    }

    fn append(&mut self, offset: u32, bytes: &[u8]) -> Result<()> {
        (**self).append(offset, bytes)
    }
}
