//! In-memory medium, mainly for tests and benchmarks.

use std::io::{Cursor, Seek, SeekFrom};

use tracing::warn;

use crate::error::Result;

use super::io::{read_counted, seek_to, verify_written, write_bytes};
use super::Medium;

/// Volatile medium backed by a `Vec<u8>`
///
/// Same contract as [`super::FileMedium`], including write verification.
#[derive(Debug, Clone, Default)]
pub struct MemoryMedium {
    bytes: Vec<u8>,
}

impl MemoryMedium {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing image of the medium
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl Medium for MemoryMedium {
    fn read(&self, offset: u32, len: usize) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(self.bytes.as_slice());
        seek_to(&mut cursor, offset, self.bytes.len() as u64)?;
        read_counted(&mut cursor, offset, len)
    }

    fn update(&mut self, offset: u32, bytes: &[u8]) -> Result<()> {
        let medium_len = self.bytes.len() as u64;
        let mut cursor = Cursor::new(&mut self.bytes);

        seek_to(&mut cursor, offset, medium_len)?;
        write_bytes(&mut cursor, offset, bytes)?;
        verify_written(&mut cursor, offset, bytes)
    }

    fn append(&mut self, offset: u32, bytes: &[u8]) -> Result<()> {
        let logical_end = offset as usize;

        if self.bytes.len() > logical_end {
            warn!(
                logical = offset,
                physical = self.bytes.len(),
                "Discarding unreferenced bytes past logical end of medium"
            );
            self.bytes.truncate(logical_end);
        } else if self.bytes.len() < logical_end {
            warn!(
                logical = offset,
                physical = self.bytes.len(),
                "Medium is shorter than its logical end"
            );
        }

        let mut cursor = Cursor::new(&mut self.bytes);
        cursor.seek(SeekFrom::End(0))?;
        write_bytes(&mut cursor, offset, bytes)?;
        verify_written(&mut cursor, offset, bytes)
    }
}
