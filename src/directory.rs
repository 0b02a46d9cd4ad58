//! Attribute Directory
//!
//! Bounded table mapping attribute IDs to their location in the medium.
//!
//! ## Record Format
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ EntryCount: u8 (1) | TotalPayloadSize: u32 (4)          │
//! ├─────────────────────────────────────────────────────────┤
//! │ Entries (CAPACITY x 6 bytes, unused slots zeroed)       │
//! │   [AttrId: u8][Length: u8][Offset: u32]                 │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! The whole array is always encoded, so the record has the same size
//! whatever the entry count. Integers are little-endian (bincode defaults).

use serde::{Deserialize, Serialize};

use crate::error::{NvmError, Result};

/// One-byte attribute identifier
pub type AttrId = u8;

/// Maximum number of attributes in the directory
pub const CAPACITY: usize = 10;

/// Encoded size of the directory record: 1 + 4 + CAPACITY * (1 + 1 + 4)
pub const DIRECTORY_RECORD_SIZE: u32 = 65;

/// Largest payload region a full directory can describe
const MAX_PAYLOAD_SIZE: u32 = CAPACITY as u32 * u8::MAX as u32;

/// Location and size of one stored attribute
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub attribute_id: AttrId,
    pub length: u8,
    /// Absolute offset of the value in the medium
    pub offset: u32,
}

/// In-memory mirror of the directory record at offset 0
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directory {
    entry_count: u8,
    total_payload_size: u32,
    entries: [DirectoryEntry; CAPACITY],
}

impl Directory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Find the entry for `attribute_id` (linear scan, first match)
    pub fn lookup(&self, attribute_id: AttrId) -> Option<DirectoryEntry> {
        self.entries()
            .iter()
            .find(|entry| entry.attribute_id == attribute_id)
            .copied()
    }

    /// Add an entry for a new attribute at the end of the payload region
    ///
    /// The change only exists in memory until the caller persists the
    /// record; see [`Directory::rollback_last`]. An ID already present is
    /// rejected with `DuplicateAttr`.
    pub fn append_entry(&mut self, attribute_id: AttrId, length: u8) -> Result<DirectoryEntry> {
        if self.lookup(attribute_id).is_some() {
            return Err(NvmError::DuplicateAttr(attribute_id));
        }
        if self.is_full() {
            return Err(NvmError::MemFull { capacity: CAPACITY });
        }

        let entry = DirectoryEntry {
            attribute_id,
            length,
            offset: self.next_offset(),
        };

        self.entries[self.len()] = entry;
        self.total_payload_size += u32::from(length);
        self.entry_count += 1;

        Ok(entry)
    }

    /// Undo the most recent [`Directory::append_entry`]
    pub fn rollback_last(&mut self) -> Option<DirectoryEntry> {
        if self.is_empty() {
            return None;
        }

        let last = self.len() - 1;
        let entry = std::mem::take(&mut self.entries[last]);
        self.total_payload_size -= u32::from(entry.length);
        self.entry_count -= 1;

        Some(entry)
    }

    /// Offset at which the next new attribute will be stored
    pub fn next_offset(&self) -> u32 {
        DIRECTORY_RECORD_SIZE + self.total_payload_size
    }

    /// Live entries, in insertion order
    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries[..self.len()]
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        usize::from(self.entry_count)
    }

    pub fn is_empty(&self) -> bool {
        self.entry_count == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() == CAPACITY
    }

    /// Sum of the lengths of all live entries
    pub fn total_payload_size(&self) -> u32 {
        self.total_payload_size
    }

    // =========================================================================
    // Record Codec
    // =========================================================================

    /// Encode into a `DIRECTORY_RECORD_SIZE`-byte record
    pub fn encode(&self) -> Result<Vec<u8>> {
        let bytes = bincode::serialize(self)?;
        debug_assert_eq!(bytes.len(), DIRECTORY_RECORD_SIZE as usize);
        Ok(bytes)
    }

    /// Decode a record read from offset 0
    ///
    /// Only the record size, the entry count and the payload size bound are
    /// checked; the entries themselves are taken as they are.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != DIRECTORY_RECORD_SIZE as usize {
            return Err(NvmError::CorruptDirectory(format!(
                "record is {} bytes, expected {}",
                bytes.len(),
                DIRECTORY_RECORD_SIZE
            )));
        }

        let directory: Directory = bincode::deserialize(bytes)?;

        if directory.len() > CAPACITY {
            return Err(NvmError::CorruptDirectory(format!(
                "entry count {} exceeds capacity {}",
                directory.entry_count, CAPACITY
            )));
        }

        if directory.total_payload_size > MAX_PAYLOAD_SIZE {
            return Err(NvmError::CorruptDirectory(format!(
                "total payload size {} exceeds {}",
                directory.total_payload_size, MAX_PAYLOAD_SIZE
            )));
        }

        Ok(directory)
    }

    /// Check uniqueness of IDs, contiguous packing and the payload size sum
    pub fn check_invariants(&self) -> Result<()> {
        let mut expected_offset = DIRECTORY_RECORD_SIZE;

        for (i, entry) in self.entries().iter().enumerate() {
            if self.entries()[..i]
                .iter()
                .any(|prev| prev.attribute_id == entry.attribute_id)
            {
                return Err(NvmError::CorruptDirectory(format!(
                    "attribute {} listed more than once",
                    entry.attribute_id
                )));
            }

            if entry.offset != expected_offset {
                return Err(NvmError::CorruptDirectory(format!(
                    "entry {} (attribute {}) at offset {}, expected {}",
                    i, entry.attribute_id, entry.offset, expected_offset
                )));
            }

            expected_offset += u32::from(entry.length);
        }

        let sum = expected_offset - DIRECTORY_RECORD_SIZE;
        if sum != self.total_payload_size {
            return Err(NvmError::CorruptDirectory(format!(
                "total payload size {} does not match sum of lengths {}",
                self.total_payload_size, sum
            )));
        }

        Ok(())
    }
}
