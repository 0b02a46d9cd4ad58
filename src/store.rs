//! Attribute Store
//!
//! Public API tying the directory to the medium.
//!
//! ## Responsibilities
//! - Load (or bootstrap) the directory on init
//! - Serve reads through directory lookups
//! - Append new attributes and persist the directory
//! - Overwrite existing attributes in place, keeping their length fixed

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::directory::{AttrId, Directory, DirectoryEntry, CAPACITY, DIRECTORY_RECORD_SIZE};
use crate::error::{NvmError, Result};
use crate::storage::{FileMedium, Medium};

/// Fixed-length attribute store over a persistent medium
///
/// The in-memory directory always matches the record persisted at offset 0:
/// a new entry is only kept once the record has been written and verified.
///
/// Writes take `&mut self`; a store is meant to have a single owner.
pub struct AttributeStore<M: Medium = FileMedium> {
    /// Backing medium
    medium: M,

    /// Mirror of the directory record
    directory: Directory,
}

impl AttributeStore<FileMedium> {
    /// Open the file-backed store described by `config`
    ///
    /// With `create_if_missing` unset, a missing medium file is an error
    /// rather than a fresh, empty store.
    pub fn open(config: &Config) -> Result<Self> {
        let medium = FileMedium::from_config(config);

        if !config.create_if_missing && !medium.exists() {
            return Err(NvmError::MediumNotFound(config.medium_path.clone()));
        }

        Self::init(medium)
    }
}

impl<M: Medium> AttributeStore<M> {
    /// Load the directory from `medium`, creating it when the medium holds
    /// no record yet
    pub fn init(medium: M) -> Result<Self> {
        let mut store = Self {
            medium,
            directory: Directory::new(),
        };
        store.reload()?;
        Ok(store)
    }

    /// Re-read the directory record from offset 0
    ///
    /// Steps:
    /// 1. Read DIRECTORY_RECORD_SIZE bytes at offset 0
    /// 2. Missing or empty medium: persist an empty directory with append
    /// 3. Any other failure: give up without writing anything
    ///
    /// Failures, including a record that does not decode, are returned as
    /// `MemError`. The in-memory directory is only replaced on success.
    pub fn reload(&mut self) -> Result<()> {
        let directory = match self.medium.read(0, DIRECTORY_RECORD_SIZE as usize) {
            Ok(record) => Directory::decode(&record).map_err(|e| {
                warn!(error = %e, "Failed to decode directory record");
                NvmError::mem(e)
            })?,
            Err(err) if err.is_missing_record() => {
                info!("No directory record found, creating an empty one");
                let directory = Directory::new();
                let record = directory.encode()?;
                self.medium.append(0, &record).map_err(NvmError::mem)?;
                directory
            }
            Err(err) => {
                warn!(error = %err, "Failed to read directory record");
                return Err(NvmError::mem(err));
            }
        };

        self.directory = directory;
        self.log_directory();
        Ok(())
    }

    /// Read an attribute
    ///
    /// Returns the attribute's length together with its value.
    pub fn get_attribute(&self, attribute_id: AttrId) -> Result<(u8, Vec<u8>)> {
        let entry = self
            .directory
            .lookup(attribute_id)
            .ok_or(NvmError::AttrNotFound(attribute_id))?;

        let value = self
            .medium
            .read(entry.offset, usize::from(entry.length))
            .map_err(|e| {
                warn!(attribute_id, offset = entry.offset, error = %e, "Failed to read attribute");
                NvmError::mem(e)
            })?;

        debug!(attribute_id, length = entry.length, offset = entry.offset, "Read attribute");
        Ok((entry.length, value))
    }

    /// Write an attribute
    ///
    /// A new ID is appended to the payload region; an existing ID is
    /// overwritten in place and must keep its original length.
    pub fn set_attribute(&mut self, attribute_id: AttrId, length: u8, value: &[u8]) -> Result<()> {
        if value.len() != usize::from(length) {
            return Err(NvmError::ValueLength {
                declared: length,
                actual: value.len(),
            });
        }

        match self.directory.lookup(attribute_id) {
            Some(entry) => self.overwrite(entry, length, value),
            None => self.insert(attribute_id, length, value),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The in-memory directory
    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    pub fn medium(&self) -> &M {
        &self.medium
    }

    /// Mutable access to the medium, bypassing the directory
    pub fn medium_mut(&mut self) -> &mut M {
        &mut self.medium
    }

    /// IDs of all stored attributes, in insertion order
    pub fn attribute_ids(&self) -> impl Iterator<Item = AttrId> + '_ {
        self.directory.entries().iter().map(|entry| entry.attribute_id)
    }

    pub fn contains(&self, attribute_id: AttrId) -> bool {
        self.directory.lookup(attribute_id).is_some()
    }

    /// Number of stored attributes
    pub fn len(&self) -> usize {
        self.directory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directory.is_empty()
    }

    /// Give back the medium
    pub fn into_medium(self) -> M {
        self.medium
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn overwrite(&mut self, entry: DirectoryEntry, length: u8, value: &[u8]) -> Result<()> {
        // Fixed-length semantics: no resize path
        if entry.length != length {
            return Err(NvmError::AttrLenDiff {
                id: entry.attribute_id,
                stored: entry.length,
                requested: length,
            });
        }

        self.medium.update(entry.offset, value).map_err(|e| {
            warn!(attribute_id = entry.attribute_id, offset = entry.offset, error = %e, "Failed to update attribute");
            NvmError::mem(e)
        })?;

        debug!(
            attribute_id = entry.attribute_id,
            length,
            offset = entry.offset,
            "Updated attribute"
        );
        Ok(())
    }

    fn insert(&mut self, attribute_id: AttrId, length: u8, value: &[u8]) -> Result<()> {
        if self.directory.is_full() {
            return Err(NvmError::MemFull { capacity: CAPACITY });
        }

        // Step 1: Payload first; the directory is untouched if this fails
        let offset = self.directory.next_offset();
        self.medium.append(offset, value).map_err(|e| {
            warn!(attribute_id, offset, error = %e, "Failed to append attribute");
            NvmError::mem(e)
        })?;

        // Step 2: Provisional directory entry
        let entry = self.directory.append_entry(attribute_id, length)?;
        debug_assert_eq!(entry.offset, offset);

        // Step 3: Persist the record, rolling back on failure. The payload
        // bytes written in step 1 are discarded by the next append.
        if let Err(e) = self.persist_directory() {
            self.directory.rollback_last();
            warn!(
                attribute_id,
                offset,
                error = %e,
                "Failed to persist directory, new attribute rolled back"
            );
            return Err(NvmError::mem(e));
        }

        debug!(attribute_id, length, offset, "Added attribute");
        Ok(())
    }

    fn persist_directory(&mut self) -> Result<()> {
        let record = self.directory.encode()?;
        self.medium.update(0, &record)
    }

    fn log_directory(&self) {
        info!(
            num_entries = self.directory.len(),
            total_size = self.directory.total_payload_size(),
            "Attribute directory loaded"
        );
        for (i, entry) in self.directory.entries().iter().enumerate() {
            info!(
                index = i,
                attribute_id = entry.attribute_id,
                offset = entry.offset,
                length = entry.length,
                "Directory entry"
            );
        }

        if let Err(e) = self.directory.check_invariants() {
            warn!(error = %e, "Directory record is inconsistent");
        }
    }
}
