//! File Medium
//!
//! A flat file standing in for raw non-volatile memory.

use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::{Config, SyncPolicy};
use crate::error::{NvmError, Result};

use super::io::{read_counted, seek_to, verify_written, write_bytes};
use super::Medium;

/// File-backed medium
///
/// No handle is kept between calls: every read, update and append opens
/// the file, does its work and closes it again.
#[derive(Debug, Clone)]
pub struct FileMedium {
    /// Path of the medium file
    path: PathBuf,
    /// Whether writes are fsynced before verification
    sync_policy: SyncPolicy,
}

impl FileMedium {
    /// Create a medium for the given path (the file itself is created lazily
    /// by the first append)
    pub fn new(path: impl Into<PathBuf>, sync_policy: SyncPolicy) -> Self {
        Self {
            path: path.into(),
            sync_policy,
        }
    }

    /// Create a medium from the store configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.medium_path, config.sync_policy)
    }

    /// Path of the medium file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the medium file exists
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Physical length of the medium in bytes
    pub fn len(&self) -> Result<u64> {
        let file = self.open(OpenOptions::new().read(true))?;
        Ok(file.metadata()?.len())
    }

    /// Whether the medium is missing or holds no bytes
    pub fn is_empty(&self) -> Result<bool> {
        match self.len() {
            Ok(len) => Ok(len == 0),
            Err(NvmError::MediumNotFound(_)) => Ok(true),
            Err(e) => Err(e),
        }
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn open(&self, options: &OpenOptions) -> Result<File> {
        options.open(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => NvmError::MediumNotFound(self.path.clone()),
            _ => NvmError::Io(e),
        })
    }

    fn sync(&self, file: &File) -> Result<()> {
        if self.sync_policy == SyncPolicy::EveryWrite {
            file.sync_data()?;
        }
        Ok(())
    }
}

impl Medium for FileMedium {
    fn read(&self, offset: u32, len: usize) -> Result<Vec<u8>> {
        let mut file = self.open(OpenOptions::new().read(true))?;
        let medium_len = file.metadata()?.len();

        seek_to(&mut file, offset, medium_len)?;
        read_counted(&mut file, offset, len)
    }

    fn update(&mut self, offset: u32, bytes: &[u8]) -> Result<()> {
        let mut file = self.open(OpenOptions::new().read(true).write(true))?;
        let medium_len = file.metadata()?.len();

        seek_to(&mut file, offset, medium_len)?;
        write_bytes(&mut file, offset, bytes)?;
        self.sync(&file)?;

        verify_written(&mut file, offset, bytes).map_err(|e| {
            warn!(path = %self.path.display(), offset, len = bytes.len(), "Incorrect data after update");
            e
        })?;

        debug!(offset, len = bytes.len(), "Updated medium");
        Ok(())
    }

    fn append(&mut self, offset: u32, bytes: &[u8]) -> Result<()> {
        let mut file = self.open(OpenOptions::new().read(true).append(true).create(true))?;
        let medium_len = file.metadata()?.len();

        if medium_len > u64::from(offset) {
            warn!(
                path = %self.path.display(),
                logical = offset,
                physical = medium_len,
                "Discarding unreferenced bytes past logical end of medium"
            );
            file.set_len(u64::from(offset))?;
        } else if medium_len < u64::from(offset) {
            warn!(
                path = %self.path.display(),
                logical = offset,
                physical = medium_len,
                "Medium is shorter than its logical end"
            );
        }

        write_bytes(&mut file, offset, bytes)?;
        self.sync(&file)?;

        verify_written(&mut file, offset, bytes).map_err(|e| {
            warn!(path = %self.path.display(), offset, len = bytes.len(), "Incorrect data after append");
            e
        })?;

        debug!(offset, len = bytes.len(), "Appended to medium");
        Ok(())
    }
}
