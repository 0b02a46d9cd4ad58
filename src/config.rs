//! Configuration for gpnvm
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

/// Main configuration for a file-backed attribute store
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Medium Configuration
    // -------------------------------------------------------------------------
    /// Flat file standing in for the non-volatile memory.
    /// Layout:
    ///   [0, DIRECTORY_RECORD_SIZE)   directory record
    ///   [DIRECTORY_RECORD_SIZE, ..)  attribute payloads
    pub medium_path: PathBuf,

    /// Sync strategy: whether writes are fsynced before verification
    pub sync_policy: SyncPolicy,

    // -------------------------------------------------------------------------
    // Bootstrap Configuration
    // -------------------------------------------------------------------------
    /// Create an empty directory when the medium does not exist yet
    pub create_if_missing: bool,
}

/// Medium sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPolicy {
    /// fsync after every update/append (safest, slowest)
    EveryWrite,

    /// Leave flushing to the OS page cache
    OsBuffered,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            medium_path: PathBuf::from("nvm.bin"),
            sync_policy: SyncPolicy::EveryWrite,
            create_if_missing: true,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the path of the medium file
    pub fn medium_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.medium_path = path.into();
        self
    }

    /// Set the sync policy
    pub fn sync_policy(mut self, policy: SyncPolicy) -> Self {
        self.config.sync_policy = policy;
        self
    }

    /// Allow or forbid bootstrapping a missing medium
    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.config.create_if_missing = create;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
