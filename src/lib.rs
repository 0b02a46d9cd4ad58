//! # gpnvm
//!
//! A general purpose attribute store for non-volatile memory:
//! - Fixed-length binary attributes keyed by a one-byte ID
//! - Directory of up to ten attributes persisted at offset 0
//! - Read-after-write verification of every update and append
//! - Pluggable medium (flat file, in-memory)
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     AttributeStore                           │
//! │        init / get_attribute / set_attribute                  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  Directory  │          │   Medium    │
//!   │ (in memory) │ persist  │ read/update │
//!   │             │ ───────▶ │  /append    │
//!   └─────────────┘          └──────┬──────┘
//!                                   │
//!                                   ▼
//!                           ┌─────────────┐
//!                           │   nvm.bin   │
//!                           └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use gpnvm::{AttributeStore, Config};
//!
//! let config = Config::builder().medium_path("nvm.bin").build();
//! let mut store = AttributeStore::open(&config)?;
//!
//! store.set_attribute(1, 4, &42u32.to_le_bytes())?;
//! let (length, value) = store.get_attribute(1)?;
//! assert_eq!(length, 4);
//! assert_eq!(value, 42u32.to_le_bytes());
//! # Ok::<(), gpnvm::NvmError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod storage;
pub mod directory;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{NvmError, Result};
pub use config::{Config, SyncPolicy};
pub use directory::{AttrId, Directory, DirectoryEntry, CAPACITY, DIRECTORY_RECORD_SIZE};
pub use storage::{FileMedium, Medium, MemoryMedium};
pub use store::AttributeStore;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of gpnvm
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
