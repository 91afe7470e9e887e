//! File-backed persistence: workspace layout, atomic JSON writes, tally state,
//! session, backups, and the Discord message-id map.

/// Backup snapshots, restore, and the browser-facing backup index.
pub mod backup;
/// Logical-key to Discord message-id mapping.
pub mod message_map;
/// Tally state, session, and audit events.
pub mod tally;
mod workspace;

use std::{io, path::PathBuf};

use thiserror::Error;

pub use workspace::{Workspace, write_atomic};

#[cfg(test)]
pub(crate) use workspace::testutil;

/// Result alias for persistence operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Error raised by the file-backed stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading a file failed.
    #[error("reading {path}: {source}")]
    Read {
        /// Path that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Writing a file failed.
    #[error("writing {path}: {source}")]
    Write {
        /// Path that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// A file did not contain the expected JSON document.
    #[error("parsing {path}: {source}")]
    Parse {
        /// Path of the malformed document.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// Encoding a document to JSON failed.
    #[error("encoding {path}: {source}")]
    Encode {
        /// Destination path of the document.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// A named backup does not exist.
    #[error("backup `{0}` not found")]
    BackupNotFound(String),
}
