//! Provides the persistence and indexing layer for managing imported study
//! materials.
//!
//! This module defines the core structures and logic for turning a raw file
//! selection into an organized, durable, searchable library. It establishes
//! conventions for how folders, notes, and their content payloads are
//! represented in memory and on disk.
//!
//! # Core Concepts
//!
//! *   **[`Library`]:** The root application-state object. A library
//!     corresponds to a data directory on the filesystem holding one redb
//!     database file. It exclusively owns the in-memory collections of
//!     folders, notes, favorites, and recently used notes, and is the only
//!     writer of entity state. Users typically start by [`Library::open`]ing
//!     a library and importing files into it.
//! *   **[`Folder`]:** A virtual directory node in the imported hierarchy,
//!     identified by a slash-separated path unique within the tree. Folders
//!     are created top-down during import, so the parent always exists
//!     before its children and the tree is acyclic by construction.
//! *   **[`Note`]:** A single imported document's metadata. For text and
//!     markdown notes a bounded preview of the content is kept inline for
//!     fast listing; the full payload always lives in the content store.
//! *   **[`ContentStore`]:** The durable key-value tier holding full content
//!     payloads keyed by note id, separate from metadata so multi-megabyte
//!     documents never travel through the metadata serialization path.
//!
//! # Metadata / content split
//!
//! Every mutation applies to the in-memory collections first and then
//! flushes a metadata snapshot (folders, note metadata, favorites, recents,
//! settings) to the durable tier in a single transaction. Content payloads
//! are written separately, keyed by note id. This yields read-your-writes
//! against the in-memory state and eventual consistency against disk: a
//! crash between a mutation and its flush loses that mutation. For a local
//! personal tool this is an accepted gap; see [`Library::flush`].
//!
//! # Asynchronous API
//!
//! All durable-storage access within this module is `async` and relies on
//! the `tokio` runtime. Methods that perform I/O return `Result<T, Error>`.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use satchel_core::library::Library;
//! use tempfile::tempdir;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dir = tempdir()?;
//!     let mut library = Library::open(dir.path()).await?;
//!
//!     library.import_directory(&std::path::PathBuf::from("notes")).await?;
//!
//!     for note in library.notes() {
//!         println!("{} ({})", note.title, note.path);
//!     }
//!     Ok(())
//! }
//! ```

pub use self::content::{ContentStore, encode_data_uri};
pub use self::import::ImportFile;
pub use self::model::{
    Crumb, FileType, Folder, Note, NoteUpdate, PreviewQuality, ResultKind, SearchCategory,
    SearchResult, Settings, SortDirection, SortKey, Theme, ViewMode,
};
pub use self::repository::Library;
pub use self::snapshot::Snapshot;

mod content;
mod import;
mod model;
mod repository;
mod search;
mod snapshot;

use std::path::PathBuf;
use thiserror::Error;

/// File name of the redb database inside a library's data directory.
pub const DB_FILE_NAME: &str = "satchel.redb";

/// Maximum length, in characters, of the inline content preview kept in
/// note metadata for text and markdown notes.
pub const PREVIEW_LEN: usize = 1000;

/// Maximum number of entries in the recently-used note list.
pub const RECENT_LIMIT: usize = 10;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("Path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Durable storage error: {0}")]
    Storage(String),

    #[error("Snapshot serialization/deserialization error")]
    Snapshot(#[from] serde_json::Error),

    #[error("IO error")]
    Io(#[from] std::io::Error),
}

// Define a standard Result type for the library
pub type Result<T> = std::result::Result<T, Error>;
