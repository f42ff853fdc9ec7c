//! Durable key-value tier for full content payloads and the metadata
//! snapshot, backed by redb.
//!
//! Three logical stores live in one database file: `metadata` (one
//! JSON-serialized snapshot per top-level key), `file_content` (note id →
//! encoded payload), and `search_index`, reserved for future token-index
//! persistence. Each operation runs in its own transaction; callers
//! sequence multi-key batches.

use std::path::Path;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use redb::{Database, TableDefinition};
use tracing::debug;
use uuid::Uuid;

use crate::library::model::FileType;
use crate::library::{DB_FILE_NAME, Error, Result};

const METADATA_TABLE: TableDefinition<&str, &str> = TableDefinition::new("metadata");
const FILE_CONTENT_TABLE: TableDefinition<&str, &str> = TableDefinition::new("file_content");
// Reserved for future token-index persistence; created but not yet written.
const SEARCH_INDEX_TABLE: TableDefinition<&str, &str> = TableDefinition::new("search_index");

/// Encodes a payload as a self-describing data URI, so a single string
/// value carries both the MIME type and the content.
pub fn encode_data_uri(kind: FileType, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", kind.mime_str(), BASE64.encode(bytes))
}

/// Durable content store, keyed by note id.
///
/// Payloads are decoupled from note metadata: not-found on [`get`] is not
/// an error condition, and callers fall back to any inline preview. Disk
/// usage is proportional to total imported file size.
///
/// [`get`]: ContentStore::get
pub struct ContentStore {
    db: Arc<Database>,
}

impl ContentStore {
    /// Opens (or creates) the store inside the given data directory.
    ///
    /// All three object stores are created up front so that later read
    /// transactions never encounter a missing table.
    pub async fn open(data_dir: &Path) -> Result<Self> {
        let data_dir = data_dir.to_path_buf();
        run_blocking(move || {
            std::fs::create_dir_all(&data_dir).map_err(Error::Io)?;
            let db_path = data_dir.join(DB_FILE_NAME);
            let db = Database::create(&db_path).map_err(storage_err)?;

            let txn = db.begin_write().map_err(storage_err)?;
            txn.open_table(METADATA_TABLE).map_err(storage_err)?;
            txn.open_table(FILE_CONTENT_TABLE).map_err(storage_err)?;
            txn.open_table(SEARCH_INDEX_TABLE).map_err(storage_err)?;
            txn.commit().map_err(storage_err)?;

            debug!("Content store opened at {}", db_path.display());
            Ok(ContentStore { db: Arc::new(db) })
        })
        .await
    }

    /// Stores a payload under the given note id, overwriting any previous
    /// value, in a single transaction.
    pub async fn put(&self, id: Uuid, payload: String) -> Result<()> {
        let db = self.db.clone();
        run_blocking(move || {
            let txn = db.begin_write().map_err(storage_err)?;
            {
                let mut table = txn.open_table(FILE_CONTENT_TABLE).map_err(storage_err)?;
                table
                    .insert(id.to_string().as_str(), payload.as_str())
                    .map_err(storage_err)?;
            }
            txn.commit().map_err(storage_err)?;
            Ok(())
        })
        .await
    }

    /// Reads a payload by note id. Returns `Ok(None)` if no payload is
    /// stored under the id.
    pub async fn get(&self, id: Uuid) -> Result<Option<String>> {
        let db = self.db.clone();
        run_blocking(move || {
            let txn = db.begin_read().map_err(storage_err)?;
            let table = txn.open_table(FILE_CONTENT_TABLE).map_err(storage_err)?;
            let value = table
                .get(id.to_string().as_str())
                .map_err(storage_err)?
                .map(|guard| guard.value().to_string());
            Ok(value)
        })
        .await
    }

    /// Deletes the payload stored under the given note id. Deleting an
    /// absent payload succeeds (treated as already deleted).
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let db = self.db.clone();
        run_blocking(move || {
            let txn = db.begin_write().map_err(storage_err)?;
            {
                let mut table = txn.open_table(FILE_CONTENT_TABLE).map_err(storage_err)?;
                table
                    .remove(id.to_string().as_str())
                    .map_err(storage_err)?;
            }
            txn.commit().map_err(storage_err)?;
            Ok(())
        })
        .await
    }

    /// Writes one JSON document into the `metadata` store in a single
    /// transaction.
    pub(crate) async fn write_metadata(&self, key: &'static str, json: String) -> Result<()> {
        let db = self.db.clone();
        run_blocking(move || {
            let txn = db.begin_write().map_err(storage_err)?;
            {
                let mut table = txn.open_table(METADATA_TABLE).map_err(storage_err)?;
                table.insert(key, json.as_str()).map_err(storage_err)?;
            }
            txn.commit().map_err(storage_err)?;
            Ok(())
        })
        .await
    }

    /// Reads one JSON document from the `metadata` store. Returns
    /// `Ok(None)` if the key has never been written.
    pub(crate) async fn read_metadata(&self, key: &'static str) -> Result<Option<String>> {
        let db = self.db.clone();
        run_blocking(move || {
            let txn = db.begin_read().map_err(storage_err)?;
            let table = txn.open_table(METADATA_TABLE).map_err(storage_err)?;
            let value = table
                .get(key)
                .map_err(storage_err)?
                .map(|guard| guard.value().to_string());
            Ok(value)
        })
        .await
    }
}

impl std::fmt::Debug for ContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentStore").finish()
    }
}

fn storage_err(e: impl std::fmt::Display) -> Error {
    Error::Storage(e.to_string())
}

/// Runs a blocking redb operation off the async executor.
async fn run_blocking<T: Send + 'static>(
    f: impl FnOnce() -> Result<T> + Send + 'static,
) -> Result<T> {
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Storage(format!("storage task failed: {e}")))?
}
