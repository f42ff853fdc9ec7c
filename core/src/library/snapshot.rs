//! Serializable snapshot of the library's metadata state.
//!
//! A snapshot carries everything except full content payloads: folders,
//! note metadata (inline previews only), favorites, recents, settings, and
//! the directory-set flag. It is written to the durable `metadata` store in
//! a single transaction after every mutation and read back once on startup.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::library::content::ContentStore;
use crate::library::model::{Folder, Note, Settings};
use crate::library::Result;

/// Key of the one snapshot document in the `metadata` store.
pub(crate) const SNAPSHOT_KEY: &str = "library";

/// Metadata snapshot of a whole library.
///
/// Every field is `serde(default)` so a snapshot written by an older
/// version rehydrates against current defaults instead of failing; in
/// particular a missing `settings` key yields the documented default
/// settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub folders: Vec<Folder>,
    pub notes: Vec<Note>,
    pub favorites: Vec<Uuid>,
    pub recent_notes: Vec<Uuid>,
    pub settings: Settings,
    pub directory_set: bool,
}

impl Snapshot {
    /// Serializes and writes this snapshot to the durable metadata store.
    pub(crate) async fn save(&self, store: &ContentStore) -> Result<()> {
        let json = serde_json::to_string(self)?;
        store.write_metadata(SNAPSHOT_KEY, json).await?;
        debug!("Snapshot written ({} folders, {} notes)", self.folders.len(), self.notes.len());
        Ok(())
    }

    /// Reads the snapshot back from the durable store.
    ///
    /// An absent or unreadable snapshot falls back to the default empty
    /// state rather than failing hard; the failure is logged.
    pub(crate) async fn load_or_default(store: &ContentStore) -> Snapshot {
        match store.read_metadata(SNAPSHOT_KEY).await {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!("Stored snapshot is unreadable, starting empty: {}", e);
                    Snapshot::default()
                }
            },
            Ok(None) => {
                debug!("No stored snapshot, starting empty");
                Snapshot::default()
            }
            Err(e) => {
                warn!("Failed to read stored snapshot, starting empty: {}", e);
                Snapshot::default()
            }
        }
    }
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::model::{FileType, Theme};
    use tempfile::tempdir;

    fn sample_note(path: &str) -> Note {
        Note {
            id: Uuid::new_v4(),
            title: path.to_string(),
            content: Some("preview".to_string()),
            kind: FileType::Text,
            path: path.to_string(),
            tags: vec!["physics".to_string()],
            last_modified: 1_700_000_000_000,
            folder: None,
            favorite: false,
            size: Some(7),
        }
    }

    #[tokio::test]
    async fn round_trips_through_store() {
        let dir = tempdir().unwrap();
        let store = ContentStore::open(dir.path()).await.unwrap();

        let snapshot = Snapshot {
            notes: vec![sample_note("a.txt")],
            directory_set: true,
            ..Snapshot::default()
        };
        snapshot.save(&store).await.unwrap();

        let loaded = Snapshot::load_or_default(&store).await;
        assert_eq!(loaded, snapshot);
    }

    #[tokio::test]
    async fn empty_store_yields_default_state() {
        let dir = tempdir().unwrap();
        let store = ContentStore::open(dir.path()).await.unwrap();

        let loaded = Snapshot::load_or_default(&store).await;
        assert_eq!(loaded, Snapshot::default());
        assert!(!loaded.directory_set);
    }

    #[tokio::test]
    async fn missing_settings_key_rehydrates_to_defaults() {
        let dir = tempdir().unwrap();
        let store = ContentStore::open(dir.path()).await.unwrap();
        store
            .write_metadata(SNAPSHOT_KEY, r#"{"folders":[],"notes":[]}"#.to_string())
            .await
            .unwrap();

        let loaded = Snapshot::load_or_default(&store).await;
        assert_eq!(loaded.settings, Settings::default());
        assert_eq!(loaded.settings.theme, Theme::Light);
    }

    #[tokio::test]
    async fn corrupt_snapshot_falls_back_to_default() {
        let dir = tempdir().unwrap();
        let store = ContentStore::open(dir.path()).await.unwrap();
        store
            .write_metadata(SNAPSHOT_KEY, "{ not json }".to_string())
            .await
            .unwrap();

        let loaded = Snapshot::load_or_default(&store).await;
        assert_eq!(loaded, Snapshot::default());
    }
}
