use std::path::Path;

use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::library::content::ContentStore;
use crate::library::model::{
    Crumb, Folder, Note, NoteUpdate, Settings, SortDirection, SortKey,
};
use crate::library::snapshot::Snapshot;
use crate::library::{RECENT_LIMIT, Result};

/// The authoritative in-memory repository of library entities, bridged to
/// the durable tier after every mutation.
///
/// A `Library` exclusively owns its collections; all mutations go through
/// its methods and take `&mut self`, so in-memory state changes are atomic
/// relative to any observer and reads always see prior writes. Only the
/// follow-up durable flush awaits.
#[derive(Debug)]
pub struct Library {
    store: ContentStore,
    folders: Vec<Folder>,
    notes: Vec<Note>,
    favorites: Vec<Uuid>,
    recent_notes: Vec<Uuid>,
    settings: Settings,
    current_folder: Option<Uuid>,
    directory_set: bool,
    scanning: bool,
    scan_progress: f32,
}

impl Library {
    /// Opens a library stored in the given data directory, creating it if
    /// necessary and rehydrating entity state from the stored snapshot.
    ///
    /// An absent or unreadable snapshot yields an empty library; settings
    /// missing from an older snapshot rehydrate to their defaults.
    #[instrument(skip(data_dir), fields(data_dir = %data_dir.display()))]
    pub async fn open(data_dir: &Path) -> Result<Self> {
        let store = ContentStore::open(data_dir).await?;
        let snapshot = Snapshot::load_or_default(&store).await;
        debug!(
            "Library opened with {} folders, {} notes",
            snapshot.folders.len(),
            snapshot.notes.len()
        );
        Ok(Library {
            store,
            folders: snapshot.folders,
            notes: snapshot.notes,
            favorites: snapshot.favorites,
            recent_notes: snapshot.recent_notes,
            settings: snapshot.settings,
            current_folder: None,
            directory_set: snapshot.directory_set,
            scanning: false,
            scan_progress: 0.0,
        })
    }

    /// Flushes a metadata snapshot to the durable tier.
    ///
    /// This is the write-behind half of every mutation: the in-memory
    /// change has already been applied when `flush` runs, and a flush
    /// failure is logged and absorbed — the in-memory state stays
    /// authoritative. A crash between a mutation and its flush loses that
    /// mutation.
    pub async fn flush(&self) {
        let snapshot = Snapshot {
            folders: self.folders.clone(),
            notes: self.notes.clone(),
            favorites: self.favorites.clone(),
            recent_notes: self.recent_notes.clone(),
            settings: self.settings.clone(),
            directory_set: self.directory_set,
        };
        if let Err(e) = snapshot.save(&self.store).await {
            warn!("Failed to flush snapshot to durable storage: {}", e);
        }
    }

    // --- Folder operations ---

    /// Adds a folder. A folder with an already-known path is an idempotent
    /// no-op, never an error.
    pub async fn add_folder(&mut self, folder: Folder) {
        if self.folders.iter().any(|f| f.path == folder.path) {
            debug!("Folder already exists, skipping: {}", folder.path);
            return;
        }
        self.folders.push(folder);
        self.flush().await;
    }

    /// Deletes a folder and its direct-child notes.
    ///
    /// The cascade is deliberately shallow: notes in subfolders are left in
    /// place with a dangling folder reference (orphaned, tolerated by the
    /// data model) rather than deleted.
    #[instrument(skip(self))]
    pub async fn delete_folder(&mut self, id: Uuid) {
        let before = self.folders.len();
        self.folders.retain(|f| f.id != id);
        if self.folders.len() == before {
            debug!("Folder not found, nothing to delete");
            return;
        }
        if self.current_folder == Some(id) {
            self.current_folder = None;
        }

        let children: Vec<Uuid> = self
            .notes
            .iter()
            .filter(|n| n.folder == Some(id))
            .map(|n| n.id)
            .collect();
        for note_id in &children {
            if let Err(e) = self.store.delete(*note_id).await {
                warn!("Failed to delete content for note {}: {}", note_id, e);
            }
        }
        self.notes.retain(|n| n.folder != Some(id));
        self.favorites.retain(|fav| !children.contains(fav));
        self.recent_notes.retain(|recent| !children.contains(recent));
        self.flush().await;
    }

    /// Selects the current folder (`None` for the root). Ids that do not
    /// reference an existing folder are silently rejected; this is a
    /// defensive guard, not a user-facing error.
    pub fn set_current_folder(&mut self, id: Option<Uuid>) {
        match id {
            Some(folder_id) if !self.folders.iter().any(|f| f.id == folder_id) => {
                debug!("Rejecting current-folder change to unknown id {}", folder_id);
            }
            _ => self.current_folder = id,
        }
    }

    /// Returns the breadcrumb from the root to the given folder, prefixed
    /// with a synthetic "Home" entry.
    ///
    /// The parent walk is bounded by the total folder count, so it
    /// terminates even if corrupted data ever introduced a cycle.
    pub fn folder_path(&self, folder_id: Option<Uuid>) -> Vec<Crumb> {
        let mut path = vec![Crumb {
            id: None,
            name: "Home".to_string(),
        }];

        if let Some(id) = folder_id {
            let mut trail = Vec::new();
            let mut current = Some(id);
            let mut hops = 0;
            while let Some(current_id) = current {
                if hops >= self.folders.len() {
                    warn!("Folder parent chain exceeds folder count, truncating breadcrumb");
                    break;
                }
                match self.folder(current_id) {
                    Some(folder) => {
                        trail.push(Crumb {
                            id: Some(folder.id),
                            name: folder.name.clone(),
                        });
                        current = folder.parent_id;
                    }
                    None => break,
                }
                hops += 1;
            }
            trail.reverse();
            path.extend(trail);
        }

        path
    }

    // --- Note operations ---

    /// Adds a note. A note with an already-known path is an idempotent
    /// no-op (import deduplication).
    ///
    /// The full content payload is handed to the content store; the note's
    /// inline copy is reduced to the bounded preview for preview-keeping
    /// types and dropped for binary types. The note id is pushed to the
    /// front of the recent list. A content-store failure is logged and
    /// absorbed: the metadata still lands, and reads fall back to the
    /// preview.
    #[instrument(skip(self, note), fields(path = %note.path))]
    pub async fn add_note(&mut self, mut note: Note) {
        if self.notes.iter().any(|n| n.path == note.path) {
            debug!("Note already exists, skipping");
            return;
        }

        if let Some(full) = note.content.take() {
            if let Err(e) = self.store.put(note.id, full.clone()).await {
                warn!("Failed to store content for note {}: {}", note.id, e);
            }
            note.content = note.kind.preview(&full);
        }

        let id = note.id;
        self.notes.push(note);
        self.push_recent(id);
        self.flush().await;
    }

    /// Deletes a note, its favorites/recents membership, and its content
    /// payload. Succeeds even when the payload is already absent.
    #[instrument(skip(self))]
    pub async fn delete_note(&mut self, id: Uuid) {
        let before = self.notes.len();
        self.notes.retain(|n| n.id != id);
        if self.notes.len() == before {
            debug!("Note not found, nothing to delete");
            return;
        }
        self.favorites.retain(|fav| *fav != id);
        self.recent_notes.retain(|recent| *recent != id);
        if let Err(e) = self.store.delete(id).await {
            warn!("Failed to delete content for note {}: {}", id, e);
        }
        self.flush().await;
    }

    /// Merges a partial update into a note. Updating `content` rewrites the
    /// content store entry and recomputes the inline preview. Unknown ids
    /// are a no-op.
    #[instrument(skip(self, update))]
    pub async fn update_note(&mut self, id: Uuid, update: NoteUpdate) {
        let Some(index) = self.notes.iter().position(|n| n.id == id) else {
            debug!("Note not found, nothing to update");
            return;
        };

        if let Some(full) = &update.content {
            if let Err(e) = self.store.put(id, full.clone()).await {
                warn!("Failed to store content for note {}: {}", id, e);
            }
        }

        let note = &mut self.notes[index];
        if let Some(title) = update.title {
            note.title = title;
        }
        if let Some(tags) = update.tags {
            note.tags = tags;
        }
        if let Some(folder) = update.folder {
            note.folder = folder;
        }
        if let Some(last_modified) = update.last_modified {
            note.last_modified = last_modified;
        }
        if let Some(full) = update.content {
            note.content = note.kind.preview(&full);
        }
        self.flush().await;
    }

    /// Flips a note's favorite status. The note's own flag and the
    /// favorites set are updated together and always agree.
    pub async fn toggle_favorite(&mut self, id: Uuid) {
        let Some(note) = self.notes.iter_mut().find(|n| n.id == id) else {
            debug!("Note not found, favorite unchanged");
            return;
        };
        note.favorite = !note.favorite;
        if note.favorite {
            if !self.favorites.contains(&id) {
                self.favorites.push(id);
            }
        } else {
            self.favorites.retain(|fav| *fav != id);
        }
        self.flush().await;
    }

    /// Moves an existing note to the front of the recent list (for example
    /// when it is viewed). Unknown ids are a no-op.
    pub async fn touch_recent(&mut self, id: Uuid) {
        if !self.notes.iter().any(|n| n.id == id) {
            return;
        }
        self.push_recent(id);
        self.flush().await;
    }

    /// Returns a note's metadata merged with its full payload from the
    /// content store. Falls back to the inline preview when the payload is
    /// missing or the store read fails. Returns `None` for unknown ids.
    #[instrument(skip(self))]
    pub async fn full_content(&self, id: Uuid) -> Option<Note> {
        let mut note = self.notes.iter().find(|n| n.id == id)?.clone();
        match self.store.get(id).await {
            Ok(Some(payload)) => note.content = Some(payload),
            Ok(None) => debug!("No stored content for note {}, using preview", id),
            Err(e) => warn!("Content lookup failed for note {}, using preview: {}", id, e),
        }
        Some(note)
    }

    // --- Settings ---

    /// Replaces the settings record and persists it.
    pub async fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
        self.flush().await;
    }

    // --- Queries ---

    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn folder(&self, id: Uuid) -> Option<&Folder> {
        self.folders.iter().find(|f| f.id == id)
    }

    pub fn folder_by_path(&self, path: &str) -> Option<&Folder> {
        self.folders.iter().find(|f| f.path == path)
    }

    pub fn note(&self, id: Uuid) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn note_by_path(&self, path: &str) -> Option<&Note> {
        self.notes.iter().find(|n| n.path == path)
    }

    /// Favorite notes, in the order they were favorited.
    pub fn favorites(&self) -> Vec<&Note> {
        self.favorites
            .iter()
            .filter_map(|id| self.note(*id))
            .collect()
    }

    pub fn favorite_ids(&self) -> &[Uuid] {
        &self.favorites
    }

    /// Recently added or viewed notes, most recent first.
    pub fn recent_notes(&self) -> Vec<&Note> {
        self.recent_notes
            .iter()
            .filter_map(|id| self.note(*id))
            .collect()
    }

    pub fn recent_ids(&self) -> &[Uuid] {
        &self.recent_notes
    }

    /// Direct-child notes of the given folder (`None` for the root),
    /// ordered by the configured sort key and direction.
    pub fn notes_in(&self, folder: Option<Uuid>) -> Vec<&Note> {
        let mut notes: Vec<&Note> = self.notes.iter().filter(|n| n.folder == folder).collect();
        self.sort_notes(&mut notes);
        notes
    }

    fn sort_notes(&self, notes: &mut [&Note]) {
        match self.settings.sort_by {
            SortKey::Name => notes.sort_by(|a, b| {
                a.title.to_lowercase().cmp(&b.title.to_lowercase())
            }),
            SortKey::Date => notes.sort_by_key(|n| n.last_modified),
            SortKey::Type => notes.sort_by(|a, b| {
                a.kind
                    .mime_str()
                    .cmp(b.kind.mime_str())
                    .then_with(|| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
            }),
            SortKey::Size => notes.sort_by_key(|n| n.size.unwrap_or(0)),
        }
        if self.settings.sort_direction == SortDirection::Desc {
            notes.reverse();
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn current_folder(&self) -> Option<Uuid> {
        self.current_folder
    }

    /// Whether a directory has been imported into this library.
    pub fn directory_set(&self) -> bool {
        self.directory_set
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning
    }

    /// Progress of an in-flight import on a 0–100 scale.
    pub fn scan_progress(&self) -> f32 {
        self.scan_progress
    }

    // --- Internal helpers ---

    fn push_recent(&mut self, id: Uuid) {
        self.recent_notes.retain(|recent| *recent != id);
        self.recent_notes.insert(0, id);
        self.recent_notes.truncate(RECENT_LIMIT);
    }

    pub(crate) fn store(&self) -> &ContentStore {
        &self.store
    }

    pub(crate) fn begin_scan(&mut self) {
        self.scanning = true;
        self.scan_progress = 0.0;
    }

    pub(crate) fn set_scan_progress(&mut self, progress: f32) {
        self.scan_progress = progress;
    }

    pub(crate) fn finish_scan(&mut self) {
        self.scanning = false;
        self.scan_progress = 100.0;
        self.directory_set = true;
    }

    pub(crate) fn reset_scan(&mut self) {
        self.scanning = false;
        self.scan_progress = 0.0;
        self.directory_set = false;
    }
}
