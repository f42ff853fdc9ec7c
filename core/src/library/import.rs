//! Import pipeline: turns a raw file selection into folder and note
//! entities.
//!
//! Two inputs are supported: a flat list of path-bearing files
//! ([`ImportFile`]) and a directory on disk, which is enumerated
//! recursively and reduced to the same flat form. Both run the same
//! two-pass algorithm: pass 1 materializes the folder hierarchy from path
//! prefixes through an explicit prefix→id map (no recursion, memory bounded
//! by the number of distinct prefixes); pass 2 reads and stores each file,
//! skipping paths that already exist, and reports progress after each one.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use tokio::fs;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::library::content::encode_data_uri;
use crate::library::model::{now_millis, FileType, Folder, Note};
use crate::library::repository::Library;
use crate::library::{Error, Result};

/// One file of a flat import selection, carrying its content and its path
/// relative to the selection root.
#[derive(Debug, Clone)]
pub struct ImportFile {
    pub relative_path: String,
    pub bytes: Vec<u8>,
    /// Milliseconds since the Unix epoch; the import time is used when
    /// absent.
    pub last_modified: Option<u64>,
}

enum PendingContent {
    Bytes(Vec<u8>),
    OnDisk(PathBuf),
}

struct PendingFile {
    relative_path: String,
    content: PendingContent,
    last_modified: Option<u64>,
}

impl From<ImportFile> for PendingFile {
    fn from(file: ImportFile) -> Self {
        PendingFile {
            relative_path: file.relative_path,
            content: PendingContent::Bytes(file.bytes),
            last_modified: file.last_modified,
        }
    }
}

impl Library {
    /// Imports a flat list of path-bearing files.
    pub async fn import_files(&mut self, files: Vec<ImportFile>) -> Result<()> {
        self.import_files_with_progress(files, |_| {}).await
    }

    /// Imports a flat list of path-bearing files, reporting progress on a
    /// 0–100 scale after each processed file.
    pub async fn import_files_with_progress(
        &mut self,
        files: Vec<ImportFile>,
        on_progress: impl FnMut(f32),
    ) -> Result<()> {
        let pending = files.into_iter().map(PendingFile::from).collect();
        self.run_import(pending, Vec::new(), on_progress).await
    }

    /// Imports a directory from disk, enumerating it recursively.
    pub async fn import_directory(&mut self, path: &Path) -> Result<()> {
        self.import_directory_with_progress(path, |_| {}).await
    }

    /// Imports a directory from disk, reporting progress on a 0–100 scale.
    ///
    /// Nested subdirectories are walked in full and reconstructed as nested
    /// folders; directories that contain no files still become folders.
    #[instrument(skip(self, on_progress), fields(path = %path.display()))]
    pub async fn import_directory_with_progress(
        &mut self,
        path: &Path,
        on_progress: impl FnMut(f32),
    ) -> Result<()> {
        match collect_directory(path).await {
            Ok((dirs, files)) => self.run_import(files, dirs, on_progress).await,
            Err(e) => {
                // Enumeration failed before anything was written; still
                // reset the scan flags per the import failure contract.
                self.reset_scan();
                self.flush().await;
                Err(e)
            }
        }
    }

    /// Shared driver: sets scan state, runs both passes, and applies the
    /// failure policy.
    ///
    /// Any unexpected error aborts the import: the directory-set flag and
    /// scan progress are reset and the error propagates to the caller.
    /// Entities written before the failure are not rolled back (best-effort
    /// semantics, a known gap).
    async fn run_import(
        &mut self,
        files: Vec<PendingFile>,
        dirs: Vec<String>,
        mut on_progress: impl FnMut(f32),
    ) -> Result<()> {
        self.begin_scan();
        match self.import_inner(files, dirs, &mut on_progress).await {
            Ok(()) => {
                self.finish_scan();
                self.flush().await;
                Ok(())
            }
            Err(e) => {
                warn!("Import aborted: {}", e);
                self.reset_scan();
                self.flush().await;
                Err(e)
            }
        }
    }

    async fn import_inner(
        &mut self,
        files: Vec<PendingFile>,
        dirs: Vec<String>,
        on_progress: &mut impl FnMut(f32),
    ) -> Result<()> {
        // Seed the prefix map with folders already known, so re-importing
        // an overlapping tree resolves parents to existing ids.
        let mut folder_map: HashMap<String, Uuid> = self
            .folders()
            .iter()
            .map(|f| (f.path.clone(), f.id))
            .collect();

        // Pass 1 — folder materialization.
        for dir in &dirs {
            self.materialize_prefixes(&mut folder_map, sanitize_path(dir)).await;
        }
        for file in &files {
            let path = sanitize_path(&file.relative_path);
            self.materialize_prefixes(&mut folder_map, parent_path(path)).await;
        }

        // Pass 2 — note materialization.
        let total = files.len();
        for (index, file) in files.into_iter().enumerate() {
            let path = sanitize_path(&file.relative_path).to_string();
            if !path.is_empty() && self.note_by_path(&path).is_none() {
                let bytes = match file.content {
                    PendingContent::Bytes(bytes) => bytes,
                    PendingContent::OnDisk(disk_path) => {
                        fs::read(&disk_path).await.map_err(Error::Io)?
                    }
                };
                let title = path.rsplit('/').next().unwrap_or(&path).to_string();
                let kind = FileType::from_file_name(&title);
                let folder = folder_map.get(parent_path(&path)).copied();
                let size = bytes.len() as u64;
                debug!("Importing {} ({} bytes)", path, size);
                self.add_note(Note {
                    id: Uuid::new_v4(),
                    title,
                    content: Some(encode_data_uri(kind, &bytes)),
                    kind,
                    path,
                    tags: Vec::new(),
                    last_modified: file.last_modified.unwrap_or_else(now_millis),
                    folder,
                    favorite: false,
                    size: Some(size),
                })
                .await;
            }

            let progress = ((index + 1) as f32 / total as f32) * 100.0;
            self.set_scan_progress(progress);
            on_progress(progress);
        }

        Ok(())
    }

    /// Creates a folder for every not-yet-seen prefix of `dir_path`,
    /// top-down, assigning each new folder its parent's id from the map.
    async fn materialize_prefixes(
        &mut self,
        folder_map: &mut HashMap<String, Uuid>,
        dir_path: &str,
    ) {
        let mut current = String::new();
        for segment in dir_path.split('/').filter(|s| !s.is_empty()) {
            let parent = std::mem::take(&mut current);
            current = if parent.is_empty() {
                segment.to_string()
            } else {
                format!("{parent}/{segment}")
            };
            if folder_map.contains_key(&current) {
                continue;
            }
            let id = Uuid::new_v4();
            folder_map.insert(current.clone(), id);
            self.add_folder(Folder {
                id,
                name: segment.to_string(),
                path: current.clone(),
                parent_id: folder_map.get(&parent).copied(),
            })
            .await;
        }
    }
}

/// Strips leading and trailing slashes.
fn sanitize_path(path: &str) -> &str {
    path.trim_matches('/')
}

/// The slash-joined parent of a relative path; empty at the root.
fn parent_path(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some((parent, _)) => parent,
        None => "",
    }
}

/// Recursively enumerates a directory into folder paths and pending files
/// with paths relative to the root, in deterministic (sorted) order.
async fn collect_directory(root: &Path) -> Result<(Vec<String>, Vec<PendingFile>)> {
    let meta = fs::metadata(root).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::DirectoryNotFound(root.to_path_buf())
        } else {
            Error::Io(e)
        }
    })?;
    if !meta.is_dir() {
        return Err(Error::NotADirectory(root.to_path_buf()));
    }

    let mut dirs = Vec::new();
    let mut files = Vec::new();
    // Explicit work stack instead of recursion; depth-independent.
    let mut stack: Vec<(PathBuf, String)> = vec![(root.to_path_buf(), String::new())];

    while let Some((abs_dir, prefix)) = stack.pop() {
        let mut read_dir = fs::read_dir(&abs_dir).await.map_err(Error::Io)?;
        while let Some(entry) = read_dir.next_entry().await.map_err(Error::Io)? {
            let name = entry.file_name().to_string_lossy().into_owned();
            let relative = if prefix.is_empty() {
                name
            } else {
                format!("{prefix}/{name}")
            };
            let entry_type = entry.file_type().await.map_err(Error::Io)?;
            if entry_type.is_dir() {
                dirs.push(relative.clone());
                stack.push((entry.path(), relative));
            } else if entry_type.is_file() {
                let last_modified = entry
                    .metadata()
                    .await
                    .ok()
                    .and_then(|m| m.modified().ok())
                    .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                    .map(|d| d.as_millis() as u64);
                files.push(PendingFile {
                    relative_path: relative,
                    content: PendingContent::OnDisk(entry.path()),
                    last_modified,
                });
            }
        }
    }

    dirs.sort();
    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok((dirs, files))
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn import_file(path: &str, bytes: &[u8]) -> ImportFile {
        ImportFile {
            relative_path: path.to_string(),
            bytes: bytes.to_vec(),
            last_modified: Some(1_700_000_000_000),
        }
    }

    #[tokio::test]
    async fn reconstructs_nested_folders_from_flat_paths() {
        let dir = tempdir().unwrap();
        let mut library = Library::open(dir.path()).await.unwrap();

        let mut seen = Vec::new();
        library
            .import_files_with_progress(
                vec![
                    import_file("a/x.txt", b"x body"),
                    import_file("a/b/y.md", b"y body"),
                ],
                |p| seen.push(p),
            )
            .await
            .unwrap();

        assert_eq!(library.folders().len(), 2);
        let a = library.folder_by_path("a").unwrap().clone();
        let ab = library.folder_by_path("a/b").unwrap().clone();
        assert_eq!(a.parent_id, None);
        assert_eq!(ab.parent_id, Some(a.id));
        assert_eq!(ab.name, "b");

        let x = library.note_by_path("a/x.txt").unwrap();
        let y = library.note_by_path("a/b/y.md").unwrap();
        assert_eq!(x.folder, Some(a.id));
        assert_eq!(y.folder, Some(ab.id));
        assert_eq!(x.kind, FileType::Text);
        assert_eq!(y.kind, FileType::Markdown);

        assert_eq!(seen, vec![50.0, 100.0]);
        assert_eq!(library.scan_progress(), 100.0);
        assert!(library.directory_set());
        assert!(!library.is_scanning());
    }

    #[tokio::test]
    async fn reimport_is_idempotent() {
        let dir = tempdir().unwrap();
        let mut library = Library::open(dir.path()).await.unwrap();

        let files = vec![
            import_file("a/x.txt", b"x body"),
            import_file("a/b/y.md", b"y body"),
        ];
        library.import_files(files.clone()).await.unwrap();
        library.import_files(files).await.unwrap();

        assert_eq!(library.folders().len(), 2);
        assert_eq!(library.notes().len(), 2);
    }

    #[tokio::test]
    async fn reimport_resolves_parents_to_existing_folders() {
        let dir = tempdir().unwrap();
        let mut library = Library::open(dir.path()).await.unwrap();

        library
            .import_files(vec![import_file("a/x.txt", b"x")])
            .await
            .unwrap();
        let a_id = library.folder_by_path("a").unwrap().id;

        library
            .import_files(vec![import_file("a/z.txt", b"z")])
            .await
            .unwrap();
        assert_eq!(library.note_by_path("a/z.txt").unwrap().folder, Some(a_id));
    }

    #[tokio::test]
    async fn files_at_selection_root_belong_to_no_folder() {
        let dir = tempdir().unwrap();
        let mut library = Library::open(dir.path()).await.unwrap();

        library
            .import_files(vec![import_file("loose.pdf", b"%PDF")])
            .await
            .unwrap();

        let note = library.note_by_path("loose.pdf").unwrap();
        assert_eq!(note.folder, None);
        assert_eq!(note.kind, FileType::Pdf);
        assert_eq!(note.content, None);
        assert!(library.folders().is_empty());
    }

    #[tokio::test]
    async fn directory_import_walks_recursively() {
        let data_dir = tempdir().unwrap();
        let source = tempdir().unwrap();
        tokio::fs::create_dir_all(source.path().join("physics/waves"))
            .await
            .unwrap();
        tokio::fs::create_dir_all(source.path().join("empty"))
            .await
            .unwrap();
        tokio::fs::write(source.path().join("physics/intro.md"), b"# Intro")
            .await
            .unwrap();
        tokio::fs::write(source.path().join("physics/waves/notes.txt"), b"wave notes")
            .await
            .unwrap();

        let mut library = Library::open(data_dir.path()).await.unwrap();
        library.import_directory(source.path()).await.unwrap();

        // Folders: physics, physics/waves, and the empty directory.
        assert_eq!(library.folders().len(), 3);
        let physics = library.folder_by_path("physics").unwrap().clone();
        let waves = library.folder_by_path("physics/waves").unwrap();
        assert_eq!(waves.parent_id, Some(physics.id));
        assert!(library.folder_by_path("empty").is_some());

        let nested = library.note_by_path("physics/waves/notes.txt").unwrap();
        assert_eq!(nested.folder, Some(waves.id));
        assert!(library.directory_set());

        let full = library.full_content(nested.id).await.unwrap();
        assert_eq!(
            full.content.as_deref(),
            Some(encode_data_uri(FileType::Text, b"wave notes").as_str())
        );
    }

    #[tokio::test]
    async fn failed_import_resets_scan_state() {
        let data_dir = tempdir().unwrap();
        let mut library = Library::open(data_dir.path()).await.unwrap();

        let missing = data_dir.path().join("does-not-exist");
        let result = library.import_directory(&missing).await;
        assert!(matches!(result, Err(Error::DirectoryNotFound(_))));
        assert!(!library.directory_set());
        assert!(!library.is_scanning());
        assert_eq!(library.scan_progress(), 0.0);
    }

    #[tokio::test]
    async fn import_target_must_be_a_directory() {
        let data_dir = tempdir().unwrap();
        let file_path = data_dir.path().join("plain.txt");
        tokio::fs::write(&file_path, b"not a directory").await.unwrap();

        let mut library = Library::open(data_dir.path()).await.unwrap();
        let result = library.import_directory(&file_path).await;
        assert!(matches!(result, Err(Error::NotADirectory(_))));
    }
}
