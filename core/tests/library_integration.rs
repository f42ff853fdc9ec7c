use std::path::Path;

use tempfile::tempdir;
use tokio::fs;

use satchel_core::library::{
    encode_data_uri, FileType, Library, SearchCategory, SortDirection,
};

async fn write_file(path: &Path, bytes: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .expect("Test helper: failed to create parent dir");
    }
    fs::write(path, bytes)
        .await
        .expect("Test helper: failed to write file");
}

#[tokio::test]
async fn integration_import_search_and_reopen() {
    let data_dir = tempdir().unwrap();
    let source = tempdir().unwrap();

    write_file(&source.path().join("physics/mechanics.md"), b"# Mechanics").await;
    write_file(&source.path().join("physics/optics/lenses.txt"), b"thin lenses").await;
    write_file(&source.path().join("syllabus.pdf"), b"%PDF-1.4 syllabus").await;

    // 1. Import a directory tree.
    let mut library = Library::open(data_dir.path()).await.unwrap();
    let mut progress = Vec::new();
    library
        .import_directory_with_progress(source.path(), |p| progress.push(p))
        .await
        .expect("import should succeed");

    assert!(library.directory_set());
    assert_eq!(library.scan_progress(), 100.0);
    assert_eq!(progress.last().copied(), Some(100.0));
    assert_eq!(library.notes().len(), 3);
    assert_eq!(library.folders().len(), 2);

    let physics = library.folder_by_path("physics").unwrap().clone();
    let optics = library.folder_by_path("physics/optics").unwrap().clone();
    assert_eq!(optics.parent_id, Some(physics.id));

    // 2. Breadcrumb from the nested folder.
    let crumbs = library.folder_path(Some(optics.id));
    let names: Vec<&str> = crumbs.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Home", "physics", "optics"]);

    // 3. Search over metadata.
    let results = library.search("lenses", SearchCategory::All);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].path, "physics/optics/lenses.txt");

    let folder_hits = library.search("physics", SearchCategory::Folders);
    assert_eq!(folder_hits.len(), 1);

    // 4. Favorite and tag a note, then fetch its full payload.
    let syllabus_id = library.note_by_path("syllabus.pdf").unwrap().id;
    library.toggle_favorite(syllabus_id).await;
    let full = library.full_content(syllabus_id).await.unwrap();
    assert_eq!(
        full.content.as_deref(),
        Some(encode_data_uri(FileType::Pdf, b"%PDF-1.4 syllabus").as_str())
    );

    // 5. Reopen from disk: metadata and payloads survive.
    drop(library);
    let library = Library::open(data_dir.path()).await.unwrap();
    assert_eq!(library.notes().len(), 3);
    assert_eq!(library.folders().len(), 2);
    assert!(library.directory_set());
    assert!(library.note(syllabus_id).unwrap().favorite);
    let full = library.full_content(syllabus_id).await.unwrap();
    assert_eq!(
        full.content.as_deref(),
        Some(encode_data_uri(FileType::Pdf, b"%PDF-1.4 syllabus").as_str())
    );
}

#[tokio::test]
async fn integration_reimport_after_reopen_deduplicates() {
    let data_dir = tempdir().unwrap();
    let source = tempdir().unwrap();
    write_file(&source.path().join("algebra/sets.md"), b"sets").await;

    {
        let mut library = Library::open(data_dir.path()).await.unwrap();
        library.import_directory(source.path()).await.unwrap();
        assert_eq!(library.notes().len(), 1);
    }

    let mut library = Library::open(data_dir.path()).await.unwrap();
    library.import_directory(source.path()).await.unwrap();
    assert_eq!(library.notes().len(), 1);
    assert_eq!(library.folders().len(), 1);
}

#[tokio::test]
async fn integration_settings_survive_reopen() {
    let data_dir = tempdir().unwrap();

    {
        let mut library = Library::open(data_dir.path()).await.unwrap();
        let mut settings = library.settings().clone();
        settings.sort_direction = SortDirection::Desc;
        settings.cache_size = 1000;
        library.set_settings(settings).await;
    }

    let library = Library::open(data_dir.path()).await.unwrap();
    assert_eq!(library.settings().sort_direction, SortDirection::Desc);
    assert_eq!(library.settings().cache_size, 1000);
}
