use std::time::{SystemTime, UNIX_EPOCH};

use mime::Mime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::library::PREVIEW_LEN;

/// The document type of an imported note, classified from its filename
/// extension.
///
/// All typing decisions (MIME type, whether an inline preview is kept in
/// metadata) go through the descriptor table below; there are no parallel
/// per-type switches elsewhere in the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    Text,
    Markdown,
    Doc,
    Docx,
    Ppt,
    Pptx,
    Xls,
    Xlsx,
}

/// One row of the file-type descriptor table.
struct TypeDescriptor {
    mime: &'static str,
    /// Whether a bounded preview of the content is kept inline in note
    /// metadata. Binary types live exclusively in the content store.
    inline_preview: bool,
}

impl FileType {
    /// Classifies a filename by its extension. Unknown extensions fall back
    /// to plain text.
    pub fn from_file_name(name: &str) -> FileType {
        let extension = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "pdf" => FileType::Pdf,
            "md" | "markdown" => FileType::Markdown,
            "doc" => FileType::Doc,
            "docx" => FileType::Docx,
            "ppt" => FileType::Ppt,
            "pptx" => FileType::Pptx,
            "xls" => FileType::Xls,
            "xlsx" => FileType::Xlsx,
            _ => FileType::Text,
        }
    }

    const fn descriptor(self) -> &'static TypeDescriptor {
        match self {
            FileType::Pdf => &TypeDescriptor {
                mime: "application/pdf",
                inline_preview: false,
            },
            FileType::Text => &TypeDescriptor {
                mime: "text/plain",
                inline_preview: true,
            },
            FileType::Markdown => &TypeDescriptor {
                mime: "text/plain",
                inline_preview: true,
            },
            FileType::Doc => &TypeDescriptor {
                mime: "application/msword",
                inline_preview: false,
            },
            FileType::Docx => &TypeDescriptor {
                mime: "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                inline_preview: false,
            },
            FileType::Ppt => &TypeDescriptor {
                mime: "application/vnd.ms-powerpoint",
                inline_preview: false,
            },
            FileType::Pptx => &TypeDescriptor {
                mime: "application/vnd.openxmlformats-officedocument.presentationml.presentation",
                inline_preview: false,
            },
            FileType::Xls => &TypeDescriptor {
                mime: "application/vnd.ms-excel",
                inline_preview: false,
            },
            FileType::Xlsx => &TypeDescriptor {
                mime: "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                inline_preview: false,
            },
        }
    }

    /// Returns the MIME type used when encoding this note's payload.
    pub fn mime_str(self) -> &'static str {
        self.descriptor().mime
    }

    /// Returns the MIME type as a parsed [`Mime`].
    pub fn mime(self) -> Mime {
        self.mime_str()
            .parse()
            .unwrap_or(mime::APPLICATION_OCTET_STREAM)
    }

    /// Whether note metadata keeps an inline preview for this type.
    pub fn keeps_preview(self) -> bool {
        self.descriptor().inline_preview
    }

    /// Computes the inline metadata copy of a full content payload: a
    /// bounded preview for preview-keeping types, `None` for binary types.
    pub fn preview(self, content: &str) -> Option<String> {
        if !self.keeps_preview() {
            return None;
        }
        let truncated = match content.char_indices().nth(PREVIEW_LEN) {
            Some((idx, _)) => &content[..idx],
            None => content,
        };
        Some(truncated.to_string())
    }
}

/// A virtual directory node in the imported hierarchy.
///
/// `path` is slash-separated and unique across all folders; `parent_id` is
/// `None` for top-level folders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    pub id: Uuid,
    pub name: String,
    pub path: String,
    pub parent_id: Option<Uuid>,
}

/// Metadata for a single imported document.
///
/// `content` holds the bounded inline preview for text and markdown notes
/// and `None` for binary types; the full payload lives in the content store
/// keyed by `id`. `path` is unique across all notes and serves as the
/// import deduplication key. A `folder` referencing a removed folder is
/// tolerated (the note is orphaned, not an error).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub kind: FileType,
    pub path: String,
    pub tags: Vec<String>,
    /// Milliseconds since the Unix epoch.
    pub last_modified: u64,
    pub folder: Option<Uuid>,
    #[serde(default)]
    pub favorite: bool,
    pub size: Option<u64>,
}

/// A partial update to a note, merged field-by-field by
/// [`Library::update_note`](crate::library::Library::update_note).
///
/// A `content` update rewrites the content store entry and recomputes the
/// inline preview. `folder` is doubly optional: `Some(None)` moves the note
/// to the root.
#[derive(Debug, Clone, Default)]
pub struct NoteUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub folder: Option<Option<Uuid>>,
    pub last_modified: Option<u64>,
}

/// Which entity kinds a search should consider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchCategory {
    #[default]
    All,
    Notes,
    Folders,
}

/// The entity kind of a search hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    Note,
    Folder,
}

/// A single ranked search hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: Uuid,
    pub title: String,
    pub kind: ResultKind,
    pub path: String,
    pub score: f32,
    pub size: Option<u64>,
}

/// One entry of a folder breadcrumb; `id` is `None` for the synthetic root
/// ("Home") entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crumb {
    pub id: Option<Uuid>,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Name,
    Date,
    Type,
    Size,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Grid,
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewQuality {
    Low,
    Medium,
    High,
}

/// Flat user-configuration record, persisted alongside entity metadata.
///
/// The container-level `serde(default)` deep-merges a stored snapshot onto
/// these defaults, so a snapshot written by an older version with missing
/// fields rehydrates cleanly instead of failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub theme: Theme,
    pub sort_by: SortKey,
    pub sort_direction: SortDirection,
    pub view_mode: ViewMode,
    pub show_hidden_files: bool,
    pub show_extensions: bool,
    pub preview_quality: PreviewQuality,
    /// Content-cache budget in megabytes.
    pub cache_size: u32,
    pub enable_indexing: bool,
    /// Seconds between automatic saves; 0 disables.
    pub auto_save_interval: u32,
    pub debug_mode: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            theme: Theme::Light,
            sort_by: SortKey::Name,
            sort_direction: SortDirection::Asc,
            view_mode: ViewMode::Grid,
            show_hidden_files: false,
            show_extensions: true,
            preview_quality: PreviewQuality::Medium,
            cache_size: 500,
            enable_indexing: true,
            auto_save_interval: 30,
            debug_mode: false,
        }
    }
}

/// Current time in milliseconds since the Unix epoch.
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_extensions() {
        assert_eq!(FileType::from_file_name("report.PDF"), FileType::Pdf);
        assert_eq!(FileType::from_file_name("notes.md"), FileType::Markdown);
        assert_eq!(FileType::from_file_name("notes.markdown"), FileType::Markdown);
        assert_eq!(FileType::from_file_name("deck.pptx"), FileType::Pptx);
        assert_eq!(FileType::from_file_name("table.xlsx"), FileType::Xlsx);
    }

    #[test]
    fn unknown_extension_falls_back_to_text() {
        assert_eq!(FileType::from_file_name("README"), FileType::Text);
        assert_eq!(FileType::from_file_name("data.csv"), FileType::Text);
    }

    #[test]
    fn descriptor_tiers() {
        assert!(FileType::Text.keeps_preview());
        assert!(FileType::Markdown.keeps_preview());
        assert!(!FileType::Pdf.keeps_preview());
        assert!(!FileType::Docx.keeps_preview());
        assert_eq!(FileType::Pdf.mime(), mime::APPLICATION_PDF);
    }

    #[test]
    fn preview_truncates_to_bound() {
        let long = "x".repeat(PREVIEW_LEN + 50);
        let preview = FileType::Text.preview(&long).unwrap();
        assert_eq!(preview.chars().count(), PREVIEW_LEN);

        let short = "hello";
        assert_eq!(FileType::Markdown.preview(short).as_deref(), Some("hello"));

        assert_eq!(FileType::Pdf.preview("ignored"), None);
    }

    #[test]
    fn preview_respects_char_boundaries() {
        // Multi-byte characters around the cutoff must not split.
        let long = "é".repeat(PREVIEW_LEN + 5);
        let preview = FileType::Text.preview(&long).unwrap();
        assert_eq!(preview.chars().count(), PREVIEW_LEN);
    }

    #[test]
    fn settings_deep_merge_onto_defaults() {
        // A partial record, as an older snapshot might contain.
        let partial: Settings = serde_json::from_str(r#"{"theme":"dark"}"#).unwrap();
        assert_eq!(partial.theme, Theme::Dark);
        assert_eq!(partial.cache_size, 500);
        assert_eq!(partial.sort_by, SortKey::Name);
        assert!(partial.show_extensions);
    }
}
