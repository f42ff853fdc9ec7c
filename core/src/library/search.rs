//! Substring relevance search over note and folder metadata.
//!
//! Search never touches the content store: it ranks entities purely on
//! titles, tags, and folder names, so results cost no payload reads.

use tracing::debug;

use crate::library::model::{ResultKind, SearchCategory, SearchResult};
use crate::library::repository::Library;

/// Title matches weigh heavier than tag matches.
const TITLE_WEIGHT: f32 = 2.0;
const TAG_WEIGHT: f32 = 1.5;

impl Library {
    /// Searches notes and/or folders for the given query.
    ///
    /// The query is lowercased and split on whitespace; a note matches when
    /// every term occurs in its title, or when some single tag contains
    /// every term. A folder matches when every term occurs in its name.
    /// Results are ranked by weighted term-occurrence counts, descending;
    /// ties keep their input order (stable sort). An empty or
    /// whitespace-only query returns no results rather than listing
    /// everything.
    pub fn search(&self, query: &str, category: SearchCategory) -> Vec<SearchResult> {
        let terms: Vec<String> = query
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();
        if terms.is_empty() {
            return Vec::new();
        }

        let mut results = Vec::new();

        if matches!(category, SearchCategory::All | SearchCategory::Notes) {
            for note in self.notes() {
                let title = note.title.to_lowercase();
                let title_matches = terms.iter().all(|term| title.contains(term));
                let tags_match = note.tags.iter().any(|tag| {
                    let tag = tag.to_lowercase();
                    terms.iter().all(|term| tag.contains(term))
                });
                if !title_matches && !tags_match {
                    continue;
                }

                let mut score = 0.0;
                if title_matches {
                    score += occurrence_count(&title, &terms) * TITLE_WEIGHT;
                }
                if tags_match {
                    let joined = note.tags.join(" ").to_lowercase();
                    score += occurrence_count(&joined, &terms) * TAG_WEIGHT;
                }
                results.push(SearchResult {
                    id: note.id,
                    title: note.title.clone(),
                    kind: ResultKind::Note,
                    path: note.path.clone(),
                    score,
                    size: note.size,
                });
            }
        }

        if matches!(category, SearchCategory::All | SearchCategory::Folders) {
            for folder in self.folders() {
                let name = folder.name.to_lowercase();
                if !terms.iter().all(|term| name.contains(term)) {
                    continue;
                }
                results.push(SearchResult {
                    id: folder.id,
                    title: folder.name.clone(),
                    kind: ResultKind::Folder,
                    path: folder.path.clone(),
                    score: occurrence_count(&name, &terms) * TITLE_WEIGHT,
                    size: None,
                });
            }
        }

        // Stable: equal scores keep entity order.
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        debug!("Search for {:?} produced {} results", query, results.len());
        results
    }
}

/// Sum over terms of non-overlapping occurrence counts in `text`.
///
/// `text` is expected to be lowercased already.
fn occurrence_count(text: &str, terms: &[String]) -> f32 {
    terms
        .iter()
        .map(|term| text.matches(term.as_str()).count())
        .sum::<usize>() as f32
}
