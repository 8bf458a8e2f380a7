//! Case-insensitive substring search over vault items.
//!
//! Notes match on title or content, images and PDFs on title only (their
//! payload is binary). Results are the three filtered collections
//! concatenated: notes, then images, then PDFs, each in storage order.

use crate::item::{ImageItem, Note, PdfItem, Record, VaultItemType};

/// Shortest query the front end will run a search for.
pub const MIN_QUERY_LEN: usize = 3;

/// A normalized, non-blank search query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    needle: String,
}

impl SearchQuery {
    /// `None` when the query is empty after trimming.
    ///
    /// Only blankness is judged on the trimmed text; the needle itself keeps
    /// inner and surrounding whitespace.
    pub fn parse(query: &str) -> Option<Self> {
        if query.trim().is_empty() {
            return None;
        }
        Some(Self {
            needle: query.to_lowercase(),
        })
    }

    pub fn needle(&self) -> &str {
        &self.needle
    }

    pub fn matches_text(&self, text: &str) -> bool {
        text.to_lowercase().contains(&self.needle)
    }

    pub fn matches_note(&self, note: &Note) -> bool {
        self.matches_text(note.title()) || self.matches_text(&note.content)
    }

    pub fn matches_title<T: Record>(&self, record: &T) -> bool {
        self.matches_text(record.title())
    }
}

/// Whether the front end should run a search for `query` at all.
pub fn is_searchable(query: &str) -> bool {
    query.chars().count() >= MIN_QUERY_LEN
}

/// Filter the three collections and concatenate the matches.
pub fn filter_items(
    query: &SearchQuery,
    notes: Vec<Note>,
    images: Vec<ImageItem>,
    pdfs: Vec<PdfItem>,
) -> Vec<VaultItemType> {
    let notes = notes
        .into_iter()
        .filter(|note| query.matches_note(note))
        .map(VaultItemType::from);
    let images = images
        .into_iter()
        .filter(|image| query.matches_title(image))
        .map(VaultItemType::from);
    let pdfs = pdfs
        .into_iter()
        .filter(|pdf| query.matches_title(pdf))
        .map(VaultItemType::from);

    notes.chain(images).chain(pdfs).collect()
}
