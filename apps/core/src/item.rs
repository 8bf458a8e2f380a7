//! Vault item model - notes, images and PDFs.
//!
//! Every item carries the same [`ItemMeta`] (id, title, timestamps, type tag),
//! flattened into its JSON object so the persisted layout stays
//! `{ "id", "type", "title", "createdAt", "updatedAt", ... }`.
//! Fields owned by the store (`id`, `type`, timestamps) are never part of
//! the caller-facing drafts.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discriminant of a vault item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Note,
    Image,
    Pdf,
}

impl ItemKind {
    /// All kinds, in search result order.
    pub const ALL: [ItemKind; 3] = [ItemKind::Note, ItemKind::Image, ItemKind::Pdf];

    /// Tag stored in the `type` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Image => "image",
            Self::Pdf => "pdf",
        }
    }

    /// Suffix of the storage key holding this collection.
    pub fn collection(&self) -> &'static str {
        match self {
            Self::Note => "notes",
            Self::Image => "images",
            Self::Pdf => "pdfs",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields shared by every vault item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemMeta {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub title: String,
    pub created_at: String,
    pub updated_at: String,
}

impl ItemMeta {
    /// Fresh metadata for a new item: random id, `createdAt == updatedAt == now`.
    pub fn new(kind: ItemKind, title: String, now: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            title,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Refresh `updatedAt` to `now`. It never moves backwards and never
    /// falls behind `createdAt`, even when the clock does.
    pub fn touch(&mut self, now: String) {
        let mut next = now;
        for floor in [&self.created_at, &self.updated_at] {
            if let (Some(candidate), Some(floor_ts)) = (parse_utc(&next), parse_utc(floor)) {
                if candidate < floor_ts {
                    next = floor.clone();
                }
            }
        }
        self.updated_at = next;
    }
}

fn parse_utc(ts: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(ts)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// A text note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    #[serde(flatten)]
    pub meta: ItemMeta,
    #[serde(default)]
    pub content: String,
}

/// An image, embedded as a data URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageItem {
    #[serde(flatten)]
    pub meta: ItemMeta,
    #[serde(rename = "dataUrl")]
    pub data_url: String,
}

/// A PDF document, embedded as a data URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfItem {
    #[serde(flatten)]
    pub meta: ItemMeta,
    #[serde(rename = "dataUrl")]
    pub data_url: String,
}

/// A record living in one of the vault collections.
pub trait Record: Serialize + DeserializeOwned + Clone {
    /// Collection this record type belongs to.
    const KIND: ItemKind;

    fn meta(&self) -> &ItemMeta;

    fn meta_mut(&mut self) -> &mut ItemMeta;

    fn id(&self) -> &str {
        &self.meta().id
    }

    fn title(&self) -> &str {
        &self.meta().title
    }
}

impl Record for Note {
    const KIND: ItemKind = ItemKind::Note;

    fn meta(&self) -> &ItemMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ItemMeta {
        &mut self.meta
    }
}

impl Record for ImageItem {
    const KIND: ItemKind = ItemKind::Image;

    fn meta(&self) -> &ItemMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ItemMeta {
        &mut self.meta
    }
}

impl Record for PdfItem {
    const KIND: ItemKind = ItemKind::Pdf;

    fn meta(&self) -> &ItemMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ItemMeta {
        &mut self.meta
    }
}

/// Any vault item, as returned by search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum VaultItemType {
    Note(Note),
    Image(ImageItem),
    Pdf(PdfItem),
}

impl VaultItemType {
    pub fn meta(&self) -> &ItemMeta {
        match self {
            Self::Note(note) => &note.meta,
            Self::Image(image) => &image.meta,
            Self::Pdf(pdf) => &pdf.meta,
        }
    }

    pub fn kind(&self) -> ItemKind {
        match self {
            Self::Note(_) => ItemKind::Note,
            Self::Image(_) => ItemKind::Image,
            Self::Pdf(_) => ItemKind::Pdf,
        }
    }

    pub fn id(&self) -> &str {
        &self.meta().id
    }

    pub fn title(&self) -> &str {
        &self.meta().title
    }
}

impl From<Note> for VaultItemType {
    fn from(note: Note) -> Self {
        Self::Note(note)
    }
}

impl From<ImageItem> for VaultItemType {
    fn from(image: ImageItem) -> Self {
        Self::Image(image)
    }
}

impl From<PdfItem> for VaultItemType {
    fn from(pdf: PdfItem) -> Self {
        Self::Pdf(pdf)
    }
}

/// Caller fields for a new note.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

/// Caller fields for a new image or PDF.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaDraft {
    pub title: String,
    pub data_url: String,
}

impl MediaDraft {
    pub fn new(title: impl Into<String>, data_url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            data_url: data_url.into(),
        }
    }
}

/// Partial update of a note. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl NoteUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none()
    }

    /// Shallow-merge into `note`. Timestamps are the store's business.
    pub fn apply(self, note: &mut Note) {
        if let Some(title) = self.title {
            note.meta.title = title;
        }
        if let Some(content) = self.content {
            note.content = content;
        }
    }
}
