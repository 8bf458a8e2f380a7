//! Bluvera Core Library
//!
//! Core library for Bluvera - a personal vault for notes, images and PDFs.
//! Provides the following capabilities:
//! - Typed vault items (notes, images, PDFs) with store-assigned ids and timestamps
//! - `VaultStore`: CRUD over three collections in a pluggable key-value backend
//! - Case-insensitive substring search across titles and note content
//! - Data-URL upload helpers and date formatting for front ends
//!
//! Pipeline: Upload (data URL) -> Store (JSON collection) -> Search/List

pub mod config;
pub mod display;
pub mod error;
pub mod item;
pub mod search;
pub mod storage;
pub mod store;
pub mod upload;
pub mod utils;

// Re-export main types
pub use config::{Backend, Config};
pub use display::{format_date, format_date_in};
pub use error::{Result, VaultError};
pub use item::{
    ImageItem, ItemKind, ItemMeta, MediaDraft, Note, NoteDraft, NoteUpdate, PdfItem, Record,
    VaultItemType,
};
pub use storage::{KeyValueStore, MemoryStore, SqliteStore};
pub use store::{VaultCounts, VaultStore, DEFAULT_NAMESPACE};
pub use upload::{read_as_data_url, Upload, UploadKind};
