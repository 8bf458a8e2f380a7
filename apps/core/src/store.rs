//! VaultStore - CRUD and search over the three vault collections.
//!
//! Each collection (notes, images, PDFs) is one JSON array stored under
//! `<namespace>-<collection>` in the injected [`KeyValueStore`]. Every
//! mutation reads the whole array, changes it, and writes the whole array
//! back. That is O(n) per operation, which is fine for a personal vault.
//!
//! Reads fail soft: an absent key, a backend read error, or a value that is
//! not a valid array all read as an empty collection. Inside a valid array,
//! records that do not decode or carry the wrong type are skipped one by one.

use crate::error::Result;
use crate::item::{
    ImageItem, ItemKind, ItemMeta, MediaDraft, Note, NoteDraft, NoteUpdate, PdfItem, Record,
    VaultItemType,
};
use crate::search::{self, SearchQuery};
use crate::storage::KeyValueStore;
use crate::utils::now_iso;
use tracing::{debug, warn};

/// Default key namespace, shared with the browser vault.
pub const DEFAULT_NAMESPACE: &str = "obsidian-vault-blue";

/// Number of items per collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VaultCounts {
    pub notes: usize,
    pub images: usize,
    pub pdfs: usize,
}

impl VaultCounts {
    pub fn total(&self) -> usize {
        self.notes + self.images + self.pdfs
    }
}

/// Persistence and query facade over the vault collections.
pub struct VaultStore<S: KeyValueStore> {
    backend: S,
    namespace: String,
}

impl<S: KeyValueStore> VaultStore<S> {
    /// Store using [`DEFAULT_NAMESPACE`].
    pub fn new(backend: S) -> Self {
        Self::with_namespace(backend, DEFAULT_NAMESPACE)
    }

    pub fn with_namespace(backend: S, namespace: impl Into<String>) -> Self {
        Self {
            backend,
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Storage key of a collection.
    pub fn key(&self, kind: ItemKind) -> String {
        format!("{}-{}", self.namespace, kind.collection())
    }

    // ============ GENERIC COLLECTION OPERATIONS ============

    /// All records of a collection, in insertion order.
    pub fn get_all<T: Record>(&self) -> Vec<T> {
        let key = self.key(T::KIND);

        let raw = match self.backend.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("[VaultStore] Cannot read {}: {}", key, e);
                return Vec::new();
            }
        };

        let values: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
            Ok(values) => values,
            Err(e) => {
                warn!("[VaultStore] Ignoring malformed collection {}: {}", key, e);
                return Vec::new();
            }
        };

        values
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| match serde_json::from_value::<T>(value) {
                Ok(record) if record.meta().kind == T::KIND => Some(record),
                Ok(record) => {
                    warn!(
                        "[VaultStore] Skipping {} record {} found in {}",
                        record.meta().kind,
                        record.id(),
                        key
                    );
                    None
                }
                Err(e) => {
                    warn!("[VaultStore] Skipping malformed record #{} in {}: {}", index, key, e);
                    None
                }
            })
            .collect()
    }

    /// Record with the given id, if present.
    pub fn find<T: Record>(&self, id: &str) -> Option<T> {
        self.get_all::<T>().into_iter().find(|record| record.id() == id)
    }

    /// Apply `change` to the record with the given id and persist.
    ///
    /// Returns `Ok(None)` without writing when the id is unknown. `id`,
    /// `type` and `createdAt` survive whatever `change` does, and `updatedAt`
    /// is always set to now afterwards.
    pub fn update_with<T: Record>(
        &mut self,
        id: &str,
        change: impl FnOnce(&mut T),
    ) -> Result<Option<T>> {
        let mut records = self.get_all::<T>();
        let Some(record) = records.iter_mut().find(|record| record.id() == id) else {
            return Ok(None);
        };

        let original = record.meta().clone();
        change(&mut *record);

        let meta = record.meta_mut();
        meta.id = original.id;
        meta.kind = original.kind;
        meta.created_at = original.created_at;
        meta.updated_at = original.updated_at;
        meta.touch(now_iso());

        let updated = record.clone();
        self.put_all(&records)?;
        Ok(Some(updated))
    }

    /// Remove the record with the given id.
    ///
    /// Returns `false` without writing when nothing matched.
    pub fn delete<T: Record>(&mut self, id: &str) -> Result<bool> {
        let mut records = self.get_all::<T>();
        let before = records.len();
        records.retain(|record| record.id() != id);

        if records.len() == before {
            return Ok(false);
        }

        self.put_all(&records)?;
        Ok(true)
    }

    fn insert<T: Record>(&mut self, title: String, build: impl FnOnce(ItemMeta) -> T) -> Result<T> {
        let mut records = self.get_all::<T>();

        let mut meta = ItemMeta::new(T::KIND, title, now_iso());
        while records.iter().any(|record| record.id() == meta.id) {
            meta.id = uuid::Uuid::new_v4().to_string();
        }

        let record = build(meta);
        records.push(record.clone());
        self.put_all(&records)?;
        Ok(record)
    }

    fn put_all<T: Record>(&mut self, records: &[T]) -> Result<()> {
        let key = self.key(T::KIND);
        let raw = serde_json::to_string(records)?;
        self.backend.set(&key, &raw)?;
        debug!(
            "[VaultStore] Wrote {} records to {} ({} bytes)",
            records.len(),
            key,
            raw.len()
        );
        Ok(())
    }

    // ============ NOTES ============

    pub fn get_notes(&self) -> Vec<Note> {
        self.get_all()
    }

    pub fn get_note(&self, id: &str) -> Option<Note> {
        self.find(id)
    }

    pub fn save_note(&mut self, draft: NoteDraft) -> Result<Note> {
        let NoteDraft { title, content } = draft;
        self.insert(title, |meta| Note { meta, content })
    }

    pub fn update_note(&mut self, id: &str, update: NoteUpdate) -> Result<Option<Note>> {
        self.update_with(id, |note: &mut Note| update.apply(note))
    }

    pub fn delete_note(&mut self, id: &str) -> Result<bool> {
        self.delete::<Note>(id)
    }

    // ============ IMAGES ============

    pub fn get_images(&self) -> Vec<ImageItem> {
        self.get_all()
    }

    pub fn get_image(&self, id: &str) -> Option<ImageItem> {
        self.find(id)
    }

    pub fn save_image(&mut self, draft: MediaDraft) -> Result<ImageItem> {
        let MediaDraft { title, data_url } = draft;
        self.insert(title, |meta| ImageItem { meta, data_url })
    }

    pub fn delete_image(&mut self, id: &str) -> Result<bool> {
        self.delete::<ImageItem>(id)
    }

    // ============ PDFS ============

    pub fn get_pdfs(&self) -> Vec<PdfItem> {
        self.get_all()
    }

    pub fn get_pdf(&self, id: &str) -> Option<PdfItem> {
        self.find(id)
    }

    pub fn save_pdf(&mut self, draft: MediaDraft) -> Result<PdfItem> {
        let MediaDraft { title, data_url } = draft;
        self.insert(title, |meta| PdfItem { meta, data_url })
    }

    pub fn delete_pdf(&mut self, id: &str) -> Result<bool> {
        self.delete::<PdfItem>(id)
    }

    // ============ SEARCH & STATS ============

    /// Matching notes, then images, then PDFs.
    ///
    /// A blank query returns nothing without touching storage.
    pub fn search_items(&self, query: &str) -> Vec<VaultItemType> {
        let Some(query) = SearchQuery::parse(query) else {
            return Vec::new();
        };

        search::filter_items(&query, self.get_notes(), self.get_images(), self.get_pdfs())
    }

    pub fn counts(&self) -> VaultCounts {
        VaultCounts {
            notes: self.get_notes().len(),
            images: self.get_images().len(),
            pdfs: self.get_pdfs().len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VaultError;
    use crate::storage::MemoryStore;
    use serde_json::json;
    use std::collections::HashSet;

    fn store() -> VaultStore<MemoryStore> {
        VaultStore::new(MemoryStore::new())
    }

    #[test]
    fn test_keys_use_namespace() {
        let store = VaultStore::with_namespace(MemoryStore::new(), "vault");
        assert_eq!(store.key(ItemKind::Note), "vault-notes");
        assert_eq!(store.key(ItemKind::Image), "vault-images");
        assert_eq!(store.key(ItemKind::Pdf), "vault-pdfs");
        assert_eq!(
            VaultStore::new(MemoryStore::new()).key(ItemKind::Note),
            "obsidian-vault-blue-notes"
        );
    }

    #[test]
    fn test_save_assigns_store_fields() -> Result<()> {
        let mut store = store();
        let note = store.save_note(NoteDraft::new("Shopping", "milk, eggs"))?;

        assert!(!note.meta.id.is_empty());
        assert_eq!(note.meta.kind, ItemKind::Note);
        assert_eq!(note.meta.created_at, note.meta.updated_at);
        assert_eq!(store.get_notes(), vec![note]);
        Ok(())
    }

    #[test]
    fn test_ids_unique_and_order_preserved() -> Result<()> {
        let mut store = store();
        for i in 0..50 {
            store.save_pdf(MediaDraft::new(format!("doc {}", i), "data:application/pdf;base64,"))?;
        }

        let pdfs = store.get_pdfs();
        let ids: HashSet<_> = pdfs.iter().map(|p| p.meta.id.clone()).collect();
        assert_eq!(ids.len(), 50);
        assert_eq!(pdfs[0].meta.title, "doc 0");
        assert_eq!(pdfs[49].meta.title, "doc 49");
        Ok(())
    }

    #[test]
    fn test_update_changes_only_given_fields() -> Result<()> {
        let mut store = store();
        let note = store.save_note(NoteDraft::new("Old", "body"))?;

        let updated = store
            .update_note(&note.meta.id, NoteUpdate::new().title("A"))?
            .expect("note exists");

        assert_eq!(updated.meta.title, "A");
        assert_eq!(updated.content, "body");
        assert_eq!(updated.meta.id, note.meta.id);
        assert_eq!(updated.meta.created_at, note.meta.created_at);
        assert!(updated.meta.updated_at >= note.meta.updated_at);
        assert_eq!(store.get_note(&note.meta.id), Some(updated));
        Ok(())
    }

    #[test]
    fn test_update_unknown_id_writes_nothing() -> Result<()> {
        let mut store = store();
        assert_eq!(store.update_note("missing", NoteUpdate::new().title("x"))?, None);
        assert!(store.backend().keys()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_update_with_cannot_touch_identity() -> Result<()> {
        let mut store = store();
        let image = store.save_image(MediaDraft::new("Cat", "data:image/png;base64,AA=="))?;

        let updated = store
            .update_with(&image.meta.id, |img: &mut ImageItem| {
                img.meta.id = "hijacked".to_string();
                img.meta.kind = ItemKind::Pdf;
                img.meta.created_at = "1999-01-01T00:00:00.000Z".to_string();
                img.meta.updated_at = "1999-01-01T00:00:00.000Z".to_string();
                img.meta.title = "Dog".to_string();
            })?
            .expect("image exists");

        assert_eq!(updated.meta.id, image.meta.id);
        assert_eq!(updated.meta.kind, ItemKind::Image);
        assert_eq!(updated.meta.created_at, image.meta.created_at);
        assert!(updated.meta.updated_at >= image.meta.created_at);
        assert_eq!(updated.meta.title, "Dog");
        Ok(())
    }

    #[test]
    fn test_delete_is_idempotent() -> Result<()> {
        let mut store = store();
        let keep = store.save_image(MediaDraft::new("keep", "data:image/png;base64,"))?;
        let gone = store.save_image(MediaDraft::new("gone", "data:image/png;base64,"))?;

        assert!(store.delete_image(&gone.meta.id)?);
        assert!(!store.delete_image(&gone.meta.id)?);
        assert!(!store.delete_image("never-existed")?);
        assert_eq!(store.get_images(), vec![keep]);
        Ok(())
    }

    #[test]
    fn test_malformed_collection_reads_empty() -> Result<()> {
        let mut backend = MemoryStore::new();
        backend.set("obsidian-vault-blue-notes", "{not json")?;
        backend.set("obsidian-vault-blue-images", "null")?;
        let mut store = VaultStore::new(backend);

        assert!(store.get_notes().is_empty());
        assert!(store.get_images().is_empty());

        // Next write replaces the corrupted value
        store.save_note(NoteDraft::new("fresh", ""))?;
        assert_eq!(store.get_notes().len(), 1);
        Ok(())
    }

    fn seed(backend: &mut MemoryStore, key: &str, records: serde_json::Value) -> Result<()> {
        backend.set(key, &records.to_string())
    }

    #[test]
    fn test_mismatched_type_skipped() -> Result<()> {
        let mut backend = MemoryStore::new();
        let ts = "2024-01-01T00:00:00.000Z";
        seed(
            &mut backend,
            "obsidian-vault-blue-pdfs",
            json!([
                {"id": "1", "type": "pdf", "title": "ok",
                 "createdAt": ts, "updatedAt": ts, "dataUrl": "x"},
                {"id": "2", "type": "image", "title": "stray",
                 "createdAt": ts, "updatedAt": ts, "dataUrl": "y"}
            ]),
        )?;
        let store = VaultStore::new(backend);

        let pdfs = store.get_pdfs();
        assert_eq!(pdfs.len(), 1);
        assert_eq!(pdfs[0].meta.id, "1");
        Ok(())
    }

    #[test]
    fn test_malformed_record_does_not_hide_siblings() -> Result<()> {
        let mut backend = MemoryStore::new();
        let ts = "2024-01-01T00:00:00.000Z";
        seed(
            &mut backend,
            "obsidian-vault-blue-notes",
            json!([
                {"id": "1", "type": "note", "title": "keep", "content": "",
                 "createdAt": ts, "updatedAt": ts},
                {"id": "2", "type": "note", "content": "no title",
                 "createdAt": ts, "updatedAt": ts}
            ]),
        )?;
        let mut store = VaultStore::new(backend);

        assert_eq!(store.get_notes().len(), 1);
        store.save_note(NoteDraft::new("fresh", ""))?;

        let titles: Vec<_> = store.get_notes().into_iter().map(|n| n.meta.title).collect();
        assert_eq!(titles, vec!["keep", "fresh"]);
        Ok(())
    }

    #[test]
    fn test_update_never_moves_updated_at_backwards() -> Result<()> {
        let mut backend = MemoryStore::new();
        seed(
            &mut backend,
            "obsidian-vault-blue-notes",
            json!([
                {"id": "n1", "type": "note", "title": "Later", "content": "",
                 "createdAt": "2020-01-01T00:00:00.000Z",
                 "updatedAt": "2099-01-01T00:00:00.000Z"}
            ]),
        )?;
        let mut store = VaultStore::new(backend);

        let updated = store
            .update_note("n1", NoteUpdate::new().title("A"))?
            .expect("note exists");
        assert_eq!(updated.meta.title, "A");
        assert_eq!(updated.meta.updated_at, "2099-01-01T00:00:00.000Z");
        assert_eq!(updated.meta.created_at, "2020-01-01T00:00:00.000Z");
        Ok(())
    }

    #[test]
    fn test_quota_error_keeps_collection() -> Result<()> {
        let mut store = VaultStore::new(MemoryStore::with_quota(400));
        store.save_note(NoteDraft::new("small", "x"))?;

        let err = store
            .save_image(MediaDraft::new("big", "x".repeat(1000)))
            .unwrap_err();
        assert!(matches!(err, VaultError::QuotaExceeded { .. }));
        assert!(store.get_images().is_empty());
        assert_eq!(store.get_notes().len(), 1);
        Ok(())
    }

    #[test]
    fn test_search_blank_and_counts() -> Result<()> {
        let mut store = store();
        store.save_note(NoteDraft::new("a", "b"))?;
        store.save_pdf(MediaDraft::new("c", ""))?;

        assert!(store.search_items("   ").is_empty());
        assert_eq!(
            store.counts(),
            VaultCounts {
                notes: 1,
                images: 0,
                pdfs: 1
            }
        );
        assert_eq!(store.counts().total(), 2);
        Ok(())
    }
}
