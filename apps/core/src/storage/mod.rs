//! Storage module - Key-value backends for the vault.
//!
//! The vault never talks to a concrete database. It goes through the
//! [`KeyValueStore`] port, a synchronous string-to-string map in the spirit
//! of the browser's `localStorage`:
//! - [`MemoryStore`] keeps everything in process (tests, throwaway vaults)
//! - [`SqliteStore`] persists to a single `vault.db` file

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::Result;

/// Synchronous key-value storage port.
///
/// `set` replaces the whole value under a key; there is no merge and no
/// cross-process locking, so concurrent writers race and the last one wins.
pub trait KeyValueStore {
    /// Backend name (memory, sqlite)
    fn name(&self) -> &'static str;

    /// Read a value. `Ok(None)` when the key is absent.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Remove a key. Removing an absent key is not an error.
    fn remove(&mut self, key: &str) -> Result<()>;

    /// All keys currently present, sorted.
    fn keys(&self) -> Result<Vec<String>>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        (**self).remove(key)
    }

    fn keys(&self) -> Result<Vec<String>> {
        (**self).keys()
    }
}
