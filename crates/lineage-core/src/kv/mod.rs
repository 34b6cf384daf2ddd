//! Key-value persistence for whole-document JSON blobs.
//!
//! The relationship store never talks to a concrete backend; it is handed
//! anything implementing [`KeyValueStore`]. Each key holds one complete
//! document and a write replaces it entirely (last write wins).
//!
//! # Backends
//!
//! - [`MemoryStore`]: in-process map, used by tests and embedders
//! - [`JsonFileStore`]: one `<key>.json` file per key inside a directory

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use crate::Result;

/// Minimal string key-value store.
///
/// Read-modify-write sequences built on top of this trait are not atomic;
/// callers keep to one writer at a time.
pub trait KeyValueStore {
    /// Returns the stored value, or `None` if the key was never written.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replaces the value stored under `key`.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &mut S {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}
