//! Key-Value Store
//!
//! Flat, namespaced key-value storage for small unsigned values. The state machine
//! persists its globals through this interface, one key per field.

use heapless::{FnvIndexMap, String};

/// Longest supported key, including the namespace
pub const MAX_KEY_LEN: usize = 32;

/// Non-volatile key-value storage
pub trait KeyValueStore {
    type Error: core::fmt::Debug;

    /// Opens a namespace. All following calls refer to it until [`Self::end`].
    fn begin(&mut self, namespace: &str, read_only: bool) -> Result<(), Self::Error>;

    fn put_u8(&mut self, key: &str, value: u8) -> Result<(), Self::Error>;

    /// Reads a value, returning `default` if the key was never written
    fn get_u8(&mut self, key: &str, default: u8) -> Result<u8, Self::Error>;

    /// Removes all keys of the open namespace
    fn clear(&mut self) -> Result<(), Self::Error>;

    /// Closes the namespace and commits pending writes
    fn end(&mut self) -> Result<(), Self::Error>;
}

/// Errors of the [`MemoryStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// No namespace is open
    NotOpen,
    /// Write to a namespace opened read-only
    ReadOnly,
    /// Namespace plus key exceed [`MAX_KEY_LEN`]
    KeyTooLong,
    /// No room for another key
    Full,
}

/// Builds the flat key `namespace.key`
pub fn qualified_key(namespace: &str, key: &str) -> Option<String<MAX_KEY_LEN>> {
    let mut qualified = String::new();
    qualified.push_str(namespace).ok()?;
    qualified.push('.').ok()?;
    qualified.push_str(key).ok()?;
    Some(qualified)
}

/// RAM backed store. Contents survive for the lifetime of the value only.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: FnvIndexMap<String<MAX_KEY_LEN>, u8, 32>,
    namespace: Option<(String<MAX_KEY_LEN>, bool)>,
    /// Number of namespaces closed after being opened writable
    pub commits: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(&self, key: &str) -> Result<String<MAX_KEY_LEN>, StoreError> {
        let (namespace, _) = self.namespace.as_ref().ok_or(StoreError::NotOpen)?;
        qualified_key(namespace, key).ok_or(StoreError::KeyTooLong)
    }

    fn writable(&self) -> Result<(), StoreError> {
        match self.namespace {
            None => Err(StoreError::NotOpen),
            Some((_, true)) => Err(StoreError::ReadOnly),
            Some((_, false)) => Ok(()),
        }
    }

    /// Reads a raw entry regardless of any open namespace
    pub fn peek(&self, namespace: &str, key: &str) -> Option<u8> {
        let key = qualified_key(namespace, key)?;
        self.entries.get(&key).copied()
    }
}

impl KeyValueStore for MemoryStore {
    type Error = StoreError;

    fn begin(&mut self, namespace: &str, read_only: bool) -> Result<(), StoreError> {
        let mut name = String::new();
        name.push_str(namespace).map_err(|_| StoreError::KeyTooLong)?;
        self.namespace = Some((name, read_only));
        Ok(())
    }

    fn put_u8(&mut self, key: &str, value: u8) -> Result<(), StoreError> {
        self.writable()?;
        let key = self.key(key)?;
        self.entries.insert(key, value).map_err(|_| StoreError::Full)?;
        Ok(())
    }

    fn get_u8(&mut self, key: &str, default: u8) -> Result<u8, StoreError> {
        let key = self.key(key)?;
        Ok(self.entries.get(&key).copied().unwrap_or(default))
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.writable()?;
        let Some((namespace, _)) = self.namespace.clone() else {
            return Err(StoreError::NotOpen);
        };
        let prefix = qualified_key(&namespace, "").ok_or(StoreError::KeyTooLong)?;
        let stale: heapless::Vec<String<MAX_KEY_LEN>, 32> = self
            .entries
            .keys()
            .filter(|key| key.starts_with(prefix.as_str()))
            .cloned()
            .collect();
        for key in &stale {
            self.entries.remove(key);
        }
        Ok(())
    }

    fn end(&mut self) -> Result<(), StoreError> {
        match self.namespace.take() {
            Some((_, false)) => {
                self.commits += 1;
                Ok(())
            }
            Some((_, true)) => Ok(()),
            None => Err(StoreError::NotOpen),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_for_missing_key() {
        let mut store = MemoryStore::new();
        store.begin("fsm", true).unwrap();
        assert_eq!(store.get_u8("menuIdx", 7), Ok(7));
    }

    #[test]
    fn namespaces_are_separate() {
        let mut store = MemoryStore::new();
        store.begin("a", false).unwrap();
        store.put_u8("x", 1).unwrap();
        store.end().unwrap();
        store.begin("b", false).unwrap();
        store.put_u8("x", 2).unwrap();
        store.clear().unwrap();
        store.end().unwrap();

        assert_eq!(store.peek("a", "x"), Some(1));
        assert_eq!(store.peek("b", "x"), None);
        assert_eq!(store.commits, 2);
    }

    #[test]
    fn read_only_rejects_writes() {
        let mut store = MemoryStore::new();
        store.begin("fsm", true).unwrap();
        assert_eq!(store.put_u8("x", 1), Err(StoreError::ReadOnly));
        assert_eq!(store.clear(), Err(StoreError::ReadOnly));
        store.end().unwrap();
        assert_eq!(store.put_u8("x", 1), Err(StoreError::NotOpen));
    }
}
