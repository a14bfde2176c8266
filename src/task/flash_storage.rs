//! Flash storage for the persisted settings
//!
//! Implements the namespaced key-value store of the state machine on top of the
//! `sequential-storage` map in the last two flash sectors. The sectors are reserved
//! in memory.x.
//!
//! # Layout
//! Each namespace is stored as a single map item: the key is the namespace name, the
//! value holds all of its `key = u8` pairs. `begin()` loads the item into RAM, writes
//! only touch the RAM copy, and `end()` stores it back when the namespace was opened
//! writable. A persist of the globals therefore costs one flash item, and
//! `sequential-storage` spreads those over both sectors.
//!
//! The state machine runs synchronously, so the async map operations are driven to
//! completion with `block_on` on top of the blocking flash driver.

use badge_core::store::{KeyValueStore, MAX_KEY_LEN};
use defmt::{debug, error, info};
use embassy_embedded_hal::adapter::BlockingAsync;
use embassy_futures::block_on;
use embassy_rp::flash::{Blocking, Flash, ERASE_SIZE};
use embassy_rp::peripherals::FLASH;
use heapless::{FnvIndexMap, String};
use sequential_storage::{
    cache::NoCache,
    map::{fetch_item, store_item, Key, SerializationError, Value},
};

use crate::system::resources::StorageResources;

/// Size of the flash chip
const FLASH_SIZE: usize = 2048 * 1024;

/// Number of sectors to use for storage (2 sectors for wear leveling)
const STORAGE_SECTOR_COUNT: usize = 2;

/// Total storage size
const STORAGE_SIZE: usize = ERASE_SIZE * STORAGE_SECTOR_COUNT;

/// Flash storage offset, the last 8KB. Must match memory.x.
const STORAGE_OFFSET: u32 = (FLASH_SIZE - STORAGE_SIZE) as u32;

/// Longest namespace name
const MAX_NAMESPACE_LEN: usize = 15;

/// Most keys per namespace
const MAX_ENTRIES: usize = 16;

/// Scratch buffer for one serialized namespace
const DATA_BUFFER_SIZE: usize = 512;

type StorageFlash = BlockingAsync<Flash<'static, FLASH, Blocking, FLASH_SIZE>>;

/// Errors of the [`FlashStore`]
#[derive(Debug)]
pub enum FlashStoreError {
    /// No namespace is open
    NotOpen,
    /// Write to a namespace opened read-only
    ReadOnly,
    /// Namespace or key name too long
    KeyTooLong,
    /// Namespace holds the maximum number of keys
    Full,
    /// The flash map failed
    Storage(sequential_storage::Error<embassy_rp::flash::Error>),
}

impl From<sequential_storage::Error<embassy_rp::flash::Error>> for FlashStoreError {
    fn from(e: sequential_storage::Error<embassy_rp::flash::Error>) -> Self {
        FlashStoreError::Storage(e)
    }
}

/// Map key: the namespace name
#[derive(Debug, Clone, PartialEq, Eq)]
struct NamespaceKey(String<MAX_NAMESPACE_LEN>);

impl NamespaceKey {
    fn new(name: &str) -> Result<Self, FlashStoreError> {
        let mut key = String::new();
        key.push_str(name).map_err(|_| FlashStoreError::KeyTooLong)?;
        Ok(Self(key))
    }
}

impl Key for NamespaceKey {
    fn serialize_into(&self, buffer: &mut [u8]) -> Result<usize, SerializationError> {
        let bytes = self.0.as_bytes();
        if buffer.len() < bytes.len() + 1 {
            return Err(SerializationError::BufferTooSmall);
        }
        buffer[0] = bytes.len() as u8;
        buffer[1..=bytes.len()].copy_from_slice(bytes);
        Ok(bytes.len() + 1)
    }

    fn deserialize_from(buffer: &[u8]) -> Result<(Self, usize), SerializationError>
    where
        Self: Sized,
    {
        let (&len, rest) = buffer.split_first().ok_or(SerializationError::BufferTooSmall)?;
        let len = usize::from(len);
        let name = rest.get(..len).ok_or(SerializationError::BufferTooSmall)?;
        let name = core::str::from_utf8(name).map_err(|_| SerializationError::InvalidFormat)?;
        let mut key = String::new();
        key.push_str(name).map_err(|_| SerializationError::InvalidFormat)?;
        Ok((Self(key), len + 1))
    }
}

/// Map value: all pairs of one namespace.
///
/// Serialized as the pair count followed by `key length, key, value` per pair.
#[derive(Debug, Clone, Default)]
struct NamespaceRecord(FnvIndexMap<String<MAX_KEY_LEN>, u8, MAX_ENTRIES>);

impl Value<'_> for NamespaceRecord {
    fn serialize_into(&self, buffer: &mut [u8]) -> Result<usize, SerializationError> {
        let mut pos = 0;
        let mut put = |bytes: &[u8]| {
            let end = pos + bytes.len();
            buffer
                .get_mut(pos..end)
                .ok_or(SerializationError::BufferTooSmall)?
                .copy_from_slice(bytes);
            pos = end;
            Ok::<(), SerializationError>(())
        };

        put(&[self.0.len() as u8])?;
        for (key, value) in self.0.iter() {
            put(&[key.len() as u8])?;
            put(key.as_bytes())?;
            put(&[*value])?;
        }
        Ok(pos)
    }

    fn deserialize_from(buffer: &[u8]) -> Result<Self, SerializationError>
    where
        Self: Sized,
    {
        let (&count, mut rest) = buffer.split_first().ok_or(SerializationError::BufferTooSmall)?;
        let mut record = NamespaceRecord::default();
        for _ in 0..count {
            let (&len, tail) = rest.split_first().ok_or(SerializationError::BufferTooSmall)?;
            let len = usize::from(len);
            let name = tail.get(..len).ok_or(SerializationError::BufferTooSmall)?;
            let &value = tail.get(len).ok_or(SerializationError::BufferTooSmall)?;
            rest = &tail[len + 1..];

            let name = core::str::from_utf8(name).map_err(|_| SerializationError::InvalidFormat)?;
            let mut key = String::new();
            key.push_str(name).map_err(|_| SerializationError::InvalidFormat)?;
            record.0.insert(key, value).map_err(|_| SerializationError::InvalidFormat)?;
        }
        Ok(record)
    }
}

/// Namespace currently between `begin()` and `end()`
struct OpenNamespace {
    key: NamespaceKey,
    record: NamespaceRecord,
    read_only: bool,
}

/// Key-value store in the reserved flash sectors
pub struct FlashStore {
    flash: StorageFlash,
    cache: NoCache,
    data_buffer: [u8; DATA_BUFFER_SIZE],
    open: Option<OpenNamespace>,
}

impl FlashStore {
    pub fn new(r: StorageResources) -> Self {
        info!(
            "storage: using {} bytes of flash at {:#x}",
            STORAGE_SIZE, STORAGE_OFFSET
        );
        Self {
            flash: BlockingAsync::new(Flash::new_blocking(r.flash)),
            cache: NoCache::new(),
            data_buffer: [0; DATA_BUFFER_SIZE],
            open: None,
        }
    }

    fn flash_range() -> core::ops::Range<u32> {
        STORAGE_OFFSET..(STORAGE_OFFSET + STORAGE_SIZE as u32)
    }

    fn load(&mut self, key: &NamespaceKey) -> Result<NamespaceRecord, FlashStoreError> {
        let record = block_on(fetch_item::<NamespaceKey, NamespaceRecord, _>(
            &mut self.flash,
            Self::flash_range(),
            &mut self.cache,
            &mut self.data_buffer,
            key,
        ))?;
        Ok(record.unwrap_or_default())
    }

    fn open_mut(&mut self) -> Result<&mut OpenNamespace, FlashStoreError> {
        self.open.as_mut().ok_or(FlashStoreError::NotOpen)
    }

    fn writable(&mut self) -> Result<&mut OpenNamespace, FlashStoreError> {
        let open = self.open_mut()?;
        if open.read_only {
            return Err(FlashStoreError::ReadOnly);
        }
        Ok(open)
    }
}

impl KeyValueStore for FlashStore {
    type Error = FlashStoreError;

    fn begin(&mut self, namespace: &str, read_only: bool) -> Result<(), FlashStoreError> {
        let key = NamespaceKey::new(namespace)?;
        let record = match self.load(&key) {
            Ok(record) => record,
            Err(e) => {
                // an unreadable namespace is replaced on the next write
                error!("storage: failed to load {}: {}", namespace, defmt::Debug2Format(&e));
                if read_only {
                    return Err(e);
                }
                NamespaceRecord::default()
            }
        };
        debug!("storage: opened {} with {} keys", namespace, record.0.len());
        self.open = Some(OpenNamespace { key, record, read_only });
        Ok(())
    }

    fn put_u8(&mut self, key: &str, value: u8) -> Result<(), FlashStoreError> {
        let open = self.writable()?;
        let mut name = String::new();
        name.push_str(key).map_err(|_| FlashStoreError::KeyTooLong)?;
        open.record.0.insert(name, value).map_err(|_| FlashStoreError::Full)?;
        Ok(())
    }

    fn get_u8(&mut self, key: &str, default: u8) -> Result<u8, FlashStoreError> {
        let open = self.open_mut()?;
        Ok(open
            .record
            .0
            .iter()
            .find(|(name, _)| name.as_str() == key)
            .map_or(default, |(_, value)| *value))
    }

    fn clear(&mut self) -> Result<(), FlashStoreError> {
        self.writable()?.record.0.clear();
        Ok(())
    }

    fn end(&mut self) -> Result<(), FlashStoreError> {
        let open = self.open.take().ok_or(FlashStoreError::NotOpen)?;
        if open.read_only {
            return Ok(());
        }

        block_on(store_item(
            &mut self.flash,
            Self::flash_range(),
            &mut self.cache,
            &mut self.data_buffer,
            &open.key,
            &open.record,
        ))?;
        debug!("storage: committed {} keys", open.record.0.len());
        Ok(())
    }
}
