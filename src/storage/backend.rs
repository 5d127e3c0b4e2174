//! Storage backend implementations.
//!
//! - InMemoryStore: ordered, ephemeral key-value store
//! - TypedStore: bincode-encoded typed values over any backend
//!
//! Prefix scans return keys in ascending byte order. Ids are encoded
//! big-endian so that byte order and numeric order agree, which is what
//! keeps iteration deterministic across replicas.

use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::{Error, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// STORAGE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Key type for storage operations
pub type StorageKey = Vec<u8>;

/// Value type for storage operations
pub type StorageValue = Vec<u8>;

/// Trait for storage backends
pub trait StorageBackend: Send + Sync {
    /// Get a value by key
    fn get(&self, key: &[u8]) -> Result<Option<StorageValue>>;

    /// Set a value for a key
    fn set(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Delete a key
    fn delete(&self, key: &[u8]) -> Result<bool>;

    /// Check if a key exists
    fn exists(&self, key: &[u8]) -> Result<bool>;

    /// List all keys with a given prefix, in ascending order
    fn list_prefix(&self, prefix: &[u8]) -> Result<Vec<StorageKey>>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// IN-MEMORY STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// In-memory storage backend
#[derive(Debug, Default)]
pub struct InMemoryStore {
    data: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl InMemoryStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get number of entries
    pub fn len(&self) -> usize {
        self.data.read().map(|data| data.len()).unwrap_or(0)
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lock_error(e: impl std::fmt::Display) -> Error {
    Error::Storage(format!("Lock error: {}", e))
}

impl StorageBackend for InMemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<StorageValue>> {
        let data = self.data.read().map_err(lock_error)?;
        Ok(data.get(key).cloned())
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let mut data = self.data.write().map_err(lock_error)?;
        data.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<bool> {
        let mut data = self.data.write().map_err(lock_error)?;
        Ok(data.remove(key).is_some())
    }

    fn exists(&self, key: &[u8]) -> Result<bool> {
        let data = self.data.read().map_err(lock_error)?;
        Ok(data.contains_key(key))
    }

    fn list_prefix(&self, prefix: &[u8]) -> Result<Vec<StorageKey>> {
        let data = self.data.read().map_err(lock_error)?;
        Ok(data
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TYPED STORE WRAPPER
// ═══════════════════════════════════════════════════════════════════════════════

/// Type-safe wrapper around a storage backend
pub struct TypedStore<B: StorageBackend> {
    backend: B,
}

impl<B: StorageBackend> TypedStore<B> {
    /// Create a new typed store
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Get a typed value
    pub fn get<T: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<T>> {
        match self.backend.get(key)? {
            Some(data) => {
                let value = bincode::deserialize(&data).map_err(|e| {
                    Error::Deserialization(format!("Failed to deserialize value: {}", e))
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Set a typed value
    pub fn set<T: Serialize>(&self, key: &[u8], value: &T) -> Result<()> {
        let data = bincode::serialize(value).map_err(|e| {
            Error::Serialization(format!("Failed to serialize value: {}", e))
        })?;
        self.backend.set(key, &data)
    }

    /// Delete a value
    pub fn delete(&self, key: &[u8]) -> Result<bool> {
        self.backend.delete(key)
    }

    /// Check if a key exists
    pub fn exists(&self, key: &[u8]) -> Result<bool> {
        self.backend.exists(key)
    }

    /// Load every value under a prefix, in key order
    pub fn values_with_prefix<T: DeserializeOwned>(&self, prefix: &[u8]) -> Result<Vec<T>> {
        let mut values = Vec::new();
        for key in self.backend.list_prefix(prefix)? {
            if let Some(value) = self.get(&key)? {
                values.push(value);
            }
        }
        Ok(values)
    }

    /// Get the underlying backend
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// KEY PREFIXES
// ═══════════════════════════════════════════════════════════════════════════════

/// Key prefixes for different data types
pub mod prefixes {
    /// Borrow position prefix
    pub const BORROW: &[u8] = b"brw:";
    /// Open borrow id list
    pub const BORROW_IDS: &[u8] = b"brw-ids";
    /// Owner → borrow ids
    pub const OWNER_BORROWS: &[u8] = b"brw-own:";
    /// Owner + pool → borrow ids
    pub const OWNER_POOL_BORROWS: &[u8] = b"brw-own-pool:";
    /// Owner + pair → borrow id
    pub const OWNER_PAIR_BORROW: &[u8] = b"brw-own-pair:";
    /// Borrow id counter
    pub const BORROW_COUNTER: &[u8] = b"brw-ctr";
    /// Pair borrow stats prefix
    pub const BORROW_STATS: &[u8] = b"brw-stats:";
    /// Lend position prefix
    pub const LEND: &[u8] = b"lnd:";
    /// Lending pair prefix
    pub const PAIR: &[u8] = b"pair:";
    /// Pool prefix
    pub const POOL: &[u8] = b"pool:";
    /// Asset prefix
    pub const ASSET: &[u8] = b"ast:";
    /// Asset rate stats prefix
    pub const RATES: &[u8] = b"rate:";
    /// Price prefix
    pub const PRICE: &[u8] = b"prc:";
    /// Account balance prefix
    pub const BALANCE: &[u8] = b"bal:";
    /// Reserve balance prefix
    pub const RESERVE: &[u8] = b"rsv:";
    /// Token supply prefix
    pub const SUPPLY: &[u8] = b"sup:";
    /// Locked vault prefix
    pub const LOCKED_VAULT: &[u8] = b"lv:";
    /// Locked vault id counter
    pub const LOCKED_VAULT_COUNTER: &[u8] = b"lv-ctr";
    /// Locked vault history prefix
    pub const LOCKED_VAULT_HISTORY: &[u8] = b"lvh:";
    /// Locked vault history counter
    pub const LOCKED_VAULT_HISTORY_COUNTER: &[u8] = b"lvh-ctr";
}

/// Create a key with a prefix
pub fn make_key(prefix: &[u8], key: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(prefix.len() + key.len());
    result.extend_from_slice(prefix);
    result.extend_from_slice(key);
    result
}

/// Create a key from a prefix and big-endian encoded ids
pub fn id_key(prefix: &[u8], ids: &[u64]) -> Vec<u8> {
    let mut result = Vec::with_capacity(prefix.len() + ids.len() * 8);
    result.extend_from_slice(prefix);
    for id in ids {
        result.extend_from_slice(&id.to_be_bytes());
    }
    result
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
