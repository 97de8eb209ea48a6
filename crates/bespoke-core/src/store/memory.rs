use dashmap::DashMap;
use std::collections::{BTreeMap, VecDeque};

use super::{KeyValueStore, StoreResult};
use crate::errors::StoreError;

/// Almacén en memoria para un único proceso y para tests.
#[derive(Default)]
pub struct InMemoryStore {
    strings: DashMap<String, String>,
    hashes: DashMap<String, BTreeMap<String, String>>,
    lists: DashMap<String, VecDeque<String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.strings.get(key).map(|v| v.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.strings.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn set_if_absent(&self, key: &str, value: &str) -> StoreResult<bool> {
        let mut inserted = false;
        self.strings.entry(key.to_string()).or_insert_with(|| {
                                                inserted = true;
                                                value.to_string()
                                            });
        Ok(inserted)
    }

    fn incr(&self, key: &str) -> StoreResult<i64> {
        let mut entry = self.strings.entry(key.to_string()).or_insert_with(|| "0".to_string());
        let current: i64 = entry.value()
                                .parse()
                                .map_err(|_| StoreError::Codec(format!("value at {key} is not an integer")))?;
        let next = current + 1;
        *entry.value_mut() = next.to_string();
        Ok(next)
    }

    fn hget(&self, key: &str, field: &str) -> StoreResult<Option<String>> {
        Ok(self.hashes.get(key).and_then(|h| h.get(field).cloned()))
    }

    fn hset(&self, key: &str, field: &str, value: &str) -> StoreResult<()> {
        self.hashes
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
        Ok(())
    }

    fn hset_if_absent(&self, key: &str, field: &str, value: &str) -> StoreResult<bool> {
        let mut hash = self.hashes.entry(key.to_string()).or_default();
        if hash.contains_key(field) {
            return Ok(false);
        }
        hash.insert(field.to_string(), value.to_string());
        Ok(true)
    }

    fn hgetall(&self, key: &str) -> StoreResult<BTreeMap<String, String>> {
        Ok(self.hashes.get(key).map(|h| h.value().clone()).unwrap_or_default())
    }

    fn rpush(&self, key: &str, value: &str) -> StoreResult<()> {
        self.lists.entry(key.to_string()).or_default().push_back(value.to_string());
        Ok(())
    }

    fn lpop(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.lists.get_mut(key).and_then(|mut l| l.pop_front()))
    }

    fn lrange_all(&self, key: &str) -> StoreResult<Vec<String>> {
        Ok(self.lists
               .get(key)
               .map(|l| l.iter().cloned().collect())
               .unwrap_or_default())
    }

    fn lrem(&self, key: &str, value: &str) -> StoreResult<usize> {
        let Some(mut list) = self.lists.get_mut(key) else {
            return Ok(0);
        };
        let before = list.len();
        list.retain(|v| v != value);
        Ok(before - list.len())
    }

    fn llen(&self, key: &str) -> StoreResult<usize> {
        Ok(self.lists.get(key).map(|l| l.len()).unwrap_or(0))
    }
}
