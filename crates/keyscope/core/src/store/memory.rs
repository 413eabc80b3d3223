// Keyscope
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! In-memory key store.
//!
//! Keys are held in an ordered map so enumeration is deterministic. The cursor is
//! the offset of the next key to return. Failures can be injected for a given
//! enumeration call or for specific keys.

use std::collections::{BTreeMap, HashSet};

use super::{Cursor, KeyInfo, KeyStore, ScanPage, StoreError, StoreResult, ValueKind};

#[derive(Debug, Clone, Default)]
pub struct InMemoryKeyStore {
    entries: BTreeMap<String, KeyInfo>,
    failing_batch: Option<u64>,
    failing_keys: HashSet<String>,
    scan_calls: u64,
    introspect_calls: u64,
}

impl InMemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, kind: ValueKind, size: u64) -> &mut Self {
        self.entries.insert(key.into(), KeyInfo::new(kind, size));
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<KeyInfo> {
        self.entries.remove(key)
    }

    /// Make the `call`-th enumeration call (1-based) fail.
    pub fn fail_batch_at(&mut self, call: u64) -> &mut Self {
        self.failing_batch = Some(call);
        self
    }

    /// Make introspection of `key` fail.
    pub fn fail_introspection(&mut self, key: impl Into<String>) -> &mut Self {
        self.failing_keys.insert(key.into());
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn scan_calls(&self) -> u64 {
        self.scan_calls
    }

    pub fn introspect_calls(&self) -> u64 {
        self.introspect_calls
    }
}

impl<K: Into<String>> FromIterator<(K, ValueKind, u64)> for InMemoryKeyStore {
    fn from_iter<I: IntoIterator<Item = (K, ValueKind, u64)>>(iter: I) -> Self {
        let mut store = Self::new();
        for (key, kind, size) in iter {
            store.insert(key, kind, size);
        }
        store
    }
}

impl KeyStore for InMemoryKeyStore {
    fn scan_batch(&mut self, cursor: Cursor, count: usize) -> StoreResult<ScanPage> {
        self.scan_calls += 1;
        if self.failing_batch == Some(self.scan_calls) {
            return Err(StoreError::Command {
                command: "SCAN",
                reason: format!("injected failure at cursor {cursor}"),
            });
        }

        let offset = usize::try_from(cursor.value()).map_err(|_| StoreError::UnexpectedReply(format!("cursor {cursor} out of range")))?;
        let keys: Vec<String> = self.entries.keys().skip(offset).take(count).cloned().collect();
        let consumed = offset + keys.len();
        let next = if keys.is_empty() || consumed >= self.entries.len() { Cursor::START } else { Cursor::new(consumed as u64) };

        Ok(ScanPage { keys, next })
    }

    fn introspect(&mut self, key: &str) -> StoreResult<KeyInfo> {
        self.introspect_calls += 1;
        if self.failing_keys.contains(key) {
            return Err(StoreError::Command {
                command: "TYPE",
                reason: format!("injected failure for key '{key}'"),
            });
        }
        Ok(self.entries.get(key).copied().unwrap_or_else(KeyInfo::missing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_store() -> InMemoryKeyStore {
        (0..5).map(|i| (format!("key:{i}"), ValueKind::String, i as u64)).collect()
    }

    #[test]
    fn test_scan_walks_keys_in_order() {
        let mut store = sample_store();

        let first = store.scan_batch(Cursor::START, 2).unwrap();
        assert_eq!(first.keys, vec!["key:0", "key:1"]);
        assert_eq!(first.next, Cursor::new(2));

        let second = store.scan_batch(first.next, 2).unwrap();
        assert_eq!(second.keys, vec!["key:2", "key:3"]);

        let last = store.scan_batch(second.next, 2).unwrap();
        assert_eq!(last.keys, vec!["key:4"]);
        assert!(last.next.is_exhausted());
        assert_eq!(store.scan_calls(), 3);
    }

    #[test]
    fn test_empty_store_exhausts_immediately() {
        let mut store = InMemoryKeyStore::new();
        let page = store.scan_batch(Cursor::START, 10).unwrap();
        assert!(page.keys.is_empty());
        assert!(page.next.is_exhausted());
    }

    #[test]
    fn test_introspect_missing_key_reports_none() {
        let mut store = sample_store();
        store.remove("key:1");
        assert_eq!(store.introspect("key:1").unwrap(), KeyInfo::missing());
        assert_eq!(store.introspect("key:3").unwrap(), KeyInfo::new(ValueKind::String, 3));
    }

    #[test]
    fn test_injected_failures() {
        let mut store = sample_store();
        store.fail_batch_at(2).fail_introspection("key:0");

        assert!(store.scan_batch(Cursor::START, 2).is_ok());
        assert!(store.scan_batch(Cursor::new(2), 2).is_err());
        assert!(store.introspect("key:0").is_err());
        assert!(store.introspect("key:4").is_ok());
    }
}
