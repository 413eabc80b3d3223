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

//! Key Store Abstraction
//!
//! The profiler only needs two things from the underlying store:
//!
//! - **Incremental enumeration**: `scan_batch` walks the keyspace with an opaque
//!   cursor. A returned cursor of zero means the whole keyspace was covered.
//! - **Introspection**: `introspect` reports the value kind of a key and its
//!   structural length (string length or collection cardinality).
//!
//! Both calls are blocking. Implementations are free to talk to a remote server
//! ([`RedisKeyStore`]) or to serve keys from memory ([`InMemoryKeyStore`]).

pub mod memory;
#[cfg(feature = "redis-store")]
pub mod redis;

pub use memory::InMemoryKeyStore;
#[cfg(feature = "redis-store")]
pub use self::redis::RedisKeyStore;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("{command} failed: {reason}")]
    Command { command: &'static str, reason: String },
    #[error("Unexpected reply: {0}")]
    UnexpectedReply(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Opaque enumeration cursor. Zero starts a scan and, when returned, ends it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cursor(u64);

impl Cursor {
    pub const START: Cursor = Cursor(0);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }

    pub fn is_exhausted(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Value kinds a store can report for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    String,
    List,
    Set,
    #[serde(rename = "zset")]
    SortedSet,
    Hash,
    Stream,
    /// The key vanished between enumeration and introspection.
    None,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::List => "list",
            ValueKind::Set => "set",
            ValueKind::SortedSet => "zset",
            ValueKind::Hash => "hash",
            ValueKind::Stream => "stream",
            ValueKind::None => "none",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(ValueKind::String),
            "list" => Ok(ValueKind::List),
            "set" => Ok(ValueKind::Set),
            "zset" => Ok(ValueKind::SortedSet),
            "hash" => Ok(ValueKind::Hash),
            "stream" => Ok(ValueKind::Stream),
            "none" => Ok(ValueKind::None),
            other => Err(StoreError::UnexpectedReply(format!("unknown value type '{other}'"))),
        }
    }
}

/// Kind and structural length of a single key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInfo {
    pub kind: ValueKind,
    pub size: u64,
}

impl KeyInfo {
    pub fn new(kind: ValueKind, size: u64) -> Self {
        Self { kind, size }
    }

    pub fn missing() -> Self {
        Self { kind: ValueKind::None, size: 0 }
    }
}

/// One page of keys returned by an enumeration call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanPage {
    pub keys: Vec<String>,
    pub next: Cursor,
}

#[cfg_attr(test, mockall::automock)]
pub trait KeyStore {
    /// Fetch the next page of keys. `count` is a hint, stores may return more or fewer.
    fn scan_batch(&mut self, cursor: Cursor, count: usize) -> StoreResult<ScanPage>;

    /// Report the value kind and structural length of `key`.
    fn introspect(&mut self, key: &str) -> StoreResult<KeyInfo>;
}
