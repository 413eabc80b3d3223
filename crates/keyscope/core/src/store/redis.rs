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

//! Redis-backed key store.
//!
//! Enumeration uses `SCAN cursor [MATCH pattern] COUNT n`. Introspection issues
//! `TYPE key` followed by the cardinality command for that kind (`STRLEN`,
//! `LLEN`, `SCARD`, `ZCARD`, `HLEN`, `XLEN`), so every sampled key costs two
//! round-trips.
//!
//! The connection is synchronous. Timeouts and reconnection are left to the
//! `redis` client defaults.

use redis::{Client, Connection, IntoConnectionInfo, RedisError};
use tracing::info;

use super::{Cursor, KeyInfo, KeyStore, ScanPage, StoreError, StoreResult, ValueKind};

pub struct RedisKeyStore {
    connection: Connection,
    match_pattern: Option<String>,
}

impl RedisKeyStore {
    /// Open a connection and verify it with `PING`. `target` is a URL such as
    /// `redis://127.0.0.1:6379/0` or a prebuilt [`redis::ConnectionInfo`].
    pub fn connect(target: impl IntoConnectionInfo) -> StoreResult<Self> {
        let client = Client::open(target).map_err(|e| StoreError::Connection(e.to_string()))?;
        let mut connection = client.get_connection().map_err(|e| StoreError::Connection(e.to_string()))?;

        let pong: String = redis::cmd("PING").query(&mut connection).map_err(|e| StoreError::Connection(e.to_string()))?;
        info!(reply = %pong, "Connected to redis at {}", client.get_connection_info().addr);

        Ok(Self { connection, match_pattern: None })
    }

    /// Restrict enumeration to keys matching a glob-style `MATCH` pattern.
    pub fn with_match_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.match_pattern = Some(pattern.into());
        self
    }
}

fn command_error(command: &'static str, err: RedisError) -> StoreError {
    StoreError::Command { command, reason: err.to_string() }
}

fn size_command(kind: ValueKind) -> Option<&'static str> {
    match kind {
        ValueKind::String => Some("STRLEN"),
        ValueKind::List => Some("LLEN"),
        ValueKind::Set => Some("SCARD"),
        ValueKind::SortedSet => Some("ZCARD"),
        ValueKind::Hash => Some("HLEN"),
        ValueKind::Stream => Some("XLEN"),
        ValueKind::None => None,
    }
}

impl KeyStore for RedisKeyStore {
    fn scan_batch(&mut self, cursor: Cursor, count: usize) -> StoreResult<ScanPage> {
        let mut cmd = redis::cmd("SCAN");
        cmd.arg(cursor.value());
        if let Some(pattern) = &self.match_pattern {
            cmd.arg("MATCH").arg(pattern);
        }
        cmd.arg("COUNT").arg(count);

        // Binary keys are decoded lossily; their introspection then reports `none`.
        let (next, raw_keys): (u64, Vec<Vec<u8>>) = cmd.query(&mut self.connection).map_err(|e| command_error("SCAN", e))?;
        let keys = raw_keys.into_iter().map(|raw| String::from_utf8_lossy(&raw).into_owned()).collect();

        Ok(ScanPage { keys, next: Cursor::new(next) })
    }

    fn introspect(&mut self, key: &str) -> StoreResult<KeyInfo> {
        let type_name: String = redis::cmd("TYPE").arg(key).query(&mut self.connection).map_err(|e| command_error("TYPE", e))?;
        let kind: ValueKind = type_name.parse()?;

        let size = match size_command(kind) {
            Some(command) => redis::cmd(command).arg(key).query::<u64>(&mut self.connection).map_err(|e| command_error(command, e))?,
            None => 0,
        };

        Ok(KeyInfo::new(kind, size))
    }
}
