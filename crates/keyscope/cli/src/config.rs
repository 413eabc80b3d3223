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

use anyhow::{Context, Result};
use keyscope_core::ScanConfig;
use redis::{ConnectionAddr, ConnectionInfo, IntoConnectionInfo, RedisConnectionInfo};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub db: u32,
    pub password: Option<String>,
    /// Full connection URL; takes precedence over host/port/db/password.
    pub url: Option<String>,
    pub match_pattern: Option<String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            db: 0,
            password: None,
            url: None,
            match_pattern: None,
        }
    }
}

impl ConnectionConfig {
    /// Connection parameters. Host, port, db and password are passed as fields, never
    /// spliced into a URL, so the password may contain any character.
    pub fn connection_info(&self) -> Result<ConnectionInfo> {
        if let Some(url) = &self.url {
            return url.as_str().into_connection_info().with_context(|| format!("parsing redis url {}", self.display_target()));
        }
        Ok(ConnectionInfo {
            addr: ConnectionAddr::Tcp(self.host.clone(), self.port),
            redis: RedisConnectionInfo {
                db: i64::from(self.db),
                password: self.password.clone(),
                ..RedisConnectionInfo::default()
            },
        })
    }

    /// Connection target safe to log.
    pub fn display_target(&self) -> String {
        match &self.url {
            Some(url) => match url.rsplit_once('@') {
                Some((_, target)) => format!("redis://***@{target}"),
                None => url.clone(),
            },
            None => format!("{}:{}/{}", self.host, self.port, self.db),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyscopeConfig {
    pub connection: ConnectionConfig,
    /// Known prefix file. Patterns are inferred when unset.
    pub prefixes: Option<PathBuf>,
    pub scan: ScanConfig,
}

impl KeyscopeConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = toml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    pub fn resolve_config(cli_config: Option<PathBuf>) -> Result<Self> {
        if let Some(config_path) = cli_config {
            Self::load_from_file(config_path)
        } else if let Ok(env_config) = std::env::var("KEYSCOPE_CONFIG") {
            Self::load_from_file(env_config)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyscope_core::{InferenceHeuristic, SamplingPolicy};
    use std::io::Write;

    #[test]
    fn test_connection_info_from_parts() {
        let mut connection = ConnectionConfig::default();
        let info = connection.connection_info().unwrap();
        assert_eq!(info.addr, ConnectionAddr::Tcp("127.0.0.1".to_string(), 6379));
        assert_eq!(info.redis.db, 0);
        assert_eq!(info.redis.password, None);

        connection.password = Some("secret".to_string());
        connection.db = 3;
        let info = connection.connection_info().unwrap();
        assert_eq!(info.redis.db, 3);
        assert_eq!(info.redis.password.as_deref(), Some("secret"));
        assert_eq!(connection.display_target(), "127.0.0.1:6379/3");
    }

    #[test]
    fn test_password_with_reserved_characters_is_kept_verbatim() {
        let connection = ConnectionConfig { password: Some("p/ss#w@rd?x".to_string()), ..ConnectionConfig::default() };
        let info = connection.connection_info().unwrap();
        assert_eq!(info.redis.password.as_deref(), Some("p/ss#w@rd?x"));
        assert_eq!(info.addr, ConnectionAddr::Tcp("127.0.0.1".to_string(), 6379));
        assert!(!connection.display_target().contains("p/ss"));
    }

    #[test]
    fn test_explicit_url_wins_and_is_redacted() {
        let connection = ConnectionConfig { url: Some("redis://:pw@cache.internal:6380/1".to_string()), ..ConnectionConfig::default() };
        let info = connection.connection_info().unwrap();
        assert_eq!(info.addr, ConnectionAddr::Tcp("cache.internal".to_string(), 6380));
        assert_eq!(info.redis.db, 1);
        assert_eq!(info.redis.password.as_deref(), Some("pw"));
        assert_eq!(connection.display_target(), "redis://***@cache.internal:6380/1");
    }

    #[test]
    fn test_malformed_url_is_rejected() {
        let connection = ConnectionConfig { url: Some("not-a-url".to_string()), ..ConnectionConfig::default() };
        assert!(connection.connection_info().is_err());
    }

    #[test]
    fn test_load_partial_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
prefixes = "prefixes.txt"

[connection]
host = "10.0.0.5"

[scan]
max_scans = 5000
sampling = "reservoir"
inference = "last-dot"
"#
        )
        .unwrap();

        let config = KeyscopeConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.connection.host, "10.0.0.5");
        assert_eq!(config.connection.port, 6379);
        assert_eq!(config.prefixes, Some(PathBuf::from("prefixes.txt")));
        assert_eq!(config.scan.max_scans, 5000);
        assert_eq!(config.scan.scan_batch_size, 1000);
        assert_eq!(config.scan.sampling, SamplingPolicy::Reservoir);
        assert_eq!(config.scan.inference, InferenceHeuristic::LastDot);
    }

    #[test]
    fn test_explicit_config_path_is_required_to_exist() {
        assert!(KeyscopeConfig::resolve_config(Some(PathBuf::from("/nonexistent/keyscope.toml"))).is_err());
    }
}
