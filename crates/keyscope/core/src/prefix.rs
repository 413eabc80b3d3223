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

//! Known prefix registry.
//!
//! Prefixes are loaded one per line, trimmed, and deduplicated. Blank lines are
//! dropped, so the registry never holds an empty prefix.

use std::collections::BTreeSet;
use std::path::Path;

use tracing::debug;

use crate::error::{ProfileError, ProfileResult};
use crate::sampler::GroupSampler;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefixRegistry {
    prefixes: BTreeSet<String>,
}

impl PrefixRegistry {
    pub fn load<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let prefixes = lines.into_iter().map(|line| line.as_ref().trim().to_string()).filter(|line| !line.is_empty()).collect();
        Self { prefixes }
    }

    pub fn load_file(path: impl AsRef<Path>) -> ProfileResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ProfileError::PrefixFile { path: path.to_path_buf(), source })?;
        let registry = Self::load(content.lines());
        debug!("Loaded {} known prefixes from {}", registry.len(), path.display());
        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    pub fn contains(&self, prefix: &str) -> bool {
        self.prefixes.contains(prefix)
    }

    /// All prefixes, longest first. Equal lengths keep lexicographic order.
    pub fn ordered_by_length(&self) -> Vec<&str> {
        let mut ordered: Vec<&str> = self.prefixes.iter().map(String::as_str).collect();
        // Stable sort over an already sorted set keeps ties lexicographic.
        ordered.sort_by(|a, b| b.len().cmp(&a.len()));
        ordered
    }

    /// All prefixes ascending by matched count, unmatched prefixes counting as zero.
    pub fn ordered_by_count(&self, groups: &GroupSampler) -> Vec<&str> {
        let mut ordered: Vec<(&str, u64)> = self.prefixes.iter().map(|prefix| (prefix.as_str(), groups.get(prefix).map_or(0, |summary| summary.count))).collect();
        ordered.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
        ordered.into_iter().map(|(prefix, _)| prefix).collect()
    }
}
