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

use tracing::debug;

/// Keeps the first `max_retained` unmatched keys and counts the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnknownTracker {
    retained: Vec<String>,
    max_retained: usize,
    overflowed: bool,
    total: u64,
}

impl UnknownTracker {
    pub fn new(max_retained: usize) -> Self {
        Self {
            retained: Vec::with_capacity(max_retained.min(1024)),
            max_retained,
            overflowed: false,
            total: 0,
        }
    }

    pub fn observe(&mut self, key: &str) {
        self.total += 1;
        if self.retained.len() < self.max_retained {
            debug!(key, "Not matched");
            self.retained.push(key.to_string());
        } else {
            self.overflowed = true;
        }
    }

    pub fn retained(&self) -> &[String] {
        &self.retained
    }

    pub fn overflowed(&self) -> bool {
        self.overflowed
    }

    pub fn total(&self) -> u64 {
        self.total
    }
}
