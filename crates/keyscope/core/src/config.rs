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

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::classify::InferenceHeuristic;
use crate::error::{ProfileError, ProfileResult};

/// How a group picks which matched keys to introspect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SamplingPolicy {
    /// Introspect the first N keys of each group.
    #[default]
    FirstN,
    /// Keep a uniform random sample of N keys over the whole group.
    Reservoir,
}

impl fmt::Display for SamplingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SamplingPolicy::FirstN => f.write_str("first-n"),
            SamplingPolicy::Reservoir => f.write_str("reservoir"),
        }
    }
}

impl FromStr for SamplingPolicy {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first-n" => Ok(SamplingPolicy::FirstN),
            "reservoir" => Ok(SamplingPolicy::Reservoir),
            other => Err(ProfileError::InvalidConfiguration(format!("unknown sampling policy '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub scan_batch_size: usize,
    /// Zero means unlimited.
    pub max_scans: u64,
    pub max_unknown_retained: usize,
    pub max_samples_per_group: u64,
    pub sampling: SamplingPolicy,
    pub sampling_seed: u64,
    pub inference: InferenceHeuristic,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            scan_batch_size: 1000,
            max_scans: 0,
            max_unknown_retained: 100,
            max_samples_per_group: 100,
            sampling: SamplingPolicy::default(),
            sampling_seed: 0,
            inference: InferenceHeuristic::default(),
        }
    }
}

impl ScanConfig {
    pub fn validate(&self) -> ProfileResult<()> {
        if self.scan_batch_size == 0 {
            return Err(ProfileError::InvalidConfiguration("scan_batch_size must be positive".to_string()));
        }
        Ok(())
    }

    pub fn scan_limit(&self) -> Option<u64> {
        (self.max_scans > 0).then_some(self.max_scans)
    }
}
