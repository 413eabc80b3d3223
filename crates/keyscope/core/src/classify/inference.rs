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

//! Pattern inference for runs without a known prefix list.
//!
//! Each heuristic strips a trailing variable component so that keys such as
//! `cache:0f2a` and `cache:91bc` collapse onto the same group `cache:`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ProfileError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InferenceHeuristic {
    /// Strip the trailing run of hexadecimal digits.
    #[default]
    HexSuffix,
    /// Strip everything after the last non-leading `.`.
    LastDot,
}

impl InferenceHeuristic {
    pub fn as_str(&self) -> &'static str {
        match self {
            InferenceHeuristic::HexSuffix => "hex-suffix",
            InferenceHeuristic::LastDot => "last-dot",
        }
    }
}

impl fmt::Display for InferenceHeuristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InferenceHeuristic {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hex-suffix" => Ok(InferenceHeuristic::HexSuffix),
            "last-dot" => Ok(InferenceHeuristic::LastDot),
            other => Err(ProfileError::InvalidConfiguration(format!("unknown inference heuristic '{other}'"))),
        }
    }
}

/// Derives a synthetic group key from a raw key. Every key maps to some group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AutoPatternInferencer {
    heuristic: InferenceHeuristic,
}

impl AutoPatternInferencer {
    pub fn new(heuristic: InferenceHeuristic) -> Self {
        Self { heuristic }
    }

    pub fn heuristic(&self) -> InferenceHeuristic {
        self.heuristic
    }

    pub fn infer<'a>(&self, key: &'a str) -> &'a str {
        match self.heuristic {
            InferenceHeuristic::HexSuffix => key.trim_end_matches(|c: char| c.is_ascii_hexdigit()),
            // The dot stays so the group reads as the literal key prefix.
            InferenceHeuristic::LastDot => match key.rfind('.') {
                Some(index) if index > 0 => &key[..=index],
                _ => key,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_suffix_stripping() {
        let inferencer = AutoPatternInferencer::new(InferenceHeuristic::HexSuffix);
        assert_eq!(inferencer.infer("cache:0f2a"), "cache:");
        assert_eq!(inferencer.infer("hello-world:test.key.2ccc32423243"), "hello-world:test.key.");
        assert_eq!(inferencer.infer("hello-world:test.key.333AdF34"), "hello-world:test.key.");
        assert_eq!(inferencer.infer("session:user"), "session:user");
        assert_eq!(inferencer.infer("deadbeef"), "");
    }

    #[test]
    fn test_hex_suffix_is_greedy_over_letters_a_to_f() {
        // Trailing "abc123" are all hex digits.
        let inferencer = AutoPatternInferencer::new(InferenceHeuristic::HexSuffix);
        assert_eq!(inferencer.infer("session:abc123"), "session:");
        assert_eq!(inferencer.infer("feed"), "");
    }

    #[test]
    fn test_last_dot_stripping() {
        let inferencer = AutoPatternInferencer::new(InferenceHeuristic::LastDot);
        assert_eq!(inferencer.infer("hello-world:test.key.2223432423243"), "hello-world:test.key.");
        assert_eq!(inferencer.infer("metrics.cpu"), "metrics.");
        assert_eq!(inferencer.infer(".hidden"), ".hidden");
        assert_eq!(inferencer.infer("no-dot-here"), "no-dot-here");
        assert_eq!(inferencer.infer("trailing."), "trailing.");
    }

    #[test]
    fn test_heuristic_parsing() {
        assert_eq!("last-dot".parse::<InferenceHeuristic>().unwrap(), InferenceHeuristic::LastDot);
        assert_eq!(InferenceHeuristic::HexSuffix.to_string(), "hex-suffix");
        assert!("regex".parse::<InferenceHeuristic>().is_err());
    }
}
