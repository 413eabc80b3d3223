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

//! Key Classification
//!
//! A run picks exactly one strategy up front:
//!
//! - **Known prefixes**: the longest registered prefix that the key starts with
//!   (byte-wise, case-sensitive). Small registries are searched linearly in
//!   length-descending order, larger ones through a [`PrefixTrie`]. Both give
//!   the same answer.
//! - **Inferred patterns**: an [`AutoPatternInferencer`] derives the group from
//!   the key itself. This strategy matches every key.

pub mod inference;
pub mod trie;

pub use inference::{AutoPatternInferencer, InferenceHeuristic};
pub use trie::PrefixTrie;

use serde::Serialize;

use crate::prefix::PrefixRegistry;

/// Registries larger than this are matched through a trie.
pub const TRIE_THRESHOLD: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification<'a> {
    Matched(&'a str),
    Unmatched,
}

/// Strategy in effect for a run, as shown in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "strategy", rename_all = "kebab-case")]
pub enum ClassificationMode {
    KnownPrefixes { prefixes: usize },
    Inferred { heuristic: InferenceHeuristic },
}

#[derive(Debug, Clone)]
enum PrefixIndex {
    Linear(Vec<String>),
    Trie(PrefixTrie),
}

#[derive(Debug, Clone)]
pub struct KnownPrefixClassifier {
    index: PrefixIndex,
    /// The registry the index was built from; reports list exactly these prefixes.
    registry: PrefixRegistry,
}

impl KnownPrefixClassifier {
    pub fn new(registry: &PrefixRegistry) -> Self {
        if registry.len() > TRIE_THRESHOLD { Self::trie(registry) } else { Self::linear(registry) }
    }

    /// Linear scan regardless of registry size.
    pub fn linear(registry: &PrefixRegistry) -> Self {
        let ordered: Vec<String> = registry.ordered_by_length().into_iter().map(str::to_string).collect();
        Self { index: PrefixIndex::Linear(ordered), registry: registry.clone() }
    }

    /// Trie lookup regardless of registry size.
    pub fn trie(registry: &PrefixRegistry) -> Self {
        let trie = registry.ordered_by_length().into_iter().collect();
        Self { index: PrefixIndex::Trie(trie), registry: registry.clone() }
    }

    pub fn longest_match(&self, key: &str) -> Option<&str> {
        match &self.index {
            // Longest-first order makes the first hit the most specific one.
            PrefixIndex::Linear(ordered) => ordered.iter().find(|prefix| key.starts_with(prefix.as_str())).map(String::as_str),
            PrefixIndex::Trie(trie) => trie.longest_match(key),
        }
    }

    pub fn uses_trie(&self) -> bool {
        matches!(self.index, PrefixIndex::Trie(_))
    }

    pub fn prefix_count(&self) -> usize {
        self.registry.len()
    }

    pub fn registry(&self) -> &PrefixRegistry {
        &self.registry
    }
}

#[derive(Debug, Clone)]
pub enum Classifier {
    KnownPrefixes(KnownPrefixClassifier),
    Inferred(AutoPatternInferencer),
}

impl Classifier {
    pub fn known_prefixes(registry: &PrefixRegistry) -> Self {
        Classifier::KnownPrefixes(KnownPrefixClassifier::new(registry))
    }

    pub fn inferred(heuristic: InferenceHeuristic) -> Self {
        Classifier::Inferred(AutoPatternInferencer::new(heuristic))
    }

    /// Known-prefix matching when a registry is supplied, inference otherwise.
    pub fn for_run(registry: Option<&PrefixRegistry>, heuristic: InferenceHeuristic) -> Self {
        match registry {
            Some(registry) => Self::known_prefixes(registry),
            None => Self::inferred(heuristic),
        }
    }

    pub fn classify<'a>(&'a self, key: &'a str) -> Classification<'a> {
        match self {
            Classifier::KnownPrefixes(classifier) => classifier.longest_match(key).map_or(Classification::Unmatched, Classification::Matched),
            Classifier::Inferred(inferencer) => Classification::Matched(inferencer.infer(key)),
        }
    }

    /// Registered prefixes in known-prefix mode.
    pub fn registry(&self) -> Option<&PrefixRegistry> {
        match self {
            Classifier::KnownPrefixes(classifier) => Some(classifier.registry()),
            Classifier::Inferred(_) => None,
        }
    }

    pub fn mode(&self) -> ClassificationMode {
        match self {
            Classifier::KnownPrefixes(classifier) => ClassificationMode::KnownPrefixes { prefixes: classifier.prefix_count() },
            Classifier::Inferred(inferencer) => ClassificationMode::Inferred { heuristic: inferencer.heuristic() },
        }
    }
}
