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

//! Keyspace Profiling Engine
//!
//! This crate walks the keyspace of a key-value store and explains what is
//! occupying it. Every key is classified into a group, either by the longest
//! matching known prefix or by a pattern inferred from the key itself, and each
//! group gets a count plus a sampled size estimate.
//!
//! # Core Components
//!
//! ## Prefix Registry
//! - Deduplicated known prefixes, ordered longest first for matching
//!
//! ## Classification
//! - Longest-prefix matching with a trie for large registries
//! - Hex-suffix and last-dot pattern inference
//!
//! ## Sampling
//! - Per-group counts with a bounded number of introspections
//! - First-N or reservoir sampling
//! - Mixed value kind detection
//!
//! ## Scan Coordination
//! - Cursor-driven enumeration with a max-scan stop policy
//! - Bounded capture of unmatched keys
//!
//! # Usage
//!
//! ```rust
//! use keyscope_core::{Classifier, InMemoryKeyStore, PrefixRegistry, ScanConfig, ScanCoordinator, ScanStatus, ValueKind};
//!
//! let mut store: InMemoryKeyStore = [
//!     ("user:1", ValueKind::Hash, 4),
//!     ("user:session:1", ValueKind::String, 32),
//!     ("tmp:1", ValueKind::String, 8),
//! ]
//! .into_iter()
//! .collect();
//!
//! let registry = PrefixRegistry::load(["user:", "user:session:"]);
//! let config = ScanConfig::default();
//! let mut coordinator = ScanCoordinator::new(&mut store, Classifier::known_prefixes(&registry), &config).unwrap();
//!
//! assert_eq!(coordinator.run().unwrap(), ScanStatus::StoppedByExhaustion);
//!
//! let report = coordinator.report().unwrap();
//! assert_eq!(report.group("user:session:").unwrap().count, 1);
//! assert_eq!(report.unknown.keys, vec!["tmp:1"]);
//! ```

pub mod classify;
pub mod config;
pub mod error;
pub mod prefix;
pub mod report;
pub mod sampler;
pub mod scan;
pub mod store;
pub mod unknown;

// Re-export commonly used types
pub use classify::{AutoPatternInferencer, Classification, ClassificationMode, Classifier, InferenceHeuristic, KnownPrefixClassifier, PrefixTrie};
pub use config::{SamplingPolicy, ScanConfig};
pub use error::{ProfileError, ProfileResult};
pub use prefix::PrefixRegistry;
pub use report::{GroupReport, Report, RunTotals, UnknownReport};
pub use sampler::{GroupSampler, GroupSummary};
pub use scan::{KeyspaceAggregate, ScanCoordinator, ScanState, ScanStatus};
#[cfg(feature = "redis-store")]
pub use store::RedisKeyStore;
pub use store::{Cursor, InMemoryKeyStore, KeyInfo, KeyStore, ScanPage, StoreError, StoreResult, ValueKind};
pub use unknown::UnknownTracker;
