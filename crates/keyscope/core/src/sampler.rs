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

//! Bounded Per-Group Sampling
//!
//! Every matched key bumps its group's count. Only a bounded number of keys per
//! group are introspected, since each introspection costs extra store
//! round-trips. Average and total value sizes are therefore estimates derived
//! from the sample.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::config::{SamplingPolicy, ScanConfig};
use crate::error::{ProfileError, ProfileResult};
use crate::store::{KeyStore, ValueKind};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupSummary {
    pub count: u64,
    pub observed_kind: Option<ValueKind>,
    pub multi_kind: bool,
    pub sample_count: u64,
    pub sample_size_sum: u64,
    /// Store round-trips spent on this group, including keys that vanished.
    pub introspections: u64,
    /// Sizes currently held by the reservoir. Empty under `FirstN`.
    #[serde(skip)]
    slots: Vec<u64>,
}

impl GroupSummary {
    pub fn estimated_average_size(&self) -> u64 {
        if self.sample_count == 0 { 0 } else { self.sample_size_sum / self.sample_count }
    }

    pub fn estimated_total_size(&self) -> u64 {
        self.estimated_average_size().saturating_mul(self.count)
    }

    /// Returns true when this sample turns the group multi-kind.
    fn record_kind(&mut self, kind: ValueKind) -> bool {
        match self.observed_kind {
            None => {
                self.observed_kind = Some(kind);
                false
            }
            Some(observed) if observed != kind && !self.multi_kind => {
                self.multi_kind = true;
                true
            }
            Some(_) => false,
        }
    }
}

enum SampleSlot {
    Append,
    Replace(usize),
}

#[derive(Debug)]
struct Sampling {
    max_samples: u64,
    policy: SamplingPolicy,
    rng: StdRng,
}

impl Sampling {
    fn choose_slot(&mut self, summary: &GroupSummary) -> Option<SampleSlot> {
        if self.max_samples == 0 {
            return None;
        }
        let within_budget = summary.introspections < self.max_samples;
        match self.policy {
            SamplingPolicy::FirstN => within_budget.then_some(SampleSlot::Append),
            SamplingPolicy::Reservoir => {
                if within_budget && summary.sample_count < self.max_samples {
                    return Some(SampleSlot::Append);
                }
                // Algorithm R: the key at position `count` survives with probability max/count.
                // Slots left empty by vanished keys are never refilled.
                let pick = self.rng.gen_range(0..summary.count);
                (pick < summary.sample_count).then_some(SampleSlot::Replace(pick as usize))
            }
        }
    }
}

#[derive(Debug)]
pub struct GroupSampler {
    groups: HashMap<String, GroupSummary>,
    sampling: Sampling,
}

impl GroupSampler {
    pub fn new(max_samples: u64, policy: SamplingPolicy, seed: u64) -> Self {
        Self {
            groups: HashMap::new(),
            sampling: Sampling {
                max_samples,
                policy,
                rng: StdRng::seed_from_u64(seed),
            },
        }
    }

    pub fn from_config(config: &ScanConfig) -> Self {
        Self::new(config.max_samples_per_group, config.sampling, config.sampling_seed)
    }

    /// Count `key` under `group` and introspect it if the group still takes samples.
    pub fn observe<S: KeyStore + ?Sized>(&mut self, group: &str, key: &str, store: &mut S) -> ProfileResult<()> {
        if let Some(summary) = self.groups.get_mut(group) {
            Self::observe_into(&mut self.sampling, summary, group, key, store)
        } else {
            let summary = self.groups.entry(group.to_string()).or_default();
            Self::observe_into(&mut self.sampling, summary, group, key, store)
        }
    }

    fn observe_into<S: KeyStore + ?Sized>(sampling: &mut Sampling, summary: &mut GroupSummary, group: &str, key: &str, store: &mut S) -> ProfileResult<()> {
        summary.count += 1;

        let Some(slot) = sampling.choose_slot(summary) else {
            return Ok(());
        };

        let info = store.introspect(key).map_err(|source| ProfileError::Introspection { key: key.to_string(), source })?;
        summary.introspections += 1;
        if info.kind == ValueKind::None {
            debug!(group, key, "Key vanished before introspection, not sampled");
            return Ok(());
        }

        if summary.record_kind(info.kind) {
            warn!(group, first = ?summary.observed_kind, second = %info.kind, "Group holds keys of more than one value kind");
        }

        match slot {
            SampleSlot::Append => {
                summary.sample_count += 1;
                summary.sample_size_sum = summary.sample_size_sum.saturating_add(info.size);
                if sampling.policy == SamplingPolicy::Reservoir {
                    summary.slots.push(info.size);
                }
            }
            SampleSlot::Replace(index) => {
                let evicted = std::mem::replace(&mut summary.slots[index], info.size);
                summary.sample_size_sum = summary.sample_size_sum.saturating_sub(evicted).saturating_add(info.size);
            }
        }
        Ok(())
    }

    pub fn get(&self, group: &str) -> Option<&GroupSummary> {
        self.groups.get(group)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &GroupSummary)> {
        self.groups.iter().map(|(group, summary)| (group.as_str(), summary))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn max_samples(&self) -> u64 {
        self.sampling.max_samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryKeyStore, MockKeyStore, StoreError};

    fn store_of(kind: ValueKind, sizes: &[u64]) -> InMemoryKeyStore {
        sizes.iter().enumerate().map(|(i, &size)| (format!("g:{i}"), kind, size)).collect()
    }

    #[test]
    fn test_sample_cap_is_respected() {
        let mut store = store_of(ValueKind::String, &[10, 20, 30, 40, 50]);
        let mut sampler = GroupSampler::new(2, SamplingPolicy::FirstN, 0);

        for i in 0..5 {
            sampler.observe("g:", &format!("g:{i}"), &mut store).unwrap();
        }

        let summary = sampler.get("g:").unwrap();
        assert_eq!(summary.count, 5);
        assert_eq!(summary.sample_count, 2);
        assert_eq!(summary.sample_size_sum, 30);
        assert_eq!(summary.estimated_average_size(), 15);
        assert_eq!(summary.estimated_total_size(), 75);
        assert_eq!(store.introspect_calls(), 2);
    }

    #[test]
    fn test_zero_cap_never_introspects() {
        let mut store = MockKeyStore::new();
        store.expect_introspect().never();
        let mut sampler = GroupSampler::new(0, SamplingPolicy::FirstN, 0);

        sampler.observe("g:", "g:1", &mut store).unwrap();
        let summary = sampler.get("g:").unwrap();
        assert_eq!(summary.count, 1);
        assert_eq!(summary.estimated_average_size(), 0);
        assert_eq!(summary.estimated_total_size(), 0);
        assert_eq!(summary.observed_kind, None);
    }

    #[test]
    fn test_multi_kind_detection() {
        let mut store: InMemoryKeyStore = [("g:1", ValueKind::Hash, 4), ("g:2", ValueKind::Hash, 6), ("g:3", ValueKind::List, 2)].into_iter().collect();
        let mut sampler = GroupSampler::new(10, SamplingPolicy::FirstN, 0);

        sampler.observe("g:", "g:1", &mut store).unwrap();
        sampler.observe("g:", "g:2", &mut store).unwrap();
        assert!(!sampler.get("g:").unwrap().multi_kind);

        sampler.observe("g:", "g:3", &mut store).unwrap();
        let summary = sampler.get("g:").unwrap();
        assert!(summary.multi_kind);
        assert_eq!(summary.observed_kind, Some(ValueKind::Hash));
    }

    #[test]
    fn test_kind_outside_sample_cap_is_ignored() {
        let mut store: InMemoryKeyStore = [("g:1", ValueKind::Set, 4), ("g:2", ValueKind::String, 6)].into_iter().collect();
        let mut sampler = GroupSampler::new(1, SamplingPolicy::FirstN, 0);

        sampler.observe("g:", "g:1", &mut store).unwrap();
        sampler.observe("g:", "g:2", &mut store).unwrap();
        assert!(!sampler.get("g:").unwrap().multi_kind);
    }

    #[test]
    fn test_vanished_key_is_not_sampled() {
        let mut store = store_of(ValueKind::String, &[8]);
        let mut sampler = GroupSampler::new(5, SamplingPolicy::FirstN, 0);

        sampler.observe("g:", "g:gone", &mut store).unwrap();
        sampler.observe("g:", "g:0", &mut store).unwrap();

        let summary = sampler.get("g:").unwrap();
        assert_eq!(summary.count, 2);
        assert_eq!(summary.sample_count, 1);
        assert_eq!(summary.observed_kind, Some(ValueKind::String));
        assert!(!summary.multi_kind);
        assert_eq!(summary.introspections, 2);
    }

    #[test]
    fn test_vanished_keys_use_up_the_introspection_cap() {
        let mut store = InMemoryKeyStore::new();
        let mut sampler = GroupSampler::new(2, SamplingPolicy::FirstN, 0);
        assert_eq!(sampler.max_samples(), 2);

        for i in 0..50 {
            sampler.observe("ttl:", &format!("ttl:{i}"), &mut store).unwrap();
        }

        let summary = sampler.get("ttl:").unwrap();
        assert_eq!(summary.count, 50);
        assert_eq!(summary.sample_count, 0);
        assert_eq!(summary.introspections, 2);
        assert_eq!(summary.observed_kind, None);
        assert_eq!(store.introspect_calls(), 2);
    }

    #[test]
    fn test_reservoir_with_vanished_keys_stays_consistent() {
        let mut store = store_of(ValueKind::Hash, &[5; 40]);
        store.remove("g:0");
        store.remove("g:1");
        let mut sampler = GroupSampler::new(4, SamplingPolicy::Reservoir, 9);

        for i in 0..40 {
            sampler.observe("g:", &format!("g:{i}"), &mut store).unwrap();
        }

        let summary = sampler.get("g:").unwrap();
        assert_eq!(summary.count, 40);
        assert_eq!(summary.sample_count, 2);
        assert_eq!(summary.slots.len(), 2);
        assert_eq!(summary.sample_size_sum, 10);
    }

    #[test]
    fn test_introspection_failure_propagates() {
        let mut store = MockKeyStore::new();
        store.expect_introspect().times(1).returning(|_| Err(StoreError::Command { command: "TYPE", reason: "connection reset".to_string() }));
        let mut sampler = GroupSampler::new(5, SamplingPolicy::FirstN, 0);

        let err = sampler.observe("g:", "g:1", &mut store).unwrap_err();
        match err {
            ProfileError::Introspection { key, .. } => assert_eq!(key, "g:1"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_reservoir_keeps_cap_and_consistent_sum() {
        let sizes: Vec<u64> = (1..=200).collect();
        let mut store = store_of(ValueKind::String, &sizes);
        let mut sampler = GroupSampler::new(8, SamplingPolicy::Reservoir, 42);

        for i in 0..sizes.len() {
            sampler.observe("g:", &format!("g:{i}"), &mut store).unwrap();
        }

        let summary = sampler.get("g:").unwrap();
        assert_eq!(summary.count, 200);
        assert_eq!(summary.sample_count, 8);
        assert_eq!(summary.slots.len(), 8);
        assert_eq!(summary.sample_size_sum, summary.slots.iter().sum::<u64>());
        // Later keys were considered, so introspection went beyond the first 8.
        assert!(store.introspect_calls() > 8);
        assert!(store.introspect_calls() < 200);
    }

    #[test]
    fn test_reservoir_is_deterministic_for_a_seed() {
        let sizes: Vec<u64> = (1..=100).map(|i| i * 3).collect();
        let run = |seed| {
            let mut store = store_of(ValueKind::List, &sizes);
            let mut sampler = GroupSampler::new(4, SamplingPolicy::Reservoir, seed);
            for i in 0..sizes.len() {
                sampler.observe("g:", &format!("g:{i}"), &mut store).unwrap();
            }
            sampler.get("g:").unwrap().sample_size_sum
        };
        assert_eq!(run(7), run(7));
    }

    #[test]
    fn test_groups_are_independent() {
        let mut store: InMemoryKeyStore = [("a:1", ValueKind::String, 1), ("b:1", ValueKind::Hash, 100)].into_iter().collect();
        let mut sampler = GroupSampler::new(3, SamplingPolicy::FirstN, 0);
        sampler.observe("a:", "a:1", &mut store).unwrap();
        sampler.observe("b:", "b:1", &mut store).unwrap();

        assert_eq!(sampler.len(), 2);
        assert_eq!(sampler.get("a:").unwrap().sample_size_sum, 1);
        assert_eq!(sampler.get("b:").unwrap().observed_kind, Some(ValueKind::Hash));
        assert!(sampler.get("c:").is_none());
    }
}
