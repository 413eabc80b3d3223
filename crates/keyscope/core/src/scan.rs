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

//! Scan Coordination
//!
//! A [`ScanCoordinator`] owns everything a run mutates, wrapped in a
//! [`KeyspaceAggregate`], and walks the store one batch at a time:
//!
//! ```text
//! Scanning ──(cursor returns to zero)──▶ StoppedByExhaustion
//!    │ ├────(max_scans reached)────────▶ StoppedByLimit
//!    │ └────(store error)──────────────▶ Failed
//! ```
//!
//! The limit is checked before each key, so `total_scanned` never exceeds
//! `max_scans`. Keys left over in the batch that hit the limit are dropped.

use serde::Serialize;
use std::fmt;
use tracing::{debug, info};

use crate::classify::{Classification, Classifier};
use crate::config::ScanConfig;
use crate::error::{ProfileError, ProfileResult};
use crate::report::Report;
use crate::sampler::GroupSampler;
use crate::store::{Cursor, KeyStore};
use crate::unknown::UnknownTracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScanStatus {
    Scanning,
    StoppedByLimit,
    StoppedByExhaustion,
    Failed,
}

impl ScanStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ScanStatus::Scanning)
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ScanStatus::Scanning => "scanning",
            ScanStatus::StoppedByLimit => "stopped by limit",
            ScanStatus::StoppedByExhaustion => "keyspace exhausted",
            ScanStatus::Failed => "failed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanState {
    pub cursor: Cursor,
    pub total_scanned: u64,
    pub total_matched: u64,
    pub total_unmatched: u64,
    pub batches: u64,
}

/// All state mutated by a single run.
#[derive(Debug)]
pub struct KeyspaceAggregate {
    groups: GroupSampler,
    unknowns: UnknownTracker,
    state: ScanState,
}

impl KeyspaceAggregate {
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            groups: GroupSampler::from_config(config),
            unknowns: UnknownTracker::new(config.max_unknown_retained),
            state: ScanState::default(),
        }
    }

    pub fn groups(&self) -> &GroupSampler {
        &self.groups
    }

    pub fn unknowns(&self) -> &UnknownTracker {
        &self.unknowns
    }

    pub fn state(&self) -> &ScanState {
        &self.state
    }
}

pub struct ScanCoordinator<'s, S: KeyStore + ?Sized> {
    store: &'s mut S,
    classifier: Classifier,
    batch_size: usize,
    limit: Option<u64>,
    aggregate: KeyspaceAggregate,
    status: ScanStatus,
}

impl<'s, S: KeyStore + ?Sized> ScanCoordinator<'s, S> {
    pub fn new(store: &'s mut S, classifier: Classifier, config: &ScanConfig) -> ProfileResult<Self> {
        config.validate()?;
        Ok(Self {
            store,
            classifier,
            batch_size: config.scan_batch_size,
            limit: config.scan_limit(),
            aggregate: KeyspaceAggregate::new(config),
            status: ScanStatus::Scanning,
        })
    }

    /// Drive the scan to a terminal state. A coordinator runs at most once.
    pub fn run(&mut self) -> ProfileResult<ScanStatus> {
        if self.status.is_terminal() {
            return Err(ProfileError::InvalidState(format!("scan already finished ({})", self.status)));
        }

        match self.drive() {
            Ok(status) => {
                self.status = status;
                Ok(status)
            }
            Err(err) => {
                self.status = ScanStatus::Failed;
                debug!(scanned = self.aggregate.state.total_scanned, "Scan aborted: {}", err);
                Err(err)
            }
        }
    }

    fn drive(&mut self) -> ProfileResult<ScanStatus> {
        loop {
            let cursor = self.aggregate.state.cursor;
            let page = self.store.scan_batch(cursor, self.batch_size).map_err(|source| ProfileError::StoreBatch { cursor, source })?;
            self.aggregate.state.batches += 1;

            for key in &page.keys {
                if self.limit_reached() {
                    info!(scanned = self.aggregate.state.total_scanned, "Limit reached");
                    return Ok(ScanStatus::StoppedByLimit);
                }
                self.process(key)?;
            }

            self.aggregate.state.cursor = page.next;
            let state = &self.aggregate.state;
            debug!(batch = state.batches, matched = state.total_matched, unmatched = state.total_unmatched, "Scanned: {}", state.total_scanned);

            if page.next.is_exhausted() {
                info!(scanned = state.total_scanned, batches = state.batches, "Keyspace exhausted");
                return Ok(ScanStatus::StoppedByExhaustion);
            }
            if self.limit_reached() {
                info!(scanned = state.total_scanned, "Limit reached");
                return Ok(ScanStatus::StoppedByLimit);
            }
        }
    }

    fn limit_reached(&self) -> bool {
        self.limit.is_some_and(|limit| self.aggregate.state.total_scanned >= limit)
    }

    fn process(&mut self, key: &str) -> ProfileResult<()> {
        self.aggregate.state.total_scanned += 1;
        match self.classifier.classify(key) {
            Classification::Matched(group) => {
                self.aggregate.groups.observe(group, key, &mut *self.store)?;
                self.aggregate.state.total_matched += 1;
            }
            Classification::Unmatched => {
                self.aggregate.unknowns.observe(key);
                self.aggregate.state.total_unmatched += 1;
            }
        }
        Ok(())
    }

    pub fn status(&self) -> ScanStatus {
        self.status
    }

    pub fn state(&self) -> &ScanState {
        &self.aggregate.state
    }

    pub fn aggregate(&self) -> &KeyspaceAggregate {
        &self.aggregate
    }

    /// Assemble the report. Only valid once the run stopped without failing.
    pub fn report(&self) -> ProfileResult<Report> {
        Report::assemble(&self.classifier, &self.aggregate, self.status)
    }
}
