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

//! Final run summary.
//!
//! Groups are listed ascending by count so the heaviest groups end up next to
//! the totals. Rendering is left to callers; everything here is `Serialize`.

use serde::Serialize;

use crate::classify::{ClassificationMode, Classifier};
use crate::error::{ProfileError, ProfileResult};
use crate::sampler::{GroupSampler, GroupSummary};
use crate::scan::{KeyspaceAggregate, ScanState, ScanStatus};
use crate::store::ValueKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupReport {
    pub prefix: String,
    pub count: u64,
    pub estimated_average_size: u64,
    pub estimated_total_size: u64,
    pub observed_kind: Option<ValueKind>,
    pub multi_kind: bool,
    pub sample_count: u64,
}

impl GroupReport {
    fn new(prefix: &str, summary: Option<&GroupSummary>) -> Self {
        match summary {
            Some(summary) => Self {
                prefix: prefix.to_string(),
                count: summary.count,
                estimated_average_size: summary.estimated_average_size(),
                estimated_total_size: summary.estimated_total_size(),
                observed_kind: summary.observed_kind,
                multi_kind: summary.multi_kind,
                sample_count: summary.sample_count,
            },
            None => Self {
                prefix: prefix.to_string(),
                count: 0,
                estimated_average_size: 0,
                estimated_total_size: 0,
                observed_kind: None,
                multi_kind: false,
                sample_count: 0,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnknownReport {
    pub keys: Vec<String>,
    pub overflowed: bool,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunTotals {
    pub total_scanned: u64,
    pub total_matched: u64,
    pub total_unmatched: u64,
    pub batches: u64,
}

impl From<&ScanState> for RunTotals {
    fn from(state: &ScanState) -> Self {
        Self {
            total_scanned: state.total_scanned,
            total_matched: state.total_matched,
            total_unmatched: state.total_unmatched,
            batches: state.batches,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub status: ScanStatus,
    pub mode: ClassificationMode,
    pub groups: Vec<GroupReport>,
    pub unknown: UnknownReport,
    pub totals: RunTotals,
}

impl Report {
    /// Read the aggregate of a finished run. Failed or unfinished runs have no report.
    ///
    /// In known-prefix mode the group list is the classifier's own registry, so every
    /// registered prefix appears even when nothing matched it.
    pub fn assemble(classifier: &Classifier, aggregate: &KeyspaceAggregate, status: ScanStatus) -> ProfileResult<Self> {
        match status {
            ScanStatus::StoppedByLimit | ScanStatus::StoppedByExhaustion => {}
            ScanStatus::Scanning => return Err(ProfileError::ReportUnavailable("scan has not finished".to_string())),
            ScanStatus::Failed => return Err(ProfileError::ReportUnavailable("scan failed".to_string())),
        }

        let groups = match classifier.registry() {
            Some(registry) => registry.ordered_by_count(aggregate.groups()).into_iter().map(|prefix| GroupReport::new(prefix, aggregate.groups().get(prefix))).collect(),
            None => inferred_groups(aggregate.groups()),
        };

        let unknowns = aggregate.unknowns();
        Ok(Self {
            status,
            mode: classifier.mode(),
            groups,
            unknown: UnknownReport {
                keys: unknowns.retained().to_vec(),
                overflowed: unknowns.overflowed(),
                total: unknowns.total(),
            },
            totals: RunTotals::from(aggregate.state()),
        })
    }

    pub fn group(&self, prefix: &str) -> Option<&GroupReport> {
        self.groups.iter().find(|group| group.prefix == prefix)
    }

    pub fn estimated_total_size(&self) -> u64 {
        self.groups.iter().fold(0u64, |total, group| total.saturating_add(group.estimated_total_size))
    }
}

fn inferred_groups(groups: &GroupSampler) -> Vec<GroupReport> {
    let mut reports: Vec<GroupReport> = groups.iter().map(|(prefix, summary)| GroupReport::new(prefix, Some(summary))).collect();
    reports.sort_by(|a, b| a.count.cmp(&b.count).then_with(|| a.prefix.cmp(&b.prefix)));
    reports
}
