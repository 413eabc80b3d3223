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

//! Plain-text report rendering.

use keyscope_core::{ClassificationMode, GroupReport, Report};
use std::fmt;

const RULE: &str = "------------------------------";

fn kind_label(group: &GroupReport) -> String {
    match (group.observed_kind, group.multi_kind) {
        (Some(kind), true) => format!("{kind}+mixed"),
        (Some(kind), false) => kind.to_string(),
        (None, _) => "-".to_string(),
    }
}

fn prefix_label(prefix: &str) -> &str {
    if prefix.is_empty() { "(empty)" } else { prefix }
}

/// Text table of a [`Report`], printed with `{}`.
pub struct TextReport<'a>(pub &'a Report);

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;

        match report.mode {
            ClassificationMode::KnownPrefixes { prefixes } => writeln!(f, "Grouping: {prefixes} known prefixes")?,
            ClassificationMode::Inferred { heuristic } => writeln!(f, "Grouping: inferred patterns ({heuristic})")?,
        }
        writeln!(f, "{RULE}")?;

        let width = report.groups.iter().map(|group| prefix_label(&group.prefix).len()).max().unwrap_or(0).max("PREFIX".len());
        writeln!(f, "{:<width$}  {:>12}  {:>10}  {:>14}  {:>8}  TYPE", "PREFIX", "COUNT", "AVG SIZE", "EST. TOTAL", "SAMPLED")?;
        for group in &report.groups {
            writeln!(
                f,
                "{:<width$}  {:>12}  {:>10}  {:>14}  {:>8}  {}",
                prefix_label(&group.prefix),
                group.count,
                group.estimated_average_size,
                group.estimated_total_size,
                group.sample_count,
                kind_label(group)
            )?;
        }

        if report.unknown.total > 0 {
            writeln!(f, "{RULE}")?;
            let shown = report.unknown.keys.len();
            let suffix = if report.unknown.overflowed { ", list truncated" } else { "" };
            writeln!(f, "Not matched: {} keys (showing {shown}{suffix})", report.unknown.total)?;
            for key in &report.unknown.keys {
                writeln!(f, "  {key}")?;
            }
        }

        let totals = &report.totals;
        writeln!(f, "{RULE}")?;
        writeln!(f, "Scanned: {} in {} batches ({})", totals.total_scanned, totals.batches, report.status)?;
        writeln!(f, "Matched: {}", totals.total_matched)?;
        writeln!(f, "Unmatched: {}", totals.total_unmatched)?;
        writeln!(f, "Estimated total size: {}", report.estimated_total_size())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyscope_core::{Classifier, InMemoryKeyStore, InferenceHeuristic, PrefixRegistry, ScanConfig, ScanCoordinator, ValueKind};

    fn sample_report() -> Report {
        let mut store: InMemoryKeyStore = [("user:1", ValueKind::Hash, 4), ("user:2", ValueKind::String, 8), ("misc", ValueKind::Set, 1)].into_iter().collect();
        let registry = PrefixRegistry::load(["user:", "cart:"]);
        let mut coordinator = ScanCoordinator::new(&mut store, Classifier::known_prefixes(&registry), &ScanConfig::default()).unwrap();
        coordinator.run().unwrap();
        coordinator.report().unwrap()
    }

    #[test]
    fn test_render_lists_groups_unknowns_and_totals() {
        let text = TextReport(&sample_report()).to_string();

        assert!(text.contains("Grouping: 2 known prefixes"));
        assert!(text.contains("hash+mixed"));
        assert!(text.contains("Not matched: 1 keys (showing 1)"));
        assert!(text.contains("  misc"));
        assert!(text.contains("Scanned: 3 in 1 batches (keyspace exhausted)"));
        assert!(text.contains("Estimated total size: 12"));

        let cart = text.find("cart:").unwrap();
        let user = text.find("user:").unwrap();
        assert!(cart < user);
    }

    #[test]
    fn test_inferred_report_header_and_empty_group() {
        let mut store: InMemoryKeyStore = [("abc123", ValueKind::String, 6), ("cache:ff", ValueKind::String, 2)].into_iter().collect();
        let mut coordinator = ScanCoordinator::new(&mut store, Classifier::inferred(InferenceHeuristic::HexSuffix), &ScanConfig::default()).unwrap();
        coordinator.run().unwrap();
        let text = TextReport(&coordinator.report().unwrap()).to_string();

        assert!(text.starts_with("Grouping: inferred patterns (hex-suffix)\n"));
        assert!(text.contains("(empty)"));
        assert!(text.contains("cache:"));
        assert!(!text.contains("Not matched"));
        assert!(text.ends_with("Estimated total size: 8\n"));
    }

    #[test]
    fn test_empty_prefix_label() {
        assert_eq!(prefix_label(""), "(empty)");
        assert_eq!(prefix_label("a:"), "a:");
    }
}
