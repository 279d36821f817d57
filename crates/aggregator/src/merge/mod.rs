//! Merge & dedup engine: combines canonical findings across sources into
//! one sequence.
//!
//! Ordering: analyzer findings the model did not already re-describe are
//! prepended in their original relative order; everything from the model's
//! sets keeps its own order after them. Deduplication is exact `location`
//! string equality: same `file:line` from two sources is treated as the
//! same underlying issue, first occurrence wins. Applied once, over the
//! final concatenation. Off-by-one line reports therefore stay distinct;
//! an accepted simplification.

use crate::core::{Finding, FindingSource};
use std::collections::HashSet;
use tracing::debug;

/// Which adapter family a set came from. The engine needs this to tell a
/// genuine analyzer finding apart from the model's re-description of one
/// (both carry an analyzer `source` tag).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOrigin {
    Analyzer,
    Model,
}

#[derive(Debug, Clone)]
pub struct FindingSet {
    pub origin: SetOrigin,
    pub findings: Vec<Finding>,
}

impl FindingSet {
    pub fn analyzer(findings: Vec<Finding>) -> Self {
        Self {
            origin: SetOrigin::Analyzer,
            findings,
        }
    }

    pub fn model(findings: Vec<Finding>) -> Self {
        Self {
            origin: SetOrigin::Model,
            findings,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub analyzer_total: usize,
    pub model_total: usize,
    /// Analyzer findings the model dropped and the merge re-inserted.
    pub reinserted: usize,
    pub duplicates_removed: usize,
    pub merged_total: usize,
}

pub fn merge(sets: Vec<FindingSet>) -> Vec<Finding> {
    merge_with_stats(sets).0
}

pub fn merge_with_stats(sets: Vec<FindingSet>) -> (Vec<Finding>, MergeStats) {
    let mut analyzer_findings: Vec<Finding> = Vec::new();
    let mut model_findings: Vec<Finding> = Vec::new();

    for set in sets {
        match set.origin {
            SetOrigin::Analyzer => analyzer_findings.extend(set.findings),
            SetOrigin::Model => model_findings.extend(set.findings),
        }
    }

    let mut stats = MergeStats {
        analyzer_total: analyzer_findings.len(),
        model_total: model_findings.len(),
        ..MergeStats::default()
    };

    // Locations the model already re-described with an analyzer attribution.
    let attributed: HashSet<String> = model_findings
        .iter()
        .filter(|f| !f.source.is_model())
        .map(|f| f.location.clone())
        .collect();

    let attributed_count = model_findings.iter().filter(|f| !f.source.is_model()).count();
    if attributed_count < stats.analyzer_total {
        debug!(
            attributed = attributed_count,
            available = stats.analyzer_total,
            "model re-described fewer analyzer findings than available"
        );
    }

    // Every analyzer finding whose location the model did not account for is
    // re-inserted at the front, preserving analyzer order. Keyed on location
    // rather than on the count comparison so coverage holds even when the
    // model emits the right number of attributions at the wrong places.
    let mut merged: Vec<Finding> =
        Vec::with_capacity(analyzer_findings.len() + model_findings.len());
    for finding in analyzer_findings {
        if attributed.contains(&finding.location) {
            continue;
        }
        merged.push(finding);
        stats.reinserted += 1;
    }
    merged.extend(model_findings);

    let before = merged.len();
    let mut seen: HashSet<String> = HashSet::with_capacity(before);
    merged.retain(|f| seen.insert(f.location.clone()));

    stats.duplicates_removed = before - merged.len();
    stats.merged_total = merged.len();

    (merged, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AnalysisSummary, Severity};

    fn finding(source: FindingSource, location: &str, title: &str) -> Finding {
        Finding::new(source, Severity::Medium, title).with_location(location)
    }

    #[test]
    fn test_coverage_invariant() {
        // Every analyzer location survives the merge, even against an empty
        // model set.
        let analyzer = vec![finding(FindingSource::Bandit, "app.py:10", "hardcoded password")];
        let merged = merge(vec![
            FindingSet::analyzer(analyzer),
            FindingSet::model(Vec::new()),
        ]);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].location, "app.py:10");
        assert_eq!(merged[0].source, FindingSource::Bandit);
    }

    #[test]
    fn test_idempotence() {
        let set = vec![
            finding(FindingSource::Semgrep, "a.py:1", "one"),
            finding(FindingSource::Semgrep, "a.py:2", "two"),
        ];

        let once = merge(vec![FindingSet::analyzer(set.clone())]);
        let twice = merge(vec![
            FindingSet::analyzer(set.clone()),
            FindingSet::analyzer(set),
        ]);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_model_redescription_wins_over_raw_analyzer_record() {
        let analyzer = vec![finding(FindingSource::Semgrep, "db.py:17", "sql injection")];
        let model = vec![
            finding(FindingSource::Semgrep, "db.py:17", "SQL injection via f-string")
                .with_description("richer model description"),
            finding(FindingSource::ModelAnalysis, "auth.py:3", "hardcoded secret"),
        ];

        let (merged, stats) = merge_with_stats(vec![
            FindingSet::analyzer(analyzer),
            FindingSet::model(model),
        ]);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].title, "SQL injection via f-string");
        assert_eq!(stats.reinserted, 0);
        assert_eq!(stats.duplicates_removed, 0);
    }

    #[test]
    fn test_dropped_analyzer_findings_are_prepended_in_order() {
        let analyzer = vec![
            finding(FindingSource::Semgrep, "a.py:1", "first"),
            finding(FindingSource::Bandit, "b.py:2", "second"),
        ];
        let model = vec![finding(FindingSource::ModelAnalysis, "c.py:3", "model-only")];

        let (merged, stats) = merge_with_stats(vec![
            FindingSet::analyzer(analyzer),
            FindingSet::model(model),
        ]);

        let locations: Vec<&str> = merged.iter().map(|f| f.location.as_str()).collect();
        assert_eq!(locations, vec!["a.py:1", "b.py:2", "c.py:3"]);
        assert_eq!(stats.reinserted, 2);
    }

    #[test]
    fn test_same_location_across_sources_collapses() {
        // The model independently found the issue Bandit flagged; exact
        // location equality treats them as one.
        let analyzer = vec![finding(FindingSource::Bandit, "x.py:5", "weak hash")];
        let model = vec![finding(FindingSource::ModelAnalysis, "x.py:5", "MD5 used")];

        let (merged, stats) = merge_with_stats(vec![
            FindingSet::analyzer(analyzer),
            FindingSet::model(model),
        ]);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].source, FindingSource::Bandit);
        assert_eq!(stats.duplicates_removed, 1);
    }

    #[test]
    fn test_summary_consistency_after_merge() {
        let analyzer = vec![
            finding(FindingSource::Semgrep, "a.py:1", "one"),
            finding(FindingSource::Bandit, "b.py:2", "two"),
        ];
        let model = vec![
            finding(FindingSource::ModelAnalysis, "a.py:1", "dup of one"),
            finding(FindingSource::ModelAnalysis, "d.py:9", "fresh"),
        ];

        let merged = merge(vec![FindingSet::analyzer(analyzer), FindingSet::model(model)]);
        let summary = AnalysisSummary::from_findings(&merged);

        assert_eq!(summary.total, merged.len());
        let severity_sum = summary.by_severity.critical
            + summary.by_severity.high
            + summary.by_severity.medium
            + summary.by_severity.low;
        assert_eq!(severity_sum, summary.total);
    }
}
