use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{ContentQualityReport, QualityCategory};
use crate::{properties::Severity, text};

pub const HISTOGRAM_BUCKETS: usize = 5;

/// Corpus-level aggregate of per-node quality reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualitySummary {
    pub node_count: usize,
    pub mean_score: f64,
    pub min_score: f64,
    pub max_score: f64,
    /// Fraction of nodes at or above the threshold.
    pub pass_rate: f64,
    pub issues_by_severity: BTreeMap<Severity, usize>,
    pub issues_by_category: BTreeMap<QualityCategory, usize>,
    /// Counts of scores in `[0, 0.2)`, `[0.2, 0.4)`, ... `[0.8, 1.0]`.
    pub histogram: [usize; HISTOGRAM_BUCKETS],
}

impl QualitySummary {
    pub fn from_reports(reports: &[ContentQualityReport], threshold: f64) -> QualitySummary {
        if reports.is_empty() {
            return QualitySummary::default();
        }
        let scores: Vec<f64> = reports.iter().map(|r| r.overall_score).collect();
        let mut histogram = [0usize; HISTOGRAM_BUCKETS];
        for score in scores.iter() {
            let bucket = ((score * HISTOGRAM_BUCKETS as f64) as usize).min(HISTOGRAM_BUCKETS - 1);
            histogram[bucket] += 1;
        }

        let mut issues_by_severity = BTreeMap::new();
        let mut issues_by_category = BTreeMap::new();
        for issue in reports.iter().flat_map(|r| r.issues.iter()) {
            *issues_by_severity.entry(issue.severity).or_insert(0) += 1;
            *issues_by_category.entry(issue.category).or_insert(0) += 1;
        }

        QualitySummary {
            node_count: reports.len(),
            mean_score: text::mean(scores.iter().copied()),
            min_score: scores.iter().copied().fold(f64::INFINITY, f64::min),
            max_score: scores.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            pass_rate: scores.iter().filter(|s| **s >= threshold).count() as f64
                / reports.len() as f64,
            issues_by_severity,
            issues_by_category,
            histogram,
        }
    }

    pub fn critical_issues(&self) -> usize {
        self.issues_by_severity
            .iter()
            .filter(|(severity, _)| severity.is_critical())
            .map(|(_, count)| count)
            .sum()
    }
}
