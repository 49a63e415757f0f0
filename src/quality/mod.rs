//! Content quality: per-type standards made of pure validators, weighted scoring, the assurance
//! pipeline (gate, link checks, structural checks), aggregate summaries and alert monitoring.

use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter},
};

use crate::properties::Severity;

pub mod assurance;
pub mod monitor;
pub mod scoring;
pub mod standards;
pub mod summary;
pub mod validators;

pub use assurance::{LinkIssue, LinkIssueKind, QualityAssurance, QualityAssuranceReport};
pub use monitor::{monitor, Alert, AlertKind, MonitoringState, QualitySnapshot};
pub use scoring::score_node;
pub use standards::{standards_for, QualityStandard};
pub use summary::QualitySummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityCategory {
    Accuracy,
    Completeness,
    Consistency,
    Relevance,
    Structure,
}

impl Display for QualityCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            QualityCategory::Accuracy => "ACCURACY",
            QualityCategory::Completeness => "COMPLETENESS",
            QualityCategory::Consistency => "CONSISTENCY",
            QualityCategory::Relevance => "RELEVANCE",
            QualityCategory::Structure => "STRUCTURE",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityIssue {
    pub severity: Severity,
    pub category: QualityCategory,
    pub description: String,
    #[serde(default)]
    pub evidence: Vec<String>,
}

impl QualityIssue {
    pub fn new(
        severity: Severity,
        category: QualityCategory,
        description: impl Into<String>,
    ) -> Self {
        QualityIssue {
            severity,
            category,
            description: description.into(),
            evidence: vec![],
        }
    }

    pub fn with_evidence(mut self, evidence: Vec<String>) -> Self {
        self.evidence = evidence;
        self
    }
}

/// Outcome of one validator on one node. `score` and `confidence` are in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub passed: bool,
    pub score: f64,
    pub confidence: f64,
    pub issues: Vec<QualityIssue>,
    pub suggestions: Vec<String>,
}

impl ValidationResult {
    pub fn pass(score: f64, confidence: f64) -> Self {
        ValidationResult {
            passed: true,
            score: score.clamp(0.0, 1.0),
            confidence: confidence.clamp(0.0, 1.0),
            issues: vec![],
            suggestions: vec![],
        }
    }

    pub fn fail(score: f64, confidence: f64, issue: QualityIssue, suggestion: &str) -> Self {
        ValidationResult {
            passed: false,
            score: score.clamp(0.0, 1.0),
            confidence: confidence.clamp(0.0, 1.0),
            issues: vec![issue],
            suggestions: vec![suggestion.to_string()],
        }
    }
}

/// Weighted quality assessment of a single node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentQualityReport {
    pub node_id: String,
    pub overall_score: f64,
    pub confidence: f64,
    pub category_scores: BTreeMap<QualityCategory, f64>,
    pub issues: Vec<QualityIssue>,
    pub suggestions: Vec<String>,
}

impl ContentQualityReport {
    pub fn passes(&self, threshold: f64) -> bool {
        self.overall_score >= threshold
    }
}
