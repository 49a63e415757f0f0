//! The assurance pipeline: score every node in parallel, gate on the configured threshold, then
//! check the link set and the graph shape of what was admitted.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::{Display, Formatter},
};

use super::{scoring::score_node, summary::QualitySummary, ContentQualityReport};
use crate::{
    config::{QualityGateConfig, StructureConfig},
    diagnostic::{IndexingIssue, IssueCategory},
    graph::LinkGraph,
    properties::{GraphLink, Node, Severity},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LinkIssueKind {
    /// An endpoint is unknown or was rejected by the quality gate.
    Broken,
    SelfReference,
    /// No shared themes and a weight under the relevance floor.
    LowRelevance,
}

impl Display for LinkIssueKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            LinkIssueKind::Broken => "BROKEN",
            LinkIssueKind::SelfReference => "SELF_REFERENCE",
            LinkIssueKind::LowRelevance => "LOW_RELEVANCE",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkIssue {
    pub source: String,
    pub target: String,
    pub kind: LinkIssueKind,
    pub severity: Severity,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityAssuranceReport {
    /// One report per node, in corpus order.
    pub reports: Vec<ContentQualityReport>,
    pub admitted: Vec<String>,
    pub rejected: Vec<String>,
    pub link_issues: Vec<LinkIssue>,
    pub structural_issues: Vec<IndexingIssue>,
    pub summary: QualitySummary,
}

impl QualityAssuranceReport {
    pub fn report(&self, node_id: &str) -> Option<&ContentQualityReport> {
        self.reports.iter().find(|r| r.node_id == node_id)
    }

    pub fn is_admitted(&self, node_id: &str) -> bool {
        self.admitted.iter().any(|id| id == node_id)
    }

    pub fn pass_rate(&self) -> f64 {
        if self.reports.is_empty() {
            0.0
        } else {
            self.admitted.len() as f64 / self.reports.len() as f64
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct QualityAssurance {
    gate: QualityGateConfig,
    structure: StructureConfig,
}

impl QualityAssurance {
    pub fn new(gate: QualityGateConfig, structure: StructureConfig) -> Self {
        QualityAssurance { gate, structure }
    }

    pub fn run(&self, nodes: &[Node], links: &[GraphLink]) -> QualityAssuranceReport {
        let reports: Vec<ContentQualityReport> = nodes.par_iter().map(score_node).collect();

        let (admitted, rejected): (Vec<&ContentQualityReport>, Vec<&ContentQualityReport>) =
            reports
                .iter()
                .partition(|r| !self.gate.enabled || r.passes(self.gate.threshold));
        for report in rejected.iter() {
            tracing::debug!(
                "quality gate rejected {} ({:.2} < {:.2})",
                report.node_id,
                report.overall_score,
                self.gate.threshold
            );
        }
        let admitted: Vec<String> = admitted.iter().map(|r| r.node_id.clone()).collect();
        let rejected: Vec<String> = rejected.iter().map(|r| r.node_id.clone()).collect();

        let link_issues = self.check_links(nodes, links, &admitted);
        let structural_issues = self.check_structure(&admitted, links);
        let summary = QualitySummary::from_reports(&reports, self.gate.threshold);

        tracing::info!(
            "quality assurance: {} admitted, {} rejected, {} link issues, {} structural issues",
            admitted.len(),
            rejected.len(),
            link_issues.len(),
            structural_issues.len()
        );

        QualityAssuranceReport {
            reports,
            admitted,
            rejected,
            link_issues,
            structural_issues,
            summary,
        }
    }

    fn check_links(
        &self,
        nodes: &[Node],
        links: &[GraphLink],
        admitted: &[String],
    ) -> Vec<LinkIssue> {
        let by_id: BTreeMap<&str, &Node> = nodes.iter().map(|n| (n.id.as_str(), n)).collect();
        let admitted: BTreeSet<&str> = admitted.iter().map(String::as_str).collect();
        let mut issues = Vec::new();

        for link in links {
            let issue = |kind, severity, description: String| LinkIssue {
                source: link.source.clone(),
                target: link.target.clone(),
                kind,
                severity,
                description,
            };
            if link.is_self_reference() {
                issues.push(issue(
                    LinkIssueKind::SelfReference,
                    Severity::High,
                    format!("{} links to itself", link.source),
                ));
                continue;
            }
            let missing: Vec<&str> = [link.source.as_str(), link.target.as_str()]
                .into_iter()
                .filter(|id| !admitted.contains(id))
                .collect();
            if !missing.is_empty() {
                issues.push(issue(
                    LinkIssueKind::Broken,
                    Severity::Medium,
                    format!("endpoint without an admitted report: {}", missing.join(", ")),
                ));
                continue;
            }
            if let (Some(source), Some(target)) =
                (by_id.get(link.source.as_str()), by_id.get(link.target.as_str()))
            {
                if source.shared_themes(target).is_empty()
                    && link.weight < self.structure.relevance_weight_floor
                {
                    issues.push(issue(
                        LinkIssueKind::LowRelevance,
                        Severity::Low,
                        format!("no shared themes and weight {:.2}", link.weight),
                    ));
                }
            }
        }
        issues
    }

    fn check_structure(&self, admitted: &[String], links: &[GraphLink]) -> Vec<IndexingIssue> {
        let graph = LinkGraph::new(admitted.iter().map(String::as_str), links);
        let mut issues = Vec::new();

        let orphans = graph.orphans();
        if !orphans.is_empty() {
            issues.push(IndexingIssue::new(
                IssueCategory::Structural,
                Severity::Low,
                format!("{} admitted nodes have no links: {}", orphans.len(), orphans.join(", ")),
            ));
        }

        let linked_clusters = graph.clusters().into_iter().filter(|c| c.len() > 1).count();
        if linked_clusters > 1 {
            issues.push(IndexingIssue::new(
                IssueCategory::Structural,
                Severity::Medium,
                format!("{linked_clusters} disconnected clusters"),
            ));
        }

        for (id, degree) in graph.over_connected(self.structure.max_connections) {
            issues.push(
                IndexingIssue::new(
                    IssueCategory::Structural,
                    Severity::Low,
                    format!(
                        "excessive connectivity: {degree} links exceeds {}",
                        self.structure.max_connections
                    ),
                )
                .for_node(id),
            );
        }
        issues
    }
}
