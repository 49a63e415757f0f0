//! Indexing diagnostics: the issue type every pass reports into, and the structural audit of a
//! corpus and its link set.

use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeSet,
    fmt::{Display, Formatter},
};

use crate::{
    graph::LinkGraph,
    properties::{GraphLink, Node, Severity},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCategory {
    Structural,
    Temporal,
    Entity,
    Semantic,
    Quality,
}

impl Display for IssueCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            IssueCategory::Structural => "STRUCTURAL",
            IssueCategory::Temporal => "TEMPORAL",
            IssueCategory::Entity => "ENTITY",
            IssueCategory::Semantic => "SEMANTIC",
            IssueCategory::Quality => "QUALITY",
        };
        write!(f, "{label}")
    }
}

/// A non-fatal finding recorded during indexing.
///
/// Issues never abort a run; they are collected into the diagnostics of the result so callers can
/// decide what to surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexingIssue {
    pub category: IssueCategory,
    pub severity: Severity,
    pub description: String,
    /// The node the issue concerns, when it concerns exactly one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
}

impl IndexingIssue {
    pub fn new(
        category: IssueCategory,
        severity: Severity,
        description: impl Into<String>,
    ) -> Self {
        IndexingIssue {
            category,
            severity,
            description: description.into(),
            node_id: None,
        }
    }

    pub fn for_node(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }

    pub fn is_critical(&self) -> bool {
        self.severity.is_critical()
    }
}

impl Display for IndexingIssue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.node_id {
            Some(id) => write!(
                f,
                "[{} {}] {}: {}",
                self.severity, self.category, id, self.description
            ),
            None => write!(f, "[{} {}] {}", self.severity, self.category, self.description),
        }
    }
}

/// A `linksTo` entry naming an id that is not in the corpus.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokenReference {
    pub source: String,
    pub target: String,
}

/// Connectivity snapshot of a corpus under a given link set.
///
/// `orphans` and `connected` partition the corpus: every node id appears in exactly one of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphAudit {
    pub total_nodes: usize,
    pub total_links: usize,
    pub orphans: Vec<String>,
    pub connected: Vec<String>,
    pub broken_references: Vec<BrokenReference>,
    pub cluster_count: usize,
    /// Links per ordered node pair.
    pub density: f64,
}

impl GraphAudit {
    pub fn run(nodes: &[Node], links: &[GraphLink]) -> GraphAudit {
        let graph = LinkGraph::new(nodes.iter().map(|n| n.id.as_str()), links);
        let known: BTreeSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        let broken_references = nodes
            .iter()
            .flat_map(|node| {
                node.links()
                    .iter()
                    .filter(|target| !known.contains(target.as_str()))
                    .map(|target| BrokenReference {
                        source: node.id.clone(),
                        target: target.clone(),
                    })
            })
            .collect();

        let total_nodes = graph.node_count();
        let possible_pairs = total_nodes.saturating_mul(total_nodes.saturating_sub(1));
        let density = if possible_pairs == 0 {
            0.0
        } else {
            links.len() as f64 / possible_pairs as f64
        };

        GraphAudit {
            total_nodes,
            total_links: links.len(),
            orphans: graph.orphans().into_iter().map(String::from).collect(),
            connected: graph.connected().into_iter().map(String::from).collect(),
            broken_references,
            cluster_count: graph.clusters().len(),
            density,
        }
    }

    pub fn orphan_count(&self) -> usize {
        self.orphans.len()
    }

    pub fn orphan_ratio(&self) -> f64 {
        if self.total_nodes == 0 {
            0.0
        } else {
            self.orphans.len() as f64 / self.total_nodes as f64
        }
    }

    pub fn connected_fraction(&self) -> f64 {
        if self.total_nodes == 0 {
            0.0
        } else {
            self.connected.len() as f64 / self.total_nodes as f64
        }
    }

    /// Broken references as a share of all link evidence (produced links plus unresolved
    /// references), so the ratio stays in [0, 1] even when nothing linked.
    pub fn broken_ratio(&self) -> f64 {
        let broken = self.broken_references.len();
        let evidence = self.total_links + broken;
        if evidence == 0 {
            0.0
        } else {
            broken as f64 / evidence as f64
        }
    }

    /// Orphan and broken-reference findings.
    pub fn issues(&self, max_orphan_ratio: f64) -> Vec<IndexingIssue> {
        let mut issues = Vec::new();
        if self.orphan_ratio() > max_orphan_ratio {
            issues.push(IndexingIssue::new(
                IssueCategory::Structural,
                Severity::Medium,
                format!(
                    "{} of {} nodes are orphans ({:.0}%)",
                    self.orphans.len(),
                    self.total_nodes,
                    self.orphan_ratio() * 100.0
                ),
            ));
        }
        for broken in self.broken_references.iter() {
            issues.push(
                IndexingIssue::new(
                    IssueCategory::Structural,
                    Severity::High,
                    format!("broken reference to '{}'", broken.target),
                )
                .for_node(&broken.source),
            );
        }
        issues
    }
}
