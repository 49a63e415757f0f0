/// [crate::properties] contains the basic building blocks shared by every pass: corpus [Node]s,
/// their metadata, the [GraphLink]s the linker produces between them, and the [Severity] scale
/// used by anomalies, quality issues and indexing diagnostics.
pub use enumset::EnumSet;
use enumset::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::{
    collections::BTreeSet,
    fmt::{Display, Formatter},
};

/// [NodeType] enumerates the kinds of documents a corpus may contain. Quality standards are keyed
/// on this type, and the temporal indexer only tracks pattern shifts for the first three kinds.
#[derive(Debug, Default, Serialize, Deserialize, PartialOrd, Ord, Hash, EnumSetType)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[enumset(repr = "u32")]
pub enum NodeType {
    /// A body of principle describing how and why a class of tactics works
    #[default]
    Doctrine,
    /// A concrete, procedural method
    Tactic,
    /// A description of an actor (person or organization)
    Profile,
    /// A documented historical instance
    CaseStudy,
    /// An abstract explanatory model
    Theory,
    /// Lyrical material; scored only for completeness and relevance
    Song,
}

impl NodeType {
    pub fn all() -> &'static [NodeType] {
        &[
            NodeType::Doctrine,
            NodeType::Tactic,
            NodeType::Profile,
            NodeType::CaseStudy,
            NodeType::Theory,
            NodeType::Song,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Doctrine => "DOCTRINE",
            NodeType::Tactic => "TACTIC",
            NodeType::Profile => "PROFILE",
            NodeType::CaseStudy => "CASE_STUDY",
            NodeType::Theory => "THEORY",
            NodeType::Song => "SONG",
        }
    }
}

impl Display for NodeType {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Authored metadata attached to every [Node].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeMetadata {
    pub classification: String,
    /// Stylized date: roman year fragment with an optional `.Q<n>` or `.<MM>` suffix.
    pub date: String,
    /// Free-form signature tag; two high-signal nodes sharing it converge.
    pub vector: String,
    pub anchors: Vec<String>,
    /// 1 (core) to 3 (peripheral)
    pub tier: u8,
    pub record_hash: String,
    pub is_high_signal: bool,
}

impl Default for NodeMetadata {
    fn default() -> Self {
        NodeMetadata {
            classification: String::default(),
            date: String::default(),
            vector: String::default(),
            anchors: vec![],
            tier: 1,
            record_hash: String::default(),
            is_high_signal: false,
        }
    }
}

/// A single indexed document. Nodes are immutable for the duration of a pipeline run; the link
/// healer is the only component that produces modified copies.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeType,
    pub title: String,
    #[serde(default)]
    pub themes: Vec<String>,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub metadata: NodeMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links_to: Option<Vec<String>>,
}

impl Node {
    pub fn links(&self) -> &[String] {
        self.links_to.as_deref().unwrap_or(&[])
    }

    /// Themes shared with `other`, in this node's declared order.
    pub fn shared_themes<'a>(&'a self, other: &Node) -> Vec<&'a str> {
        shared_terms(&self.themes, &other.themes)
    }

    pub fn shared_anchors<'a>(&'a self, other: &Node) -> Vec<&'a str> {
        shared_terms(&self.metadata.anchors, &other.metadata.anchors)
    }

    /// Lower-case hex SHA-256 of the content.
    pub fn content_digest(&self) -> String {
        hex::encode(Sha256::digest(self.content.as_bytes()))
    }

    /// `None` when no `recordHash` was authored.
    pub fn record_hash_matches(&self) -> Option<bool> {
        let recorded = self.metadata.record_hash.trim();
        if recorded.is_empty() {
            None
        } else {
            Some(recorded.eq_ignore_ascii_case(&self.content_digest()))
        }
    }

    /// Everything the node says about itself, used by scans that should not miss the excerpt.
    pub fn full_text(&self) -> String {
        if self.excerpt.is_empty() {
            self.content.clone()
        } else {
            format!("{}\n{}", self.excerpt, self.content)
        }
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}] {}", self.id, self.kind, self.title)
    }
}

fn shared_terms<'a>(lhs: &'a [String], rhs: &[String]) -> Vec<&'a str> {
    let rhs: BTreeSet<&str> = rhs.iter().map(String::as_str).collect();
    let mut seen = BTreeSet::new();
    lhs.iter()
        .map(String::as_str)
        .filter(|term| rhs.contains(term) && seen.insert(*term))
        .collect()
}

/// The heuristic that produced a [GraphLink].
#[derive(Debug, Serialize, Deserialize, PartialOrd, Ord, Hash, EnumSetType)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LinkType {
    /// Authored `linksTo` reference
    Explicit,
    /// Target title mentioned in the source content
    Mention,
    /// Two high-signal nodes sharing a vector tag
    Signature,
    /// Thematic or anchor overlap
    Inferred,
}

impl Display for LinkType {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let label = match self {
            LinkType::Explicit => "EXPLICIT",
            LinkType::Mention => "MENTION",
            LinkType::Signature => "SIGNATURE",
            LinkType::Inferred => "INFERRED",
        };
        write!(f, "{label}")
    }
}

/// A directed, weighted edge between two corpus nodes. Several links of different types may
/// connect the same pair; deduplication is left to consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphLink {
    pub source: String,
    pub target: String,
    pub weight: f64,
    #[serde(rename = "type")]
    pub kind: LinkType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl GraphLink {
    pub fn new(source: &str, target: &str, weight: f64, kind: LinkType) -> Self {
        GraphLink {
            source: source.to_string(),
            target: target.to_string(),
            weight: weight.clamp(0.0, 1.0),
            kind,
            reasoning: None,
        }
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }

    pub fn is_self_reference(&self) -> bool {
        self.source == self.target
    }
}

impl Display for GraphLink {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} -[{} {:.2}]-> {}",
            self.source, self.kind, self.weight, self.target
        )
    }
}

/// Ordered severity scale shared by anomalies, quality issues and indexing issues.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// High and Critical findings both count toward the critical-issue alert.
    pub fn is_critical(&self) -> bool {
        *self >= Severity::High
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let label = match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        };
        write!(f, "{label}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_node_deserializes_from_camel_case_json() {
        let json = r#"{
            "id": "doc-1",
            "type": "CASE_STUDY",
            "title": "Record: The Long Quiet",
            "themes": ["isolation", "surveillance"],
            "excerpt": "",
            "content": "Body",
            "metadata": {
                "classification": "OPEN",
                "date": "MMXXIV.Q2",
                "vector": "V-1",
                "anchors": ["harbor"],
                "tier": 2,
                "recordHash": "abc",
                "isHighSignal": true
            },
            "linksTo": ["doc-2"]
        }"#;
        let node: Node = serde_json::from_str(json).unwrap();
        assert_eq!(node.kind, NodeType::CaseStudy);
        assert_eq!(node.metadata.tier, 2);
        assert!(node.metadata.is_high_signal);
        assert_eq!(node.links(), &["doc-2".to_string()]);

        let back = serde_json::to_value(&node).unwrap();
        assert_eq!(back["type"], "CASE_STUDY");
        assert_eq!(back["metadata"]["isHighSignal"], true);
        assert_eq!(back["linksTo"][0], "doc-2");
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let node: Node =
            serde_json::from_str(r#"{"id": "a", "type": "TACTIC", "title": "A"}"#).unwrap();
        assert!(node.themes.is_empty());
        assert_eq!(node.metadata.tier, 1);
        assert!(node.links_to.is_none());
        assert!(node.links().is_empty());
    }

    #[test]
    fn test_shared_themes_preserve_order_and_dedup() {
        let a = Node {
            themes: vec!["b".into(), "a".into(), "b".into(), "c".into()],
            ..Default::default()
        };
        let b = Node {
            themes: vec!["a".into(), "b".into()],
            ..Default::default()
        };
        assert_eq!(a.shared_themes(&b), vec!["b", "a"]);
    }

    #[test]
    fn test_link_weight_is_clamped() {
        let link = GraphLink::new("a", "b", 1.7, LinkType::Explicit);
        assert_eq!(link.weight, 1.0);
        assert!(!link.is_self_reference());
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::High < Severity::Critical);
        assert_eq!(Severity::High.to_string(), "HIGH");
    }

    #[test]
    fn test_record_hash() {
        let mut node = Node {
            content: "abc".to_string(),
            ..Default::default()
        };
        assert_eq!(node.record_hash_matches(), None);
        node.metadata.record_hash =
            "BA7816BF8F01CFEA414140DE5DAE2223B00361A396177A9CB410FF61F20015AD".to_string();
        assert_eq!(node.record_hash_matches(), Some(true));
        node.content.push('!');
        assert_eq!(node.record_hash_matches(), Some(false));
    }
}
