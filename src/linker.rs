//! Structural linker: a pairwise heuristic scan producing the weighted link graph.
//!
//! For every ordered pair of distinct nodes five independent rules are evaluated, and each rule
//! that fires emits its own [`GraphLink`]. A pair may therefore be connected by several links of
//! different types at once.
//!
//! | Rule                  | Condition                                             | Weight | Type      |
//! |-----------------------|-------------------------------------------------------|--------|-----------|
//! | Explicit              | `source.linksTo` contains `target.id`                 | 1.0    | EXPLICIT  |
//! | Mention               | target's short title (> 5 chars) occurs in source text | 0.8    | MENTION   |
//! | Signature convergence | both high-signal, same non-empty vector tag           | 0.95   | SIGNATURE |
//! | Thematic overlap      | more than one shared theme                            | 0.6    | INFERRED  |
//! | Anchor convergence    | more than one shared anchor                           | 0.7    | INFERRED  |
//!
//! The scan is O(n²) with an O(content) substring test per pair, which is fine at the corpus
//! sizes this crate targets (hundreds of nodes).

use crate::properties::{GraphLink, LinkType, Node};

pub const EXPLICIT_WEIGHT: f64 = 1.0;
pub const MENTION_WEIGHT: f64 = 0.8;
pub const SIGNATURE_WEIGHT: f64 = 0.95;
pub const THEMATIC_WEIGHT: f64 = 0.6;
pub const ANCHOR_WEIGHT: f64 = 0.7;

/// Minimum length (exclusive) of a short title before it is trusted as a mention.
const MIN_MENTION_LEN: usize = 5;

/// Stateless; holds nothing but provides a seam for the orchestrator.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuralLinker;

impl StructuralLinker {
    pub fn new() -> Self {
        StructuralLinker
    }

    /// Link every ordered pair of distinct nodes. Output order follows the corpus order of the
    /// source, then of the target, then the rule order in the table above.
    pub fn link(&self, nodes: &[Node]) -> Vec<GraphLink> {
        let lowered: Vec<String> = nodes.iter().map(|n| n.content.to_lowercase()).collect();
        let short_titles: Vec<String> = nodes.iter().map(|n| short_title(&n.title)).collect();

        let mut links = Vec::new();
        for (i, source) in nodes.iter().enumerate() {
            for (j, target) in nodes.iter().enumerate() {
                if i == j || source.id == target.id {
                    continue;
                }
                links.extend(link_pair(source, &lowered[i], target, &short_titles[j]));
            }
        }
        tracing::debug!(
            "Structural linker produced {} links over {} nodes",
            links.len(),
            nodes.len()
        );
        links
    }
}

/// The text after the last `:` of a title (or the whole title), lower-cased and trimmed.
pub fn short_title(title: &str) -> String {
    title
        .rsplit(':')
        .next()
        .unwrap_or(title)
        .trim()
        .to_lowercase()
}

fn link_pair(
    source: &Node,
    source_content_lower: &str,
    target: &Node,
    target_short_title: &str,
) -> Vec<GraphLink> {
    let mut links = Vec::new();

    if source.links().iter().any(|id| id == &target.id) {
        links.push(
            GraphLink::new(&source.id, &target.id, EXPLICIT_WEIGHT, LinkType::Explicit)
                .with_reasoning("Authored reference"),
        );
    }

    if target_short_title.chars().count() > MIN_MENTION_LEN
        && source_content_lower.contains(target_short_title)
    {
        links.push(
            GraphLink::new(&source.id, &target.id, MENTION_WEIGHT, LinkType::Mention)
                .with_reasoning(format!("Content mentions \"{target_short_title}\"")),
        );
    }

    if source.metadata.is_high_signal
        && target.metadata.is_high_signal
        && !source.metadata.vector.is_empty()
        && source.metadata.vector == target.metadata.vector
    {
        links.push(
            GraphLink::new(
                &source.id,
                &target.id,
                SIGNATURE_WEIGHT,
                LinkType::Signature,
            )
            .with_reasoning(format!(
                "High-signal convergence on vector {}",
                source.metadata.vector
            )),
        );
    }

    let themes = source.shared_themes(target);
    if themes.len() > 1 {
        links.push(
            GraphLink::new(&source.id, &target.id, THEMATIC_WEIGHT, LinkType::Inferred)
                .with_reasoning(format!("Shared themes: {}", themes.join(", "))),
        );
    }

    let anchors = source.shared_anchors(target);
    if anchors.len() > 1 {
        links.push(
            GraphLink::new(&source.id, &target.id, ANCHOR_WEIGHT, LinkType::Inferred)
                .with_reasoning(format!("Shared anchors: {}", anchors.join(", "))),
        );
    }

    links
}
