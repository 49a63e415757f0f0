//! Repair of `linksTo` references that do not resolve to a node in the corpus.
//!
//! An unresolved reference is compared (case-insensitively) against every other node's id and
//! title with normalized Levenshtein similarity. The best candidate wins, earliest in corpus
//! order on ties; it is used only when its similarity is strictly above the threshold. Anything
//! else is dropped rather than guessed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::properties::Node;

pub const DEFAULT_HEAL_SIMILARITY: f64 = 0.6;

/// Edit distance over chars (insert, delete, substitute all cost 1).
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

/// `(maxLen - distance) / maxLen`; two empty strings are identical.
pub fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    (max_len - levenshtein(a, b)) as f64 / max_len as f64
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkRepair {
    pub node_id: String,
    pub original: String,
    pub repaired: String,
    pub similarity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DropReason {
    /// No other node to compare against.
    NoCandidate,
    BelowThreshold,
    /// The best candidate is already linked from this node.
    DuplicateTarget,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DroppedReference {
    pub node_id: String,
    pub reference: String,
    pub best_similarity: f64,
    pub reason: DropReason,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealingOutcome {
    pub nodes: Vec<Node>,
    pub repairs: Vec<LinkRepair>,
    pub dropped: Vec<DroppedReference>,
}

impl HealingOutcome {
    pub fn changed(&self) -> bool {
        !(self.repairs.is_empty() && self.dropped.is_empty())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LinkHealer {
    threshold: f64,
}

impl Default for LinkHealer {
    fn default() -> Self {
        LinkHealer::new(DEFAULT_HEAL_SIMILARITY)
    }
}

impl LinkHealer {
    pub fn new(threshold: f64) -> Self {
        LinkHealer { threshold }
    }

    pub fn heal(&self, nodes: &[Node]) -> HealingOutcome {
        let known: BTreeSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        let mut outcome = HealingOutcome::default();

        for node in nodes {
            let Some(links) = node.links_to.as_ref() else {
                outcome.nodes.push(node.clone());
                continue;
            };
            if links.iter().all(|target| known.contains(target.as_str())) {
                outcome.nodes.push(node.clone());
                continue;
            }

            let mut healed: Vec<String> = links
                .iter()
                .filter(|target| known.contains(target.as_str()))
                .cloned()
                .collect();
            for reference in links.iter().filter(|t| !known.contains(t.as_str())) {
                let dropped = |best_similarity, reason| DroppedReference {
                    node_id: node.id.clone(),
                    reference: reference.clone(),
                    best_similarity,
                    reason,
                };
                let Some((candidate, score)) = self.best_candidate(reference, node, nodes) else {
                    outcome.dropped.push(dropped(0.0, DropReason::NoCandidate));
                    continue;
                };
                if score <= self.threshold {
                    outcome.dropped.push(dropped(score, DropReason::BelowThreshold));
                } else if healed.iter().any(|t| t == &candidate.id) {
                    outcome.dropped.push(dropped(score, DropReason::DuplicateTarget));
                } else {
                    tracing::debug!(
                        "healed {} -> '{}' as '{}' ({score:.2})",
                        node.id,
                        reference,
                        candidate.id
                    );
                    healed.push(candidate.id.clone());
                    outcome.repairs.push(LinkRepair {
                        node_id: node.id.clone(),
                        original: reference.clone(),
                        repaired: candidate.id.clone(),
                        similarity: score,
                    });
                }
            }

            let mut copy = node.clone();
            copy.links_to = Some(healed);
            outcome.nodes.push(copy);
        }

        tracing::info!(
            "link healing: {} repaired, {} dropped",
            outcome.repairs.len(),
            outcome.dropped.len()
        );
        outcome
    }

    fn best_candidate<'a>(
        &self,
        reference: &str,
        owner: &Node,
        nodes: &'a [Node],
    ) -> Option<(&'a Node, f64)> {
        let reference = reference.to_lowercase();
        let mut best: Option<(&'a Node, f64)> = None;
        for candidate in nodes.iter().filter(|n| n.id != owner.id) {
            let score = similarity(&reference, &candidate.id.to_lowercase())
                .max(similarity(&reference, &candidate.title.to_lowercase()));
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((candidate, score));
            }
        }
        best
    }
}
