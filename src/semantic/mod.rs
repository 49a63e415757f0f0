//! Multi-layer semantic analysis: surface terms, theme contexts and a latent vocabulary, plus
//! the cross-layer signals derived from them (drift, cross-domain links, recurring patterns).

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::{Display, Formatter},
    sync::Arc,
};

use crate::{ids::IdGenerator, properties::Node, text};

pub mod layers;

pub use layers::tag_sentiment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Display for Sentiment {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let label = match self {
            Sentiment::Positive => "POSITIVE",
            Sentiment::Negative => "NEGATIVE",
            Sentiment::Neutral => "NEUTRAL",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LayerType {
    Surface,
    Contextual,
    Latent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticConcept {
    pub concept_id: String,
    pub term: String,
    pub frequency: usize,
    /// Titles of the nodes the concept was found in, in corpus order.
    pub context: Vec<String>,
    pub related_concepts: Vec<String>,
    pub sentiment: Sentiment,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticLayer {
    pub layer_type: LayerType,
    pub concepts: Vec<SemanticConcept>,
    /// Mean concept frequency.
    pub density: f64,
    /// Mean related-concept count.
    pub coherence: f64,
}

impl SemanticLayer {
    pub fn new(layer_type: LayerType, concepts: Vec<SemanticConcept>) -> Self {
        let density = text::mean(concepts.iter().map(|c| c.frequency as f64));
        let coherence = text::mean(concepts.iter().map(|c| c.related_concepts.len() as f64));
        SemanticLayer {
            layer_type,
            concepts,
            density,
            coherence,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }
}

/// A term whose sentiment as a named surface term disagrees with its sentiment in context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptDrift {
    pub term: String,
    pub surface_sentiment: Sentiment,
    pub contextual_sentiment: Sentiment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CrossDomainType {
    Metaphor,
    Analogy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossDomainLink {
    pub source: String,
    pub target: String,
    pub link_type: CrossDomainType,
    pub strength: f64,
    pub node_id: String,
    pub evidence: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatentPattern {
    pub pattern: String,
    pub pattern_type: String,
    pub occurrences: usize,
    pub node_count: usize,
    /// Fraction of nodes containing the word.
    pub significance: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticAnalysis {
    pub layers: Vec<SemanticLayer>,
    pub drift: Vec<ConceptDrift>,
    pub cross_domain_links: Vec<CrossDomainLink>,
    pub latent_patterns: Vec<LatentPattern>,
}

impl SemanticAnalysis {
    pub fn layer(&self, layer_type: LayerType) -> Option<&SemanticLayer> {
        self.layers.iter().find(|l| l.layer_type == layer_type)
    }

    pub fn non_empty_layers(&self) -> usize {
        self.layers.iter().filter(|l| !l.is_empty()).count()
    }

    pub fn mean_coherence(&self) -> f64 {
        text::mean(self.layers.iter().map(|l| l.coherence))
    }
}

pub const ANALOGY_STRENGTH: f64 = 0.7;
pub const METAPHOR_STRENGTH: f64 = 0.8;
pub const RECURRING: &str = "RECURRING";
const MIN_PATTERN_WORD_LEN: usize = 4;
const MIN_PATTERN_COUNT: usize = 3;

static ANALOGY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\w+)[ \t]+is[ \t]+like[ \t]+(?:(?:a|an|the)[ \t]+)?(\w+)")
        .expect("static regex")
});

static METAPHOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\w+)[ \t]+is[ \t]+(?:(?:a|an|the)[ \t]+)?(\w+)").expect("static regex")
});

pub struct SemanticAnalyzer {
    ids: Arc<dyn IdGenerator>,
}

impl SemanticAnalyzer {
    pub fn new(ids: Arc<dyn IdGenerator>) -> Self {
        SemanticAnalyzer { ids }
    }

    pub fn analyze(&self, nodes: &[Node]) -> SemanticAnalysis {
        let ids = self.ids.as_ref();
        let surface = layers::surface_layer(nodes, ids);
        let contextual = layers::contextual_layer(nodes, ids);
        let latent = layers::latent_layer(nodes, ids);

        let drift = concept_drift(&surface, &contextual);
        let cross_domain_links = cross_domain_links(nodes);
        let latent_patterns = latent_patterns(nodes);

        tracing::debug!(
            "semantic analysis: {} surface, {} contextual, {} latent concepts; {} drift, {} \
             cross-domain links, {} latent patterns",
            surface.concepts.len(),
            contextual.concepts.len(),
            latent.concepts.len(),
            drift.len(),
            cross_domain_links.len(),
            latent_patterns.len()
        );

        SemanticAnalysis {
            layers: vec![surface, contextual, latent],
            drift,
            cross_domain_links,
            latent_patterns,
        }
    }
}

/// Pairs each surface concept with the contextual concept of the same lower-cased term.
pub fn concept_drift(surface: &SemanticLayer, contextual: &SemanticLayer) -> Vec<ConceptDrift> {
    let contextual_by_term: BTreeMap<&str, Sentiment> = contextual
        .concepts
        .iter()
        .map(|c| (c.term.as_str(), c.sentiment))
        .collect();
    surface
        .concepts
        .iter()
        .filter_map(|c| {
            let term = c.term.to_lowercase();
            let contextual_sentiment = *contextual_by_term.get(term.as_str())?;
            (contextual_sentiment != c.sentiment).then(|| ConceptDrift {
                term,
                surface_sentiment: c.sentiment,
                contextual_sentiment,
            })
        })
        .collect()
}

pub fn cross_domain_links(nodes: &[Node]) -> Vec<CrossDomainLink> {
    let mut links = Vec::new();
    for node in nodes {
        for caps in ANALOGY.captures_iter(&node.content) {
            links.push(CrossDomainLink {
                source: caps[1].to_lowercase(),
                target: caps[2].to_lowercase(),
                link_type: CrossDomainType::Analogy,
                strength: ANALOGY_STRENGTH,
                node_id: node.id.clone(),
                evidence: caps[0].to_string(),
            });
        }
        for caps in METAPHOR.captures_iter(&node.content) {
            let target = caps[2].to_lowercase();
            if matches!(target.as_str(), "like" | "a" | "an" | "the") {
                continue;
            }
            links.push(CrossDomainLink {
                source: caps[1].to_lowercase(),
                target,
                link_type: CrossDomainType::Metaphor,
                strength: METAPHOR_STRENGTH,
                node_id: node.id.clone(),
                evidence: caps[0].to_string(),
            });
        }
    }
    links
}

/// Words of four or more characters seen more than twice overall and in more than one node.
pub fn latent_patterns(nodes: &[Node]) -> Vec<LatentPattern> {
    if nodes.is_empty() {
        return Vec::new();
    }
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut node_tokens: Vec<BTreeSet<String>> = Vec::with_capacity(nodes.len());
    for node in nodes {
        let tokens: Vec<String> = text::tokenize(&node.content)
            .into_iter()
            .filter(|t| t.chars().count() >= MIN_PATTERN_WORD_LEN)
            .collect();
        for token in tokens.iter() {
            *counts.entry(token.clone()).or_default() += 1;
        }
        node_tokens.push(tokens.into_iter().collect());
    }

    let mut patterns: Vec<LatentPattern> = counts
        .into_iter()
        .filter(|(_, count)| *count >= MIN_PATTERN_COUNT)
        .filter_map(|(word, occurrences)| {
            let node_count = node_tokens.iter().filter(|set| set.contains(&word)).count();
            (node_count > 1).then(|| LatentPattern {
                significance: node_count as f64 / nodes.len() as f64,
                pattern: word,
                pattern_type: RECURRING.to_string(),
                occurrences,
                node_count,
            })
        })
        .collect();
    patterns.sort_by(|a, b| {
        b.significance
            .total_cmp(&a.significance)
            .then(b.occurrences.cmp(&a.occurrences))
            .then(a.pattern.cmp(&b.pattern))
    });
    patterns
}
