//! Builders for the three semantic layers and the naive sentiment tagger they share.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

use super::{LayerType, SemanticConcept, SemanticLayer, Sentiment};
use crate::{entity::extract::CAPITALIZED_STOP_WORDS, ids::IdGenerator, properties::Node, text};

/// Characters either side of a theme occurrence considered its context.
pub const CONTEXT_RADIUS: usize = 50;
const MIN_RELATED_TOKEN_LEN: usize = 3;

pub const POSITIVE_WORDS: &[&str] = &[
    "benefit", "clarity", "empower", "freedom", "heal", "hope", "protect", "resilien", "safe",
    "secure", "strength", "success", "support", "trust", "truth",
];

pub const NEGATIVE_WORDS: &[&str] = &[
    "abuse", "attack", "coerc", "control", "danger", "decei", "decept", "exploit", "fear",
    "gaslight", "harm", "hostil", "isolat", "manipulat", "paranoi", "shame", "threat", "weapon",
];

pub const LATENT_VOCABULARY: &[&str] = &[
    "concept",
    "idea",
    "principle",
    "framework",
    "paradigm",
    "model",
    "mind",
    "brain",
    "thought",
    "perception",
    "cognition",
    "emotion",
];

static CAPITALIZED_TERM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Z][A-Za-z]{2,}(?:[ \t]+[A-Z][A-Za-z]{2,})*\b").expect("static regex")
});

static QUOTED_TERM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"\n]{2,80})"|“([^”\n]{2,80})”"#).expect("static regex"));

static LATENT_TERM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)\b({})s?\b", LATENT_VOCABULARY.join("|"))).expect("static regex")
});

/// Substring match against the fixed word lists; the side with more hits wins.
pub fn tag_sentiment(text: &str) -> Sentiment {
    let lowered = text.to_lowercase();
    let positive = POSITIVE_WORDS
        .iter()
        .filter(|w| lowered.contains(*w))
        .count();
    let negative = NEGATIVE_WORDS
        .iter()
        .filter(|w| lowered.contains(*w))
        .count();
    match positive.cmp(&negative) {
        std::cmp::Ordering::Greater => Sentiment::Positive,
        std::cmp::Ordering::Less => Sentiment::Negative,
        std::cmp::Ordering::Equal => Sentiment::Neutral,
    }
}

/// "The Keeper" → "Keeper"; a span made only of stop words becomes empty.
fn strip_leading_stop_words(span: &str) -> String {
    span.split_whitespace()
        .skip_while(|t| CAPITALIZED_STOP_WORDS.contains(t))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Accumulates one concept across nodes before ids are assigned.
#[derive(Default)]
struct ConceptAccumulator {
    frequency: usize,
    context: Vec<String>,
    related: BTreeSet<String>,
    sentiment_text: String,
}

impl ConceptAccumulator {
    fn add_context(&mut self, title: &str) {
        if !self.context.iter().any(|t| t == title) {
            self.context.push(title.to_string());
        }
    }
}

fn finish_layer(
    layer_type: LayerType,
    accumulated: BTreeMap<String, ConceptAccumulator>,
    ids: &dyn IdGenerator,
    confidence: impl Fn(&ConceptAccumulator) -> f64,
) -> SemanticLayer {
    let concepts: Vec<SemanticConcept> = accumulated
        .into_iter()
        .map(|(term, acc)| SemanticConcept {
            concept_id: ids.next_id("concept"),
            sentiment: tag_sentiment(&acc.sentiment_text),
            confidence: confidence(&acc),
            term,
            frequency: acc.frequency,
            context: acc.context,
            related_concepts: acc.related.into_iter().collect(),
        })
        .collect();
    SemanticLayer::new(layer_type, concepts)
}

/// Capitalized and quoted terms, deduplicated per node and aggregated by exact string.
pub fn surface_layer(nodes: &[Node], ids: &dyn IdGenerator) -> SemanticLayer {
    let mut accumulated: BTreeMap<String, ConceptAccumulator> = BTreeMap::new();
    for node in nodes {
        let mut terms: BTreeSet<String> = CAPITALIZED_TERM
            .find_iter(&node.content)
            .map(|m| strip_leading_stop_words(m.as_str()))
            .collect();
        terms.extend(QUOTED_TERM.captures_iter(&node.content).filter_map(|caps| {
            caps.get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str().trim().to_string())
        }));

        for term in terms.into_iter().filter(|t| !t.is_empty()) {
            let acc = accumulated.entry(term.clone()).or_default();
            acc.frequency += 1;
            acc.add_context(&node.title);
            if acc.sentiment_text.is_empty() {
                acc.sentiment_text = term;
            }
        }
    }
    finish_layer(LayerType::Surface, accumulated, ids, |acc| {
        (0.5 + 0.1 * acc.frequency as f64).min(1.0)
    })
}

/// Declared themes found in their own node's content, with the tokens around the first
/// occurrence as related concepts.
pub fn contextual_layer(nodes: &[Node], ids: &dyn IdGenerator) -> SemanticLayer {
    let mut accumulated: BTreeMap<String, ConceptAccumulator> = BTreeMap::new();
    for node in nodes {
        let lowered = node.content.to_lowercase();
        for theme in &node.themes {
            let theme = theme.trim().to_lowercase();
            if theme.is_empty() {
                continue;
            }
            let Some(start) = lowered.find(&theme) else {
                continue;
            };
            let context = text::window(&lowered, start, start + theme.len(), CONTEXT_RADIUS);
            let acc = accumulated.entry(theme.clone()).or_default();
            acc.frequency += 1;
            acc.add_context(&node.title);
            acc.related.extend(
                text::tokenize(context)
                    .into_iter()
                    .filter(|t| t.chars().count() >= MIN_RELATED_TOKEN_LEN && *t != theme),
            );
            acc.sentiment_text.push(' ');
            acc.sentiment_text.push_str(context);
        }
    }
    finish_layer(LayerType::Contextual, accumulated, ids, |_| 0.7)
}

/// Fixed abstract/psychological vocabulary; related concepts are the other vocabulary terms
/// that share a node.
pub fn latent_layer(nodes: &[Node], ids: &dyn IdGenerator) -> SemanticLayer {
    let mut accumulated: BTreeMap<String, ConceptAccumulator> = BTreeMap::new();
    for node in nodes {
        let mut per_node: BTreeMap<String, usize> = BTreeMap::new();
        for caps in LATENT_TERM.captures_iter(&node.content) {
            if let Some(term) = caps.get(1) {
                *per_node.entry(term.as_str().to_lowercase()).or_default() += 1;
            }
        }
        for (term, count) in per_node.iter() {
            let acc = accumulated.entry(term.clone()).or_default();
            acc.frequency += count;
            acc.add_context(&node.title);
            acc.related
                .extend(per_node.keys().filter(|other| *other != term).cloned());
            if acc.sentiment_text.is_empty() {
                acc.sentiment_text = term.clone();
            }
        }
    }
    finish_layer(LayerType::Latent, accumulated, ids, |_| 0.6)
}
