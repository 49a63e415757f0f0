//! Entity resolver: extracts person, organization and location candidates from node content,
//! clusters them into [`ResolvedEntity`]s, infers aliases, and records lexical relationships.
//!
//! Clustering is keyed on the exact, case-sensitive surface string by default
//! ([`ExactSurfaceKey`]). "John Smith" and "J. Smith" therefore stay apart, while two different
//! people who share a name collapse into one entity. Callers who want a looser grouping can
//! supply another [`ClusterKey`] strategy without touching the rest of the pipeline.

pub mod extract;

use crate::{ids::IdGenerator, properties::Node, text::mean};
use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

pub use extract::{
    CandidateExtractor, EntityCandidate, EntityCandidateFilter, EntityType,
    PrepositionLocationFilter, StopWordPersonFilter, SuffixOrganizationFilter,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedEntity {
    pub entity_id: String,
    pub primary_name: String,
    pub entity_type: EntityType,
    pub aliases: BTreeSet<String>,
    pub confidence: f64,
    pub source_nodes: BTreeSet<String>,
}

impl ResolvedEntity {
    /// Whether `token` occurs inside the primary name or any alias.
    pub fn matches_token(&self, token: &str) -> bool {
        self.primary_name.contains(token) || self.aliases.iter().any(|a| a.contains(token))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRelationship {
    pub from_entity: String,
    pub to_entity: String,
    pub relationship_type: String,
    pub strength: f64,
    pub evidence: String,
}

/// Candidates sharing a cluster key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityCluster {
    pub key: String,
    pub members: Vec<EntityCandidate>,
}

impl EntityCluster {
    /// `min(1, 0.5 + 0.1 × members + 0.2 × strong members)`, strong meaning confidence > 0.8.
    pub fn confidence(&self) -> f64 {
        let strong = self.members.iter().filter(|m| m.confidence > 0.8).count();
        (0.5 + 0.1 * self.members.len() as f64 + 0.2 * strong as f64).min(1.0)
    }

    /// Most frequent member type; ties resolve organization > person > location.
    pub fn entity_type(&self) -> EntityType {
        let mut counts: BTreeMap<EntityType, usize> = BTreeMap::new();
        for member in &self.members {
            *counts.entry(member.entity_type).or_default() += 1;
        }
        counts
            .into_iter()
            .max_by_key(|(kind, count)| (*count, kind.precedence()))
            .map(|(kind, _)| kind)
            .unwrap_or(EntityType::Concept)
    }

    pub fn primary_name(&self) -> &str {
        self.members
            .first()
            .map(|m| m.text.as_str())
            .unwrap_or(self.key.as_str())
    }
}

/// Strategy mapping a candidate to the key it clusters under.
pub trait ClusterKey: Send + Sync {
    fn key(&self, candidate: &EntityCandidate) -> String;
}

/// Exact surface string; the default.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExactSurfaceKey;

impl ClusterKey for ExactSurfaceKey {
    fn key(&self, candidate: &EntityCandidate) -> String {
        candidate.text.clone()
    }
}

/// Case- and whitespace-insensitive surface string. Opt-in.
#[derive(Debug, Default, Clone, Copy)]
pub struct NormalizedSurfaceKey;

impl ClusterKey for NormalizedSurfaceKey {
    fn key(&self, candidate: &EntityCandidate) -> String {
        candidate
            .text
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityMetrics {
    pub total_candidates: usize,
    /// Fraction of entities with at least one alias.
    pub alias_coverage: f64,
    /// Relationships per entity.
    pub relationship_density: f64,
    pub mean_confidence: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityResolution {
    pub entities: Vec<ResolvedEntity>,
    pub relationships: Vec<EntityRelationship>,
    pub metrics: EntityMetrics,
}

impl EntityResolution {
    pub fn by_name(&self, name: &str) -> Option<&ResolvedEntity> {
        self.entities.iter().find(|e| e.primary_name == name)
    }
}

struct RelationshipPattern {
    relationship_type: &'static str,
    strength: f64,
    pattern: Lazy<Regex>,
}

static RELATIONSHIP_PATTERNS: [RelationshipPattern; 4] = [
    RelationshipPattern {
        relationship_type: "COLLABORATES_WITH",
        strength: 0.7,
        pattern: Lazy::new(|| {
            Regex::new(r"\b(\w+)[ \t]+(?:works|collaborates|interacts)[ \t]+with[ \t]+(\w+)")
                .expect("static regex")
        }),
    },
    RelationshipPattern {
        relationship_type: "REPORTS_TO",
        strength: 0.8,
        pattern: Lazy::new(|| {
            Regex::new(r"\b(\w+)[ \t]+(?:reports|answers)[ \t]+to[ \t]+(\w+)")
                .expect("static regex")
        }),
    },
    RelationshipPattern {
        relationship_type: "COMMUNICATES_WITH",
        strength: 0.6,
        pattern: Lazy::new(|| {
            Regex::new(r"\b(\w+)[ \t]+(?:contacts|communicates[ \t]+with)[ \t]+(\w+)")
                .expect("static regex")
        }),
    },
    RelationshipPattern {
        relationship_type: "MEETS_WITH",
        strength: 0.5,
        pattern: Lazy::new(|| {
            Regex::new(r"\b(\w+)[ \t]+(?:meets|encounters)(?:[ \t]+with)?[ \t]+(\w+)")
                .expect("static regex")
        }),
    },
];

/// Relationship tokens shorter than this never match an entity.
const MIN_RELATION_TOKEN_LEN: usize = 2;

pub struct EntityResolver {
    extractor: CandidateExtractor,
    cluster_key: Box<dyn ClusterKey>,
    ids: Arc<dyn IdGenerator>,
}

impl EntityResolver {
    pub fn new(ids: Arc<dyn IdGenerator>) -> Self {
        EntityResolver {
            extractor: CandidateExtractor::default(),
            cluster_key: Box::new(ExactSurfaceKey),
            ids,
        }
    }

    pub fn with_extractor(mut self, extractor: CandidateExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_cluster_key(mut self, cluster_key: Box<dyn ClusterKey>) -> Self {
        self.cluster_key = cluster_key;
        self
    }

    pub fn resolve(&self, nodes: &[Node]) -> EntityResolution {
        let candidates: Vec<EntityCandidate> = nodes
            .par_iter()
            .map(|node| self.extractor.extract(node))
            .collect::<Vec<_>>()
            .into_iter()
            .flatten()
            .collect();
        let total_candidates = candidates.len();

        let clusters = self.cluster(candidates);
        let mut entities: Vec<ResolvedEntity> = clusters
            .iter()
            .map(|cluster| ResolvedEntity {
                entity_id: self.ids.next_id("entity"),
                primary_name: cluster.primary_name().to_string(),
                entity_type: cluster.entity_type(),
                aliases: BTreeSet::new(),
                confidence: cluster.confidence(),
                source_nodes: cluster.members.iter().map(|m| m.node_id.clone()).collect(),
            })
            .collect();

        for entity in entities.iter_mut() {
            entity.aliases = find_aliases(&entity.primary_name, nodes);
        }

        let relationships = extract_relationships(nodes, &entities);

        let entity_count = entities.len();
        let metrics = EntityMetrics {
            total_candidates,
            alias_coverage: ratio(
                entities.iter().filter(|e| !e.aliases.is_empty()).count(),
                entity_count,
            ),
            relationship_density: ratio(relationships.len(), entity_count),
            mean_confidence: mean(entities.iter().map(|e| e.confidence)),
        };
        tracing::debug!(
            "Entity resolver: {} candidates -> {} entities, {} relationships",
            total_candidates,
            entity_count,
            relationships.len()
        );

        EntityResolution {
            entities,
            relationships,
            metrics,
        }
    }

    /// Group candidates by cluster key; clusters are ordered by key.
    pub fn cluster(&self, candidates: Vec<EntityCandidate>) -> Vec<EntityCluster> {
        let mut clusters: BTreeMap<String, EntityCluster> = BTreeMap::new();
        for candidate in candidates {
            let key = self.cluster_key.key(&candidate);
            clusters
                .entry(key.clone())
                .or_insert_with(|| EntityCluster {
                    key,
                    members: vec![],
                })
                .members
                .push(candidate);
        }
        clusters.into_values().collect()
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Occurrences of the name's first token, optionally followed by one capitalized token, that
/// differ from the name itself. Single-token names have no aliases.
fn find_aliases(primary_name: &str, nodes: &[Node]) -> BTreeSet<String> {
    let mut aliases = BTreeSet::new();
    let mut tokens = primary_name.split_whitespace();
    let (Some(first), Some(_)) = (tokens.next(), tokens.next()) else {
        return aliases;
    };
    let Ok(pattern) = Regex::new(&format!(
        r"\b{}(?:[ \t]+[A-Z][a-z]+)?\b",
        regex::escape(first)
    )) else {
        return aliases;
    };
    for node in nodes {
        for found in pattern.find_iter(&node.content) {
            if found.as_str() != primary_name {
                aliases.insert(found.as_str().to_string());
            }
        }
    }
    aliases
}

fn extract_relationships(nodes: &[Node], entities: &[ResolvedEntity]) -> Vec<EntityRelationship> {
    let lookup = |token: &str| {
        if token.chars().count() < MIN_RELATION_TOKEN_LEN {
            return None;
        }
        entities.iter().find(|e| e.matches_token(token))
    };

    let mut relationships = Vec::new();
    for node in nodes {
        for relation in RELATIONSHIP_PATTERNS.iter() {
            for caps in relation.pattern.captures_iter(&node.content) {
                let (Some(lhs), Some(rhs)) = (caps.get(1), caps.get(2)) else {
                    continue;
                };
                let (Some(from), Some(to)) = (lookup(lhs.as_str()), lookup(rhs.as_str())) else {
                    continue;
                };
                if from.entity_id == to.entity_id {
                    continue;
                }
                relationships.push(EntityRelationship {
                    from_entity: from.entity_id.clone(),
                    to_entity: to.entity_id.clone(),
                    relationship_type: relation.relationship_type.to_string(),
                    strength: relation.strength,
                    evidence: format!("{}: \"{}\"", node.id, &caps[0]),
                });
            }
        }
    }
    relationships
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIdGenerator;
    use crate::tests::helpers::{node, with_content};
    use test_log::test;

    fn resolver() -> EntityResolver {
        EntityResolver::new(Arc::new(SequentialIdGenerator::new()))
    }

    #[test]
    fn test_exact_string_clusters() {
        let a = with_content(node("a", "A"), "Daniel Reyes filed the report. Dan Reyes did not.");
        let b = with_content(node("b", "B"), "Later, Daniel Reyes denied it.");
        let resolution = resolver().resolve(&[a, b]);

        let daniel = resolution.by_name("Daniel Reyes").unwrap();
        assert_eq!(daniel.entity_type, EntityType::Person);
        assert_eq!(
            daniel.source_nodes,
            BTreeSet::from(["a".to_string(), "b".to_string()])
        );
        // Two members at 0.7: 0.5 + 0.2
        assert!((daniel.confidence - 0.7).abs() < 1e-9);
        // Near-identical names stay separate.
        assert!(resolution.by_name("Dan Reyes").is_some());
    }

    #[test]
    fn test_cluster_confidence_caps_at_one() {
        let member = EntityCandidate {
            text: "Civic Trust Foundation".into(),
            entity_type: EntityType::Organization,
            confidence: 0.9,
            node_id: "a".into(),
            start: 0,
            end: 22,
            code: None,
        };
        let cluster = EntityCluster {
            key: member.text.clone(),
            members: vec![member.clone(), member.clone(), member],
        };
        assert_eq!(cluster.confidence(), 1.0);
        assert_eq!(cluster.entity_type(), EntityType::Organization);
    }

    #[test]
    fn test_aliases_exclude_primary_name() {
        let a = with_content(
            node("a", "A"),
            "Marcus Hale arrived. Marcus left early. Marcus Hale returned.",
        );
        let resolution = resolver().resolve(&[a]);
        let marcus = resolution.by_name("Marcus Hale").unwrap();
        assert_eq!(marcus.aliases, BTreeSet::from(["Marcus".to_string()]));
        assert_eq!(resolution.metrics.alias_coverage, 1.0);
    }

    #[test]
    fn test_relationship_requires_resolved_entities() {
        let a = with_content(
            node("a", "A"),
            "Elena Voss arrived with Ivan Petrov. Voss works with Petrov daily. \
             Voss works with nobody.",
        );
        let resolution = resolver().resolve(&[a]);
        assert_eq!(resolution.relationships.len(), 1);
        let rel = &resolution.relationships[0];
        assert_eq!(rel.relationship_type, "COLLABORATES_WITH");
        assert_eq!(rel.strength, 0.7);
        let elena = resolution.by_name("Elena Voss").unwrap();
        let ivan = resolution.by_name("Ivan Petrov").unwrap();
        assert_eq!(rel.from_entity, elena.entity_id);
        assert_eq!(rel.to_entity, ivan.entity_id);
    }

    #[test]
    fn test_reports_to_pattern() {
        let a = with_content(
            node("a", "A"),
            "Sara Lind and Omar Haddad met. Lind reports to Haddad.",
        );
        let resolution = resolver().resolve(&[a]);
        assert!(resolution
            .relationships
            .iter()
            .any(|r| r.relationship_type == "REPORTS_TO" && r.strength == 0.8));
    }

    #[test]
    fn test_normalized_cluster_key_is_opt_in() {
        let a = with_content(node("a", "A"), "Nadia Brook spoke. NADIA BROOK is a stamp.");
        let exact = resolver().cluster(CandidateExtractor::default().extract(&a));
        let loose = resolver()
            .with_cluster_key(Box::new(NormalizedSurfaceKey))
            .cluster(vec![
                exact[0].members[0].clone(),
                EntityCandidate {
                    text: "nadia  brook".into(),
                    ..exact[0].members[0].clone()
                },
            ]);
        assert_eq!(loose.len(), 1);
        assert_eq!(loose[0].members.len(), 2);
    }

    #[test]
    fn test_empty_corpus_content_yields_no_entities() {
        let resolution = resolver().resolve(&[node("a", "A")]);
        assert!(resolution.entities.is_empty());
        assert_eq!(resolution.metrics.alias_coverage, 0.0);
        assert_eq!(resolution.metrics.relationship_density, 0.0);
    }
}
