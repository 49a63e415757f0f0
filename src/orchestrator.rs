//! The indexing pipeline.
//!
//! [Orchestrator::run] validates the corpus, runs the four analysis passes concurrently, audits
//! quality and structure, scores the health of the result and, when health falls below the
//! configured threshold, runs an optimization pass (heal, relink, prune, re-audit).
//!
//! Only an empty corpus or duplicate node ids abort a run. Everything else is reported through
//! [EnhancedDiagnostics::issues].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, sync::Arc, time::Instant};

use crate::{
    config::PipelineConfig,
    diagnostic::{GraphAudit, IndexingIssue, IssueCategory},
    entity::{EntityResolution, EntityResolver},
    error::DossierError,
    healer::{DroppedReference, LinkHealer, LinkRepair},
    ids::{Clock, IdGenerator, SystemClock, UuidIdGenerator},
    linker::StructuralLinker,
    properties::{GraphLink, Node, Severity},
    quality::{QualityAssurance, QualityAssuranceReport, QualitySnapshot},
    semantic::{SemanticAnalysis, SemanticAnalyzer},
    temporal::{TemporalIndex, TemporalIndexer},
    text,
};

/// Layers the semantic analyzer is expected to populate.
pub const EXPECTED_SEMANTIC_LAYERS: usize = 3;

/// Health scores of one run, each in [0, 1], plus every issue raised along the way.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedDiagnostics {
    pub structural_integrity: f64,
    pub temporal_consistency: f64,
    pub entity_resolution_quality: f64,
    pub semantic_coherence: f64,
    pub cross_domain_integration: f64,
    /// Mean of the five scores above.
    pub overall_health: f64,
    pub issues: Vec<IndexingIssue>,
    pub audit: GraphAudit,
}

impl EnhancedDiagnostics {
    pub fn issues_in(&self, category: IssueCategory) -> impl Iterator<Item = &IndexingIssue> {
        self.issues.iter().filter(move |i| i.category == category)
    }

    pub fn critical_issues(&self) -> usize {
        self.issues.iter().filter(|i| i.is_critical()).count()
    }
}

/// How much of the corpus each pass reached.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationMetrics {
    /// Fraction of nodes with at least one link.
    pub link_coverage: f64,
    /// Fraction of nodes that contributed to at least one resolved entity.
    pub entity_coverage: f64,
    /// Fraction of nodes that contributed to at least one semantic concept.
    pub semantic_coverage: f64,
    /// Fraction of nodes whose creation date parsed.
    pub temporal_coverage: f64,
    pub mean_quality: f64,
    pub quality_pass_rate: f64,
    /// Nodes admitted by the quality gate that nonetheless have no links.
    pub quality_structure_conflicts: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationReport {
    pub health_before: f64,
    pub repairs: Vec<LinkRepair>,
    pub dropped_references: Vec<DroppedReference>,
    /// Whether the healed corpus was relinked.
    pub relinked: bool,
    /// Links removed for falling under the minimum weight.
    pub pruned_links: usize,
    pub links: Vec<GraphLink>,
    pub audit: GraphAudit,
    /// Structural integrity recomputed against the optimized links.
    pub structural_integrity_after: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedIndexingResult {
    pub links: Vec<GraphLink>,
    pub temporal: TemporalIndex,
    pub entities: EntityResolution,
    pub semantic: SemanticAnalysis,
    pub quality: QualityAssuranceReport,
    pub diagnostics: EnhancedDiagnostics,
    pub integration: IntegrationMetrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimization: Option<OptimizationReport>,
    pub processing_ms: u64,
}

impl EnhancedIndexingResult {
    /// The links a consumer should use: optimized when optimization ran.
    pub fn effective_links(&self) -> &[GraphLink] {
        match &self.optimization {
            Some(report) => &report.links,
            None => &self.links,
        }
    }

    pub fn snapshot(&self, timestamp: DateTime<Utc>) -> QualitySnapshot {
        QualitySnapshot {
            timestamp,
            mean_quality: self.integration.mean_quality,
            critical_issues: self.diagnostics.critical_issues()
                + self.quality.summary.critical_issues(),
            processing_ms: self.processing_ms,
        }
    }
}

/// Fails on an empty corpus or a repeated node id.
pub fn validate_corpus(nodes: &[Node]) -> Result<(), DossierError> {
    if nodes.is_empty() {
        return Err(DossierError::EmptyCorpus);
    }
    let mut seen = BTreeSet::new();
    for node in nodes {
        if !seen.insert(node.id.as_str()) {
            return Err(DossierError::DuplicateNode(node.id.clone()));
        }
    }
    Ok(())
}

pub struct Orchestrator {
    config: PipelineConfig,
    linker: StructuralLinker,
    temporal: TemporalIndexer,
    entities: EntityResolver,
    semantic: SemanticAnalyzer,
    assurance: QualityAssurance,
    healer: LinkHealer,
}

impl Orchestrator {
    /// Random entity/concept ids and the system clock.
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_capabilities(config, Arc::new(UuidIdGenerator), Arc::new(SystemClock))
    }

    pub fn with_capabilities(
        config: PipelineConfig,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Orchestrator {
            linker: StructuralLinker::new(),
            temporal: TemporalIndexer::new(clock),
            entities: EntityResolver::new(ids.clone()),
            semantic: SemanticAnalyzer::new(ids),
            assurance: QualityAssurance::new(
                config.quality_gate.clone(),
                config.structure.clone(),
            ),
            healer: LinkHealer::new(config.optimization.heal_similarity),
            config,
        }
    }

    /// Replace the entity resolver, e.g. to plug in other candidate filters or cluster keys.
    pub fn with_entity_resolver(mut self, resolver: EntityResolver) -> Self {
        self.entities = resolver;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run(&self, nodes: &[Node]) -> Result<EnhancedIndexingResult, DossierError> {
        validate_corpus(nodes)?;
        let started = Instant::now();
        tracing::info!("indexing {} nodes", nodes.len());

        let ((links, temporal), (entities, semantic)) = rayon::join(
            || {
                rayon::join(
                    || self.linker.link(nodes),
                    || self.temporal.index(nodes),
                )
            },
            || {
                rayon::join(
                    || self.entities.resolve(nodes),
                    || self.semantic.analyze(nodes),
                )
            },
        );

        let (quality, audit) = rayon::join(
            || self.assurance.run(nodes, &links),
            || GraphAudit::run(nodes, &links),
        );

        let diagnostics = self.diagnose(
            nodes, &links, &temporal, &entities, &semantic, &quality, audit,
        );
        let integration = integration_metrics(
            nodes,
            &temporal,
            &entities,
            &semantic,
            &quality,
            &diagnostics.audit,
        );

        tracing::info!(
            "overall health {:.3} (structure {:.3}, temporal {:.3}, entities {:.3}, \
             semantics {:.3}, cross-domain {:.3})",
            diagnostics.overall_health,
            diagnostics.structural_integrity,
            diagnostics.temporal_consistency,
            diagnostics.entity_resolution_quality,
            diagnostics.semantic_coherence,
            diagnostics.cross_domain_integration
        );

        let optimization = if self.config.optimization.enabled
            && diagnostics.overall_health < self.config.optimization.health_threshold
        {
            Some(self.optimize(nodes, &links, &diagnostics, &quality))
        } else {
            None
        };

        let processing_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        Ok(EnhancedIndexingResult {
            links,
            temporal,
            entities,
            semantic,
            quality,
            diagnostics,
            integration,
            optimization,
            processing_ms,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn diagnose(
        &self,
        nodes: &[Node],
        links: &[GraphLink],
        temporal: &TemporalIndex,
        entities: &EntityResolution,
        semantic: &SemanticAnalysis,
        quality: &QualityAssuranceReport,
        audit: GraphAudit,
    ) -> EnhancedDiagnostics {
        let structural_integrity = structural_integrity(&audit);
        let temporal_consistency = if temporal.total_events() == 0 {
            1.0
        } else {
            (1.0 - temporal.anomalies.len() as f64 / temporal.total_events() as f64).max(0.0)
        };
        let entity_resolution_quality =
            ((entities.metrics.alias_coverage + entities.metrics.relationship_density) / 2.0)
                .min(1.0);
        let semantic_coherence = semantic.mean_coherence().clamp(0.0, 1.0);
        let cross_domain_integration = ((0.7 * semantic.cross_domain_links.len() as f64
            + 0.3 * semantic.latent_patterns.len() as f64)
            / 10.0)
            .min(1.0);
        let overall_health = text::mean([
            structural_integrity,
            temporal_consistency,
            entity_resolution_quality,
            semantic_coherence,
            cross_domain_integration,
        ]);

        let mut issues = Vec::new();
        for anomaly in temporal.anomalies.iter() {
            issues.push(
                IndexingIssue::new(
                    IssueCategory::Temporal,
                    anomaly.severity,
                    anomaly.description.clone(),
                )
                .for_node(&anomaly.node_id),
            );
        }
        for failure in temporal.parse_failures.iter() {
            issues.push(
                IndexingIssue::new(
                    IssueCategory::Temporal,
                    Severity::Low,
                    format!("unparseable date '{}': {}", failure.raw, failure.reason),
                )
                .for_node(&failure.node_id),
            );
        }
        if entities.entities.is_empty() {
            issues.push(IndexingIssue::new(
                IssueCategory::Entity,
                Severity::Medium,
                "no entities resolved",
            ));
        }
        let populated = semantic.non_empty_layers();
        if populated < EXPECTED_SEMANTIC_LAYERS {
            issues.push(IndexingIssue::new(
                IssueCategory::Semantic,
                Severity::Low,
                format!("only {populated} of {EXPECTED_SEMANTIC_LAYERS} semantic layers populated"),
            ));
        }
        issues.extend(audit.issues(self.config.structure.max_orphan_ratio));
        for rejected in quality.rejected.iter() {
            let score = quality
                .report(rejected)
                .map(|r| r.overall_score)
                .unwrap_or(0.0);
            issues.push(
                IndexingIssue::new(
                    IssueCategory::Quality,
                    Severity::Medium,
                    format!(
                        "rejected by quality gate ({score:.2} < {:.2})",
                        self.config.quality_gate.threshold
                    ),
                )
                .for_node(rejected),
            );
        }
        for node in nodes.iter().filter(|n| n.record_hash_matches() == Some(false)) {
            issues.push(
                IndexingIssue::new(
                    IssueCategory::Quality,
                    Severity::Low,
                    "recordHash does not match the content digest",
                )
                .for_node(&node.id),
            );
        }
        tracing::debug!("{} links audited, {} issues raised", links.len(), issues.len());

        EnhancedDiagnostics {
            structural_integrity,
            temporal_consistency,
            entity_resolution_quality,
            semantic_coherence,
            cross_domain_integration,
            overall_health,
            issues,
            audit,
        }
    }

    fn optimize(
        &self,
        nodes: &[Node],
        links: &[GraphLink],
        diagnostics: &EnhancedDiagnostics,
        quality: &QualityAssuranceReport,
    ) -> OptimizationReport {
        tracing::info!(
            "health {:.3} below {:.3}, optimizing",
            diagnostics.overall_health,
            self.config.optimization.health_threshold
        );
        let healing = self.healer.heal(nodes);
        let relinked = healing.changed();
        let mut optimized = if relinked {
            self.linker.link(&healing.nodes)
        } else {
            links.to_vec()
        };

        let structural_flagged = diagnostics
            .issues_in(IssueCategory::Structural)
            .next()
            .is_some()
            || !quality.structural_issues.is_empty();
        let before_prune = optimized.len();
        if structural_flagged {
            let floor = self.config.optimization.min_link_weight;
            optimized.retain(|link| link.weight >= floor);
        }
        let pruned_links = before_prune - optimized.len();

        let audit = GraphAudit::run(&healing.nodes, &optimized);
        tracing::info!(
            "optimization: {} repairs, {} dropped references, {} links pruned, {} orphans remain",
            healing.repairs.len(),
            healing.dropped.len(),
            pruned_links,
            audit.orphan_count()
        );

        OptimizationReport {
            health_before: diagnostics.overall_health,
            repairs: healing.repairs,
            dropped_references: healing.dropped,
            relinked,
            pruned_links,
            structural_integrity_after: structural_integrity(&audit),
            links: optimized,
            audit,
        }
    }
}

/// Connected fraction discounted by the share of broken references.
pub fn structural_integrity(audit: &GraphAudit) -> f64 {
    (audit.connected_fraction() * (1.0 - audit.broken_ratio())).clamp(0.0, 1.0)
}

fn integration_metrics(
    nodes: &[Node],
    temporal: &TemporalIndex,
    entities: &EntityResolution,
    semantic: &SemanticAnalysis,
    quality: &QualityAssuranceReport,
    audit: &GraphAudit,
) -> IntegrationMetrics {
    let total = nodes.len() as f64;
    let fraction = |count: usize| if total > 0.0 { count as f64 / total } else { 0.0 };

    let entity_sources: BTreeSet<&str> = entities
        .entities
        .iter()
        .flat_map(|e| e.source_nodes.iter().map(String::as_str))
        .collect();
    let concept_titles: BTreeSet<&str> = semantic
        .layers
        .iter()
        .flat_map(|l| l.concepts.iter())
        .flat_map(|c| c.context.iter().map(String::as_str))
        .collect();
    let orphans: BTreeSet<&str> = audit.orphans.iter().map(String::as_str).collect();

    IntegrationMetrics {
        link_coverage: audit.connected_fraction(),
        entity_coverage: fraction(
            nodes
                .iter()
                .filter(|n| entity_sources.contains(n.id.as_str()))
                .count(),
        ),
        semantic_coverage: fraction(
            nodes
                .iter()
                .filter(|n| concept_titles.contains(n.title.as_str()))
                .count(),
        ),
        temporal_coverage: fraction(
            nodes
                .iter()
                .filter(|n| temporal.has_reliable_creation(&n.id))
                .count(),
        ),
        mean_quality: quality.summary.mean_score,
        quality_pass_rate: quality.pass_rate(),
        quality_structure_conflicts: quality
            .admitted
            .iter()
            .filter(|id| orphans.contains(id.as_str()))
            .count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{FixedClock, SequentialIdGenerator};
    use crate::tests::helpers::{node, sample_corpus, with_links};
    use test_log::test;

    fn orchestrator(config: PipelineConfig) -> Orchestrator {
        Orchestrator::with_capabilities(
            config,
            Arc::new(SequentialIdGenerator::new()),
            Arc::new(FixedClock::ymd(2030, 6, 1)),
        )
    }

    #[test]
    fn test_empty_corpus_is_fatal() {
        let result = orchestrator(PipelineConfig::default()).run(&[]);
        assert_eq!(result.unwrap_err(), DossierError::EmptyCorpus);
    }

    #[test]
    fn test_duplicate_ids_are_fatal() {
        let nodes = vec![node("a", "Alpha"), node("a", "Again")];
        let result = orchestrator(PipelineConfig::default()).run(&nodes);
        assert_eq!(
            result.unwrap_err(),
            DossierError::DuplicateNode("a".to_string())
        );
    }

    #[test]
    fn test_health_scores_are_bounded() {
        let result = orchestrator(PipelineConfig::default())
            .run(&sample_corpus())
            .unwrap();
        let d = &result.diagnostics;
        for score in [
            d.structural_integrity,
            d.temporal_consistency,
            d.entity_resolution_quality,
            d.semantic_coherence,
            d.cross_domain_integration,
            d.overall_health,
        ] {
            assert!((0.0..=1.0).contains(&score), "score {score} out of range");
        }
        assert_eq!(
            d.audit.orphans.len() + d.audit.connected.len(),
            d.audit.total_nodes
        );
    }

    #[test]
    fn test_optimization_heals_broken_reference() {
        let nodes = vec![
            with_links(node("doctrine-control", "Control"), &["tactic-isolatoin"]),
            node("tactic-isolation", "Isolation"),
            node("profile-hale", "Hale"),
        ];
        let result = orchestrator(PipelineConfig::default()).run(&nodes).unwrap();
        assert!(result.diagnostics.overall_health < 0.7);
        let optimization = result.optimization.as_ref().unwrap();
        assert_eq!(optimization.repairs.len(), 1);
        assert!(optimization.relinked);
        assert!(optimization
            .links
            .iter()
            .any(|l| l.source == "doctrine-control" && l.target == "tactic-isolation"));
        assert!(optimization.audit.broken_references.is_empty());
        assert!(result.links.is_empty());
        assert_eq!(result.effective_links().len(), optimization.links.len());
    }

    #[test]
    fn test_gate_rejection_keeps_nodes_in_the_link_graph() {
        let nodes = vec![with_links(node("a", "Alpha"), &["b"]), node("b", "Beta")];
        let result = orchestrator(PipelineConfig::default()).run(&nodes).unwrap();
        assert_eq!(result.quality.rejected, vec!["a", "b"]);
        assert!(result
            .effective_links()
            .iter()
            .any(|l| l.source == "a" && l.target == "b"));
        assert!(result
            .diagnostics
            .issues_in(IssueCategory::Quality)
            .any(|i| i.node_id.as_deref() == Some("a")));
    }

    #[test]
    fn test_optimization_can_be_disabled() {
        let mut config = PipelineConfig::default();
        config.optimization.enabled = false;
        let result = orchestrator(config).run(&[node("a", "Alpha")]).unwrap();
        assert!(result.optimization.is_none());
    }

    #[test]
    fn test_issue_sources() {
        let mut n = node("a", "Alpha");
        n.metadata.date = "not a date".to_string();
        let result = orchestrator(PipelineConfig::default()).run(&[n]).unwrap();
        let categories: BTreeSet<IssueCategory> =
            result.diagnostics.issues.iter().map(|i| i.category).collect();
        assert!(categories.contains(&IssueCategory::Temporal));
        assert!(categories.contains(&IssueCategory::Entity));
        assert!(categories.contains(&IssueCategory::Semantic));
        assert!(categories.contains(&IssueCategory::Structural));
        assert!(categories.contains(&IssueCategory::Quality));
        assert_eq!(result.integration.temporal_coverage, 0.0);
    }
}
