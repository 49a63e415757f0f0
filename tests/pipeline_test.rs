//! End-to-end runs of the indexing pipeline.

mod common;

use common::{deterministic_orchestrator, init_logging, node, write_corpus};
use dossier_core::{
    config::PipelineConfig,
    corpus::Corpus,
    healer::LinkHealer,
    ids::FixedClock,
    linker::StructuralLinker,
    orchestrator::Orchestrator,
    properties::{LinkType, NodeType, Severity},
    quality::{monitor, AlertKind, MonitoringState},
    semantic::CrossDomainType,
    temporal::AnomalyType,
};
use tempfile::TempDir;

#[test]
fn two_linked_nodes_sharing_themes() {
    init_logging();
    let mut a = node("a", NodeType::Doctrine, "Alpha", &["control", "fear"], "");
    a.links_to = Some(vec!["b".to_string()]);
    let b = node("b", NodeType::Doctrine, "Beta", &["control", "fear"], "");
    let corpus = vec![a, b];

    let links = StructuralLinker::new().link(&corpus);
    let a_to_b: Vec<_> = links
        .iter()
        .filter(|l| l.source == "a" && l.target == "b")
        .collect();
    assert!(a_to_b.len() >= 2);
    assert!(a_to_b
        .iter()
        .any(|l| l.kind == LinkType::Explicit && l.weight == 1.0));
    assert!(a_to_b
        .iter()
        .any(|l| l.kind == LinkType::Inferred && l.weight == 0.6));

    let result = deterministic_orchestrator(PipelineConfig::default())
        .run(&corpus)
        .unwrap();
    assert_eq!(result.diagnostics.audit.orphan_count(), 0);
    assert!(result.links.iter().all(|l| l.source != l.target));
}

#[test]
fn high_signal_node_without_themes() {
    init_logging();
    let mut n = node("a", NodeType::Profile, "Alpha", &[], "");
    n.metadata.is_high_signal = true;

    let result = deterministic_orchestrator(PipelineConfig::default())
        .run(&[n])
        .unwrap();
    let anomalies = &result.temporal.anomalies;
    assert_eq!(anomalies.len(), 1);
    assert_eq!(anomalies[0].anomaly_type, AnomalyType::Behavioral);
    assert_eq!(anomalies[0].severity, Severity::Medium);
}

#[test]
fn analogy_becomes_cross_domain_link() {
    init_logging();
    let n = node(
        "a",
        NodeType::Theory,
        "Alpha",
        &[],
        "The mind is like a computer",
    );
    let result = deterministic_orchestrator(PipelineConfig::default())
        .run(&[n])
        .unwrap();
    assert!(result
        .semantic
        .cross_domain_links
        .iter()
        .any(|l| l.link_type == CrossDomainType::Analogy
            && l.source == "mind"
            && l.target == "computer"));
    assert!(result.diagnostics.cross_domain_integration > 0.0);
}

#[test]
fn health_is_independent_of_ids_and_clock() {
    init_logging();
    let temp_dir = TempDir::new().unwrap();
    let corpus = Corpus::load(write_corpus(&temp_dir)).unwrap();

    let first = Orchestrator::new(PipelineConfig::default())
        .run(&corpus.nodes)
        .unwrap();
    let second = Orchestrator::new(PipelineConfig::default())
        .run(&corpus.nodes)
        .unwrap();
    assert_eq!(
        first.diagnostics.overall_health,
        second.diagnostics.overall_health
    );
    assert_eq!(first.links, second.links);
}

#[test]
fn deterministic_capabilities_reproduce_the_whole_result() {
    init_logging();
    let temp_dir = TempDir::new().unwrap();
    let corpus = Corpus::load(write_corpus(&temp_dir)).unwrap();

    let first = deterministic_orchestrator(PipelineConfig::default())
        .run(&corpus.nodes)
        .unwrap();
    let second = deterministic_orchestrator(PipelineConfig::default())
        .run(&corpus.nodes)
        .unwrap();
    assert_eq!(first.diagnostics, second.diagnostics);
    assert_eq!(first.entities, second.entities);
    assert_eq!(first.semantic, second.semantic);
    assert_eq!(first.temporal, second.temporal);
    assert_eq!(first.optimization, second.optimization);
}

#[test]
fn loaded_corpus_runs_end_to_end() {
    init_logging();
    let temp_dir = TempDir::new().unwrap();
    let corpus = Corpus::load(write_corpus(&temp_dir)).unwrap();
    let ids: Vec<&str> = corpus.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(
        ids,
        vec!["doctrine-control", "tactic-isolation", "profile-hale"]
    );

    let result = deterministic_orchestrator(PipelineConfig::default())
        .run(&corpus.nodes)
        .unwrap();
    assert_eq!(result.quality.reports.len(), 3);
    assert!(result.temporal.parse_failures.is_empty());
    assert_eq!(result.integration.temporal_coverage, 1.0);
    assert!(result
        .entities
        .entities
        .iter()
        .any(|e| e.primary_name == "Marcus Hale"));
    // profile-hale points at a misspelled tactic id
    assert_eq!(result.diagnostics.audit.broken_references.len(), 1);

    let json = serde_json::to_string(&result).unwrap();
    assert!(json.contains("\"overallHealth\""));
}

#[test]
fn healer_repairs_misspelled_reference() {
    init_logging();
    let temp_dir = TempDir::new().unwrap();
    let corpus = Corpus::load(write_corpus(&temp_dir)).unwrap();

    let outcome = LinkHealer::default().heal(&corpus.nodes);
    assert_eq!(outcome.repairs.len(), 1);
    assert_eq!(outcome.repairs[0].node_id, "profile-hale");
    assert_eq!(outcome.repairs[0].repaired, "tactic-isolation");

    let healed = Orchestrator::new(PipelineConfig::default())
        .run(&outcome.nodes)
        .unwrap();
    assert!(healed.diagnostics.audit.broken_references.is_empty());
}

#[test]
fn monitoring_across_runs() {
    init_logging();
    let temp_dir = TempDir::new().unwrap();
    let corpus = Corpus::load(write_corpus(&temp_dir)).unwrap();
    let config = PipelineConfig::default();
    let orchestrator = deterministic_orchestrator(config.clone());
    let clock = FixedClock::ymd(2030, 6, 1);

    let mut state = MonitoringState::default();
    for _ in 0..3 {
        let result = orchestrator.run(&corpus.nodes).unwrap();
        let (next, alerts) = monitor(state, result.snapshot(clock.0), &config.alerts);
        assert!(alerts.iter().all(|a| a.kind != AlertKind::QualityDrop));
        state = next;
    }
    assert_eq!(state.history.len(), 3);
}

#[test]
fn broken_corpus_raises_critical_issue_alert() {
    init_logging();
    let corpus: Vec<_> = (0..10)
        .map(|i| {
            let mut n = node(
                &format!("profile-{i}"),
                NodeType::Profile,
                &format!("Subject {i}"),
                &[],
                "Amended: MMXX",
            );
            n.metadata.is_high_signal = true;
            n.metadata.date = "MMXXV".to_string();
            n.links_to = Some(vec![format!("zz-missing-{i}"), format!("qq-absent-{i}")]);
            n
        })
        .collect();
    let config = PipelineConfig::default();

    let result = deterministic_orchestrator(config.clone())
        .run(&corpus)
        .unwrap();
    let snapshot = result.snapshot(FixedClock::ymd(2030, 6, 1).0);
    assert!(snapshot.critical_issues >= config.alerts.critical_issue_count);

    let (_, alerts) = monitor(MonitoringState::default(), snapshot, &config.alerts);
    assert!(alerts.iter().any(|a| a.kind == AlertKind::CriticalIssues));
}
