//! Performance benchmarks for the indexing pipeline
//!
//! A synthetic corpus of a few hundred nodes exercises:
//! - The O(n²) structural link scan
//! - Link healing against a corpus with misspelled references
//! - A full orchestrated run (all passes, audit and optimization)
//!
//! Run with: cargo bench

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use dossier_core::{
    config::PipelineConfig,
    healer::LinkHealer,
    ids::{FixedClock, SequentialIdGenerator},
    linker::StructuralLinker,
    orchestrator::Orchestrator,
    properties::{Node, NodeType},
};
use std::sync::Arc;

const THEMES: &[&str] = &["control", "isolation", "fear", "pressure", "silence", "trust"];

fn node_id(i: usize) -> String {
    let kind = NodeType::all()[i % NodeType::all().len()];
    format!("{}-{i:04}", kind.as_str().to_lowercase())
}

fn synthetic_corpus(size: usize) -> Vec<Node> {
    (0..size)
        .map(|i| {
            let kind = NodeType::all()[i % NodeType::all().len()];
            let mut node = Node {
                id: node_id(i),
                kind,
                title: format!("Document Number {i}"),
                themes: vec![
                    THEMES[i % THEMES.len()].to_string(),
                    THEMES[(i + 1) % THEMES.len()].to_string(),
                ],
                content: format!(
                    "In 19{:02} Marcus Hale met the Harbor Union in Lisbon. Step 1: listen. \
                     Step 2: record. Step 3: report. Trust is like a currency and fear is a tool. \
                     See Document Number {} for the follow-up.",
                    i % 100,
                    (i + 7) % size
                ),
                ..Default::default()
            };
            node.metadata.date = format!("MMX{}", ["", "I", "II", "III"][i % 4]);
            // Every tenth node points at a misspelled neighbour.
            if i % 10 == 0 && i + 1 < size {
                node.links_to = Some(vec![format!("{}x", node_id(i + 1))]);
            }
            node
        })
        .collect()
}

fn bench_structural_linker(c: &mut Criterion) {
    let mut group = c.benchmark_group("structural_linker");
    for size in [50, 200] {
        let corpus = synthetic_corpus(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &corpus, |b, corpus| {
            b.iter(|| StructuralLinker::new().link(corpus).len());
        });
    }
    group.finish();
}

fn bench_link_healing(c: &mut Criterion) {
    let corpus = synthetic_corpus(200);
    c.bench_function("link_healing", |b| {
        b.iter(|| LinkHealer::default().heal(&corpus).repairs.len());
    });
}

fn bench_full_pipeline(c: &mut Criterion) {
    let corpus = synthetic_corpus(200);
    c.bench_function("full_pipeline", |b| {
        b.iter(|| {
            let orchestrator = Orchestrator::with_capabilities(
                PipelineConfig::default(),
                Arc::new(SequentialIdGenerator::new()),
                Arc::new(FixedClock::ymd(2030, 1, 1)),
            );
            orchestrator
                .run(&corpus)
                .map(|result| result.diagnostics.overall_health)
                .unwrap_or_default()
        });
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .sample_size(20)
        .measurement_time(std::time::Duration::from_secs(10));
    targets =
        bench_structural_linker,
        bench_link_healing,
        bench_full_pipeline
}

criterion_main!(benches);
