//! Shared test utilities for integration tests.
//!
//! Import from integration test files as:
//! ```ignore
//! mod common;
//! ```

use dossier_core::{
    config::PipelineConfig,
    ids::{FixedClock, SequentialIdGenerator},
    orchestrator::Orchestrator,
    properties::{Node, NodeType},
};
use std::{path::PathBuf, sync::Arc};
use tempfile::TempDir;

/// Initialize tracing for tests, respecting RUST_LOG env var.
///
/// Safe to call multiple times; subsequent calls are no-ops.
#[allow(dead_code)]
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// An orchestrator with sequential ids and a clock pinned to 2030-06-01.
#[allow(dead_code)]
pub fn deterministic_orchestrator(config: PipelineConfig) -> Orchestrator {
    Orchestrator::with_capabilities(
        config,
        Arc::new(SequentialIdGenerator::new()),
        Arc::new(FixedClock::ymd(2030, 6, 1)),
    )
}

#[allow(dead_code)]
pub fn node(id: &str, kind: NodeType, title: &str, themes: &[&str], content: &str) -> Node {
    Node {
        id: id.to_string(),
        kind,
        title: title.to_string(),
        themes: themes.iter().map(|t| t.to_string()).collect(),
        content: content.to_string(),
        ..Default::default()
    }
}

/// A corpus written the way authors produce it: JSON arrays split over a few files.
pub const CORPUS_DOCTRINE: &str = r#"[
  {
    "id": "doctrine-control",
    "type": "DOCTRINE",
    "title": "Doctrine of Control",
    "themes": ["control", "isolation", "fear"],
    "excerpt": "Control is a garden that must be pruned.",
    "content": "In 1984 the Ministry described control as a garden that must be pruned. First, isolate the subject. Therefore every channel is watched. Trust is like a currency that can be spent. In conclusion, control is patient.",
    "metadata": {"classification": "OPEN", "date": "MMXX.Q1", "anchors": ["ministry", "garden"], "tier": 1},
    "linksTo": ["tactic-isolation", "profile-hale"]
  }
]"#;

pub const CORPUS_FIELD: &str = r#"[
  {
    "id": "tactic-isolation",
    "type": "TACTIC",
    "title": "Isolation Protocol",
    "themes": ["isolation", "control"],
    "content": "Step 1: cut contact with friends. Step 2: control the schedule. Step 3: monitor every message. Marcus Hale used this against the union.",
    "metadata": {"date": "MMXXI.03", "anchors": ["ministry", "garden"]}
  },
  {
    "id": "profile-hale",
    "type": "PROFILE",
    "title": "Marcus Hale",
    "themes": ["control", "fear"],
    "content": "Marcus Hale was the director of the Ministry. The director role made Hale feared.",
    "metadata": {"date": "MMXXI", "vector": "V-7", "isHighSignal": true},
    "linksTo": ["tactic-isolaton"]
  }
]"#;

/// Writes the corpus files into a fresh directory and returns it with the corpus path.
#[allow(dead_code)]
pub fn write_corpus(temp_dir: &TempDir) -> PathBuf {
    let corpus_path = temp_dir.path().join("corpus");
    std::fs::create_dir_all(corpus_path.join("field")).unwrap();
    std::fs::write(corpus_path.join("doctrine.json"), CORPUS_DOCTRINE).unwrap();
    std::fs::write(corpus_path.join("field").join("nodes.json"), CORPUS_FIELD).unwrap();
    corpus_path
}
