//! # dossier-core
//!
//! An indexing and quality pipeline for a corpus of structured documents: doctrines, tactics,
//! profiles, case studies, theories and songs, each carrying themes, free text and authored
//! metadata.
//!
//! ## Overview
//!
//! A run takes the corpus as a slice of [`properties::Node`] and produces an
//! [`orchestrator::EnhancedIndexingResult`]:
//!
//! - a weighted, typed **link graph** inferred from explicit references, title mentions, shared
//!   themes, shared anchors and shared signature vectors ([`linker`])
//! - a **temporal index** of per-node timelines, pattern shifts and anomalies, decoded from
//!   stylized roman-numeral dates ([`temporal`])
//! - a set of **resolved entities** with aliases, types and relationships matched by lexical
//!   patterns such as "works with" and "reports to" ([`entity`])
//! - a three-layer **semantic analysis** with concept drift, cross-domain analogies and metaphors,
//!   and recurring latent patterns ([`semantic`])
//! - per-node **quality reports** scored against type-specific weighted standards, a quality gate,
//!   and link and structure checks ([`quality`])
//! - five **health scores** with the issues behind them, and, when health is low, an
//!   **optimization** pass that heals broken references and prunes weak links ([`orchestrator`],
//!   [`healer`])
//!
//! Only an empty corpus or duplicate node ids fail a run. Every other problem is collected as an
//! [`diagnostic::IndexingIssue`] so a single bad document never stops the pipeline.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dossier_core::{config::PipelineConfig, corpus::Corpus, orchestrator::Orchestrator};
//!
//! fn main() -> Result<(), dossier_core::DossierError> {
//!     let corpus = Corpus::load("./corpus")?;
//!     let result = Orchestrator::new(PipelineConfig::default()).run(&corpus.nodes)?;
//!
//!     println!("health {:.2}", result.diagnostics.overall_health);
//!     for issue in result.diagnostics.issues.iter() {
//!         println!("{issue}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Determinism
//!
//! The analysis passes run concurrently, but each is a pure function of the corpus. Entity and
//! concept identifiers come from an injected [`ids::IdGenerator`] and "now" from an injected
//! [`ids::Clock`]; with [`ids::SequentialIdGenerator`] and [`ids::FixedClock`] two runs over the
//! same corpus produce identical results.
//!
//! ## Module Guide
//!
//! Start with [`orchestrator::Orchestrator`]. [`corpus::Corpus`] loads JSON input and
//! [`config::PipelineConfig`] holds every tunable threshold. [`export`] renders a link graph as
//! Mermaid.

pub mod config;
pub mod corpus;
pub mod diagnostic;
pub mod entity;
pub mod error;
pub mod export;
pub mod graph;
pub mod healer;
pub mod ids;
pub mod linker;
pub mod orchestrator;
pub mod properties;
pub mod quality;
pub mod semantic;
pub mod temporal;
pub mod text;
#[cfg(test)]
mod tests;

pub use error::*;
