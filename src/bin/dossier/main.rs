//! dossier CLI tool
//!
//! Command-line interface for running the indexing pipeline over a JSON corpus.
//!
//! ## Commands
//!
//! - `index <path>`: Full pipeline run; prints a health summary and optionally writes the result
//!   as JSON and the link graph as Mermaid
//! - `heal <path>`: Link healing only; writes the corpus with repaired `linksTo` references
//! - `quality <path>`: Quality assurance only; prints per-node scores and the corpus summary
//!
//! `<path>` is a JSON file holding an array of nodes, or a directory of such files.

use clap::{Parser, Subcommand};
use dossier_core::{
    config::PipelineConfig, corpus::Corpus, export::to_mermaid, healer::LinkHealer,
    linker::StructuralLinker, orchestrator::Orchestrator, quality::QualityAssurance,
    DossierError,
};
use std::{fs, path::PathBuf};

#[derive(Parser)]
#[command(name = "dossier")]
#[command(author, version, about = "Index, audit and heal a structured document corpus", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and report health
    Index {
        /// Path to a corpus JSON file or directory
        path: PathBuf,

        /// Pipeline configuration (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write the full indexing result as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the effective link graph as a Mermaid diagram
        #[arg(long)]
        mermaid: Option<PathBuf>,

        /// List every issue, not just the counts
        #[arg(short, long)]
        verbose: bool,
    },

    /// Repair broken linksTo references by fuzzy matching
    Heal {
        /// Path to a corpus JSON file or directory
        path: PathBuf,

        /// Where to write the healed corpus (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Score every node against its type's quality standards
    Quality {
        /// Path to a corpus JSON file or directory
        path: PathBuf,

        /// Pipeline configuration (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn load_config(path: Option<PathBuf>) -> Result<PipelineConfig, DossierError> {
    match path {
        Some(path) => PipelineConfig::from_path(path),
        None => Ok(PipelineConfig::default()),
    }
}

fn run(cli: Cli) -> Result<(), DossierError> {
    match cli.command {
        Commands::Index {
            path,
            config,
            output,
            mermaid,
            verbose,
        } => {
            let config = load_config(config)?;
            let corpus = Corpus::load(&path)?;
            let result = Orchestrator::new(config).run(&corpus.nodes)?;
            let d = &result.diagnostics;

            println!("=== Index Results ===");
            println!("Nodes: {}", corpus.len());
            println!("Links: {}", result.effective_links().len());
            println!("Entities: {}", result.entities.entities.len());
            println!("Temporal events: {}", result.temporal.total_events());
            println!("Structural integrity: {:.3}", d.structural_integrity);
            println!("Temporal consistency: {:.3}", d.temporal_consistency);
            println!("Entity resolution: {:.3}", d.entity_resolution_quality);
            println!("Semantic coherence: {:.3}", d.semantic_coherence);
            println!("Cross-domain integration: {:.3}", d.cross_domain_integration);
            println!("Overall health: {:.3}", d.overall_health);
            println!("Issues: {} ({} critical)", d.issues.len(), d.critical_issues());
            if let Some(optimization) = result.optimization.as_ref() {
                println!(
                    "Optimization: {} repaired, {} dropped, {} pruned (integrity {:.3} -> {:.3})",
                    optimization.repairs.len(),
                    optimization.dropped_references.len(),
                    optimization.pruned_links,
                    d.structural_integrity,
                    optimization.structural_integrity_after
                );
            }
            if verbose {
                for issue in d.issues.iter() {
                    println!("  {issue}");
                }
            }

            if let Some(output) = output {
                fs::write(&output, serde_json::to_string_pretty(&result)?)?;
                println!("Result written to {}", output.display());
            }
            if let Some(mermaid) = mermaid {
                fs::write(&mermaid, to_mermaid(result.effective_links())?)?;
                println!("Mermaid graph written to {}", mermaid.display());
            }
            Ok(())
        }

        Commands::Heal { path, output } => {
            let corpus = Corpus::load(&path)?;
            let outcome = LinkHealer::default().heal(&corpus.nodes);
            for repair in outcome.repairs.iter() {
                eprintln!(
                    "{}: '{}' -> '{}' ({:.2})",
                    repair.node_id, repair.original, repair.repaired, repair.similarity
                );
            }
            for dropped in outcome.dropped.iter() {
                eprintln!(
                    "{}: dropped '{}' ({:?})",
                    dropped.node_id, dropped.reference, dropped.reason
                );
            }
            let healed = Corpus {
                nodes: outcome.nodes,
                sources: corpus.sources,
            }
            .to_json_string()?;
            match output {
                Some(output) => fs::write(output, healed)?,
                None => println!("{healed}"),
            }
            Ok(())
        }

        Commands::Quality { path, config } => {
            let config = load_config(config)?;
            let corpus = Corpus::load(&path)?;
            let links = StructuralLinker::new().link(&corpus.nodes);
            let report = QualityAssurance::new(config.quality_gate, config.structure)
                .run(&corpus.nodes, &links);

            for node_report in report.reports.iter() {
                let mark = if report.is_admitted(&node_report.node_id) {
                    "pass"
                } else {
                    "FAIL"
                };
                println!(
                    "{mark} {:.3} {}",
                    node_report.overall_score, node_report.node_id
                );
                for issue in node_report.issues.iter() {
                    println!("       [{}] {}", issue.severity, issue.description);
                }
            }
            let summary = &report.summary;
            println!("\n=== Quality Summary ===");
            println!("Nodes: {}", summary.node_count);
            println!(
                "Mean {:.3} (min {:.3}, max {:.3})",
                summary.mean_score, summary.min_score, summary.max_score
            );
            println!("Pass rate: {:.1}%", summary.pass_rate * 100.0);
            println!("Link issues: {}", report.link_issues.len());
            println!("Structural issues: {}", report.structural_issues.len());
            Ok(())
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
}
