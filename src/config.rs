use crate::error::DossierError;
use serde::{Deserialize, Serialize};
use std::{fs::read_to_string, path::Path};

/// All tunables consumed by the pipeline. The core never reads the environment; callers build
/// this directly or deserialize it from TOML at the boundary.
///
/// ```toml
/// [quality_gate]
/// enabled = true
/// threshold = 0.6
///
/// [structure]
/// max_connections = 20
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub quality_gate: QualityGateConfig,
    pub structure: StructureConfig,
    pub optimization: OptimizationConfig,
    pub alerts: AlertThresholds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityGateConfig {
    pub enabled: bool,
    /// Nodes scoring below this are reported as rejected. Rejected nodes still go through every
    /// analysis pass; the gate only decides which nodes the link and structure checks admit.
    pub threshold: f64,
}

impl Default for QualityGateConfig {
    fn default() -> Self {
        QualityGateConfig {
            enabled: true,
            threshold: 0.6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructureConfig {
    /// Combined in+out degree above which a node is flagged as over-connected.
    pub max_connections: usize,
    /// Orphan fraction above which the orchestrator raises a structural issue.
    pub max_orphan_ratio: f64,
    /// Links weaker than this (with no shared themes) are flagged as low relevance.
    pub relevance_weight_floor: f64,
}

impl Default for StructureConfig {
    fn default() -> Self {
        StructureConfig {
            max_connections: 20,
            max_orphan_ratio: 0.1,
            relevance_weight_floor: 0.8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationConfig {
    pub enabled: bool,
    /// Overall health below which the optimization pass runs.
    pub health_threshold: f64,
    /// Links below this weight are dropped when structural issues were flagged.
    pub min_link_weight: f64,
    /// Minimum (exclusive) similarity for the healer to accept a repair.
    pub heal_similarity: f64,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        OptimizationConfig {
            enabled: true,
            health_threshold: 0.7,
            min_link_weight: 0.5,
            heal_similarity: 0.6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    pub critical_issue_count: usize,
    /// Fractional drop in mean quality between consecutive runs.
    pub quality_drop_fraction: f64,
    pub max_processing_ms: u64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        AlertThresholds {
            critical_issue_count: 5,
            quality_drop_fraction: 0.1,
            max_processing_ms: 30_000,
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, DossierError> {
        let config: PipelineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, DossierError> {
        tracing::debug!("Reading pipeline config from {:?}", path.as_ref());
        let content = read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String, DossierError> {
        Ok(toml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), DossierError> {
        let unit = [
            ("quality_gate.threshold", self.quality_gate.threshold),
            ("structure.max_orphan_ratio", self.structure.max_orphan_ratio),
            (
                "structure.relevance_weight_floor",
                self.structure.relevance_weight_floor,
            ),
            (
                "optimization.health_threshold",
                self.optimization.health_threshold,
            ),
            (
                "optimization.min_link_weight",
                self.optimization.min_link_weight,
            ),
            (
                "optimization.heal_similarity",
                self.optimization.heal_similarity,
            ),
            (
                "alerts.quality_drop_fraction",
                self.alerts.quality_drop_fraction,
            ),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(DossierError::Config(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        Ok(())
    }
}
