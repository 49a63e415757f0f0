//! Quality standards per node type.
//!
//! Weights within a type sum to 1.0. Songs are only held to completeness and relevance.

use super::{validators::*, QualityCategory};
use crate::properties::NodeType;

#[derive(Clone, Copy)]
pub struct QualityStandard {
    pub name: &'static str,
    pub category: QualityCategory,
    pub weight: f64,
    pub validators: &'static [Validator],
}

impl std::fmt::Debug for QualityStandard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QualityStandard")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("weight", &self.weight)
            .field("validators", &self.validators.len())
            .finish()
    }
}

const fn standard(
    name: &'static str,
    category: QualityCategory,
    weight: f64,
    validators: &'static [Validator],
) -> QualityStandard {
    QualityStandard {
        name,
        category,
        weight,
        validators,
    }
}

const BASIC_COMPLETENESS: &[Validator] = &[content_length, excerpt_present];
const THEME_CHECKS: &[Validator] = &[themes_present, themes_mentioned];
const GROUNDING: &[Validator] = &[historical_references, citations];
const ARGUMENT: &[Validator] = &[logical_connectors, intro_conclusion];
const STEPS: &[Validator] = &[step_markers];
const HEDGING: &[Validator] = &[no_hedging];
const SUBJECT: &[Validator] = &[named_subject, role_keyword];
const PROFILE_COMPLETENESS: &[Validator] = &[content_length, excerpt_present, anchors_present];
const CHRONOLOGY: &[Validator] = &[chronological_dates, historical_references];
const CITATIONS: &[Validator] = &[citations];
const LYRIC_COMPLETENESS: &[Validator] = &[content_length, themes_present];
const LYRIC_RELEVANCE: &[Validator] = &[themes_mentioned, anchors_present];

const COMPLETENESS: QualityStandard = standard(
    "completeness",
    QualityCategory::Completeness,
    0.2,
    BASIC_COMPLETENESS,
);

const RELEVANCE: QualityStandard = standard(
    "thematic relevance",
    QualityCategory::Relevance,
    0.2,
    THEME_CHECKS,
);

static DOCTRINE: [QualityStandard; 4] = [
    standard(
        "historical grounding",
        QualityCategory::Accuracy,
        0.3,
        GROUNDING,
    ),
    standard(
        "argument structure",
        QualityCategory::Structure,
        0.3,
        ARGUMENT,
    ),
    COMPLETENESS,
    RELEVANCE,
];

static TACTIC: [QualityStandard; 4] = [
    standard(
        "procedural structure",
        QualityCategory::Structure,
        0.35,
        STEPS,
    ),
    standard("precision", QualityCategory::Consistency, 0.25, HEDGING),
    COMPLETENESS,
    RELEVANCE,
];

static PROFILE: [QualityStandard; 4] = [
    standard(
        "subject identification",
        QualityCategory::Accuracy,
        0.35,
        SUBJECT,
    ),
    standard(
        "profile completeness",
        QualityCategory::Completeness,
        0.25,
        PROFILE_COMPLETENESS,
    ),
    RELEVANCE,
    standard("precision", QualityCategory::Consistency, 0.2, HEDGING),
];

static CASE_STUDY: [QualityStandard; 4] = [
    standard(
        "chronology",
        QualityCategory::Consistency,
        0.3,
        CHRONOLOGY,
    ),
    standard("evidence", QualityCategory::Accuracy, 0.3, CITATIONS),
    COMPLETENESS,
    RELEVANCE,
];

static THEORY: [QualityStandard; 4] = [
    standard(
        "argument structure",
        QualityCategory::Structure,
        0.35,
        ARGUMENT,
    ),
    standard("grounding", QualityCategory::Accuracy, 0.25, CITATIONS),
    COMPLETENESS,
    RELEVANCE,
];

static SONG: [QualityStandard; 2] = [
    standard(
        "lyric completeness",
        QualityCategory::Completeness,
        0.5,
        LYRIC_COMPLETENESS,
    ),
    standard(
        "lyric relevance",
        QualityCategory::Relevance,
        0.5,
        LYRIC_RELEVANCE,
    ),
];

pub fn standards_for(kind: NodeType) -> &'static [QualityStandard] {
    match kind {
        NodeType::Doctrine => &DOCTRINE,
        NodeType::Tactic => &TACTIC,
        NodeType::Profile => &PROFILE,
        NodeType::CaseStudy => &CASE_STUDY,
        NodeType::Theory => &THEORY,
        NodeType::Song => &SONG,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_weights_sum_to_one() {
        for kind in NodeType::all() {
            let total: f64 = standards_for(*kind).iter().map(|s| s.weight).sum();
            assert!((total - 1.0).abs() < 1e-9, "{kind} weights sum to {total}");
            assert!(standards_for(*kind).iter().all(|s| !s.validators.is_empty()));
        }
    }
}
