//! Surface-pattern candidate extraction and the pluggable filters applied to each class.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::properties::Node;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Person,
    Organization,
    Location,
    Concept,
}

impl EntityType {
    /// Tie-break precedence when a cluster holds members of several types (higher wins).
    pub(crate) fn precedence(&self) -> u8 {
        match self {
            EntityType::Organization => 3,
            EntityType::Person => 2,
            EntityType::Location => 1,
            EntityType::Concept => 0,
        }
    }
}

impl Display for EntityType {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let label = match self {
            EntityType::Person => "PERSON",
            EntityType::Organization => "ORGANIZATION",
            EntityType::Location => "LOCATION",
            EntityType::Concept => "CONCEPT",
        };
        write!(f, "{label}")
    }
}

/// One surface match inside one node's content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityCandidate {
    pub text: String,
    pub entity_type: EntityType,
    pub confidence: f64,
    pub node_id: String,
    /// Byte offsets into the node content.
    pub start: usize,
    pub end: usize,
    /// Trailing uppercase region code for location candidates (`Portland, OR`).
    pub code: Option<String>,
}

impl EntityCandidate {
    pub fn overlaps(&self, other: &EntityCandidate) -> bool {
        self.start < other.end && other.start < self.end
    }
}

pub const ORGANIZATION_SUFFIXES: &[&str] = &[
    "Inc",
    "Corp",
    "LLC",
    "Ltd",
    "Foundation",
    "Agency",
    "Department",
    "Institute",
];

/// Capitalized words that start sentences or headings far more often than names.
pub const CAPITALIZED_STOP_WORDS: &[&str] = &[
    "A", "An", "And", "As", "At", "But", "By", "Case", "Chapter", "For", "From", "He", "Her",
    "His", "How", "If", "In", "It", "Its", "Note", "Of", "On", "Or", "Our", "Phase", "Record",
    "Section", "She", "Step", "Study", "That", "The", "Their", "These", "They", "This", "Those",
    "To", "Volume", "We", "What", "When", "Where", "Which", "While", "Who", "Why", "With",
];

const LOCATION_PREPOSITIONS: &[&str] = &["in", "at", "from", "near"];

static PERSON_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+)+\b").expect("static regex")
});

static ORGANIZATION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b(?:[A-Z][A-Za-z&]*[ \t]+)+(?:{})\b",
        ORGANIZATION_SUFFIXES.join("|")
    ))
    .expect("static regex")
});

static LOCATION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+)*)(?:,[ \t]*([A-Z]{2,3})\b)?")
        .expect("static regex")
});

/// Strategy deciding whether a raw surface match is kept as an entity candidate.
pub trait EntityCandidateFilter: Send + Sync {
    fn name(&self) -> &'static str;

    /// `content` is the full text the candidate was extracted from.
    fn accept(&self, candidate: &EntityCandidate, content: &str) -> bool;
}

/// Rejects capitalized spans that begin with a sentence-initial function word or contain an
/// organizational suffix.
#[derive(Debug, Default, Clone, Copy)]
pub struct StopWordPersonFilter;

impl EntityCandidateFilter for StopWordPersonFilter {
    fn name(&self) -> &'static str {
        "stop-word-person"
    }

    fn accept(&self, candidate: &EntityCandidate, _content: &str) -> bool {
        let mut tokens = candidate.text.split_whitespace();
        match tokens.next() {
            Some(first) if CAPITALIZED_STOP_WORDS.contains(&first) => false,
            Some(_) => !candidate
                .text
                .split_whitespace()
                .any(|t| ORGANIZATION_SUFFIXES.contains(&t)),
            None => false,
        }
    }
}

/// Accepts any span the organization pattern produced, except a bare suffix preceded only by a
/// stop word ("The Agency").
#[derive(Debug, Default, Clone, Copy)]
pub struct SuffixOrganizationFilter;

impl EntityCandidateFilter for SuffixOrganizationFilter {
    fn name(&self) -> &'static str {
        "suffix-organization"
    }

    fn accept(&self, candidate: &EntityCandidate, _content: &str) -> bool {
        let tokens: Vec<&str> = candidate.text.split_whitespace().collect();
        !(tokens.len() == 2 && CAPITALIZED_STOP_WORDS.contains(&tokens[0]))
    }
}

/// Loose location filter: keeps spans carrying a region code, or spans introduced by a
/// locative preposition (`in`, `at`, `from`, `near`).
#[derive(Debug, Default, Clone, Copy)]
pub struct PrepositionLocationFilter;

impl EntityCandidateFilter for PrepositionLocationFilter {
    fn name(&self) -> &'static str {
        "preposition-location"
    }

    fn accept(&self, candidate: &EntityCandidate, content: &str) -> bool {
        if candidate.code.is_some() {
            return true;
        }
        if CAPITALIZED_STOP_WORDS.contains(&candidate.text.as_str()) {
            return false;
        }
        let preceding = content[..candidate.start].trim_end();
        preceding
            .rsplit(|c: char| !c.is_alphabetic())
            .next()
            .map(|word| LOCATION_PREPOSITIONS.contains(&word.to_lowercase().as_str()))
            .unwrap_or(false)
    }
}

/// Runs the three surface patterns over a node and applies one filter per class.
pub struct CandidateExtractor {
    person_filter: Box<dyn EntityCandidateFilter>,
    organization_filter: Box<dyn EntityCandidateFilter>,
    location_filter: Box<dyn EntityCandidateFilter>,
}

impl Default for CandidateExtractor {
    fn default() -> Self {
        CandidateExtractor {
            person_filter: Box::new(StopWordPersonFilter),
            organization_filter: Box::new(SuffixOrganizationFilter),
            location_filter: Box::new(PrepositionLocationFilter),
        }
    }
}

impl CandidateExtractor {
    pub fn with_person_filter(mut self, filter: Box<dyn EntityCandidateFilter>) -> Self {
        self.person_filter = filter;
        self
    }

    pub fn with_organization_filter(mut self, filter: Box<dyn EntityCandidateFilter>) -> Self {
        self.organization_filter = filter;
        self
    }

    pub fn with_location_filter(mut self, filter: Box<dyn EntityCandidateFilter>) -> Self {
        self.location_filter = filter;
        self
    }

    /// Candidates in order of class (organizations, persons, locations), then position.
    pub fn extract(&self, node: &Node) -> Vec<EntityCandidate> {
        let content = node.content.as_str();
        let candidate = |text: &str, entity_type, confidence, start, end, code| EntityCandidate {
            text: text.to_string(),
            entity_type,
            confidence,
            node_id: node.id.clone(),
            start,
            end,
            code,
        };

        let organizations: Vec<EntityCandidate> = ORGANIZATION_PATTERN
            .find_iter(content)
            .map(|m| {
                candidate(
                    m.as_str(),
                    EntityType::Organization,
                    0.9,
                    m.start(),
                    m.end(),
                    None,
                )
            })
            .filter(|c| self.organization_filter.accept(c, content))
            .collect();

        let persons: Vec<EntityCandidate> = PERSON_PATTERN
            .find_iter(content)
            .map(|m| candidate(m.as_str(), EntityType::Person, 0.7, m.start(), m.end(), None))
            .filter(|c| !organizations.iter().any(|o| o.overlaps(c)))
            .filter(|c| self.person_filter.accept(c, content))
            .collect();

        let locations: Vec<EntityCandidate> = LOCATION_PATTERN
            .captures_iter(content)
            .filter_map(|caps| {
                let name = caps.get(1)?;
                let code = caps.get(2).map(|m| m.as_str().to_string());
                let confidence = if code.is_some() { 0.85 } else { 0.6 };
                let end = caps.get(0).map(|m| m.end()).unwrap_or(name.end());
                Some(candidate(
                    name.as_str(),
                    EntityType::Location,
                    confidence,
                    name.start(),
                    end,
                    code,
                ))
            })
            .filter(|c| {
                !organizations
                    .iter()
                    .chain(persons.iter())
                    .any(|other| other.start == c.start && other.text == c.text)
            })
            .filter(|c| self.location_filter.accept(c, content))
            .collect();

        organizations
            .into_iter()
            .chain(persons)
            .chain(locations)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::helpers::{node, with_content};
    use test_log::test;

    fn texts(candidates: &[EntityCandidate], kind: EntityType) -> Vec<&str> {
        candidates
            .iter()
            .filter(|c| c.entity_type == kind)
            .map(|c| c.text.as_str())
            .collect()
    }

    #[test]
    fn test_organization_suffixes() {
        let n = with_content(
            node("a", "A"),
            "Funding came from Northwind Holdings Inc and the Civic Trust Foundation.",
        );
        let candidates = CandidateExtractor::default().extract(&n);
        assert_eq!(
            texts(&candidates, EntityType::Organization),
            vec!["Northwind Holdings Inc", "Civic Trust Foundation"]
        );
        // Organization spans are not re-reported as persons.
        assert!(!texts(&candidates, EntityType::Person)
            .iter()
            .any(|t| t.contains("Northwind")));
    }

    #[test]
    fn test_person_stop_words() {
        let n = with_content(
            node("a", "A"),
            "The Handler was present. Later Maria Keller spoke.\nThis Morning nothing.",
        );
        let candidates = CandidateExtractor::default().extract(&n);
        let persons = texts(&candidates, EntityType::Person);
        assert!(persons.contains(&"Later Maria Keller"));
        assert!(!persons.iter().any(|p| p.starts_with("The ")));
        assert!(!persons.iter().any(|p| p.starts_with("This ")));
    }

    #[test]
    fn test_location_filter() {
        let n = with_content(
            node("a", "A"),
            "The cell met in Rotterdam before moving to Portland, OR where Kessler waited.",
        );
        let candidates = CandidateExtractor::default().extract(&n);
        let locations = texts(&candidates, EntityType::Location);
        assert_eq!(locations, vec!["Rotterdam", "Portland"]);
    }

    struct RejectAll;
    impl EntityCandidateFilter for RejectAll {
        fn name(&self) -> &'static str {
            "reject-all"
        }
        fn accept(&self, _candidate: &EntityCandidate, _content: &str) -> bool {
            false
        }
    }

    #[test]
    fn test_filters_are_pluggable() {
        let n = with_content(node("a", "A"), "Anna Berg met Tomas Varga in Oslo.");
        let extractor = CandidateExtractor::default().with_person_filter(Box::new(RejectAll));
        let candidates = extractor.extract(&n);
        assert!(texts(&candidates, EntityType::Person).is_empty());
        assert_eq!(texts(&candidates, EntityType::Location), vec!["Oslo"]);
    }
}
