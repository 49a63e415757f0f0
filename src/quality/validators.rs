//! Pure content validators. Each takes a node and returns a [ValidationResult]; none of them
//! look beyond the node itself.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{QualityCategory, QualityIssue, ValidationResult};
use crate::{
    entity::extract::CAPITALIZED_STOP_WORDS,
    properties::{Node, Severity},
    text,
};

pub type Validator = fn(&Node) -> ValidationResult;

/// Word count at which content is considered fully developed.
pub const FULL_LENGTH_WORDS: usize = 150;
/// Below this many words content fails the length check.
pub const MIN_LENGTH_WORDS: usize = 50;
pub const MIN_STEP_MARKERS: usize = 3;

static HISTORICAL_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:1[5-9]\d\d|20\d\d|century|centuries|historical|history|era|war|regime|dynasty)\b")
        .expect("static regex")
});

static CITATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\[\]\n]+\]").expect("static regex"));

static STEP_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bstep[ \t]+\d+").expect("static regex"));

static HEDGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:maybe|possibly|perhaps|might)\b").expect("static regex"));

static NAMED_SUBJECT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+)+\b").expect("static regex")
});

static ROLE_KEYWORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:leader|founder|director|handler|operative|member|agent|officer|recruiter|manager|chief|commander|organizer)s?\b",
    )
    .expect("static regex")
});

static YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(1[5-9]\d\d|20\d\d)\b").expect("static regex"));

static CONNECTOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:therefore|because|thus|consequently|hence|however|since|accordingly)\b")
        .expect("static regex")
});

static INTRO_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:introduction|overview|background|first|to begin)\b")
        .expect("static regex")
});

static CONCLUSION_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:conclusion|in summary|finally|ultimately|in short|to conclude)\b")
        .expect("static regex")
});

pub fn historical_references(node: &Node) -> ValidationResult {
    let hits = HISTORICAL_REFERENCE.find_iter(&node.content).count();
    if hits == 0 {
        return ValidationResult::fail(
            0.0,
            0.7,
            QualityIssue::new(
                Severity::Medium,
                QualityCategory::Accuracy,
                "No historical references",
            ),
            "Anchor the material in dated historical events",
        );
    }
    ValidationResult::pass((hits as f64 / 2.0).min(1.0), 0.7)
}

pub fn citations(node: &Node) -> ValidationResult {
    let found: Vec<String> = CITATION
        .find_iter(&node.content)
        .map(|m| m.as_str().to_string())
        .collect();
    if found.is_empty() {
        return ValidationResult::fail(
            0.0,
            0.8,
            QualityIssue::new(Severity::Low, QualityCategory::Accuracy, "No bracketed citations"),
            "Cite sources with bracketed references such as [1]",
        );
    }
    ValidationResult::pass((found.len() as f64 / 2.0).min(1.0), 0.8)
}

pub fn step_markers(node: &Node) -> ValidationResult {
    let steps = STEP_MARKER.find_iter(&node.content).count();
    let score = (steps as f64 / MIN_STEP_MARKERS as f64).min(1.0);
    if steps < MIN_STEP_MARKERS {
        return ValidationResult::fail(
            score,
            0.9,
            QualityIssue::new(
                Severity::Medium,
                QualityCategory::Structure,
                format!("Only {steps} step markers, expected at least {MIN_STEP_MARKERS}"),
            ),
            "Break the procedure into numbered steps (\"Step 1\", \"Step 2\", ...)",
        );
    }
    ValidationResult::pass(score, 0.9)
}

pub fn no_hedging(node: &Node) -> ValidationResult {
    let hedges: Vec<String> = HEDGE
        .find_iter(&node.content)
        .map(|m| m.as_str().to_string())
        .collect();
    if hedges.is_empty() {
        return ValidationResult::pass(1.0, 0.8);
    }
    let score = 1.0 - 0.2 * hedges.len() as f64;
    ValidationResult::fail(
        score,
        0.8,
        QualityIssue::new(
            Severity::Low,
            QualityCategory::Consistency,
            format!("{} hedging terms", hedges.len()),
        )
        .with_evidence(hedges),
        "Replace hedged statements with definite ones",
    )
}

pub fn named_subject(node: &Node) -> ValidationResult {
    let named = NAMED_SUBJECT.find_iter(&node.content).any(|m| {
        m.as_str()
            .split_whitespace()
            .next()
            .map(|first| !CAPITALIZED_STOP_WORDS.contains(&first))
            .unwrap_or(false)
    });
    if named {
        ValidationResult::pass(1.0, 0.6)
    } else {
        ValidationResult::fail(
            0.3,
            0.6,
            QualityIssue::new(
                Severity::Medium,
                QualityCategory::Accuracy,
                "No named subject",
            ),
            "Name the person or organization the profile describes",
        )
    }
}

pub fn role_keyword(node: &Node) -> ValidationResult {
    if ROLE_KEYWORD.is_match(&node.content) {
        ValidationResult::pass(1.0, 0.6)
    } else {
        ValidationResult::fail(
            0.4,
            0.6,
            QualityIssue::new(
                Severity::Low,
                QualityCategory::Accuracy,
                "Subject role is not stated",
            ),
            "State the subject's role (leader, founder, handler, ...)",
        )
    }
}

/// Years mentioned in the content should appear in non-decreasing order.
pub fn chronological_dates(node: &Node) -> ValidationResult {
    let years: Vec<u32> = YEAR
        .captures_iter(&node.content)
        .filter_map(|caps| caps.get(1)?.as_str().parse().ok())
        .collect();
    if years.len() < 2 {
        return ValidationResult::pass(1.0, 0.5);
    }
    let pairs = years.len() - 1;
    let ordered = years.windows(2).filter(|w| w[0] <= w[1]).count();
    if ordered == pairs {
        return ValidationResult::pass(1.0, 0.8);
    }
    let evidence = years
        .windows(2)
        .filter(|w| w[0] > w[1])
        .map(|w| format!("{} before {}", w[0], w[1]))
        .collect();
    ValidationResult::fail(
        ordered as f64 / pairs as f64,
        0.8,
        QualityIssue::new(
            Severity::Medium,
            QualityCategory::Consistency,
            "Dates are out of chronological order",
        )
        .with_evidence(evidence),
        "Present events in chronological order",
    )
}

pub fn logical_connectors(node: &Node) -> ValidationResult {
    let connectors = CONNECTOR.find_iter(&node.content).count();
    let score = (connectors as f64 / 3.0).min(1.0);
    if connectors == 0 {
        return ValidationResult::fail(
            score,
            0.6,
            QualityIssue::new(
                Severity::Low,
                QualityCategory::Structure,
                "No logical connectors",
            ),
            "Make the argument explicit with connectors (because, therefore, however)",
        );
    }
    ValidationResult::pass(score, 0.6)
}

pub fn intro_conclusion(node: &Node) -> ValidationResult {
    let intro = INTRO_MARKER.is_match(&node.content);
    let conclusion = CONCLUSION_MARKER.is_match(&node.content);
    let score = (u8::from(intro) + u8::from(conclusion)) as f64 / 2.0;
    match (intro, conclusion) {
        (true, true) => ValidationResult::pass(score, 0.5),
        (false, _) => ValidationResult::fail(
            score,
            0.5,
            QualityIssue::new(
                Severity::Low,
                QualityCategory::Structure,
                "No introduction marker",
            ),
            "Open with an overview of the argument",
        ),
        (true, false) => ValidationResult::fail(
            score,
            0.5,
            QualityIssue::new(
                Severity::Low,
                QualityCategory::Structure,
                "No conclusion marker",
            ),
            "Close with a conclusion",
        ),
    }
}

pub fn content_length(node: &Node) -> ValidationResult {
    let words = text::tokenize(&node.content).len();
    let score = (words as f64 / FULL_LENGTH_WORDS as f64).min(1.0);
    if words == 0 {
        return ValidationResult::fail(
            0.0,
            1.0,
            QualityIssue::new(Severity::High, QualityCategory::Completeness, "Content is empty"),
            "Write the body of the document",
        );
    }
    if words < MIN_LENGTH_WORDS {
        return ValidationResult::fail(
            score,
            1.0,
            QualityIssue::new(
                Severity::Medium,
                QualityCategory::Completeness,
                format!("Content has only {words} words"),
            ),
            "Expand the content",
        );
    }
    ValidationResult::pass(score, 1.0)
}

pub fn themes_present(node: &Node) -> ValidationResult {
    if node.themes.iter().any(|t| !t.trim().is_empty()) {
        ValidationResult::pass(1.0, 1.0)
    } else {
        ValidationResult::fail(
            0.0,
            1.0,
            QualityIssue::new(Severity::Medium, QualityCategory::Relevance, "No themes declared"),
            "Declare the themes the document covers",
        )
    }
}

/// Fraction of declared themes that the content actually mentions.
pub fn themes_mentioned(node: &Node) -> ValidationResult {
    if node.themes.is_empty() {
        return ValidationResult::fail(
            0.0,
            0.7,
            QualityIssue::new(
                Severity::Low,
                QualityCategory::Relevance,
                "No themes to check against content",
            ),
            "Declare the themes the document covers",
        );
    }
    let missing: Vec<String> = node
        .themes
        .iter()
        .filter(|t| !text::contains_ci(&node.content, t))
        .cloned()
        .collect();
    let score = 1.0 - missing.len() as f64 / node.themes.len() as f64;
    if missing.is_empty() {
        return ValidationResult::pass(score, 0.7);
    }
    ValidationResult::fail(
        score,
        0.7,
        QualityIssue::new(
            Severity::Low,
            QualityCategory::Relevance,
            "Declared themes are not mentioned in the content",
        )
        .with_evidence(missing),
        "Discuss every declared theme or remove it",
    )
}

pub fn excerpt_present(node: &Node) -> ValidationResult {
    if node.excerpt.trim().is_empty() {
        ValidationResult::fail(
            0.0,
            1.0,
            QualityIssue::new(Severity::Low, QualityCategory::Completeness, "Missing excerpt"),
            "Add a one-paragraph excerpt",
        )
    } else {
        ValidationResult::pass(1.0, 1.0)
    }
}

pub fn anchors_present(node: &Node) -> ValidationResult {
    if node.metadata.anchors.is_empty() {
        ValidationResult::fail(
            0.0,
            1.0,
            QualityIssue::new(Severity::Low, QualityCategory::Completeness, "No anchors"),
            "Add anchors tying the document to related material",
        )
    } else {
        ValidationResult::pass(1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::helpers::{node, with_content, with_themes};
    use test_log::test;

    #[test]
    fn test_step_markers() {
        let n = with_content(node("t", "T"), "Step 1: watch. Step 2: isolate. step 3: wait.");
        assert!(step_markers(&n).passed);
        let short = with_content(node("t", "T"), "Step 1: watch.");
        let result = step_markers(&short);
        assert!(!result.passed);
        assert!((result.score - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_hedging_is_penalized_with_evidence() {
        let n = with_content(node("t", "T"), "It might work. Perhaps not.");
        let result = no_hedging(&n);
        assert!(!result.passed);
        assert!((result.score - 0.6).abs() < 1e-9);
        assert_eq!(result.issues[0].evidence, vec!["might", "Perhaps"]);
    }

    #[test]
    fn test_hedging_score_floors_at_zero() {
        let n = with_content(
            node("t", "T"),
            "maybe maybe maybe maybe maybe maybe maybe",
        );
        assert_eq!(no_hedging(&n).score, 0.0);
    }

    #[test]
    fn test_chronological_dates() {
        let ordered = with_content(node("c", "C"), "In 1971 it began; by 1989 it was over.");
        assert!(chronological_dates(&ordered).passed);
        let shuffled = with_content(node("c", "C"), "In 1989 it ended, in 1971 it began, 1990.");
        let result = chronological_dates(&shuffled);
        assert!(!result.passed);
        assert!((result.score - 0.5).abs() < 1e-9);
        assert_eq!(result.issues[0].evidence, vec!["1989 before 1971"]);
    }

    #[test]
    fn test_named_subject_ignores_sentence_starts() {
        let anonymous = with_content(node("p", "P"), "The Handler waited.");
        assert!(!named_subject(&anonymous).passed);
        let named = with_content(node("p", "P"), "Ruth Calder recruited them.");
        assert!(named_subject(&named).passed);
    }

    #[test]
    fn test_themes_mentioned() {
        let n = with_themes(
            with_content(node("t", "T"), "Fear spreads quickly."),
            &["fear", "doubt"],
        );
        let result = themes_mentioned(&n);
        assert!((result.score - 0.5).abs() < 1e-9);
        assert_eq!(result.issues[0].evidence, vec!["doubt"]);
    }

    #[test]
    fn test_content_length() {
        let empty = node("e", "E");
        let result = content_length(&empty);
        assert_eq!(result.issues[0].severity, Severity::High);
        let long = with_content(node("l", "L"), &"word ".repeat(200));
        let result = content_length(&long);
        assert!(result.passed);
        assert_eq!(result.score, 1.0);
    }
}
