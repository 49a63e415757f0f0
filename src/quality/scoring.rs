use std::collections::BTreeMap;

use super::{standards::standards_for, ContentQualityReport, QualityCategory};
use crate::{properties::Node, text};

/// Score a node against the standards of its type.
///
/// A standard scores the mean of its validators; the overall score and each category score are
/// weight-normalized sums of standard scores, and confidence is the mean validator confidence.
pub fn score_node(node: &Node) -> ContentQualityReport {
    let mut weighted_total = 0.0;
    let mut weight_total = 0.0;
    let mut by_category: BTreeMap<QualityCategory, (f64, f64)> = BTreeMap::new();
    let mut confidences = Vec::new();
    let mut issues = Vec::new();
    let mut suggestions: Vec<String> = Vec::new();

    for standard in standards_for(node.kind) {
        let results: Vec<_> = standard.validators.iter().map(|v| v(node)).collect();
        let standard_score = text::mean(results.iter().map(|r| r.score));
        weighted_total += standard.weight * standard_score;
        weight_total += standard.weight;
        let entry = by_category.entry(standard.category).or_insert((0.0, 0.0));
        entry.0 += standard.weight * standard_score;
        entry.1 += standard.weight;

        for result in results {
            confidences.push(result.confidence);
            issues.extend(result.issues);
            for suggestion in result.suggestions {
                if !suggestions.contains(&suggestion) {
                    suggestions.push(suggestion);
                }
            }
        }
    }

    let normalize = |weighted: f64, weight: f64| {
        if weight > 0.0 {
            (weighted / weight).clamp(0.0, 1.0)
        } else {
            0.0
        }
    };

    ContentQualityReport {
        node_id: node.id.clone(),
        overall_score: normalize(weighted_total, weight_total),
        confidence: text::mean(confidences).clamp(0.0, 1.0),
        category_scores: by_category
            .into_iter()
            .map(|(category, (weighted, weight))| (category, normalize(weighted, weight)))
            .collect(),
        issues,
        suggestions,
    }
}
