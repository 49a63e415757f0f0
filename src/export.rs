//! Mermaid rendering of a link graph.

use std::fmt::Write;

use crate::{error::DossierError, properties::GraphLink};

/// Spaces and dashes become underscores; quotes and parentheses are removed.
pub fn mermaid_id(id: &str) -> String {
    id.chars()
        .filter(|c| !matches!(c, '"' | '(' | ')'))
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

/// A `graph TD` document with one labelled edge per link, in link order.
pub fn to_mermaid(links: &[GraphLink]) -> Result<String, DossierError> {
    let mut out = String::from("graph TD\n");
    for link in links {
        writeln!(
            out,
            "  {} -- {} --> {}",
            mermaid_id(&link.source),
            link.kind,
            mermaid_id(&link.target)
        )?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::LinkType;

    #[test]
    fn test_mermaid_id() {
        assert_eq!(mermaid_id("tactic-folk devil (v2)"), "tactic_folk_devil_v2");
        assert_eq!(mermaid_id("say \"no\""), "say_no");
    }

    #[test]
    fn test_to_mermaid() {
        let links = vec![
            GraphLink::new("doctrine-a", "tactic b", 1.0, LinkType::Explicit),
            GraphLink::new("doctrine-a", "tactic b", 0.6, LinkType::Inferred),
        ];
        assert_eq!(
            to_mermaid(&links).unwrap(),
            "graph TD\n  doctrine_a -- EXPLICIT --> tactic_b\n  doctrine_a -- INFERRED --> tactic_b\n"
        );
        assert_eq!(to_mermaid(&[]).unwrap(), "graph TD\n");
    }
}
