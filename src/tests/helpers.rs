//! Shared fixtures for unit tests

use crate::properties::{Node, NodeType};

/// Initialize logging for tests
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// A doctrine node with no content, themes, links or date.
pub fn node(id: &str, title: &str) -> Node {
    Node {
        id: id.to_string(),
        title: title.to_string(),
        ..Default::default()
    }
}

pub fn of_kind(mut node: Node, kind: NodeType) -> Node {
    node.kind = kind;
    node
}

pub fn with_themes(mut node: Node, themes: &[&str]) -> Node {
    node.themes = themes.iter().map(|t| t.to_string()).collect();
    node
}

pub fn with_links(mut node: Node, links: &[&str]) -> Node {
    node.links_to = Some(links.iter().map(|l| l.to_string()).collect());
    node
}

pub fn with_content(mut node: Node, content: &str) -> Node {
    node.content = content.to_string();
    node
}

pub fn with_date(mut node: Node, date: &str) -> Node {
    node.metadata.date = date.to_string();
    node
}

/// Marks the node high-signal with the given vector tag.
pub fn high_signal(mut node: Node, vector: &str) -> Node {
    node.metadata.is_high_signal = true;
    node.metadata.vector = vector.to_string();
    node
}

/// A small corpus touching every node type, with dated, linked, themed and high-signal nodes.
pub fn sample_corpus() -> Vec<Node> {
    init_logging();

    let control = with_links(
        with_date(
            with_themes(
                with_content(
                    node("doctrine-control", "Doctrine of Control"),
                    "In 1984 the Ministry described control as a garden that must be pruned. \
                     First, isolate the subject. Therefore every channel is watched. \
                     Fear is a tool, and trust is like a currency that can be spent. \
                     See Isolation Protocol for the procedure. In conclusion, control is patient.",
                ),
                &["control", "isolation", "fear"],
            ),
            "MMXX.Q1",
        ),
        &["tactic-isolation", "profile-hale"],
    );

    let isolation = with_date(
        with_themes(
            with_content(
                of_kind(node("tactic-isolation", "Isolation Protocol"), NodeType::Tactic),
                "Step 1: cut contact with friends. Step 2: control the schedule. \
                 Step 3: monitor every message. Marcus Hale used this against the union. \
                 Isolation creates pressure and pressure creates compliance.",
            ),
            &["isolation", "control"],
        ),
        "MMXXI.03",
    );

    let hale = high_signal(
        with_date(
            with_themes(
                with_content(
                    of_kind(node("profile-hale", "Marcus Hale"), NodeType::Profile),
                    "Marcus Hale was the director of the Ministry. Hale ran the Isolation \
                     Protocol and the director role made him feared. The mind is like a \
                     machine that can be tuned.",
                ),
                &["control", "fear"],
            ),
            "MMXXI",
        ),
        "V-7",
    );

    let harbor = high_signal(
        with_links(
            with_date(
                with_themes(
                    with_content(
                        of_kind(
                            node("case-harbor", "The Harbor Strike"),
                            NodeType::CaseStudy,
                        ),
                        "On 1987-03-02 the Harbor Union walked out. Marcus Hale answered with \
                         pressure and threats. By 1988 the strike had collapsed, because \
                         isolation worked. Revised: MMXXII.06",
                    ),
                    &["fear", "isolation"],
                ),
                "MMXXII",
            ),
            &["profile-hale", "tactic-isolatoin"],
        ),
        "V-7",
    );

    let theory = with_themes(
        with_content(
            of_kind(node("theory-pressure", "Pressure Theory"), NodeType::Theory),
            "Pressure is a lever. When pressure rises, resistance falls; consequently \
             compliance grows. This model explains the Harbor Strike.",
        ),
        &["pressure", "control"],
    );

    let song = with_themes(
        with_content(
            of_kind(node("song-quiet", "Quiet Water"), NodeType::Song),
            "Silence is a weapon, the water keeps its secrets.",
        ),
        &["silence"],
    );

    vec![control, isolation, hale, harbor, theory, song]
}
