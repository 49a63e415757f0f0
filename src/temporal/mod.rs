//! Temporal indexer: per-node timelines, anomaly detection and doctrine pattern shifts.
//!
//! ## Timelines
//!
//! Every node contributes one `CREATION` event (from `metadata.date`) followed by one
//! `MODIFICATION` event per in-content marker (`Revised: MMXXV.Q3`, `updated MMXXVI.02`, ...).
//! Dates that cannot be parsed fall back to the injected [`Clock`]'s "now"; such events are
//! marked `estimated` and recorded in [`TemporalIndex::parse_failures`] so the orchestrator can
//! report them. Estimated events never participate in ordering checks, which keeps anomaly
//! detection independent of wall-clock time.
//!
//! ## Anomalies
//!
//! - `TEMPORAL` (HIGH): a node's timeline, in extraction order, is not non-decreasing.
//! - `BEHAVIORAL` (MEDIUM): a high-signal node declares no themes.
//!
//! ## Pattern shifts
//!
//! Doctrine, tactic and profile nodes are grouped by type and ordered chronologically. Within the
//! doctrine group each consecutive pair yields at most one shift: `CLASSIFICATION_SHIFT` when the
//! classification changes, otherwise `THEMATIC_EVOLUTION` when the later node introduces a theme.

pub mod dates;

use crate::{
    ids::Clock,
    properties::{EnumSet, Node, NodeType, Severity},
};
use chrono::{DateTime, Utc};
use enumset::enum_set;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, sync::Arc};

pub use dates::{parse_stylized_date, roman_to_int, DateParseError};

pub const CLASSIFICATION_SHIFT: &str = "CLASSIFICATION_SHIFT";
pub const THEMATIC_EVOLUTION: &str = "THEMATIC_EVOLUTION";

/// Node types grouped and ordered chronologically for pattern-shift detection.
pub const SHIFT_TRACKED_TYPES: EnumSet<NodeType> =
    enum_set!(NodeType::Doctrine | NodeType::Tactic | NodeType::Profile);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TemporalEventType {
    Creation,
    Modification,
    Connection,
    Anomaly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporalEvent {
    pub node_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: TemporalEventType,
    pub context: String,
    pub confidence: f64,
    /// True when `timestamp` is the clock fallback for an unparseable date.
    #[serde(default)]
    pub estimated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternShift {
    pub pattern_type: String,
    pub from_state: String,
    pub to_state: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalyType {
    Temporal,
    Behavioral,
    Relational,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anomaly {
    pub node_id: String,
    pub anomaly_type: AnomalyType,
    pub description: String,
    pub severity: Severity,
    pub evidence: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateParseFailure {
    pub node_id: String,
    pub raw: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporalIndex {
    /// Events per node, in extraction order.
    pub timelines: BTreeMap<String, Vec<TemporalEvent>>,
    /// Every event, ordered chronologically (stable on corpus order).
    pub events: Vec<TemporalEvent>,
    pub pattern_shifts: Vec<PatternShift>,
    pub anomalies: Vec<Anomaly>,
    pub parse_failures: Vec<DateParseFailure>,
    /// Earliest and latest non-estimated timestamps.
    pub span: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl TemporalIndex {
    pub fn total_events(&self) -> usize {
        self.events.len()
    }

    /// Whether the node's creation date parsed cleanly.
    pub fn has_reliable_creation(&self, node_id: &str) -> bool {
        self.timelines
            .get(node_id)
            .and_then(|events| events.first())
            .map(|event| !event.estimated)
            .unwrap_or(false)
    }
}

pub struct TemporalIndexer {
    clock: Arc<dyn Clock>,
}

impl TemporalIndexer {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        TemporalIndexer { clock }
    }

    pub fn index(&self, nodes: &[Node]) -> TemporalIndex {
        let now = self.clock.now();
        let mut index = TemporalIndex::default();

        for node in nodes {
            let timeline = self.build_timeline(node, now, &mut index.parse_failures);
            index.anomalies.extend(detect_anomalies(node, &timeline));
            index.timelines.insert(node.id.clone(), timeline);
        }

        let mut events: Vec<TemporalEvent> = nodes
            .iter()
            .filter_map(|node| index.timelines.get(&node.id))
            .flatten()
            .cloned()
            .collect();
        events.sort_by_key(|event| event.timestamp);
        index.span = events
            .iter()
            .filter(|e| !e.estimated)
            .map(|e| e.timestamp)
            .fold(None, |span, ts| match span {
                None => Some((ts, ts)),
                Some((lo, hi)) => Some((lo.min(ts), hi.max(ts))),
            });
        index.events = events;
        index.pattern_shifts = detect_pattern_shifts(nodes, &index.timelines);

        tracing::debug!(
            "Temporal index: {} events, {} anomalies, {} shifts, {} unparseable dates",
            index.events.len(),
            index.anomalies.len(),
            index.pattern_shifts.len(),
            index.parse_failures.len()
        );
        index
    }

    fn build_timeline(
        &self,
        node: &Node,
        now: DateTime<Utc>,
        failures: &mut Vec<DateParseFailure>,
    ) -> Vec<TemporalEvent> {
        let mut timeline = Vec::new();
        let mut resolve = |raw: &str| match parse_stylized_date(raw) {
            Ok(ts) => (ts, false),
            Err(err) => {
                tracing::warn!(
                    "Node {}: unparseable date '{}' ({}), using current time",
                    node.id,
                    raw,
                    err
                );
                failures.push(DateParseFailure {
                    node_id: node.id.clone(),
                    raw: raw.to_string(),
                    reason: err.to_string(),
                });
                (now, true)
            }
        };

        let (created, estimated) = resolve(&node.metadata.date);
        timeline.push(TemporalEvent {
            node_id: node.id.clone(),
            timestamp: created,
            event_type: TemporalEventType::Creation,
            context: format!("Created: {}", node.title),
            confidence: if estimated { 0.3 } else { 0.9 },
            estimated,
        });

        for raw in dates::modification_markers(&node.content) {
            let (modified, estimated) = resolve(raw);
            timeline.push(TemporalEvent {
                node_id: node.id.clone(),
                timestamp: modified,
                event_type: TemporalEventType::Modification,
                context: format!("Modification marker {raw}"),
                confidence: if estimated { 0.3 } else { 0.7 },
                estimated,
            });
        }
        timeline
    }
}

fn detect_anomalies(node: &Node, timeline: &[TemporalEvent]) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();

    let reliable: Vec<&TemporalEvent> = timeline.iter().filter(|e| !e.estimated).collect();
    let out_of_order: Vec<String> = reliable
        .windows(2)
        .filter(|pair| pair[1].timestamp < pair[0].timestamp)
        .map(|pair| {
            format!(
                "{} ({}) precedes {} ({})",
                pair[1].context,
                pair[1].timestamp.to_rfc3339(),
                pair[0].context,
                pair[0].timestamp.to_rfc3339()
            )
        })
        .collect();
    if !out_of_order.is_empty() {
        anomalies.push(Anomaly {
            node_id: node.id.clone(),
            anomaly_type: AnomalyType::Temporal,
            description: "Timeline events are out of chronological order".to_string(),
            severity: Severity::High,
            evidence: out_of_order,
        });
    }

    if node.metadata.is_high_signal && node.themes.is_empty() {
        anomalies.push(Anomaly {
            node_id: node.id.clone(),
            anomaly_type: AnomalyType::Behavioral,
            description: "High-signal node declares no themes".to_string(),
            severity: Severity::Medium,
            evidence: vec![format!("isHighSignal=true, themes=[] on '{}'", node.title)],
        });
    }

    anomalies
}

fn detect_pattern_shifts(
    nodes: &[Node],
    timelines: &BTreeMap<String, Vec<TemporalEvent>>,
) -> Vec<PatternShift> {
    let created = |node: &Node| {
        timelines
            .get(&node.id)
            .and_then(|t| t.first())
            .map(|e| e.timestamp)
    };

    let mut groups: BTreeMap<NodeType, Vec<(DateTime<Utc>, &Node)>> = BTreeMap::new();
    for node in nodes {
        if !SHIFT_TRACKED_TYPES.contains(node.kind) {
            continue;
        }
        if let Some(ts) = created(node) {
            groups.entry(node.kind).or_default().push((ts, node));
        }
    }
    for group in groups.values_mut() {
        group.sort_by_key(|(ts, _)| *ts);
    }

    let mut shifts = Vec::new();
    let Some(doctrines) = groups.get(&NodeType::Doctrine) else {
        return shifts;
    };
    for pair in doctrines.windows(2) {
        let (_, earlier) = pair[0];
        let (timestamp, later) = pair[1];
        if earlier.metadata.classification != later.metadata.classification {
            shifts.push(PatternShift {
                pattern_type: CLASSIFICATION_SHIFT.to_string(),
                from_state: earlier.metadata.classification.clone(),
                to_state: later.metadata.classification.clone(),
                timestamp,
                trigger: Some(later.id.clone()),
                confidence: 0.8,
            });
        } else if let Some(new_theme) = later
            .themes
            .iter()
            .find(|theme| !earlier.themes.contains(theme))
        {
            shifts.push(PatternShift {
                pattern_type: THEMATIC_EVOLUTION.to_string(),
                from_state: earlier.themes.join(", "),
                to_state: later.themes.join(", "),
                timestamp,
                trigger: Some(new_theme.clone()),
                confidence: 0.6,
            });
        }
    }
    shifts
}
