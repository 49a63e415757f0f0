//! Run-over-run quality monitoring.
//!
//! History is an explicit [MonitoringState] owned by the caller: each call to [monitor] takes the
//! previous state and returns the next one together with any alerts raised by the new snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::{config::AlertThresholds, properties::Severity};

pub const MAX_HISTORY: usize = 50;

/// What one pipeline run looked like from the monitor's point of view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualitySnapshot {
    pub timestamp: DateTime<Utc>,
    pub mean_quality: f64,
    pub critical_issues: usize,
    pub processing_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitoringState {
    /// Oldest first, at most [MAX_HISTORY] entries.
    pub history: VecDeque<QualitySnapshot>,
}

impl MonitoringState {
    pub fn latest(&self) -> Option<&QualitySnapshot> {
        self.history.back()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    CriticalIssues,
    QualityDrop,
    SlowProcessing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub kind: AlertKind,
    pub severity: Severity,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

pub fn monitor(
    state: MonitoringState,
    snapshot: QualitySnapshot,
    thresholds: &AlertThresholds,
) -> (MonitoringState, Vec<Alert>) {
    let mut alerts = Vec::new();
    let alert = |kind, severity, message: String| Alert {
        kind,
        severity,
        message,
        timestamp: snapshot.timestamp,
    };

    if snapshot.critical_issues >= thresholds.critical_issue_count {
        alerts.push(alert(
            AlertKind::CriticalIssues,
            Severity::Critical,
            format!(
                "{} critical issues (threshold {})",
                snapshot.critical_issues, thresholds.critical_issue_count
            ),
        ));
    }

    if let Some(previous) = state.latest() {
        if previous.mean_quality > 0.0 {
            let drop = (previous.mean_quality - snapshot.mean_quality) / previous.mean_quality;
            if drop > thresholds.quality_drop_fraction {
                alerts.push(alert(
                    AlertKind::QualityDrop,
                    Severity::High,
                    format!(
                        "mean quality fell {:.0}% ({:.2} -> {:.2})",
                        drop * 100.0,
                        previous.mean_quality,
                        snapshot.mean_quality
                    ),
                ));
            }
        }
    }

    if snapshot.processing_ms > thresholds.max_processing_ms {
        alerts.push(alert(
            AlertKind::SlowProcessing,
            Severity::Medium,
            format!(
                "processing took {} ms (ceiling {} ms)",
                snapshot.processing_ms, thresholds.max_processing_ms
            ),
        ));
    }

    for a in alerts.iter() {
        tracing::warn!("quality alert {:?}: {}", a.kind, a.message);
    }

    let mut next = state;
    next.history.push_back(snapshot);
    while next.history.len() > MAX_HISTORY {
        next.history.pop_front();
    }
    (next, alerts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use test_log::test;

    fn snapshot(mean_quality: f64, critical_issues: usize, processing_ms: u64) -> QualitySnapshot {
        QualitySnapshot {
            timestamp: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            mean_quality,
            critical_issues,
            processing_ms,
        }
    }

    fn kinds(alerts: &[Alert]) -> Vec<AlertKind> {
        alerts.iter().map(|a| a.kind).collect()
    }

    #[test]
    fn test_quiet_run_raises_nothing() {
        let (state, alerts) = monitor(
            MonitoringState::default(),
            snapshot(0.8, 0, 100),
            &AlertThresholds::default(),
        );
        assert!(alerts.is_empty());
        assert_eq!(state.history.len(), 1);
    }

    #[test]
    fn test_alerts() {
        let thresholds = AlertThresholds::default();
        let (state, _) = monitor(MonitoringState::default(), snapshot(0.8, 0, 10), &thresholds);
        let (_, alerts) = monitor(state, snapshot(0.6, 5, 45_000), &thresholds);
        assert_eq!(
            kinds(&alerts),
            vec![
                AlertKind::CriticalIssues,
                AlertKind::QualityDrop,
                AlertKind::SlowProcessing
            ]
        );
    }

    #[test]
    fn test_small_drop_is_tolerated() {
        let thresholds = AlertThresholds::default();
        let (state, _) = monitor(MonitoringState::default(), snapshot(0.8, 0, 10), &thresholds);
        let (_, alerts) = monitor(state, snapshot(0.75, 0, 10), &thresholds);
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_history_is_capped() {
        let thresholds = AlertThresholds::default();
        let mut state = MonitoringState::default();
        for i in 0..(MAX_HISTORY + 7) {
            let (next, _) = monitor(state, snapshot(0.8, 0, i as u64), &thresholds);
            state = next;
        }
        assert_eq!(state.history.len(), MAX_HISTORY);
        assert_eq!(state.history.front().map(|s| s.processing_ms), Some(7));
    }
}
