//! Injected capabilities for identifier generation and wall-clock time.
//!
//! Every component that mints identifiers (entities, concepts) or needs "now" (the temporal
//! indexer's date fallback) receives these through the orchestrator instead of reaching for a
//! global. Tests use [`SequentialIdGenerator`] and [`FixedClock`] to get byte-identical results.

use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use uuid::Uuid;

pub trait IdGenerator: Send + Sync {
    /// Return a fresh identifier beginning with `prefix`.
    fn next_id(&self, prefix: &str) -> String;
}

/// Random, globally unique identifiers (`<prefix>-<uuid>`).
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_id(&self, prefix: &str) -> String {
        format!(
            "{prefix}-{}",
            Uuid::new_v4()
                .simple()
                .encode_lower(&mut Uuid::encode_buffer())
        )
    }
}

/// Deterministic identifiers (`<prefix>-0001`, `<prefix>-0002`, ...).
///
/// Counters are kept per prefix, so passes that run concurrently but use distinct prefixes
/// still produce the same sequence on every run.
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    counters: Mutex<BTreeMap<String, u64>>,
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self, prefix: &str) -> String {
        let mut counters = self.counters.lock();
        let counter = counters.entry(prefix.to_string()).or_insert(0);
        *counter += 1;
        format!("{prefix}-{:04}", *counter)
    }
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Midnight UTC on the given day. Out-of-range input falls back to the Unix epoch.
    pub fn ymd(year: i32, month: u32, day: u32) -> Self {
        let instant = Utc
            .with_ymd_and_hms(year, month, day, 0, 0, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        FixedClock(instant)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_ids_are_per_prefix() {
        let ids = SequentialIdGenerator::new();
        assert_eq!(ids.next_id("entity"), "entity-0001");
        assert_eq!(ids.next_id("concept"), "concept-0001");
        assert_eq!(ids.next_id("entity"), "entity-0002");
    }

    #[test]
    fn test_uuid_ids_are_unique() {
        let ids = UuidIdGenerator;
        let a = ids.next_id("entity");
        let b = ids.next_id("entity");
        assert!(a.starts_with("entity-"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_fixed_clock() {
        let clock = FixedClock::ymd(2030, 5, 1);
        assert_eq!(clock.now().to_rfc3339(), "2030-05-01T00:00:00+00:00");
    }
}
