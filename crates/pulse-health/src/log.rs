//! Storage capability consumed by the recorder and aggregator.
//!
//! The core never constructs its store; it is handed a `HealthLog`. The
//! redb-backed [`StateStore`] is the production implementation and
//! [`MemoryLog`] is a plain in-process fake for tests.

use std::sync::Mutex;

use pulse_state::{CheckId, HealthCheckRecord, StateError, StateResult, StateStore, StoredHealthCheck};

/// Append-only health-check log.
pub trait HealthLog: Send + Sync {
    /// Persist one record atomically and return its insertion sequence.
    fn append(&self, record: &HealthCheckRecord) -> StateResult<CheckId>;

    /// Up to `limit` records, most recently inserted first.
    fn recent_descending(&self, limit: usize) -> StateResult<Vec<StoredHealthCheck>>;

    /// All records with `timestamp >= since`.
    fn since(&self, since: i64) -> StateResult<Vec<StoredHealthCheck>>;
}

impl HealthLog for StateStore {
    fn append(&self, record: &HealthCheckRecord) -> StateResult<CheckId> {
        self.append_health_check(record)
    }

    fn recent_descending(&self, limit: usize) -> StateResult<Vec<StoredHealthCheck>> {
        self.recent_health_checks(limit)
    }

    fn since(&self, since: i64) -> StateResult<Vec<StoredHealthCheck>> {
        self.health_checks_since(since)
    }
}

/// Vec-backed log. The mutex serializes appends the way a redb write
/// transaction does.
#[derive(Debug, Default)]
pub struct MemoryLog {
    entries: Mutex<Vec<StoredHealthCheck>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StateResult<std::sync::MutexGuard<'_, Vec<StoredHealthCheck>>> {
        self.entries
            .lock()
            .map_err(|e| StateError::Transaction(e.to_string()))
    }
}

impl HealthLog for MemoryLog {
    fn append(&self, record: &HealthCheckRecord) -> StateResult<CheckId> {
        let mut entries = self.lock()?;
        let id = entries.last().map_or(1, |last| last.id + 1);
        entries.push(StoredHealthCheck {
            id,
            record: record.clone(),
        });
        Ok(id)
    }

    fn recent_descending(&self, limit: usize) -> StateResult<Vec<StoredHealthCheck>> {
        let entries = self.lock()?;
        Ok(entries.iter().rev().take(limit).cloned().collect())
    }

    fn since(&self, since: i64) -> StateResult<Vec<StoredHealthCheck>> {
        let entries = self.lock()?;
        Ok(entries
            .iter()
            .filter(|c| c.record.timestamp >= since)
            .cloned()
            .collect())
    }
}
