//! StateStore — redb-backed persistence for the health-check log.
//!
//! The log is append-only: this module exposes no update or delete path.
//! Appends run in a single write transaction that both allocates the next
//! sequence number and stores the record, so concurrent appends are
//! serialized and a record is either fully committed or absent. Reads run
//! in read transactions and see a consistent committed snapshot.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe state store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent state store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Open a state store that must already exist at the given path.
    pub fn open_existing(path: &Path) -> StateResult<Self> {
        if !path.exists() {
            return Err(StateError::Open(format!(
                "no health-check log at {}",
                path.display()
            )));
        }
        let db = Database::open(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "existing state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory state store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(HEALTH_CHECKS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Append a record and return its insertion sequence number.
    pub fn append_health_check(&self, record: &HealthCheckRecord) -> StateResult<CheckId> {
        let value = serde_json::to_vec(record).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let id;
        {
            let mut table = txn.open_table(HEALTH_CHECKS).map_err(map_err!(Table))?;
            id = match table.last().map_err(map_err!(Read))? {
                Some((key, _)) => key.value() + 1,
                None => 1,
            };
            table
                .insert(id, value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(id, status = %record.status, timestamp = record.timestamp, "health check appended");
        Ok(id)
    }

    /// The `limit` most recently inserted records, newest first.
    pub fn recent_health_checks(&self, limit: usize) -> StateResult<Vec<StoredHealthCheck>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(HEALTH_CHECKS).map_err(map_err!(Table))?;
        let mut results = Vec::with_capacity(limit.min(128));
        for entry in table.iter().map_err(map_err!(Read))?.rev().take(limit) {
            let (key, value) = entry.map_err(map_err!(Read))?;
            results.push(decode(key.value(), value.value())?);
        }
        Ok(results)
    }

    /// Every record with `timestamp >= since`, in insertion order.
    pub fn health_checks_since(&self, since: i64) -> StateResult<Vec<StoredHealthCheck>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(HEALTH_CHECKS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (key, value) = entry.map_err(map_err!(Read))?;
            let check = decode(key.value(), value.value())?;
            if check.record.timestamp >= since {
                results.push(check);
            }
        }
        Ok(results)
    }
}

fn decode(id: CheckId, bytes: &[u8]) -> StateResult<StoredHealthCheck> {
    let record: HealthCheckRecord =
        serde_json::from_slice(bytes).map_err(map_err!(Deserialize))?;
    Ok(StoredHealthCheck { id, record })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn good(ts: i64) -> HealthCheckRecord {
        HealthCheckRecord::new(CheckStatus::Good, ts)
    }

    fn bad(ts: i64, msg: &str) -> HealthCheckRecord {
        HealthCheckRecord::new(CheckStatus::Bad, ts).with_message(msg)
    }

    #[test]
    fn append_assigns_sequential_ids() {
        let store = StateStore::open_in_memory().unwrap();
        assert_eq!(store.append_health_check(&good(10)).unwrap(), 1);
        assert_eq!(store.append_health_check(&good(20)).unwrap(), 2);
        assert_eq!(store.append_health_check(&bad(5, "HTTP 502: bad gateway")).unwrap(), 3);
    }

    #[test]
    fn recent_is_insertion_descending_not_timestamp() {
        let store = StateStore::open_in_memory().unwrap();
        // Out-of-order timestamps: insertion order must win.
        store.append_health_check(&good(300)).unwrap();
        store.append_health_check(&good(100)).unwrap();
        store.append_health_check(&bad(200, "timeout")).unwrap();

        let recent = store.recent_health_checks(10).unwrap();
        let ids: Vec<_> = recent.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
        assert_eq!(recent[0].record.message.as_deref(), Some("timeout"));
    }

    #[test]
    fn recent_respects_limit() {
        let store = StateStore::open_in_memory().unwrap();
        for ts in 0..5 {
            store.append_health_check(&good(ts)).unwrap();
        }
        let recent = store.recent_health_checks(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id, 5);
        assert_eq!(recent[1].id, 4);
    }

    #[test]
    fn since_filters_inclusive() {
        let store = StateStore::open_in_memory().unwrap();
        for ts in [10, 20, 30, 20] {
            store.append_health_check(&good(ts)).unwrap();
        }
        let selected = store.health_checks_since(20).unwrap();
        let ids: Vec<_> = selected.iter().map(|c| c.id).collect();
        // Duplicate timestamps are kept.
        assert_eq!(ids, vec![2, 3, 4]);
    }

    #[test]
    fn optional_fields_round_trip() {
        let store = StateStore::open_in_memory().unwrap();
        let mut record = bad(42, "connection refused");
        record.response_time_ms = Some(1250);
        store.append_health_check(&record).unwrap();

        let recent = store.recent_health_checks(1).unwrap();
        assert_eq!(recent[0].record, record);
    }

    #[test]
    fn empty_store_operations() {
        let store = StateStore::open_in_memory().unwrap();
        assert!(store.recent_health_checks(100).unwrap().is_empty());
        assert!(store.health_checks_since(i64::MIN).unwrap().is_empty());
    }

    #[test]
    fn persistence_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("pulse.redb");

        {
            let store = StateStore::open(&db_path).unwrap();
            store.append_health_check(&good(1)).unwrap();
            store.append_health_check(&bad(2, "HTTP 500: oops")).unwrap();
        }

        // Reopen the same database file; sequence continues.
        let store = StateStore::open(&db_path).unwrap();
        assert_eq!(store.recent_health_checks(10).unwrap().len(), 2);
        assert_eq!(store.append_health_check(&good(3)).unwrap(), 3);
    }

    #[test]
    fn open_existing_requires_file() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("pulse.redb");

        let err = StateStore::open_existing(&db_path).err().unwrap();
        assert!(matches!(err, StateError::Open(_)));
        assert!(!db_path.exists());

        StateStore::open(&db_path)
            .unwrap()
            .append_health_check(&good(1))
            .unwrap();
        let store = StateStore::open_existing(&db_path).unwrap();
        assert_eq!(store.recent_health_checks(10).unwrap().len(), 1);
    }

    #[test]
    fn concurrent_appends_each_get_unique_id() {
        let store = StateStore::open_in_memory().unwrap();
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for i in 0..25 {
                        store.append_health_check(&good(t * 100 + i)).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let all = store.recent_health_checks(1000).unwrap();
        assert_eq!(all.len(), 200);
        let mut ids: Vec<_> = all.iter().map(|c| c.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 200);
        assert_eq!(ids.first(), Some(&1));
        assert_eq!(ids.last(), Some(&200));
    }

    #[test]
    fn status_wire_format() {
        let json = serde_json::to_string(&good(7)).unwrap();
        assert_eq!(json, r#"{"status":"good","timestamp":7}"#);
        assert_eq!(CheckStatus::parse("bad"), Some(CheckStatus::Bad));
        assert_eq!(CheckStatus::parse("Good"), None);
        assert_eq!(CheckStatus::parse("unknown"), None);
    }
}
