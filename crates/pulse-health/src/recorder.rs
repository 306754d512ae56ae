//! The single write path into the health-check log.

use std::sync::Arc;

use pulse_state::{CheckId, HealthCheckRecord};
use tracing::{debug, warn};

use crate::error::HealthResult;
use crate::log::HealthLog;
use crate::validate::{check_timestamp, parse_status};

/// Validates probe outcomes and appends them to the log.
#[derive(Clone)]
pub struct Recorder {
    log: Arc<dyn HealthLog>,
}

impl Recorder {
    pub fn new(log: Arc<dyn HealthLog>) -> Self {
        Self { log }
    }

    /// Append one probe outcome.
    ///
    /// Fails with `InvalidArgument` before touching the log if `status` is
    /// not `"good"`/`"bad"` or `timestamp` is negative. `message` is stored
    /// as given, whatever the status.
    pub fn record(
        &self,
        status: &str,
        timestamp: i64,
        message: Option<String>,
    ) -> HealthResult<CheckId> {
        self.record_timed(status, timestamp, message, None)
    }

    /// [`record`](Self::record) with the probe latency attached.
    pub fn record_timed(
        &self,
        status: &str,
        timestamp: i64,
        message: Option<String>,
        response_time_ms: Option<u64>,
    ) -> HealthResult<CheckId> {
        let record = HealthCheckRecord {
            status: parse_status(status)?,
            timestamp: check_timestamp(timestamp)?,
            message,
            response_time_ms,
        };
        let id = self.log.append(&record).map_err(|e| {
            warn!(error = %e, status = %record.status, "health check append failed");
            e
        })?;
        debug!(id, status = %record.status, timestamp, "health check recorded");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HealthError;
    use crate::log::MemoryLog;
    use crate::log::testing::UnavailableLog;

    fn recorder() -> (Recorder, Arc<MemoryLog>) {
        let log = Arc::new(MemoryLog::new());
        (Recorder::new(log.clone()), log)
    }

    #[test]
    fn record_appends_exact_record() {
        let (recorder, log) = recorder();
        let id = recorder
            .record("bad", 123, Some("HTTP 503: unavailable".to_string()))
            .unwrap();

        let recent = log.recent_descending(100).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, id);
        assert_eq!(recent[0].record.status.as_str(), "bad");
        assert_eq!(recent[0].record.timestamp, 123);
        assert_eq!(recent[0].record.message.as_deref(), Some("HTTP 503: unavailable"));
    }

    #[test]
    fn unknown_status_is_rejected_without_write() {
        let (recorder, log) = recorder();
        recorder.record("good", 1, None).unwrap();

        let err = recorder.record("unknown", 123, None).unwrap_err();
        assert!(matches!(err, HealthError::InvalidArgument(_)));
        assert_eq!(log.recent_descending(100).unwrap().len(), 1);
    }

    #[test]
    fn negative_timestamp_is_rejected_without_write() {
        let (recorder, log) = recorder();
        let err = recorder.record("good", -1, None).unwrap_err();
        assert!(matches!(err, HealthError::InvalidArgument(_)));
        assert!(log.recent_descending(100).unwrap().is_empty());
    }

    #[test]
    fn message_allowed_on_good_and_absent_on_bad() {
        let (recorder, log) = recorder();
        recorder.record("good", 1, Some("slow but fine".to_string())).unwrap();
        recorder.record("bad", 2, None).unwrap();
        assert_eq!(log.recent_descending(100).unwrap().len(), 2);
    }

    #[test]
    fn duplicates_are_not_collapsed() {
        let (recorder, log) = recorder();
        recorder.record("good", 5, None).unwrap();
        recorder.record("good", 5, None).unwrap();
        assert_eq!(log.recent_descending(100).unwrap().len(), 2);
    }

    #[test]
    fn latency_is_stored() {
        let (recorder, log) = recorder();
        recorder.record_timed("good", 9, None, Some(42)).unwrap();
        assert_eq!(log.recent_descending(1).unwrap()[0].record.response_time_ms, Some(42));
    }

    #[test]
    fn storage_failure_surfaces() {
        let recorder = Recorder::new(Arc::new(UnavailableLog));
        let err = recorder.record("good", 1, None).unwrap_err();
        assert!(matches!(err, HealthError::StorageUnavailable(_)));
    }
}
