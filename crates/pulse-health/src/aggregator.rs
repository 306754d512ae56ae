//! Read paths over the health-check log.
//!
//! Nothing here is cached or maintained incrementally: every call scans
//! the log afresh, so results always reflect the last committed write.

use std::sync::Arc;

use pulse_state::{CheckId, StoredHealthCheck};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::HealthResult;
use crate::log::HealthLog;

/// Maximum number of records returned by [`Aggregator::recent`].
pub const RECENT_LIMIT: usize = 100;

/// Uptime over a `[since, now)` window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UptimeStats {
    /// Percentage of good checks, rounded half-up to two decimals.
    pub uptime: f64,
    pub total: u64,
    pub good: u64,
    pub bad: u64,
}

impl UptimeStats {
    /// An empty window reports full uptime: no failures means no downtime.
    pub const NO_DATA: Self = Self {
        uptime: 100.0,
        total: 0,
        good: 0,
        bad: 0,
    };

    pub fn from_checks<'a>(checks: impl IntoIterator<Item = &'a StoredHealthCheck>) -> Self {
        let (total, good) = checks.into_iter().fold((0u64, 0u64), |(total, good), c| {
            (total + 1, good + u64::from(c.record.status.is_good()))
        });
        if total == 0 {
            return Self::NO_DATA;
        }
        Self {
            uptime: uptime_percent(good, total),
            total,
            good,
            bad: total - good,
        }
    }
}

/// `good / total * 100` rounded half-up to two decimals.
///
/// Computed in integer hundredths of a percent so decimal midpoints such
/// as 66.665 round up deterministically instead of depending on the
/// binary representation of the intermediate float.
pub fn uptime_percent(good: u64, total: u64) -> f64 {
    if total == 0 {
        return 100.0;
    }
    let hundredths = (good * 20_000 + total) / (2 * total);
    hundredths as f64 / 100.0
}

/// One point of the uptime graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub id: CheckId,
    pub timestamp: i64,
    pub up: bool,
}

#[derive(Clone)]
pub struct Aggregator {
    log: Arc<dyn HealthLog>,
}

impl Aggregator {
    pub fn new(log: Arc<dyn HealthLog>) -> Self {
        Self { log }
    }

    /// The last [`RECENT_LIMIT`] records by insertion order, newest first.
    ///
    /// Ordering is by insertion, not `timestamp`; see [`timeline`](Self::timeline)
    /// for a chronological view.
    pub fn recent(&self) -> HealthResult<Vec<StoredHealthCheck>> {
        Ok(self.log.recent_descending(RECENT_LIMIT)?)
    }

    /// Uptime over every record with `timestamp >= since`.
    pub fn uptime_stats(&self, since: i64) -> HealthResult<UptimeStats> {
        let checks = self.log.since(since)?;
        let stats = UptimeStats::from_checks(&checks);
        debug!(since, total = stats.total, uptime = stats.uptime, "uptime computed");
        Ok(stats)
    }

    /// The recent records re-sorted by timestamp, oldest first.
    pub fn timeline(&self) -> HealthResult<Vec<TimelinePoint>> {
        let mut points: Vec<_> = self
            .recent()?
            .into_iter()
            .map(|c| TimelinePoint {
                id: c.id,
                timestamp: c.record.timestamp,
                up: c.record.status.is_good(),
            })
            .collect();
        points.sort_by_key(|p| (p.timestamp, p.id));
        Ok(points)
    }
}
