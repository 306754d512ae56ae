//! pulse-health — health-check ingestion and uptime aggregation.
//!
//! # Architecture
//!
//! ```text
//! Prober ──probe_once()──▶ Recorder ──append──▶ HealthLog (StateStore / MemoryLog)
//!                                                   │
//!                        Aggregator ◀──recent / since┘
//!                          ├── recent()       last 100 by insertion, newest first
//!                          ├── uptime_stats() good/bad counts over [since, now)
//!                          └── timeline()     recent() re-sorted by timestamp
//! ```
//!
//! The recorder and aggregator hold no state of their own beyond the
//! injected log. Aggregates are recomputed on every read.

pub mod aggregator;
pub mod error;
pub mod log;
pub mod prober;
pub mod recorder;
pub mod validate;

pub use aggregator::{Aggregator, RECENT_LIMIT, TimelinePoint, UptimeStats};
pub use error::{HealthError, HealthResult};
pub use log::{HealthLog, MemoryLog};
pub use prober::{ProbeOutcome, Prober, http_probe};
pub use recorder::Recorder;
