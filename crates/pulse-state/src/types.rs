//! Domain types for the health-check log.
//!
//! All types are serializable to/from JSON for storage in redb tables and
//! for the REST API.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-assigned insertion sequence number.
pub type CheckId = u64;

/// Outcome of a single probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Good,
    Bad,
}

impl CheckStatus {
    /// Parse the wire literal. Only `"good"` and `"bad"` are accepted.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "good" => Some(Self::Good),
            "bad" => Some(Self::Bad),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Bad => "bad",
        }
    }

    pub fn is_good(&self) -> bool {
        matches!(self, Self::Good)
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One probe outcome as supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthCheckRecord {
    pub status: CheckStatus,
    /// Unix timestamp in milliseconds, taken by the prober.
    pub timestamp: i64,
    /// Error detail; normally only present on `bad` checks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Probe latency in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
}

/// A record as persisted, with its insertion sequence number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredHealthCheck {
    pub id: CheckId,
    #[serde(flatten)]
    pub record: HealthCheckRecord,
}

impl HealthCheckRecord {
    pub fn new(status: CheckStatus, timestamp: i64) -> Self {
        Self {
            status,
            timestamp,
            message: None,
            response_time_ms: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}
