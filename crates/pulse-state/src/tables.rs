//! redb table definitions for the PulseGrid health-check log.

use redb::TableDefinition;

/// Health-check records keyed by insertion sequence (1, 2, 3, ...).
pub const HEALTH_CHECKS: TableDefinition<u64, &[u8]> = TableDefinition::new("health_checks");
