//! pulse-state — embedded health-check log for PulseGrid.
//!
//! Backed by [redb](https://docs.rs/redb). Every probe outcome is appended
//! to a single table keyed by a monotonically increasing insertion
//! sequence, so "most recently inserted" is a reverse key scan and never
//! depends on the caller-supplied timestamp.
//!
//! Records are JSON-serialized into redb's `&[u8]` value column.
//!
//! The `StateStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and can be shared across async tasks.

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use store::StateStore;
pub use types::*;
