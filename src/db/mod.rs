//! Store gateway - Typed query and update primitives per collection.
//!
//! Thin async wrappers over the driver: one function per query or update
//! shape the routines need, returning entity models. Updates report their
//! matched/modified counts so callers can log partial failures without
//! aborting a batch. Per-document updates filter by identifier only; the
//! reconciliation rules being idempotent is what bounds the damage of the
//! unavoidable read-then-write window against concurrent external writers.

pub mod connection;
pub mod loans;
pub mod payments;
pub mod users;

use mongodb::results::UpdateResult;

/// Matched/modified counts of a single-document update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Documents matched by the identifier filter
    pub matched: u64,
    /// Documents actually modified
    pub modified: u64,
}

impl UpdateOutcome {
    /// Whether the update changed anything.
    #[must_use]
    pub const fn modified_any(self) -> bool {
        self.modified > 0
    }
}

impl From<UpdateResult> for UpdateOutcome {
    fn from(result: UpdateResult) -> Self {
        Self {
            matched: result.matched_count,
            modified: result.modified_count,
        }
    }
}
