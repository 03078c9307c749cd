//! Core business logic - The reconciliation rules themselves.
//!
//! Everything in here is pure: no store handles, no I/O. The `jobs` layer
//! fetches documents, calls these functions, and applies the writes they
//! recommend. Keeping the rules pure is what makes the testable properties
//! (idempotence, strict-subset, audit completeness) checkable without a
//! live store.

pub mod arrears;
pub mod dates;
pub mod payment_audit;
pub mod payment_links;
pub mod user_status;
