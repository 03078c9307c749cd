//! `loanwarden` - Consistency reconciliation for loan records
//!
//! This crate detects and repairs data inconsistencies in a loan document
//! store: stale arrears flags on settled installments, borrower statuses
//! out of sync with their portfolio, payments recorded but never linked to
//! the installment they paid, and local-time payment dates that should be
//! canonical UTC. It runs as a batch job, one maintenance routine per
//! invocation, and leaves a durable artifact trail per run.

// Deny the most critical lints that could lead to bugs or security issues
#![deny(
    // Security and correctness
    unsafe_code,
    unsafe_op_in_unsafe_fn,

    // Code quality - things that are almost always bugs
    unreachable_code,
    unreachable_patterns,
    unused_must_use,

    // Documentation - broken links are bugs
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links,
)]
// Warn on things that should be fixed but aren't necessarily bugs
#![warn(
    // Documentation - missing docs should be added gradually
    missing_docs,

    // Clippy categories for overall code quality
    clippy::all,
    clippy::pedantic,

    // Performance
    clippy::inefficient_to_string,
    clippy::needless_pass_by_value,

    // Correctness
    clippy::clone_on_ref_ptr,
    clippy::dbg_macro,
    clippy::exit,
    clippy::expect_used,
    clippy::float_cmp,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,

    // Complexity and readability
    clippy::cognitive_complexity,
    clippy::large_enum_variant,
    clippy::match_same_arms,
    clippy::too_many_lines,

    // Style consistency
    clippy::enum_glob_use,
    clippy::semicolon_if_nothing_returned,
    clippy::wildcard_imports,

    // Future compatibility
    future_incompatible,
    rust_2018_idioms,
)]
// Allow some pedantic lints that are too noisy or not applicable
#![allow(
    clippy::module_name_repetitions,  // Common pattern in Rust
    clippy::missing_errors_doc,        // Will add gradually
    clippy::missing_panics_doc,        // Will add gradually
)]

/// Per-run backup and report artifacts
pub mod artifacts;
/// Command-line interface, one subcommand per routine
pub mod cli;
/// Environment-derived application configuration
pub mod config;
/// Pure reconciliation rules
pub mod core;
/// Store gateway: typed query and update primitives
pub mod db;
/// Serde models for the store collections
pub mod entities;
/// Unified error types and result handling
pub mod errors;
/// Run orchestration, one module per routine
pub mod jobs;
/// Summary-email notification
pub mod notify;

#[cfg(test)]
pub mod test_utils;
