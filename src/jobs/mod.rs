//! Run orchestration - One module per maintenance routine.
//!
//! Each routine follows the same shape: fetch the candidate set, persist
//! the raw fetch as a backup artifact, apply the core rules with
//! per-document writes, persist result artifacts, and dispatch one summary
//! notification. A failed single-document update is logged and skipped;
//! only configuration and connectivity errors abort a run.

pub mod consistency;
pub mod links;
pub mod unapplied;
pub mod zero_balance;

use chrono::Local;
use tracing::{info, warn};

use crate::notify::{Notifier, SummaryEmail};

/// The run timestamp stamped into artifact names and the summary subject.
pub fn run_timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Dispatches the summary notification. Every failure is downgraded to a
/// warning; the run has already succeeded by the time this is called.
pub async fn dispatch_summary(notifier: Option<&Notifier>, summary: &SummaryEmail) {
    let Some(notifier) = notifier else {
        info!("notifications disabled, skipping summary email");
        return;
    };
    if let Err(error) = notifier.send(&summary.subject(), &summary.to_html()).await {
        warn!(%error, "summary notification failed");
    }
}
