//! Strict zero-balance repair: installments fully paid but still flagged
//! overdue get their arrears counter zeroed, one targeted field update
//! per installment.

use mongodb::Database;
use tracing::{debug, error, info};

use crate::artifacts::ArtifactStore;
use crate::config::AppConfig;
use crate::core::arrears;
use crate::db;
use crate::errors::Result;
use crate::notify::{Notifier, SummaryEmail};

/// Runs the strict zero-balance repair.
pub async fn run(db: &Database, config: &AppConfig) -> Result<()> {
    let timestamp = super::run_timestamp();
    let artifacts = ArtifactStore::open(&config.backup_dir)?;
    let notifier = config.email.clone().map(Notifier::new);

    let loans = db::loans::find_zero_balance_arrears(db, &config.scope).await?;
    info!(count = loans.len(), "loans with zero-balance arrears fetched");

    let backup = artifacts.write_json(&format!("zero_balance_loans_{timestamp}.json"), &loans)?;

    let mut installments_updated = 0_usize;
    for loan in &loans {
        for index in arrears::zero_balance_corrections(loan) {
            match db::loans::clear_arrears_at(db, loan.id, index).await {
                Ok(outcome) => {
                    debug!(
                        loan_id = %loan.id,
                        index,
                        matched = outcome.matched,
                        modified = outcome.modified,
                        "arrears counter zeroed"
                    );
                    if outcome.modified_any() {
                        installments_updated += 1;
                    }
                }
                Err(error) => {
                    error!(loan_id = %loan.id, index, %error, "update failed, skipping");
                }
            }
        }
    }

    info!(
        documents = loans.len(),
        installments_updated, "zero-balance repair finished"
    );

    let mut summary = SummaryEmail::new("Zero-balance arrears repair", &timestamp);
    summary
        .metric("Documents found", loans.len())
        .metric("Installments updated", installments_updated)
        .file(backup);
    super::dispatch_summary(notifier.as_ref(), &summary).await;

    Ok(())
}
