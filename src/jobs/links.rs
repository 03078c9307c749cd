//! Payment-link pruning: drops `payment_info` entries whose transaction no
//! longer exists in the payment collection. Dry-run unless `--apply`.

use std::collections::HashSet;

use mongodb::Database;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::artifacts::ArtifactStore;
use crate::config::AppConfig;
use crate::core::payment_links;
use crate::db;
use crate::entities::Loan;
use crate::errors::Result;
use crate::notify::{Notifier, SummaryEmail};

/// Per-loan record of the link review, persisted as a JSON artifact.
#[derive(Clone, Debug, Serialize)]
struct LinkReviewRecord {
    loan_id: String,
    total_links: usize,
    missing_links: Vec<String>,
    pruned_installments: usize,
    applied: bool,
}

/// Runs the link pruner over every in-scope loan carrying linkage.
pub async fn run(db: &Database, config: &AppConfig, apply: bool) -> Result<()> {
    let timestamp = super::run_timestamp();
    let artifacts = ArtifactStore::open(&config.backup_dir)?;
    let notifier = config.email.clone().map(Notifier::new);

    if !apply {
        info!("dry run: dangling links are reported, nothing is written");
    }

    let loans = db::loans::find_with_payment_links(db, &config.scope).await?;
    info!(count = loans.len(), "loans with payment linkage fetched");

    let mut records = Vec::new();
    let mut links_dropped = 0_usize;
    let mut loans_rewritten = 0_usize;

    for loan in &loans {
        let Some(verified) = verify_links(db, loan).await else {
            continue; // probe failed, already logged
        };

        let review = payment_links::prune_payment_links(loan, &verified);
        if review.is_noop() {
            continue;
        }

        warn!(
            loan_id = %loan.id,
            dangling = review.missing.len(),
            total = review.total_links,
            "loan carries dangling payment links"
        );
        links_dropped += review.missing.len();

        let mut applied = false;
        if apply {
            match db::loans::replace_amortization(db, loan.id, &review.installments).await {
                Ok(outcome) if outcome.modified_any() => {
                    info!(loan_id = %loan.id, "pruned schedule written back");
                    applied = true;
                    loans_rewritten += 1;
                }
                Ok(_) => warn!(loan_id = %loan.id, "amortization update matched nothing"),
                Err(error) => {
                    error!(loan_id = %loan.id, %error, "amortization update failed, skipping");
                }
            }
        }

        records.push(LinkReviewRecord {
            loan_id: loan.id.to_hex(),
            total_links: review.total_links,
            missing_links: review.missing,
            pruned_installments: review.pruned_installments,
            applied,
        });
    }

    info!(
        loans = loans.len(),
        flagged = records.len(),
        links_dropped,
        loans_rewritten,
        "link review finished"
    );

    let mut files = Vec::new();
    if !records.is_empty() {
        files.push(
            artifacts.write_json(&format!("payment_link_review_{timestamp}.json"), &records)?,
        );
    }

    let mut summary = SummaryEmail::new("Payment-link review", &timestamp);
    summary
        .metric("Mode", if apply { "apply" } else { "dry run" })
        .metric("Loans scanned", loans.len())
        .metric("Loans with dangling links", records.len())
        .metric("Dangling links found", links_dropped)
        .metric("Loans rewritten", loans_rewritten);
    for file in files {
        summary.file(file);
    }
    super::dispatch_summary(notifier.as_ref(), &summary).await;

    Ok(())
}

/// Probes the payment collection for every linkage id on the loan.
/// `None` means a probe failed; the loan is left untouched rather than
/// pruned on incomplete information.
async fn verify_links(db: &Database, loan: &Loan) -> Option<HashSet<String>> {
    let mut verified = HashSet::new();
    for link in payment_links::collect_links(loan) {
        match db::payments::link_exists(db, loan.id, &link).await {
            Ok(true) => {
                verified.insert(link);
            }
            Ok(false) => {}
            Err(error) => {
                error!(loan_id = %loan.id, link = %link, %error, "link probe failed, skipping loan");
                return None;
            }
        }
    }
    Some(verified)
}
