//! Unapplied-payment audit: cross-references payment transactions against
//! installment linkage and reports what was paid but never applied.
//! Read-only against the store.

use mongodb::Database;
use tracing::{debug, error, info};

use crate::artifacts::ArtifactStore;
use crate::cli::DateRange;
use crate::config::AppConfig;
use crate::core::dates;
use crate::core::payment_audit::{
    self, InconsistencyLedger, LoanLookup, UnappliedPayment,
};
use crate::db;
use crate::entities::{Payment, STATUS_PAID};
use crate::errors::Result;
use crate::notify::{Notifier, SummaryEmail};

/// How many days back the rolling `recent` window reaches.
const RECENT_WINDOW_DAYS: i64 = 2;

/// Runs the payment-application audit over the selected date range.
pub async fn run(
    db: &Database,
    config: &AppConfig,
    range: DateRange,
    limit: Option<i64>,
) -> Result<()> {
    let timestamp = super::run_timestamp();
    let artifacts = ArtifactStore::open(&config.backup_dir)?;
    let notifier = config.email.clone().map(Notifier::new);

    if let Some(limit) = limit {
        info!(limit, "test mode: capping processed payments");
    }

    let payments = match range.month_window() {
        Some(window) => {
            db::payments::find_in_window(db, window, Some(&config.scope), limit).await?
        }
        None => {
            let since = dates::utc_day_days_ago(RECENT_WINDOW_DAYS);
            db::payments::find_since(db, &since, limit).await?
        }
    };
    info!(range = range.label(), count = payments.len(), "payments fetched");

    let mut findings: Vec<UnappliedPayment> = Vec::new();
    let mut ledger = InconsistencyLedger::new();
    let mut skipped_settled = 0_usize;

    for (position, payment) in payments.iter().enumerate() {
        debug!(
            payment_id = %payment.id,
            position = position + 1,
            total = payments.len(),
            "auditing payment"
        );

        let Some(lookup) = lookup_loan(db, payment).await else {
            continue; // lookup failed, already logged
        };

        let loan = lookup.as_ref();
        let audit = payment_audit::audit_payment(payment, loan);
        if audit.skipped {
            skipped_settled += 1;
        }
        if audit.inconsistent {
            ledger.note(payment_audit::payment_loan_id(payment));
        }
        findings.extend(audit.findings);
    }

    info!(
        payments = payments.len(),
        unapplied = findings.len(),
        inconsistent_loans = ledger.len(),
        skipped_settled,
        "audit finished"
    );

    let suffix = artifact_suffix(range, limit);
    let mut files = Vec::new();
    if findings.is_empty() {
        info!("no unapplied transactions to export");
    } else {
        files.push(
            artifacts.write_unapplied_csv(&format!("unapplied_transactions_{suffix}.csv"), &findings)?,
        );
    }

    let inconsistent_count = ledger.len();
    if ledger.is_empty() {
        info!("no inconsistent loans found");
    } else {
        let header = format!("Loan ids with inconsistencies found ({}):", range.label());
        files.push(artifacts.write_loan_id_list(
            &format!("inconsistent_loans_{suffix}.txt"),
            &header,
            &ledger.into_sorted_ids(),
        )?);
    }

    let mut summary = SummaryEmail::new("Unapplied-payment audit", &timestamp);
    summary
        .metric("Date range", range.label())
        .metric("Payments processed", payments.len())
        .metric("Unapplied transactions", findings.len())
        .metric("Inconsistent loans", inconsistent_count);
    for file in files {
        summary.file(file);
    }
    super::dispatch_summary(notifier.as_ref(), &summary).await;

    Ok(())
}

/// Owned counterpart of [`LoanLookup`], so the store round trip can happen
/// outside the pure audit.
enum OwnedLookup {
    Missing,
    AlreadyPaid,
    Found(Box<crate::entities::Loan>),
}

impl OwnedLookup {
    fn as_ref(&self) -> LoanLookup<'_> {
        match self {
            Self::Missing => LoanLookup::Missing,
            Self::AlreadyPaid => LoanLookup::AlreadyPaid,
            Self::Found(loan) => LoanLookup::Found(loan),
        }
    }
}

/// Resolves the loan a payment points at. `None` means the lookup itself
/// failed and the payment is skipped under the per-document failure policy.
async fn lookup_loan(db: &Database, payment: &Payment) -> Option<OwnedLookup> {
    let Some(loan_id) = payment.loan_id else {
        return Some(OwnedLookup::Missing);
    };

    match db::loans::find_active_by_id(db, loan_id).await {
        Ok(Some(loan)) => Some(OwnedLookup::Found(Box::new(loan))),
        Ok(None) => match db::loans::find_by_id(db, loan_id).await {
            Ok(Some(loan)) if loan.status == STATUS_PAID => {
                debug!(loan_id = %loan_id, "loan already settled, payment skipped");
                Some(OwnedLookup::AlreadyPaid)
            }
            Ok(_) => Some(OwnedLookup::Missing),
            Err(err) => {
                error!(loan_id = %loan_id, error = %err, "loan lookup failed, skipping payment");
                None
            }
        },
        Err(err) => {
            error!(loan_id = %loan_id, error = %err, "loan lookup failed, skipping payment");
            None
        }
    }
}

/// Artifact name suffix: the range tag plus a test marker when capped.
fn artifact_suffix(range: DateRange, limit: Option<i64>) -> String {
    match limit {
        Some(limit) => format!("{}_test_{limit}", range.file_suffix()),
        None => range.file_suffix().to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_carries_test_marker_only_when_capped() {
        assert_eq!(artifact_suffix(DateRange::August, None), "august_2025");
        assert_eq!(
            artifact_suffix(DateRange::Recent, Some(50)),
            "recent_test_50"
        );
    }
}
