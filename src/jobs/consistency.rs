//! Full consistency pass: due-date normalization, broad arrears repair,
//! and user-status validation over the touched borrowers.

use mongodb::Database;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::artifacts::ArtifactStore;
use crate::config::AppConfig;
use crate::core::arrears::{self, ClearedInstallment, SchemaViolation};
use crate::core::dates;
use crate::core::user_status::{self, StatusReview};
use crate::db;
use crate::entities::{Loan, STATUS_ACTIVE, STATUS_ARREAR};
use crate::errors::Result;
use crate::notify::{Notifier, SummaryEmail};

/// Per-loan record of what the broad repair changed, persisted as a JSON
/// artifact.
#[derive(Clone, Debug, Serialize)]
struct LoanRepairRecord {
    loan_id: String,
    elements_updated: usize,
    arrear_elements: Vec<ClearedInstallment>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    schema_violations: Vec<SchemaViolation>,
}

/// Per-user record of the status validation, persisted as a JSON artifact.
#[derive(Clone, Debug, Serialize)]
struct UserValidationRecord {
    user_id: String,
    user_status: String,
    user_found: bool,
    #[serde(flatten)]
    review: Option<StatusReview>,
    status_updated: bool,
}

/// Per-user record of an applied status flip, persisted as a JSON artifact.
#[derive(Clone, Debug, Serialize)]
struct UserUpdateRecord {
    user_id: String,
    old_status: &'static str,
    new_status: &'static str,
    reason: &'static str,
}

/// Runs the full consistency pass.
pub async fn run(db: &Database, config: &AppConfig) -> Result<()> {
    let timestamp = super::run_timestamp();
    let artifacts = ArtifactStore::open(&config.backup_dir)?;
    let notifier = config.email.clone().map(Notifier::new);
    let mut files = Vec::new();

    files.extend(normalize_due_dates(db, &artifacts, &timestamp).await?);

    let loans = db::loans::find_paid_with_arrears(db, &config.scope).await?;
    info!(count = loans.len(), "settled loans with stale arrears fetched");
    if loans.is_empty() {
        info!("nothing matches the repair criteria, run ends here");
        return Ok(());
    }

    files.push(artifacts.write_json(&format!("loan_documents_{timestamp}.json"), &loans)?);

    let repairs = repair_arrears(db, &loans).await;
    let (validations, updates) = validate_user_statuses(db, &loans).await;

    files.push(artifacts.write_json(&format!("user_validation_{timestamp}.json"), &validations)?);
    if !updates.is_empty() {
        files.push(artifacts.write_json(&format!("user_updates_{timestamp}.json"), &updates)?);
    }
    if !repairs.is_empty() {
        files.push(
            artifacts.write_json(&format!("amortization_updates_{timestamp}.json"), &repairs)?,
        );
    }

    let installments_repaired: usize = repairs.iter().map(|r| r.elements_updated).sum();
    info!(
        loans = loans.len(),
        loans_repaired = repairs.len(),
        installments_repaired,
        users_validated = validations.len(),
        users_updated = updates.len(),
        "consistency pass finished"
    );

    let mut summary = SummaryEmail::new("Consistency sweep", &timestamp);
    summary
        .metric("Loan documents found", loans.len())
        .metric("Loans with amortization repaired", repairs.len())
        .metric("Installments repaired", installments_repaired)
        .metric("Users validated", validations.len())
        .metric("Users updated", updates.len());
    for file in files {
        summary.file(file);
    }
    super::dispatch_summary(notifier.as_ref(), &summary).await;

    Ok(())
}

/// Normalizes the payment dates of loans due today. Returns the artifact
/// file names it produced.
async fn normalize_due_dates(
    db: &Database,
    artifacts: &ArtifactStore,
    timestamp: &str,
) -> Result<Vec<String>> {
    let today = dates::local_today();
    let due = db::loans::find_due_on(db, &today).await?;
    info!(day = %today, count = due.len(), "loans due today fetched");
    if due.is_empty() {
        return Ok(Vec::new());
    }

    let file = artifacts.write_json(&format!("payment_loan_documents_{timestamp}.json"), &due)?;

    for loan in &due {
        if let Some(raw) = loan.payment_date.as_deref() {
            apply_normalized_date(db, loan, "payment_date", raw).await;
        }
        if let Some(raw) = loan.limit_payment_date.as_deref() {
            apply_normalized_date(db, loan, "limit_payment_date", raw).await;
        }
    }

    Ok(vec![file])
}

/// Writes one normalized date back, skipping the write when the stored
/// value is already canonical. Failures are logged, never fatal.
async fn apply_normalized_date(db: &Database, loan: &Loan, field: &str, raw: &str) {
    let normalized = dates::normalize(raw);
    if normalized == raw {
        debug!(loan_id = %loan.id, field, "date already canonical, no write");
        return;
    }

    let write = match field {
        "payment_date" => db::loans::set_payment_date(db, loan.id, &normalized).await,
        _ => db::loans::set_limit_payment_date(db, loan.id, &normalized).await,
    };
    match write {
        Ok(outcome) if outcome.modified_any() => {
            debug!(loan_id = %loan.id, field, original = raw, normalized = %normalized, "date normalized");
        }
        Ok(_) => warn!(loan_id = %loan.id, field, "date update matched nothing"),
        Err(error) => error!(loan_id = %loan.id, field, %error, "date update failed, skipping"),
    }
}

/// Applies the broad arrears rule loan by loan.
async fn repair_arrears(db: &Database, loans: &[Loan]) -> Vec<LoanRepairRecord> {
    let mut records = Vec::new();

    for loan in loans {
        if loan.amortization.is_empty() {
            warn!(loan_id = %loan.id, "loan has no amortization schedule, skipping");
            continue;
        }

        let repair = arrears::reconcile_arrears(loan);
        if repair.is_noop() {
            debug!(loan_id = %loan.id, "no stale arrears counters on this loan");
            continue;
        }

        match db::loans::replace_amortization(db, loan.id, &repair.installments).await {
            Ok(outcome) if outcome.modified_any() => {
                info!(
                    loan_id = %loan.id,
                    cleared = repair.cleared.len(),
                    "amortization schedule repaired"
                );
                records.push(LoanRepairRecord {
                    loan_id: loan.id.to_hex(),
                    elements_updated: repair.cleared.len(),
                    arrear_elements: repair.cleared,
                    schema_violations: repair.violations,
                });
            }
            Ok(_) => warn!(loan_id = %loan.id, "amortization update matched nothing"),
            Err(error) => {
                error!(loan_id = %loan.id, %error, "amortization update failed, skipping");
            }
        }
    }

    records
}

/// Validates the aggregate status of every borrower the fetched loans
/// touch, each at most once.
async fn validate_user_statuses(
    db: &Database,
    loans: &[Loan],
) -> (Vec<UserValidationRecord>, Vec<UserUpdateRecord>) {
    let mut validations = Vec::new();
    let mut updates = Vec::new();

    for user_id in deduplicated_user_ids(loans) {
        let user = match db::users::find_by_id(db, user_id).await {
            Ok(user) => user,
            Err(error) => {
                error!(user_id = %user_id, %error, "user lookup failed, skipping");
                continue;
            }
        };

        let Some(user) = user else {
            warn!(user_id = %user_id, "user referenced by loan not found");
            validations.push(UserValidationRecord {
                user_id: user_id.to_hex(),
                user_status: "not found".to_owned(),
                user_found: false,
                review: None,
                status_updated: false,
            });
            continue;
        };

        if user.status != STATUS_ARREAR {
            debug!(user_id = %user_id, status = %user.status, "user not in arrears, recorded only");
            validations.push(UserValidationRecord {
                user_id: user_id.to_hex(),
                user_status: user.status,
                user_found: true,
                review: None,
                status_updated: false,
            });
            continue;
        }

        let portfolio = match db::loans::find_by_user(db, user_id).await {
            Ok(portfolio) => portfolio,
            Err(error) => {
                error!(user_id = %user_id, %error, "portfolio fetch failed, skipping user");
                continue;
            }
        };

        let review = user_status::review_arrear_user(&portfolio);
        let mut status_updated = false;
        if review.should_update {
            match db::users::mark_active(db, user_id).await {
                Ok(outcome) if outcome.modified_any() => {
                    info!(user_id = %user_id, reason = review.reason, "user back to active");
                    status_updated = true;
                    updates.push(UserUpdateRecord {
                        user_id: user_id.to_hex(),
                        old_status: STATUS_ARREAR,
                        new_status: STATUS_ACTIVE,
                        reason: review.reason,
                    });
                }
                Ok(_) => warn!(user_id = %user_id, "status update matched nothing"),
                Err(error) => error!(user_id = %user_id, %error, "status update failed, skipping"),
            }
        } else {
            info!(
                user_id = %user_id,
                arrear_loans = review.arrear_loans,
                "portfolio still mixed, user stays in arrears"
            );
        }

        validations.push(UserValidationRecord {
            user_id: user_id.to_hex(),
            user_status: STATUS_ARREAR.to_owned(),
            user_found: true,
            review: Some(review),
            status_updated,
        });
    }

    (validations, updates)
}

/// The borrowers the fetched loans reference, first-seen order, each once.
fn deduplicated_user_ids(loans: &[Loan]) -> Vec<mongodb::bson::oid::ObjectId> {
    let mut seen = std::collections::HashSet::new();
    let mut user_ids = Vec::new();
    for loan in loans {
        if let Some(user_id) = loan.user_id {
            if seen.insert(user_id) {
                user_ids.push(user_id);
            }
        }
    }
    user_ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{loan_for_user, loan_with_installments};
    use mongodb::bson::oid::ObjectId;

    #[test]
    fn user_ids_are_deduplicated_in_first_seen_order() {
        let alice = ObjectId::new();
        let bob = ObjectId::new();
        let loans = vec![
            loan_for_user(alice),
            loan_for_user(bob),
            loan_for_user(alice),
        ];

        assert_eq!(deduplicated_user_ids(&loans), vec![alice, bob]);
    }

    #[test]
    fn loans_without_users_contribute_nothing() {
        let loans = vec![loan_with_installments(vec![])];
        assert!(deduplicated_user_ids(&loans).is_empty());
    }
}
