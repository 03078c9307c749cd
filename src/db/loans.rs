//! Loan collection access.

use futures::TryStreamExt;
use mongodb::bson::{self, Document, doc, oid::ObjectId};
use mongodb::{Collection, Database};

use super::UpdateOutcome;
use crate::config::EntityScope;
use crate::core::dates::LOCAL_OFFSET_SUFFIX;
use crate::entities::{Installment, Loan, STATUS_PAID};
use crate::errors::Result;

/// Collection name in the store.
pub const COLLECTION: &str = "loan";

fn collection(db: &Database) -> Collection<Loan> {
    db.collection(COLLECTION)
}

/// Loans already settled but still carrying a positive arrears counter
/// somewhere in their schedule. Candidate set for the broad repair.
pub async fn find_paid_with_arrears(db: &Database, scope: &EntityScope) -> Result<Vec<Loan>> {
    let filter = doc! {
        "financial_entity_id": { "$in": scope.in_filter() },
        "status": STATUS_PAID,
        "amortization": { "$elemMatch": { "days_in_arrear": { "$gt": 0 } } },
    };
    collection(db)
        .find(filter)
        .await?
        .try_collect()
        .await
        .map_err(Into::into)
}

/// Loans with at least one installment fully paid yet flagged overdue.
/// Candidate set for the strict zero-balance repair; status is not
/// filtered here.
pub async fn find_zero_balance_arrears(db: &Database, scope: &EntityScope) -> Result<Vec<Loan>> {
    let filter = doc! {
        "financial_entity_id": { "$in": scope.in_filter() },
        "amortization": {
            "$elemMatch": {
                "days_in_arrear": { "$gt": 0 },
                "pending_payment": 0,
            }
        },
    };
    collection(db)
        .find(filter)
        .await?
        .try_collect()
        .await
        .map_err(Into::into)
}

/// Loans in scope carrying at least one payment-info linkage entry.
/// Candidate set for the link pruner.
pub async fn find_with_payment_links(db: &Database, scope: &EntityScope) -> Result<Vec<Loan>> {
    let filter = doc! {
        "financial_entity_id": { "$in": scope.in_filter() },
        "amortization": { "$elemMatch": { "payment_info.0": { "$exists": true } } },
    };
    collection(db)
        .find(filter)
        .await?
        .try_collect()
        .await
        .map_err(Into::into)
}

/// Loans whose payment is due on `day` (a `YYYY-MM-DD` string) local time.
/// Dates are stored as strings, so the match is a prefix regex over the
/// local-offset form.
pub async fn find_due_on(db: &Database, day: &str) -> Result<Vec<Loan>> {
    let pattern = format!("^{day}T.*{LOCAL_OFFSET_SUFFIX}$");
    let filter = doc! { "payment_date": { "$regex": pattern } };
    collection(db)
        .find(filter)
        .await?
        .try_collect()
        .await
        .map_err(Into::into)
}

/// Every loan referencing `user_id`, regardless of status.
pub async fn find_by_user(db: &Database, user_id: ObjectId) -> Result<Vec<Loan>> {
    collection(db)
        .find(doc! { "user_id": user_id })
        .await?
        .try_collect()
        .await
        .map_err(Into::into)
}

/// Single-loan lookup by identifier.
pub async fn find_by_id(db: &Database, id: ObjectId) -> Result<Option<Loan>> {
    collection(db)
        .find_one(doc! { "_id": id })
        .await
        .map_err(Into::into)
}

/// Single-loan lookup excluding settled loans, the audit's working view.
pub async fn find_active_by_id(db: &Database, id: ObjectId) -> Result<Option<Loan>> {
    collection(db)
        .find_one(doc! { "_id": id, "status": { "$ne": STATUS_PAID } })
        .await
        .map_err(Into::into)
}

/// Replaces a loan's whole amortization array. Used by the broad repair
/// and the link pruner, which rewrite the schedule as one unit.
pub async fn replace_amortization(
    db: &Database,
    id: ObjectId,
    installments: &[Installment],
) -> Result<UpdateOutcome> {
    let amortization = bson::to_bson(installments)?;
    collection(db)
        .update_one(
            doc! { "_id": id },
            doc! { "$set": { "amortization": amortization } },
        )
        .await
        .map(Into::into)
        .map_err(Into::into)
}

/// Zeroes `days_in_arrear` on one installment by position. The strict
/// repair touches nothing else in the document.
pub async fn clear_arrears_at(
    db: &Database,
    id: ObjectId,
    index: usize,
) -> Result<UpdateOutcome> {
    let mut fields = Document::new();
    fields.insert(format!("amortization.{index}.days_in_arrear"), 0_i32);
    collection(db)
        .update_one(doc! { "_id": id }, doc! { "$set": fields })
        .await
        .map(Into::into)
        .map_err(Into::into)
}

/// Rewrites the stored `payment_date` with its normalized form.
pub async fn set_payment_date(db: &Database, id: ObjectId, value: &str) -> Result<UpdateOutcome> {
    set_date_field(db, id, "payment_date", value).await
}

/// Rewrites the stored `limit_payment_date` with its normalized form.
pub async fn set_limit_payment_date(
    db: &Database,
    id: ObjectId,
    value: &str,
) -> Result<UpdateOutcome> {
    set_date_field(db, id, "limit_payment_date", value).await
}

async fn set_date_field(
    db: &Database,
    id: ObjectId,
    field: &str,
    value: &str,
) -> Result<UpdateOutcome> {
    let mut fields = Document::new();
    fields.insert(field, value);
    collection(db)
        .update_one(doc! { "_id": id }, doc! { "$set": fields })
        .await
        .map(Into::into)
        .map_err(Into::into)
}
