//! Payment collection access. Read-only: the audit never mutates payments.

use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::{Collection, Database};

use crate::config::EntityScope;
use crate::entities::Payment;
use crate::errors::Result;

/// Collection name in the store.
pub const COLLECTION: &str = "payment";

fn collection(db: &Database) -> Collection<Payment> {
    db.collection(COLLECTION)
}

/// Payments inside a `[start, end)` calendar window, optionally restricted
/// to the entity scope and capped at `limit` rows. Dates are stored as
/// strings, so the bounds compare lexicographically.
pub async fn find_in_window(
    db: &Database,
    window: (&str, &str),
    scope: Option<&EntityScope>,
    limit: Option<i64>,
) -> Result<Vec<Payment>> {
    let (start, end) = window;
    let mut filter = doc! { "date": { "$gte": start, "$lt": end } };
    if let Some(scope) = scope {
        filter.insert("financial_entity_id", doc! { "$in": scope.in_filter() });
    }

    let coll = collection(db);
    let find = coll.find(filter);
    let find = match limit {
        Some(limit) => find.limit(limit),
        None => find,
    };
    find.await?.try_collect().await.map_err(Into::into)
}

/// Payments dated on or after `day` (a `YYYY-MM-DD` string), capped at
/// `limit` rows when given.
pub async fn find_since(db: &Database, day: &str, limit: Option<i64>) -> Result<Vec<Payment>> {
    let coll = collection(db);
    let find = coll.find(doc! { "date": { "$gte": day } });
    let find = match limit {
        Some(limit) => find.limit(limit),
        None => find,
    };
    find.await?.try_collect().await.map_err(Into::into)
}

/// Whether a transaction with this id exists on some payment of the loan.
/// Probe used by the link pruner before dropping a `payment_info` entry.
pub async fn link_exists(db: &Database, loan_id: ObjectId, transaction_id: &str) -> Result<bool> {
    collection(db)
        .find_one(doc! { "transactions.id": transaction_id, "loan_id": loan_id })
        .await
        .map(|found| found.is_some())
        .map_err(Into::into)
}
