//! User collection access.

use mongodb::bson::{doc, oid::ObjectId};
use mongodb::{Collection, Database};

use super::UpdateOutcome;
use crate::entities::{STATUS_ACTIVE, User};
use crate::errors::Result;

/// Collection name in the store.
pub const COLLECTION: &str = "user";

fn collection(db: &Database) -> Collection<User> {
    db.collection(COLLECTION)
}

/// Single-user lookup by identifier.
pub async fn find_by_id(db: &Database, id: ObjectId) -> Result<Option<User>> {
    collection(db)
        .find_one(doc! { "_id": id })
        .await
        .map_err(Into::into)
}

/// Flips a user's status to "active". The decision is made by the status
/// reconciler; this only issues the write.
pub async fn mark_active(db: &Database, id: ObjectId) -> Result<UpdateOutcome> {
    collection(db)
        .update_one(doc! { "_id": id }, doc! { "$set": { "status": STATUS_ACTIVE } })
        .await
        .map(Into::into)
        .map_err(Into::into)
}
