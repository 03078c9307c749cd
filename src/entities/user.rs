//! User entity - A borrower shared by all of their loans.

use mongodb::bson::{Document, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// A borrower document. Users do not own their loans; loans point back at
/// the user through `user_id`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Store identifier
    #[serde(rename = "_id")]
    pub id: ObjectId,
    /// Aggregate status derived from the user's loans
    /// ("active", "arrear", ...)
    #[serde(default)]
    pub status: String,
    /// Fields this tool does not model, preserved verbatim
    #[serde(flatten)]
    pub extra: Document,
}
