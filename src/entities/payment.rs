//! Payment entity - A payment with the transactions it settled.
//!
//! Each transaction targets one installment of the referenced loan via
//! `details.term` (1-indexed). The auditor cross-references these against
//! the loan's `payment_info` linkage; nothing here is ever written back.

use mongodb::bson::{Document, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// A payment document recorded by the servicing system.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    /// Store identifier
    #[serde(rename = "_id")]
    pub id: ObjectId,
    /// The loan this payment was made against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan_id: Option<ObjectId>,
    /// Payment date as a date string, used for range selection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Originating financial entity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financial_entity_id: Option<String>,
    /// Ordered transaction records carried by this payment
    #[serde(default)]
    pub transactions: Vec<PaymentTransaction>,
    /// Fields this tool does not model, preserved verbatim
    #[serde(flatten)]
    pub extra: Document,
}

/// One transaction inside a payment.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentTransaction {
    /// Transaction identifier, the value recorded in installment
    /// `payment_info` arrays
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// What this transaction paid
    #[serde(default)]
    pub details: TransactionDetails,
    /// Fields this tool does not model, preserved verbatim
    #[serde(flatten)]
    pub extra: Document,
}

/// Application details of a transaction.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionDetails {
    /// 1-indexed installment term this transaction targets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term: Option<i64>,
    /// Fields this tool does not model, preserved verbatim
    #[serde(flatten)]
    pub extra: Document,
}
