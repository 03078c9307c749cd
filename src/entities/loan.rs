//! Loan entity - A loan document with its amortization schedule.
//!
//! Loans are created and normally mutated by the external loan-servicing
//! system; this tool only applies targeted field-level corrections. Unknown
//! fields are carried through `extra` so raw-fetch backups and whole-array
//! rewrites round-trip data we do not model.

use mongodb::bson::{Bson, Document, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// Loan status once every installment is settled.
pub const STATUS_PAID: &str = "paid";
/// Loan or user status while at least one installment is overdue.
pub const STATUS_ARREAR: &str = "arrear";
/// Healthy loan or user status.
pub const STATUS_ACTIVE: &str = "active";

/// Installment fields that must hold integer values (currency in minor
/// units and day counts). A float on any of these signals a prior
/// data-corruption bug upstream and is reported as an anomaly, never
/// silently coerced on write. Extending the check is a data change here,
/// not a code change in the reconciler.
pub const INTEGER_FIELDS: &[&str] = &[
    "principal",
    "total_amount",
    "principal_payment_amount",
    "interest_amount",
    "taxes",
    "days_in_arrear",
    "pending_payment",
    "arrear_interest_amount",
    "pending_principal_payment_amount",
    "pending_interest_amount",
    "pending_interest_taxes_amount",
    "pending_arrear_interest_amount",
    "pending_guarantee_amount",
    "pending_guarantee_taxes_amount",
    "pending_other_expenses_amount",
    "period_days",
    "interest_taxes_amount",
    "guarantee_amount",
    "guarantee_taxes_amount",
    "other_expenses_amount",
    "arrear_interest_paid",
    "arrear_interest_taxes_amount",
    "pending_arrear_interest_taxes_amount",
];

/// A loan document. `amortization` is the ordered installment schedule;
/// index = term number - 1.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    /// Store identifier
    #[serde(rename = "_id")]
    pub id: ObjectId,
    /// Originating financial entity; gates which loans a run touches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financial_entity_id: Option<String>,
    /// Loan status ("active", "paid", "arrear", ...)
    #[serde(default)]
    pub status: String,
    /// Borrower reference; many loans may share one user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<ObjectId>,
    /// Next scheduled payment date, stored as a date-time string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<String>,
    /// Due-date limit for the next payment, stored as a date-time string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_payment_date: Option<String>,
    /// Ordered installment schedule, owned exclusively by this loan
    #[serde(default)]
    pub amortization: Vec<Installment>,
    /// Fields this tool does not model, preserved verbatim
    #[serde(flatten)]
    pub extra: Document,
}

/// One installment of a loan's amortization schedule.
///
/// Kept as a transparent wrapper over the raw document: the schedule carries
/// twenty-odd numeric fields plus whatever the servicing system adds over
/// time, and repairs must rewrite the array without dropping any of them.
/// Typed access goes through the methods below.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Installment {
    fields: Document,
}

impl Installment {
    /// Wraps a raw installment document.
    #[must_use]
    pub const fn new(fields: Document) -> Self {
        Self { fields }
    }

    /// The installment's own identifier, when the store recorded one.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.fields.get_str("id").ok()
    }

    /// Days overdue, coerced like the rest of the pipeline reads it:
    /// missing or non-numeric counts as 0, floats truncate. The known
    /// float-corruption bug is surfaced by the schema check, not here.
    #[must_use]
    pub fn days_in_arrear(&self) -> i64 {
        self.integer_value("days_in_arrear").unwrap_or(0)
    }

    /// Amount still owed on this installment. `None` when the field is
    /// missing or not numeric, which callers treat as a data anomaly.
    #[must_use]
    pub fn pending_payment(&self) -> Option<i64> {
        self.integer_value("pending_payment")
    }

    /// Whether any payment transaction has been linked to this installment.
    #[must_use]
    pub fn has_payment_info(&self) -> bool {
        self.fields
            .get_array("payment_info")
            .map(|entries| !entries.is_empty())
            .unwrap_or(false)
    }

    /// The payment-transaction identifiers linked to this installment.
    #[must_use]
    pub fn payment_info(&self) -> Vec<String> {
        self.fields
            .get_array("payment_info")
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| entry.as_str().map(str::to_owned))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Replaces the linked payment-transaction identifiers.
    pub fn set_payment_info(&mut self, ids: Vec<String>) {
        self.fields.insert(
            "payment_info",
            Bson::Array(ids.into_iter().map(Bson::String).collect()),
        );
    }

    /// Zeroes the arrears counter, leaving every other field untouched.
    pub fn clear_days_in_arrear(&mut self) {
        self.fields.insert("days_in_arrear", 0_i32);
    }

    /// Reads a numeric field as an integer. Doubles truncate; anything
    /// else is `None`.
    #[must_use]
    pub fn integer_value(&self, field: &str) -> Option<i64> {
        match self.fields.get(field) {
            Some(Bson::Int32(value)) => Some(i64::from(*value)),
            Some(Bson::Int64(value)) => Some(*value),
            #[allow(clippy::cast_possible_truncation)]
            Some(Bson::Double(value)) => Some(*value as i64),
            _ => None,
        }
    }

    /// Whether `field` holds a properly typed integer value.
    #[must_use]
    pub fn holds_integer(&self, field: &str) -> bool {
        matches!(
            self.fields.get(field),
            Some(Bson::Int32(_) | Bson::Int64(_))
        )
    }

    /// The raw document, for callers that need untyped access.
    #[must_use]
    pub const fn as_document(&self) -> &Document {
        &self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[test]
    fn days_in_arrear_defaults_to_zero() {
        let installment = Installment::new(doc! { "principal": 1000 });
        assert_eq!(installment.days_in_arrear(), 0);
    }

    #[test]
    fn days_in_arrear_truncates_doubles() {
        let installment = Installment::new(doc! { "days_in_arrear": 3.7 });
        assert_eq!(installment.days_in_arrear(), 3);
    }

    #[test]
    fn pending_payment_is_none_for_non_numeric() {
        let installment = Installment::new(doc! { "pending_payment": "0" });
        assert_eq!(installment.pending_payment(), None);
    }

    #[test]
    fn holds_integer_rejects_doubles() {
        let installment = Installment::new(doc! {
            "principal": 1000_i64,
            "taxes": 19.0,
        });
        assert!(installment.holds_integer("principal"));
        assert!(!installment.holds_integer("taxes"));
        assert!(!installment.holds_integer("total_amount"));
    }

    #[test]
    fn clear_days_in_arrear_preserves_other_fields() {
        let mut installment = Installment::new(doc! {
            "days_in_arrear": 12,
            "principal": 5000,
            "payment_info": ["tx-1"],
        });
        installment.clear_days_in_arrear();
        assert_eq!(installment.days_in_arrear(), 0);
        assert_eq!(installment.integer_value("principal"), Some(5000));
        assert!(installment.has_payment_info());
    }

    #[test]
    fn payment_info_reads_string_entries() {
        let installment = Installment::new(doc! { "payment_info": ["a", "b"] });
        assert_eq!(installment.payment_info(), vec!["a", "b"]);
        assert!(installment.has_payment_info());

        let empty = Installment::new(doc! { "payment_info": [] });
        assert!(!empty.has_payment_info());
    }
}
