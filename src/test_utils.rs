//! Shared test utilities for `loanwarden`.
//!
//! Fixture builders with sensible defaults for the entities the
//! reconciliation rules operate on. All pure; no store required.

use mongodb::bson::{Bson, Document, oid::ObjectId};

use crate::entities::{
    INTEGER_FIELDS, Installment, Loan, Payment, PaymentTransaction, STATUS_ACTIVE,
    TransactionDetails,
};

/// An installment with every designated integer field present and
/// properly typed, all zeroed.
pub fn well_typed_installment() -> Installment {
    let mut fields = Document::new();
    fields.insert("id", "installment-1");
    for field in INTEGER_FIELDS {
        fields.insert(*field, 0_i32);
    }
    Installment::new(fields)
}

/// A well-typed installment with the given arrears counter and pending
/// balance, and no payment linkage.
pub fn installment(days_in_arrear: i64, pending_payment: i64) -> Installment {
    let mut fields = well_typed_installment().as_document().clone();
    fields.insert("days_in_arrear", days_in_arrear);
    fields.insert("pending_payment", pending_payment);
    Installment::new(fields)
}

/// Like [`installment`], plus linked payment-transaction ids.
pub fn installment_with_links(
    days_in_arrear: i64,
    pending_payment: i64,
    links: &[&str],
) -> Installment {
    let mut fields = installment(days_in_arrear, pending_payment)
        .as_document()
        .clone();
    fields.insert(
        "payment_info",
        Bson::Array(links.iter().map(|link| Bson::String((*link).to_owned())).collect()),
    );
    Installment::new(fields)
}

/// An active loan with the given amortization schedule.
pub fn loan_with_installments(amortization: Vec<Installment>) -> Loan {
    Loan {
        id: ObjectId::new(),
        financial_entity_id: Some("entity-1".to_owned()),
        status: STATUS_ACTIVE.to_owned(),
        user_id: None,
        payment_date: None,
        limit_payment_date: None,
        amortization,
        extra: Document::new(),
    }
}

/// A loan with the given status and an empty schedule.
pub fn loan_with_status(status: &str) -> Loan {
    let mut loan = loan_with_installments(Vec::new());
    loan.status = status.to_owned();
    loan
}

/// A loan owned by the given borrower.
pub fn loan_for_user(user_id: ObjectId) -> Loan {
    let mut loan = loan_with_installments(Vec::new());
    loan.user_id = Some(user_id);
    loan
}

/// A payment against the given loan carrying the given transactions.
pub fn payment_for_loan(loan: &Loan, transactions: Vec<PaymentTransaction>) -> Payment {
    Payment {
        id: ObjectId::new(),
        loan_id: Some(loan.id),
        date: Some("2025-08-05".to_owned()),
        financial_entity_id: loan.financial_entity_id.clone(),
        transactions,
        extra: Document::new(),
    }
}

/// A payment transaction targeting the given 1-indexed term.
pub fn transaction_for_term(id: &str, term: i64) -> PaymentTransaction {
    PaymentTransaction {
        id: Some(id.to_owned()),
        details: TransactionDetails {
            term: Some(term),
            extra: Document::new(),
        },
        extra: Document::new(),
    }
}
