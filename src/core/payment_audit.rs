//! Payment application audit - Finds payments never linked to their
//! installment.
//!
//! Cross-references each payment's transactions against the targeted loan's
//! amortization schedule. A transaction names the installment it paid via
//! `details.term`; if that installment's `payment_info` linkage is empty,
//! the payment was recorded but never applied. This is a pure audit: it
//! reports findings and flags inconsistent loans, and never mutates data.

use std::collections::BTreeSet;

use crate::entities::{Loan, Payment};
use serde::Serialize;
use tracing::warn;

/// Fixed issue tag written to the findings CSV.
pub const ISSUE_PAYMENT_INFO_EMPTY: &str = "payment_info_empty";

/// One unapplied-payment finding: a (payment, term) pair whose installment
/// carries no linkage. Field order matches the export columns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UnappliedPayment {
    /// The payment that claims to have paid the term
    pub payment_id: String,
    /// The loan the payment belongs to
    pub loan_id: String,
    /// Comma-joined ids of this payment's transactions targeting the term
    pub transaction_ids: String,
    /// 1-indexed installment term
    pub term: i64,
    /// Always [`ISSUE_PAYMENT_INFO_EMPTY`]
    pub issue: &'static str,
}

/// What the loan lookup for a payment produced.
#[derive(Clone, Copy, Debug)]
pub enum LoanLookup<'a> {
    /// No loan document matches the payment's `loan_id`
    Missing,
    /// The loan exists but is settled; settled loans are out of audit scope
    AlreadyPaid,
    /// The loan to audit against
    Found(&'a Loan),
}

/// Outcome of auditing a single payment.
#[derive(Clone, Debug, Default)]
pub struct PaymentAudit {
    /// One entry per affected (payment, term) pair
    pub findings: Vec<UnappliedPayment>,
    /// Whether this payment exposed an inconsistency on its loan
    pub inconsistent: bool,
    /// Whether the payment was skipped (settled loan), not an error
    pub skipped: bool,
}

/// Audits one payment against its loan.
///
/// Terms outside `[1, installment_count]` are inconsistencies (stale
/// references after schedule edits); valid terms are deduplicated so a
/// payment with several transactions on one term is evaluated once.
#[must_use]
pub fn audit_payment(payment: &Payment, loan: LoanLookup<'_>) -> PaymentAudit {
    let mut audit = PaymentAudit::default();

    let loan = match loan {
        LoanLookup::AlreadyPaid => {
            audit.skipped = true;
            return audit;
        }
        LoanLookup::Missing => {
            warn!(loan_id = %payment_loan_id(payment), "loan referenced by payment not found");
            audit.inconsistent = true;
            return audit;
        }
        LoanLookup::Found(loan) => loan,
    };

    if loan.amortization.is_empty() {
        warn!(loan_id = %loan.id, "loan has no amortization schedule");
        audit.inconsistent = true;
        return audit;
    }

    let (terms, saw_invalid_term) = referenced_terms(payment, loan.amortization.len());
    if saw_invalid_term {
        audit.inconsistent = true;
    }

    audit
        .findings
        .extend(unapplied_findings(payment, loan, &terms));
    if !audit.findings.is_empty() {
        audit.inconsistent = true;
    }

    audit
}

/// Collects the valid terms this payment's transactions reference,
/// deduplicated, plus whether any out-of-range reference was seen.
fn referenced_terms(payment: &Payment, installment_count: usize) -> (BTreeSet<i64>, bool) {
    let mut terms = BTreeSet::new();
    let mut saw_invalid = false;

    for transaction in &payment.transactions {
        let term = transaction.details.term.unwrap_or(0);
        if term < 1 || term as usize > installment_count {
            warn!(
                payment_id = %payment.id,
                loan_id = %payment_loan_id(payment),
                term,
                installment_count,
                "transaction references a term outside the schedule"
            );
            saw_invalid = true;
            continue;
        }
        terms.insert(term);
    }

    (terms, saw_invalid)
}

/// The findings for one payment as a lazy, restartable sequence: one record
/// per referenced term whose installment has an empty `payment_info`.
pub fn unapplied_findings<'a>(
    payment: &'a Payment,
    loan: &'a Loan,
    terms: &'a BTreeSet<i64>,
) -> impl Iterator<Item = UnappliedPayment> + 'a {
    terms
        .iter()
        .copied()
        .filter(|term| {
            loan.amortization
                .get((term - 1) as usize)
                .is_some_and(|installment| !installment.has_payment_info())
        })
        .map(|term| UnappliedPayment {
            payment_id: payment.id.to_hex(),
            loan_id: loan.id.to_hex(),
            transaction_ids: transaction_ids_for_term(payment, term),
            term,
            issue: ISSUE_PAYMENT_INFO_EMPTY,
        })
}

/// Comma-joined ids of this payment's transactions targeting `term`.
fn transaction_ids_for_term(payment: &Payment, term: i64) -> String {
    payment
        .transactions
        .iter()
        .filter(|transaction| transaction.details.term == Some(term))
        .filter_map(|transaction| transaction.id.as_deref())
        .collect::<Vec<_>>()
        .join(",")
}

/// The loan id a payment points at, for logs and the inconsistency ledger.
#[must_use]
pub fn payment_loan_id(payment: &Payment) -> String {
    payment
        .loan_id
        .map_or_else(|| "unknown".to_owned(), |id| id.to_hex())
}

/// Accumulates inconsistent loan ids across a whole batch, deduplicated
/// and lexicographically sorted.
#[derive(Clone, Debug, Default)]
pub struct InconsistencyLedger {
    loan_ids: BTreeSet<String>,
}

impl InconsistencyLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Notes one inconsistent loan. Repeats are absorbed.
    pub fn note(&mut self, loan_id: impl Into<String>) {
        self.loan_ids.insert(loan_id.into());
    }

    /// Number of distinct loans noted so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.loan_ids.len()
    }

    /// Whether anything was noted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.loan_ids.is_empty()
    }

    /// The distinct loan ids, sorted.
    #[must_use]
    pub fn into_sorted_ids(self) -> Vec<String> {
        self.loan_ids.into_iter().collect()
    }
}
