//! Arrears reconciliation - Clears stale `days_in_arrear` flags.
//!
//! Two distinct repair policies live here and are never merged: the broad
//! rule clears *any* positive arrears counter (used on loans already marked
//! paid), while the strict rule only targets installments that are fully
//! paid (`pending_payment == 0`) yet still flagged overdue. Which one runs
//! is decided by the routine that invokes it. Both are idempotent: a second
//! pass over repaired data finds nothing to clear.

use crate::entities::{INTEGER_FIELDS, Installment, Loan};
use tracing::warn;

/// One installment cleared by the broad rule: where it sat and what the
/// stale counter said.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct ClearedInstallment {
    /// Position in the amortization schedule (term number - 1)
    pub index: usize,
    /// The stale counter value before the repair
    pub days_in_arrear: i64,
}

/// An installment whose designated integer fields hold the wrong numeric
/// kind. An audit signal only; it never blocks the repair.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct SchemaViolation {
    /// Identifier of the offending installment, when it carries one
    pub installment_id: Option<String>,
    /// The fields that were missing or not integer-typed
    pub fields: Vec<&'static str>,
}

/// Outcome of the broad arrears rule over one loan.
#[derive(Clone, Debug, Default)]
pub struct ArrearsRepair {
    /// The rewritten schedule, ready to replace the stored array
    pub installments: Vec<Installment>,
    /// Which installments were cleared, with their previous counters
    pub cleared: Vec<ClearedInstallment>,
    /// Integer-schema anomalies found along the way
    pub violations: Vec<SchemaViolation>,
}

impl ArrearsRepair {
    /// Whether the repair found anything to write.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.cleared.is_empty()
    }
}

/// Broad rule: zero every installment with `days_in_arrear > 0`, passing
/// all other installments through unmodified, and report integer-schema
/// anomalies on the side.
#[must_use]
pub fn reconcile_arrears(loan: &Loan) -> ArrearsRepair {
    let mut repair = ArrearsRepair::default();

    for (index, installment) in loan.amortization.iter().enumerate() {
        let mut updated = installment.clone();
        let days = installment.days_in_arrear();
        if days > 0 {
            updated.clear_days_in_arrear();
            repair.cleared.push(ClearedInstallment {
                index,
                days_in_arrear: days,
            });
        }

        if let Some(violation) = check_integer_schema(installment) {
            warn!(
                loan_id = %loan.id,
                installment_id = violation.installment_id.as_deref().unwrap_or("?"),
                fields = ?violation.fields,
                "non-integer values in amortization schedule"
            );
            repair.violations.push(violation);
        }

        repair.installments.push(updated);
    }

    repair
}

/// Strict rule: indices of installments that are fully paid but still
/// flagged overdue. A strict subset of what the broad rule would clear.
#[must_use]
pub fn zero_balance_corrections(loan: &Loan) -> Vec<usize> {
    let mut corrections = Vec::new();

    for (index, installment) in loan.amortization.iter().enumerate() {
        let Some(pending) = installment.pending_payment() else {
            warn!(
                loan_id = %loan.id,
                installment_id = installment.id().unwrap_or("?"),
                "installment without a readable pending_payment, skipped"
            );
            continue;
        };
        if installment.days_in_arrear() > 0 && pending == 0 {
            corrections.push(index);
        }
    }

    corrections
}

/// Checks one installment against the declared integer-field schema.
/// Returns `None` when every designated field holds an integer.
#[must_use]
pub fn check_integer_schema(installment: &Installment) -> Option<SchemaViolation> {
    let fields: Vec<&'static str> = INTEGER_FIELDS
        .iter()
        .copied()
        .filter(|field| !installment.holds_integer(field))
        .collect();

    if fields.is_empty() {
        None
    } else {
        Some(SchemaViolation {
            installment_id: installment.id().map(str::to_owned),
            fields,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{installment, loan_with_installments, well_typed_installment};

    #[test]
    fn broad_rule_clears_every_positive_counter() {
        let loan = loan_with_installments(vec![
            installment(5, 0),
            installment(0, 100),
            installment(12, 250),
        ]);

        let repair = reconcile_arrears(&loan);

        assert_eq!(
            repair.cleared,
            vec![
                ClearedInstallment { index: 0, days_in_arrear: 5 },
                ClearedInstallment { index: 2, days_in_arrear: 12 },
            ]
        );
        assert!(repair.installments.iter().all(|i| i.days_in_arrear() == 0));
        // untouched installments pass through unmodified
        assert_eq!(repair.installments[1], loan.amortization[1]);
    }

    #[test]
    fn broad_rule_is_idempotent() {
        let loan = loan_with_installments(vec![installment(5, 0), installment(3, 40)]);

        let first = reconcile_arrears(&loan);
        assert_eq!(first.cleared.len(), 2);

        let mut repaired = loan.clone();
        repaired.amortization = first.installments;
        let second = reconcile_arrears(&repaired);
        assert!(second.is_noop());
    }

    #[test]
    fn broad_rule_on_clean_loan_is_noop() {
        let loan = loan_with_installments(vec![installment(0, 100), installment(0, 0)]);
        assert!(reconcile_arrears(&loan).is_noop());
    }

    #[test]
    fn strict_rule_requires_zero_pending_balance() {
        // one overdue-but-paid installment, one genuinely overdue
        let loan = loan_with_installments(vec![installment(5, 0), installment(7, 100)]);
        assert_eq!(zero_balance_corrections(&loan), vec![0]);
    }

    #[test]
    fn strict_rule_scenario_single_correction_at_term_one() {
        let loan = loan_with_installments(vec![installment(5, 0), installment(0, 100)]);
        assert_eq!(zero_balance_corrections(&loan), vec![0]);
    }

    #[test]
    fn strict_set_is_subset_of_broad_set() {
        let loan = loan_with_installments(vec![
            installment(5, 0),
            installment(7, 100),
            installment(0, 0),
            installment(1, 0),
        ]);

        let broad: Vec<usize> = reconcile_arrears(&loan)
            .cleared
            .iter()
            .map(|c| c.index)
            .collect();
        let strict = zero_balance_corrections(&loan);

        assert!(strict.iter().all(|index| broad.contains(index)));
        assert_eq!(strict, vec![0, 3]);
        assert_eq!(broad, vec![0, 1, 3]);
    }

    #[test]
    fn strict_rule_skips_unreadable_installments() {
        let mut bad = installment(4, 0);
        bad = Installment::new({
            let mut doc = bad.as_document().clone();
            doc.remove("pending_payment");
            doc
        });
        let loan = loan_with_installments(vec![bad, installment(4, 0)]);
        assert_eq!(zero_balance_corrections(&loan), vec![1]);
    }

    #[test]
    fn schema_check_flags_floats_and_missing_fields() {
        let clean = well_typed_installment();
        assert!(check_integer_schema(&clean).is_none());

        let mut doc = clean.as_document().clone();
        doc.insert("taxes", 19.5);
        doc.remove("period_days");
        let violation = check_integer_schema(&Installment::new(doc))
            .unwrap_or_else(|| panic!("expected a violation"));
        assert!(violation.fields.contains(&"taxes"));
        assert!(violation.fields.contains(&"period_days"));
        assert_eq!(violation.fields.len(), 2);
    }

    #[test]
    fn violations_do_not_block_the_repair() {
        let mut doc = well_typed_installment().as_document().clone();
        doc.insert("days_in_arrear", 6.0);
        let loan = loan_with_installments(vec![Installment::new(doc)]);

        let repair = reconcile_arrears(&loan);
        assert_eq!(repair.cleared.len(), 1);
        assert_eq!(repair.violations.len(), 1);
        assert_eq!(repair.installments[0].days_in_arrear(), 0);
    }
}
