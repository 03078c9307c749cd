//! User status reconciliation - Derives a borrower's aggregate status.
//!
//! Pure decision logic: given everything a borrower currently owes, decide
//! whether their "arrear" flag should flip back to "active". The caller is
//! responsible for only consulting this for users whose stored status is
//! "arrear", for deduplicating users across the batch, and for issuing the
//! actual write.

use crate::entities::{Loan, STATUS_ARREAR};

/// Fixed decision reasons, recorded in the validation artifact.
pub const REASON_SOLE_LOAN: &str = "user has a single loan";
/// See [`REASON_SOLE_LOAN`].
pub const REASON_NO_ARREAR_LOANS: &str = "user has no loans in arrears";
/// See [`REASON_SOLE_LOAN`].
pub const REASON_MIXED_PORTFOLIO: &str = "user still has loans in arrears";

/// Outcome of reviewing one arrear-flagged borrower's portfolio.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct StatusReview {
    /// Whether the stored status should flip to "active"
    pub should_update: bool,
    /// Which rule decided
    pub reason: &'static str,
    /// Total loans found for the user
    pub loans_found: usize,
    /// How many of them are themselves flagged "arrear"
    pub arrear_loans: usize,
    /// The rest of the portfolio
    pub other_loans: usize,
}

/// Decides whether an arrear-flagged user should return to "active".
///
/// - Exactly one loan total: update (the arrears repair just cleared it).
/// - No loan in the portfolio still flagged "arrear": update.
/// - Anything else: keep the flag, the portfolio is still mixed.
#[must_use]
pub fn review_arrear_user(loans: &[Loan]) -> StatusReview {
    let arrear_loans = loans
        .iter()
        .filter(|loan| loan.status == STATUS_ARREAR)
        .count();
    let other_loans = loans.len() - arrear_loans;

    let (should_update, reason) = if loans.len() == 1 {
        (true, REASON_SOLE_LOAN)
    } else if arrear_loans == 0 {
        (true, REASON_NO_ARREAR_LOANS)
    } else {
        (false, REASON_MIXED_PORTFOLIO)
    };

    StatusReview {
        should_update,
        reason,
        loans_found: loans.len(),
        arrear_loans,
        other_loans,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{STATUS_ACTIVE, STATUS_PAID};
    use crate::test_utils::loan_with_status;

    #[test]
    fn sole_loan_always_updates() {
        // even when that single loan is itself still flagged
        let review = review_arrear_user(&[loan_with_status(STATUS_ARREAR)]);
        assert!(review.should_update);
        assert_eq!(review.reason, REASON_SOLE_LOAN);
        assert_eq!(review.loans_found, 1);
    }

    #[test]
    fn clean_portfolio_updates() {
        let loans = [
            loan_with_status(STATUS_PAID),
            loan_with_status(STATUS_ACTIVE),
        ];
        let review = review_arrear_user(&loans);
        assert!(review.should_update);
        assert_eq!(review.reason, REASON_NO_ARREAR_LOANS);
        assert_eq!(review.arrear_loans, 0);
        assert_eq!(review.other_loans, 2);
    }

    #[test]
    fn mixed_portfolio_never_updates() {
        let loans = [
            loan_with_status(STATUS_PAID),
            loan_with_status(STATUS_ARREAR),
        ];
        let review = review_arrear_user(&loans);
        assert!(!review.should_update);
        assert_eq!(review.reason, REASON_MIXED_PORTFOLIO);
        assert_eq!(review.arrear_loans, 1);
    }

    #[test]
    fn empty_portfolio_counts_as_no_arrear_loans() {
        let review = review_arrear_user(&[]);
        assert!(review.should_update);
        assert_eq!(review.reason, REASON_NO_ARREAR_LOANS);
        assert_eq!(review.loans_found, 0);
    }
}
