//! Payment-link pruning - Drops `payment_info` entries with no backing
//! transaction.
//!
//! The inverse check to the payment audit: installments sometimes carry
//! linkage ids for transactions that no longer exist in the payment
//! collection. This rule rewrites the schedule keeping only verified ids.
//! It runs as its own routine, in dry-run mode unless explicitly applied.

use std::collections::HashSet;

use crate::entities::{Installment, Loan};
use tracing::debug;

/// Outcome of reviewing one loan's payment linkage.
#[derive(Clone, Debug, Default)]
pub struct LinkPruneReview {
    /// How many linkage entries the schedule carries in total
    pub total_links: usize,
    /// Linkage ids with no backing transaction, in schedule order
    pub missing: Vec<String>,
    /// The rewritten schedule with dangling ids removed
    pub installments: Vec<Installment>,
    /// How many installments had entries pruned
    pub pruned_installments: usize,
}

impl LinkPruneReview {
    /// Whether anything would change on write.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.pruned_installments == 0
    }
}

/// Every linkage id referenced by the loan's schedule, in schedule order.
#[must_use]
pub fn collect_links(loan: &Loan) -> Vec<String> {
    loan.amortization
        .iter()
        .flat_map(Installment::payment_info)
        .collect()
}

/// Rewrites the schedule keeping only linkage ids present in `verified`.
#[must_use]
pub fn prune_payment_links(loan: &Loan, verified: &HashSet<String>) -> LinkPruneReview {
    let mut review = LinkPruneReview::default();

    for installment in &loan.amortization {
        let links = installment.payment_info();
        review.total_links += links.len();

        let (kept, dangling): (Vec<String>, Vec<String>) = links
            .into_iter()
            .partition(|link| verified.contains(link));

        let mut updated = installment.clone();
        if !dangling.is_empty() {
            debug!(
                loan_id = %loan.id,
                installment_id = installment.id().unwrap_or("?"),
                dropped = dangling.len(),
                "pruning dangling payment links"
            );
            updated.set_payment_info(kept);
            review.pruned_installments += 1;
            review.missing.extend(dangling);
        }
        review.installments.push(updated);
    }

    review
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{installment_with_links, loan_with_installments};

    fn verified(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|id| (*id).to_owned()).collect()
    }

    #[test]
    fn verified_links_survive() {
        let loan = loan_with_installments(vec![installment_with_links(0, 0, &["a", "b"])]);
        let review = prune_payment_links(&loan, &verified(&["a", "b"]));
        assert!(review.is_noop());
        assert_eq!(review.total_links, 2);
        assert_eq!(review.installments[0].payment_info(), vec!["a", "b"]);
    }

    #[test]
    fn dangling_links_are_dropped_in_place() {
        let loan = loan_with_installments(vec![
            installment_with_links(0, 0, &["a", "ghost"]),
            installment_with_links(0, 100, &["b"]),
        ]);
        let review = prune_payment_links(&loan, &verified(&["a", "b"]));

        assert_eq!(review.pruned_installments, 1);
        assert_eq!(review.missing, vec!["ghost"]);
        assert_eq!(review.installments[0].payment_info(), vec!["a"]);
        assert_eq!(review.installments[1].payment_info(), vec!["b"]);
    }

    #[test]
    fn collect_links_walks_the_whole_schedule() {
        let loan = loan_with_installments(vec![
            installment_with_links(0, 0, &["a"]),
            installment_with_links(0, 0, &[]),
            installment_with_links(0, 0, &["b", "c"]),
        ]);
        assert_eq!(collect_links(&loan), vec!["a", "b", "c"]);
    }
}
