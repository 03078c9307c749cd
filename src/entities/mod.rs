//! Entity module - Serde models for the documents this tool reconciles.
//! Each model mirrors one store collection; unknown fields ride along in a
//! flattened `extra` document so targeted repairs never drop data.

pub mod loan;
pub mod payment;
pub mod user;

pub use loan::{
    INTEGER_FIELDS, Installment, Loan, STATUS_ACTIVE, STATUS_ARREAR, STATUS_PAID,
};
pub use payment::{Payment, PaymentTransaction, TransactionDetails};
pub use user::User;
