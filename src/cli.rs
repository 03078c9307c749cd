//! Command-line interface - One subcommand per maintenance routine.

use clap::{Parser, Subcommand, ValueEnum};

/// Loan-record consistency reconciler.
#[derive(Debug, Parser)]
#[command(name = "loanwarden")]
#[command(about = "Detects and repairs loan-record inconsistencies", long_about = None)]
#[command(version)]
pub struct Cli {
    /// The maintenance routine to run
    #[command(subcommand)]
    pub command: Command,
}

/// The maintenance routines.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Full consistency pass: due-date normalization, broad arrears
    /// repair, and user-status validation
    Sweep,

    /// Strict repair of installments fully paid but still flagged overdue
    ZeroBalance,

    /// Audit payments against installment linkage, reporting unapplied
    /// transactions
    Unapplied {
        /// Date range of payments to audit
        #[arg(long, value_enum, default_value_t = DateRange::Recent)]
        range: DateRange,

        /// Cap on payments processed, for test runs
        #[arg(long)]
        limit: Option<i64>,
    },

    /// Drop payment_info entries with no backing transaction
    PruneLinks {
        /// Write the pruned schedules back; default is a dry run
        #[arg(long)]
        apply: bool,
    },
}

/// Payment date-range selector for the audit routine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DateRange {
    /// Payments from the last two days
    Recent,
    /// August 2025
    August,
    /// September 2025
    September,
    /// October 2025
    October,
}

impl DateRange {
    /// The calendar-month window as `[start, end)` date strings, or `None`
    /// for the rolling recent window.
    #[must_use]
    pub const fn month_window(self) -> Option<(&'static str, &'static str)> {
        match self {
            Self::Recent => None,
            Self::August => Some(("2025-08-01", "2025-09-01")),
            Self::September => Some(("2025-09-01", "2025-10-01")),
            Self::October => Some(("2025-10-01", "2025-11-01")),
        }
    }

    /// Suffix for artifact file names.
    #[must_use]
    pub const fn file_suffix(self) -> &'static str {
        match self {
            Self::Recent => "recent",
            Self::August => "august_2025",
            Self::September => "september_2025",
            Self::October => "october_2025",
        }
    }

    /// Human-readable label for logs and the summary email.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Recent => "last 2 days",
            Self::August => "August 2025",
            Self::September => "September 2025",
            Self::October => "October 2025",
        }
    }
}
