//! The booked ledger: directives, options, and any input errors.

use thiserror::Error;

use crate::directive::{sort_directives, Directive, Transaction};
use crate::options::Options;

/// An error attached to the ledger input.
///
/// These are carried alongside the data rather than aborting processing,
/// so a query can still run over the directives that did book cleanly.
#[derive(Debug, Clone, Error)]
#[error("{}{message}", .location.as_deref().map(|l| format!("{l}: ")).unwrap_or_default())]
pub struct LedgerError {
    /// Human-readable description of the problem.
    pub message: String,
    /// Source location, when known (e.g. "ledger.beancount:42").
    pub location: Option<String>,
}

impl LedgerError {
    /// Create an error with no source location.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
        }
    }

    /// Attach a source location.
    #[must_use]
    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// A fully booked ledger ready for querying.
///
/// Entries are kept in canonical order: by date, then by directive type
/// priority, then by input order.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    /// All directives, in canonical order.
    pub entries: Vec<Directive>,
    /// Errors produced while the ledger was loaded and booked.
    pub errors: Vec<LedgerError>,
    /// Ledger options.
    pub options: Options,
}

impl Ledger {
    /// Create a ledger from directives and options.
    ///
    /// The directives are sorted into canonical order.
    #[must_use]
    pub fn new(mut entries: Vec<Directive>, options: Options) -> Self {
        sort_directives(&mut entries);
        Self {
            entries,
            errors: Vec::new(),
            options,
        }
    }

    /// Attach input errors.
    #[must_use]
    pub fn with_errors(mut self, errors: Vec<LedgerError>) -> Self {
        self.errors = errors;
        self
    }

    /// Iterate over the transactions in the ledger.
    pub fn transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.entries.iter().filter_map(Directive::as_transaction)
    }
}
