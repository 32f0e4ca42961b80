//! Core types for quill
//!
//! This crate provides the fundamental types the quill query engine
//! operates on:
//!
//! - [`Amount`] - A decimal number with a currency
//! - [`Cost`] - Acquisition cost of a position (lot)
//! - [`Position`] - Units held at an optional cost
//! - [`Inventory`] - A collection of positions partitioned by lot
//! - [`Directive`] - All directive types (Transaction, Balance, Open, etc.)
//! - [`Options`] - Ledger-level options consumed from the source file
//! - [`Ledger`] - The (entries, errors, options) triple produced by loading
//!
//! Quill consumes fully booked ledgers: every posting carries a complete
//! amount and, where relevant, a resolved cost lot. Interpolation and lot
//! matching happen upstream, in the loader that produces the [`Ledger`].
//!
//! # Example
//!
//! ```
//! use quill_core::{Amount, Cost, Position, Inventory};
//! use rust_decimal_macros::dec;
//! use chrono::NaiveDate;
//!
//! let mut inv = Inventory::new();
//!
//! // A cash position and a stock lot
//! inv.add(Position::simple(Amount::new(dec!(100.00), "USD")));
//! let cost = Cost::new(dec!(150.00), "USD")
//!     .with_date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
//! inv.add(Position::with_cost(Amount::new(dec!(10), "HOOL"), cost));
//!
//! assert_eq!(inv.units_of("HOOL"), dec!(10));
//!
//! // Reduce the stock lot to its cost value
//! let at_cost = inv.at_cost();
//! assert_eq!(at_cost.units_of("USD"), dec!(1600.00));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod account;
pub mod amount;
pub mod cost;
pub mod directive;
pub mod format;
pub mod intern;
pub mod inventory;
pub mod ledger;
pub mod options;
pub mod position;

pub use account::{AccountType, AccountTypes};
pub use amount::Amount;
pub use cost::Cost;
pub use directive::{
    sort_directives, Balance, Close, Commodity, Custom, Directive, DirectivePriority, Document,
    Event, MetaValue, Metadata, Note, Open, Pad, Posting, Price, Query, Transaction,
};
pub use format::{format_directive, FormatConfig};
pub use intern::Symbol;
pub use inventory::Inventory;
pub use ledger::{Ledger, LedgerError};
pub use options::{OptionWarning, Options};
pub use position::Position;

// Re-export commonly used external types
pub use chrono::NaiveDate;
pub use rust_decimal::Decimal;
