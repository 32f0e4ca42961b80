//! SQL-style queries over a booked ledger.
//!
//! The pipeline has four stages:
//!
//! - [`parse`] - Turn query text into an AST
//! - [`compile`] - Resolve names, desugar, and type-check into a [`Plan`]
//! - [`execute_query`] / [`execute_print`] - Run a plan over the entries
//! - [`render_text`] - Lay the rows out as an aligned text table
//!
//! [`run_query`] strings the stages together for the common case.
//!
//! # Example
//!
//! ```
//! use quill_core::{Amount, Directive, Ledger, Options, Posting, Transaction};
//! use quill_query::run_query;
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//!
//! let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
//! let entries = vec![Directive::Transaction(
//!     Transaction::new(date, "Coffee")
//!         .with_posting(Posting::new("Assets:Cash", Amount::new(dec!(-4.50), "USD")))
//!         .with_posting(Posting::new("Expenses:Coffee", Amount::new(dec!(4.50), "USD"))),
//! )];
//! let ledger = Ledger::new(entries, Options::new());
//!
//! let table = run_query(&ledger, "SELECT account, number")?;
//! assert!(table.contains("Expenses:Coffee"));
//! # Ok::<(), quill_query::QueryError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod ast;
pub mod compile;
pub mod env;
pub mod error;
pub mod execute;
pub mod parser;
pub mod render;
pub mod summarize;
pub mod value;

pub use ast::{
    BalancesQuery, BinaryOp, BinaryOperator, CloseClause, Expr, FromClause, FunctionCall,
    JournalQuery, Literal, OrderSpec, PrintQuery, Query, SelectQuery, SortDirection, Target,
    UnaryOp, UnaryOperator,
};
pub use compile::{compile, EvalFrom, EvalPrint, EvalQuery, Plan};
pub use error::{CompileError, ParseError, ParseErrorKind, QueryError};
pub use execute::{execute_print, execute_query, QueryResult};
pub use parser::parse;
pub use render::render_text;
pub use summarize::filter_entries;
pub use value::{Value, ValueType};

use quill_core::Ledger;

/// Parse, compile, execute, and render one query against a ledger.
///
/// Selects come back as an aligned text table; `PRINT` renders the
/// matching entries back to ledger syntax. Runtime diagnostics are
/// dropped here; call the stages separately to inspect them.
pub fn run_query(ledger: &Ledger, source: &str) -> Result<String, QueryError> {
    let query = parse(source)?;
    let plan = compile(&query)?;
    Ok(match plan {
        Plan::Select(select) => {
            let result = execute_query(&select, &ledger.entries, &ledger.options);
            render_text(&result)
        }
        Plan::Print(print) => execute_print(&print, &ledger.entries, &ledger.options),
    })
}
