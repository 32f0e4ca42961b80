//! BQL error types.
//!
//! Each engine phase has its own error type: [`ParseError`] for malformed
//! query text, [`CompileError`] for queries that do not bind against the
//! column and function registries. [`QueryError`] is the umbrella returned
//! by the one-call [`crate::run_query`] surface. Runtime type mismatches
//! during row evaluation are not errors; they become null cells and are
//! collected as diagnostics on the result.

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use std::io;
use thiserror::Error;

/// Error returned when parsing a BQL query fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error at position {}: {kind}", span.0)]
pub struct ParseError {
    /// The kind of error.
    pub kind: ParseErrorKind,
    /// Byte range in the query text the error points at.
    pub span: (usize, usize),
}

/// The kind of parse error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    /// Unexpected end of input.
    #[error("unexpected end of input")]
    UnexpectedEof,
    /// Syntax error with details.
    #[error("{0}")]
    SyntaxError(String),
}

impl ParseError {
    /// Create a new parse error.
    pub const fn new(kind: ParseErrorKind, span: (usize, usize)) -> Self {
        Self { kind, span }
    }

    /// Write an annotated report against the query text.
    ///
    /// # Errors
    ///
    /// Returns any I/O error from the writer.
    pub fn write_report<W: io::Write>(&self, source: &str, writer: &mut W) -> io::Result<()> {
        let id = "query";
        let (start, end) = self.span;
        let end = end.max(start + 1).min(source.len().max(start + 1));

        Report::build(ReportKind::Error, (id, start..end))
            .with_message("malformed query")
            .with_label(
                Label::new((id, start..end))
                    .with_message(self.kind.to_string())
                    .with_color(Color::Red),
            )
            .with_config(Config::default().with_compact(true))
            .finish()
            .write((id, Source::from(source)), writer)
    }
}

/// Error returned when a parsed query fails to bind into an executable plan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// An identifier that is not a column in the clause it was used in.
    #[error("unknown column '{name}' in {context} clause")]
    UnknownColumn {
        /// The identifier as written.
        name: String,
        /// The clause the lookup happened in.
        context: &'static str,
    },
    /// A function name that is not registered.
    #[error("unknown function: {0}")]
    UnknownFunction(String),
    /// Wrong number of arguments for a known function.
    #[error("invalid arguments for function {name}: expected {expected}, got {got}")]
    InvalidArguments {
        /// Function name.
        name: String,
        /// Expected argument count, rendered for display.
        expected: String,
        /// Actual argument count.
        got: usize,
    },
    /// An aggregate function in a clause that evaluates per row.
    #[error("aggregate function '{name}' is not allowed in {context} clause")]
    AggregateNotAllowed {
        /// Aggregate name.
        name: String,
        /// The offending clause.
        context: &'static str,
    },
    /// An aggregate call inside another aggregate call.
    #[error("aggregate functions cannot be nested")]
    NestedAggregate,
    /// A numeric GROUP BY or ORDER BY reference outside the target list.
    #[error("{clause} position {position} is out of range")]
    BadPosition {
        /// `GROUP BY` or `ORDER BY`.
        clause: &'static str,
        /// The 1-based position as written.
        position: i64,
    },
    /// A GROUP BY item that is itself aggregated.
    #[error("cannot GROUP BY an aggregate expression")]
    GroupByAggregate,
    /// A plain column selected alongside aggregates without being grouped.
    #[error("cannot select non-aggregate column '{0}' without grouping by it")]
    NotGrouped(String),
    /// A `~` pattern literal that does not compile.
    #[error("invalid regular expression '{pattern}': {message}")]
    InvalidRegex {
        /// The pattern as written.
        pattern: String,
        /// The regex crate's complaint.
        message: String,
    },
    /// A FROM clause with no filter and no OPEN/CLOSE/CLEAR operator.
    #[error("FROM clause requires a filter expression or OPEN, CLOSE, CLEAR")]
    EmptyFrom,
    /// A `*` outside the target list or `count(*)`.
    #[error("'*' is only valid as a target or inside count(*)")]
    UnexpectedWildcard,
}

/// Error returned by the one-call query surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The query text did not parse.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    /// The query did not compile into a plan.
    #[error("compile error: {0}")]
    Compile(#[from] CompileError),
}
