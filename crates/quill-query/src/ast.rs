//! Abstract syntax tree for the query language.
//!
//! The parser produces these types; the compiler consumes them. A
//! [`Query`] is one of the four statement forms. `BALANCES` and
//! `JOURNAL` are sugar that the compiler rewrites into an equivalent
//! `SELECT` before planning.

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// A parsed query statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// `SELECT ...`
    Select(SelectQuery),
    /// `PRINT ...`
    Print(PrintQuery),
    /// `BALANCES ...`
    Balances(BalancesQuery),
    /// `JOURNAL ...`
    Journal(JournalQuery),
}

/// A `SELECT` statement.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectQuery {
    /// Deduplicate result rows.
    pub distinct: bool,
    /// Projection list, or a lone `*`.
    pub targets: Vec<Target>,
    /// Entry filter applied before evaluation.
    pub from: Option<FromClause>,
    /// Row filter.
    pub where_clause: Option<Expr>,
    /// Grouping expressions.
    pub group_by: Option<Vec<Expr>>,
    /// Group filter, only meaningful with `GROUP BY`.
    pub having: Option<Expr>,
    /// Sort keys.
    pub order_by: Option<Vec<OrderSpec>>,
    /// Maximum number of result rows.
    pub limit: Option<u64>,
}

/// A `PRINT` statement.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PrintQuery {
    /// Entry filter applied before printing.
    pub from: Option<FromClause>,
}

/// A `BALANCES` statement.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BalancesQuery {
    /// Optional conversion function applied to the summed inventory.
    pub at: Option<String>,
    /// Entry filter.
    pub from: Option<FromClause>,
}

/// A `JOURNAL` statement.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JournalQuery {
    /// Optional account regular expression.
    pub account_pattern: Option<String>,
    /// Optional conversion function applied to the position column.
    pub at: Option<String>,
    /// Entry filter.
    pub from: Option<FromClause>,
}

/// One projection target with an optional alias.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    /// The projected expression.
    pub expr: Expr,
    /// `AS name`, if given.
    pub alias: Option<String>,
}

impl Target {
    /// Create a target without an alias.
    #[must_use]
    pub const fn new(expr: Expr) -> Self {
        Self { expr, alias: None }
    }

    /// Create a target with an alias.
    #[must_use]
    pub fn aliased(expr: Expr, alias: impl Into<String>) -> Self {
        Self {
            expr,
            alias: Some(alias.into()),
        }
    }
}

/// The `FROM` clause: an entry-level filter plus summarization options.
///
/// All parts are optional in the grammar; a `FROM` with none of them is
/// rejected at compile time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FromClause {
    /// Entry-level filter expression.
    pub filter: Option<Expr>,
    /// `OPEN ON date`: summarize entries before this date.
    pub open_on: Option<NaiveDate>,
    /// `CLOSE [ON date]`: truncate and insert conversions.
    pub close: Option<CloseClause>,
    /// `CLEAR`: transfer income statement balances to equity.
    pub clear: bool,
}

impl FromClause {
    /// Check whether the clause carries neither filter nor options.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.filter.is_none() && self.open_on.is_none() && self.close.is_none() && !self.clear
    }
}

/// The form of a `CLOSE` option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseClause {
    /// Bare `CLOSE`: conversions at the date of the last entry.
    Implicit,
    /// `CLOSE ON date`: truncate at the date, conversions dated there.
    On(NaiveDate),
}

/// One `ORDER BY` key.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSpec {
    /// The sort expression.
    pub expr: Expr,
    /// Sort direction.
    pub direction: SortDirection,
}

/// Sort direction for an `ORDER BY` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Ascending (the default).
    #[default]
    Ascending,
    /// Descending.
    Descending,
}

/// An expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `*` in a target list or in `count(*)`.
    Wildcard,
    /// A column reference.
    Column(String),
    /// A literal value.
    Literal(Literal),
    /// A function or aggregate call.
    Function(FunctionCall),
    /// A binary operation.
    BinaryOp(Box<BinaryOp>),
    /// A unary operation.
    UnaryOp(Box<UnaryOp>),
    /// A parenthesized expression.
    Paren(Box<Expr>),
}

/// A function call.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    /// Function name, as written.
    pub name: String,
    /// Argument expressions.
    pub args: Vec<Expr>,
}

/// A literal value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// A quoted string.
    String(String),
    /// A decimal number with a fractional part.
    Number(Decimal),
    /// An integer.
    Integer(i64),
    /// An ISO date, `YYYY-MM-DD`.
    Date(NaiveDate),
    /// `TRUE` or `FALSE`.
    Boolean(bool),
    /// `NULL`.
    Null,
}

/// A binary operation.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryOp {
    /// The operator.
    pub op: BinaryOperator,
    /// Left operand.
    pub left: Expr,
    /// Right operand.
    pub right: Expr,
}

/// Binary operators, loosest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    /// `OR`
    Or,
    /// `AND`
    And,
    /// `=`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `~` regular expression match
    Regex,
    /// `IN` set membership
    In,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
}

/// A unary operation.
#[derive(Debug, Clone, PartialEq)]
pub struct UnaryOp {
    /// The operator.
    pub op: UnaryOperator,
    /// The operand.
    pub operand: Expr,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    /// `NOT`
    Not,
    /// `-` negation
    Neg,
}

impl Expr {
    /// Create a column reference.
    pub fn column(name: impl Into<String>) -> Self {
        Self::Column(name.into())
    }

    /// Create a string literal.
    pub fn string(value: impl Into<String>) -> Self {
        Self::Literal(Literal::String(value.into()))
    }

    /// Create a number literal.
    #[must_use]
    pub const fn number(value: Decimal) -> Self {
        Self::Literal(Literal::Number(value))
    }

    /// Create an integer literal.
    #[must_use]
    pub const fn integer(value: i64) -> Self {
        Self::Literal(Literal::Integer(value))
    }

    /// Create a date literal.
    #[must_use]
    pub const fn date(value: NaiveDate) -> Self {
        Self::Literal(Literal::Date(value))
    }

    /// Create a boolean literal.
    #[must_use]
    pub const fn boolean(value: bool) -> Self {
        Self::Literal(Literal::Boolean(value))
    }

    /// Create a function call.
    pub fn function(name: impl Into<String>, args: Vec<Self>) -> Self {
        Self::Function(FunctionCall {
            name: name.into(),
            args,
        })
    }

    /// Create a binary operation.
    #[must_use]
    pub fn binary(op: BinaryOperator, left: Self, right: Self) -> Self {
        Self::BinaryOp(Box::new(BinaryOp { op, left, right }))
    }

    /// Create a unary operation.
    #[must_use]
    pub fn unary(op: UnaryOperator, operand: Self) -> Self {
        Self::UnaryOp(Box::new(UnaryOp { op, operand }))
    }

    /// Strip any number of surrounding parentheses.
    #[must_use]
    pub fn unwrap_paren(&self) -> &Self {
        let mut expr = self;
        while let Self::Paren(inner) = expr {
            expr = inner;
        }
        expr
    }

    /// Structural equality that ignores parentheses and the case of
    /// column and function names.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        match (self.unwrap_paren(), other.unwrap_paren()) {
            (Self::Wildcard, Self::Wildcard) => true,
            (Self::Column(a), Self::Column(b)) => a.eq_ignore_ascii_case(b),
            (Self::Literal(a), Self::Literal(b)) => a == b,
            (Self::Function(a), Self::Function(b)) => {
                a.name.eq_ignore_ascii_case(&b.name)
                    && a.args.len() == b.args.len()
                    && a.args.iter().zip(&b.args).all(|(x, y)| x.matches(y))
            }
            (Self::BinaryOp(a), Self::BinaryOp(b)) => {
                a.op == b.op && a.left.matches(&b.left) && a.right.matches(&b.right)
            }
            (Self::UnaryOp(a), Self::UnaryOp(b)) => {
                a.op == b.op && a.operand.matches(&b.operand)
            }
            _ => false,
        }
    }
}
