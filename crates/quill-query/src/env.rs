//! Column and function environments.
//!
//! Compilation resolves every name against these tables, so a bad
//! column or function is caught before any entry is touched. Columns
//! come in two sets: entry-level columns, the only ones visible to a
//! `FROM` filter, and posting-level columns for everything else.

use std::fmt;

use chrono::{Datelike, Local};
use quill_core::{account, Directive, Inventory, Position, Posting};

use crate::value::{Value, ValueType};

/// Everything an expression can see while evaluating one row.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    /// The entry the row comes from.
    pub entry: &'a Directive,
    /// The posting, when iterating at posting granularity.
    pub posting: Option<&'a Posting>,
    /// Running balance of the posting's account, when tracked.
    pub balance: Option<&'a Inventory>,
    /// Aggregate slots, present only while finalizing group rows.
    pub store: Option<&'a [Value]>,
}

/// Which column set a clause resolves against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvKind {
    /// Whole entries, as in a `FROM` filter.
    Entries,
    /// Postings of transactions, plus all entry columns.
    Postings,
}

/// A named column.
pub struct ColumnDef {
    /// Name as written in queries.
    pub name: &'static str,
    /// Type of the values this column produces.
    pub dtype: ValueType,
    /// Evaluate the column against a row.
    pub eval: fn(&Context<'_>) -> Value,
}

impl fmt::Debug for ColumnDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDef")
            .field("name", &self.name)
            .field("dtype", &self.dtype)
            .finish_non_exhaustive()
    }
}

/// A scalar function.
///
/// `eval` returns `Err` with a message on a type mismatch; the
/// executor reports it as a diagnostic and nulls the cell.
pub struct FuncDef {
    /// Name as written in queries.
    pub name: &'static str,
    /// Minimum argument count.
    pub min_args: usize,
    /// Maximum argument count.
    pub max_args: usize,
    /// Result type given the argument types.
    pub result: fn(&[ValueType]) -> ValueType,
    /// Apply the function to evaluated arguments.
    pub eval: fn(&[Value]) -> Result<Value, String>,
}

impl fmt::Debug for FuncDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FuncDef")
            .field("name", &self.name)
            .field("min_args", &self.min_args)
            .field("max_args", &self.max_args)
            .finish_non_exhaustive()
    }
}

/// Look up a column by name, case-insensitively.
#[must_use]
pub fn lookup_column(env: EnvKind, name: &str) -> Option<&'static ColumnDef> {
    let find = |table: &'static [ColumnDef]| {
        table.iter().find(|col| col.name.eq_ignore_ascii_case(name))
    };
    match env {
        EnvKind::Entries => find(ENTRY_COLUMNS),
        EnvKind::Postings => find(POSTING_COLUMNS).or_else(|| find(ENTRY_COLUMNS)),
    }
}

/// Look up a scalar function by name, case-insensitively.
#[must_use]
pub fn lookup_function(name: &str) -> Option<&'static FuncDef> {
    FUNCTIONS
        .iter()
        .find(|func| func.name.eq_ignore_ascii_case(name))
}

/// Check whether a name refers to an aggregate rather than a scalar.
#[must_use]
pub fn is_aggregate_name(name: &str) -> bool {
    ["sum", "count", "first", "last", "min", "max", "distinct"]
        .iter()
        .any(|agg| agg.eq_ignore_ascii_case(name))
}

// ==================== columns ====================

static ENTRY_COLUMNS: &[ColumnDef] = &[
    ColumnDef {
        name: "date",
        dtype: ValueType::Date,
        eval: col_date,
    },
    ColumnDef {
        name: "type",
        dtype: ValueType::String,
        eval: col_type,
    },
    ColumnDef {
        name: "flag",
        dtype: ValueType::String,
        eval: col_flag,
    },
    ColumnDef {
        name: "payee",
        dtype: ValueType::String,
        eval: col_payee,
    },
    ColumnDef {
        name: "narration",
        dtype: ValueType::String,
        eval: col_narration,
    },
    ColumnDef {
        name: "tags",
        dtype: ValueType::StringSet,
        eval: col_tags,
    },
    // Singular alias, common in hand-written filters.
    ColumnDef {
        name: "tag",
        dtype: ValueType::StringSet,
        eval: col_tags,
    },
    ColumnDef {
        name: "links",
        dtype: ValueType::StringSet,
        eval: col_links,
    },
    ColumnDef {
        name: "year",
        dtype: ValueType::Integer,
        eval: col_year,
    },
    ColumnDef {
        name: "month",
        dtype: ValueType::Integer,
        eval: col_month,
    },
    ColumnDef {
        name: "day",
        dtype: ValueType::Integer,
        eval: col_day,
    },
];

static POSTING_COLUMNS: &[ColumnDef] = &[
    ColumnDef {
        name: "account",
        dtype: ValueType::String,
        eval: col_account,
    },
    ColumnDef {
        name: "number",
        dtype: ValueType::Number,
        eval: col_number,
    },
    ColumnDef {
        name: "currency",
        dtype: ValueType::String,
        eval: col_currency,
    },
    ColumnDef {
        name: "change",
        dtype: ValueType::Position,
        eval: col_change,
    },
    // `position` is the traditional name for the same column.
    ColumnDef {
        name: "position",
        dtype: ValueType::Position,
        eval: col_change,
    },
    ColumnDef {
        name: "price",
        dtype: ValueType::Amount,
        eval: col_price,
    },
    ColumnDef {
        name: "weight",
        dtype: ValueType::Amount,
        eval: col_weight,
    },
    ColumnDef {
        name: "balance",
        dtype: ValueType::Inventory,
        eval: col_balance,
    },
];

fn col_date(ctx: &Context<'_>) -> Value {
    Value::Date(ctx.entry.date())
}

fn col_type(ctx: &Context<'_>) -> Value {
    Value::String(ctx.entry.type_name().to_string())
}

fn col_flag(ctx: &Context<'_>) -> Value {
    ctx.entry
        .as_transaction()
        .map_or(Value::Null, |txn| Value::String(txn.flag.to_string()))
}

fn col_payee(ctx: &Context<'_>) -> Value {
    ctx.entry
        .as_transaction()
        .and_then(|txn| txn.payee.clone())
        .map_or(Value::Null, Value::String)
}

fn col_narration(ctx: &Context<'_>) -> Value {
    ctx.entry
        .as_transaction()
        .map_or(Value::Null, |txn| Value::String(txn.narration.clone()))
}

fn col_tags(ctx: &Context<'_>) -> Value {
    ctx.entry.as_transaction().map_or(Value::Null, |txn| {
        Value::StringSet(txn.tags.iter().cloned().collect())
    })
}

fn col_links(ctx: &Context<'_>) -> Value {
    ctx.entry.as_transaction().map_or(Value::Null, |txn| {
        Value::StringSet(txn.links.iter().cloned().collect())
    })
}

fn col_year(ctx: &Context<'_>) -> Value {
    Value::Integer(i64::from(ctx.entry.date().year()))
}

fn col_month(ctx: &Context<'_>) -> Value {
    Value::Integer(i64::from(ctx.entry.date().month()))
}

fn col_day(ctx: &Context<'_>) -> Value {
    Value::Integer(i64::from(ctx.entry.date().day()))
}

fn col_account(ctx: &Context<'_>) -> Value {
    ctx.posting
        .map_or(Value::Null, |p| Value::String(p.account.clone()))
}

fn col_number(ctx: &Context<'_>) -> Value {
    ctx.posting
        .map_or(Value::Null, |p| Value::Number(p.units.number))
}

fn col_currency(ctx: &Context<'_>) -> Value {
    ctx.posting
        .map_or(Value::Null, |p| Value::String(p.units.currency.to_string()))
}

fn col_change(ctx: &Context<'_>) -> Value {
    ctx.posting.map_or(Value::Null, |p| Value::Position(p.position()))
}

fn col_price(ctx: &Context<'_>) -> Value {
    ctx.posting
        .and_then(|p| p.price.clone())
        .map_or(Value::Null, Value::Amount)
}

fn col_weight(ctx: &Context<'_>) -> Value {
    ctx.posting.map_or(Value::Null, |p| Value::Amount(p.weight()))
}

fn col_balance(ctx: &Context<'_>) -> Value {
    ctx.balance
        .map_or(Value::Null, |inv| Value::Inventory(inv.clone()))
}

// ==================== functions ====================

static FUNCTIONS: &[FuncDef] = &[
    FuncDef {
        name: "year",
        min_args: 1,
        max_args: 1,
        result: ty_integer,
        eval: fn_year,
    },
    FuncDef {
        name: "month",
        min_args: 1,
        max_args: 1,
        result: ty_integer,
        eval: fn_month,
    },
    FuncDef {
        name: "day",
        min_args: 1,
        max_args: 1,
        result: ty_integer,
        eval: fn_day,
    },
    FuncDef {
        name: "quarter",
        min_args: 1,
        max_args: 1,
        result: ty_string,
        eval: fn_quarter,
    },
    FuncDef {
        name: "weekday",
        min_args: 1,
        max_args: 1,
        result: ty_string,
        eval: fn_weekday,
    },
    FuncDef {
        name: "today",
        min_args: 0,
        max_args: 0,
        result: ty_date,
        eval: fn_today,
    },
    FuncDef {
        name: "length",
        min_args: 1,
        max_args: 1,
        result: ty_integer,
        eval: fn_length,
    },
    FuncDef {
        name: "str",
        min_args: 1,
        max_args: 1,
        result: ty_string,
        eval: fn_str,
    },
    FuncDef {
        name: "upper",
        min_args: 1,
        max_args: 1,
        result: ty_string,
        eval: fn_upper,
    },
    FuncDef {
        name: "lower",
        min_args: 1,
        max_args: 1,
        result: ty_string,
        eval: fn_lower,
    },
    FuncDef {
        name: "parent",
        min_args: 1,
        max_args: 1,
        result: ty_string,
        eval: fn_parent,
    },
    FuncDef {
        name: "leaf",
        min_args: 1,
        max_args: 1,
        result: ty_string,
        eval: fn_leaf,
    },
    FuncDef {
        name: "root",
        min_args: 1,
        max_args: 1,
        result: ty_string,
        eval: fn_root,
    },
    FuncDef {
        name: "number",
        min_args: 1,
        max_args: 1,
        result: ty_number,
        eval: fn_number,
    },
    FuncDef {
        name: "currency",
        min_args: 1,
        max_args: 1,
        result: ty_string,
        eval: fn_currency,
    },
    FuncDef {
        name: "units",
        min_args: 1,
        max_args: 1,
        result: ty_convert,
        eval: fn_units,
    },
    FuncDef {
        name: "cost",
        min_args: 1,
        max_args: 1,
        result: ty_convert,
        eval: fn_cost,
    },
    FuncDef {
        name: "abs",
        min_args: 1,
        max_args: 1,
        result: ty_same,
        eval: fn_abs,
    },
    FuncDef {
        name: "empty",
        min_args: 1,
        max_args: 1,
        result: ty_boolean,
        eval: fn_empty,
    },
];

fn ty_integer(_: &[ValueType]) -> ValueType {
    ValueType::Integer
}

fn ty_string(_: &[ValueType]) -> ValueType {
    ValueType::String
}

fn ty_number(_: &[ValueType]) -> ValueType {
    ValueType::Number
}

fn ty_date(_: &[ValueType]) -> ValueType {
    ValueType::Date
}

fn ty_boolean(_: &[ValueType]) -> ValueType {
    ValueType::Boolean
}

/// `units()` and `cost()` map inventories to inventories and
/// everything else to a plain amount.
fn ty_convert(args: &[ValueType]) -> ValueType {
    match args.first() {
        Some(ValueType::Inventory) => ValueType::Inventory,
        _ => ValueType::Amount,
    }
}

fn ty_same(args: &[ValueType]) -> ValueType {
    args.first().copied().unwrap_or(ValueType::Number)
}

fn fn_year(args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::Date(d) => Ok(Value::Integer(i64::from(d.year()))),
        Value::Null => Ok(Value::Null),
        other => Err(format!("year() expects a date, got {}", other.kind())),
    }
}

fn fn_month(args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::Date(d) => Ok(Value::Integer(i64::from(d.month()))),
        Value::Null => Ok(Value::Null),
        other => Err(format!("month() expects a date, got {}", other.kind())),
    }
}

fn fn_day(args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::Date(d) => Ok(Value::Integer(i64::from(d.day()))),
        Value::Null => Ok(Value::Null),
        other => Err(format!("day() expects a date, got {}", other.kind())),
    }
}

fn fn_quarter(args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::Date(d) => Ok(Value::String(format!(
            "{}-Q{}",
            d.year(),
            d.month0() / 3 + 1
        ))),
        Value::Null => Ok(Value::Null),
        other => Err(format!("quarter() expects a date, got {}", other.kind())),
    }
}

fn fn_weekday(args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::Date(d) => Ok(Value::String(d.format("%A").to_string())),
        Value::Null => Ok(Value::Null),
        other => Err(format!("weekday() expects a date, got {}", other.kind())),
    }
}

fn fn_today(_: &[Value]) -> Result<Value, String> {
    Ok(Value::Date(Local::now().date_naive()))
}

fn fn_length(args: &[Value]) -> Result<Value, String> {
    let n = match &args[0] {
        Value::String(s) => s.chars().count(),
        Value::StringSet(s) => s.len(),
        Value::Inventory(inv) => inv.len(),
        Value::Null => return Ok(Value::Null),
        other => {
            return Err(format!(
                "length() expects a string, set or inventory, got {}",
                other.kind()
            ))
        }
    };
    Ok(Value::Integer(i64::try_from(n).unwrap_or(i64::MAX)))
}

fn fn_str(args: &[Value]) -> Result<Value, String> {
    Ok(Value::String(args[0].to_string()))
}

fn fn_upper(args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::String(s) => Ok(Value::String(s.to_uppercase())),
        Value::Null => Ok(Value::Null),
        other => Err(format!("upper() expects a string, got {}", other.kind())),
    }
}

fn fn_lower(args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::String(s) => Ok(Value::String(s.to_lowercase())),
        Value::Null => Ok(Value::Null),
        other => Err(format!("lower() expects a string, got {}", other.kind())),
    }
}

fn fn_parent(args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::String(s) => Ok(account::parent(s)
            .map_or(Value::Null, |p| Value::String(p.to_string()))),
        Value::Null => Ok(Value::Null),
        other => Err(format!("parent() expects an account, got {}", other.kind())),
    }
}

fn fn_leaf(args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::String(s) => Ok(Value::String(account::leaf(s).to_string())),
        Value::Null => Ok(Value::Null),
        other => Err(format!("leaf() expects an account, got {}", other.kind())),
    }
}

fn fn_root(args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::String(s) => Ok(Value::String(account::root(s).to_string())),
        Value::Null => Ok(Value::Null),
        other => Err(format!("root() expects an account, got {}", other.kind())),
    }
}

fn fn_number(args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::Amount(a) => Ok(Value::Number(a.number)),
        Value::Position(p) => Ok(Value::Number(p.units.number)),
        Value::Null => Ok(Value::Null),
        other => Err(format!(
            "number() expects an amount or position, got {}",
            other.kind()
        )),
    }
}

fn fn_currency(args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::Amount(a) => Ok(Value::String(a.currency.to_string())),
        Value::Position(p) => Ok(Value::String(p.units.currency.to_string())),
        Value::Null => Ok(Value::Null),
        other => Err(format!(
            "currency() expects an amount or position, got {}",
            other.kind()
        )),
    }
}

fn fn_units(args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::Amount(a) => Ok(Value::Amount(a.clone())),
        Value::Position(p) => Ok(Value::Amount(p.units.clone())),
        Value::Inventory(inv) => Ok(Value::Inventory(inv.at_units())),
        Value::Null => Ok(Value::Null),
        other => Err(format!(
            "units() expects an amount, position or inventory, got {}",
            other.kind()
        )),
    }
}

fn fn_cost(args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::Amount(a) => Ok(Value::Amount(a.clone())),
        Value::Position(p) => Ok(Value::Amount(p.at_cost())),
        Value::Inventory(inv) => Ok(Value::Inventory(inv.at_cost())),
        Value::Null => Ok(Value::Null),
        other => Err(format!(
            "cost() expects an amount, position or inventory, got {}",
            other.kind()
        )),
    }
}

fn fn_abs(args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::Integer(i) => Ok(Value::Integer(i.abs())),
        Value::Number(d) => Ok(Value::Number(d.abs())),
        Value::Amount(a) => Ok(Value::Amount(a.abs())),
        Value::Position(p) => Ok(Value::Position(Position {
            units: p.units.abs(),
            cost: p.cost.clone(),
        })),
        Value::Null => Ok(Value::Null),
        other => Err(format!("abs() expects a numeric value, got {}", other.kind())),
    }
}

fn fn_empty(args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::Inventory(inv) => Ok(Value::Boolean(inv.is_empty())),
        Value::StringSet(s) => Ok(Value::Boolean(s.is_empty())),
        Value::Null => Ok(Value::Null),
        other => Err(format!(
            "empty() expects an inventory or set, got {}",
            other.kind()
        )),
    }
}
