//! Plan execution over a sorted entry stream.
//!
//! Execution never fails: problems with individual rows, a bad regex
//! built at runtime or a type mismatch inside a function, are recorded
//! as diagnostics and the affected cell becomes null. The shape of the
//! result is fixed by the plan, so callers always get their columns.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use quill_core::{format_directive, Decimal, Directive, FormatConfig, Inventory, Options, Posting};

use crate::ast::{BinaryOperator, SortDirection, UnaryOperator};
use crate::compile::{AggregateFn, CompiledAggregate, EvalExpr, EvalPrint, EvalQuery};
use crate::env::Context;
use crate::summarize::filter_entries;
use crate::value::{compare, compare_for_sort, Value, ValueType};

/// The rows produced by a select.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    /// Output columns, name and type, in declaration order.
    pub columns: Vec<(String, ValueType)>,
    /// One vector of cells per result row.
    pub rows: Vec<Vec<Value>>,
    /// Problems encountered while evaluating rows.
    pub diagnostics: Vec<String>,
}

impl QueryResult {
    /// Number of result rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the result has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The column names in order.
    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _)| name.as_str()).collect()
    }
}

/// One accumulating aggregation group.
struct Group<'a> {
    key: Vec<Value>,
    store: Vec<Value>,
    entry: &'a Directive,
    posting: Option<&'a Posting>,
}

/// Execute a compiled select against sorted entries.
pub fn execute_query(plan: &EvalQuery, entries: &[Directive], options: &Options) -> QueryResult {
    let mut diagnostics = Vec::new();

    let filtered: Vec<Directive>;
    let entries: &[Directive] = match &plan.from {
        Some(from) => {
            filtered = filter_entries(from, entries, options, &mut diagnostics);
            &filtered
        }
        None => entries,
    };

    let mut rows: Vec<Vec<Value>> = Vec::new();
    let mut groups: Vec<Group<'_>> = Vec::new();
    let mut group_lookup: HashMap<Vec<Value>, usize> = HashMap::new();
    // Running account balances, tracked only when some column reads them.
    let mut balances: HashMap<String, Inventory> = HashMap::new();

    // The group's representative entry and posting are taken from the
    // loop directly, not from the context, whose lifetime is pinned to
    // the balance snapshot of the current iteration.
    let mut add_row = |entry, posting, ctx: &Context<'_>, diagnostics: &mut Vec<String>| {
        if let Some(group_indexes) = &plan.group_indexes {
            let key: Vec<Value> = group_indexes
                .iter()
                .map(|&index| evaluate(&plan.targets[index].expr, ctx, diagnostics))
                .collect();
            let slot = match group_lookup.get(&key) {
                Some(&slot) => slot,
                None => {
                    let slot = groups.len();
                    group_lookup.insert(key.clone(), slot);
                    groups.push(Group {
                        key,
                        store: vec![Value::Null; plan.store_len],
                        entry,
                        posting,
                    });
                    slot
                }
            };
            let group = &mut groups[slot];
            for aggregate in &plan.aggregates {
                update_aggregate(aggregate, ctx, &mut group.store, diagnostics);
            }
        } else {
            rows.push(
                plan.targets
                    .iter()
                    .map(|target| evaluate(&target.expr, ctx, diagnostics))
                    .collect(),
            );
        }
    };

    for entry in entries {
        if plan.uses_postings {
            let Some(txn) = entry.as_transaction() else {
                continue;
            };
            for posting in &txn.postings {
                let snapshot = if plan.uses_balance {
                    let balance = balances.entry(posting.account.clone()).or_default();
                    balance.add(posting.position());
                    Some(balance.clone())
                } else {
                    None
                };
                let ctx = Context {
                    entry,
                    posting: Some(posting),
                    balance: snapshot.as_ref(),
                    store: None,
                };
                if passes_where(plan, &ctx, &mut diagnostics) {
                    add_row(entry, Some(posting), &ctx, &mut diagnostics);
                }
            }
        } else {
            let ctx = Context {
                entry,
                posting: None,
                balance: None,
                store: None,
            };
            if passes_where(plan, &ctx, &mut diagnostics) {
                add_row(entry, None, &ctx, &mut diagnostics);
            }
        }
    }

    // Finalize groups into rows, in first-seen order. Grouped targets
    // reuse the key cells, everything else evaluates with the group
    // store visible.
    if let Some(group_indexes) = &plan.group_indexes {
        for group in &groups {
            let ctx = Context {
                entry: group.entry,
                posting: group.posting,
                balance: None,
                store: Some(&group.store),
            };
            if let Some(having) = &plan.having {
                let value = evaluate(having, &ctx, &mut diagnostics);
                match value.as_truthy() {
                    Some(true) => {}
                    Some(false) => continue,
                    None => {
                        diagnostics.push(format!(
                            "HAVING evaluated to {}, expected a boolean",
                            value.kind()
                        ));
                        continue;
                    }
                }
            }
            let row: Vec<Value> = plan
                .targets
                .iter()
                .enumerate()
                .map(|(index, target)| {
                    match group_indexes.iter().position(|&g| g == index) {
                        Some(key_index) => group.key[key_index].clone(),
                        None => evaluate(&target.expr, &ctx, &mut diagnostics),
                    }
                })
                .collect();
            rows.push(row);
        }
    }

    if !plan.order_by.is_empty() {
        rows.sort_by(|a, b| {
            let mut ordering = Ordering::Equal;
            for &(index, direction) in &plan.order_by {
                ordering = compare_for_sort(&a[index], &b[index]);
                if direction == SortDirection::Descending {
                    ordering = ordering.reverse();
                }
                if ordering != Ordering::Equal {
                    break;
                }
            }
            ordering
        });
    }

    // Internal sort targets sit after the visible ones; drop them now
    // that ordering is done.
    let visible = plan
        .targets
        .iter()
        .take_while(|target| target.name.is_some())
        .count();
    if visible < plan.targets.len() {
        for row in &mut rows {
            row.truncate(visible);
        }
    }

    if plan.distinct {
        let mut seen: HashSet<Vec<Value>> = HashSet::new();
        rows.retain(|row| seen.insert(row.clone()));
    }

    if let Some(limit) = plan.limit {
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
    }

    tracing::debug!("executed query: {} rows, {} diagnostics", rows.len(), diagnostics.len());

    QueryResult {
        columns: plan
            .targets
            .iter()
            .take(visible)
            .map(|target| (target.name.clone().unwrap_or_default(), target.dtype))
            .collect(),
        rows,
        diagnostics,
    }
}

/// Execute a compiled print: filter, then render each entry back to
/// ledger syntax, blank-line separated.
pub fn execute_print(plan: &EvalPrint, entries: &[Directive], options: &Options) -> String {
    let mut diagnostics = Vec::new();
    let filtered: Vec<Directive>;
    let entries: &[Directive] = match &plan.from {
        Some(from) => {
            filtered = filter_entries(from, entries, options, &mut diagnostics);
            &filtered
        }
        None => entries,
    };
    for diagnostic in &diagnostics {
        tracing::warn!("print: {diagnostic}");
    }

    let config = FormatConfig::default();
    let mut out = String::new();
    for (i, entry) in entries.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&format_directive(entry, &config));
    }
    out
}

fn passes_where(plan: &EvalQuery, ctx: &Context<'_>, diagnostics: &mut Vec<String>) -> bool {
    let Some(where_clause) = &plan.where_clause else {
        return true;
    };
    let value = evaluate(where_clause, ctx, diagnostics);
    value.as_truthy().unwrap_or_else(|| {
        diagnostics.push(format!(
            "WHERE evaluated to {}, expected a boolean",
            value.kind()
        ));
        false
    })
}

/// Evaluate one expression against a row context.
pub(crate) fn evaluate(
    expr: &EvalExpr,
    ctx: &Context<'_>,
    diagnostics: &mut Vec<String>,
) -> Value {
    match expr {
        EvalExpr::Constant(value) => value.clone(),
        EvalExpr::Column(def) => (def.eval)(ctx),
        EvalExpr::Function { def, args } => {
            let values: Vec<Value> = args
                .iter()
                .map(|arg| evaluate(arg, ctx, diagnostics))
                .collect();
            match (def.eval)(&values) {
                Ok(value) => value,
                Err(message) => {
                    diagnostics.push(format!("{}(): {message}", def.name));
                    Value::Null
                }
            }
        }
        EvalExpr::Unary { op, operand } => {
            let value = evaluate(operand, ctx, diagnostics);
            match op {
                UnaryOperator::Not => match value.as_truthy() {
                    Some(truth) => Value::Boolean(!truth),
                    None => {
                        diagnostics.push(format!("NOT applied to {}", value.kind()));
                        Value::Null
                    }
                },
                UnaryOperator::Neg => negate(value, diagnostics),
            }
        }
        EvalExpr::Binary { op, left, right } => {
            evaluate_binary(*op, left, right, ctx, diagnostics)
        }
        EvalExpr::Regex { expr, pattern } => match evaluate(expr, ctx, diagnostics) {
            Value::String(subject) => Value::Boolean(pattern.is_match(&subject)),
            Value::Null => Value::Null,
            other => {
                diagnostics.push(format!("~ applied to {}", other.kind()));
                Value::Null
            }
        },
        EvalExpr::Slot(slot) => match ctx.store.and_then(|store| store.get(*slot)) {
            Some(value) => value.clone(),
            None => Value::Null,
        },
    }
}

fn negate(value: Value, diagnostics: &mut Vec<String>) -> Value {
    match value {
        Value::Integer(n) => match n.checked_neg() {
            Some(negated) => Value::Integer(negated),
            None => Value::Number(-Decimal::from(n)),
        },
        Value::Number(n) => Value::Number(-n),
        Value::Amount(amount) => Value::Amount(-amount),
        Value::Position(position) => Value::Position(position.neg()),
        Value::Inventory(inventory) => Value::Inventory(inventory.neg()),
        Value::Null => Value::Null,
        other => {
            diagnostics.push(format!("negation applied to {}", other.kind()));
            Value::Null
        }
    }
}

fn evaluate_binary(
    op: BinaryOperator,
    left: &EvalExpr,
    right: &EvalExpr,
    ctx: &Context<'_>,
    diagnostics: &mut Vec<String>,
) -> Value {
    // AND and OR short-circuit on the left operand.
    match op {
        BinaryOperator::And | BinaryOperator::Or => {
            let name = if op == BinaryOperator::And { "AND" } else { "OR" };
            let lhs = evaluate(left, ctx, diagnostics);
            let Some(lhs_truth) = lhs.as_truthy() else {
                diagnostics.push(format!("{name} applied to {}", lhs.kind()));
                return Value::Null;
            };
            if op == BinaryOperator::And && !lhs_truth {
                return Value::Boolean(false);
            }
            if op == BinaryOperator::Or && lhs_truth {
                return Value::Boolean(true);
            }
            let rhs = evaluate(right, ctx, diagnostics);
            match rhs.as_truthy() {
                Some(rhs_truth) => Value::Boolean(rhs_truth),
                None => {
                    diagnostics.push(format!("{name} applied to {}", rhs.kind()));
                    Value::Null
                }
            }
        }
        _ => {
            let lhs = evaluate(left, ctx, diagnostics);
            let rhs = evaluate(right, ctx, diagnostics);
            match op {
                BinaryOperator::Eq => Value::Boolean(lhs == rhs),
                BinaryOperator::Ne => Value::Boolean(lhs != rhs),
                BinaryOperator::Lt | BinaryOperator::Le | BinaryOperator::Gt | BinaryOperator::Ge => {
                    if lhs.is_null() || rhs.is_null() {
                        return Value::Null;
                    }
                    match compare(&lhs, &rhs) {
                        Some(ordering) => Value::Boolean(match op {
                            BinaryOperator::Lt => ordering == Ordering::Less,
                            BinaryOperator::Le => ordering != Ordering::Greater,
                            BinaryOperator::Gt => ordering == Ordering::Greater,
                            _ => ordering != Ordering::Less,
                        }),
                        None => {
                            diagnostics.push(format!(
                                "cannot compare {} with {}",
                                lhs.kind(),
                                rhs.kind()
                            ));
                            Value::Null
                        }
                    }
                }
                BinaryOperator::Regex => match (&lhs, &rhs) {
                    (Value::Null, _) | (_, Value::Null) => Value::Null,
                    (Value::String(subject), Value::String(pattern)) => {
                        match regex::Regex::new(pattern) {
                            Ok(regex) => Value::Boolean(regex.is_match(subject)),
                            Err(error) => {
                                diagnostics.push(format!("invalid regex {pattern:?}: {error}"));
                                Value::Null
                            }
                        }
                    }
                    _ => {
                        diagnostics
                            .push(format!("~ applied to {} and {}", lhs.kind(), rhs.kind()));
                        Value::Null
                    }
                },
                BinaryOperator::In => match (&lhs, &rhs) {
                    (_, Value::Null) => Value::Null,
                    (Value::Null, Value::StringSet(_)) => Value::Boolean(false),
                    (Value::String(item), Value::StringSet(set)) => {
                        Value::Boolean(set.contains(item))
                    }
                    _ => {
                        diagnostics
                            .push(format!("IN applied to {} and {}", lhs.kind(), rhs.kind()));
                        Value::Null
                    }
                },
                BinaryOperator::Add
                | BinaryOperator::Sub
                | BinaryOperator::Mul
                | BinaryOperator::Div => arithmetic(op, lhs, rhs, diagnostics),
                BinaryOperator::And | BinaryOperator::Or => Value::Null,
            }
        }
    }
}

fn arithmetic(
    op: BinaryOperator,
    lhs: Value,
    rhs: Value,
    diagnostics: &mut Vec<String>,
) -> Value {
    if lhs.is_null() || rhs.is_null() {
        return Value::Null;
    }
    // Integer pairs stay integers except under division; everything
    // else goes through decimals.
    if let (Value::Integer(a), Value::Integer(b)) = (&lhs, &rhs) {
        if op != BinaryOperator::Div {
            let exact = match op {
                BinaryOperator::Add => a.checked_add(*b),
                BinaryOperator::Sub => a.checked_sub(*b),
                _ => a.checked_mul(*b),
            };
            if let Some(n) = exact {
                return Value::Integer(n);
            }
        }
    }
    let (Some(a), Some(b)) = (lhs.as_decimal(), rhs.as_decimal()) else {
        diagnostics.push(format!(
            "arithmetic on {} and {}",
            lhs.kind(),
            rhs.kind()
        ));
        return Value::Null;
    };
    let result = match op {
        BinaryOperator::Add => a.checked_add(b),
        BinaryOperator::Sub => a.checked_sub(b),
        BinaryOperator::Mul => a.checked_mul(b),
        _ => {
            if b.is_zero() {
                diagnostics.push("division by zero".to_string());
                return Value::Null;
            }
            a.checked_div(b)
        }
    };
    match result {
        Some(n) => Value::Number(n),
        None => {
            diagnostics.push("arithmetic overflow".to_string());
            Value::Null
        }
    }
}

fn update_aggregate(
    aggregate: &CompiledAggregate,
    ctx: &Context<'_>,
    store: &mut [Value],
    diagnostics: &mut Vec<String>,
) {
    let arg = aggregate
        .arg
        .as_ref()
        .map(|expr| evaluate(expr, ctx, diagnostics));
    let Some(slot) = store.get_mut(aggregate.slot) else {
        return;
    };
    match aggregate.func {
        AggregateFn::Count => {
            *slot = match slot {
                Value::Integer(n) => Value::Integer(n.saturating_add(1)),
                _ => Value::Integer(1),
            };
        }
        AggregateFn::Sum => {
            let Some(arg) = arg else { return };
            if arg.is_null() {
                return;
            }
            sum_into(slot, arg, diagnostics);
        }
        AggregateFn::First => {
            if slot.is_null() {
                if let Some(arg) = arg {
                    if !arg.is_null() {
                        *slot = arg;
                    }
                }
            }
        }
        AggregateFn::Last => {
            if let Some(arg) = arg {
                if !arg.is_null() {
                    *slot = arg;
                }
            }
        }
        AggregateFn::Min | AggregateFn::Max => {
            let Some(arg) = arg else { return };
            if arg.is_null() {
                return;
            }
            if slot.is_null() {
                *slot = arg;
                return;
            }
            match compare(slot, &arg) {
                Some(ordering) => {
                    let replace = if aggregate.func == AggregateFn::Min {
                        ordering == Ordering::Greater
                    } else {
                        ordering == Ordering::Less
                    };
                    if replace {
                        *slot = arg;
                    }
                }
                None => {
                    diagnostics.push(format!(
                        "cannot compare {} with {}",
                        slot.kind(),
                        arg.kind()
                    ));
                }
            }
        }
        AggregateFn::Distinct => {
            let Some(arg) = arg else { return };
            if arg.is_null() {
                return;
            }
            let rendered = arg.to_string();
            match slot {
                Value::StringSet(set) => {
                    set.insert(rendered);
                }
                _ => {
                    *slot = Value::StringSet([rendered].into_iter().collect());
                }
            }
        }
    }
}

/// Fold one value into a running sum slot.
fn sum_into(slot: &mut Value, arg: Value, diagnostics: &mut Vec<String>) {
    let next = match (&*slot, arg) {
        (Value::Null, Value::Amount(amount)) => {
            let mut inventory = Inventory::new();
            inventory.add_amount(amount);
            Value::Inventory(inventory)
        }
        (Value::Null, Value::Position(position)) => {
            let mut inventory = Inventory::new();
            inventory.add(position);
            Value::Inventory(inventory)
        }
        (Value::Null, arg @ (Value::Integer(_) | Value::Number(_) | Value::Inventory(_))) => arg,
        (Value::Integer(a), Value::Integer(b)) => match a.checked_add(b) {
            Some(n) => Value::Integer(n),
            None => Value::Number(Decimal::from(*a) + Decimal::from(b)),
        },
        (Value::Integer(a), Value::Number(b)) => Value::Number(Decimal::from(*a) + b),
        (Value::Number(a), Value::Integer(b)) => Value::Number(a + Decimal::from(b)),
        (Value::Number(a), Value::Number(b)) => Value::Number(a + b),
        (Value::Inventory(inventory), Value::Amount(amount)) => {
            let mut inventory = inventory.clone();
            inventory.add_amount(amount);
            Value::Inventory(inventory)
        }
        (Value::Inventory(inventory), Value::Position(position)) => {
            let mut inventory = inventory.clone();
            inventory.add(position);
            Value::Inventory(inventory)
        }
        (Value::Inventory(inventory), Value::Inventory(other)) => {
            let mut inventory = inventory.clone();
            inventory.merge(&other);
            Value::Inventory(inventory)
        }
        (_, arg) => {
            diagnostics.push(format!("cannot sum {} into {}", arg.kind(), slot.kind()));
            return;
        }
    };
    *slot = next;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::{compile, Plan};
    use crate::parser::parse;
    use chrono::NaiveDate;
    use quill_core::{Amount, Open, Transaction};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dinner(d: NaiveDate, amount: Decimal) -> Directive {
        Directive::Transaction(
            Transaction::new(d, "Dinner")
                .with_posting(Posting::new(
                    "Assets:Bank:Checking",
                    Amount::new(-amount, "USD"),
                ))
                .with_posting(Posting::new(
                    "Expenses:Restaurant",
                    Amount::new(amount, "USD"),
                )),
        )
    }

    fn ledger_entries() -> Vec<Directive> {
        vec![
            Directive::Open(Open::new(date(2010, 1, 1), "Assets:Bank:Checking")),
            Directive::Open(Open::new(date(2010, 1, 1), "Expenses:Restaurant")),
            dinner(date(2010, 2, 23), dec!(100.00)),
            dinner(date(2011, 5, 2), dec!(101.00)),
            dinner(date(2012, 2, 29), dec!(102.00)),
            dinner(date(2013, 3, 17), dec!(103.00)),
            dinner(date(2014, 4, 4), dec!(104.00)),
        ]
    }

    fn run(source: &str, entries: &[Directive]) -> QueryResult {
        let query = parse(source).expect("query should parse");
        let plan = compile(&query).expect("query should compile");
        match plan {
            Plan::Select(select) => execute_query(&select, entries, &Options::default()),
            Plan::Print(_) => panic!("expected a select plan"),
        }
    }

    #[test]
    fn test_posting_granularity() {
        let result = run("SELECT account, number", &ledger_entries());
        assert_eq!(result.column_names(), vec!["account", "number"]);
        // Two postings per dinner, directives without postings skipped.
        assert_eq!(result.len(), 10);
        assert_eq!(result.rows[0][0], Value::String("Assets:Bank:Checking".into()));
        assert_eq!(result.rows[0][1], Value::Number(dec!(-100.00)));
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_entry_granularity() {
        let result = run("SELECT date, narration", &ledger_entries());
        // One row per directive, including the opens.
        assert_eq!(result.len(), 7);
        assert_eq!(result.rows[0][0], Value::Date(date(2010, 1, 1)));
        assert_eq!(result.rows[0][1], Value::Null);
        assert_eq!(result.rows[2][1], Value::String("Dinner".into()));
    }

    #[test]
    fn test_where_filters_rows() {
        let result = run(
            "SELECT account, number WHERE year = 2013 AND number > 0",
            &ledger_entries(),
        );
        assert_eq!(result.len(), 1);
        assert_eq!(result.rows[0][0], Value::String("Expenses:Restaurant".into()));
        assert_eq!(result.rows[0][1], Value::Number(dec!(103.00)));
    }

    #[test]
    fn test_running_balance() {
        let result = run(
            "SELECT balance WHERE account = 'Expenses:Restaurant'",
            &ledger_entries(),
        );
        assert_eq!(result.len(), 5);
        let last = &result.rows[4][0];
        match last {
            Value::Inventory(inventory) => {
                assert_eq!(inventory.units_of("USD"), dec!(510.00));
            }
            other => panic!("expected an inventory, got {other:?}"),
        }
    }

    #[test]
    fn test_group_by_with_sum() {
        let result = run(
            "SELECT account, sum(position) GROUP BY account ORDER BY account",
            &ledger_entries(),
        );
        assert_eq!(result.len(), 2);
        assert_eq!(result.rows[0][0], Value::String("Assets:Bank:Checking".into()));
        match &result.rows[0][1] {
            Value::Inventory(inventory) => {
                assert_eq!(inventory.units_of("USD"), dec!(-510.00));
            }
            other => panic!("expected an inventory, got {other:?}"),
        }
    }

    #[test]
    fn test_global_aggregation() {
        let result = run("SELECT count(*), sum(number)", &ledger_entries());
        assert_eq!(result.len(), 1);
        assert_eq!(result.rows[0][0], Value::Integer(10));
        // Both sides of every dinner cancel out.
        assert_eq!(result.rows[0][1], Value::Number(dec!(0.00)));
    }

    #[test]
    fn test_first_last_min_max() {
        let result = run(
            "SELECT first(date), last(date), min(number), max(number)",
            &ledger_entries(),
        );
        assert_eq!(result.rows[0][0], Value::Date(date(2010, 2, 23)));
        assert_eq!(result.rows[0][1], Value::Date(date(2014, 4, 4)));
        assert_eq!(result.rows[0][2], Value::Number(dec!(-104.00)));
        assert_eq!(result.rows[0][3], Value::Number(dec!(104.00)));
    }

    #[test]
    fn test_order_by_desc_with_limit() {
        let result = run(
            "SELECT date, account WHERE number > 0 ORDER BY date DESC LIMIT 2",
            &ledger_entries(),
        );
        assert_eq!(result.len(), 2);
        assert_eq!(result.rows[0][0], Value::Date(date(2014, 4, 4)));
        assert_eq!(result.rows[1][0], Value::Date(date(2013, 3, 17)));
    }

    #[test]
    fn test_order_by_invisible_target_is_dropped() {
        let result = run(
            "SELECT account WHERE number > 0 ORDER BY date DESC",
            &ledger_entries(),
        );
        assert_eq!(result.columns.len(), 1);
        assert!(result.rows.iter().all(|row| row.len() == 1));
    }

    #[test]
    fn test_distinct_collapses_duplicates() {
        let result = run("SELECT DISTINCT account", &ledger_entries());
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_distinct_aggregate_collects_values() {
        let result = run("SELECT distinct(account)", &ledger_entries());
        assert_eq!(result.len(), 1);
        match &result.rows[0][0] {
            Value::StringSet(set) => {
                assert_eq!(set.len(), 2);
                assert!(set.contains("Assets:Bank:Checking"));
                assert!(set.contains("Expenses:Restaurant"));
            }
            other => panic!("expected a string set, got {other:?}"),
        }
    }

    #[test]
    fn test_having_filters_groups() {
        let result = run(
            "SELECT account, count(*) GROUP BY account HAVING count(*) > 10",
            &ledger_entries(),
        );
        assert!(result.is_empty());
    }

    #[test]
    fn test_function_type_mismatch_becomes_diagnostic() {
        let result = run("SELECT parent(date)", &ledger_entries());
        assert_eq!(result.len(), 7);
        assert!(result.rows.iter().all(|row| row[0] == Value::Null));
        assert!(!result.diagnostics.is_empty());
    }

    #[test]
    fn test_division_by_zero_is_null() {
        let result = run("SELECT number / 0 LIMIT 1", &ledger_entries());
        assert_eq!(result.rows[0][0], Value::Null);
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.contains("division by zero")));
    }

    #[test]
    fn test_from_clause_summarizes_before_execution() {
        let result = run(
            "SELECT date, account FROM OPEN ON 2013-01-01 WHERE account = 'Equity:Opening-Balances'",
            &ledger_entries(),
        );
        // Two opening balance postings, one per summarized account.
        assert_eq!(result.len(), 2);
        assert_eq!(result.rows[0][0], Value::Date(date(2012, 12, 31)));
    }

    #[test]
    fn test_print_renders_entries() {
        let query = parse("PRINT FROM year = 2014").expect("query should parse");
        let plan = compile(&query).expect("query should compile");
        let Plan::Print(print) = plan else {
            panic!("expected a print plan");
        };
        let output = execute_print(&print, &ledger_entries(), &Options::default());
        assert!(output.contains("2014-04-04 * \"Dinner\""));
        assert!(!output.contains("2013-03-17"));
    }
}
