//! Query compiler.
//!
//! Turns a parsed [`Query`] into an executable [`Plan`]: names are
//! resolved against the column and function tables, output types are
//! inferred bottom-up, aggregates are assigned storage slots, and the
//! `BALANCES` and `JOURNAL` forms are rewritten into the `SELECT` they
//! abbreviate. Everything that can be rejected without looking at a
//! single entry is rejected here.

use chrono::NaiveDate;

use crate::ast::{
    self, BalancesQuery, BinaryOperator, CloseClause, Expr, JournalQuery, Literal, Query,
    SelectQuery, SortDirection, Target, UnaryOperator,
};
use crate::env::{self, ColumnDef, EnvKind, FuncDef};
use crate::error::CompileError;
use crate::value::{Value, ValueType};

/// A compiled, executable plan.
#[derive(Debug)]
pub enum Plan {
    /// A row-producing query.
    Select(EvalQuery),
    /// A `PRINT` statement.
    Print(EvalPrint),
}

/// A compiled `PRINT` statement.
#[derive(Debug)]
pub struct EvalPrint {
    /// Entry filter, when a `FROM` clause was given.
    pub from: Option<EvalFrom>,
}

/// A compiled `FROM` clause.
#[derive(Debug)]
pub struct EvalFrom {
    /// Entry-level predicate.
    pub filter: Option<EvalExpr>,
    /// Summarize entries before this date.
    pub open_on: Option<NaiveDate>,
    /// Truncate entries and book conversions.
    pub close: Option<CloseClause>,
    /// Transfer income statement balances to equity.
    pub clear: bool,
}

/// One compiled projection target.
///
/// Targets without a name were added for `GROUP BY` or `ORDER BY` and
/// are dropped from the visible row after sorting.
#[derive(Debug)]
pub struct CompiledTarget {
    /// Output column name, `None` for internal targets.
    pub name: Option<String>,
    /// Declared output type.
    pub dtype: ValueType,
    /// The expression to evaluate.
    pub expr: EvalExpr,
    /// Whether the expression contains an aggregate.
    pub is_aggregate: bool,
}

/// A compiled row-producing query.
#[derive(Debug)]
pub struct EvalQuery {
    /// All targets, visible ones first.
    pub targets: Vec<CompiledTarget>,
    /// Entry filter.
    pub from: Option<EvalFrom>,
    /// Row filter.
    pub where_clause: Option<EvalExpr>,
    /// Indexes into `targets` forming the group key. `None` means the
    /// query is not aggregated; an empty list is one global group.
    pub group_indexes: Option<Vec<usize>>,
    /// Group filter, evaluated after aggregation.
    pub having: Option<EvalExpr>,
    /// Sort keys as (target index, direction).
    pub order_by: Vec<(usize, SortDirection)>,
    /// Row limit.
    pub limit: Option<u64>,
    /// Deduplicate visible rows.
    pub distinct: bool,
    /// Iterate postings rather than whole entries.
    pub uses_postings: bool,
    /// Maintain a running balance per account.
    pub uses_balance: bool,
    /// Aggregations to update on every row.
    pub aggregates: Vec<CompiledAggregate>,
    /// Number of aggregate slots per group.
    pub store_len: usize,
}

/// One aggregation bound to a storage slot.
#[derive(Debug)]
pub struct CompiledAggregate {
    /// Which aggregation to apply.
    pub func: AggregateFn,
    /// Argument expression; `None` for `count(*)`.
    pub arg: Option<EvalExpr>,
    /// Slot index in the group store.
    pub slot: usize,
    /// Result type.
    pub dtype: ValueType,
}

/// The supported aggregation functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFn {
    /// Sum of numbers, or of amounts and positions into an inventory.
    Sum,
    /// Row count.
    Count,
    /// First non-null value seen.
    First,
    /// Last non-null value seen.
    Last,
    /// Smallest value.
    Min,
    /// Largest value.
    Max,
    /// Set of distinct rendered values.
    Distinct,
}

/// A compiled expression.
#[derive(Debug)]
pub enum EvalExpr {
    /// A literal constant.
    Constant(Value),
    /// A column reference.
    Column(&'static ColumnDef),
    /// A scalar function call.
    Function {
        /// The function.
        def: &'static FuncDef,
        /// Compiled arguments.
        args: Vec<EvalExpr>,
    },
    /// A unary operation.
    Unary {
        /// The operator.
        op: UnaryOperator,
        /// The operand.
        operand: Box<EvalExpr>,
    },
    /// A binary operation.
    Binary {
        /// The operator.
        op: BinaryOperator,
        /// Left operand.
        left: Box<EvalExpr>,
        /// Right operand.
        right: Box<EvalExpr>,
    },
    /// A match against a pattern known at compile time.
    Regex {
        /// The matched expression.
        expr: Box<EvalExpr>,
        /// The compiled pattern.
        pattern: regex::Regex,
    },
    /// Read an aggregate slot from the group store.
    Slot(usize),
}

/// Allocates consecutive aggregate storage slots.
#[derive(Debug, Default)]
pub struct Allocator {
    next: usize,
}

impl Allocator {
    /// Create an allocator with no slots handed out.
    #[must_use]
    pub const fn new() -> Self {
        Self { next: 0 }
    }

    /// Hand out the next slot index.
    pub fn allocate(&mut self) -> usize {
        let slot = self.next;
        self.next += 1;
        slot
    }

    /// Number of slots allocated so far.
    #[must_use]
    pub const fn slots(&self) -> usize {
        self.next
    }

    /// Create a store with one null per allocated slot.
    #[must_use]
    pub fn create_store(&self) -> Vec<Value> {
        vec![Value::Null; self.next]
    }
}

/// Compile a parsed query into an executable plan.
///
/// # Errors
///
/// Returns a [`CompileError`] for unknown names, misplaced aggregates,
/// grouping violations, bad regular expressions and empty `FROM`
/// clauses.
pub fn compile(query: &Query) -> Result<Plan, CompileError> {
    match query {
        Query::Select(select) => compile_select(select).map(Plan::Select),
        Query::Print(print) => Ok(Plan::Print(EvalPrint {
            from: compile_from(print.from.as_ref())?,
        })),
        Query::Balances(balances) => compile_select(&desugar_balances(balances)).map(Plan::Select),
        Query::Journal(journal) => compile_select(&desugar_journal(journal)).map(Plan::Select),
    }
}

/// `BALANCES [AT fn]` is `SELECT account, [fn(]sum(position)[)]
/// GROUP BY account ORDER BY account`.
fn desugar_balances(query: &BalancesQuery) -> SelectQuery {
    let mut total = Expr::function("sum", vec![Expr::column("position")]);
    if let Some(func) = &query.at {
        total = Expr::function(func.clone(), vec![total]);
    }
    SelectQuery {
        targets: vec![Target::new(Expr::column("account")), Target::new(total)],
        from: query.from.clone(),
        group_by: Some(vec![Expr::column("account")]),
        order_by: Some(vec![ast::OrderSpec {
            expr: Expr::column("account"),
            direction: SortDirection::Ascending,
        }]),
        ..SelectQuery::default()
    }
}

/// `JOURNAL ["regex"] [AT fn]` is `SELECT date, flag, payee,
/// narration, [fn(]position[)], balance [WHERE account ~ "regex"]`.
fn desugar_journal(query: &JournalQuery) -> SelectQuery {
    let mut change = Expr::column("position");
    if let Some(func) = &query.at {
        change = Expr::function(func.clone(), vec![change]);
    }
    let where_clause = query.account_pattern.as_ref().map(|pattern| {
        Expr::binary(
            BinaryOperator::Regex,
            Expr::column("account"),
            Expr::string(pattern.clone()),
        )
    });
    SelectQuery {
        targets: vec![
            Target::new(Expr::column("date")),
            Target::new(Expr::column("flag")),
            Target::new(Expr::column("payee")),
            Target::new(Expr::column("narration")),
            Target::new(change),
            Target::new(Expr::column("balance")),
        ],
        from: query.from.clone(),
        where_clause,
        ..SelectQuery::default()
    }
}

fn compile_from(from: Option<&ast::FromClause>) -> Result<Option<EvalFrom>, CompileError> {
    let Some(from) = from else {
        return Ok(None);
    };
    if from.is_empty() {
        return Err(CompileError::EmptyFrom);
    }
    let filter = match &from.filter {
        Some(expr) => {
            let mut compiler = Compiler::new(EnvKind::Entries, false, "FROM");
            Some(compiler.compile_expr(expr, false)?.0)
        }
        None => None,
    };
    Ok(Some(EvalFrom {
        filter,
        open_on: from.open_on,
        close: from.close,
        clear: from.clear,
    }))
}

/// `SELECT *` expands to the conventional journal projection.
fn wildcard_targets() -> Vec<Target> {
    ["date", "flag", "payee", "narration", "position"]
        .iter()
        .map(|name| Target::new(Expr::column(*name)))
        .collect()
}

fn compile_select(query: &SelectQuery) -> Result<EvalQuery, CompileError> {
    let from = compile_from(query.from.as_ref())?;

    // WHERE sees posting columns but no aggregates.
    let mut where_compiler = Compiler::new(EnvKind::Postings, false, "WHERE");
    let where_clause = match &query.where_clause {
        Some(expr) => Some(where_compiler.compile_expr(expr, false)?.0),
        None => None,
    };

    let expanded;
    let target_list: &[Target] =
        if query.targets.len() == 1 && matches!(query.targets[0].expr, Expr::Wildcard) {
            expanded = wildcard_targets();
            &expanded
        } else {
            &query.targets
        };

    let mut select = SelectCompiler::new();
    for target in target_list {
        select.add_visible_target(target)?;
    }
    select.visible_len = select.targets.len();

    let having = match &query.having {
        Some(expr) => {
            select.compiler.clause = "HAVING";
            Some(select.compiler.compile_expr(expr, false)?.0)
        }
        None => None,
    };

    let mut order_by = Vec::new();
    if let Some(specs) = &query.order_by {
        for spec in specs {
            let index = select.resolve_target_ref(&spec.expr, "ORDER BY")?;
            order_by.push((index, spec.direction));
        }
    }

    let mut group_indexes = None;
    if let Some(exprs) = &query.group_by {
        let mut indexes: Vec<usize> = Vec::with_capacity(exprs.len());
        for expr in exprs {
            let index = select.resolve_target_ref(expr, "GROUP BY")?;
            if select.targets[index].is_aggregate {
                return Err(CompileError::GroupByAggregate);
            }
            if !indexes.contains(&index) {
                indexes.push(index);
            }
        }
        group_indexes = Some(indexes);
    }

    // Any aggregate anywhere makes this an aggregated query; without
    // an explicit GROUP BY there is a single global group and every
    // remaining target must itself be aggregated.
    if group_indexes.is_none() && !select.compiler.aggregates.is_empty() {
        group_indexes = Some(Vec::new());
    }
    if let Some(indexes) = &group_indexes {
        for (index, target) in select.targets.iter().enumerate() {
            if !target.is_aggregate && !indexes.contains(&index) {
                let name = target
                    .name
                    .clone()
                    .unwrap_or_else(|| "internal sort key".to_string());
                return Err(CompileError::NotGrouped(name));
            }
        }
    }

    let uses_postings = select.compiler.uses_postings || where_compiler.uses_postings;
    let uses_balance = select.compiler.uses_balance || where_compiler.uses_balance;

    let eval = EvalQuery {
        store_len: select.compiler.allocator.slots(),
        targets: select.targets,
        from,
        where_clause,
        group_indexes,
        having,
        order_by,
        limit: query.limit,
        distinct: query.distinct,
        uses_postings,
        uses_balance,
        aggregates: select.compiler.aggregates,
    };
    tracing::debug!(
        "compiled query: {} targets, {} aggregates, grouped: {}",
        eval.targets.len(),
        eval.aggregates.len(),
        eval.group_indexes.is_some(),
    );
    Ok(eval)
}

/// Target list state shared by GROUP BY and ORDER BY resolution.
struct SelectCompiler {
    compiler: Compiler,
    targets: Vec<CompiledTarget>,
    /// Source expression of each target, for structural matching.
    target_asts: Vec<Expr>,
    used_names: Vec<String>,
    visible_len: usize,
}

impl SelectCompiler {
    fn new() -> Self {
        Self {
            compiler: Compiler::new(EnvKind::Postings, true, "targets"),
            targets: Vec::new(),
            target_asts: Vec::new(),
            used_names: Vec::new(),
            visible_len: 0,
        }
    }

    fn add_visible_target(&mut self, target: &Target) -> Result<(), CompileError> {
        self.compiler.clause = "targets";
        self.compiler.saw_aggregate = false;
        let (expr, dtype) = self.compiler.compile_expr(&target.expr, false)?;
        let base = target
            .alias
            .clone()
            .unwrap_or_else(|| synthesize_name(&target.expr));
        let name = unique_name(&base, &mut self.used_names);
        self.targets.push(CompiledTarget {
            name: Some(name),
            dtype,
            expr,
            is_aggregate: self.compiler.saw_aggregate,
        });
        self.target_asts.push(target.expr.clone());
        Ok(())
    }

    /// Resolve a GROUP BY or ORDER BY item to a target index: a
    /// 1-based column position, an output column name, an expression
    /// already in the target list, or failing those, a new internal
    /// target.
    fn resolve_target_ref(
        &mut self,
        expr: &Expr,
        clause: &'static str,
    ) -> Result<usize, CompileError> {
        if let Expr::Literal(Literal::Integer(position)) = expr.unwrap_paren() {
            let position = *position;
            return usize::try_from(position)
                .ok()
                .and_then(|p| p.checked_sub(1))
                .filter(|index| *index < self.visible_len)
                .ok_or(CompileError::BadPosition { clause, position });
        }

        if let Expr::Column(name) = expr.unwrap_paren() {
            let by_name = self.targets.iter().position(|t| {
                t.name
                    .as_deref()
                    .is_some_and(|n| n.eq_ignore_ascii_case(name))
            });
            if let Some(index) = by_name {
                return Ok(index);
            }
        }

        if let Some(index) = self.target_asts.iter().position(|t| t.matches(expr)) {
            return Ok(index);
        }

        self.compiler.clause = clause;
        self.compiler.saw_aggregate = false;
        let (compiled, dtype) = self.compiler.compile_expr(expr, false)?;
        self.targets.push(CompiledTarget {
            name: None,
            dtype,
            expr: compiled,
            is_aggregate: self.compiler.saw_aggregate,
        });
        self.target_asts.push(expr.clone());
        Ok(self.targets.len() - 1)
    }
}

/// Expression compiler for one clause.
struct Compiler {
    env: EnvKind,
    allow_aggregates: bool,
    clause: &'static str,
    aggregates: Vec<CompiledAggregate>,
    /// Source expression of each aggregate, for slot sharing.
    agg_keys: Vec<Expr>,
    allocator: Allocator,
    saw_aggregate: bool,
    uses_postings: bool,
    uses_balance: bool,
}

impl Compiler {
    fn new(env: EnvKind, allow_aggregates: bool, clause: &'static str) -> Self {
        Self {
            env,
            allow_aggregates,
            clause,
            aggregates: Vec::new(),
            agg_keys: Vec::new(),
            allocator: Allocator::new(),
            saw_aggregate: false,
            uses_postings: false,
            uses_balance: false,
        }
    }

    fn compile_expr(
        &mut self,
        expr: &Expr,
        in_aggregate: bool,
    ) -> Result<(EvalExpr, ValueType), CompileError> {
        match expr {
            Expr::Wildcard => Err(CompileError::UnexpectedWildcard),
            Expr::Paren(inner) => self.compile_expr(inner, in_aggregate),
            Expr::Column(name) => self.compile_column(name),
            Expr::Literal(literal) => Ok(compile_literal(literal)),
            Expr::Function(call) => self.compile_function(call, in_aggregate),
            Expr::UnaryOp(unary) => {
                let (operand, dtype) = self.compile_expr(&unary.operand, in_aggregate)?;
                let dtype = match unary.op {
                    UnaryOperator::Not => ValueType::Boolean,
                    UnaryOperator::Neg => dtype,
                };
                Ok((
                    EvalExpr::Unary {
                        op: unary.op,
                        operand: Box::new(operand),
                    },
                    dtype,
                ))
            }
            Expr::BinaryOp(binary) => self.compile_binary(binary, in_aggregate),
        }
    }

    fn compile_column(&mut self, name: &str) -> Result<(EvalExpr, ValueType), CompileError> {
        let def = env::lookup_column(self.env, name).ok_or_else(|| CompileError::UnknownColumn {
            name: name.to_string(),
            context: self.clause,
        })?;
        if self.env == EnvKind::Postings && env::lookup_column(EnvKind::Entries, name).is_none() {
            self.uses_postings = true;
            if def.name == "balance" {
                self.uses_balance = true;
            }
        }
        Ok((EvalExpr::Column(def), def.dtype))
    }

    fn compile_binary(
        &mut self,
        binary: &ast::BinaryOp,
        in_aggregate: bool,
    ) -> Result<(EvalExpr, ValueType), CompileError> {
        let (left, left_ty) = self.compile_expr(&binary.left, in_aggregate)?;
        let (right, right_ty) = self.compile_expr(&binary.right, in_aggregate)?;

        // A literal pattern compiles once; a computed one is checked
        // row by row.
        if binary.op == BinaryOperator::Regex {
            if let EvalExpr::Constant(Value::String(pattern)) = &right {
                let compiled =
                    regex::Regex::new(pattern).map_err(|e| CompileError::InvalidRegex {
                        pattern: pattern.clone(),
                        message: e.to_string(),
                    })?;
                return Ok((
                    EvalExpr::Regex {
                        expr: Box::new(left),
                        pattern: compiled,
                    },
                    ValueType::Boolean,
                ));
            }
        }

        let dtype = match binary.op {
            BinaryOperator::Add | BinaryOperator::Sub | BinaryOperator::Mul => {
                if left_ty == ValueType::Integer && right_ty == ValueType::Integer {
                    ValueType::Integer
                } else {
                    ValueType::Number
                }
            }
            BinaryOperator::Div => ValueType::Number,
            _ => ValueType::Boolean,
        };
        Ok((
            EvalExpr::Binary {
                op: binary.op,
                left: Box::new(left),
                right: Box::new(right),
            },
            dtype,
        ))
    }

    fn compile_function(
        &mut self,
        call: &ast::FunctionCall,
        in_aggregate: bool,
    ) -> Result<(EvalExpr, ValueType), CompileError> {
        if let Some(func) = aggregate_fn(&call.name) {
            return self.compile_aggregate(func, call, in_aggregate);
        }

        let def = env::lookup_function(&call.name)
            .ok_or_else(|| CompileError::UnknownFunction(call.name.clone()))?;
        if call.args.len() < def.min_args || call.args.len() > def.max_args {
            return Err(CompileError::InvalidArguments {
                name: def.name.to_string(),
                expected: expected_arity(def.min_args, def.max_args),
                got: call.args.len(),
            });
        }

        let mut args = Vec::with_capacity(call.args.len());
        let mut arg_types = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            let (compiled, dtype) = self.compile_expr(arg, in_aggregate)?;
            args.push(compiled);
            arg_types.push(dtype);
        }
        let dtype = (def.result)(&arg_types);
        Ok((EvalExpr::Function { def, args }, dtype))
    }

    fn compile_aggregate(
        &mut self,
        func: AggregateFn,
        call: &ast::FunctionCall,
        in_aggregate: bool,
    ) -> Result<(EvalExpr, ValueType), CompileError> {
        if !self.allow_aggregates {
            return Err(CompileError::AggregateNotAllowed {
                name: call.name.to_ascii_lowercase(),
                context: self.clause,
            });
        }
        if in_aggregate {
            return Err(CompileError::NestedAggregate);
        }
        self.saw_aggregate = true;

        let arg_ast = match call.args.as_slice() {
            [] if func == AggregateFn::Count => None,
            [arg]
                if func == AggregateFn::Count
                    && matches!(arg.unwrap_paren(), Expr::Wildcard) =>
            {
                None
            }
            [arg] => Some(arg),
            args => {
                let expected = if func == AggregateFn::Count {
                    "0 or 1".to_string()
                } else {
                    "1".to_string()
                };
                return Err(CompileError::InvalidArguments {
                    name: call.name.to_ascii_lowercase(),
                    expected,
                    got: args.len(),
                });
            }
        };

        // Textually equal aggregations share one slot.
        let call_expr = Expr::Function(call.clone());
        if let Some(index) = self.agg_keys.iter().position(|k| k.matches(&call_expr)) {
            let existing = &self.aggregates[index];
            return Ok((EvalExpr::Slot(existing.slot), existing.dtype));
        }

        let (arg, arg_type) = match arg_ast {
            Some(expr) => {
                let (compiled, dtype) = self.compile_expr(expr, true)?;
                (Some(compiled), Some(dtype))
            }
            None => (None, None),
        };

        let dtype = aggregate_dtype(func, arg_type);
        let slot = self.allocator.allocate();
        self.aggregates.push(CompiledAggregate {
            func,
            arg,
            slot,
            dtype,
        });
        self.agg_keys.push(call_expr);
        Ok((EvalExpr::Slot(slot), dtype))
    }
}

fn aggregate_fn(name: &str) -> Option<AggregateFn> {
    let func = match name.to_ascii_lowercase().as_str() {
        "sum" => AggregateFn::Sum,
        "count" => AggregateFn::Count,
        "first" => AggregateFn::First,
        "last" => AggregateFn::Last,
        "min" => AggregateFn::Min,
        "max" => AggregateFn::Max,
        "distinct" => AggregateFn::Distinct,
        _ => return None,
    };
    Some(func)
}

fn aggregate_dtype(func: AggregateFn, arg: Option<ValueType>) -> ValueType {
    match func {
        AggregateFn::Count => ValueType::Integer,
        AggregateFn::Distinct => ValueType::StringSet,
        AggregateFn::Sum => match arg {
            Some(ValueType::Integer) => ValueType::Integer,
            Some(ValueType::Amount | ValueType::Position | ValueType::Inventory) => {
                ValueType::Inventory
            }
            _ => ValueType::Number,
        },
        AggregateFn::First | AggregateFn::Last | AggregateFn::Min | AggregateFn::Max => {
            arg.unwrap_or(ValueType::String)
        }
    }
}

fn compile_literal(literal: &Literal) -> (EvalExpr, ValueType) {
    match literal {
        Literal::String(s) => (
            EvalExpr::Constant(Value::String(s.clone())),
            ValueType::String,
        ),
        Literal::Number(d) => (EvalExpr::Constant(Value::Number(*d)), ValueType::Number),
        Literal::Integer(i) => (EvalExpr::Constant(Value::Integer(*i)), ValueType::Integer),
        Literal::Date(d) => (EvalExpr::Constant(Value::Date(*d)), ValueType::Date),
        Literal::Boolean(b) => (EvalExpr::Constant(Value::Boolean(*b)), ValueType::Boolean),
        Literal::Null => (EvalExpr::Constant(Value::Null), ValueType::String),
    }
}

fn expected_arity(min: usize, max: usize) -> String {
    if min == max {
        min.to_string()
    } else {
        format!("{min} to {max}")
    }
}

/// Output column name for a target without an alias.
fn synthesize_name(expr: &Expr) -> String {
    match expr.unwrap_paren() {
        Expr::Wildcard => "*".to_string(),
        Expr::Column(name) => name.to_ascii_lowercase(),
        Expr::Function(call) => {
            let mut name = call.name.to_ascii_lowercase();
            for arg in &call.args {
                name.push('_');
                name.push_str(&synthesize_name(arg));
            }
            name
        }
        Expr::Literal(literal) => match literal {
            Literal::String(s) => s.clone(),
            Literal::Number(d) => d.to_string(),
            Literal::Integer(i) => i.to_string(),
            Literal::Date(d) => d.to_string(),
            Literal::Boolean(b) => if *b { "true" } else { "false" }.to_string(),
            Literal::Null => "null".to_string(),
        },
        Expr::BinaryOp(_) | Expr::UnaryOp(_) | Expr::Paren(_) => "expr".to_string(),
    }
}

fn unique_name(base: &str, used: &mut Vec<String>) -> String {
    let mut name = base.to_string();
    let mut counter = 1;
    while used.iter().any(|u| u.eq_ignore_ascii_case(&name)) {
        counter += 1;
        name = format!("{base}_{counter}");
    }
    used.push(name.clone());
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn plan(source: &str) -> Result<Plan, CompileError> {
        compile(&parse(source).expect("query should parse"))
    }

    fn select(source: &str) -> EvalQuery {
        match plan(source).expect("query should compile") {
            Plan::Select(query) => query,
            Plan::Print(_) => panic!("expected a select plan"),
        }
    }

    fn column_names(query: &EvalQuery) -> Vec<String> {
        query
            .targets
            .iter()
            .filter_map(|t| t.name.clone())
            .collect()
    }

    #[test]
    fn test_allocator_hands_out_consecutive_slots() {
        let mut allocator = Allocator::new();
        assert_eq!(allocator.allocate(), 0);
        assert_eq!(allocator.allocate(), 1);
        assert_eq!(allocator.allocate(), 2);
        let store = allocator.create_store();
        assert_eq!(store.len(), 3);
        assert!(store.iter().all(Value::is_null));
    }

    #[test]
    fn test_simple_select_types() {
        let q = select("SELECT date, account, number");
        assert_eq!(column_names(&q), ["date", "account", "number"]);
        assert_eq!(q.targets[0].dtype, ValueType::Date);
        assert_eq!(q.targets[1].dtype, ValueType::String);
        assert_eq!(q.targets[2].dtype, ValueType::Number);
        assert!(q.uses_postings);
        assert!(!q.uses_balance);
        assert!(q.group_indexes.is_none());
    }

    #[test]
    fn test_entry_only_select_does_not_use_postings() {
        let q = select("SELECT date, narration");
        assert!(!q.uses_postings);
    }

    #[test]
    fn test_balance_column_tracks_running_balance() {
        let q = select("SELECT account, balance");
        assert!(q.uses_postings);
        assert!(q.uses_balance);
    }

    #[test]
    fn test_wildcard_expansion() {
        let q = select("SELECT *");
        assert_eq!(
            column_names(&q),
            ["date", "flag", "payee", "narration", "position"],
        );
    }

    #[test]
    fn test_target_names_and_uniquing() {
        let q = select("SELECT year(date), account AS acct, date, date");
        assert_eq!(column_names(&q), ["year_date", "acct", "date", "date_2"]);
    }

    #[test]
    fn test_unknown_column() {
        match plan("SELECT nonsense") {
            Err(CompileError::UnknownColumn { name, context }) => {
                assert_eq!(name, "nonsense");
                assert_eq!(context, "targets");
            }
            other => panic!("expected UnknownColumn, got {other:?}"),
        }
    }

    #[test]
    fn test_posting_column_rejected_in_from() {
        match plan("SELECT date FROM account = \"Assets:Cash\"") {
            Err(CompileError::UnknownColumn { name, context }) => {
                assert_eq!(name, "account");
                assert_eq!(context, "FROM");
            }
            other => panic!("expected UnknownColumn, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_function() {
        assert!(matches!(
            plan("SELECT frobnicate(date)"),
            Err(CompileError::UnknownFunction(name)) if name == "frobnicate",
        ));
    }

    #[test]
    fn test_function_arity_checked() {
        assert!(matches!(
            plan("SELECT year(date, account)"),
            Err(CompileError::InvalidArguments { got: 2, .. }),
        ));
    }

    #[test]
    fn test_aggregate_rejected_in_where_and_from() {
        assert!(matches!(
            plan("SELECT account WHERE sum(number) > 0"),
            Err(CompileError::AggregateNotAllowed { context: "WHERE", .. }),
        ));
        assert!(matches!(
            plan("SELECT date FROM count(*) > 0"),
            Err(CompileError::AggregateNotAllowed { context: "FROM", .. }),
        ));
    }

    #[test]
    fn test_nested_aggregate_rejected() {
        assert!(matches!(
            plan("SELECT sum(count(account)) GROUP BY account"),
            Err(CompileError::NestedAggregate),
        ));
    }

    #[test]
    fn test_aggregate_slots_shared() {
        let q = select("SELECT account, sum(position), sum(position) GROUP BY account");
        assert_eq!(q.aggregates.len(), 1);
        assert_eq!(q.store_len, 1);
        assert_eq!(q.aggregates[0].slot, 0);
    }

    #[test]
    fn test_aggregate_dtypes() {
        let q = select(
            "SELECT account, sum(position), count(*), first(narration), distinct(currency) \
             GROUP BY account",
        );
        assert_eq!(q.targets[1].dtype, ValueType::Inventory);
        assert_eq!(q.targets[2].dtype, ValueType::Integer);
        assert_eq!(q.targets[3].dtype, ValueType::String);
        assert_eq!(q.targets[4].dtype, ValueType::StringSet);
    }

    #[test]
    fn test_sum_of_numbers_stays_numeric() {
        let q = select("SELECT sum(number)");
        assert_eq!(q.targets[0].dtype, ValueType::Number);
        assert_eq!(q.group_indexes.as_deref(), Some(&[][..]));
    }

    #[test]
    fn test_group_by_position_and_alias() {
        let by_position = select("SELECT account, count(*) GROUP BY 1");
        assert_eq!(by_position.group_indexes.as_deref(), Some(&[0][..]));

        let by_alias = select("SELECT account AS acct, count(*) GROUP BY acct");
        assert_eq!(by_alias.group_indexes.as_deref(), Some(&[0][..]));

        let by_expr = select("SELECT year(date), count(*) GROUP BY year(date)");
        assert_eq!(by_expr.group_indexes.as_deref(), Some(&[0][..]));
    }

    #[test]
    fn test_group_by_bad_position() {
        assert!(matches!(
            plan("SELECT account, count(*) GROUP BY 3"),
            Err(CompileError::BadPosition { clause: "GROUP BY", position: 3 }),
        ));
        assert!(matches!(
            plan("SELECT account, count(*) GROUP BY 0"),
            Err(CompileError::BadPosition { position: 0, .. }),
        ));
    }

    #[test]
    fn test_group_by_aggregate_rejected() {
        assert!(matches!(
            plan("SELECT account, count(*) GROUP BY 2"),
            Err(CompileError::GroupByAggregate),
        ));
    }

    #[test]
    fn test_ungrouped_target_rejected() {
        assert!(matches!(
            plan("SELECT account, sum(position)"),
            Err(CompileError::NotGrouped(name)) if name == "account",
        ));
        assert!(matches!(
            plan("SELECT account, narration, count(*) GROUP BY account"),
            Err(CompileError::NotGrouped(name)) if name == "narration",
        ));
    }

    #[test]
    fn test_group_by_extra_expression_becomes_internal_target() {
        let q = select("SELECT count(*) GROUP BY account");
        // One visible target plus the internal grouping key.
        assert_eq!(q.targets.len(), 2);
        assert!(q.targets[1].name.is_none());
        assert_eq!(q.group_indexes.as_deref(), Some(&[1][..]));
    }

    #[test]
    fn test_order_by_resolution() {
        let q = select("SELECT account, date ORDER BY date DESC, 1");
        assert_eq!(
            q.order_by,
            vec![(1, SortDirection::Descending), (0, SortDirection::Ascending)],
        );

        let internal = select("SELECT account ORDER BY narration");
        assert_eq!(internal.targets.len(), 2);
        assert_eq!(internal.order_by, vec![(1, SortDirection::Ascending)]);
    }

    #[test]
    fn test_having_compiles_with_aggregates() {
        let q = select("SELECT account, count(*) GROUP BY account HAVING count(*) > 1");
        assert!(q.having.is_some());
        // HAVING reuses the slot of the visible count(*).
        assert_eq!(q.aggregates.len(), 1);
    }

    #[test]
    fn test_empty_from_rejected() {
        assert!(matches!(plan("SELECT account FROM"), Err(CompileError::EmptyFrom)));
        assert!(matches!(plan("PRINT FROM"), Err(CompileError::EmptyFrom)));
    }

    #[test]
    fn test_invalid_regex_rejected() {
        assert!(matches!(
            plan(r#"SELECT account WHERE account ~ "(unclosed""#),
            Err(CompileError::InvalidRegex { .. }),
        ));
    }

    #[test]
    fn test_wildcard_outside_count_rejected() {
        assert!(matches!(
            plan("SELECT sum(*)"),
            Err(CompileError::UnexpectedWildcard),
        ));
    }

    #[test]
    fn test_arithmetic_types() {
        let q = select("SELECT 1 + 2, 1 + 2.5, 1 / 2, -number");
        assert_eq!(q.targets[0].dtype, ValueType::Integer);
        assert_eq!(q.targets[1].dtype, ValueType::Number);
        assert_eq!(q.targets[2].dtype, ValueType::Number);
        assert_eq!(q.targets[3].dtype, ValueType::Number);
    }

    #[test]
    fn test_balances_desugar() {
        let q = select("BALANCES");
        assert_eq!(column_names(&q), ["account", "sum_position"]);
        assert_eq!(q.targets[1].dtype, ValueType::Inventory);
        assert_eq!(q.group_indexes.as_deref(), Some(&[0][..]));
        assert_eq!(q.order_by, vec![(0, SortDirection::Ascending)]);

        let at_cost = select("BALANCES AT cost");
        assert_eq!(at_cost.targets[1].dtype, ValueType::Inventory);
        assert_eq!(column_names(&at_cost)[1], "cost_sum_position");
    }

    #[test]
    fn test_journal_desugar() {
        let q = select(r#"JOURNAL "Assets""#);
        assert_eq!(
            column_names(&q),
            ["date", "flag", "payee", "narration", "position", "balance"],
        );
        assert!(q.where_clause.is_some());
        assert!(q.uses_balance);

        let at_units = select("JOURNAL AT units");
        assert_eq!(column_names(&at_units)[4], "units_position");
        assert!(at_units.where_clause.is_none());
    }

    #[test]
    fn test_print_plan() {
        match plan("PRINT FROM year = 2014").expect("PRINT should compile") {
            Plan::Print(print) => {
                let from = print.from.expect("FROM should be compiled");
                assert!(from.filter.is_some());
            }
            Plan::Select(_) => panic!("expected a print plan"),
        }
    }
}
